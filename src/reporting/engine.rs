// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Report Engine
 * Renders the scan aggregate into summary.json, highlights.txt and report.md
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::PipelineResult;
use crate::reporting::types::{ScanInfo, ScanStatistics, ScanSummary};
use crate::types::{DiscoveredPath, Finding, FindingSeverity, ScanAggregate};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Path keywords surfaced in the highlights file.
const INTERESTING_KEYWORDS: [&str; 6] = ["admin", "api", "backup", "config", "test", "dev"];

const HIGHLIGHT_FINDINGS: usize = 10;
const HIGHLIGHT_PATHS: usize = 15;

/// Whatweb plugin names that describe metadata rather than a technology.
const NON_TECH_PLUGINS: [&str; 5] = ["Country", "IP", "Title", "Email", "UncommonHeaders"];

/// Writes the three report artifacts into one output directory.
pub struct ReportEngine {
    output_dir: PathBuf,
}

impl ReportEngine {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render every artifact. Returns the written summary so callers can
    /// print closing statistics without re-reading the file.
    pub fn write_all(
        &self,
        aggregate: &ScanAggregate,
        scan_info: ScanInfo,
    ) -> PipelineResult<ScanSummary> {
        std::fs::create_dir_all(&self.output_dir)?;
        let summary = build_summary(aggregate, scan_info);

        let summary_path = self.output_dir.join("summary.json");
        std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

        let highlights_path = self.output_dir.join("highlights.txt");
        std::fs::write(&highlights_path, render_highlights(aggregate, &summary))?;

        let report_path = self.output_dir.join("report.md");
        std::fs::write(&report_path, render_markdown(aggregate, &summary))?;

        info!("reports written to {}", self.output_dir.display());
        Ok(summary)
    }
}

/// Fold the aggregate into the summary shape: counts, severity breakdown and
/// the merged technology list.
pub fn build_summary(aggregate: &ScanAggregate, scan_info: ScanInfo) -> ScanSummary {
    let mut severity_counts: BTreeMap<String, usize> = BTreeMap::new();
    for finding in &aggregate.findings {
        *severity_counts
            .entry(finding.severity.to_string())
            .or_default() += 1;
    }

    ScanSummary {
        statistics: ScanStatistics {
            subdomains: aggregate.subdomains.len(),
            live_hosts: aggregate.live_hosts.len(),
            fingerprints: aggregate.fingerprint_results.len(),
            paths: aggregate.path_results.len(),
            findings: aggregate.findings.len(),
            errors: aggregate.errors.len(),
            severity_counts,
        },
        subdomains: aggregate.subdomains.clone(),
        live_hosts: aggregate.live_hosts.clone(),
        technologies: extract_technologies(aggregate),
        findings: aggregate.findings.clone(),
        errors: aggregate.errors.clone(),
        scan_info,
    }
}

/// Merge prober tech detections with fingerprinter plugin names into one
/// sorted, deduplicated list. Metadata plugins are dropped.
pub fn extract_technologies(aggregate: &ScanAggregate) -> Vec<String> {
    let mut techs = BTreeSet::new();
    for host in &aggregate.probe_results {
        for tech in &host.tech {
            if !tech.trim().is_empty() {
                techs.insert(tech.trim().to_string());
            }
        }
    }
    for fp in &aggregate.fingerprint_results {
        for plugin in fp.plugins.keys() {
            if !NON_TECH_PLUGINS.contains(&plugin.as_str()) {
                techs.insert(plugin.clone());
            }
        }
    }
    techs.into_iter().collect()
}

fn interesting_paths(aggregate: &ScanAggregate) -> Vec<&DiscoveredPath> {
    aggregate
        .path_results
        .iter()
        .filter(|p| {
            let lower = p.path.to_ascii_lowercase();
            INTERESTING_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .collect()
}

fn top_findings(aggregate: &ScanAggregate) -> Vec<&Finding> {
    let mut findings: Vec<&Finding> = aggregate
        .findings
        .iter()
        .filter(|f| f.severity >= FindingSeverity::High)
        .collect();
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings.truncate(HIGHLIGHT_FINDINGS);
    findings
}

fn render_highlights(aggregate: &ScanAggregate, summary: &ScanSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Scan Highlights: {} ===", summary.scan_info.target);
    let _ = writeln!(out);

    let findings = top_findings(aggregate);
    let _ = writeln!(out, "Top findings ({}):", findings.len());
    if findings.is_empty() {
        let _ = writeln!(out, "  none at high or critical severity");
    }
    for f in findings {
        let location = if f.matched_at.is_empty() { &f.url } else { &f.matched_at };
        let _ = writeln!(out, "  [{}] {} - {}", f.severity, f.template_id, location);
    }
    let _ = writeln!(out);

    let paths = interesting_paths(aggregate);
    let _ = writeln!(out, "Interesting paths ({}):", paths.len());
    if paths.is_empty() {
        let _ = writeln!(out, "  none matched the keyword list");
    }
    for p in paths.iter().take(HIGHLIGHT_PATHS) {
        let _ = writeln!(out, "  {} (status {}, {} bytes) {}", p.path, p.status, p.size, p.url);
    }

    out
}

fn render_markdown(aggregate: &ScanAggregate, summary: &ScanSummary) -> String {
    let info = &summary.scan_info;
    let stats = &summary.statistics;
    let mut out = String::new();

    let _ = writeln!(out, "# Recon Report: {}", info.target);
    let _ = writeln!(out);
    let _ = writeln!(out, "- Started: {}", info.started_at);
    let _ = writeln!(out, "- Finished: {}", info.finished_at);
    let _ = writeln!(
        out,
        "- Mode: {}{}",
        if info.fast { "fast" } else { "full" },
        if info.stealth { ", stealth" } else { "" }
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Statistics");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Stage | Count |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Subdomains | {} |", stats.subdomains);
    let _ = writeln!(out, "| Live hosts | {} |", stats.live_hosts);
    let _ = writeln!(out, "| Fingerprints | {} |", stats.fingerprints);
    let _ = writeln!(out, "| Discovered paths | {} |", stats.paths);
    let _ = writeln!(out, "| Findings | {} |", stats.findings);
    let _ = writeln!(out, "| Errors | {} |", stats.errors);
    let _ = writeln!(out);

    if !summary.findings.is_empty() {
        let _ = writeln!(out, "## Findings");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Severity | Template | Name | Location |");
        let _ = writeln!(out, "|---|---|---|---|");
        let mut findings: Vec<&Finding> = summary.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        for f in findings {
            let location = if f.matched_at.is_empty() { &f.url } else { &f.matched_at };
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                f.severity, f.template_id, f.name, location
            );
        }
        let _ = writeln!(out);
    }

    if !summary.live_hosts.is_empty() {
        let _ = writeln!(out, "## Live Hosts");
        let _ = writeln!(out);
        for host in &aggregate.probe_results {
            let _ = writeln!(
                out,
                "- {} ({}) {} [{}]",
                host.url,
                host.status_code,
                host.title,
                host.tech.join(", ")
            );
        }
        let _ = writeln!(out);
    }

    if !summary.technologies.is_empty() {
        let _ = writeln!(out, "## Technologies");
        let _ = writeln!(out);
        for tech in &summary.technologies {
            let _ = writeln!(out, "- {}", tech);
        }
        let _ = writeln!(out);
    }

    let interesting = interesting_paths(aggregate);
    if !interesting.is_empty() {
        let _ = writeln!(out, "## Interesting Paths");
        let _ = writeln!(out);
        for p in interesting {
            let _ = writeln!(out, "- `{}` (status {}) {}", p.path, p.status, p.url);
        }
        let _ = writeln!(out);
    }

    if !summary.errors.is_empty() {
        let _ = writeln!(out, "## Errors");
        let _ = writeln!(out);
        for e in &summary.errors {
            let _ = writeln!(out, "- [{}] {}: {}", e.timestamp, e.tool, e.error);
        }
    }

    out
}
