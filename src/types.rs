// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Data Model
 * Normalized records, scan targets and the scan aggregate
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A normalized scan target. Always carries an explicit scheme; scheme and
/// host are lower-cased at construction so equality and deduplication are
/// case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    url: String,
}

impl ScanTarget {
    pub fn parse(raw: &str) -> Self {
        Self {
            url: normalize_url(raw),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host portion including an explicit port when present.
    pub fn host(&self) -> &str {
        let rest = strip_scheme(&self.url);
        rest.split('/').next().unwrap_or(rest)
    }

    /// Bare domain: host with any `:port` suffix removed. This is what the
    /// subdomain enumerator receives.
    pub fn domain(&self) -> &str {
        self.host().split(':').next().unwrap_or_default()
    }

    /// Key used for equality across schemes: everything after the scheme,
    /// lower-cased.
    fn dedup_key(&self) -> String {
        strip_scheme(&self.url).to_ascii_lowercase()
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Normalize an address into a full URL: force a scheme (https when absent)
/// and lower-case the scheme and authority. The path, if any, is preserved
/// as written.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (scheme, rest) = if let Some(idx) = lower.find("://") {
        (&lower[..idx], &trimmed[idx + 3..])
    } else {
        ("https", trimmed)
    };
    let scheme = match scheme {
        "http" => "http",
        _ => "https",
    };
    match rest.split_once('/') {
        Some((authority, path)) => {
            format!("{}://{}/{}", scheme, authority.to_ascii_lowercase(), path)
        }
        None => format!("{}://{}", scheme, rest.to_ascii_lowercase()),
    }
}

/// Deduplicate targets, keeping first-seen order. Two targets that differ
/// only in scheme or letter case are the same target.
pub fn dedup_targets(targets: Vec<ScanTarget>) -> Vec<ScanTarget> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|t| seen.insert(t.dedup_key()))
        .collect()
}

/// Read seed targets from a file, one per line. Blank lines and `#` comments
/// are skipped; every surviving line is normalized and deduplicated.
pub fn read_targets_file(path: &Path) -> std::io::Result<Vec<ScanTarget>> {
    let content = std::fs::read_to_string(path)?;
    let targets = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ScanTarget::parse)
        .collect();
    Ok(dedup_targets(targets))
}

/// Timestamp used in raw capture filenames.
pub fn timestamp() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl FindingSeverity {
    /// Lenient parse: severity strings are lower-cased, anything unknown or
    /// missing collapses to `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => FindingSeverity::Critical,
            "high" => FindingSeverity::High,
            "medium" => FindingSeverity::Medium,
            "low" => FindingSeverity::Low,
            _ => FindingSeverity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingSeverity::Critical => "critical",
            FindingSeverity::High => "high",
            FindingSeverity::Medium => "medium",
            FindingSeverity::Low => "low",
            FindingSeverity::Info => "info",
        }
    }
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One probed host as reported by the HTTP prober. Every field defaults to
/// empty/zero; parsing never fails on a missing key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiveHost {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_length: u64,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub host: String,
}

/// One fingerprinted URL with its detected plugin map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TechFingerprint {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub plugins: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub http_status: u16,
}

/// One path discovered by directory brute-forcing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredPath {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
}

/// One vulnerability finding from the template scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub severity: FindingSeverity,
    #[serde(default)]
    pub matched_at: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub extracted_results: Vec<String>,
}

/// A normalized record, one variant per tool kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Record {
    Subdomain { host: String },
    LiveHost(LiveHost),
    TechFingerprint(TechFingerprint),
    DiscoveredPath(DiscoveredPath),
    Finding(Finding),
}

/// A non-fatal error recorded during a scan. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanError {
    pub tool: String,
    pub error: String,
    pub timestamp: String,
}

impl ScanError {
    pub fn now(tool: &str, error: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// The accumulated result of one full scan, keyed by stage. Every field is
/// always present and defaults to an empty list so downstream consumers never
/// see an absent stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanAggregate {
    #[serde(default)]
    pub subdomains: Vec<String>,
    #[serde(default)]
    pub live_hosts: Vec<String>,
    #[serde(default)]
    pub probe_results: Vec<LiveHost>,
    #[serde(default)]
    pub fingerprint_results: Vec<TechFingerprint>,
    #[serde(default)]
    pub path_results: Vec<DiscoveredPath>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub errors: Vec<ScanError>,
}

impl ScanAggregate {
    pub fn record_error(&mut self, tool: &str, error: impl Into<String>) {
        self.errors.push(ScanError::now(tool, error));
    }

    /// Fold normalized records into the stage lists.
    pub fn absorb(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            match record {
                Record::Subdomain { host } => self.subdomains.push(host),
                Record::LiveHost(host) => self.probe_results.push(host),
                Record::TechFingerprint(fp) => self.fingerprint_results.push(fp),
                Record::DiscoveredPath(path) => self.path_results.push(path),
                Record::Finding(finding) => self.findings.push(finding),
            }
        }
    }
}
