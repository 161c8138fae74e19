// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Pipeline Orchestrator
 * Drives the five-stage scan: enumerate, probe, fingerprint, brute-force, scan
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::catalog::{ToolCatalog, ToolKind};
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::executor::run_parallel;
use crate::invoker::{invoke, ToolInvocation};
use crate::normalizer;
use crate::progress::{NoopObserver, ScanObserver, Stage};
use crate::types::{normalize_url, timestamp, DiscoveredPath, LiveHost, ScanAggregate, ScanTarget};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Status codes that keep a probed host in only-live mode. Without that mode
/// every responding host proceeds to the deeper stages.
pub const LIVE_STATUS_CODES: [u16; 8] = [200, 201, 202, 204, 301, 302, 307, 308];

/// Cap on URLs handed to the fingerprinter in one scan.
pub const MAX_FINGERPRINT_URLS: usize = 50;

/// Cap on hosts brute-forced in one scan.
pub const MAX_BRUTE_FORCE_HOSTS: usize = 10;

/// Fixed worker cap for per-host fan-out stages.
pub const MAX_PARALLEL_WORKERS: usize = 5;

const FULL_EXTENSIONS: &str = "php,html,txt,js,bak,old,zip,tar.gz,sql";
const FAST_EXTENSIONS: &str = "php,html,txt";

const FULL_WORDLIST: &str = "directory-list-2.3-medium.txt";
const FAST_WORDLIST: &str = "common.txt";
const FALLBACK_WORDLIST_DIR: &str = "/usr/share/wordlists";

const FULL_SEVERITIES: &str = "critical,high,medium";
const FAST_SEVERITIES: &str = "critical,high";

/// The five-stage recon pipeline. Construction validates configuration and
/// prepares the output tree; a scan then runs the stages in order, feeding
/// each stage from the previous one's normalized records. Tool failures are
/// recorded and survived; only an unusable configuration or output directory
/// is fatal.
pub struct ReconPipeline {
    config: PipelineConfig,
    catalog: ToolCatalog,
    observer: Arc<dyn ScanObserver>,
    aggregate: Arc<Mutex<ScanAggregate>>,
    raw_dir: PathBuf,
}

impl ReconPipeline {
    pub fn new(config: PipelineConfig, catalog: ToolCatalog) -> PipelineResult<Self> {
        config.check()?;
        let raw_dir = config.output_dir.join("raw");
        std::fs::create_dir_all(&raw_dir)?;
        Ok(Self {
            config,
            catalog,
            observer: Arc::new(NoopObserver),
            aggregate: Arc::new(Mutex::new(ScanAggregate::default())),
            raw_dir,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ScanAggregate {
        self.aggregate.lock().clone()
    }

    /// Run all five stages over one batch of seed targets: every seed is
    /// enumerated, the unioned host set is probed in one batch, and the
    /// deeper stages share one aggregate. Always returns the aggregate: a
    /// stage can fail or be skipped without aborting the scan, and when no
    /// host responds to probing the remaining stages are skipped outright.
    pub async fn run_full_scan(&self, seeds: &[ScanTarget]) -> PipelineResult<ScanAggregate> {
        *self.aggregate.lock() = ScanAggregate::default();
        info!("starting full scan of {} seed target(s)", seeds.len());

        self.run_subdomain_enumeration(seeds).await;
        self.run_live_host_probing().await;

        let live_urls = self.aggregate.lock().live_hosts.clone();
        if live_urls.is_empty() {
            warn!("no responsive hosts, skipping remaining stages");
            for stage in [
                Stage::TechFingerprinting,
                Stage::DirectoryBruteForce,
                Stage::VulnerabilityScan,
            ] {
                self.observer.stage_skipped(stage, "no live hosts");
            }
            return Ok(self.snapshot());
        }

        self.run_tech_fingerprinting(&live_urls).await;

        if self.config.fast {
            self.observer
                .stage_skipped(Stage::DirectoryBruteForce, "fast mode");
        } else {
            self.run_directory_brute_force(&live_urls).await;
        }

        if self.config.skip_vuln_scan {
            self.observer
                .stage_skipped(Stage::VulnerabilityScan, "disabled by configuration");
        } else {
            self.run_vulnerability_scan(&live_urls).await;
        }

        Ok(self.snapshot())
    }

    async fn run_subdomain_enumeration(&self, seeds: &[ScanTarget]) {
        let stage = Stage::SubdomainEnumeration;
        self.observer.stage_started(stage);

        // The seed hosts are part of the subdomain set themselves; the
        // enumerator's results union into it.
        let mut hosts: Vec<String> = Vec::new();
        for seed in seeds {
            push_unique(&mut hosts, seed.host());
        }

        for seed in seeds {
            let mut args = vec![
                "-d".to_string(),
                seed.domain().to_string(),
                "-all".to_string(),
            ];
            if let Some(flag) = self.json_flag(ToolKind::Subfinder) {
                args.push(flag);
            }
            if self.config.stealth {
                args.push("-silent".to_string());
                args.push("-rate-limit".to_string());
                args.push("10".to_string());
            }

            let capture = self.capture_path(ToolKind::Subfinder, Some(seed.domain()));
            let Some(raw) = self.run_tool(stage, ToolKind::Subfinder, &args, &capture).await
            else {
                continue;
            };
            for host in normalizer::parse_subdomains(&raw) {
                push_unique(&mut hosts, &host);
            }
        }

        let count = hosts.len();
        self.aggregate.lock().subdomains = hosts;
        self.observer.stage_finished(stage, count);
    }

    async fn run_live_host_probing(&self) {
        let stage = Stage::LiveHostProbing;
        self.observer.stage_started(stage);

        // Probe the full subdomain set, normalized to full URLs.
        let hosts = self.aggregate.lock().subdomains.clone();
        let mut seen = HashSet::new();
        let urls: Vec<String> = hosts
            .iter()
            .map(|h| normalize_url(h))
            .filter(|u| seen.insert(u.clone()))
            .collect();

        let targets_file = self.raw_dir.join(format!("httpx-targets-{}.txt", timestamp()));
        if let Err(e) = std::fs::write(&targets_file, urls.join("\n")) {
            self.record_stage_error(stage, ToolKind::Httpx, &e.to_string());
            self.observer.stage_finished(stage, 0);
            return;
        }

        let mut args = vec![
            "-l".to_string(),
            targets_file.display().to_string(),
            "-status-code".to_string(),
            "-title".to_string(),
            "-content-length".to_string(),
            "-web-server".to_string(),
            "-tech-detect".to_string(),
            "-follow-redirects".to_string(),
            "-threads".to_string(),
            self.config.threads.to_string(),
        ];
        if let Some(flag) = self.json_flag(ToolKind::Httpx) {
            args.push(flag);
        }
        if self.config.stealth {
            args.push("-silent".to_string());
            args.push("-rate-limit".to_string());
            args.push("10".to_string());
        }
        if let Some(proxy) = &self.config.proxy {
            args.push("-proxy".to_string());
            args.push(proxy.clone());
        }

        let capture = self.capture_path(ToolKind::Httpx, None);
        let raw = match self.run_tool(stage, ToolKind::Httpx, &args, &capture).await {
            Some(raw) => raw,
            None => {
                self.observer.stage_finished(stage, 0);
                return;
            }
        };

        // Every responding host proceeds to the deeper stages; the status
        // allow-list only applies in only-live mode.
        let mut probed = normalizer::parse_live_hosts(&raw);
        if self.config.only_live {
            probed.retain(is_live);
        }
        let live_urls: Vec<String> = probed.iter().map(|h| h.url.clone()).collect();

        let count = probed.len();
        {
            let mut aggregate = self.aggregate.lock();
            aggregate.probe_results = probed;
            aggregate.live_hosts = live_urls;
        }
        self.observer.stage_finished(stage, count);
    }

    async fn run_tech_fingerprinting(&self, live_urls: &[String]) {
        let stage = Stage::TechFingerprinting;
        self.observer.stage_started(stage);

        let urls: Vec<&String> = live_urls.iter().take(MAX_FINGERPRINT_URLS).collect();
        if urls.len() < live_urls.len() {
            info!(
                "fingerprinting capped at {} of {} live hosts",
                urls.len(),
                live_urls.len()
            );
        }

        // whatweb writes JSON to a log file, so the capture is the log target
        // and process stdout goes to a scratch file.
        let capture = self.capture_path(ToolKind::Whatweb, None);
        let scratch = capture.with_extension("log");
        let aggression = if self.config.stealth { "1" } else { "3" };
        let mut args = vec![
            format!("--log-json={}", capture.display()),
            "--no-errors".to_string(),
            "-a".to_string(),
            aggression.to_string(),
        ];
        args.extend(urls.iter().map(|u| u.to_string()));

        if self.run_tool(stage, ToolKind::Whatweb, &args, &scratch).await.is_none() {
            self.observer.stage_finished(stage, 0);
            return;
        }

        let raw = std::fs::read_to_string(&capture).unwrap_or_default();
        let fingerprints = normalizer::parse_fingerprints(&raw);
        let count = fingerprints.len();
        self.aggregate.lock().fingerprint_results = fingerprints;
        self.observer.stage_finished(stage, count);
    }

    async fn run_directory_brute_force(&self, live_urls: &[String]) {
        let stage = Stage::DirectoryBruteForce;
        self.observer.stage_started(stage);

        // A missing wordlist is a host-setup gap, not a scan error.
        let Some(wordlist) = self.resolve_wordlist() else {
            warn!("no wordlist found, skipping directory brute-force");
            self.observer.stage_skipped(stage, "no wordlist found");
            return;
        };

        let targets: Vec<String> = live_urls
            .iter()
            .take(MAX_BRUTE_FORCE_HOSTS)
            .cloned()
            .collect();
        if targets.len() < live_urls.len() {
            info!(
                "brute-force capped at {} of {} live hosts",
                targets.len(),
                live_urls.len()
            );
        }

        let results: Vec<Vec<DiscoveredPath>> =
            run_parallel(targets, MAX_PARALLEL_WORKERS, |url| {
                let wordlist = wordlist.clone();
                async move { self.brute_force_one(stage, &url, &wordlist).await }
            })
            .await;

        let mut total = 0;
        {
            let mut aggregate = self.aggregate.lock();
            for paths in results {
                total += paths.len();
                aggregate.path_results.extend(paths);
            }
        }
        self.observer.stage_finished(stage, total);
    }

    async fn brute_force_one(
        &self,
        stage: Stage,
        url: &str,
        wordlist: &Path,
    ) -> Vec<DiscoveredPath> {
        let threads = if self.config.stealth {
            5
        } else {
            self.config.threads
        };
        let extensions = if self.config.fast {
            FAST_EXTENSIONS
        } else {
            FULL_EXTENSIONS
        };

        let mut args = vec![
            "dir".to_string(),
            "-u".to_string(),
            url.to_string(),
            "-w".to_string(),
            wordlist.display().to_string(),
            "-t".to_string(),
            threads.to_string(),
            "-x".to_string(),
            extensions.to_string(),
            "-k".to_string(),
            "--no-error".to_string(),
        ];
        if self.config.stealth {
            args.push("-q".to_string());
            args.push("--delay".to_string());
            args.push("200ms".to_string());
        }
        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        let capture = self.capture_path(ToolKind::Gobuster, Some(url));
        let Some(raw) = self.run_tool(stage, ToolKind::Gobuster, &args, &capture).await else {
            return Vec::new();
        };

        let base = url.trim_end_matches('/');
        let mut paths = normalizer::parse_paths(&raw);
        for p in &mut paths {
            if p.url.is_empty() {
                p.url = format!("{}/{}", base, p.path.trim_start_matches('/'));
            }
        }
        paths
    }

    async fn run_vulnerability_scan(&self, live_urls: &[String]) {
        let stage = Stage::VulnerabilityScan;
        self.observer.stage_started(stage);

        let targets_file = self.raw_dir.join(format!("nuclei-targets-{}.txt", timestamp()));
        if let Err(e) = std::fs::write(&targets_file, live_urls.join("\n")) {
            self.record_stage_error(stage, ToolKind::Nuclei, &e.to_string());
            self.observer.stage_finished(stage, 0);
            return;
        }

        let severities = if self.config.fast {
            FAST_SEVERITIES
        } else {
            FULL_SEVERITIES
        };
        let concurrency = if self.config.stealth { 10 } else { 25 };

        let mut args = vec![
            "-l".to_string(),
            targets_file.display().to_string(),
            "-severity".to_string(),
            severities.to_string(),
            "-c".to_string(),
            concurrency.to_string(),
        ];
        if let Some(flag) = self.json_flag(ToolKind::Nuclei) {
            args.push(flag);
        }
        if self.config.stealth {
            args.push("-silent".to_string());
            args.push("-rate-limit".to_string());
            args.push("10".to_string());
        }
        if let Some(proxy) = &self.config.proxy {
            args.push("-proxy".to_string());
            args.push(proxy.clone());
        }

        let capture = self.capture_path(ToolKind::Nuclei, None);
        let raw = match self.run_tool(stage, ToolKind::Nuclei, &args, &capture).await {
            Some(raw) => raw,
            None => {
                self.observer.stage_finished(stage, 0);
                return;
            }
        };

        let findings = normalizer::parse_findings(&raw);
        let count = findings.len();
        self.aggregate.lock().findings = findings;
        self.observer.stage_finished(stage, count);
    }

    /// Launch one tool run and return the capture file's content. A timeout
    /// or a bad exit is recorded as a scan error but the capture is still
    /// read, so partial output survives. `None` means the tool never ran.
    async fn run_tool(
        &self,
        stage: Stage,
        kind: ToolKind,
        args: &[String],
        capture: &Path,
    ) -> Option<String> {
        let Some(info) = self.catalog.get(kind) else {
            let err = PipelineError::ToolNotFound {
                tool: kind.name().to_string(),
            };
            self.record_stage_error(stage, kind, &err.to_string());
            return None;
        };

        match invoke(&info.path, args, capture, kind.timeout()).await {
            Ok(invocation) => {
                self.note_outcome(stage, kind, &invocation);
                Some(std::fs::read_to_string(capture).unwrap_or_default())
            }
            Err(e) => {
                self.record_stage_error(stage, kind, &e.to_string());
                None
            }
        }
    }

    fn note_outcome(&self, stage: Stage, kind: ToolKind, invocation: &ToolInvocation) {
        if invocation.outcome.timed_out {
            let err = PipelineError::Timeout {
                tool: kind.name().to_string(),
                budget: kind.timeout(),
            };
            self.record_stage_error(stage, kind, &err.to_string());
        } else if !invocation.outcome.success() {
            let reason = match invocation.outcome.stderr.lines().next() {
                Some(line) if !line.trim().is_empty() => line.trim().to_string(),
                _ => format!("exit code {:?}", invocation.outcome.exit_code),
            };
            // whatweb and gobuster exit non-zero on unreachable hosts, which
            // is routine; the capture is parsed as usual.
            warn!("{} exited non-zero: {}", kind, reason);
        }
    }

    fn record_stage_error(&self, stage: Stage, kind: ToolKind, message: &str) {
        warn!("{}: {}", kind, message);
        self.aggregate.lock().record_error(kind.name(), message);
        self.observer.tool_error(stage, message);
    }

    fn json_flag(&self, kind: ToolKind) -> Option<String> {
        self.catalog.get(kind).and_then(|info| info.json_flag.clone())
    }

    fn capture_path(&self, kind: ToolKind, host: Option<&str>) -> PathBuf {
        let name = match host {
            Some(host) => format!(
                "{}-{}-{}.{}",
                kind.name(),
                sanitize_component(host),
                timestamp(),
                kind.capture_extension()
            ),
            None => format!("{}-{}.{}", kind.name(), timestamp(), kind.capture_extension()),
        };
        self.raw_dir.join(name)
    }

    /// Wordlist lookup order: the structured seclists layout, then a flat
    /// file in the configured directory, then the system wordlist directory.
    fn resolve_wordlist(&self) -> Option<PathBuf> {
        let name = if self.config.fast {
            FAST_WORDLIST
        } else {
            FULL_WORDLIST
        };
        let candidates = [
            self.config
                .wordlists_dir
                .join("Discovery/Web-Content")
                .join(name),
            self.config.wordlists_dir.join(name),
            Path::new(FALLBACK_WORDLIST_DIR).join(name),
        ];
        candidates.into_iter().find(|p| p.is_file())
    }
}

fn is_live(host: &LiveHost) -> bool {
    LIVE_STATUS_CODES.contains(&host.status_code)
}

fn push_unique(hosts: &mut Vec<String>, host: &str) {
    if !hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        hosts.push(host.to_string());
    }
}

fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        })
        .collect()
}
