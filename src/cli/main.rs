// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Nuotta - Recon Pipeline CLI
 * Standalone CLI for staged reconnaissance against authorized targets
 *
 * Features:
 * - Subdomain enumeration, live-host probing, tech fingerprinting
 * - Directory brute-force and template-based vulnerability scanning
 * - Normalized JSON summary plus human-readable reports
 * - Multi-target support with per-target output directories
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Level};

use nuotta_recon::config::PipelineConfig;
use nuotta_recon::pipeline::ReconPipeline;
use nuotta_recon::progress::LogObserver;
use nuotta_recon::reporting::{ReportEngine, ScanInfo};
use nuotta_recon::types::{dedup_targets, read_targets_file, timestamp, ScanTarget};
use nuotta_recon::ToolCatalog;

/// Nuotta - Recon Pipeline
#[derive(Parser)]
#[command(name = "nuotta")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.0.0")]
#[command(about = "Staged recon pipeline driving subfinder, httpx, whatweb, gobuster and nuclei.", long_about = None)]
struct Cli {
    /// Target domain(s) or URL(s) to scan
    #[arg(required_unless_present = "list")]
    targets: Vec<String>,

    /// File with one target per line (# comments allowed)
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Output directory (one subdirectory is created per target)
    #[arg(short, long, default_value = "./results")]
    output: PathBuf,

    /// Thread count forwarded to tools that accept one
    #[arg(short, long, default_value_t = 20)]
    threads: usize,

    /// Proxy URL forwarded to supporting tools
    #[arg(long)]
    proxy: Option<String>,

    /// Stealth mode: rate limits, fewer workers, delays
    #[arg(long)]
    stealth: bool,

    /// Keep only live hosts in the probe results
    #[arg(long)]
    only_live: bool,

    /// Skip the vulnerability-scan stage
    #[arg(long)]
    skip_vuln_scan: bool,

    /// Fast mode: small wordlists, no directory brute-force
    #[arg(long)]
    fast: bool,

    /// Wordlist directory for directory brute-forcing
    #[arg(long, default_value = "/usr/share/seclists")]
    wordlists_dir: PathBuf,

    /// Skip the authorization confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - errors only, no banner
    #[arg(short, long)]
    quiet: bool,
}

fn print_banner() {
    print!("\x1b[92m");
    println!("                        __  __");
    println!("   ____  __  ______  / /_/ /_____ _");
    println!("  / __ \\/ / / / __ \\/ __/ __/ __ `/");
    print!("\x1b[91m");
    println!(" / / / / /_/ / /_/ / /_/ /_/ /_/ /");
    println!("/_/ /_/\\__,_/\\____/\\__/\\__/\\__,_/");
    print!("\x1b[0m");
    println!();
    print!("\x1b[1m\x1b[97m");
    println!("        Staged Recon Pipeline");
    print!("\x1b[0m\x1b[92m");
    println!("        v1.0 - (c) 2026 Bountyy Oy");
    print!("\x1b[0m");
    println!();
}

/// Legal gate: scanning targets without permission is illegal in most
/// jurisdictions, so the user confirms authorization before anything runs.
fn confirm_authorization(targets: &[ScanTarget]) -> Result<bool> {
    println!("\x1b[93mWARNING: only scan systems you are authorized to test.\x1b[0m");
    println!("Targets:");
    for target in targets {
        println!("  - {}", target);
    }
    print!("Confirm you are authorized to scan these targets [y/N]: ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn collect_targets(cli: &Cli) -> Result<Vec<ScanTarget>> {
    let mut targets: Vec<ScanTarget> = cli.targets.iter().map(|t| ScanTarget::parse(t)).collect();
    if let Some(list) = &cli.list {
        let from_file = read_targets_file(list)
            .with_context(|| format!("reading target list {}", list.display()))?;
        targets.extend(from_file);
    }
    let targets = dedup_targets(targets);
    if targets.is_empty() {
        bail!("no targets given");
    }
    Ok(targets)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    if !cli.quiet {
        print_banner();
    }

    let targets = collect_targets(&cli)?;

    if !cli.yes && !cli.quiet && !confirm_authorization(&targets)? {
        bail!("scan not authorized, aborting");
    }

    // Tool discovery happens before the runtime spins up; it is synchronous
    // filesystem and subprocess probing.
    let catalog = ToolCatalog::discover();
    for missing in catalog.missing() {
        warn!("{} is not installed; its stage will be skipped", missing);
    }

    // Create async runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("nuotta-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli, targets, catalog))
}

async fn async_main(cli: Cli, targets: Vec<ScanTarget>, catalog: ToolCatalog) -> Result<()> {
    let started = Instant::now();

    // One batched scan, one output directory, one report set. The directory
    // is named after the first seed's domain.
    let scan_dir = cli
        .output
        .join(format!("{}-{}", targets[0].domain(), timestamp()));

    let config = PipelineConfig {
        output_dir: scan_dir.clone(),
        threads: cli.threads,
        proxy: cli.proxy.clone(),
        stealth: cli.stealth,
        only_live: cli.only_live,
        skip_vuln_scan: cli.skip_vuln_scan,
        fast: cli.fast,
        wordlists_dir: cli.wordlists_dir.clone(),
    };

    let pipeline =
        ReconPipeline::new(config, catalog.clone())?.with_observer(Arc::new(LogObserver));

    let scan_started = chrono::Utc::now();
    let aggregate = tokio::select! {
        result = pipeline.run_full_scan(&targets) => result?,
        _ = tokio::signal::ctrl_c() => {
            error!("interrupted, aborting");
            std::process::exit(130);
        }
    };
    let scan_finished = chrono::Utc::now();

    let target_list = targets
        .iter()
        .map(|t| t.url().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let scan_info = ScanInfo {
        target: target_list.clone(),
        started_at: scan_started.to_rfc3339(),
        finished_at: scan_finished.to_rfc3339(),
        tool_versions: catalog.versions(),
        stealth: cli.stealth,
        fast: cli.fast,
    };
    let summary = ReportEngine::new(&scan_dir).write_all(&aggregate, scan_info)?;

    info!(
        "{}: {} subdomains, {} responsive hosts, {} paths, {} findings, {} errors",
        target_list,
        summary.statistics.subdomains,
        summary.statistics.live_hosts,
        summary.statistics.paths,
        summary.statistics.findings,
        summary.statistics.errors,
    );
    info!("results in {}", scan_dir.display());

    info!(
        "scanned {} seed target(s) in {:.1}s",
        targets.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
