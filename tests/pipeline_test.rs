// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Integration Tests
 * End-to-end scans against stub tool executables
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use nuotta_recon::config::PipelineConfig;
use nuotta_recon::pipeline::ReconPipeline;
use nuotta_recon::types::ScanTarget;
use nuotta_recon::{ToolCatalog, ToolInfo, ToolKind};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Install a stub tool: a shell script that fakes the real tool's output.
fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn stub_subfinder(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "subfinder",
        r#"printf '{"host":"api.example.com"}\n{"host":"www.example.com"}\n'"#,
    )
}

fn stub_httpx(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "httpx",
        concat!(
            r#"printf '{"url":"https://api.example.com","status_code":200,"title":"API","tech":["nginx"]}\n"#,
            r#"{"url":"https://www.example.com","status_code":301,"title":"Redirect"}\n"#,
            r#"{"url":"https://dead.example.com","status_code":404}\n'"#,
        ),
    )
}

fn stub_whatweb(dir: &Path) -> PathBuf {
    // Writes a JSON array to the file named by --log-json=<path>.
    write_stub(
        dir,
        "whatweb",
        concat!(
            "for a in \"$@\"; do case \"$a\" in --log-json=*) f=\"${a#--log-json=}\";; esac; done\n",
            r#"printf '[{"target":"https://api.example.com","plugins":{"nginx":{}},"http_status":200}]' > "$f""#,
        ),
    )
}

fn stub_gobuster(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "gobuster",
        concat!(
            "printf '/admin (Status: 200) [Size: 1234]\\n",
            "/backup (Status: 403) [Size: 0]\\n'",
        ),
    )
}

fn stub_nuclei(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "nuclei",
        concat!(
            r#"printf '{"template-id":"cve-2021-1234","info":{"name":"RCE","severity":"critical"},"matched-at":"https://api.example.com"}\n"#,
            r#"{"template-id":"exposed-panel","info":{"name":"Panel"}}\n'"#,
        ),
    )
}

fn full_catalog(bin_dir: &Path) -> ToolCatalog {
    ToolCatalog::new()
        .with_tool(
            ToolKind::Subfinder,
            ToolInfo::new(stub_subfinder(bin_dir)).with_json_flag("-json"),
        )
        .with_tool(
            ToolKind::Httpx,
            ToolInfo::new(stub_httpx(bin_dir)).with_json_flag("-json"),
        )
        .with_tool(ToolKind::Whatweb, ToolInfo::new(stub_whatweb(bin_dir)))
        .with_tool(ToolKind::Gobuster, ToolInfo::new(stub_gobuster(bin_dir)))
        .with_tool(
            ToolKind::Nuclei,
            ToolInfo::new(stub_nuclei(bin_dir)).with_json_flag("-jsonl"),
        )
}

fn config_with(output: &Path, wordlists: &Path) -> PipelineConfig {
    PipelineConfig {
        output_dir: output.to_path_buf(),
        wordlists_dir: wordlists.to_path_buf(),
        ..Default::default()
    }
}

fn wordlist_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("directory-list-2.3-medium.txt");
    std::fs::write(&path, "admin\nbackup\nlogin\n").unwrap();
    path
}

#[tokio::test]
async fn test_full_scan_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    let wordlists = dir.path().join("wordlists");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::create_dir_all(&wordlists).unwrap();
    wordlist_fixture(&wordlists);

    let pipeline = ReconPipeline::new(
        config_with(&dir.path().join("out"), &wordlists),
        full_catalog(&bin),
    )
    .unwrap();

    let seeds = vec![ScanTarget::parse("example.com")];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    // The seed host is part of the subdomain set.
    assert_eq!(
        aggregate.subdomains,
        vec!["example.com", "api.example.com", "www.example.com"]
    );

    // Without only-live mode every responding host proceeds, 404s included.
    assert_eq!(aggregate.probe_results.len(), 3);
    assert_eq!(
        aggregate.live_hosts,
        vec![
            "https://api.example.com",
            "https://www.example.com",
            "https://dead.example.com"
        ]
    );

    assert_eq!(aggregate.fingerprint_results.len(), 1);
    assert_eq!(aggregate.fingerprint_results[0].url, "https://api.example.com");

    // Three responding hosts brute-forced, two paths each, URLs backfilled.
    assert_eq!(aggregate.path_results.len(), 6);
    assert!(aggregate
        .path_results
        .iter()
        .all(|p| p.url.starts_with("https://") && p.url.contains(&p.path)));

    assert_eq!(aggregate.findings.len(), 2);
    assert_eq!(aggregate.findings[0].template_id, "cve-2021-1234");
    assert!(aggregate.errors.is_empty());

    // Raw captures landed under <output>/raw.
    let raw = dir.path().join("out/raw");
    let captures: Vec<String> = std::fs::read_dir(&raw)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(captures.iter().any(|n| n.starts_with("subfinder-")));
    assert!(captures.iter().any(|n| n.starts_with("gobuster-")));
    assert!(captures.iter().any(|n| n.starts_with("nuclei-") && n.ends_with(".json")));
}

#[tokio::test]
async fn test_forbidden_host_still_scanned_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let forbidden_httpx = write_stub(
        &bin,
        "httpx-403",
        r#"printf '{"url":"https://app.example.com","status_code":403}\n'"#,
    );
    let catalog = full_catalog(&bin).with_tool(
        ToolKind::Httpx,
        ToolInfo::new(forbidden_httpx).with_json_flag("-json"),
    );

    let config = PipelineConfig {
        output_dir: dir.path().join("out"),
        wordlists_dir: dir.path().to_path_buf(),
        fast: true,
        ..Default::default()
    };
    let pipeline = ReconPipeline::new(config, catalog).unwrap();

    let seeds = vec![ScanTarget::parse("example.com")];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    // A 403 responder is still fingerprinted and vulnerability-scanned when
    // only-live mode is off.
    assert_eq!(aggregate.live_hosts, vec!["https://app.example.com"]);
    assert_eq!(aggregate.fingerprint_results.len(), 1);
    assert_eq!(aggregate.findings.len(), 2);
}

#[tokio::test]
async fn test_multiple_seeds_share_one_batch() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    // Counting stubs: each run appends a line to its tally file.
    let subfinder_tally = dir.path().join("subfinder-runs");
    let httpx_tally = dir.path().join("httpx-runs");
    let counting_subfinder = write_stub(
        &bin,
        "subfinder-counting",
        &format!(
            "echo run >> {}\nprintf '{{\"host\":\"api.example.com\"}}\\n'",
            subfinder_tally.display()
        ),
    );
    let counting_httpx = write_stub(
        &bin,
        "httpx-counting",
        &format!(
            "echo run >> {}\nprintf '{{\"url\":\"https://api.example.com\",\"status_code\":200}}\\n'",
            httpx_tally.display()
        ),
    );
    let catalog = full_catalog(&bin)
        .with_tool(
            ToolKind::Subfinder,
            ToolInfo::new(counting_subfinder).with_json_flag("-json"),
        )
        .with_tool(
            ToolKind::Httpx,
            ToolInfo::new(counting_httpx).with_json_flag("-json"),
        );

    let config = PipelineConfig {
        output_dir: dir.path().join("out"),
        wordlists_dir: dir.path().to_path_buf(),
        fast: true,
        skip_vuln_scan: true,
        ..Default::default()
    };
    let pipeline = ReconPipeline::new(config, catalog).unwrap();

    let seeds = vec![
        ScanTarget::parse("example.com"),
        ScanTarget::parse("other.com"),
    ];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    // Enumeration runs once per seed, probing once for the whole union.
    let subfinder_runs = std::fs::read_to_string(&subfinder_tally).unwrap();
    assert_eq!(subfinder_runs.lines().count(), 2);
    let httpx_runs = std::fs::read_to_string(&httpx_tally).unwrap();
    assert_eq!(httpx_runs.lines().count(), 1);

    // Both seeds sit in the unioned subdomain set ahead of discoveries.
    assert_eq!(
        aggregate.subdomains,
        vec!["example.com", "other.com", "api.example.com"]
    );

    // The probe targets file holds the union, normalized to full URLs.
    let raw = dir.path().join("out/raw");
    let targets_file = std::fs::read_dir(&raw)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("httpx-targets-"))
                .unwrap_or(false)
        })
        .unwrap();
    let listed = std::fs::read_to_string(targets_file).unwrap();
    assert_eq!(
        listed.lines().collect::<Vec<_>>(),
        vec![
            "https://example.com",
            "https://other.com",
            "https://api.example.com"
        ]
    );
}

#[tokio::test]
async fn test_no_responsive_hosts_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let silent_httpx = write_stub(&bin, "httpx-silent", "exit 0");
    let catalog = full_catalog(&bin).with_tool(
        ToolKind::Httpx,
        ToolInfo::new(silent_httpx).with_json_flag("-json"),
    );

    let pipeline = ReconPipeline::new(
        config_with(&dir.path().join("out"), dir.path()),
        catalog,
    )
    .unwrap();

    let seeds = vec![ScanTarget::parse("example.com")];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    assert!(aggregate.probe_results.is_empty());
    assert!(aggregate.live_hosts.is_empty());
    assert!(aggregate.fingerprint_results.is_empty());
    assert!(aggregate.path_results.is_empty());
    assert!(aggregate.findings.is_empty());
}

#[tokio::test]
async fn test_missing_tool_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    let wordlists = dir.path().join("wordlists");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::create_dir_all(&wordlists).unwrap();
    wordlist_fixture(&wordlists);

    // No subfinder: stage 1 records an error, probing still covers the seed.
    let mut catalog = ToolCatalog::new();
    for (kind, info) in [
        (ToolKind::Httpx, ToolInfo::new(stub_httpx(&bin)).with_json_flag("-json")),
        (ToolKind::Whatweb, ToolInfo::new(stub_whatweb(&bin))),
        (ToolKind::Gobuster, ToolInfo::new(stub_gobuster(&bin))),
        (ToolKind::Nuclei, ToolInfo::new(stub_nuclei(&bin)).with_json_flag("-jsonl")),
    ] {
        catalog = catalog.with_tool(kind, info);
    }

    let pipeline = ReconPipeline::new(
        config_with(&dir.path().join("out"), &wordlists),
        catalog,
    )
    .unwrap();

    let seeds = vec![ScanTarget::parse("example.com")];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    assert_eq!(aggregate.subdomains, vec!["example.com"]);
    assert_eq!(aggregate.errors.len(), 1);
    assert_eq!(aggregate.errors[0].tool, "subfinder");
    assert!(!aggregate.live_hosts.is_empty());
    assert_eq!(aggregate.findings.len(), 2);
}

#[tokio::test]
async fn test_only_live_filters_probe_results() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let config = PipelineConfig {
        output_dir: dir.path().join("out"),
        wordlists_dir: dir.path().to_path_buf(),
        only_live: true,
        skip_vuln_scan: true,
        fast: true,
        ..Default::default()
    };
    let pipeline = ReconPipeline::new(config, full_catalog(&bin)).unwrap();

    let seeds = vec![ScanTarget::parse("example.com")];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    // The 404 host is dropped everywhere in only-live mode.
    assert_eq!(aggregate.probe_results.len(), 2);
    assert!(aggregate
        .probe_results
        .iter()
        .all(|h| [200u16, 301].contains(&h.status_code)));
    assert_eq!(
        aggregate.live_hosts,
        vec!["https://api.example.com", "https://www.example.com"]
    );

    // Fast mode skips brute-force, skip_vuln_scan suppresses findings.
    assert!(aggregate.path_results.is_empty());
    assert!(aggregate.findings.is_empty());
}

#[tokio::test]
async fn test_missing_wordlist_skips_brute_force_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let config = PipelineConfig {
        output_dir: dir.path().join("out"),
        // Empty directory: no wordlist resolves (unless the host system has
        // the system fallback installed, which CI images do not).
        wordlists_dir: dir.path().join("nothing-here"),
        skip_vuln_scan: true,
        ..Default::default()
    };
    let pipeline = ReconPipeline::new(config, full_catalog(&bin)).unwrap();

    let seeds = vec![ScanTarget::parse("example.com")];
    let aggregate = pipeline.run_full_scan(&seeds).await.unwrap();

    if !Path::new("/usr/share/wordlists/directory-list-2.3-medium.txt").is_file() {
        // The stage is skipped quietly: no paths and no error entry.
        assert!(aggregate.path_results.is_empty());
        assert!(aggregate.errors.iter().all(|e| e.tool != "gobuster"));
    }
}
