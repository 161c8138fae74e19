// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Output Normalizer
 * Parses raw tool output (JSON, JSONL or free text) into normalized records
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::catalog::ToolKind;
use crate::types::{DiscoveredPath, Finding, FindingSeverity, LiveHost, Record, TechFingerprint};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::HashSet;

static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}")
        .expect("hostname regex")
});

// Gobuster plain-text line: `/admin (Status: 200) [Size: 1234]`
static GOBUSTER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([/\w\-\.]+)\s+\(Status:\s*(\d+)\)\s+\[Size:\s*(\d+)\]").expect("gobuster regex")
});

/// Normalize one tool's raw captured output into records. Never fails:
/// malformed input degrades through the per-tool fallback chain and, at
/// worst, yields an empty sequence.
pub fn normalize(tool: ToolKind, raw: &str) -> Vec<Record> {
    match tool {
        ToolKind::Subfinder => parse_subdomains(raw)
            .into_iter()
            .map(|host| Record::Subdomain { host })
            .collect(),
        ToolKind::Httpx => parse_live_hosts(raw).into_iter().map(Record::LiveHost).collect(),
        ToolKind::Whatweb => parse_fingerprints(raw)
            .into_iter()
            .map(Record::TechFingerprint)
            .collect(),
        ToolKind::Gobuster => parse_paths(raw)
            .into_iter()
            .map(Record::DiscoveredPath)
            .collect(),
        ToolKind::Nuclei => parse_findings(raw).into_iter().map(Record::Finding).collect(),
    }
}

/// Parse one JSON object per non-blank line, silently skipping anything that
/// does not deserialize. This is the shared base for every JSONL tool.
fn jsonl<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<T>(line).ok())
        .collect()
}

#[derive(Debug, Deserialize)]
struct SubfinderLine {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

impl SubfinderLine {
    fn hostname(self) -> Option<String> {
        [self.host, self.subdomain, self.domain]
            .into_iter()
            .flatten()
            .find(|h| !h.trim().is_empty())
            .map(|h| h.trim().to_string())
    }
}

/// Subdomain output is a set: hostnames deduplicated, first-seen order kept.
/// When no line parses as JSON at all, fall back to a hostname-pattern scan
/// over the raw text (some enumerators only emit plain hostnames).
pub fn parse_subdomains(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut hosts: Vec<String> = jsonl::<SubfinderLine>(raw)
        .into_iter()
        .filter_map(SubfinderLine::hostname)
        .filter(|h| seen.insert(h.to_ascii_lowercase()))
        .collect();

    if hosts.is_empty() {
        hosts = HOSTNAME_RE
            .find_iter(raw)
            .map(|m| m.as_str().to_string())
            .filter(|h| seen.insert(h.to_ascii_lowercase()))
            .collect();
    }

    hosts
}

#[derive(Debug, Deserialize)]
struct HttpxLine {
    #[serde(default)]
    url: String,
    #[serde(rename = "status_code", alias = "status-code", default)]
    status_code: u16,
    #[serde(default)]
    title: String,
    #[serde(rename = "content_length", alias = "content-length", default)]
    content_length: u64,
    #[serde(alias = "webserver", default)]
    server: String,
    #[serde(alias = "technologies", default)]
    tech: Vec<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    host: String,
}

impl From<HttpxLine> for LiveHost {
    fn from(line: HttpxLine) -> Self {
        LiveHost {
            url: line.url,
            status_code: line.status_code,
            title: line.title,
            content_length: line.content_length,
            server: line.server,
            tech: line.tech,
            headers: line.headers,
            host: line.host,
        }
    }
}

/// Probe output: one JSON object per line, encounter order preserved.
pub fn parse_live_hosts(raw: &str) -> Vec<LiveHost> {
    jsonl::<HttpxLine>(raw).into_iter().map(LiveHost::from).collect()
}

#[derive(Debug, Deserialize)]
struct WhatwebEntry {
    #[serde(alias = "url", default)]
    target: String,
    #[serde(default)]
    plugins: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "http_status", alias = "http-status", default)]
    http_status: u16,
}

impl From<WhatwebEntry> for TechFingerprint {
    fn from(entry: WhatwebEntry) -> Self {
        TechFingerprint {
            url: entry.target,
            plugins: entry.plugins,
            http_status: entry.http_status,
        }
    }
}

/// Fingerprinter output is one JSON document: either a list of objects or a
/// single object. On parse failure, retry as line-delimited JSON; on total
/// failure, return nothing.
pub fn parse_fingerprints(raw: &str) -> Vec<TechFingerprint> {
    if let Ok(entries) = serde_json::from_str::<Vec<WhatwebEntry>>(raw) {
        return entries.into_iter().map(TechFingerprint::from).collect();
    }
    if let Ok(entry) = serde_json::from_str::<WhatwebEntry>(raw) {
        return vec![entry.into()];
    }
    jsonl::<WhatwebEntry>(raw)
        .into_iter()
        .map(TechFingerprint::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct GobusterLine {
    #[serde(alias = "Path", default)]
    path: String,
    #[serde(alias = "Status", default)]
    status: u16,
    #[serde(alias = "Size", default)]
    size: u64,
    #[serde(alias = "URL", default)]
    url: String,
}

impl From<GobusterLine> for DiscoveredPath {
    fn from(line: GobusterLine) -> Self {
        DiscoveredPath {
            path: line.path,
            status: line.status,
            size: line.size,
            url: line.url,
        }
    }
}

/// Brute-forcer output: JSONL when the tool supports a JSON mode, otherwise
/// its fixed text format `<path> (Status: <code>) [Size: <bytes>]`.
pub fn parse_paths(raw: &str) -> Vec<DiscoveredPath> {
    let from_json: Vec<DiscoveredPath> = jsonl::<GobusterLine>(raw)
        .into_iter()
        .map(DiscoveredPath::from)
        .filter(|p| !p.path.is_empty() || !p.url.is_empty())
        .collect();
    if !from_json.is_empty() {
        return from_json;
    }

    GOBUSTER_LINE_RE
        .captures_iter(raw)
        .map(|caps| DiscoveredPath {
            path: caps[1].to_string(),
            status: caps[2].parse().unwrap_or_default(),
            size: caps[3].parse().unwrap_or_default(),
            url: String::new(),
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct NucleiInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NucleiLine {
    #[serde(rename = "template-id", alias = "template_id", default)]
    template_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    info: NucleiInfo,
    #[serde(rename = "matched-at", alias = "matched_at", default)]
    matched_at: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    host: String,
    #[serde(rename = "extracted-results", alias = "extracted_results", default)]
    extracted_results: Vec<String>,
}

impl From<NucleiLine> for Finding {
    fn from(line: NucleiLine) -> Self {
        let name = line.info.name.or(line.name).unwrap_or_default();
        let severity = line
            .info
            .severity
            .or(line.severity)
            .map(|s| FindingSeverity::parse(&s))
            .unwrap_or_default();
        Finding {
            template_id: line.template_id,
            name,
            severity,
            matched_at: line.matched_at,
            url: line.url,
            host: line.host,
            extracted_results: line.extracted_results,
        }
    }
}

/// Vulnerability-scanner output: one finding per JSONL line. Severity comes
/// from the nested `info` block when present, the top level otherwise, and
/// defaults to `info` when absent entirely.
pub fn parse_findings(raw: &str) -> Vec<Finding> {
    jsonl::<NucleiLine>(raw).into_iter().map(Finding::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomains_deduplicated_set() {
        let raw = concat!(
            r#"{"host":"api.example.com"}"#, "\n",
            r#"{"host":"www.example.com"}"#, "\n",
            r#"{"host":"API.example.com"}"#, "\n",
            r#"{"subdomain":"mail.example.com"}"#, "\n",
        );
        let hosts = parse_subdomains(raw);
        assert_eq!(hosts.len(), 3);
        assert!(hosts.len() <= raw.lines().count());
        assert_eq!(hosts[0], "api.example.com");
        assert!(hosts.contains(&"mail.example.com".to_string()));
    }

    #[test]
    fn test_subdomains_regex_fallback() {
        let raw = "found: api.example.com\nand www.example.com plus www.example.com again\n";
        let hosts = parse_subdomains(raw);
        assert_eq!(hosts, vec!["api.example.com", "www.example.com"]);
    }

    #[test]
    fn test_mixed_garbage_lines_are_skipped() {
        let raw = concat!(
            r#"{"url":"https://a.example.com","status_code":200}"#, "\n",
            "this is not json\n",
            "{broken\n",
            r#"{"url":"https://b.example.com","status_code":301,"title":"Moved"}"#, "\n",
        );
        let hosts = parse_live_hosts(raw);
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].url, "https://a.example.com");
        assert_eq!(hosts[1].status_code, 301);
        assert_eq!(hosts[1].title, "Moved");
    }

    #[test]
    fn test_live_host_missing_fields_default() {
        let hosts = parse_live_hosts(r#"{"url":"https://a.example.com"}"#);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].status_code, 0);
        assert!(hosts[0].tech.is_empty());
        assert!(hosts[0].headers.is_empty());
    }

    #[test]
    fn test_fingerprints_accept_object_or_list() {
        let single = r#"{"target":"https://a.example.com","plugins":{"nginx":{}},"http_status":200}"#;
        let parsed = parse_fingerprints(single);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].url, "https://a.example.com");
        assert!(parsed[0].plugins.contains_key("nginx"));

        let list = format!("[{single},{single}]");
        assert_eq!(parse_fingerprints(&list).len(), 2);
    }

    #[test]
    fn test_fingerprints_retry_as_jsonl_then_empty() {
        let jsonl_input = concat!(
            r#"{"target":"https://a.example.com","http_status":200}"#, "\n",
            r#"{"target":"https://b.example.com","http_status":403}"#, "\n",
        );
        assert_eq!(parse_fingerprints(jsonl_input).len(), 2);
        assert!(parse_fingerprints("total garbage").is_empty());
    }

    #[test]
    fn test_gobuster_text_fallback() {
        let paths = parse_paths("/admin (Status: 200) [Size: 1234]\n/backup (Status: 403) [Size: 0]\n");
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].path, "/admin");
        assert_eq!(paths[0].status, 200);
        assert_eq!(paths[0].size, 1234);
        assert_eq!(paths[1].status, 403);
    }

    #[test]
    fn test_gobuster_json_mode_preferred() {
        let raw = r#"{"Path":"/login","Status":302,"Size":42,"URL":"https://a.example.com/login"}"#;
        let paths = parse_paths(raw);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].path, "/login");
        assert_eq!(paths[0].status, 302);
        assert_eq!(paths[0].url, "https://a.example.com/login");
    }

    #[test]
    fn test_finding_key_aliases_agree() {
        let dashed = r#"{"template-id":"cve-2021-1234","info":{"name":"Test","severity":"high"}}"#;
        let underscored = r#"{"template_id":"cve-2021-1234","info":{"name":"Test","severity":"high"}}"#;
        let a = parse_findings(dashed);
        let b = parse_findings(underscored);
        assert_eq!(a, b);
        assert_eq!(a[0].template_id, "cve-2021-1234");
        assert_eq!(a[0].severity, FindingSeverity::High);
    }

    #[test]
    fn test_finding_severity_defaults_to_info() {
        let findings = parse_findings(r#"{"template-id":"exposed-panel","info":{"name":"Panel"}}"#);
        assert_eq!(findings[0].severity, FindingSeverity::Info);

        let findings = parse_findings(r#"{"template-id":"x","severity":"CRITICAL"}"#);
        assert_eq!(findings[0].severity, FindingSeverity::Critical);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = concat!(
            r#"{"host":"api.example.com"}"#, "\n",
            "garbage\n",
            r#"{"host":"www.example.com"}"#, "\n",
        );
        let first = normalize(ToolKind::Subfinder, raw);
        let second = normalize(ToolKind::Subfinder, raw);
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_empty_input_yields_empty() {
        for kind in ToolKind::ALL {
            assert!(normalize(kind, "").is_empty());
            assert!(normalize(kind, "\n\n").is_empty());
        }
    }
}
