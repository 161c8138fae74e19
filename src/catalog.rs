// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Tool Catalog
 * Discovery and capability lookup for external scanning tools
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The five external tool kinds the pipeline drives, in stage order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Subfinder,
    Httpx,
    Whatweb,
    Gobuster,
    Nuclei,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Subfinder,
        ToolKind::Httpx,
        ToolKind::Whatweb,
        ToolKind::Gobuster,
        ToolKind::Nuclei,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Subfinder => "subfinder",
            ToolKind::Httpx => "httpx",
            ToolKind::Whatweb => "whatweb",
            ToolKind::Gobuster => "gobuster",
            ToolKind::Nuclei => "nuclei",
        }
    }

    /// Install locations checked before falling back to a PATH search.
    pub fn default_paths(&self) -> &'static [&'static str] {
        match self {
            ToolKind::Subfinder => &["/usr/local/bin/subfinder", "/usr/bin/subfinder"],
            ToolKind::Httpx => &["/usr/local/bin/httpx", "/usr/bin/httpx"],
            ToolKind::Whatweb => &["/usr/local/bin/whatweb", "/usr/bin/whatweb"],
            ToolKind::Gobuster => &["/usr/local/bin/gobuster", "/usr/bin/gobuster"],
            ToolKind::Nuclei => &["/usr/local/bin/nuclei", "/usr/bin/nuclei"],
        }
    }

    /// Known JSON-output flags, in preference order.
    pub fn json_flags(&self) -> &'static [&'static str] {
        match self {
            ToolKind::Subfinder => &["-json", "--json", "-oJ"],
            ToolKind::Httpx => &["-json", "--json"],
            ToolKind::Whatweb => &["--log-json"],
            ToolKind::Gobuster => &["-oJ"],
            ToolKind::Nuclei => &["-jsonl", "-json", "--json"],
        }
    }

    pub fn version_flags(&self) -> &'static [&'static str] {
        match self {
            ToolKind::Whatweb => &["--version"],
            _ => &["-version", "--version"],
        }
    }

    /// Per-invocation timeout budget. The gobuster budget applies per host,
    /// the nuclei budget to the whole target batch.
    pub fn timeout(&self) -> Duration {
        match self {
            ToolKind::Subfinder => Duration::from_secs(300),
            ToolKind::Httpx => Duration::from_secs(600),
            ToolKind::Whatweb => Duration::from_secs(300),
            ToolKind::Gobuster => Duration::from_secs(600),
            ToolKind::Nuclei => Duration::from_secs(1800),
        }
    }

    /// Extension of the raw capture file.
    pub fn capture_extension(&self) -> &'static str {
        match self {
            ToolKind::Gobuster => "txt",
            _ => "json",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved capabilities of one installed tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub path: PathBuf,
    pub json_flag: Option<String>,
    pub version: Option<String>,
}

impl ToolInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            json_flag: None,
            version: None,
        }
    }

    pub fn with_json_flag(mut self, flag: &str) -> Self {
        self.json_flag = Some(flag.to_string());
        self
    }
}

/// Mapping from tool kind to resolved path and capabilities. Built once and
/// injected into the pipeline at construction; a missing tool means its stage
/// is skipped with a recorded error, never a fatal failure.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<ToolKind, ToolInfo>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the local system for every tool kind: default install paths
    /// first, then a PATH search, then a `--help` scan for the JSON flag and
    /// a version query.
    pub fn discover() -> Self {
        let mut tools = HashMap::new();
        for kind in ToolKind::ALL {
            let Some(path) = resolve_binary(kind) else {
                warn!("{} not found at expected paths or in PATH", kind);
                continue;
            };
            let json_flag = detect_json_flag(kind, &path);
            let version = probe_version(kind, &path);
            info!(
                "found {} at {} (version: {})",
                kind,
                path.display(),
                version.as_deref().unwrap_or("unknown")
            );
            tools.insert(
                kind,
                ToolInfo {
                    path,
                    json_flag,
                    version,
                },
            );
        }
        Self { tools }
    }

    /// Register or replace one tool entry. Used for injection in tests and
    /// by callers that manage their own tool inventory.
    pub fn with_tool(mut self, kind: ToolKind, info: ToolInfo) -> Self {
        self.tools.insert(kind, info);
        self
    }

    pub fn get(&self, kind: ToolKind) -> Option<&ToolInfo> {
        self.tools.get(&kind)
    }

    pub fn missing(&self) -> Vec<ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| !self.tools.contains_key(kind))
            .collect()
    }

    /// Version table for every tool kind, `None` where the tool is absent.
    /// Ordered by tool name for stable report output.
    pub fn versions(&self) -> BTreeMap<String, Option<String>> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind.name().to_string(),
                    self.tools.get(&kind).and_then(|t| t.version.clone()),
                )
            })
            .collect()
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn resolve_binary(kind: ToolKind) -> Option<PathBuf> {
    for candidate in kind.default_paths() {
        let path = Path::new(candidate);
        if is_executable(path) {
            return Some(path.to_path_buf());
        }
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(kind.name()))
        .find(|candidate| is_executable(candidate))
}

/// Scan the tool's `--help` output for a known JSON flag. Falls back to the
/// first known flag when the help text is unreadable, matching how most of
/// these tools silently accept their historical aliases.
fn detect_json_flag(kind: ToolKind, path: &Path) -> Option<String> {
    let known = kind.json_flags();
    match Command::new(path).arg("--help").output() {
        Ok(output) => {
            let help = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
            .to_lowercase();
            for flag in known {
                if help.contains(&flag.to_lowercase()) {
                    return Some(flag.to_string());
                }
            }
        }
        Err(e) => {
            debug!("could not read help output for {}: {}", kind, e);
        }
    }
    known.first().map(|flag| flag.to_string())
}

fn probe_version(kind: ToolKind, path: &Path) -> Option<String> {
    for flag in kind.version_flags() {
        match Command::new(path).arg(flag).output() {
            Ok(output) if output.status.success() => {
                let combined = format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                let version = combined.trim();
                if !version.is_empty() {
                    return Some(version.lines().next().unwrap_or(version).to_string());
                }
            }
            Ok(_) => continue,
            Err(e) => {
                debug!("version probe failed for {} with {}: {}", kind, flag, e);
            }
        }
    }
    None
}
