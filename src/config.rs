// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Configuration
 * Mode flags and resource settings, read once at pipeline construction
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Configuration for one full scan. Mode flags are read here once and applied
/// uniformly across stages; no stage re-derives them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Directory that receives the `raw/` capture subdirectory and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Thread-count argument forwarded to tools that accept one. This is not
    /// the parallel-stage worker cap, which is fixed (see pipeline).
    #[validate(range(min = 1, max = 200))]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Proxy URL forwarded to every stage that supports one.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Lower rate limits, fewer workers, silent flags on every invocation.
    #[serde(default)]
    pub stealth: bool,

    /// Keep only hosts answering with a "live" status code after probing.
    #[serde(default)]
    pub only_live: bool,

    /// Skip the vulnerability-scan stage entirely.
    #[serde(default)]
    pub skip_vuln_scan: bool,

    /// Fast mode: smaller wordlists and extension lists, tighter severity
    /// filter, and the directory brute-force stage is skipped.
    #[serde(default)]
    pub fast: bool,

    /// Primary wordlist directory for directory brute-forcing.
    #[serde(default = "default_wordlists_dir")]
    pub wordlists_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}

fn default_threads() -> usize {
    20
}

fn default_wordlists_dir() -> PathBuf {
    PathBuf::from("/usr/share/seclists")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            threads: default_threads(),
            proxy: None,
            stealth: false,
            only_live: false,
            skip_vuln_scan: false,
            fast: false,
            wordlists_dir: default_wordlists_dir(),
        }
    }
}

impl PipelineConfig {
    /// Validate field constraints, mapping validator output into the pipeline
    /// error taxonomy.
    pub fn check(&self) -> PipelineResult<()> {
        self.validate()
            .map_err(|e| PipelineError::Configuration(e.to_string()))
    }
}
