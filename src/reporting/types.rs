// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Report Types
 * Serializable shapes for the machine-readable scan summary
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{Finding, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header block of the summary: what was scanned, when, with what.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanInfo {
    pub target: String,
    pub started_at: String,
    pub finished_at: String,
    pub tool_versions: BTreeMap<String, Option<String>>,
    pub stealth: bool,
    pub fast: bool,
}

/// Per-stage counts plus the severity breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatistics {
    pub subdomains: usize,
    pub live_hosts: usize,
    pub fingerprints: usize,
    pub paths: usize,
    pub findings: usize,
    pub errors: usize,
    pub severity_counts: BTreeMap<String, usize>,
}

/// The complete machine-readable summary written to `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub scan_info: ScanInfo,
    pub statistics: ScanStatistics,
    pub subdomains: Vec<String>,
    pub live_hosts: Vec<String>,
    pub technologies: Vec<String>,
    pub findings: Vec<Finding>,
    pub errors: Vec<ScanError>,
}
