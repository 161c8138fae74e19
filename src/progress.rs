// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Progress
 * Stage identifiers and the observer hook for scan lifecycle events
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::catalog::ToolKind;
use std::fmt;
use tracing::info;

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SubdomainEnumeration,
    LiveHostProbing,
    TechFingerprinting,
    DirectoryBruteForce,
    VulnerabilityScan,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::SubdomainEnumeration,
        Stage::LiveHostProbing,
        Stage::TechFingerprinting,
        Stage::DirectoryBruteForce,
        Stage::VulnerabilityScan,
    ];

    /// 1-based position for `[n/5]` progress lines.
    pub fn index(&self) -> usize {
        match self {
            Stage::SubdomainEnumeration => 1,
            Stage::LiveHostProbing => 2,
            Stage::TechFingerprinting => 3,
            Stage::DirectoryBruteForce => 4,
            Stage::VulnerabilityScan => 5,
        }
    }

    pub fn tool(&self) -> ToolKind {
        match self {
            Stage::SubdomainEnumeration => ToolKind::Subfinder,
            Stage::LiveHostProbing => ToolKind::Httpx,
            Stage::TechFingerprinting => ToolKind::Whatweb,
            Stage::DirectoryBruteForce => ToolKind::Gobuster,
            Stage::VulnerabilityScan => ToolKind::Nuclei,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::SubdomainEnumeration => "Subdomain enumeration",
            Stage::LiveHostProbing => "Live host probing",
            Stage::TechFingerprinting => "Technology fingerprinting",
            Stage::DirectoryBruteForce => "Directory brute-force",
            Stage::VulnerabilityScan => "Vulnerability scan",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Hook for scan lifecycle events. All methods default to no-ops so callers
/// only implement what they care about.
pub trait ScanObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}
    fn stage_finished(&self, _stage: Stage, _records: usize) {}
    fn stage_skipped(&self, _stage: Stage, _reason: &str) {}
    fn tool_error(&self, _stage: Stage, _error: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Observer that reports progress through tracing.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ScanObserver for LogObserver {
    fn stage_started(&self, stage: Stage) {
        info!("[{}/5] {} started", stage.index(), stage.label());
    }

    fn stage_finished(&self, stage: Stage, records: usize) {
        info!(
            "[{}/5] {} finished with {} record(s)",
            stage.index(),
            stage.label(),
            records
        );
    }

    fn stage_skipped(&self, stage: Stage, reason: &str) {
        info!("[{}/5] {} skipped: {}", stage.index(), stage.label(), reason);
    }

    fn tool_error(&self, stage: Stage, error: &str) {
        info!("[{}/5] {} error: {}", stage.index(), stage.label(), error);
    }
}
