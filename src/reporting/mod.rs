// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reporting
 * Scan summary types and the report rendering engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod engine;
pub mod types;

pub use engine::{build_summary, extract_technologies, ReportEngine};
pub use types::{ScanInfo, ScanStatistics, ScanSummary};
