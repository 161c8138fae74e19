// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Nuotta Recon Pipeline
 * Orchestrates external recon tools into one normalized scan
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod catalog;
pub mod config;
pub mod errors;
pub mod executor;
pub mod invoker;
pub mod normalizer;
pub mod pipeline;
pub mod progress;
pub mod reporting;
pub mod types;

pub use catalog::{ToolCatalog, ToolInfo, ToolKind};
pub use config::PipelineConfig;
pub use errors::{PipelineError, PipelineResult};
pub use pipeline::ReconPipeline;
pub use progress::{LogObserver, NoopObserver, ScanObserver, Stage};
pub use types::{Record, ScanAggregate, ScanTarget};
