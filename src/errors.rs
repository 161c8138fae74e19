// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Error Types
 * Error taxonomy for tool orchestration with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Errors raised while driving external tools. None of these are fatal to a
/// running pipeline: the orchestrator records them in the aggregate's error
/// list and moves on to the next applicable stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The tool catalog has no executable for this tool.
    #[error("{tool} not found")]
    ToolNotFound { tool: String },

    /// The subprocess exceeded its timeout budget and was terminated.
    /// Partial output already written to the capture file is still parsed.
    #[error("{tool} timed out after {budget:?}")]
    Timeout { tool: String, budget: Duration },

    /// The subprocess could not be launched or died abnormally.
    #[error("{tool} failed: {reason}")]
    ToolFailure { tool: String, reason: String },

    /// Invalid pipeline configuration (rejected before any tool runs).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Name of the tool this error is attributable to, when there is one.
    pub fn tool(&self) -> Option<&str> {
        match self {
            PipelineError::ToolNotFound { tool }
            | PipelineError::Timeout { tool, .. }
            | PipelineError::ToolFailure { tool, .. } => Some(tool),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
