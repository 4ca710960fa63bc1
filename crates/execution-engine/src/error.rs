// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the execution engine.

use submatrix_planner::SubMatrixId;

/// Errors that can occur while building or running the engine.
///
/// Compute failures of individual flavours never appear here: they are
/// retried or recorded as unprocessed partitions.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Partition planning failed (invalid edge length, unknown order).
    #[error("planner error: {0}")]
    PlannerError(#[from] submatrix_planner::PlannerError),

    /// A selector could not be built for a device.
    #[error("selector error: {0}")]
    SelectorError(#[from] flavour::SelectorError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A device became unusable while processing a level.
    #[error("device '{device}' failed at level {level}: {detail}")]
    DeviceFailure {
        device: String,
        level: usize,
        detail: String,
    },

    /// A device worker panicked.
    #[error("worker for device '{device}' panicked at level {level}: {message}")]
    WorkerPanicked {
        device: String,
        level: usize,
        message: String,
    },

    /// Several devices failed within the same level.
    #[error("{} devices failed at level {level}: {}", .failures.len(), .failures.join("; "))]
    MultipleDeviceFailures { level: usize, failures: Vec<String> },

    /// A partition's runtime was recorded more than once.
    #[error("runtime for sub-matrix {id} recorded twice")]
    DuplicateRecord { id: SubMatrixId },

    /// The engine is not in a state that allows the operation.
    #[error("invalid engine state: {0}")]
    InvalidState(String),
}

impl EngineError {
    /// Level at which a fatal run-time failure occurred, if any.
    pub fn level(&self) -> Option<usize> {
        match self {
            Self::DeviceFailure { level, .. }
            | Self::WorkerPanicked { level, .. }
            | Self::MultipleDeviceFailures { level, .. } => Some(*level),
            _ => None,
        }
    }
}
