// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for flavours and selectors.

/// A sub-matrix could not be processed by one particular flavour.
///
/// Recoverable: the caller may retry with another flavour or record the
/// partition as unprocessed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    /// The device does not have enough memory for this partition size.
    #[error("insufficient device memory: sub-matrix needs {required_bytes} bytes, device has {available_bytes}")]
    InsufficientMemory {
        required_bytes: u64,
        available_bytes: u64,
    },

    /// The flavour cannot handle this kind of sub-matrix.
    #[error("flavour '{flavour}' does not support {detail}")]
    Unsupported { flavour: String, detail: String },

    /// The computation itself reported a failure.
    #[error("kernel failure: {0}")]
    Kernel(String),
}

/// Errors returned by [`crate::Flavour::process`].
#[derive(Debug, thiserror::Error)]
pub enum FlavourError {
    /// Recoverable, per-partition failure.
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// The device itself is unusable. Not retried.
    #[error("device failure: {detail}")]
    Device { detail: String },
}

impl FlavourError {
    /// Returns `true` if another flavour may still process the partition.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Compute(_))
    }
}

/// Errors raised while building a selector.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    /// The flavour factory produced nothing for this device.
    #[error("no flavour matches device '{device}'")]
    NoMatchingFlavour { device: String },

    /// The selection policy name is not known.
    #[error("unknown selection policy '{0}'; expected 'single', 'fallback', 'epsilon-first', 'epsilon-greedy', 'epsilon-decreasing', or 'weighted-greedy'")]
    UnknownPolicy(String),

    /// A policy parameter is out of range.
    #[error("invalid selector parameter '{name}': {detail}")]
    InvalidParameter { name: &'static str, detail: String },
}
