// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Domain hooks invoked by the engine around each sub-matrix.

use flavour::{Device, Payload};
use submatrix_planner::SubMatrix;

/// Seams through which domain logic feeds and receives data.
///
/// Both methods are called from device worker threads, concurrently for
/// different devices; implementations synchronise their own state.
pub trait EngineHooks: Send + Sync {
    /// Attaches input data to `sub_matrix` before any flavour runs.
    fn extend_sub_matrix(&self, _device: &Device, _sub_matrix: &SubMatrix, _input: &mut Payload) {}

    /// Receives the output of a successfully processed sub-matrix.
    ///
    /// Called exactly once per successful sub-matrix, after its runtime
    /// was recorded.
    fn update_global_data_structures(
        &self,
        _device: &Device,
        _sub_matrix: &SubMatrix,
        _output: &Payload,
    ) {
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl EngineHooks for NoHooks {}
