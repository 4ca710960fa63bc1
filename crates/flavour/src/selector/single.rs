// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Baseline policy: one flavour, no retry.

use super::SelectionPolicy;
use crate::FlavourStats;

/// Always picks the device's first flavour and never switches.
///
/// A compute failure makes the sub-matrix permanently unprocessable on
/// that device.
#[derive(Debug, Clone, Copy, Default)]
pub struct Single;

impl SelectionPolicy for Single {
    fn name(&self) -> &str {
        "single"
    }

    fn choose(&mut self, candidates: &[usize], _stats: &[FlavourStats], _processed: u64) -> usize {
        candidates[0]
    }

    fn retries_on_failure(&self) -> bool {
        false
    }
}
