// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Single-level order: every tile is independent.

use super::{GridShape, ProcessingOrder};

/// All partitions in one level. Maximum parallelism, no cross-tile
/// dependencies honoured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bulk;

impl ProcessingOrder for Bulk {
    fn name(&self) -> &str {
        "bulk"
    }

    fn level_of(&self, _x: usize, _y: usize, _grid: GridShape) -> usize {
        0
    }

    fn num_levels(&self, grid: GridShape) -> usize {
        usize::from(!grid.is_empty())
    }
}
