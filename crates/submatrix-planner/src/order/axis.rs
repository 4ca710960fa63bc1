// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Column-wise and row-wise sweeps.
//!
//! [`Columns`] puts every tile of partition column `x` in level `x`;
//! [`Rows`] does the same for partition rows. Use them when dependencies
//! only run along one axis.

use super::{GridShape, ProcessingOrder};

/// One level per partition column, swept left to right.
#[derive(Debug, Clone, Copy, Default)]
pub struct Columns;

impl ProcessingOrder for Columns {
    fn name(&self) -> &str {
        "columns"
    }

    fn level_of(&self, x: usize, _y: usize, _grid: GridShape) -> usize {
        x
    }

    fn num_levels(&self, grid: GridShape) -> usize {
        if grid.is_empty() {
            0
        } else {
            grid.partitions_x
        }
    }
}

/// One level per partition row, swept top to bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rows;

impl ProcessingOrder for Rows {
    fn name(&self) -> &str {
        "rows"
    }

    fn level_of(&self, _x: usize, y: usize, _grid: GridShape) -> usize {
        y
    }

    fn num_levels(&self, grid: GridShape) -> usize {
        if grid.is_empty() {
            0
        } else {
            grid.partitions_y
        }
    }
}
