// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Anti-diagonal sweep.
//!
//! Level of partition `(x, y)` is `x + y`. A partition's left, upper and
//! upper-left neighbours always sit in an earlier level, so anything
//! carried across tile borders (diagonal or vertical line fragments) is
//! complete before the tile is processed.
//!
//! ```text
//!  0 1 2 3
//!  1 2 3 4
//!  2 3 4 5
//! ```

use super::{GridShape, ProcessingOrder};

/// Anti-diagonal wavefront order. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagonal;

impl ProcessingOrder for Diagonal {
    fn name(&self) -> &str {
        "diagonal"
    }

    fn level_of(&self, x: usize, y: usize, _grid: GridShape) -> usize {
        x + y
    }

    fn num_levels(&self, grid: GridShape) -> usize {
        if grid.is_empty() {
            0
        } else {
            grid.partitions_x + grid.partitions_y - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_levels() {
        let grid = GridShape {
            partitions_x: 3,
            partitions_y: 2,
        };
        assert_eq!(Diagonal.num_levels(grid), 4);
        assert_eq!(Diagonal.level_of(0, 0, grid), 0);
        assert_eq!(Diagonal.level_of(2, 1, grid), 3);
    }

    #[test]
    fn test_neighbours_precede() {
        let grid = GridShape {
            partitions_x: 5,
            partitions_y: 5,
        };
        for y in 1..5 {
            for x in 1..5 {
                let here = Diagonal.level_of(x, y, grid);
                assert!(Diagonal.level_of(x - 1, y, grid) < here);
                assert!(Diagonal.level_of(x, y - 1, grid) < here);
                assert!(Diagonal.level_of(x - 1, y - 1, grid) < here);
            }
        }
    }

    #[test]
    fn test_empty_grid() {
        let grid = GridShape {
            partitions_x: 0,
            partitions_y: 7,
        };
        assert_eq!(Diagonal.num_levels(grid), 0);
    }
}
