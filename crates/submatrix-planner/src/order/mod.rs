// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`ProcessingOrder`] trait and its implementations.
//!
//! An order maps every partition of the grid to a level. Partitions in
//! the same level may run concurrently; level `n + 1` starts only after
//! level `n` is fully resolved. The order encodes whatever dependency
//! exists between partitions; workers never need to know it.

pub mod axis;
pub mod bulk;
pub mod diagonal;

use crate::PlannerError;

pub use axis::{Columns, Rows};
pub use bulk::Bulk;
pub use diagonal::Diagonal;

/// Shape of the partition grid (number of tiles along each axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GridShape {
    pub partitions_x: usize,
    pub partitions_y: usize,
}

impl GridShape {
    /// Total number of partitions in the grid.
    pub fn num_partitions(&self) -> usize {
        self.partitions_x * self.partitions_y
    }

    pub fn is_empty(&self) -> bool {
        self.num_partitions() == 0
    }
}

/// Assigns partitions to processing levels.
///
/// Orders are purely algorithmic, which keeps them trivially testable.
pub trait ProcessingOrder: Send + Sync + std::fmt::Debug {
    /// Name used in configuration files and plan summaries.
    fn name(&self) -> &str;

    /// Level of the partition at grid position `(x, y)`.
    fn level_of(&self, x: usize, y: usize, grid: GridShape) -> usize;

    /// Number of levels this order produces for `grid`.
    fn num_levels(&self, grid: GridShape) -> usize;
}

/// Creates a processing order from its configuration name.
///
/// Names are matched case-insensitively; `vertical` and `horizontal` are
/// accepted as aliases of `columns` and `rows`.
pub fn create_order(name: &str) -> Result<Box<dyn ProcessingOrder>, PlannerError> {
    match name.to_lowercase().as_str() {
        "diagonal" => Ok(Box::new(Diagonal)),
        "columns" | "vertical" => Ok(Box::new(Columns)),
        "rows" | "horizontal" => Ok(Box::new(Rows)),
        "bulk" => Ok(Box::new(Bulk)),
        _ => Err(PlannerError::UnknownOrder(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_known() {
        assert_eq!(create_order("diagonal").unwrap().name(), "diagonal");
        assert_eq!(create_order("Columns").unwrap().name(), "columns");
        assert_eq!(create_order("vertical").unwrap().name(), "columns");
        assert_eq!(create_order("rows").unwrap().name(), "rows");
        assert_eq!(create_order("bulk").unwrap().name(), "bulk");
    }

    #[test]
    fn test_create_order_unknown() {
        let err = create_order("spiral").unwrap_err();
        assert!(matches!(err, PlannerError::UnknownOrder(ref n) if n == "spiral"));
    }

    #[test]
    fn test_levels_cover_range() {
        let grid = GridShape {
            partitions_x: 4,
            partitions_y: 3,
        };
        for name in ["diagonal", "columns", "rows", "bulk"] {
            let order = create_order(name).unwrap();
            let levels = order.num_levels(grid);
            for y in 0..grid.partitions_y {
                for x in 0..grid.partitions_x {
                    assert!(order.level_of(x, y, grid) < levels, "{name} out of range");
                }
            }
        }
    }
}
