// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partition plan: the output of the planner.
//!
//! A plan is an ordered sequence of [`SubMatrixQueue`]s, one per
//! non-empty level. The plan is the contract between the planner and
//! the execution engine.

use crate::order::GridShape;
use crate::{PlannerError, SubMatrix, SubMatrixQueue};

/// The complete tiling of a matrix, grouped into ordered levels.
#[derive(Debug)]
pub struct PartitionPlan {
    /// Name of the processing order that produced the levels.
    pub order_name: String,
    /// Global matrix width (columns).
    pub matrix_width: usize,
    /// Global matrix height (rows).
    pub matrix_height: usize,
    /// Maximum sub-matrix edge length.
    pub edge_length: usize,
    /// Shape of the partition grid.
    pub grid: GridShape,
    queues: Vec<SubMatrixQueue>,
}

impl PartitionPlan {
    pub(crate) fn new(
        order_name: &str,
        matrix_width: usize,
        matrix_height: usize,
        edge_length: usize,
        grid: GridShape,
        queues: Vec<SubMatrixQueue>,
    ) -> Self {
        Self {
            order_name: order_name.to_string(),
            matrix_width,
            matrix_height,
            edge_length,
            grid,
            queues,
        }
    }

    /// The level queues in processing order.
    pub fn queues(&self) -> &[SubMatrixQueue] {
        &self.queues
    }

    /// Number of non-empty levels.
    pub fn num_levels(&self) -> usize {
        self.queues.len()
    }

    /// Total number of planned sub-matrices (independent of draining).
    pub fn num_sub_matrices(&self) -> usize {
        self.queues.iter().map(|q| q.capacity()).sum()
    }

    /// Returns `true` if the plan has nothing to process.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Copies every sub-matrix still queued, level by level.
    pub fn sub_matrices(&self) -> Vec<SubMatrix> {
        self.queues.iter().flat_map(|q| q.snapshot()).collect()
    }

    /// Validates the plan. Must be called before any queue is drained.
    ///
    /// Checks:
    /// - Every grid cell is covered by exactly one sub-matrix.
    /// - Each sub-matrix sits at its grid offset with the expected size,
    ///   so the tiles cover the matrix with no gap and no overlap.
    /// - Queue levels are strictly increasing, queues are non-empty and
    ///   all members carry their queue's level.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let fail = |detail: String| PlannerError::InconsistentPlan {
            order: self.order_name.clone(),
            detail,
        };

        let mut seen = vec![false; self.grid.num_partitions()];
        let mut previous_level: Option<usize> = None;

        for queue in &self.queues {
            if queue.capacity() == 0 {
                return Err(fail(format!("level {} is empty", queue.level())));
            }
            if previous_level.is_some_and(|p| p >= queue.level()) {
                return Err(fail(format!(
                    "level {} follows level {}",
                    queue.level(),
                    previous_level.unwrap_or_default(),
                )));
            }
            previous_level = Some(queue.level());

            for sm in queue.snapshot() {
                if sm.partition_level() != queue.level() {
                    return Err(fail(format!(
                        "{} found in queue for level {}",
                        sm,
                        queue.level()
                    )));
                }
                let (x, y) = (sm.partition_index_x(), sm.partition_index_y());
                if x >= self.grid.partitions_x || y >= self.grid.partitions_y {
                    return Err(fail(format!("{sm} lies outside the partition grid")));
                }
                let slot = &mut seen[y * self.grid.partitions_x + x];
                if *slot {
                    return Err(fail(format!("partition ({x}, {y}) planned twice")));
                }
                *slot = true;

                let expected_x = x * self.edge_length;
                let expected_y = y * self.edge_length;
                let expected_dim_x = self.edge_length.min(self.matrix_width - expected_x);
                let expected_dim_y = self.edge_length.min(self.matrix_height - expected_y);
                if sm.offset_x() != expected_x
                    || sm.offset_y() != expected_y
                    || sm.dim_x() != expected_dim_x
                    || sm.dim_y() != expected_dim_y
                {
                    return Err(fail(format!(
                        "{sm} does not match its grid cell ({expected_x}, {expected_y}) \
                         {expected_dim_x}x{expected_dim_y}"
                    )));
                }
            }
        }

        if let Some(missing) = seen.iter().position(|covered| !covered) {
            return Err(fail(format!(
                "partition ({}, {}) not covered",
                missing % self.grid.partitions_x,
                missing / self.grid.partitions_x,
            )));
        }
        Ok(())
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let level_sizes: Vec<usize> = self.queues.iter().map(|q| q.capacity()).collect();
        let widest = level_sizes.iter().copied().max().unwrap_or(0);
        format!(
            "Plan '{}': {}x{} matrix, edge {}, {}x{} grid, {} sub-matrices in {} levels \
             (widest level {}), level sizes: {:?}",
            self.order_name,
            self.matrix_width,
            self.matrix_height,
            self.edge_length,
            self.grid.partitions_x,
            self.grid.partitions_y,
            self.num_sub_matrices(),
            self.num_levels(),
            widest,
            level_sizes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(x: usize, y: usize, level: usize) -> SubMatrix {
        SubMatrix::new((x, y), 2, (x * 10, y * 10), (10, 10), level).unwrap()
    }

    fn grid() -> GridShape {
        GridShape {
            partitions_x: 2,
            partitions_y: 2,
        }
    }

    fn sample_plan() -> PartitionPlan {
        PartitionPlan::new(
            "test",
            20,
            20,
            10,
            grid(),
            vec![
                SubMatrixQueue::new(0, vec![tile(0, 0, 0)]),
                SubMatrixQueue::new(1, vec![tile(1, 0, 1), tile(0, 1, 1)]),
                SubMatrixQueue::new(2, vec![tile(1, 1, 2)]),
            ],
        )
    }

    #[test]
    fn test_validate_ok() {
        sample_plan().validate().unwrap();
    }

    #[test]
    fn test_counts() {
        let plan = sample_plan();
        assert_eq!(plan.num_levels(), 3);
        assert_eq!(plan.num_sub_matrices(), 4);
        assert_eq!(plan.sub_matrices().len(), 4);
    }

    #[test]
    fn test_validate_missing_partition() {
        let plan = PartitionPlan::new(
            "gap",
            20,
            20,
            10,
            grid(),
            vec![SubMatrixQueue::new(0, vec![tile(0, 0, 0), tile(1, 0, 0), tile(0, 1, 0)])],
        );
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("not covered"));
    }

    #[test]
    fn test_validate_duplicate_partition() {
        let plan = PartitionPlan::new(
            "dup",
            20,
            20,
            10,
            grid(),
            vec![
                SubMatrixQueue::new(0, vec![tile(0, 0, 0), tile(1, 0, 0)]),
                SubMatrixQueue::new(1, vec![tile(1, 0, 1), tile(0, 1, 1), tile(1, 1, 1)]),
            ],
        );
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("planned twice"));
    }

    #[test]
    fn test_validate_level_order() {
        let plan = PartitionPlan::new(
            "backwards",
            20,
            20,
            10,
            grid(),
            vec![
                SubMatrixQueue::new(1, vec![tile(1, 0, 1), tile(0, 1, 1)]),
                SubMatrixQueue::new(0, vec![tile(0, 0, 0), tile(1, 1, 0)]),
            ],
        );
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_wrong_offset() {
        let bad = SubMatrix::new((1, 1), 2, (11, 10), (9, 10), 2).unwrap();
        let plan = PartitionPlan::new(
            "shifted",
            20,
            20,
            10,
            grid(),
            vec![
                SubMatrixQueue::new(0, vec![tile(0, 0, 0)]),
                SubMatrixQueue::new(1, vec![tile(1, 0, 1), tile(0, 1, 1)]),
                SubMatrixQueue::new(2, vec![bad]),
            ],
        );
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let s = sample_plan().summary();
        assert!(s.contains("'test'"));
        assert!(s.contains("4 sub-matrices in 3 levels"));
        assert!(s.contains("[1, 2, 1]"));
    }
}
