// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tiling a matrix into sub-matrices and bucketing them into levels.

use crate::order::{GridShape, ProcessingOrder};
use crate::{PartitionPlan, PlannerError, SubMatrix, SubMatrixQueue};

/// Default maximum sub-matrix edge length.
pub const DEFAULT_EDGE_LENGTH: usize = 10240;

/// Number of tiles of at most `edge_length` needed to cover `extent`.
fn partitions_along(extent: usize, edge_length: usize) -> usize {
    extent.div_ceil(edge_length)
}

/// Plans the partitioning of a `matrix_width` x `matrix_height` matrix.
///
/// Every tile is at most `edge_length` on each side; the last column and
/// row of tiles take the remainder. Tiles are grouped into one queue per
/// non-empty level of `order`, in level order.
///
/// A zero-sized matrix yields an empty plan. A zero edge length is a
/// configuration error.
pub fn plan(
    matrix_width: usize,
    matrix_height: usize,
    edge_length: usize,
    order: &dyn ProcessingOrder,
) -> Result<PartitionPlan, PlannerError> {
    if edge_length == 0 {
        return Err(PlannerError::InvalidEdgeLength(edge_length));
    }

    let grid = GridShape {
        partitions_x: partitions_along(matrix_width, edge_length),
        partitions_y: partitions_along(matrix_height, edge_length),
    };

    let mut levels: Vec<Vec<SubMatrix>> = vec![Vec::new(); order.num_levels(grid)];

    for y in 0..grid.partitions_y {
        let offset_y = y * edge_length;
        let dim_y = edge_length.min(matrix_height - offset_y);
        for x in 0..grid.partitions_x {
            let offset_x = x * edge_length;
            let dim_x = edge_length.min(matrix_width - offset_x);
            let level = order.level_of(x, y, grid);
            if level >= levels.len() {
                return Err(PlannerError::InconsistentPlan {
                    order: order.name().to_string(),
                    detail: format!(
                        "partition ({x}, {y}) assigned level {level} of {}",
                        levels.len()
                    ),
                });
            }
            levels[level].push(SubMatrix::new(
                (x, y),
                grid.partitions_x,
                (offset_x, offset_y),
                (dim_x, dim_y),
                level,
            )?);
        }
    }

    let queues: Vec<SubMatrixQueue> = levels
        .into_iter()
        .enumerate()
        .filter(|(_, members)| !members.is_empty())
        .map(|(level, members)| SubMatrixQueue::new(level, members))
        .collect();

    let plan = PartitionPlan::new(
        order.name(),
        matrix_width,
        matrix_height,
        edge_length,
        grid,
        queues,
    );
    plan.validate()?;

    tracing::debug!("{}", plan.summary());
    Ok(plan)
}
