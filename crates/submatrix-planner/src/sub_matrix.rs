// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`SubMatrix`] descriptor: one rectangular tile of the global matrix.

use crate::PlannerError;
use std::fmt;

/// Opaque identifier of a sub-matrix, unique within one plan.
///
/// Derived from the row-major partition index, so it is stable across
/// plans built with the same dimensions and edge length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct SubMatrixId(u64);

impl SubMatrixId {
    /// Returns the raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubMatrixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable rectangular partition of the global matrix.
///
/// Fields are private: once the planner hands a sub-matrix out, workers
/// and flavours can only read it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubMatrix {
    id: SubMatrixId,
    partition_index_x: usize,
    partition_index_y: usize,
    offset_x: usize,
    offset_y: usize,
    dim_x: usize,
    dim_y: usize,
    partition_level: usize,
}

impl SubMatrix {
    /// Creates a sub-matrix descriptor.
    ///
    /// `partitions_x` is the number of partition columns of the grid the
    /// sub-matrix belongs to; it is used to derive the id.
    pub fn new(
        partition_index: (usize, usize),
        partitions_x: usize,
        offset: (usize, usize),
        dim: (usize, usize),
        partition_level: usize,
    ) -> Result<Self, PlannerError> {
        let (x, y) = partition_index;
        let (dim_x, dim_y) = dim;
        if dim_x == 0 || dim_y == 0 {
            return Err(PlannerError::EmptySubMatrix { x, y, dim_x, dim_y });
        }
        Ok(Self {
            id: SubMatrixId((y * partitions_x + x) as u64),
            partition_index_x: x,
            partition_index_y: y,
            offset_x: offset.0,
            offset_y: offset.1,
            dim_x,
            dim_y,
            partition_level,
        })
    }

    pub fn id(&self) -> SubMatrixId {
        self.id
    }

    pub fn partition_index_x(&self) -> usize {
        self.partition_index_x
    }

    pub fn partition_index_y(&self) -> usize {
        self.partition_index_y
    }

    pub fn offset_x(&self) -> usize {
        self.offset_x
    }

    pub fn offset_y(&self) -> usize {
        self.offset_y
    }

    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    /// The processing-order wave this sub-matrix belongs to.
    pub fn partition_level(&self) -> usize {
        self.partition_level
    }

    /// Number of matrix cells covered by this sub-matrix.
    pub fn num_cells(&self) -> usize {
        self.dim_x * self.dim_y
    }

    /// Exclusive end column.
    pub fn end_x(&self) -> usize {
        self.offset_x + self.dim_x
    }

    /// Exclusive end row.
    pub fn end_y(&self) -> usize {
        self.offset_y + self.dim_y
    }
}

impl fmt::Display for SubMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sub-matrix {} [{}..{}, {}..{}] level {}",
            self.id,
            self.offset_x,
            self.end_x(),
            self.offset_y,
            self.end_y(),
            self.partition_level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let sm = SubMatrix::new((1, 2), 3, (10, 20), (10, 5), 3).unwrap();
        assert_eq!(sm.id().as_u64(), 7);
        assert_eq!(sm.partition_index_x(), 1);
        assert_eq!(sm.partition_index_y(), 2);
        assert_eq!(sm.end_x(), 20);
        assert_eq!(sm.end_y(), 25);
        assert_eq!(sm.num_cells(), 50);
        assert_eq!(sm.partition_level(), 3);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = SubMatrix::new((0, 0), 1, (0, 0), (0, 4), 0).unwrap_err();
        assert!(matches!(err, PlannerError::EmptySubMatrix { dim_x: 0, .. }));
    }

    #[test]
    fn test_display() {
        let sm = SubMatrix::new((0, 0), 1, (0, 0), (4, 4), 0).unwrap();
        let s = sm.to_string();
        assert!(s.contains("#0"));
        assert!(s.contains("[0..4, 0..4]"));
    }
}
