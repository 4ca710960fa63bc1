// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the sub-matrix planner.

/// Errors that can occur during partition planning.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The requested sub-matrix edge length is zero.
    #[error("invalid edge length {0}: must be at least 1")]
    InvalidEdgeLength(usize),

    /// The processing order name is not one of the known orders.
    #[error("unknown processing order '{0}'; expected 'diagonal', 'columns', 'rows', or 'bulk'")]
    UnknownOrder(String),

    /// A sub-matrix would have a zero-sized edge.
    #[error("sub-matrix at partition ({x}, {y}) has zero dimension {dim_x}x{dim_y}")]
    EmptySubMatrix {
        x: usize,
        y: usize,
        dim_x: usize,
        dim_y: usize,
    },

    /// A produced plan does not tile the matrix correctly.
    #[error("plan '{order}' is inconsistent: {detail}")]
    InconsistentPlan { order: String, detail: String },
}
