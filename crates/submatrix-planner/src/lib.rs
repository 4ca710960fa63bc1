// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # submatrix-planner
//!
//! Tiles a large conceptual matrix into [`SubMatrix`] partitions and
//! groups them into ordered [`SubMatrixQueue`]s ("levels") according to a
//! pluggable [`ProcessingOrder`].
//!
//! Partitions within a level may be processed concurrently; level `n + 1`
//! must not start before level `n` is resolved.
//!
//! # Orders
//!
//! | Order | Levels | Dependencies honoured |
//! |---|---|---|
//! | [`Diagonal`] | `px + py - 1` | left, upper, upper-left |
//! | [`Columns`] | `px` | left |
//! | [`Rows`] | `py` | upper |
//! | [`Bulk`] | 1 | none |
//!
//! # Example
//! ```
//! use submatrix_planner::{plan, Diagonal};
//!
//! let plan = plan(20, 20, 10, &Diagonal).unwrap();
//! assert_eq!(plan.num_sub_matrices(), 4);
//! println!("{}", plan.summary());
//! ```

mod error;
pub mod order;
mod plan;
mod planner;
mod queue;
mod sub_matrix;

pub use error::PlannerError;
pub use order::{create_order, Bulk, Columns, Diagonal, GridShape, ProcessingOrder, Rows};
pub use plan::PartitionPlan;
pub use planner::{plan, DEFAULT_EDGE_LENGTH};
pub use queue::SubMatrixQueue;
pub use sub_matrix::{SubMatrix, SubMatrixId};
