// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # execution-engine
//!
//! Processes every partition of a matrix on a set of compute devices.
//!
//! The engine takes:
//! - An [`EngineConfig`] (matrix size, edge length, processing order,
//!   selector policy, devices).
//! - A [`FlavourFactory`](flavour::FlavourFactory) that supplies the
//!   flavours of each device.
//! - Optionally, [`EngineHooks`] through which domain code attaches input
//!   data and receives results.
//!
//! It plans the partitions with `submatrix-planner`, builds one
//! [`Selector`](flavour::Selector) per device and drains the plan level
//! by level. Partitions of a level may run concurrently across devices;
//! a level starts only after every worker of the previous one was joined.
//!
//! # Failures
//! - A compute failure of one flavour is retried with another flavour if
//!   the selector policy allows it, otherwise the partition is recorded
//!   as unprocessed (zero runtime) and the run continues.
//! - A device failure or a worker panic ends the run after the current
//!   level; results recorded so far stay available through
//!   [`ExecutionEngine::matrix_runtimes`].

mod config;
mod engine;
mod error;
mod hooks;
mod stats;

pub use config::{EngineConfig, DEFAULT_SEED};
pub use engine::{DeviceReport, EngineState, ExecutionEngine, LevelReport, RunReport};
pub use error::EngineError;
pub use hooks::{EngineHooks, NoHooks};
pub use stats::{EntryStatus, MatrixRuntimes, RuntimeEntry};
