// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # flavour
//!
//! Computation strategies ("flavours") and the per-device selectors that
//! decide which one processes each sub-matrix.
//!
//! - [`Flavour`]: one way of processing a [`SubMatrix`] on a device,
//!   returning its [`Runtime`] or a recoverable [`ComputeError`].
//! - [`Selector`]: owns one device's flavours, their [`FlavourStats`] and a
//!   [`SelectionPolicy`], and bounds retries by the number of flavours.
//! - [`SelectorConfig`]: serializable policy description
//!   (`single`, `fallback`, `epsilon-first`, `epsilon-greedy`,
//!   `epsilon-decreasing`, `weighted-greedy`).
//! - [`SimulatedFlavour`]: a synthetic flavour with a predictable cost.
//!
//! # Example
//! ```
//! use flavour::{Device, DeviceKind, Payload, Selector, SelectorConfig, SimulatedFlavour};
//! use submatrix_planner::{plan, Diagonal};
//!
//! let device = Device::new(0, "cpu0", DeviceKind::Cpu);
//! let flavours = SimulatedFlavour::for_device(&device, 0, &[1, 2]);
//! let policy = SelectorConfig::from_name("fallback").unwrap().build(0).unwrap();
//! let mut selector = Selector::new(device, flavours, policy).unwrap();
//!
//! let plan = plan(8, 8, 4, &Diagonal).unwrap();
//! let sm = plan.queues()[0].pop().unwrap();
//! let index = selector.next_flavour(&sm, &[]).unwrap();
//! let done = selector.process(index, &sm, &Payload::new()).unwrap();
//! selector.on_success(index, &done.runtime.wall_clock);
//! assert_eq!(selector.processed(), 1);
//! ```
//!
//! [`SubMatrix`]: submatrix_planner::SubMatrix

mod device;
mod error;
mod flavour;
mod payload;
mod runtime;
pub mod selector;
pub mod simulated;

pub use device::{Device, DeviceId, DeviceKind};
pub use error::{ComputeError, FlavourError, SelectorError};
pub use flavour::{Flavour, FlavourFactory, FlavourStats, Processed};
pub use payload::{Buffer, Payload};
pub use runtime::{PhaseTimes, Runtime};
pub use selector::{FlavourReport, SelectionPolicy, Selector, SelectorConfig};
pub use simulated::SimulatedFlavour;
