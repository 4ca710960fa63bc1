// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Timing of a single sub-matrix.
//!
//! A flavour reports host wall-clock [`PhaseTimes`] and, when the backend
//! exposes profiling events, device-reported ones too. The engine picks
//! one of the two with [`Runtime::resolve`].

use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Per-phase durations for processing one sub-matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PhaseTimes {
    pub create_buffers: Duration,
    pub transfer_to_device: Duration,
    pub execute: Duration,
    pub transfer_from_device: Duration,
}

impl PhaseTimes {
    /// All phases zero. Recorded for partitions that were never processed.
    pub const ZERO: Self = Self {
        create_buffers: Duration::ZERO,
        transfer_to_device: Duration::ZERO,
        execute: Duration::ZERO,
        transfer_from_device: Duration::ZERO,
    };

    /// Only an execute phase.
    pub fn from_execute(execute: Duration) -> Self {
        Self {
            execute,
            ..Self::ZERO
        }
    }

    pub fn execute_duration(&self) -> Duration {
        self.execute
    }

    /// Execute phase in seconds.
    pub fn execute_secs(&self) -> f64 {
        self.execute.as_secs_f64()
    }

    /// Sum of all phases.
    pub fn total(&self) -> Duration {
        self.create_buffers + self.transfer_to_device + self.execute + self.transfer_from_device
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for PhaseTimes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            create_buffers: self.create_buffers + rhs.create_buffers,
            transfer_to_device: self.transfer_to_device + rhs.transfer_to_device,
            execute: self.execute + rhs.execute,
            transfer_from_device: self.transfer_from_device + rhs.transfer_from_device,
        }
    }
}

impl AddAssign for PhaseTimes {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Timing statistics returned by a flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Runtime {
    /// Host-measured wall-clock phases.
    pub wall_clock: PhaseTimes,
    /// Phases reported by device profiling events, if available.
    pub device: Option<PhaseTimes>,
}

impl Runtime {
    pub fn from_wall_clock(wall_clock: PhaseTimes) -> Self {
        Self {
            wall_clock,
            device: None,
        }
    }

    /// Attaches device-reported phases.
    pub fn with_device(mut self, device: PhaseTimes) -> Self {
        self.device = Some(device);
        self
    }

    /// Picks device-reported timing when `use_profiling_events_time` is
    /// set and the flavour provided it; wall-clock timing otherwise.
    pub fn resolve(&self, use_profiling_events_time: bool) -> PhaseTimes {
        match self.device {
            Some(device) if use_profiling_events_time => device,
            _ => self.wall_clock,
        }
    }
}
