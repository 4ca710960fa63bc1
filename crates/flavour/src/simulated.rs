// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A synthetic flavour with a predictable cost model.
//!
//! [`SimulatedFlavour`] does no real computation: it sleeps for a time
//! proportional to the sub-matrix area, fails with
//! [`ComputeError::InsufficientMemory`] when the partition does not fit
//! the device, and reports the number of cells it "processed". It stands
//! in for device kernels in the CLI, benchmarks and tests.

use crate::{ComputeError, Device, Flavour, FlavourError, Payload, PhaseTimes, Processed, Runtime};
use std::time::{Duration, Instant};
use submatrix_planner::SubMatrix;

/// Output buffer holding the number of cells processed.
pub const CELLS_BUFFER: &str = "cells";

/// Synthetic flavour: cost is `cells * nanos_per_cell / unroll_factor`.
#[derive(Debug, Clone)]
pub struct SimulatedFlavour {
    name: String,
    nanos_per_cell: u64,
    unroll_factor: u32,
    bytes_per_cell: u64,
    memory_limit: Option<u64>,
    profiling_events: bool,
}

impl SimulatedFlavour {
    pub fn new(name: impl Into<String>, nanos_per_cell: u64) -> Self {
        Self {
            name: name.into(),
            nanos_per_cell,
            unroll_factor: 1,
            bytes_per_cell: 4,
            memory_limit: None,
            profiling_events: false,
        }
    }

    /// Divides the per-cell cost by `factor`.
    pub fn with_unroll_factor(mut self, factor: u32) -> Self {
        self.unroll_factor = factor.max(1);
        self
    }

    /// Rejects sub-matrices needing more than `bytes`.
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn with_bytes_per_cell(mut self, bytes: u64) -> Self {
        self.bytes_per_cell = bytes;
        self
    }

    /// Also report the nominal cost as device profiling-event timing.
    pub fn with_profiling_events(mut self, enabled: bool) -> Self {
        self.profiling_events = enabled;
        self
    }

    /// One flavour per loop-unroll factor, bounded by the device memory.
    pub fn for_device(device: &Device, nanos_per_cell: u64, unroll_factors: &[u32]) -> Vec<Box<dyn Flavour>> {
        Self::for_device_with_profiling(device, nanos_per_cell, unroll_factors, false)
    }

    /// Like [`SimulatedFlavour::for_device`], optionally reporting
    /// profiling-event timing.
    pub fn for_device_with_profiling(
        device: &Device,
        nanos_per_cell: u64,
        unroll_factors: &[u32],
        profiling_events: bool,
    ) -> Vec<Box<dyn Flavour>> {
        unroll_factors
            .iter()
            .map(|&factor| {
                let mut flavour = Self::new(format!("{}-u{factor}", device.kind), nanos_per_cell)
                    .with_unroll_factor(factor)
                    .with_profiling_events(profiling_events);
                if let Some(limit) = device.memory_bytes {
                    flavour = flavour.with_memory_limit(limit);
                }
                Box::new(flavour) as Box<dyn Flavour>
            })
            .collect()
    }

    /// Nominal execute time for `sub_matrix`, saturating at `u64::MAX` ns.
    pub fn nominal_cost(&self, sub_matrix: &SubMatrix) -> Duration {
        let nanos = cells(sub_matrix).saturating_mul(self.nanos_per_cell) / u64::from(self.unroll_factor);
        Duration::from_nanos(nanos)
    }

    fn required_bytes(&self, sub_matrix: &SubMatrix) -> u64 {
        cells(sub_matrix).saturating_mul(self.bytes_per_cell)
    }
}

fn cells(sub_matrix: &SubMatrix) -> u64 {
    u64::try_from(sub_matrix.num_cells()).unwrap_or(u64::MAX)
}

impl Flavour for SimulatedFlavour {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, sub_matrix: &SubMatrix, _input: &Payload) -> Result<Processed, FlavourError> {
        let required_bytes = self.required_bytes(sub_matrix);
        if let Some(available_bytes) = self.memory_limit {
            if required_bytes > available_bytes {
                return Err(ComputeError::InsufficientMemory {
                    required_bytes,
                    available_bytes,
                }
                .into());
            }
        }

        let nominal = self.nominal_cost(sub_matrix);
        let start = Instant::now();
        if !nominal.is_zero() {
            std::thread::sleep(nominal);
        }
        let mut runtime = Runtime::from_wall_clock(PhaseTimes::from_execute(start.elapsed()));
        if self.profiling_events {
            runtime = runtime.with_device(PhaseTimes::from_execute(nominal));
        }

        let mut output = Payload::new();
        output.insert_counts(CELLS_BUFFER, vec![cells(sub_matrix)]);
        Ok(Processed { runtime, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceKind;

    fn tile(dim: usize) -> SubMatrix {
        SubMatrix::new((0, 0), 1, (0, 0), (dim, dim), 0).unwrap()
    }

    #[test]
    fn test_cost_scales_with_unroll() {
        let base = SimulatedFlavour::new("a", 100);
        let fast = SimulatedFlavour::new("b", 100).with_unroll_factor(4);
        assert_eq!(base.nominal_cost(&tile(10)), Duration::from_nanos(10_000));
        assert_eq!(fast.nominal_cost(&tile(10)), Duration::from_nanos(2_500));
    }

    #[test]
    fn test_memory_limit() {
        let f = SimulatedFlavour::new("small", 0).with_memory_limit(100);
        assert!(f.process(&tile(5), &Payload::new()).is_ok());
        let err = f.process(&tile(6), &Payload::new()).unwrap_err();
        assert!(matches!(
            err,
            FlavourError::Compute(ComputeError::InsufficientMemory {
                required_bytes: 144,
                available_bytes: 100
            })
        ));
    }

    #[test]
    fn test_output_and_profiling() {
        let f = SimulatedFlavour::new("p", 1000).with_profiling_events(true);
        let out = f.process(&tile(3), &Payload::new()).unwrap();
        assert_eq!(out.output.counts(CELLS_BUFFER), Some(&[9][..]));
        assert_eq!(out.runtime.resolve(true).execute, Duration::from_nanos(9000));
        assert!(out.runtime.resolve(false).execute >= Duration::from_nanos(9000));
    }

    #[test]
    fn test_retry_is_idempotent() {
        let f = SimulatedFlavour::new("r", 10);
        let sm = tile(4);
        let a = f.process(&sm, &Payload::new()).unwrap();
        let b = f.process(&sm, &Payload::new()).unwrap();
        assert_eq!(a.output, b.output);
    }

    #[test]
    fn test_cost_and_memory_saturate() {
        let f = SimulatedFlavour::new("huge", u64::MAX).with_unroll_factor(2);
        assert_eq!(f.nominal_cost(&tile(10)), Duration::from_nanos(u64::MAX / 2));

        let f = SimulatedFlavour::new("wide", 0)
            .with_bytes_per_cell(u64::MAX)
            .with_memory_limit(100);
        let err = f.process(&tile(2), &Payload::new()).unwrap_err();
        assert!(matches!(
            err,
            FlavourError::Compute(ComputeError::InsufficientMemory {
                required_bytes: u64::MAX,
                available_bytes: 100
            })
        ));
    }

    #[test]
    fn test_for_device_with_profiling() {
        let d = Device::new(0, "c", DeviceKind::Cpu);
        let flavours = SimulatedFlavour::for_device_with_profiling(&d, 1000, &[1, 2], true);
        let out = flavours[1].process(&tile(2), &Payload::new()).unwrap();
        assert_eq!(out.runtime.device.map(|p| p.execute), Some(Duration::from_nanos(2000)));

        let plain = SimulatedFlavour::for_device(&d, 1000, &[1]);
        let out = plain[0].process(&tile(2), &Payload::new()).unwrap();
        assert!(out.runtime.device.is_none());
    }

    #[test]
    fn test_for_device() {
        let d = Device::new(0, "g", DeviceKind::Gpu).with_memory(64);
        let flavours = SimulatedFlavour::for_device(&d, 1, &[1, 2, 4]);
        let names: Vec<&str> = flavours.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["gpu-u1", "gpu-u2", "gpu-u4"]);
        assert!(flavours[2].process(&tile(5), &Payload::new()).is_err());
    }
}
