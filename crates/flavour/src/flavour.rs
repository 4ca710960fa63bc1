// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Flavour`] trait: one device-bound way of processing a sub-matrix.

use crate::{Device, FlavourError, Payload, Runtime};
use std::time::Duration;
use submatrix_planner::SubMatrix;

/// What a successful [`Flavour::process`] call returns.
#[derive(Debug, Clone, Default)]
pub struct Processed {
    pub runtime: Runtime,
    /// Domain results, forwarded to the engine's global-data hook.
    pub output: Payload,
}

/// A computation strategy bound to one device capability.
///
/// Implementations must be pure with respect to global state: calling
/// `process` twice on the same sub-matrix yields the same logical result,
/// so a failed attempt can safely be retried by another flavour.
pub trait Flavour: Send {
    /// Human-readable name, used in logs and reports.
    fn name(&self) -> &str;

    /// Processes one sub-matrix with the attached `input` buffers.
    fn process(&self, sub_matrix: &SubMatrix, input: &Payload) -> Result<Processed, FlavourError>;
}

/// Builds the flavours available on a device.
///
/// Called once per device when the engine is constructed. Returning an
/// empty list means no flavour matches the device.
pub trait FlavourFactory {
    fn flavours_for(&self, device: &Device) -> Vec<Box<dyn Flavour>>;
}

impl<F> FlavourFactory for F
where
    F: Fn(&Device) -> Vec<Box<dyn Flavour>>,
{
    fn flavours_for(&self, device: &Device) -> Vec<Box<dyn Flavour>> {
        self(device)
    }
}

/// Running statistics for one flavour on one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FlavourStats {
    /// Number of `process` calls.
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    /// Accumulated execute phase over successful calls.
    pub total_execute: Duration,
}

impl FlavourStats {
    /// Mean execute time over successful calls, if any.
    pub fn mean_execute(&self) -> Option<Duration> {
        if self.successes == 0 {
            return None;
        }
        Some(self.total_execute / u32::try_from(self.successes).unwrap_or(u32::MAX))
    }

    pub(crate) fn record_success(&mut self, execute: Duration) {
        self.successes += 1;
        self.total_execute += execute;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceKind;

    struct Noop;

    impl Flavour for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn process(&self, _: &SubMatrix, _: &Payload) -> Result<Processed, FlavourError> {
            Ok(Processed::default())
        }
    }

    #[test]
    fn test_closure_factory() {
        let factory = |device: &Device| -> Vec<Box<dyn Flavour>> {
            if device.kind == DeviceKind::Gpu {
                vec![Box::new(Noop), Box::new(Noop)]
            } else {
                vec![Box::new(Noop)]
            }
        };
        let gpu = Device::new(0, "gpu", DeviceKind::Gpu);
        let cpu = Device::new(1, "cpu", DeviceKind::Cpu);
        assert_eq!(factory.flavours_for(&gpu).len(), 2);
        assert_eq!(factory.flavours_for(&cpu).len(), 1);
    }

    #[test]
    fn test_mean_execute() {
        let mut s = FlavourStats::default();
        assert_eq!(s.mean_execute(), None);
        s.record_success(Duration::from_millis(4));
        s.record_success(Duration::from_millis(8));
        s.record_failure();
        assert_eq!(s.mean_execute(), Some(Duration::from_millis(6)));
        assert_eq!(s.failures, 1);
    }
}
