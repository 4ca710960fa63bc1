// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Compute device handles.
//!
//! The engine does not own devices; it only refers to them. A [`Device`]
//! is a plain description of one compute resource, enumerated by the
//! caller (configuration file, driver query, ...).

use std::fmt;

/// Index of a device within one engine run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// Broad class of a compute device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Gpu,
    Accelerator,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Accelerator => "accelerator",
        })
    }
}

/// A compute device the engine can dispatch sub-matrices to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub kind: DeviceKind,
    /// Memory available for one sub-matrix, if the device is bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    #[serde(default = "default_compute_units")]
    pub compute_units: u32,
}

fn default_compute_units() -> u32 {
    1
}

impl Device {
    pub fn new(id: usize, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: DeviceId(id),
            name: name.into(),
            kind,
            memory_bytes: None,
            compute_units: default_compute_units(),
        }
    }

    /// Bounds the memory available to a single sub-matrix.
    pub fn with_memory(mut self, bytes: u64) -> Self {
        self.memory_bytes = Some(bytes);
        self
    }

    pub fn with_compute_units(mut self, units: u32) -> Self {
        self.compute_units = units.max(1);
        self
    }

    /// Describes the host CPU, using the number of online cores as
    /// compute units.
    pub fn host_cpu(id: usize) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        Self::new(id, format!("host-cpu-{id}"), DeviceKind::Cpu).with_compute_units(cores)
    }

    /// Returns `true` if `bytes` fit in the device memory.
    pub fn fits(&self, bytes: u64) -> bool {
        self.memory_bytes.map_or(true, |limit| bytes <= limit)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.id, self.name, self.kind)
    }
}
