// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and their shared pieces.

pub mod plan;
pub mod run;
pub mod sweep;

use execution_engine::EngineHooks;
use flavour::{simulated::CELLS_BUFFER, Device, DeviceKind, Payload};
use std::sync::atomic::{AtomicU64, Ordering};
use submatrix_planner::{SubMatrix, DEFAULT_EDGE_LENGTH};
use tracing_subscriber::EnvFilter;

/// Initialises the tracing subscriber from the `-v` count.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Matrix shape and tiling.
#[derive(clap::Args, Debug, Clone)]
pub struct MatrixArgs {
    /// Matrix width (columns).
    #[arg(long, default_value_t = 0)]
    pub width: usize,

    /// Matrix height (rows).
    #[arg(long, default_value_t = 0)]
    pub height: usize,

    /// Maximum sub-matrix edge length.
    #[arg(short, long, default_value_t = DEFAULT_EDGE_LENGTH)]
    pub edge_length: usize,

    /// Processing order: diagonal, columns, rows, bulk.
    #[arg(short, long, default_value = "diagonal")]
    pub order: String,
}

/// Simulated devices and flavours.
#[derive(clap::Args, Debug, Clone)]
pub struct SimulationArgs {
    /// Number of simulated devices.
    #[arg(short, long, default_value_t = 1)]
    pub devices: usize,

    /// Memory per device in bytes; bounds the sub-matrix size.
    #[arg(long)]
    pub device_memory: Option<u64>,

    /// Simulated cost per matrix cell in nanoseconds.
    #[arg(long, default_value_t = 1)]
    pub nanos_per_cell: u64,

    /// Comma-separated loop-unroll factors, one flavour each.
    #[arg(long, default_value = "1")]
    pub unroll: String,
}

impl SimulationArgs {
    /// Builds the simulated devices.
    pub fn devices(&self) -> Vec<Device> {
        (0..self.devices)
            .map(|i| {
                let kind = if self.device_memory.is_some() {
                    DeviceKind::Gpu
                } else {
                    DeviceKind::Cpu
                };
                let device = Device::new(i, format!("sim{i}"), kind);
                match self.device_memory {
                    Some(bytes) => device.with_memory(bytes),
                    None => device,
                }
            })
            .collect()
    }

    /// Parses the unroll factors.
    pub fn unroll_factors(&self) -> anyhow::Result<Vec<u32>> {
        let factors = self
            .unroll
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|&f| f > 0)
                    .ok_or_else(|| anyhow::anyhow!("invalid unroll factor '{}'", s.trim()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(factors)
    }
}

/// Sums the cell counts reported by successful sub-matrices.
#[derive(Debug, Default)]
pub struct CellCounter {
    cells: AtomicU64,
    sub_matrices: AtomicU64,
}

impl CellCounter {
    pub fn cells(&self) -> u64 {
        self.cells.load(Ordering::Relaxed)
    }

    pub fn sub_matrices(&self) -> u64 {
        self.sub_matrices.load(Ordering::Relaxed)
    }
}

impl EngineHooks for CellCounter {
    fn update_global_data_structures(&self, _device: &Device, _sub_matrix: &SubMatrix, output: &Payload) {
        let cells: u64 = output.counts(CELLS_BUFFER).map(|c| c.iter().sum()).unwrap_or(0);
        self.cells.fetch_add(cells, Ordering::Relaxed);
        self.sub_matrices.fetch_add(1, Ordering::Relaxed);
    }
}
