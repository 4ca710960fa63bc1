// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Compare processing orders on simulated devices.
//!
//! Every order processes the same partitions; what changes is how many
//! levels they form and so how often the devices synchronise.
//!
//! ```bash
//! cargo run -p execution-engine --example order_comparison
//! ```

use execution_engine::{EngineConfig, ExecutionEngine};
use flavour::{Device, DeviceKind, SelectorConfig, SimulatedFlavour};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let devices = vec![
        Device::new(0, "gpu0", DeviceKind::Gpu).with_memory(4 * 1024 * 1024),
        Device::new(1, "cpu0", DeviceKind::Cpu),
    ];
    let factory = |d: &Device| {
        let nanos_per_cell = match d.kind {
            DeviceKind::Cpu => 20,
            _ => 2,
        };
        SimulatedFlavour::for_device(d, nanos_per_cell, &[1, 2, 4])
    };

    println!(
        "{:<10} {:>7} {:>12} {:>10} {:>12}",
        "order", "levels", "sub-matrices", "wall (ms)", "unprocessed"
    );
    for order in ["diagonal", "columns", "rows", "bulk"] {
        let config = EngineConfig {
            matrix_width: 6000,
            matrix_height: 6000,
            edge_length: 1024,
            processing_order: order.to_string(),
            selector: SelectorConfig::EpsilonFirst { explore: 2 },
            devices: devices.clone(),
            ..Default::default()
        };
        let mut engine = ExecutionEngine::new(config, &factory)?;
        let report = engine.run()?;
        println!(
            "{:<10} {:>7} {:>12} {:>10.1} {:>12}",
            order,
            report.levels_completed,
            report.num_sub_matrices,
            report.wall_time.as_secs_f64() * 1000.0,
            report.num_unprocessed
        );
    }
    Ok(())
}
