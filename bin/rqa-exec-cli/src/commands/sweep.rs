// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::SimulationArgs;
use execution_engine::{EngineConfig, ExecutionEngine, RunReport};
use flavour::{Device, SelectorConfig, SimulatedFlavour};
use std::path::Path;

/// Configuration shared by every run of the sweep.
///
/// A config file supplies the matrix, selector, seed, timing mode and
/// devices; otherwise `width` and `height` are required and the devices
/// are simulated from `simulation`.
pub fn base_config(
    config_path: Option<&Path>,
    width: Option<usize>,
    height: Option<usize>,
    selector: &str,
    simulation: &SimulationArgs,
) -> anyhow::Result<EngineConfig> {
    if let Some(path) = config_path {
        return Ok(EngineConfig::from_file(path)?);
    }
    let (Some(matrix_width), Some(matrix_height)) = (width, height) else {
        anyhow::bail!("sweep needs --width and --height, or --config");
    };
    Ok(EngineConfig {
        matrix_width,
        matrix_height,
        selector: SelectorConfig::from_name(selector)?,
        devices: simulation.devices(),
        ..Default::default()
    })
}

pub async fn execute(
    base: EngineConfig,
    edge_lengths: String,
    orders: String,
    simulation: SimulationArgs,
) -> anyhow::Result<()> {
    let edges: Vec<usize> = edge_lengths
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid edge length '{}': {e}", s.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let order_names: Vec<String> = orders.split(',').map(|s| s.trim().to_string()).collect();
    let unroll = simulation.unroll_factors()?;
    let nanos_per_cell = simulation.nanos_per_cell;

    println!("  Matrix:   {} x {}", base.matrix_width, base.matrix_height);
    println!("  Devices:  {}", base.devices.len());
    println!("  Selector: {}", base.selector.name());
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:<10} {:>8} {:>8} {:>8} {:>12} {:>10}",
        "Order", "Edge", "Levels", "Tiles", "Unprocessed", "Wall ms",
    );
    println!("  {}", "-".repeat(62));

    let mut results: Vec<(String, usize, RunReport)> = Vec::new();
    for &edge in &edges {
        for order in &order_names {
            let config = EngineConfig {
                edge_length: edge,
                processing_order: order.clone(),
                ..base.clone()
            };
            let profiling = config.use_profiling_events_time;
            let unroll = unroll.clone();
            let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<RunReport> {
                let factory = move |d: &Device| {
                    SimulatedFlavour::for_device_with_profiling(d, nanos_per_cell, &unroll, profiling)
                };
                let mut engine = ExecutionEngine::new(config, &factory)?;
                Ok(engine.run()?)
            })
            .await?;

            match outcome {
                Ok(report) => {
                    println!(
                        "  {:<10} {:>8} {:>8} {:>8} {:>12} {:>10.2}",
                        order,
                        edge,
                        report.levels_completed,
                        report.num_sub_matrices,
                        report.num_unprocessed,
                        report.wall_time.as_secs_f64() * 1000.0,
                    );
                    results.push((order.clone(), edge, report));
                }
                Err(e) => {
                    println!("  {:<10} {:>8}     FAILED: {e}", order, edge);
                }
            }
        }
    }
    println!();

    // ── Summary ────────────────────────────────────────────────
    let Some((order, edge, fastest)) = results.iter().min_by_key(|(_, _, r)| r.wall_time) else {
        println!("  No successful runs.");
        return Ok(());
    };
    println!(
        "  Fastest: {order} @ edge {edge} ({:.2}ms)",
        fastest.wall_time.as_secs_f64() * 1000.0
    );
    println!();

    Ok(())
}
