// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{CellCounter, MatrixArgs, SimulationArgs};
use execution_engine::{EngineConfig, ExecutionEngine};
use flavour::{Device, SelectorConfig, SimulatedFlavour};
use std::path::PathBuf;
use std::sync::Arc;

/// Flags of `run` that are not shared with other subcommands.
pub struct RunOptions {
    pub selector: String,
    pub profiling_events: bool,
    pub seed: Option<u64>,
    pub json: bool,
}

pub async fn execute(
    config_path: Option<PathBuf>,
    matrix: MatrixArgs,
    simulation: SimulationArgs,
    options: RunOptions,
) -> anyhow::Result<()> {
    // ── Configuration ──────────────────────────────────────────
    let config = match &config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig {
            matrix_width: matrix.width,
            matrix_height: matrix.height,
            edge_length: matrix.edge_length,
            processing_order: matrix.order.clone(),
            use_profiling_events_time: options.profiling_events,
            seed: options.seed,
            selector: SelectorConfig::from_name(&options.selector)?,
            devices: simulation.devices(),
        },
    };
    let unroll = simulation.unroll_factors()?;
    let nanos_per_cell = simulation.nanos_per_cell;
    let profiling = config.use_profiling_events_time;

    if !options.json {
        println!("  Config:");
        println!("   Matrix:   {} x {}", config.matrix_width, config.matrix_height);
        println!("   Edge:     {}", config.edge_length);
        println!("   Order:    {}", config.processing_order);
        println!("   Selector: {}", config.selector.name());
        println!("   Devices:  {}", config.devices.len());
        println!("   Unroll:   {unroll:?}");
        println!();
    }

    // ── Execution ──────────────────────────────────────────────
    let hooks = Arc::new(CellCounter::default());
    let engine_hooks = Arc::clone(&hooks);
    let (engine, result) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let factory = move |d: &Device| {
            SimulatedFlavour::for_device_with_profiling(d, nanos_per_cell, &unroll, profiling)
        };
        let mut engine = ExecutionEngine::new(config, &factory)?.with_hooks(engine_hooks);
        let result = engine.run();
        Ok((engine, result))
    })
    .await??;

    let runtimes = engine.matrix_runtimes();
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("run failed in state {}", engine.state());
            eprintln!("  Partial results:");
            eprintln!("{}", runtimes.summary());
            return Err(e.into());
        }
    };

    // ── Results ────────────────────────────────────────────────
    if options.json {
        let doc = serde_json::json!({
            "report": report,
            "runtimes": runtimes,
            "cells": hooks.cells(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("  {}", report.summary().trim_end().replace('\n', "\n  "));
    println!();
    println!("  {}", runtimes.summary().trim_end().replace('\n', "\n  "));
    println!();
    println!(
        "  Global data: {} cells from {} sub-matrices",
        hooks.cells(),
        hooks.sub_matrices()
    );
    if report.num_unprocessed > 0 {
        println!("  Unprocessed: {:?}", runtimes.unprocessed());
    }
    println!();

    Ok(())
}
