// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # rqa-exec
//!
//! Command-line driver for the sub-matrix execution engine, running on
//! simulated devices.
//!
//! ## Usage
//! ```bash
//! # Process a 50k x 50k matrix on four simulated devices
//! rqa-exec run --width 50000 --height 50000 --devices 4 --selector fallback
//!
//! # Show how a matrix is tiled into levels
//! rqa-exec plan --width 30000 --height 20000 --edge-length 10240 --order columns
//!
//! # Compare edge lengths and processing orders
//! rqa-exec sweep --width 20000 --height 20000 --edge-lengths 2048,4096,8192
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::{MatrixArgs, SimulationArgs};

#[derive(Parser)]
#[command(
    name = "rqa-exec",
    about = "Level-by-level, multi-device execution of partitioned matrices",
    version,
    author
)]
struct Cli {
    /// Path to a TOML engine configuration (overrides CLI arguments).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every partition of a matrix on simulated devices.
    Run {
        #[command(flatten)]
        matrix: MatrixArgs,

        #[command(flatten)]
        simulation: SimulationArgs,

        /// Selection policy: single, fallback, epsilon-first,
        /// epsilon-greedy, epsilon-decreasing, weighted-greedy.
        #[arg(short, long, default_value = "single")]
        selector: String,

        /// Prefer simulated profiling-event timing over wall-clock timing.
        #[arg(long)]
        profiling_events: bool,

        /// Seed for stochastic selection policies.
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report and runtimes as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the partition levels of a matrix without processing it.
    Plan {
        #[command(flatten)]
        matrix: MatrixArgs,

        /// List every sub-matrix of every level.
        #[arg(short, long)]
        list: bool,
    },

    /// Run the same matrix across edge lengths and processing orders.
    ///
    /// With `--config`, the matrix, selector and devices come from the
    /// file and only the edge lengths and orders are swept.
    Sweep {
        /// Matrix width (columns). Required without `--config`.
        #[arg(long)]
        width: Option<usize>,

        /// Matrix height (rows). Required without `--config`.
        #[arg(long)]
        height: Option<usize>,

        /// Comma-separated edge lengths (e.g., "2048,4096,8192").
        #[arg(long, default_value = "2048,4096,10240")]
        edge_lengths: String,

        /// Comma-separated processing orders.
        #[arg(long, default_value = "diagonal,columns,rows,bulk")]
        orders: String,

        /// Selection policy used for every run.
        #[arg(short, long, default_value = "single")]
        selector: String,

        #[command(flatten)]
        simulation: SimulationArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            matrix,
            simulation,
            selector,
            profiling_events,
            seed,
            json,
        } => {
            let options = commands::run::RunOptions {
                selector,
                profiling_events,
                seed,
                json,
            };
            commands::run::execute(cli.config, matrix, simulation, options).await
        }
        Commands::Plan { matrix, list } => commands::plan::execute(cli.config, matrix, list).await,
        Commands::Sweep {
            width,
            height,
            edge_lengths,
            orders,
            selector,
            simulation,
        } => {
            let base = commands::sweep::base_config(
                cli.config.as_deref(),
                width,
                height,
                &selector,
                &simulation,
            )?;
            commands::sweep::execute(base, edge_lengths, orders, simulation).await
        }
    }
}
