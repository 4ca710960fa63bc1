// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::MatrixArgs;
use execution_engine::EngineConfig;
use std::path::PathBuf;

pub async fn execute(config: Option<PathBuf>, matrix: MatrixArgs, list: bool) -> anyhow::Result<()> {
    let (width, height, edge_length, order_name) = match config {
        Some(path) => {
            let c = EngineConfig::from_file(&path)?;
            (c.matrix_width, c.matrix_height, c.edge_length, c.processing_order)
        }
        None => (matrix.width, matrix.height, matrix.edge_length, matrix.order),
    };

    let order = submatrix_planner::create_order(&order_name)?;
    let plan = submatrix_planner::plan(width, height, edge_length, order.as_ref())?;

    println!("  {}", plan.summary().trim_end());
    println!();
    println!("  {:>6} {:>12} {:>14}", "Level", "Sub-matrices", "Cells");
    println!("  {}", "-".repeat(34));
    for queue in plan.queues() {
        let members = queue.snapshot();
        let cells: usize = members.iter().map(|sm| sm.num_cells()).sum();
        println!("  {:>6} {:>12} {:>14}", queue.level(), members.len(), cells);
        if list {
            for sm in &members {
                println!("           {sm}");
            }
        }
    }
    println!();

    Ok(())
}
