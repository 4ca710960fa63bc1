// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! matrix_width = 40000
//! matrix_height = 40000
//! edge_length = 10240
//! processing_order = "diagonal"
//! use_profiling_events_time = true
//! seed = 7
//!
//! [selector]
//! policy = "fallback"
//! demote_after = 2
//!
//! [[devices]]
//! id = 0
//! name = "gpu0"
//! kind = "gpu"
//! memory_bytes = 2147483648
//! ```

use crate::EngineError;
use flavour::{Device, SelectorConfig};
use std::path::Path;
use submatrix_planner::{create_order, ProcessingOrder, DEFAULT_EDGE_LENGTH};

/// Seed for stochastic selection policies when none is configured.
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Configuration for the execution engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Global matrix width (number of columns).
    pub matrix_width: usize,
    /// Global matrix height (number of rows).
    pub matrix_height: usize,
    /// Maximum sub-matrix edge length.
    #[serde(default = "default_edge_length")]
    pub edge_length: usize,
    /// Processing order name: `"diagonal"`, `"columns"`, `"rows"`, `"bulk"`.
    #[serde(default = "default_order")]
    pub processing_order: String,
    /// Prefer device profiling-event timing over wall-clock timing.
    #[serde(default)]
    pub use_profiling_events_time: bool,
    /// Seed for stochastic selection policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Flavour selection policy, instantiated once per device.
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Compute devices. May be empty, in which case a run is a no-op.
    #[serde(default)]
    pub devices: Vec<Device>,
}

fn default_edge_length() -> usize {
    DEFAULT_EDGE_LENGTH
}

fn default_order() -> String {
    "diagonal".to_string()
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str)
            .map_err(|e| EngineError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Creates the processing order named by this config.
    pub fn create_order(&self) -> Result<Box<dyn ProcessingOrder>, EngineError> {
        Ok(create_order(&self.processing_order)?)
    }

    /// Seed for the selection policy of the device at `index`.
    pub fn seed_for(&self, index: usize) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED).wrapping_add(index as u64)
    }

    /// Checks everything that can be checked without planning.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.selector.validate()?;
        let mut ids: Vec<_> = self.devices.iter().map(|d| d.id).collect();
        ids.sort();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(EngineError::ConfigError(format!(
                "device id {} is registered more than once",
                pair[0]
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matrix_width: 4096,
            matrix_height: 4096,
            edge_length: DEFAULT_EDGE_LENGTH,
            processing_order: default_order(),
            use_profiling_events_time: false,
            seed: None,
            selector: SelectorConfig::default(),
            devices: vec![Device::host_cpu(0)],
        }
    }
}
