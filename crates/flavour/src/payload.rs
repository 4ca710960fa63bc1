// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named numeric buffers passed alongside a sub-matrix.
//!
//! Domain code attaches input data (time-series slices, carried-over
//! border values) before a flavour runs, and a flavour hands back its
//! results (counts, histograms) the same way.

use std::collections::BTreeMap;
use std::sync::Arc;

/// One named buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    /// Shared, read-only real values.
    Real(Arc<[f64]>),
    /// Owned counters.
    Count(Vec<u64>),
}

/// A set of named buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    buffers: BTreeMap<String, Buffer>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches shared real-valued data under `name`, replacing any
    /// previous buffer of that name.
    pub fn insert_real(&mut self, name: impl Into<String>, data: Arc<[f64]>) {
        self.buffers.insert(name.into(), Buffer::Real(data));
    }

    /// Attaches counters under `name`.
    pub fn insert_counts(&mut self, name: impl Into<String>, counts: Vec<u64>) {
        self.buffers.insert(name.into(), Buffer::Count(counts));
    }

    pub fn get(&self, name: &str) -> Option<&Buffer> {
        self.buffers.get(name)
    }

    pub fn real(&self, name: &str) -> Option<&[f64]> {
        match self.buffers.get(name)? {
            Buffer::Real(data) => Some(data),
            Buffer::Count(_) => None,
        }
    }

    pub fn counts(&self, name: &str) -> Option<&[u64]> {
        match self.buffers.get(name)? {
            Buffer::Count(counts) => Some(counts),
            Buffer::Real(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Buffer)> {
        self.buffers.iter().map(|(k, v)| (k.as_str(), v))
    }
}
