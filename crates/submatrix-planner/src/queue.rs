// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! [`SubMatrixQueue`]: the FIFO of sub-matrices for one processing level.
//!
//! A queue is fully populated by the planner before any worker touches
//! it. Workers drain it with the non-blocking [`SubMatrixQueue::pop`];
//! an empty queue means the level is exhausted, never "wait for more".

use crate::SubMatrix;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Multi-consumer FIFO of sub-matrices sharing one partition level.
#[derive(Debug)]
pub struct SubMatrixQueue {
    level: usize,
    capacity: usize,
    items: Mutex<VecDeque<SubMatrix>>,
}

impl SubMatrixQueue {
    /// Creates a queue for `level` from sub-matrices already in that level.
    pub(crate) fn new(level: usize, items: Vec<SubMatrix>) -> Self {
        debug_assert!(items.iter().all(|s| s.partition_level() == level));
        Self {
            level,
            capacity: items.len(),
            items: Mutex::new(items.into()),
        }
    }

    /// The partition level every member of this queue belongs to.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Removes and returns the next sub-matrix, or `None` once drained.
    ///
    /// Each sub-matrix is returned to exactly one caller, no matter how
    /// many workers pop concurrently.
    pub fn pop(&self) -> Option<SubMatrix> {
        self.items.lock().pop_front()
    }

    /// Number of sub-matrices still waiting.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if the queue has been drained.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of sub-matrices the queue was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies the sub-matrices still waiting, in pop order.
    pub fn snapshot(&self) -> Vec<SubMatrix> {
        self.items.lock().iter().cloned().collect()
    }
}
