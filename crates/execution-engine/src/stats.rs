// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Matrix-level runtime statistics.
//!
//! [`MatrixRuntimes`] holds one entry per partition of the grid. A
//! partition that no flavour could process still gets an entry, with
//! zero phases and [`EntryStatus::Unprocessed`], so after a run without
//! fatal errors the entry count equals the partition count.

use crate::EngineError;
use flavour::{DeviceId, PhaseTimes};
use std::time::Duration;
use submatrix_planner::{GridShape, SubMatrix, SubMatrixId};

/// Outcome recorded for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Processed,
    Unprocessed,
}

/// Runtime of one partition.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RuntimeEntry {
    pub sub_matrix: SubMatrixId,
    pub partition: (usize, usize),
    pub level: usize,
    pub phases: PhaseTimes,
    /// Device that processed (or gave up on) the partition.
    pub device: Option<DeviceId>,
    /// Flavour that succeeded, if any.
    pub flavour: Option<String>,
    pub status: EntryStatus,
}

impl RuntimeEntry {
    pub fn is_processed(&self) -> bool {
        self.status == EntryStatus::Processed
    }
}

/// Per-partition runtimes keyed by partition coordinates.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MatrixRuntimes {
    partitions_x: usize,
    partitions_y: usize,
    entries: Vec<Option<RuntimeEntry>>,
}

impl MatrixRuntimes {
    /// Creates an empty grid of `partitions_x * partitions_y` slots.
    pub fn new(partitions_x: usize, partitions_y: usize) -> Self {
        Self {
            partitions_x,
            partitions_y,
            entries: vec![None; partitions_x * partitions_y],
        }
    }

    pub fn for_grid(grid: GridShape) -> Self {
        Self::new(grid.partitions_x, grid.partitions_y)
    }

    pub fn grid(&self) -> GridShape {
        GridShape {
            partitions_x: self.partitions_x,
            partitions_y: self.partitions_y,
        }
    }

    /// Records the runtime of a successfully processed partition.
    pub fn record_processed(
        &mut self,
        sub_matrix: &SubMatrix,
        phases: PhaseTimes,
        device: DeviceId,
        flavour: &str,
    ) -> Result<(), EngineError> {
        self.insert(RuntimeEntry {
            sub_matrix: sub_matrix.id(),
            partition: (sub_matrix.partition_index_x(), sub_matrix.partition_index_y()),
            level: sub_matrix.partition_level(),
            phases,
            device: Some(device),
            flavour: Some(flavour.to_string()),
            status: EntryStatus::Processed,
        })
    }

    /// Records the zero sentinel for a partition no flavour could process.
    pub fn record_unprocessed(
        &mut self,
        sub_matrix: &SubMatrix,
        device: Option<DeviceId>,
    ) -> Result<(), EngineError> {
        self.insert(RuntimeEntry {
            sub_matrix: sub_matrix.id(),
            partition: (sub_matrix.partition_index_x(), sub_matrix.partition_index_y()),
            level: sub_matrix.partition_level(),
            phases: PhaseTimes::ZERO,
            device,
            flavour: None,
            status: EntryStatus::Unprocessed,
        })
    }

    fn insert(&mut self, entry: RuntimeEntry) -> Result<(), EngineError> {
        let (x, y) = entry.partition;
        if x >= self.partitions_x || y >= self.partitions_y {
            return Err(EngineError::InvalidState(format!(
                "partition ({x}, {y}) outside {}x{} grid",
                self.partitions_x, self.partitions_y
            )));
        }
        let slot = &mut self.entries[y * self.partitions_x + x];
        if slot.is_some() {
            return Err(EngineError::DuplicateRecord {
                id: entry.sub_matrix,
            });
        }
        *slot = Some(entry);
        Ok(())
    }

    /// Entry for partition `(x, y)`, if recorded.
    pub fn entry(&self, x: usize, y: usize) -> Option<&RuntimeEntry> {
        if x >= self.partitions_x || y >= self.partitions_y {
            return None;
        }
        self.entries[y * self.partitions_x + x].as_ref()
    }

    /// Recorded entries in row-major partition order.
    pub fn entries(&self) -> impl Iterator<Item = &RuntimeEntry> {
        self.entries.iter().flatten()
    }

    pub fn num_entries(&self) -> usize {
        self.entries().count()
    }

    pub fn num_processed(&self) -> usize {
        self.entries().filter(|e| e.is_processed()).count()
    }

    pub fn num_unprocessed(&self) -> usize {
        self.entries().filter(|e| !e.is_processed()).count()
    }

    /// `true` once every partition has an entry.
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }

    /// Sum of all recorded phases.
    pub fn total(&self) -> PhaseTimes {
        self.entries().fold(PhaseTimes::ZERO, |acc, e| acc + e.phases)
    }

    /// Shortest execute phase among processed partitions.
    pub fn min_execute(&self) -> Option<Duration> {
        self.processed_execute().min()
    }

    /// Longest execute phase among processed partitions.
    pub fn max_execute(&self) -> Option<Duration> {
        self.processed_execute().max()
    }

    /// Mean execute phase among processed partitions.
    pub fn mean_execute(&self) -> Option<Duration> {
        let n = self.num_processed();
        if n == 0 {
            return None;
        }
        let sum: Duration = self.processed_execute().sum();
        Some(sum / u32::try_from(n).unwrap_or(u32::MAX))
    }

    fn processed_execute(&self) -> impl Iterator<Item = Duration> + '_ {
        self.entries()
            .filter(|e| e.is_processed())
            .map(|e| e.phases.execute)
    }

    /// Ids of partitions recorded as unprocessed.
    pub fn unprocessed(&self) -> Vec<SubMatrixId> {
        self.entries()
            .filter(|e| !e.is_processed())
            .map(|e| e.sub_matrix)
            .collect()
    }

    pub fn summary(&self) -> String {
        let total = self.total();
        let mut s = format!(
            "Runtimes: {}/{} entries ({} processed, {} unprocessed)\n",
            self.num_entries(),
            self.entries.len(),
            self.num_processed(),
            self.num_unprocessed()
        );
        s.push_str(&format!(
            "  create buffers: {:?}, to device: {:?}, execute: {:?}, from device: {:?}\n",
            total.create_buffers, total.transfer_to_device, total.execute, total.transfer_from_device
        ));
        if let (Some(min), Some(max), Some(mean)) =
            (self.min_execute(), self.max_execute(), self.mean_execute())
        {
            s.push_str(&format!("  execute min/mean/max: {min:?} / {mean:?} / {max:?}\n"));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(x: usize, y: usize) -> SubMatrix {
        SubMatrix::new((x, y), 2, (x * 10, y * 10), (10, 10), x + y).unwrap()
    }

    fn ms(n: u64) -> PhaseTimes {
        PhaseTimes::from_execute(Duration::from_millis(n))
    }

    #[test]
    fn test_record_and_aggregate() {
        let mut rt = MatrixRuntimes::new(2, 2);
        rt.record_processed(&tile(0, 0), ms(4), DeviceId(0), "a").unwrap();
        rt.record_processed(&tile(1, 0), ms(8), DeviceId(1), "b").unwrap();
        rt.record_unprocessed(&tile(1, 1), Some(DeviceId(0))).unwrap();

        assert_eq!(rt.num_entries(), 3);
        assert_eq!(rt.num_processed(), 2);
        assert_eq!(rt.num_unprocessed(), 1);
        assert!(!rt.is_complete());
        assert_eq!(rt.total().execute, Duration::from_millis(12));
        assert_eq!(rt.min_execute(), Some(Duration::from_millis(4)));
        assert_eq!(rt.max_execute(), Some(Duration::from_millis(8)));
        assert_eq!(rt.mean_execute(), Some(Duration::from_millis(6)));
        assert_eq!(rt.unprocessed(), vec![tile(1, 1).id()]);

        let e = rt.entry(1, 0).unwrap();
        assert_eq!(e.flavour.as_deref(), Some("b"));
        assert_eq!(e.level, 1);
        assert!(rt.entry(0, 1).is_none());

        rt.record_processed(&tile(0, 1), ms(1), DeviceId(0), "a").unwrap();
        assert!(rt.is_complete());
    }

    #[test]
    fn test_unprocessed_is_zero_sentinel() {
        let mut rt = MatrixRuntimes::new(2, 2);
        rt.record_unprocessed(&tile(1, 1), None).unwrap();
        let e = rt.entry(1, 1).unwrap();
        assert!(e.phases.is_zero());
        assert_eq!(e.status, EntryStatus::Unprocessed);
        assert_eq!(rt.min_execute(), None);
        assert_eq!(rt.mean_execute(), None);
    }

    #[test]
    fn test_duplicate_record() {
        let mut rt = MatrixRuntimes::new(2, 2);
        rt.record_processed(&tile(0, 0), ms(1), DeviceId(0), "a").unwrap();
        let err = rt.record_unprocessed(&tile(0, 0), None).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateRecord { .. }));
        assert_eq!(rt.num_entries(), 1);
    }

    #[test]
    fn test_out_of_grid() {
        let mut rt = MatrixRuntimes::new(1, 1);
        assert!(rt.record_unprocessed(&tile(1, 1), None).is_err());
    }

    #[test]
    fn test_summary() {
        let mut rt = MatrixRuntimes::new(2, 2);
        rt.record_processed(&tile(0, 0), ms(2), DeviceId(0), "a").unwrap();
        let s = rt.summary();
        assert!(s.contains("1/4 entries"));
        assert!(s.contains("min/mean/max"));
    }
}
