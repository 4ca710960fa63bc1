// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Ordered fallback: try flavours in registration order, downgrade on
//! failure.

use super::SelectionPolicy;
use crate::FlavourStats;

/// Prefers flavours in registration order.
///
/// A failed sub-matrix is retried on the next flavour. Once a flavour has
/// failed `demote_after` times it is skipped for later sub-matrices as
/// long as another candidate has not been demoted too.
#[derive(Debug, Clone)]
pub struct Fallback {
    demote_after: u32,
}

impl Fallback {
    pub fn new(demote_after: u32) -> Self {
        Self {
            demote_after: demote_after.max(1),
        }
    }
}

impl SelectionPolicy for Fallback {
    fn name(&self) -> &str {
        "fallback"
    }

    fn choose(&mut self, candidates: &[usize], stats: &[FlavourStats], _processed: u64) -> usize {
        candidates
            .iter()
            .copied()
            .find(|&i| stats[i].failures < u64::from(self.demote_after))
            .unwrap_or(candidates[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures(n: &[u64]) -> Vec<FlavourStats> {
        n.iter()
            .map(|&failures| FlavourStats {
                failures,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_prefers_first_healthy() {
        let mut p = Fallback::new(2);
        assert_eq!(p.choose(&[0, 1, 2], &failures(&[1, 0, 0]), 0), 0);
        assert_eq!(p.choose(&[0, 1, 2], &failures(&[2, 0, 0]), 0), 1);
        assert_eq!(p.choose(&[0, 1, 2], &failures(&[2, 5, 0]), 0), 2);
    }

    #[test]
    fn test_all_demoted_uses_first_candidate() {
        let mut p = Fallback::new(1);
        assert_eq!(p.choose(&[1, 2], &failures(&[3, 3, 3]), 0), 1);
    }
}
