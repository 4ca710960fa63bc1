// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Adaptive policies that learn which flavour is fastest on a device.
//!
//! All of them start with an exploration phase: while a candidate has
//! been invoked fewer than `explore` times, the least-tried candidate is
//! chosen. Afterwards they exploit the flavour with the lowest mean
//! execute time, with varying amounts of randomisation.

use super::SelectionPolicy;
use crate::FlavourStats;
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Least-tried candidate, if any is still under the exploration quota.
fn undersampled(candidates: &[usize], stats: &[FlavourStats], explore: u32) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| stats[i].invocations < u64::from(explore))
        .min_by_key(|&i| stats[i].invocations)
}

/// Candidate with the lowest mean execute time.
///
/// Untried flavours rank first; flavours that never succeeded rank last.
fn fastest(candidates: &[usize], stats: &[FlavourStats]) -> usize {
    candidates
        .iter()
        .copied()
        .min_by_key(|&i| match stats[i].mean_execute() {
            None if stats[i].invocations == 0 => (0, std::time::Duration::ZERO),
            Some(mean) => (1, mean),
            None => (2, std::time::Duration::ZERO),
        })
        .unwrap_or(candidates[0])
}

fn random_candidate(rng: &mut StdRng, candidates: &[usize]) -> usize {
    candidates[rng.gen_range(0..candidates.len())]
}

/// Explore every flavour `explore` times, then always exploit.
#[derive(Debug, Clone)]
pub struct EpsilonFirst {
    explore: u32,
}

impl EpsilonFirst {
    pub fn new(explore: u32) -> Self {
        Self { explore }
    }
}

impl SelectionPolicy for EpsilonFirst {
    fn name(&self) -> &str {
        "epsilon-first"
    }

    fn choose(&mut self, candidates: &[usize], stats: &[FlavourStats], _processed: u64) -> usize {
        undersampled(candidates, stats, self.explore).unwrap_or_else(|| fastest(candidates, stats))
    }
}

/// After exploration, a random flavour with probability `epsilon`.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    explore: u32,
    epsilon: f64,
    rng: StdRng,
}

impl EpsilonGreedy {
    pub fn new(explore: u32, epsilon: f64, seed: u64) -> Self {
        Self {
            explore,
            epsilon: epsilon.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SelectionPolicy for EpsilonGreedy {
    fn name(&self) -> &str {
        "epsilon-greedy"
    }

    fn choose(&mut self, candidates: &[usize], stats: &[FlavourStats], _processed: u64) -> usize {
        if let Some(i) = undersampled(candidates, stats, self.explore) {
            return i;
        }
        if self.rng.gen_bool(self.epsilon) {
            random_candidate(&mut self.rng, candidates)
        } else {
            fastest(candidates, stats)
        }
    }
}

/// Epsilon-greedy with `epsilon = min(1, delta / processed)`.
#[derive(Debug, Clone)]
pub struct EpsilonDecreasing {
    explore: u32,
    delta: f64,
    rng: StdRng,
}

impl EpsilonDecreasing {
    pub fn new(explore: u32, delta: f64, seed: u64) -> Self {
        Self {
            explore,
            delta,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Exploration probability after `processed` successes.
    pub fn epsilon(&self, processed: u64) -> f64 {
        (self.delta / processed.max(1) as f64).min(1.0)
    }
}

impl SelectionPolicy for EpsilonDecreasing {
    fn name(&self) -> &str {
        "epsilon-decreasing"
    }

    fn choose(&mut self, candidates: &[usize], stats: &[FlavourStats], processed: u64) -> usize {
        if let Some(i) = undersampled(candidates, stats, self.explore) {
            return i;
        }
        let epsilon = self.epsilon(processed);
        if self.rng.gen_bool(epsilon) {
            random_candidate(&mut self.rng, candidates)
        } else {
            fastest(candidates, stats)
        }
    }
}

/// Picks with probability proportional to `(1 / mean_execute)^factor`.
#[derive(Debug, Clone)]
pub struct WeightedGreedy {
    explore: u32,
    factor: f64,
    rng: StdRng,
}

impl WeightedGreedy {
    pub fn new(explore: u32, factor: f64, seed: u64) -> Self {
        Self {
            explore,
            factor,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Log of the selection weight; `-inf` for flavours that never succeeded.
    ///
    /// Means are floored at one nanosecond.
    fn log_weight(&self, stats: &FlavourStats) -> f64 {
        match stats.mean_execute() {
            Some(mean) => -self.factor * mean.as_secs_f64().max(MIN_MEAN_SECS).ln(),
            None => f64::NEG_INFINITY,
        }
    }
}

const MIN_MEAN_SECS: f64 = 1e-9;

impl SelectionPolicy for WeightedGreedy {
    fn name(&self) -> &str {
        "weighted-greedy"
    }

    fn choose(&mut self, candidates: &[usize], stats: &[FlavourStats], _processed: u64) -> usize {
        if let Some(i) = undersampled(candidates, stats, self.explore) {
            return i;
        }
        let logs: Vec<f64> = candidates.iter().map(|&i| self.log_weight(&stats[i])).collect();
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return fastest(candidates, stats);
        }
        // Normalised so the heaviest weight is 1 and none overflows.
        let weights: Vec<f64> = logs.iter().map(|l| (l - max).exp()).collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => candidates[self.rng.sample(dist)],
            Err(_) => fastest(candidates, stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stats(samples: &[(u64, u64)]) -> Vec<FlavourStats> {
        // (successes, mean execute ms)
        samples
            .iter()
            .map(|&(n, ms)| FlavourStats {
                invocations: n,
                successes: n,
                failures: 0,
                total_execute: Duration::from_millis(ms * n),
            })
            .collect()
    }

    #[test]
    fn test_exploration_round_robin() {
        let mut p = EpsilonFirst::new(2);
        assert_eq!(p.choose(&[0, 1, 2], &stats(&[(1, 5), (0, 0), (1, 5)]), 0), 1);
        assert_eq!(p.choose(&[0, 1, 2], &stats(&[(2, 5), (2, 5), (1, 5)]), 0), 2);
    }

    #[test]
    fn test_epsilon_first_exploits_fastest() {
        let mut p = EpsilonFirst::new(2);
        let s = stats(&[(2, 9), (2, 3), (2, 6)]);
        for _ in 0..10 {
            assert_eq!(p.choose(&[0, 1, 2], &s, 6), 1);
        }
        // Fastest excluded (already failed on this sub-matrix).
        assert_eq!(p.choose(&[0, 2], &s, 6), 2);
    }

    #[test]
    fn test_never_succeeded_ranks_last() {
        let mut s = stats(&[(0, 0), (3, 8)]);
        s[0].invocations = 3;
        s[0].failures = 3;
        assert_eq!(fastest(&[0, 1], &s), 1);
    }

    #[test]
    fn test_epsilon_greedy_zero_is_pure_exploit() {
        let mut p = EpsilonGreedy::new(1, 0.0, 42);
        let s = stats(&[(4, 2), (4, 1)]);
        for _ in 0..50 {
            assert_eq!(p.choose(&[0, 1], &s, 8), 1);
        }
    }

    #[test]
    fn test_epsilon_greedy_one_explores_both() {
        let mut p = EpsilonGreedy::new(1, 1.0, 42);
        let s = stats(&[(4, 2), (4, 1)]);
        let picks: Vec<usize> = (0..200).map(|_| p.choose(&[0, 1], &s, 8)).collect();
        assert!(picks.contains(&0));
        assert!(picks.contains(&1));
    }

    #[test]
    fn test_epsilon_decreasing_schedule() {
        let p = EpsilonDecreasing::new(1, 4.0, 0);
        assert_eq!(p.epsilon(0), 1.0);
        assert_eq!(p.epsilon(2), 1.0);
        assert_eq!(p.epsilon(8), 0.5);
        assert!(p.epsilon(400) < 0.02);
    }

    #[test]
    fn test_weighted_greedy_prefers_fast() {
        let mut p = WeightedGreedy::new(1, 3.0, 9);
        let s = stats(&[(5, 10), (5, 1)]);
        let fast = (0..500).filter(|_| p.choose(&[0, 1], &s, 10) == 1).count();
        assert!(fast > 450, "fast flavour chosen only {fast} times");
    }

    #[test]
    fn test_weighted_greedy_large_factor_short_mean() {
        let nanos = FlavourStats {
            invocations: 1,
            successes: 1,
            failures: 0,
            total_execute: Duration::from_nanos(1),
        };
        let s = vec![nanos.clone(), nanos];
        let mut p = WeightedGreedy::new(1, 40.0, 1);
        let picks: Vec<usize> = (0..200).map(|_| p.choose(&[0, 1], &s, 2)).collect();
        assert!(picks.contains(&0));
        assert!(picks.contains(&1));
    }

    #[test]
    fn test_weighted_greedy_zero_mean_and_never_succeeded() {
        let mut s = stats(&[(2, 0), (2, 5), (0, 0)]);
        s[2].invocations = 2;
        s[2].failures = 2;
        let mut p = WeightedGreedy::new(1, 40.0, 3);
        for _ in 0..100 {
            assert_eq!(p.choose(&[0, 1, 2], &s, 4), 0);
        }
        // Only a never-succeeded candidate left.
        assert_eq!(p.choose(&[2], &s, 4), 2);
    }

    #[test]
    fn test_seeded_policies_are_deterministic() {
        let s = stats(&[(3, 4), (3, 5), (3, 6)]);
        let mut a = EpsilonGreedy::new(1, 0.5, 1234);
        let mut b = EpsilonGreedy::new(1, 0.5, 1234);
        for _ in 0..32 {
            assert_eq!(a.choose(&[0, 1, 2], &s, 9), b.choose(&[0, 1, 2], &s, 9));
        }
    }
}
