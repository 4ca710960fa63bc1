// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-device flavour selection.
//!
//! A [`Selector`] owns the flavours of exactly one device together with
//! their running statistics and a pluggable [`SelectionPolicy`]. It is
//! driven by the single worker that owns the device, so it holds no
//! locks.
//!
//! # Retry bound
//!
//! [`Selector::next_flavour`] never returns a flavour that already
//! failed on the current sub-matrix. A sub-matrix is therefore attempted
//! at most once per registered flavour, and policies that do not retry
//! (the baseline [`Single`]) give up after the first failure.

mod epsilon;
mod fallback;
mod single;

pub use epsilon::{EpsilonDecreasing, EpsilonFirst, EpsilonGreedy, WeightedGreedy};
pub use fallback::Fallback;
pub use single::Single;

use crate::{Device, Flavour, FlavourError, FlavourStats, Payload, PhaseTimes, Processed, SelectorError};
use submatrix_planner::SubMatrix;

/// Policy deciding which flavour a device tries next.
pub trait SelectionPolicy: Send + std::fmt::Debug {
    /// Name used in configuration and reports.
    fn name(&self) -> &str;

    /// Picks one of `candidates` (non-empty, ascending flavour indices).
    ///
    /// `stats` covers every flavour of the device, indexed like the
    /// flavours; `processed` is the device's success count so far.
    fn choose(&mut self, candidates: &[usize], stats: &[FlavourStats], processed: u64) -> usize;

    /// Whether a sub-matrix may be retried with another flavour after a
    /// compute failure.
    fn retries_on_failure(&self) -> bool {
        true
    }
}

/// Per-device selector: flavours, statistics, counter and policy.
pub struct Selector {
    device: Device,
    flavours: Vec<Box<dyn Flavour>>,
    stats: Vec<FlavourStats>,
    policy: Box<dyn SelectionPolicy>,
    processed: u64,
}

/// Snapshot of one flavour's statistics, for reports.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FlavourReport {
    pub name: String,
    pub stats: FlavourStats,
}

impl Selector {
    /// Creates a selector for `device`.
    ///
    /// Fails if `flavours` is empty.
    pub fn new(
        device: Device,
        flavours: Vec<Box<dyn Flavour>>,
        policy: Box<dyn SelectionPolicy>,
    ) -> Result<Self, SelectorError> {
        if flavours.is_empty() {
            return Err(SelectorError::NoMatchingFlavour {
                device: device.name.clone(),
            });
        }
        tracing::debug!(
            "selector for {device}: policy '{}', {} flavour(s)",
            policy.name(),
            flavours.len()
        );
        let stats = vec![FlavourStats::default(); flavours.len()];
        Ok(Self {
            device,
            flavours,
            stats,
            policy,
            processed: 0,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn num_flavours(&self) -> usize {
        self.flavours.len()
    }

    /// Name of the flavour at `index`.
    pub fn flavour_name(&self, index: usize) -> &str {
        self.flavours[index].name()
    }

    /// Number of sub-matrices this device processed successfully.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn stats(&self) -> &[FlavourStats] {
        &self.stats
    }

    /// Per-flavour statistics with flavour names.
    pub fn flavour_report(&self) -> Vec<FlavourReport> {
        self.flavours
            .iter()
            .zip(&self.stats)
            .map(|(f, s)| FlavourReport {
                name: f.name().to_string(),
                stats: s.clone(),
            })
            .collect()
    }

    /// Returns the flavour to try next on `sub_matrix`, or `None` when no
    /// attempt is left.
    ///
    /// `failed` lists the flavours that already failed on this sub-matrix.
    pub fn next_flavour(&mut self, sub_matrix: &SubMatrix, failed: &[usize]) -> Option<usize> {
        if !failed.is_empty() && !self.policy.retries_on_failure() {
            return None;
        }
        let candidates: Vec<usize> = (0..self.flavours.len())
            .filter(|i| !failed.contains(i))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let mut choice = self.policy.choose(&candidates, &self.stats, self.processed);
        if !candidates.contains(&choice) {
            tracing::warn!(
                "policy '{}' chose flavour {choice} outside {candidates:?}; using {}",
                self.policy.name(),
                candidates[0]
            );
            choice = candidates[0];
        }
        tracing::trace!(
            "{}: {} -> flavour '{}'",
            self.device.id,
            sub_matrix.id(),
            self.flavours[choice].name()
        );
        Some(choice)
    }

    /// Runs flavour `index` on `sub_matrix`.
    pub fn process(
        &mut self,
        index: usize,
        sub_matrix: &SubMatrix,
        input: &Payload,
    ) -> Result<Processed, FlavourError> {
        self.stats[index].invocations += 1;
        self.flavours[index].process(sub_matrix, input)
    }

    /// Records a confirmed success of flavour `index`.
    ///
    /// Call exactly once per successfully processed sub-matrix, after the
    /// result has been recorded globally.
    pub fn on_success(&mut self, index: usize, phases: &PhaseTimes) {
        self.stats[index].record_success(phases.execute);
        self.processed += 1;
    }

    /// Records a compute failure of flavour `index`.
    pub fn on_failure(&mut self, index: usize) {
        self.stats[index].record_failure();
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("device", &self.device.name)
            .field("policy", &self.policy.name())
            .field(
                "flavours",
                &self.flavours.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field("processed", &self.processed)
            .finish()
    }
}

// ── Configuration ──────────────────────────────────────────────

fn default_explore() -> u32 {
    10
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_delta() -> f64 {
    4.0
}

fn default_factor() -> f64 {
    1.0
}

fn default_demote_after() -> u32 {
    1
}

/// Serializable description of a selection policy.
///
/// ```toml
/// [selector]
/// policy = "epsilon-greedy"
/// explore = 5
/// epsilon = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SelectorConfig {
    /// Always the first flavour, never retried.
    #[default]
    Single,
    /// Registration order; downgrade on failure.
    Fallback {
        #[serde(default = "default_demote_after")]
        demote_after: u32,
    },
    /// Explore every flavour, then always exploit the fastest.
    EpsilonFirst {
        #[serde(default = "default_explore")]
        explore: u32,
    },
    /// Explore, then pick a random flavour with probability `epsilon`.
    EpsilonGreedy {
        #[serde(default = "default_explore")]
        explore: u32,
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
    /// Like greedy with `epsilon = min(1, delta / processed)`.
    EpsilonDecreasing {
        #[serde(default = "default_explore")]
        explore: u32,
        #[serde(default = "default_delta")]
        delta: f64,
    },
    /// Explore, then pick with probability proportional to speed^factor.
    WeightedGreedy {
        #[serde(default = "default_explore")]
        explore: u32,
        #[serde(default = "default_factor")]
        factor: f64,
    },
}

impl SelectorConfig {
    /// Parses a policy name, using default parameters.
    pub fn from_name(name: &str) -> Result<Self, SelectorError> {
        match name.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "fallback" => Ok(Self::Fallback {
                demote_after: default_demote_after(),
            }),
            "epsilon-first" => Ok(Self::EpsilonFirst {
                explore: default_explore(),
            }),
            "epsilon-greedy" => Ok(Self::EpsilonGreedy {
                explore: default_explore(),
                epsilon: default_epsilon(),
            }),
            "epsilon-decreasing" => Ok(Self::EpsilonDecreasing {
                explore: default_explore(),
                delta: default_delta(),
            }),
            "weighted-greedy" | "vw-greedy" => Ok(Self::WeightedGreedy {
                explore: default_explore(),
                factor: default_factor(),
            }),
            _ => Err(SelectorError::UnknownPolicy(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Fallback { .. } => "fallback",
            Self::EpsilonFirst { .. } => "epsilon-first",
            Self::EpsilonGreedy { .. } => "epsilon-greedy",
            Self::EpsilonDecreasing { .. } => "epsilon-decreasing",
            Self::WeightedGreedy { .. } => "weighted-greedy",
        }
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), SelectorError> {
        let invalid = |name: &'static str, detail: String| {
            Err(SelectorError::InvalidParameter { name, detail })
        };
        match *self {
            Self::Single => Ok(()),
            Self::Fallback { demote_after } if demote_after == 0 => {
                invalid("demote_after", "must be at least 1".into())
            }
            Self::Fallback { .. } => Ok(()),
            Self::EpsilonFirst { explore }
            | Self::EpsilonGreedy { explore, .. }
            | Self::EpsilonDecreasing { explore, .. }
            | Self::WeightedGreedy { explore, .. }
                if explore == 0 =>
            {
                invalid("explore", "must be at least 1".into())
            }
            Self::EpsilonGreedy { epsilon, .. } if !(0.0..=1.0).contains(&epsilon) => {
                invalid("epsilon", format!("{epsilon} is outside [0, 1]"))
            }
            Self::EpsilonDecreasing { delta, .. } if !(delta > 0.0 && delta.is_finite()) => {
                invalid("delta", format!("{delta} must be positive"))
            }
            Self::WeightedGreedy { factor, .. } if !(factor > 0.0 && factor.is_finite()) => {
                invalid("factor", format!("{factor} must be positive"))
            }
            _ => Ok(()),
        }
    }

    /// Builds a fresh policy instance. `seed` drives the random policies.
    pub fn build(&self, seed: u64) -> Result<Box<dyn SelectionPolicy>, SelectorError> {
        self.validate()?;
        Ok(match *self {
            Self::Single => Box::new(Single),
            Self::Fallback { demote_after } => Box::new(Fallback::new(demote_after)),
            Self::EpsilonFirst { explore } => Box::new(EpsilonFirst::new(explore)),
            Self::EpsilonGreedy { explore, epsilon } => {
                Box::new(EpsilonGreedy::new(explore, epsilon, seed))
            }
            Self::EpsilonDecreasing { explore, delta } => {
                Box::new(EpsilonDecreasing::new(explore, delta, seed))
            }
            Self::WeightedGreedy { explore, factor } => {
                Box::new(WeightedGreedy::new(explore, factor, seed))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComputeError, DeviceKind, Runtime};
    use std::time::Duration;

    /// Fails on sub-matrices whose partition x index is in `fail_x`.
    struct Picky {
        name: &'static str,
        fail_x: Vec<usize>,
    }

    impl Flavour for Picky {
        fn name(&self) -> &str {
            self.name
        }

        fn process(&self, sm: &SubMatrix, _: &Payload) -> Result<Processed, FlavourError> {
            if self.fail_x.contains(&sm.partition_index_x()) {
                return Err(ComputeError::Kernel("picky".into()).into());
            }
            Ok(Processed {
                runtime: Runtime::from_wall_clock(PhaseTimes::from_execute(Duration::from_millis(1))),
                output: Payload::new(),
            })
        }
    }

    fn tile(x: usize) -> SubMatrix {
        SubMatrix::new((x, 0), 4, (x * 2, 0), (2, 2), x).unwrap()
    }

    fn selector(policy: SelectorConfig) -> Selector {
        let flavours: Vec<Box<dyn Flavour>> = vec![
            Box::new(Picky {
                name: "a",
                fail_x: vec![1, 2],
            }),
            Box::new(Picky {
                name: "b",
                fail_x: vec![2],
            }),
        ];
        Selector::new(
            Device::new(0, "d", DeviceKind::Cpu),
            flavours,
            policy.build(7).unwrap(),
        )
        .unwrap()
    }

    /// Mirrors the engine's retry loop; returns the winning flavour.
    fn drive(sel: &mut Selector, sm: &SubMatrix) -> Option<usize> {
        let mut failed = Vec::new();
        while let Some(i) = sel.next_flavour(sm, &failed) {
            match sel.process(i, sm, &Payload::new()) {
                Ok(p) => {
                    sel.on_success(i, &p.runtime.wall_clock);
                    return Some(i);
                }
                Err(_) => {
                    sel.on_failure(i);
                    failed.push(i);
                }
            }
        }
        None
    }

    #[test]
    fn test_no_flavours() {
        let err = Selector::new(
            Device::new(0, "empty", DeviceKind::Gpu),
            Vec::new(),
            Box::new(Single),
        )
        .unwrap_err();
        assert!(matches!(err, SelectorError::NoMatchingFlavour { .. }));
    }

    #[test]
    fn test_single_never_retries() {
        let mut sel = selector(SelectorConfig::Single);
        assert_eq!(drive(&mut sel, &tile(0)), Some(0));
        assert_eq!(drive(&mut sel, &tile(1)), None);
        assert_eq!(sel.processed(), 1);
        assert_eq!(sel.stats()[0].invocations, 2);
        assert_eq!(sel.stats()[1].invocations, 0);
    }

    #[test]
    fn test_fallback_downgrades() {
        let mut sel = selector(SelectorConfig::from_name("fallback").unwrap());
        assert_eq!(drive(&mut sel, &tile(1)), Some(1));
        // "a" is now demoted: later sub-matrices go straight to "b".
        assert_eq!(drive(&mut sel, &tile(0)), Some(1));
        assert_eq!(sel.stats()[0].invocations, 1);
    }

    #[test]
    fn test_retry_bounded_by_flavours() {
        let mut sel = selector(SelectorConfig::from_name("fallback").unwrap());
        assert_eq!(drive(&mut sel, &tile(2)), None);
        let total: u64 = sel.stats().iter().map(|s| s.invocations).sum();
        assert_eq!(total, 2);
        assert_eq!(sel.processed(), 0);
    }

    #[test]
    fn test_counter_monotonic() {
        let mut sel = selector(SelectorConfig::from_name("epsilon-greedy").unwrap());
        let mut last = 0;
        for x in [0, 1, 3, 0, 2, 3] {
            drive(&mut sel, &tile(x));
            assert!(sel.processed() >= last);
            last = sel.processed();
        }
        assert_eq!(last, 5);
    }

    #[test]
    fn test_flavour_report() {
        let mut sel = selector(SelectorConfig::Single);
        drive(&mut sel, &tile(0));
        let report = sel.flavour_report();
        assert_eq!(report[0].name, "a");
        assert_eq!(report[0].stats.successes, 1);
        assert!(format!("{sel:?}").contains("single"));
    }

    #[test]
    fn test_config_from_name() {
        for name in [
            "single",
            "fallback",
            "epsilon-first",
            "epsilon-greedy",
            "epsilon-decreasing",
            "weighted-greedy",
        ] {
            let cfg = SelectorConfig::from_name(name).unwrap();
            assert_eq!(cfg.name(), name);
            assert_eq!(cfg.build(1).unwrap().name(), name);
        }
        assert!(matches!(
            SelectorConfig::from_name("roulette"),
            Err(SelectorError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(SelectorConfig::EpsilonGreedy {
            explore: 1,
            epsilon: 1.5
        }
        .build(0)
        .is_err());
        assert!(SelectorConfig::EpsilonFirst { explore: 0 }.validate().is_err());
        assert!(SelectorConfig::Fallback { demote_after: 0 }.validate().is_err());
        assert!(SelectorConfig::EpsilonDecreasing {
            explore: 2,
            delta: -1.0
        }
        .validate()
        .is_err());
        assert!(SelectorConfig::WeightedGreedy {
            explore: 2,
            factor: 2.0
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_config_serde() {
        let cfg: SelectorConfig =
            serde_json::from_str(r#"{"policy": "epsilon-greedy", "epsilon": 0.3}"#).unwrap();
        assert_eq!(
            cfg,
            SelectorConfig::EpsilonGreedy {
                explore: 10,
                epsilon: 0.3
            }
        );
        let single: SelectorConfig = serde_json::from_str(r#"{"policy": "single"}"#).unwrap();
        assert_eq!(single, SelectorConfig::Single);
    }
}
