// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The execution engine: drives a [`PartitionPlan`] level by level.
//!
//! ```text
//! Idle ──run()──▶ Validating ──▶ RunningLevel(0) ──▶ … ──▶ RunningLevel(n) ──▶ Done
//!                     │                 │                        │
//!                     │ no devices      └──── fatal error ───────┴──▶ Failed { level }
//!                     ▼
//!                    Done
//! ```
//!
//! With one device every level is drained in the caller's thread. With
//! several devices each level gets one scoped worker thread per device;
//! the workers pop from the level's shared queue and are all joined
//! before the next level starts.

use crate::{EngineConfig, EngineError, EngineHooks, MatrixRuntimes, NoHooks};
use flavour::{Device, FlavourError, FlavourFactory, FlavourReport, Payload, Selector};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use submatrix_planner::{PartitionPlan, SubMatrix, SubMatrixQueue};

// ── State ──────────────────────────────────────────────────────

/// Lifecycle state of an [`ExecutionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineState {
    /// Constructed, `run()` not called yet.
    Idle,
    /// `run()` entered; checking devices.
    Validating,
    /// Processing the level with the given index.
    RunningLevel(usize),
    /// Every level finished.
    Done,
    /// A fatal error stopped the run at `level`.
    Failed { level: usize },
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::RunningLevel(n) => write!(f, "running level {n}"),
            Self::Done => f.write_str("done"),
            Self::Failed { level } => write!(f, "failed at level {level}"),
        }
    }
}

// ── Report ─────────────────────────────────────────────────────

/// Per-device outcome of a run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeviceReport {
    pub device: Device,
    pub policy: String,
    /// Sub-matrices this device processed successfully.
    pub processed: u64,
    pub flavours: Vec<FlavourReport>,
}

/// Timing of one level.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LevelReport {
    pub level: usize,
    pub sub_matrices: usize,
    pub wall_time: Duration,
}

/// Result of a successful [`ExecutionEngine::run`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunReport {
    pub state: EngineState,
    pub levels_completed: usize,
    pub num_sub_matrices: usize,
    pub num_processed: usize,
    pub num_unprocessed: usize,
    pub levels: Vec<LevelReport>,
    pub devices: Vec<DeviceReport>,
    pub wall_time: Duration,
}

impl RunReport {
    pub fn summary(&self) -> String {
        let mut s = format!(
            "Run {}: {} levels, {} sub-matrices ({} processed, {} unprocessed) in {:.3}s\n",
            self.state,
            self.levels_completed,
            self.num_sub_matrices,
            self.num_processed,
            self.num_unprocessed,
            self.wall_time.as_secs_f64()
        );
        for d in &self.devices {
            s.push_str(&format!(
                "  {} [{}]: {} processed\n",
                d.device, d.policy, d.processed
            ));
            for f in &d.flavours {
                let mean = f
                    .stats
                    .mean_execute()
                    .map(|m| format!("{m:?}"))
                    .unwrap_or_else(|| "-".to_string());
                s.push_str(&format!(
                    "    {:<16} {:>6} ok {:>6} failed  mean {}\n",
                    f.name, f.stats.successes, f.stats.failures, mean
                ));
            }
        }
        s
    }
}

// ── Engine ─────────────────────────────────────────────────────

/// Runs every partition of a plan on a set of devices.
///
/// # Example
/// ```
/// use execution_engine::{EngineConfig, EngineState, ExecutionEngine};
/// use flavour::{Device, DeviceKind, SimulatedFlavour};
///
/// let config = EngineConfig {
///     matrix_width: 64,
///     matrix_height: 64,
///     edge_length: 16,
///     devices: vec![Device::new(0, "cpu0", DeviceKind::Cpu)],
///     ..Default::default()
/// };
/// let factory = |d: &Device| SimulatedFlavour::for_device(d, 0, &[1]);
/// let mut engine = ExecutionEngine::new(config, &factory).unwrap();
/// let report = engine.run().unwrap();
/// assert_eq!(report.state, EngineState::Done);
/// assert_eq!(report.num_processed, 16);
/// ```
pub struct ExecutionEngine {
    config: EngineConfig,
    plan: PartitionPlan,
    selectors: Vec<Selector>,
    runtimes: Mutex<MatrixRuntimes>,
    hooks: Arc<dyn EngineHooks>,
    state: EngineState,
    levels_completed: usize,
}

/// Everything a worker needs to drain one level.
struct LevelContext<'a> {
    level: usize,
    queue: &'a SubMatrixQueue,
    runtimes: &'a Mutex<MatrixRuntimes>,
    hooks: &'a dyn EngineHooks,
    use_profiling_events_time: bool,
}

impl ExecutionEngine {
    /// Plans the partitions and builds one selector per device.
    ///
    /// Configuration errors (edge length, processing order, selector
    /// parameters, devices without flavours) are reported here, before
    /// any device work.
    pub fn new(config: EngineConfig, factory: &dyn FlavourFactory) -> Result<Self, EngineError> {
        config.validate()?;
        let order = config.create_order()?;
        let plan = submatrix_planner::plan(
            config.matrix_width,
            config.matrix_height,
            config.edge_length,
            order.as_ref(),
        )?;
        tracing::info!("{}", plan.summary().trim_end());

        let mut selectors = Vec::with_capacity(config.devices.len());
        for (index, device) in config.devices.iter().enumerate() {
            let policy = config.selector.build(config.seed_for(index))?;
            let flavours = factory.flavours_for(device);
            selectors.push(Selector::new(device.clone(), flavours, policy)?);
        }

        tracing::info!(
            "engine created: {} device(s), selector '{}', profiling-event timing {}",
            selectors.len(),
            config.selector.name(),
            if config.use_profiling_events_time { "on" } else { "off" }
        );

        let runtimes = Mutex::new(MatrixRuntimes::for_grid(plan.grid));
        Ok(Self {
            config,
            plan,
            selectors,
            runtimes,
            hooks: Arc::new(NoHooks),
            state: EngineState::Idle,
            levels_completed: 0,
        })
    }

    /// Installs the domain hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn EngineHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.selectors.iter().map(Selector::device)
    }

    /// Number of levels that finished.
    pub fn levels_completed(&self) -> usize {
        self.levels_completed
    }

    /// Snapshot of the runtime statistics, including partial results of
    /// a failed run.
    pub fn matrix_runtimes(&self) -> MatrixRuntimes {
        self.runtimes.lock().clone()
    }

    /// Processes every level of the plan.
    ///
    /// Partitions no flavour could process are recorded as unprocessed
    /// and do not fail the run. A device failure or a worker panic stops
    /// the run once the current level's workers are joined.
    pub fn run(&mut self) -> Result<RunReport, EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::InvalidState(format!(
                "run() called while engine is {}",
                self.state
            )));
        }
        let start = Instant::now();
        self.state = EngineState::Validating;

        if self.selectors.is_empty() {
            tracing::warn!("no device specified; nothing to process");
            self.state = EngineState::Done;
            return Ok(self.report(Vec::new(), start.elapsed()));
        }

        let use_profiling_events_time = self.config.use_profiling_events_time;
        let hooks = Arc::clone(&self.hooks);
        let mut levels = Vec::with_capacity(self.plan.num_levels());

        for queue in self.plan.queues() {
            let level = queue.level();
            self.state = EngineState::RunningLevel(level);
            tracing::info!(
                "level {level}: {} sub-matrices on {} device(s)",
                queue.len(),
                self.selectors.len()
            );
            let level_start = Instant::now();
            let ctx = LevelContext {
                level,
                queue,
                runtimes: &self.runtimes,
                hooks: hooks.as_ref(),
                use_profiling_events_time,
            };

            let failures: Vec<EngineError> = match self.selectors.as_mut_slice() {
                [selector] => run_inline(&ctx, selector).err().into_iter().collect(),
                selectors => run_threaded(&ctx, selectors),
            };

            if let Some(err) = collect_failures(level, failures) {
                tracing::error!("{err}");
                self.state = EngineState::Failed { level };
                return Err(err);
            }

            let wall_time = level_start.elapsed();
            tracing::debug!("level {level} finished in {wall_time:?}");
            levels.push(LevelReport {
                level,
                sub_matrices: queue.capacity(),
                wall_time,
            });
            self.levels_completed += 1;
        }

        self.state = EngineState::Done;
        let report = self.report(levels, start.elapsed());
        tracing::info!("{}", report.summary().trim_end());
        Ok(report)
    }

    fn report(&self, levels: Vec<LevelReport>, wall_time: Duration) -> RunReport {
        let runtimes = self.runtimes.lock();
        RunReport {
            state: self.state,
            levels_completed: self.levels_completed,
            num_sub_matrices: self.plan.num_sub_matrices(),
            num_processed: runtimes.num_processed(),
            num_unprocessed: runtimes.num_unprocessed(),
            levels,
            devices: self
                .selectors
                .iter()
                .map(|s| DeviceReport {
                    device: s.device().clone(),
                    policy: s.policy_name().to_string(),
                    processed: s.processed(),
                    flavours: s.flavour_report(),
                })
                .collect(),
            wall_time,
        }
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("state", &self.state)
            .field("plan", &self.plan.summary())
            .field("selectors", &self.selectors)
            .field("levels_completed", &self.levels_completed)
            .finish()
    }
}

// ── Dispatch ───────────────────────────────────────────────────

/// Drains the level in the caller's thread.
fn run_inline(ctx: &LevelContext<'_>, selector: &mut Selector) -> Result<(), EngineError> {
    let device = selector.device().name.clone();
    match panic::catch_unwind(AssertUnwindSafe(|| drain_level(ctx, selector))) {
        Ok(result) => result,
        Err(payload) => Err(EngineError::WorkerPanicked {
            device,
            level: ctx.level,
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Drains the level with one scoped thread per device and joins them all.
fn run_threaded(ctx: &LevelContext<'_>, selectors: &mut [Selector]) -> Vec<EngineError> {
    thread::scope(|scope| {
        let mut failures = Vec::new();
        let mut handles = Vec::with_capacity(selectors.len());

        for selector in selectors.iter_mut() {
            let device = selector.device().name.clone();
            let spawned = thread::Builder::new()
                .name(format!("rqa-{}", selector.device().id))
                .spawn_scoped(scope, move || drain_level(ctx, selector));
            match spawned {
                Ok(handle) => handles.push((device, handle)),
                Err(e) => failures.push(EngineError::DeviceFailure {
                    device,
                    level: ctx.level,
                    detail: format!("cannot spawn worker: {e}"),
                }),
            }
        }

        for (device, handle) in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(e),
                Err(payload) => failures.push(EngineError::WorkerPanicked {
                    device,
                    level: ctx.level,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
        failures
    })
}

fn collect_failures(level: usize, mut failures: Vec<EngineError>) -> Option<EngineError> {
    match failures.len() {
        0 => None,
        1 => failures.pop(),
        _ => Some(EngineError::MultipleDeviceFailures {
            level,
            failures: failures.iter().map(ToString::to_string).collect(),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ── Worker ─────────────────────────────────────────────────────

/// Pops sub-matrices until the level's queue is empty.
fn drain_level(ctx: &LevelContext<'_>, selector: &mut Selector) -> Result<(), EngineError> {
    let device = selector.device().clone();
    let mut count = 0usize;
    while let Some(sub_matrix) = ctx.queue.pop() {
        process_sub_matrix(ctx, selector, &device, &sub_matrix)?;
        count += 1;
    }
    tracing::debug!("{}: level {} drained, {count} sub-matrices", device.id, ctx.level);
    Ok(())
}

/// Tries flavours on one sub-matrix until one succeeds or none is left.
fn process_sub_matrix(
    ctx: &LevelContext<'_>,
    selector: &mut Selector,
    device: &Device,
    sub_matrix: &SubMatrix,
) -> Result<(), EngineError> {
    let mut input = Payload::new();
    ctx.hooks.extend_sub_matrix(device, sub_matrix, &mut input);

    let mut failed = Vec::new();
    while let Some(index) = selector.next_flavour(sub_matrix, &failed) {
        match selector.process(index, sub_matrix, &input) {
            Ok(processed) => {
                let phases = processed.runtime.resolve(ctx.use_profiling_events_time);
                ctx.runtimes.lock().record_processed(
                    sub_matrix,
                    phases,
                    device.id,
                    selector.flavour_name(index),
                )?;
                ctx.hooks
                    .update_global_data_structures(device, sub_matrix, &processed.output);
                selector.on_success(index, &phases);
                return Ok(());
            }
            Err(FlavourError::Compute(e)) => {
                tracing::debug!(
                    "{}: flavour '{}' failed on {sub_matrix}: {e}",
                    device.id,
                    selector.flavour_name(index)
                );
                selector.on_failure(index);
                failed.push(index);
            }
            Err(FlavourError::Device { detail }) => {
                selector.on_failure(index);
                ctx.runtimes
                    .lock()
                    .record_unprocessed(sub_matrix, Some(device.id))?;
                return Err(EngineError::DeviceFailure {
                    device: device.name.clone(),
                    level: ctx.level,
                    detail,
                });
            }
        }
    }

    tracing::warn!(
        "{}: no flavour could process {sub_matrix} after {} attempt(s); recorded as unprocessed",
        device.id,
        failed.len()
    );
    ctx.runtimes
        .lock()
        .record_unprocessed(sub_matrix, Some(device.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flavour::{
        ComputeError, DeviceKind, Flavour, PhaseTimes, Processed, Runtime, SelectorConfig,
    };

    struct Fixed {
        fail_on: Option<(usize, usize)>,
    }

    impl Flavour for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn process(&self, sm: &SubMatrix, _: &Payload) -> Result<Processed, FlavourError> {
            if self.fail_on == Some((sm.offset_x(), sm.offset_y())) {
                return Err(ComputeError::Kernel("boom".into()).into());
            }
            Ok(Processed {
                runtime: Runtime::from_wall_clock(PhaseTimes::from_execute(Duration::from_micros(1))),
                output: Payload::new(),
            })
        }
    }

    fn config(devices: usize) -> EngineConfig {
        EngineConfig {
            matrix_width: 20,
            matrix_height: 20,
            edge_length: 10,
            devices: (0..devices)
                .map(|i| Device::new(i, format!("cpu{i}"), DeviceKind::Cpu))
                .collect(),
            ..Default::default()
        }
    }

    fn fixed(fail_on: Option<(usize, usize)>) -> impl Fn(&Device) -> Vec<Box<dyn Flavour>> {
        move |_: &Device| vec![Box::new(Fixed { fail_on }) as Box<dyn Flavour>]
    }

    #[test]
    fn test_states() {
        let mut engine = ExecutionEngine::new(config(1), &fixed(None)).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        let report = engine.run().unwrap();
        assert_eq!(engine.state(), EngineState::Done);
        assert_eq!(report.levels_completed, 3);
        assert_eq!(report.levels.len(), 3);
        assert_eq!(report.num_processed, 4);
    }

    #[test]
    fn test_run_twice_rejected() {
        let mut engine = ExecutionEngine::new(config(1), &fixed(None)).unwrap();
        engine.run().unwrap();
        assert!(matches!(engine.run(), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn test_unprocessed_sentinel() {
        let mut engine = ExecutionEngine::new(config(1), &fixed(Some((10, 10)))).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.num_unprocessed, 1);
        let rt = engine.matrix_runtimes();
        assert!(rt.entry(1, 1).unwrap().phases.is_zero());
        assert!(rt.is_complete());
    }

    #[test]
    fn test_selector_error_surfaces_in_new() {
        let empty = |_: &Device| Vec::<Box<dyn Flavour>>::new();
        let err = ExecutionEngine::new(config(1), &empty).unwrap_err();
        assert!(matches!(err, EngineError::SelectorError(_)));

        let mut bad = config(1);
        bad.selector = SelectorConfig::EpsilonGreedy {
            explore: 1,
            epsilon: 2.0,
        };
        assert!(matches!(
            ExecutionEngine::new(bad, &fixed(None)),
            Err(EngineError::SelectorError(_))
        ));
    }

    #[test]
    fn test_collect_failures() {
        assert!(collect_failures(0, Vec::new()).is_none());
        let one = collect_failures(2, vec![EngineError::InvalidState("x".into())]).unwrap();
        assert!(matches!(one, EngineError::InvalidState(_)));
        let many = collect_failures(
            3,
            vec![
                EngineError::InvalidState("a".into()),
                EngineError::InvalidState("b".into()),
            ],
        )
        .unwrap();
        assert_eq!(many.level(), Some(3));
        assert!(many.to_string().starts_with("2 devices failed at level 3"));
    }

    #[test]
    fn test_panic_message() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_report_summary() {
        let mut engine = ExecutionEngine::new(config(2), &fixed(None)).unwrap();
        let report = engine.run().unwrap();
        let s = report.summary();
        assert!(s.contains("4 sub-matrices"));
        assert!(s.contains("cpu0"));
        assert!(s.contains("cpu1"));
        let processed: u64 = report.devices.iter().map(|d| d.processed).sum();
        assert_eq!(processed, 4);
    }
}
