//! Monte Carlo orchestration: many independent trials over a bounded worker
//! pool, with progress reporting, cooperative cancellation, and a gate that
//! arbitrates concurrent run requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use serde::Serialize;

use crate::parallel::{batch_ranges, checkpoint_batches, WorkerPool};
use crate::race::rng::{entropy_seed, trial_seed};
use crate::race::skills::SkillCatalog;
use crate::race::state::{FrameRecord, TrialResult};
use crate::race::stepper::{run_trial, RaceConfig};
use crate::sim::summary::{summarize, AggregateSummary};

/// Trials per batch between cancellation/progress checkpoints.
const TRIALS_PER_BATCH: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    /// Trial count; zero or negative is a no-op.
    pub trials: i64,
    /// Base seed; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Worker threads; 0 uses all cores.
    pub threads: usize,
    /// Keep the frame trace of the representative trial (index 0).
    pub record_representative: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            trials: 1000,
            seed: None,
            threads: 0,
            record_representative: true,
        }
    }
}

/// Progress snapshot pushed between batches. Consumers that fall behind lose
/// intermediate snapshots, never the run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Shared cancellation flag checked between batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub summary: AggregateSummary,
    /// Frame trace of trial index 0, when requested.
    pub representative: Option<Vec<FrameRecord>>,
    pub seed: u64,
    #[serde(skip)]
    pub results: Vec<TrialResult>,
}

/// Run the full simulation. Returns `None` for a non-positive trial count or
/// when cancelled mid-flight; cancellation discards all partial results.
pub fn run_monte_carlo(
    config: &RaceConfig,
    catalog: &SkillCatalog,
    options: &SimulationOptions,
    progress: Option<&SyncSender<Progress>>,
    cancel: &CancelToken,
) -> Option<SimulationOutput> {
    if options.trials <= 0 {
        return None;
    }
    let total = options.trials as usize;
    let base_seed = options.seed.unwrap_or_else(entropy_seed);
    let pool = WorkerPool::with_workers(options.threads);
    let batches = checkpoint_batches(total, TRIALS_PER_BATCH, options.threads);

    let mut results: Vec<TrialResult> = Vec::with_capacity(total);
    let mut representative: Option<Vec<FrameRecord>> = None;

    for (start, end) in batch_ranges(total, batches) {
        if cancel.is_cancelled() {
            return None;
        }
        let record = options.record_representative;
        let mut batch: Vec<(usize, TrialResult, Option<Vec<FrameRecord>>)> = pool.install(|| {
            (start..end)
                .into_par_iter()
                .map(|index| {
                    let output = run_trial(
                        config,
                        catalog,
                        trial_seed(base_seed, index as u64),
                        record && index == 0,
                    );
                    (index, output.result, output.frames)
                })
                .collect()
        });
        batch.sort_by_key(|(index, _, _)| *index);
        for (_, result, frames) in batch {
            if let Some(frames) = frames {
                representative = Some(frames);
            }
            results.push(result);
        }
        if let Some(sender) = progress {
            // A full channel just drops the snapshot.
            let _ = sender.try_send(Progress {
                completed: results.len(),
                total,
            });
        }
    }
    if cancel.is_cancelled() {
        return None;
    }

    let equipped = catalog.resolve(&config.profile.skills);
    let summary = summarize(&results, catalog, &equipped);
    Some(SimulationOutput {
        summary,
        representative,
        seed: base_seed,
        results,
    })
}

/// What to do when a run request arrives while another run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnRunning {
    /// Drop the new request.
    Ignore,
    /// Cancel the in-flight run and proceed with the new one.
    CancelAndRun,
}

/// Arbiter for concurrent run requests over one logical simulation slot.
#[derive(Debug, Default)]
pub struct SimulationGate {
    active: Mutex<Option<CancelToken>>,
}

impl SimulationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. Returns the cancel token the new run must poll, or
    /// `None` when an active run holds the slot under `Ignore`.
    pub fn try_begin(&self, policy: OnRunning) -> Option<CancelToken> {
        let mut active = self.active.lock().unwrap();
        if let Some(running) = active.as_ref() {
            match policy {
                OnRunning::Ignore => return None,
                OnRunning::CancelAndRun => running.cancel(),
            }
        }
        let token = CancelToken::new();
        *active = Some(token.clone());
        Some(token)
    }

    /// Release the slot if `token` still owns it. A superseded run's release
    /// leaves the newer owner in place.
    pub fn finish(&self, token: &CancelToken) {
        let mut active = self.active.lock().unwrap();
        if let Some(running) = active.as_ref() {
            if Arc::ptr_eq(&running.flag, &token.flag) {
                *active = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::course::CourseDescriptor;
    use crate::race::profile::CompetitorProfile;

    fn config() -> RaceConfig {
        RaceConfig::new(
            CompetitorProfile::default(),
            CourseDescriptor::sample_dirt_1400(),
        )
    }

    fn options(trials: i64) -> SimulationOptions {
        SimulationOptions {
            trials,
            seed: Some(99),
            threads: 2,
            record_representative: false,
        }
    }

    #[test]
    fn non_positive_trials_is_a_noop() {
        let catalog = SkillCatalog::builtin();
        let cancel = CancelToken::new();
        assert!(run_monte_carlo(&config(), &catalog, &options(0), None, &cancel).is_none());
        assert!(run_monte_carlo(&config(), &catalog, &options(-5), None, &cancel).is_none());
    }

    #[test]
    fn pre_cancelled_run_returns_none() {
        let catalog = SkillCatalog::builtin();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(run_monte_carlo(&config(), &catalog, &options(50), None, &cancel).is_none());
    }

    #[test]
    fn gate_ignores_duplicate_and_supersedes_on_request() {
        let gate = SimulationGate::new();
        let first = gate.try_begin(OnRunning::Ignore).unwrap();
        assert!(gate.try_begin(OnRunning::Ignore).is_none());

        let second = gate.try_begin(OnRunning::CancelAndRun).unwrap();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        // The superseded run finishing must not release the new owner.
        gate.finish(&first);
        assert!(gate.try_begin(OnRunning::Ignore).is_none());
        gate.finish(&second);
        assert!(gate.try_begin(OnRunning::Ignore).is_some());
    }
}
