//! Skill contribution analysis: how much each skill is worth, measured by
//! rerunning the simulation with the loadout changed one skill at a time
//! under the same seeds.

use serde::Serialize;

use crate::race::skills::SkillCatalog;
use crate::race::stepper::RaceConfig;
use crate::sim::monte_carlo::{run_monte_carlo, CancelToken, SimulationOptions};

/// Discount tiers applied to the skill point cost when computing efficiency.
pub const EFFICIENCY_TIERS: [f64; 6] = [1.0, 0.9, 0.8, 0.7, 0.65, 0.6];

/// Contribution needs enough trials for the 20% tails to mean anything.
const MIN_TRIALS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionMode {
    /// Time lost when an equipped skill is removed.
    RemoveEach,
    /// Time gained when an unowned skill is added (upgrading over any
    /// equipped cheaper tier of the same group).
    AcquireOne,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionEntry {
    pub id: String,
    pub name: String,
    pub mode: ContributionMode,
    pub sp_cost: u32,
    /// Seconds of mean finish time attributable to the skill (positive is
    /// beneficial in both modes).
    pub average_diff: f64,
    /// Same, over the best-20% tail of trials.
    pub best_diff: f64,
    /// Same, over the worst-20% tail of trials.
    pub worst_diff: f64,
    /// `diff * 100 / (cost * tier)` for each discount tier; NaN for zero cost.
    pub efficiency: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionTable {
    pub trials: usize,
    pub baseline_average: f64,
    pub baseline_best: f64,
    pub baseline_worst: f64,
    pub entries: Vec<ContributionEntry>,
}

/// Mean finish times: (all, best 20%, worst 20%).
fn tail_means(times: &mut Vec<f64>) -> (f64, f64, f64) {
    times.sort_by(|a, b| a.total_cmp(b));
    let n = times.len();
    let tail = (n / 5).max(1);
    let mean = |slice: &[f64]| slice.iter().sum::<f64>() / slice.len() as f64;
    (mean(times), mean(&times[..tail]), mean(&times[n - tail..]))
}

fn efficiency(diff: f64, cost: u32) -> Vec<f64> {
    EFFICIENCY_TIERS
        .iter()
        .map(|tier| {
            if cost == 0 {
                f64::NAN
            } else {
                diff * 100.0 / (cost as f64 * tier)
            }
        })
        .collect()
}

fn run_times(
    config: &RaceConfig,
    catalog: &SkillCatalog,
    options: &SimulationOptions,
    cancel: &CancelToken,
) -> Option<(f64, f64, f64)> {
    let output = run_monte_carlo(config, catalog, options, None, cancel)?;
    let mut times: Vec<f64> = output.results.iter().map(|r| r.finish_time).collect();
    Some(tail_means(&mut times))
}

/// Run both contribution modes. Every variant reuses the baseline's seed so
/// the comparison shares random streams. Returns `None` for too few trials
/// or when cancelled.
pub fn analyze_contribution(
    config: &RaceConfig,
    catalog: &SkillCatalog,
    options: &SimulationOptions,
    cancel: &CancelToken,
) -> Option<ContributionTable> {
    if options.trials < MIN_TRIALS {
        return None;
    }
    let options = SimulationOptions {
        seed: Some(options.seed.unwrap_or_else(crate::race::rng::entropy_seed)),
        record_representative: false,
        ..*options
    };

    let (base_mean, base_best, base_worst) = run_times(config, catalog, &options, cancel)?;
    let mut entries = Vec::new();

    // Remove-each over the equipped loadout.
    for skill_id in &config.profile.skills {
        if cancel.is_cancelled() {
            return None;
        }
        let Some(index) = catalog.index_of(skill_id) else {
            continue;
        };
        let definition = catalog.get(index);
        let mut variant = config.clone();
        variant.profile.skills.retain(|id| id != skill_id);
        let (mean, best, worst) = run_times(&variant, catalog, &options, cancel)?;
        let diff = mean - base_mean;
        entries.push(ContributionEntry {
            id: definition.id.clone(),
            name: definition.name.clone(),
            mode: ContributionMode::RemoveEach,
            sp_cost: definition.sp_cost,
            average_diff: diff,
            best_diff: best - base_best,
            worst_diff: worst - base_worst,
            efficiency: efficiency(diff, definition.sp_cost),
        });
    }

    // Acquire-one over the rest of the catalog.
    for (_, definition) in catalog.iter() {
        if config.profile.skills.iter().any(|id| id == &definition.id) {
            continue;
        }
        if cancel.is_cancelled() {
            return None;
        }
        let mut variant = config.clone();
        // An upgrade replaces any equipped cheaper tier of the same group.
        for &tier in &catalog.cheaper_tiers(definition) {
            let tier_id = &catalog.get(tier).id;
            variant.profile.skills.retain(|id| id != tier_id);
        }
        variant.profile.skills.push(definition.id.clone());
        let (mean, best, worst) = run_times(&variant, catalog, &options, cancel)?;
        let diff = base_mean - mean;
        entries.push(ContributionEntry {
            id: definition.id.clone(),
            name: definition.name.clone(),
            mode: ContributionMode::AcquireOne,
            sp_cost: definition.sp_cost,
            average_diff: diff,
            best_diff: base_best - best,
            worst_diff: base_worst - worst,
            efficiency: efficiency(diff, definition.sp_cost),
        });
    }

    Some(ContributionTable {
        trials: options.trials as usize,
        baseline_average: base_mean,
        baseline_best: base_best,
        baseline_worst: base_worst,
        entries,
    })
}
