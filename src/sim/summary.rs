//! Reduction of trial results into aggregate statistics. The reduction is
//! commutative: only per-trial values are folded, never order-dependent state.

use serde::Serialize;

use crate::race::skills::{SkillCatalog, SkillIndex};
use crate::race::state::TrialResult;

/// Time and stamina-margin statistics over one bucket of trials.
/// Empty buckets keep count 0 and NaN statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryEntry {
    pub count: usize,
    pub average_time: f64,
    pub best_time: f64,
    pub worst_time: f64,
    pub average_margin: f64,
    pub best_margin: f64,
    pub worst_margin: f64,
}

impl SummaryEntry {
    pub fn from_results<'a>(results: impl Iterator<Item = &'a TrialResult>) -> Self {
        let mut count = 0usize;
        let mut time_sum = 0.0;
        let mut margin_sum = 0.0;
        let mut best_time = f64::INFINITY;
        let mut worst_time = f64::NEG_INFINITY;
        let mut best_margin = f64::NEG_INFINITY;
        let mut worst_margin = f64::INFINITY;
        for result in results {
            count += 1;
            time_sum += result.finish_time;
            margin_sum += result.stamina_margin;
            best_time = best_time.min(result.finish_time);
            worst_time = worst_time.max(result.finish_time);
            best_margin = best_margin.max(result.stamina_margin);
            worst_margin = worst_margin.min(result.stamina_margin);
        }
        if count == 0 {
            return Self {
                count: 0,
                average_time: f64::NAN,
                best_time: f64::NAN,
                worst_time: f64::NAN,
                average_margin: f64::NAN,
                best_margin: f64::NAN,
                worst_margin: f64::NAN,
            };
        }
        Self {
            count,
            average_time: time_sum / count as f64,
            best_time,
            worst_time,
            average_margin: margin_sum / count as f64,
            best_margin,
            worst_margin,
        }
    }
}

/// Per-skill activation statistics across all trials.
#[derive(Debug, Clone, Serialize)]
pub struct SkillSummary {
    pub id: String,
    pub name: String,
    /// Fraction of trials where the skill triggered at least once.
    pub trigger_rate: f64,
    /// Fraction of trials where it triggered two or more times.
    pub double_trigger_rate: f64,
    pub average_trigger_frame: f64,
    pub average_trigger_position: f64,
    /// Share of first triggers per phase, over triggering trials.
    pub phase_rates: [f64; 4],
    /// Fraction of triggers that could not benefit the runner.
    pub invalid_rate: f64,
    /// Fraction of trials where the effect was still operating when the last
    /// spurt began.
    pub spurt_connection_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub trials: usize,
    pub all: SummaryEntry,
    pub max_spurt: SummaryEntry,
    pub no_max_spurt: SummaryEntry,
    pub max_spurt_rate: f64,
    pub stamina_survival_rate: f64,
    pub bad_start_rate: f64,
    pub temptation_rate: f64,
    pub position_competition_rate: f64,
    pub stamina_keep_rate: f64,
    pub secure_lead_rate: f64,
    pub compete_fight_rate: f64,
    pub skills: Vec<SkillSummary>,
}

fn rate(hits: usize, total: usize) -> f64 {
    hits as f64 / total as f64
}

/// Fold trial results into the aggregate summary. `equipped` selects which
/// catalog skills get a per-skill block.
pub fn summarize(
    results: &[TrialResult],
    catalog: &SkillCatalog,
    equipped: &[SkillIndex],
) -> AggregateSummary {
    let trials = results.len();
    let all = SummaryEntry::from_results(results.iter());
    let max_spurt = SummaryEntry::from_results(results.iter().filter(|r| r.max_spurt));
    let no_max_spurt = SummaryEntry::from_results(results.iter().filter(|r| !r.max_spurt));

    let skills = equipped
        .iter()
        .map(|&index| {
            let definition = catalog.get(index);
            let mut triggered_trials = 0usize;
            let mut double_trials = 0usize;
            let mut connected_trials = 0usize;
            let mut frame_sum = 0.0;
            let mut position_sum = 0.0;
            let mut phase_counts = [0usize; 4];
            let mut trigger_total = 0u64;
            let mut invalid_total = 0u64;
            for result in results {
                let tracker = &result.skill_timing[index];
                if tracker.trigger_count == 0 {
                    continue;
                }
                triggered_trials += 1;
                if tracker.trigger_count >= 2 {
                    double_trials += 1;
                }
                if tracker.spurt_connected {
                    connected_trials += 1;
                }
                frame_sum += tracker.first_frame.unwrap_or(0) as f64;
                position_sum += tracker.first_position.unwrap_or(0.0);
                let first_phase = tracker
                    .phase_counts
                    .iter()
                    .position(|&c| c > 0)
                    .unwrap_or(0);
                phase_counts[first_phase] += 1;
                trigger_total += tracker.trigger_count as u64;
                invalid_total += tracker.invalid_count as u64;
            }
            let mut phase_rates = [f64::NAN; 4];
            if triggered_trials > 0 {
                for (slot, &count) in phase_rates.iter_mut().zip(phase_counts.iter()) {
                    *slot = rate(count, triggered_trials);
                }
            }
            SkillSummary {
                id: definition.id.clone(),
                name: definition.name.clone(),
                trigger_rate: rate(triggered_trials, trials),
                double_trigger_rate: rate(double_trials, trials),
                average_trigger_frame: frame_sum / triggered_trials as f64,
                average_trigger_position: position_sum / triggered_trials as f64,
                phase_rates,
                invalid_rate: if trigger_total == 0 {
                    f64::NAN
                } else {
                    invalid_total as f64 / trigger_total as f64
                },
                spurt_connection_rate: rate(connected_trials, trials),
            }
        })
        .collect();

    AggregateSummary {
        trials,
        all,
        max_spurt,
        no_max_spurt,
        max_spurt_rate: rate(results.iter().filter(|r| r.max_spurt).count(), trials),
        stamina_survival_rate: rate(
            results.iter().filter(|r| r.stamina_survived).count(),
            trials,
        ),
        bad_start_rate: rate(results.iter().filter(|r| r.bad_start).count(), trials),
        temptation_rate: rate(
            results.iter().filter(|r| r.temptation_occurred).count(),
            trials,
        ),
        position_competition_rate: rate(
            results.iter().filter(|r| r.position_competition).count(),
            trials,
        ),
        stamina_keep_rate: rate(results.iter().filter(|r| r.stamina_keep).count(), trials),
        secure_lead_rate: rate(results.iter().filter(|r| r.secure_lead).count(), trials),
        compete_fight_rate: rate(results.iter().filter(|r| r.compete_fight).count(), trials),
        skills,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::state::SkillTimingTracker;

    fn result(time: f64, margin: f64, max_spurt: bool, trackers: usize) -> TrialResult {
        TrialResult {
            finish_time: time,
            stamina_margin: margin,
            max_spurt,
            stamina_survived: margin > 0.0,
            depletion_position: None,
            bad_start: false,
            temptation_occurred: false,
            position_competition: false,
            stamina_keep: false,
            secure_lead: false,
            compete_fight: false,
            stamina_limit_break: false,
            conserve_power: false,
            phase_change_frames: [0; 3],
            triggered: Vec::new(),
            skill_timing: vec![SkillTimingTracker::default(); trackers],
        }
    }

    #[test]
    fn empty_bucket_has_zero_count_and_nan_stats() {
        let catalog = SkillCatalog::builtin();
        let results = vec![result(120.0, 50.0, true, catalog.len())];
        let summary = summarize(&results, &catalog, &[]);
        assert_eq!(summary.no_max_spurt.count, 0);
        assert!(summary.no_max_spurt.average_time.is_nan());
        assert_eq!(summary.max_spurt.count, 1);
        assert_eq!(summary.max_spurt_rate, 1.0);
    }

    #[test]
    fn summary_is_permutation_invariant() {
        let catalog = SkillCatalog::builtin();
        let a = result(118.0, 60.0, true, catalog.len());
        let b = result(121.0, -5.0, false, catalog.len());
        let c = result(119.5, 20.0, true, catalog.len());
        let forward = summarize(&[a.clone(), b.clone(), c.clone()], &catalog, &[]);
        let reversed = summarize(&[c, b, a], &catalog, &[]);
        assert_eq!(forward.all.average_time, reversed.all.average_time);
        assert_eq!(forward.all.best_time, reversed.all.best_time);
        assert_eq!(forward.stamina_survival_rate, reversed.stamina_survival_rate);
    }

    #[test]
    fn skill_summary_counts_triggers() {
        let catalog = SkillCatalog::builtin();
        let index = catalog.index_of("deep-breaths").unwrap();
        let mut with_trigger = result(120.0, 10.0, false, catalog.len());
        with_trigger.skill_timing[index].record(300, 1400.0, 2, false);
        with_trigger.skill_timing[index].record(600, 1800.0, 3, true);
        let without = result(121.0, 12.0, false, catalog.len());
        let summary = summarize(&[with_trigger, without], &catalog, &[index]);
        let skill = &summary.skills[0];
        assert_eq!(skill.trigger_rate, 0.5);
        assert_eq!(skill.double_trigger_rate, 0.5);
        assert_eq!(skill.invalid_rate, 0.5);
        assert_eq!(skill.phase_rates[2], 1.0);
        assert_eq!(skill.average_trigger_frame, 300.0);
    }
}
