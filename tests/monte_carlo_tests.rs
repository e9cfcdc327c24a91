use std::sync::mpsc::sync_channel;

use furlong::race::course::CourseDescriptor;
use furlong::race::profile::CompetitorProfile;
use furlong::race::skills::SkillCatalog;
use furlong::race::stepper::RaceConfig;
use furlong::sim::contribution::{analyze_contribution, ContributionMode};
use furlong::sim::monte_carlo::{run_monte_carlo, CancelToken, SimulationOptions};

fn config_with_skills(skills: &[&str]) -> RaceConfig {
    RaceConfig::new(
        CompetitorProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..CompetitorProfile::default()
        },
        CourseDescriptor::sample_turf_2000(),
    )
}

fn options(trials: i64, seed: u64) -> SimulationOptions {
    SimulationOptions {
        trials,
        seed: Some(seed),
        threads: 4,
        record_representative: false,
    }
}

#[test]
fn every_requested_trial_is_accounted_for() {
    let config = config_with_skills(&["corner-adept", "deep-breaths"]);
    let catalog = SkillCatalog::builtin();
    let output = run_monte_carlo(
        &config,
        &catalog,
        &options(100, 7),
        None,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(output.summary.trials, 100);
    assert_eq!(output.results.len(), 100);
    assert_eq!(output.seed, 7);
    assert!(output.summary.all.average_time.is_finite());
    assert!(output.summary.all.best_time <= output.summary.all.worst_time);
}

#[test]
fn same_seed_gives_identical_summaries_across_runs() {
    let config = config_with_skills(&["straightaway-adept"]);
    let catalog = SkillCatalog::builtin();
    let a = run_monte_carlo(&config, &catalog, &options(64, 11), None, &CancelToken::new())
        .unwrap();
    let b = run_monte_carlo(&config, &catalog, &options(64, 11), None, &CancelToken::new())
        .unwrap();

    assert_eq!(a.summary.all.average_time, b.summary.all.average_time);
    assert_eq!(a.summary.all.best_time, b.summary.all.best_time);
    assert_eq!(a.summary.max_spurt_rate, b.summary.max_spurt_rate);
    for (x, y) in a.results.iter().zip(b.results.iter()) {
        assert_eq!(x.finish_time, y.finish_time);
    }
}

#[test]
fn thread_count_does_not_change_the_outcome() {
    let config = config_with_skills(&[]);
    let catalog = SkillCatalog::builtin();
    let serial = run_monte_carlo(
        &config,
        &catalog,
        &SimulationOptions {
            threads: 1,
            ..options(80, 3)
        },
        None,
        &CancelToken::new(),
    )
    .unwrap();
    let parallel = run_monte_carlo(
        &config,
        &catalog,
        &SimulationOptions {
            threads: 4,
            ..options(80, 3)
        },
        None,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(
        serial.summary.all.average_time,
        parallel.summary.all.average_time
    );
}

#[test]
fn representative_trace_comes_from_trial_zero() {
    let config = config_with_skills(&[]);
    let catalog = SkillCatalog::builtin();
    let output = run_monte_carlo(
        &config,
        &catalog,
        &SimulationOptions {
            record_representative: true,
            ..options(10, 5)
        },
        None,
        &CancelToken::new(),
    )
    .unwrap();

    let frames = output.representative.unwrap();
    let finish_frame = frames.last().unwrap().frame + 1;
    let first = &output.results[0];
    assert!((finish_frame as f64 / 15.0 - first.finish_time).abs() < 0.2);
}

#[test]
fn cancellation_discards_partial_results() {
    let config = config_with_skills(&[]);
    let catalog = SkillCatalog::builtin();
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(run_monte_carlo(&config, &catalog, &options(50, 1), None, &cancel).is_none());
}

#[test]
fn cancellation_mid_flight_discards_partial_results() {
    let config = config_with_skills(&[]);
    let catalog = SkillCatalog::builtin();
    let cancel = CancelToken::new();
    let (sender, receiver) = sync_channel(64);

    // Cancel as soon as the first batch reports progress, while later
    // batches are still pending.
    let canceller = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            let first = receiver.recv().expect("at least one snapshot");
            cancel.cancel();
            first
        })
    };

    let output = run_monte_carlo(
        &config,
        &catalog,
        &SimulationOptions {
            threads: 1,
            ..options(4000, 17)
        },
        Some(&sender),
        &cancel,
    );
    drop(sender);

    let first = canceller.join().expect("canceller thread");
    assert!(first.completed < first.total);
    assert!(output.is_none());
}

#[test]
fn progress_snapshots_are_monotone() {
    let config = config_with_skills(&[]);
    let catalog = SkillCatalog::builtin();
    let (sender, receiver) = sync_channel(1024);
    run_monte_carlo(
        &config,
        &catalog,
        &options(600, 21),
        Some(&sender),
        &CancelToken::new(),
    )
    .unwrap();
    drop(sender);

    let snapshots: Vec<_> = receiver.iter().collect();
    assert!(!snapshots.is_empty());
    let mut previous = 0;
    for snapshot in &snapshots {
        assert!(snapshot.completed > previous);
        assert!(snapshot.completed <= snapshot.total);
        assert_eq!(snapshot.total, 600);
        previous = snapshot.completed;
    }
    assert_eq!(snapshots.last().unwrap().completed, 600);
}

#[test]
fn contribution_covers_equipped_and_candidate_skills() {
    let config = config_with_skills(&["deep-breaths", "focus"]);
    let catalog = SkillCatalog::builtin();
    let table = analyze_contribution(&config, &catalog, &options(40, 13), &CancelToken::new())
        .unwrap();

    assert_eq!(table.trials, 40);
    assert!(table.baseline_average.is_finite());
    assert!(table.baseline_best <= table.baseline_worst);

    let removed: Vec<_> = table
        .entries
        .iter()
        .filter(|e| e.mode == ContributionMode::RemoveEach)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(removed, vec!["deep-breaths", "focus"]);

    let acquired: Vec<_> = table
        .entries
        .iter()
        .filter(|e| e.mode == ContributionMode::AcquireOne)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(acquired.len(), catalog.len() - 2);
    assert!(acquired.contains(&"swinging-maestro"));
    assert!(!acquired.contains(&"focus"));

    for entry in &table.entries {
        assert_eq!(entry.efficiency.len(), 6);
    }
}

#[test]
fn contribution_needs_a_minimum_sample() {
    let config = config_with_skills(&["focus"]);
    let catalog = SkillCatalog::builtin();
    assert!(
        analyze_contribution(&config, &catalog, &options(4, 13), &CancelToken::new()).is_none()
    );
}
