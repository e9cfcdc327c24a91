//! Frame stepper throughput benchmarks: trials per second.
//!
//! Run with: `cargo bench --bench simulator`
//! Results show mean time per trial for bare and skill-heavy loadouts.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use furlong::race::course::CourseDescriptor;
use furlong::race::profile::CompetitorProfile;
use furlong::race::skills::SkillCatalog;
use furlong::race::stepper::{run_trial, RaceConfig};

fn loaded_profile() -> CompetitorProfile {
    CompetitorProfile {
        skills: vec![
            "straightaway-adept".to_string(),
            "corner-adept".to_string(),
            "deep-breaths".to_string(),
            "final-push".to_string(),
            "pace-strategist".to_string(),
            "focus".to_string(),
        ],
        ..CompetitorProfile::default()
    }
}

fn bench_simulator(c: &mut Criterion) {
    let catalog = SkillCatalog::builtin();

    let mut group = c.benchmark_group("simulator");
    group.sample_size(100);
    group.throughput(Throughput::Elements(1));

    // Short dirt course, no skills - the cheapest trial
    let bare = RaceConfig::new(
        CompetitorProfile::default(),
        CourseDescriptor::sample_dirt_1400(),
    );
    let mut seed = 0u64;
    group.bench_function("trial_dirt_1400_bare", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_trial(&bare, &catalog, seed, false))
        });
    });

    // Middle-distance turf with a full skill loadout
    let loaded = RaceConfig::new(loaded_profile(), CourseDescriptor::sample_turf_2000());
    let mut seed = 0u64;
    group.bench_function("trial_turf_2000_loaded", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_trial(&loaded, &catalog, seed, false))
        });
    });

    // Same, with the full frame trace recorded
    let mut seed = 0u64;
    group.bench_function("trial_turf_2000_traced", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_trial(&loaded, &catalog, seed, true))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_simulator);
criterion_main!(benches);
