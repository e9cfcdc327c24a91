//! Compare sequential vs parallel Monte Carlo run times.
//!
//! Run with: `cargo bench --bench monte_carlo_parallel`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use furlong::race::course::CourseDescriptor;
use furlong::race::profile::CompetitorProfile;
use furlong::race::skills::SkillCatalog;
use furlong::race::stepper::RaceConfig;
use furlong::sim::monte_carlo::{run_monte_carlo, CancelToken, SimulationOptions};

fn bench_monte_carlo_sequential_vs_parallel(c: &mut Criterion) {
    let config = RaceConfig::new(
        CompetitorProfile {
            skills: vec!["corner-adept".to_string(), "deep-breaths".to_string()],
            ..CompetitorProfile::default()
        },
        CourseDescriptor::sample_turf_2000(),
    );
    let catalog = SkillCatalog::builtin();
    let trials = 2000i64;

    let mut group = c.benchmark_group("monte_carlo");
    group.sample_size(20);
    group.measurement_time(std::time::Duration::from_secs(10));

    group.bench_function("sequential", |b| {
        let options = SimulationOptions {
            trials,
            seed: Some(42),
            threads: 1,
            record_representative: false,
        };
        b.iter(|| {
            black_box(run_monte_carlo(
                &config,
                &catalog,
                &options,
                None,
                &CancelToken::new(),
            ))
        });
    });

    group.bench_function("parallel", |b| {
        let options = SimulationOptions {
            trials,
            seed: Some(42),
            threads: 0,
            record_representative: false,
        };
        b.iter(|| {
            black_box(run_monte_carlo(
                &config,
                &catalog,
                &options,
                None,
                &CancelToken::new(),
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_monte_carlo_sequential_vs_parallel);
criterion_main!(benches);
