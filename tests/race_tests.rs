use furlong::race::coefficients::Style;
use furlong::race::course::CourseDescriptor;
use furlong::race::params::RaceParameters;
use furlong::race::profile::CompetitorProfile;
use furlong::race::skills::{PassiveBonus, SkillCatalog};
use furlong::race::stepper::{run_trial, RaceConfig};

fn derive(profile: &CompetitorProfile, course: &CourseDescriptor) -> RaceParameters {
    RaceParameters::derive(profile, course, profile.style, &PassiveBonus::default())
}

#[test]
fn phase_boundaries_split_the_course_in_sixths() {
    let course = CourseDescriptor::sample_turf_2000();
    let params = derive(&CompetitorProfile::default(), &course);

    assert!((params.phase1_start - 2000.0 / 6.0).abs() < 1e-9);
    assert!((params.phase2_start - 2000.0 * 2.0 / 3.0).abs() < 1e-9);
    assert!((params.phase3_start - 2000.0 * 5.0 / 6.0).abs() < 1e-9);

    assert_eq!(params.phase_at(0.0), 0);
    assert_eq!(params.phase_at(params.phase1_start), 1);
    assert_eq!(params.phase_at(params.phase2_start - 0.001), 1);
    assert_eq!(params.phase_at(params.phase2_start), 2);
    assert_eq!(params.phase_at(params.phase3_start), 3);
    assert_eq!(params.phase_at(2000.0), 3);
}

#[test]
fn stats_above_the_floor_count_at_half_weight() {
    let course = CourseDescriptor::sample_turf_2000();
    let at = |stamina: i32| {
        let profile = CompetitorProfile {
            stamina,
            ..CompetitorProfile::default()
        };
        derive(&profile, &course).sp_max
    };

    let below = at(1200) - at(1000);
    let above = at(1400) - at(1200);
    assert!(above > 0.0);
    assert!((above - below / 2.0).abs() < below * 0.05);
}

#[test]
fn heal_values_scale_against_stamina_capacity() {
    let course = CourseDescriptor::sample_turf_2000();
    let params = derive(&CompetitorProfile::default(), &course);

    assert!((params.heal_amount(10000.0) - params.sp_max).abs() < 1e-9);
    assert!((params.heal_amount(350.0) - params.sp_max * 0.035).abs() < 1e-9);
    assert_eq!(params.heal_amount(0.0), 0.0);
}

#[test]
fn great_escape_keeps_front_runner_base_tables() {
    let course = CourseDescriptor::sample_turf_2000();
    let profile = CompetitorProfile::default();
    let params = RaceParameters::derive(&profile, &course, Style::Oonige, &PassiveBonus::default());
    assert_eq!(params.basic_style, Style::Nige);
}

#[test]
fn same_seed_reproduces_the_full_trial() {
    let config = RaceConfig::new(
        CompetitorProfile {
            skills: vec!["corner-adept".to_string(), "deep-breaths".to_string()],
            ..CompetitorProfile::default()
        },
        CourseDescriptor::sample_turf_2000(),
    );
    let catalog = SkillCatalog::builtin();

    let a = run_trial(&config, &catalog, 1234, true);
    let b = run_trial(&config, &catalog, 1234, true);
    assert_eq!(a.result.finish_time, b.result.finish_time);
    assert_eq!(a.result.stamina_margin, b.result.stamina_margin);
    assert_eq!(a.result.phase_change_frames, b.result.phase_change_frames);
    assert_eq!(a.frames.map(|f| f.len()), b.frames.map(|f| f.len()));

    let c = run_trial(&config, &catalog, 1235, false);
    assert_ne!(a.result.finish_time, c.result.finish_time);
}

#[test]
fn positions_never_move_backwards() {
    let config = RaceConfig::new(
        CompetitorProfile::default(),
        CourseDescriptor::sample_turf_2000(),
    );
    let catalog = SkillCatalog::builtin();
    let frames = run_trial(&config, &catalog, 42, true).frames.unwrap();

    assert!(!frames.is_empty());
    for pair in frames.windows(2) {
        assert!(pair[1].position >= pair[0].position);
        assert!(pair[1].frame == pair[0].frame + 1);
    }
    let last = frames.last().unwrap();
    assert!(last.position >= 2000.0);
}

#[test]
fn depleted_runner_still_finishes_at_minimum_speed() {
    let config = RaceConfig::new(
        CompetitorProfile {
            stamina: 1,
            ..CompetitorProfile::default()
        },
        CourseDescriptor::sample_turf_2000(),
    );
    let catalog = SkillCatalog::builtin();
    let result = run_trial(&config, &catalog, 3, false).result;

    assert!(!result.stamina_survived);
    let depleted_at = result.depletion_position.unwrap();
    assert!(depleted_at > 0.0 && depleted_at < 2000.0);
    assert!(result.finish_time.is_finite());
}

#[test]
fn cooldown_spaces_repeat_triggers() {
    let config = RaceConfig::new(
        CompetitorProfile {
            skills: vec!["corner-adept".to_string()],
            ..CompetitorProfile::default()
        },
        CourseDescriptor::sample_turf_2000(),
    );
    let catalog = SkillCatalog::builtin();
    let params = derive(&config.profile, &config.course);
    // Ratio 2.0 over the per-kilometer base cooldown.
    let min_gap = (2.0 * params.cooldown_base_frames) as u32;

    for seed in 0..30 {
        let frames = run_trial(&config, &catalog, seed, true).frames.unwrap();
        let trigger_frames: Vec<u32> = frames
            .iter()
            .filter(|f| !f.triggered_skills.is_empty())
            .map(|f| f.frame)
            .collect();
        for pair in trigger_frames.windows(2) {
            assert!(
                pair[1] - pair[0] > min_gap,
                "seed {seed}: triggers at {} and {} violate the {min_gap} frame cooldown",
                pair[0],
                pair[1]
            );
        }
    }
}
