//! Derived race parameters. Everything here is computed once per
//! (profile, course, passive bonus) combination before the trial loop and
//! never mutated afterwards, so trials can share one instance by reference.

use serde::Serialize;

use crate::race::coefficients::{
    exceed_status, sp_consumption_coef, surface_power_modifier, surface_speed_modifier,
    DistanceCategory, Style, CONSERVE_POWER_BASE_SECONDS, FRAMES_PER_SECOND,
};
use crate::race::course::CourseDescriptor;
use crate::race::profile::CompetitorProfile;
use crate::race::skills::PassiveBonus;

fn position_competition_speed_coef(style: Style) -> f64 {
    match style {
        Style::Nige | Style::Oonige => 1.0,
        Style::Sen => 1.0,
        Style::Sasi => 0.9,
        Style::Oi => 0.9,
    }
}

fn position_competition_stamina_coef(style: Style) -> f64 {
    match style {
        Style::Nige | Style::Oonige => 0.8,
        Style::Sen => 1.0,
        Style::Sasi => 1.0,
        Style::Oi => 0.9,
    }
}

fn secure_lead_speed_coef(style: Style) -> f64 {
    match style {
        Style::Nige | Style::Oonige => 1.0,
        Style::Sen => 0.9,
        Style::Sasi => 0.8,
        Style::Oi => 0.0,
    }
}

fn secure_lead_stamina_coef(style: Style) -> f64 {
    match style {
        Style::Nige | Style::Oonige => 1.0,
        Style::Sen => 0.9,
        Style::Sasi => 0.8,
        Style::Oi => 0.0,
    }
}

fn conserve_power_acceleration_coef(style: Style, category: DistanceCategory) -> f64 {
    let style_coef = match style {
        Style::Nige | Style::Oonige => 1.0,
        Style::Sen => 1.0,
        Style::Sasi => 0.9,
        Style::Oi => 0.9,
    };
    let category_coef = match category {
        DistanceCategory::Sprint => 1.2,
        DistanceCategory::Mile => 1.0,
        DistanceCategory::Middle => 1.0,
        DistanceCategory::Long => 0.9,
    };
    style_coef * category_coef
}

/// All derive-once quantities used by the frame stepper.
#[derive(Debug, Clone, Serialize)]
pub struct RaceParameters {
    pub course_length: f64,
    pub distance_category_value: i32,
    pub style: Style,
    pub basic_style: Style,

    pub modified_speed: i32,
    pub modified_stamina: i32,
    pub modified_power: i32,
    pub modified_guts: i32,
    pub modified_wisdom: i32,

    pub base_speed: f64,
    pub sp_max: f64,
    pub spurt_sp_coef: f64,
    pub sp_ground_coef: f64,
    pub temptation_rate: f64,
    /// Chance, in percent, that an equipped skill joins the race at all.
    pub skill_activate_rate: f64,
    pub cooldown_base_frames: f64,
    /// Effect-duration scale: course length in kilometers.
    pub time_coef: f64,

    /// Phase target speeds. `v0` also bounds the start dash.
    pub v0: f64,
    pub v1: f64,
    pub v2: f64,
    pub v3: f64,
    pub min_speed: f64,
    pub max_spurt_speed: f64,
    /// Distance-aptitude speed term shared by `v3` and the phase 2+ base.
    pub distance_speed_term: f64,
    /// Guts term added to the phase 2+ base target speed.
    pub guts_spurt_term: f64,

    /// Phase accelerations. The start dash bonus is added by the stepper on
    /// top of `a1` while the dash lasts.
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,

    pub phase1_start: f64,
    pub phase2_start: f64,
    pub phase3_start: f64,

    /// Half-width of the per-section wisdom noise on target speed, as a
    /// fraction of base speed.
    pub section_noise_span: f64,

    pub lane_change_base_speed: f64,

    pub lead_competition_speed: f64,
    pub lead_competition_frames: f64,
    pub compete_fight_speed: f64,
    pub compete_fight_acceleration: f64,
    pub position_competition_speed: f64,
    pub position_competition_stamina_per_second: f64,
    pub secure_lead_speed: f64,
    pub secure_lead_stamina_per_second: f64,
    pub stamina_limit_break_speed: f64,
    pub conserve_power_acceleration: f64,
    pub conserve_power_frames: f64,

    pub position_keep_speed_up_rate: f64,
    pub position_keep_pace_up_rate: f64,
    pub position_keep_min_distance: f64,
    pub position_keep_max_distance: f64,
}

impl RaceParameters {
    pub fn derive(
        profile: &CompetitorProfile,
        course: &CourseDescriptor,
        style: Style,
        passive: &PassiveBonus,
    ) -> Self {
        let length = course.distance as f64;
        let cond = profile.motivation.coef();

        // Courses reward listed stats with a bonus that shrinks as the raw
        // stat grows, split evenly across the rewarded set.
        let mut reward_modifier = 1.0;
        if !course.rewarded_stats.is_empty() {
            let share = course.rewarded_stats.len() as f64;
            for &axis in &course.rewarded_stats {
                let raw = match axis {
                    1 => profile.speed,
                    2 => profile.stamina,
                    3 => profile.power,
                    4 => profile.guts,
                    5 => profile.wisdom,
                    _ => 0,
                } as f64
                    * cond;
                reward_modifier += match raw as i32 {
                    i32::MIN..=300 => 0.05,
                    301..=600 => 0.1,
                    601..=900 => 0.15,
                    _ => 0.2,
                } / share;
            }
        }

        let modified_speed = (exceed_status(profile.speed) as f64 * reward_modifier * cond) as i32
            + surface_speed_modifier(course.surface, course.condition)
            + passive.speed;
        let modified_stamina =
            (exceed_status(profile.stamina) as f64 * cond) as i32 + passive.stamina;
        let modified_power = (exceed_status(profile.power) as f64 * cond) as i32
            + surface_power_modifier(course.surface, course.condition)
            + passive.power;
        let modified_guts = (exceed_status(profile.guts) as f64 * cond) as i32 + passive.guts;
        let modified_wisdom = (exceed_status(profile.wisdom) as f64
            * cond
            * profile.style_fit.style_wisdom_coef()) as i32
            + passive.wisdom;

        let speed_f = modified_speed as f64;
        let power_f = modified_power.max(1) as f64;
        let guts_f = modified_guts.max(1) as f64;
        let wisdom_f = modified_wisdom.max(1) as f64;

        let base_speed = 20.0 - (length - 2000.0) / 1000.0;
        let distance_speed = profile.distance_fit.distance_speed_coef();
        let wisdom_correction = (wisdom_f * (wisdom_f / 10.0).log10()) / 550000.0 - 0.00325;

        let distance_speed_term = (speed_f / 500.0).sqrt() * distance_speed;
        let v0 = 0.85 * base_speed;
        let v1 = base_speed * (style.speed_coef(0) + wisdom_correction);
        let v2 = base_speed * (style.speed_coef(1) + wisdom_correction);
        let v3 = base_speed * (style.speed_coef(2) + wisdom_correction) + distance_speed_term;
        let min_speed = 0.85 * base_speed + 0.001 * (guts_f * 200.0).sqrt();
        let max_spurt_speed = (base_speed * (style.speed_coef(2) + 0.01)
            + (speed_f / 500.0).sqrt() * distance_speed)
            * 1.05
            + (500.0 * speed_f).sqrt() * distance_speed * 0.002
            + (450.0 * guts_f).powf(0.597) * 0.0001;

        let accel_base = 0.0006
            * (500.0 * power_f).sqrt()
            * profile.surface_fit.surface_accel_coef()
            * profile.distance_fit.distance_accel_coef();
        let a1 = accel_base * style.accel_coef(0);
        let a2 = if v2 < v1 {
            -0.8
        } else {
            accel_base * style.accel_coef(1)
        };
        let a3 = accel_base * style.accel_coef(2);

        let category = course.distance_category();
        let basic_style = if style == Style::Oonige {
            Style::Nige
        } else {
            style
        };

        // Conserve power and stamina limit break key off raw stats above the
        // exceed floor, before motivation scaling.
        let raw_power = profile.power + passive.power;
        let conserve_power_acceleration = if raw_power <= 1200 {
            0.0
        } else {
            ((raw_power - 1200) as f64 * 130.0).sqrt()
                * 0.001
                * conserve_power_acceleration_coef(basic_style, category)
        };
        let raw_stamina = profile.stamina + passive.stamina;
        let stamina_limit_break_speed = if raw_stamina <= 1200 {
            0.0
        } else {
            ((raw_stamina - 1200) as f64).sqrt() * 0.0085
        };

        let course_factor = 0.0008 * (length - 1000.0) + 1.0;
        let (position_keep_min_distance, position_keep_max_distance) = match basic_style {
            Style::Sen => (3.0, 5.0 * course_factor),
            Style::Sasi => (6.5 * course_factor, 7.0 * course_factor),
            Style::Oi => (7.5 * course_factor, 8.0 * course_factor),
            _ => (0.0, 0.0),
        };

        // Per-second stamina costs of the positioning modes scale with
        // distance in kilometers.
        let distance_km = length / 1000.0;

        Self {
            course_length: length,
            distance_category_value: category.condition_value(),
            style,
            basic_style,
            modified_speed,
            modified_stamina,
            modified_power,
            modified_guts,
            modified_wisdom,
            base_speed,
            sp_max: length + 0.8 * modified_stamina as f64 * style.sp_coef(),
            spurt_sp_coef: 1.0 + 200.0 / (600.0 * guts_f).sqrt(),
            sp_ground_coef: sp_consumption_coef(course.surface, course.condition),
            temptation_rate: (6.5 / (0.1 * wisdom_f + 1.0).log10()).powi(2)
                + passive.temptation_rate as f64,
            skill_activate_rate: (100.0 - 9000.0 / wisdom_f).max(20.0),
            cooldown_base_frames: length / 1000.0 * FRAMES_PER_SECOND,
            time_coef: length / 1000.0,
            v0,
            v1,
            v2,
            v3,
            min_speed,
            max_spurt_speed,
            distance_speed_term,
            guts_spurt_term: (450.0 * guts_f).powf(0.597) * 0.0001,
            a1,
            a2,
            a3,
            phase1_start: length / 6.0,
            phase2_start: length * 2.0 / 3.0,
            phase3_start: length * 5.0 / 6.0,
            section_noise_span: (wisdom_f * (wisdom_f / 10.0).log10()) / 550000.0,
            lane_change_base_speed: 0.02 * (0.3 + 0.001 * power_f),
            lead_competition_speed: (500.0 * guts_f).powf(0.6) * 0.0001,
            lead_competition_frames: (700.0 * guts_f).powf(0.5) * 0.012 * FRAMES_PER_SECOND,
            compete_fight_speed: (200.0 * guts_f).powf(0.708) * 0.0001,
            compete_fight_acceleration: (160.0 * guts_f).powf(0.59) * 0.0001,
            position_competition_speed: ((power_f / 1500.0).powf(0.5) * 2.0
                + (guts_f / 3000.0).powf(0.2))
                * 0.1
                * position_competition_speed_coef(style),
            position_competition_stamina_per_second: 20.0
                * position_competition_stamina_coef(style)
                * distance_km
                / 2.0,
            secure_lead_speed: (guts_f / 2000.0).powf(0.5) * 0.3 * secure_lead_speed_coef(style),
            secure_lead_stamina_per_second: 20.0
                * secure_lead_stamina_coef(style)
                * distance_km
                / 2.0,
            stamina_limit_break_speed,
            conserve_power_acceleration,
            conserve_power_frames: CONSERVE_POWER_BASE_SECONDS
                * FRAMES_PER_SECOND
                * category.conserve_power_time_coef(),
            position_keep_speed_up_rate: 0.2 * (wisdom_f * 0.1).log10(),
            position_keep_pace_up_rate: 0.15 * (wisdom_f * 0.1).log10(),
            position_keep_min_distance,
            position_keep_max_distance,
        }
    }

    /// Current phase (0..=3) at `position`.
    pub fn phase_at(&self, position: f64) -> usize {
        if position < self.phase1_start {
            0
        } else if position < self.phase2_start {
            1
        } else if position < self.phase3_start {
            2
        } else {
            3
        }
    }

    /// `[start, end)` bounds of a phase.
    pub fn phase_start_end(&self, phase: usize) -> (f64, f64) {
        match phase {
            0 => (0.0, self.phase1_start),
            1 => (self.phase1_start, self.phase2_start),
            2 => (self.phase2_start, self.phase3_start),
            _ => (self.phase3_start, self.course_length),
        }
    }

    /// Section index 0..=23 at `position` (24 equal sections).
    pub fn section_at(&self, position: f64) -> usize {
        ((position / self.course_length * 24.0) as usize).min(23)
    }

    pub fn phase_acceleration(&self, phase: usize) -> f64 {
        match phase {
            0 => self.a1,
            1 => self.a2,
            _ => self.a3,
        }
    }

    /// Phase deceleration when current speed exceeds target.
    pub fn phase_deceleration(&self, phase: usize) -> f64 {
        match phase {
            0 => -1.2,
            1 => -0.8,
            _ => -1.0,
        }
    }

    /// Stamina drained over one second at `speed`, before modal multipliers.
    pub fn base_consumption_per_second(&self, speed: f64) -> f64 {
        let v = speed - self.base_speed + 12.0;
        20.0 * v * v / 144.0 * self.sp_ground_coef
    }

    /// Heal amount for an effect value in ten-thousandths of capacity.
    pub fn heal_amount(&self, value: f64) -> f64 {
        self.sp_max * value / 10000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::coefficients::Motivation;

    fn params() -> RaceParameters {
        let profile = CompetitorProfile::default();
        let course = CourseDescriptor::sample_turf_2000();
        RaceParameters::derive(&profile, &course, profile.style, &PassiveBonus::default())
    }

    #[test]
    fn base_speed_is_twenty_at_2000m() {
        let p = params();
        assert!((p.base_speed - 20.0).abs() < 1e-12);
        assert!((p.v0 - 17.0).abs() < 1e-12);
    }

    #[test]
    fn phase_boundaries_at_known_ratios() {
        let p = params();
        assert!((p.phase1_start - 333.3333).abs() < 1e-3);
        assert!((p.phase2_start - 1333.3333).abs() < 1e-3);
        assert!((p.phase3_start - 1666.6667).abs() < 1e-3);
        assert_eq!(p.phase_at(0.0), 0);
        assert_eq!(p.phase_at(333.34), 1);
        assert_eq!(p.phase_at(1333.34), 2);
        assert_eq!(p.phase_at(1666.67), 3);
    }

    #[test]
    fn wisdom_activation_rate_bounds() {
        let low = CompetitorProfile {
            wisdom: 90,
            ..CompetitorProfile::default()
        };
        let course = CourseDescriptor::sample_turf_2000();
        let p = RaceParameters::derive(&low, &course, low.style, &PassiveBonus::default());
        assert!((p.skill_activate_rate - 20.0).abs() < 1e-12);

        let p = params();
        assert!(p.skill_activate_rate > 90.0 && p.skill_activate_rate < 100.0);
    }

    #[test]
    fn motivation_scales_modified_stats() {
        let course = CourseDescriptor::sample_dirt_1400();
        let best = CompetitorProfile {
            speed: 1000,
            ..CompetitorProfile::default()
        };
        let worst = CompetitorProfile {
            speed: 1000,
            motivation: Motivation::Worst,
            ..CompetitorProfile::default()
        };
        let p_best = RaceParameters::derive(&best, &course, best.style, &PassiveBonus::default());
        let p_worst =
            RaceParameters::derive(&worst, &course, worst.style, &PassiveBonus::default());
        assert!(p_best.modified_speed > p_worst.modified_speed);
    }

    #[test]
    fn great_escape_uses_front_runner_position_keep() {
        let profile = CompetitorProfile::default();
        let course = CourseDescriptor::sample_turf_2000();
        let p = RaceParameters::derive(&profile, &course, Style::Oonige, &PassiveBonus::default());
        assert_eq!(p.basic_style, Style::Nige);
        assert_eq!(p.position_keep_max_distance, 0.0);
    }

    #[test]
    fn sections_split_course_into_24() {
        let p = params();
        assert_eq!(p.section_at(0.0), 0);
        assert_eq!(p.section_at(999.0), 11);
        assert_eq!(p.section_at(1999.9), 23);
        assert_eq!(p.section_at(2500.0), 23);
    }

    #[test]
    fn heal_clamps_are_linear_in_capacity() {
        let p = params();
        let heal = p.heal_amount(1000.0);
        assert!((heal - p.sp_max * 0.1).abs() < 1e-9);
    }
}
