//! Game-balance constant tables. The values in this module are tuning data,
//! not derived quantities; they must match the reference tables exactly so
//! that results stay comparable across reimplementations.

use serde::{Deserialize, Serialize};

/// Simulation runs at a fixed 15 frames per second.
pub const FRAMES_PER_SECOND: f64 = 15.0;
pub const FRAME_TIME: f64 = 1.0 / FRAMES_PER_SECOND;

/// Speed out of the gate, and the floor during the start dash.
pub const START_SPEED: f64 = 3.0;

/// Extra acceleration while in the start dash.
pub const START_DASH_ACCELERATION: f64 = 24.0;

/// Width of one lane slot, in course meters of lateral offset.
pub const LANE_WIDTH: f64 = 1.0;

/// Running style. `Oonige` is the great-escape variant of the front-runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    /// Front-runner.
    Nige,
    /// Stalker.
    Sen,
    /// Closer.
    Sasi,
    /// Chaser.
    Oi,
    /// Great escape.
    Oonige,
}

impl Style {
    /// Target-speed coefficient for phases 0..=2 (phase 3 reuses phase 2).
    pub fn speed_coef(self, phase: usize) -> f64 {
        let table = match self {
            Style::Nige => [1.0, 0.98, 0.962],
            Style::Sen => [0.978, 0.991, 0.975],
            Style::Sasi => [0.938, 0.998, 0.994],
            Style::Oi => [0.931, 1.0, 1.0],
            Style::Oonige => [1.063, 0.962, 0.95],
        };
        table[phase.min(2)]
    }

    /// Acceleration coefficient for phases 0..=2 (phase 3 reuses phase 2).
    pub fn accel_coef(self, phase: usize) -> f64 {
        let table = match self {
            Style::Nige => [1.0, 1.0, 0.996],
            Style::Sen => [0.985, 1.0, 0.996],
            Style::Sasi => [0.975, 1.0, 1.0],
            Style::Oi => [0.945, 1.0, 0.997],
            Style::Oonige => [1.17, 0.94, 0.956],
        };
        table[phase.min(2)]
    }

    /// Stamina-capacity coefficient.
    pub fn sp_coef(self) -> f64 {
        match self {
            Style::Nige => 0.95,
            Style::Sen => 0.89,
            Style::Sasi => 1.0,
            Style::Oi => 0.995,
            Style::Oonige => 0.86,
        }
    }

    /// Integer id used by `running_style` skill conditions.
    pub fn condition_value(self) -> i32 {
        match self {
            Style::Nige | Style::Oonige => 1,
            Style::Sen => 2,
            Style::Sasi => 3,
            Style::Oi => 4,
        }
    }
}

/// Fitness rank for distance, surface, and style aptitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FitRank {
    S,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl FitRank {
    pub fn distance_speed_coef(self) -> f64 {
        match self {
            FitRank::S => 1.05,
            FitRank::A => 1.0,
            FitRank::B => 0.9,
            FitRank::C => 0.8,
            FitRank::D => 0.6,
            FitRank::E => 0.4,
            FitRank::F => 0.2,
            FitRank::G => 0.1,
        }
    }

    pub fn distance_accel_coef(self) -> f64 {
        match self {
            FitRank::S | FitRank::A | FitRank::B | FitRank::C | FitRank::D => 1.0,
            FitRank::E => 0.6,
            FitRank::F => 0.5,
            FitRank::G => 0.4,
        }
    }

    pub fn surface_accel_coef(self) -> f64 {
        match self {
            FitRank::S => 1.05,
            FitRank::A => 1.0,
            FitRank::B => 0.9,
            FitRank::C => 0.8,
            FitRank::D => 0.7,
            FitRank::E => 0.5,
            FitRank::F => 0.3,
            FitRank::G => 0.1,
        }
    }

    /// Wisdom multiplier from style aptitude.
    pub fn style_wisdom_coef(self) -> f64 {
        match self {
            FitRank::S => 1.1,
            FitRank::A => 1.0,
            FitRank::B => 0.85,
            FitRank::C => 0.75,
            FitRank::D => 0.6,
            FitRank::E => 0.4,
            FitRank::F => 0.2,
            FitRank::G => 0.1,
        }
    }
}

/// Condition (motivation) modifier applied to all five stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motivation {
    Best,
    Good,
    Normal,
    Bad,
    Worst,
}

impl Motivation {
    pub fn coef(self) -> f64 {
        match self {
            Motivation::Best => 1.04,
            Motivation::Good => 1.02,
            Motivation::Normal => 1.0,
            Motivation::Bad => 0.98,
            Motivation::Worst => 0.96,
        }
    }

    /// Integer id used by `motivation` skill conditions (best = 5 .. worst = 1).
    pub fn condition_value(self) -> i32 {
        match self {
            Motivation::Best => 5,
            Motivation::Good => 4,
            Motivation::Normal => 3,
            Motivation::Bad => 2,
            Motivation::Worst => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surface {
    Turf,
    Dirt,
}

impl Surface {
    /// Integer id used by `ground_type` skill conditions.
    pub fn condition_value(self) -> i32 {
        match self {
            Surface::Turf => 1,
            Surface::Dirt => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackCondition {
    Good,
    SlightlyHeavy,
    Heavy,
    Bad,
}

impl TrackCondition {
    /// Integer id used by `ground_condition` skill conditions.
    pub fn condition_value(self) -> i32 {
        match self {
            TrackCondition::Good => 1,
            TrackCondition::SlightlyHeavy => 2,
            TrackCondition::Heavy => 3,
            TrackCondition::Bad => 4,
        }
    }
}

/// Flat speed-stat modifier from surface and going.
pub fn surface_speed_modifier(surface: Surface, condition: TrackCondition) -> i32 {
    match (surface, condition) {
        (Surface::Turf, TrackCondition::Bad) => -50,
        (Surface::Turf, _) => 0,
        (Surface::Dirt, TrackCondition::Bad) => -50,
        (Surface::Dirt, _) => 0,
    }
}

/// Flat power-stat modifier from surface and going.
pub fn surface_power_modifier(surface: Surface, condition: TrackCondition) -> i32 {
    match (surface, condition) {
        (Surface::Turf, TrackCondition::Good) => 0,
        (Surface::Turf, _) => -50,
        (Surface::Dirt, TrackCondition::SlightlyHeavy) => -50,
        (Surface::Dirt, _) => -100,
    }
}

/// Stamina consumption multiplier from surface and going.
pub fn sp_consumption_coef(surface: Surface, condition: TrackCondition) -> f64 {
    match (surface, condition) {
        (Surface::Turf, TrackCondition::Heavy) | (Surface::Turf, TrackCondition::Bad) => 1.02,
        (Surface::Turf, _) => 1.0,
        (Surface::Dirt, TrackCondition::Heavy) => 1.01,
        (Surface::Dirt, TrackCondition::Bad) => 1.02,
        (Surface::Dirt, _) => 1.0,
    }
}

/// Distance bucket used by conserve-power and a few distance-scaled bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceCategory {
    Sprint,
    Mile,
    Middle,
    Long,
}

impl DistanceCategory {
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0..=1400 => DistanceCategory::Sprint,
            1401..=1800 => DistanceCategory::Mile,
            1801..=2400 => DistanceCategory::Middle,
            _ => DistanceCategory::Long,
        }
    }

    /// Integer id used by `distance_type` skill conditions.
    pub fn condition_value(self) -> i32 {
        match self {
            DistanceCategory::Sprint => 1,
            DistanceCategory::Mile => 2,
            DistanceCategory::Middle => 3,
            DistanceCategory::Long => 4,
        }
    }

    /// Duration coefficient for the conserve-power acceleration window.
    pub fn conserve_power_time_coef(self) -> f64 {
        match self {
            DistanceCategory::Sprint => 0.45,
            DistanceCategory::Mile => 1.0,
            DistanceCategory::Middle => 0.875,
            DistanceCategory::Long => 0.8,
        }
    }
}

/// Base duration of the conserve-power window, in seconds.
pub const CONSERVE_POWER_BASE_SECONDS: f64 = 3.0;

/// Stat cap before the exceed floor: points above this count at half weight.
pub const EXCEED_STAT_FLOOR: i32 = 1200;

/// Soft-cap a raw stat: values above 1200 contribute at half weight.
pub fn exceed_status(status: i32) -> i32 {
    if status > EXCEED_STAT_FLOOR {
        EXCEED_STAT_FLOOR + (status - EXCEED_STAT_FLOOR) / 2
    } else {
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exceed_status_half_weight_above_floor() {
        assert_eq!(exceed_status(1200), 1200);
        assert_eq!(exceed_status(1400), 1300);
        assert_eq!(exceed_status(800), 800);
    }

    #[test]
    fn style_phase_three_reuses_phase_two() {
        assert_eq!(Style::Nige.speed_coef(3), Style::Nige.speed_coef(2));
        assert_eq!(Style::Oi.accel_coef(3), Style::Oi.accel_coef(2));
    }

    #[test]
    fn bad_going_penalizes_speed_on_both_surfaces() {
        assert_eq!(surface_speed_modifier(Surface::Turf, TrackCondition::Bad), -50);
        assert_eq!(surface_speed_modifier(Surface::Dirt, TrackCondition::Bad), -50);
        assert_eq!(surface_speed_modifier(Surface::Turf, TrackCondition::Good), 0);
    }

    #[test]
    fn distance_categories_split_at_known_boundaries() {
        assert_eq!(DistanceCategory::from_distance(1400), DistanceCategory::Sprint);
        assert_eq!(DistanceCategory::from_distance(1600), DistanceCategory::Mile);
        assert_eq!(DistanceCategory::from_distance(2000), DistanceCategory::Middle);
        assert_eq!(DistanceCategory::from_distance(3000), DistanceCategory::Long);
    }
}
