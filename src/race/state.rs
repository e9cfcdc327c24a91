//! Per-trial mutable state types and the per-frame/per-trial records the
//! simulation emits. Everything here is exclusively owned by one trial.

use serde::Serialize;

use crate::race::coefficients::Style;
use crate::race::skills::{SkillEffect, SkillIndex};

/// Positioning mode during the position-keep window (sections 0..=9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionKeepState {
    None,
    SpeedUp,
    Overtake,
    PaceUp,
    PaceDown,
}

impl PositionKeepState {
    /// Target-speed multiplier; pace-down depends on the phase.
    pub fn speed_multiplier(self, phase: usize) -> f64 {
        match self {
            PositionKeepState::None => 1.0,
            PositionKeepState::SpeedUp => 1.04,
            PositionKeepState::Overtake => 1.05,
            PositionKeepState::PaceUp => 1.04,
            PositionKeepState::PaceDown => {
                if phase == 1 {
                    0.945
                } else {
                    0.915
                }
            }
        }
    }
}

/// Opponent-dependent situations the single-runner model cannot observe.
/// Each is kept as a counter re-rolled once per simulated second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialStateKind {
    Overtake,
    OvertakeTarget,
    BlockedFront,
    BlockedSide,
    InfrontNearLane,
    BehindNearLane,
    NearCount,
    NearInfrontCount,
    Surrounded,
    TemptationBehind,
    ChangeOrderUpMiddle,
    ChangeOrderUpEndAfter,
    ChangeOrderUpFinalCorner,
    OvertakeTargetNoOrderUp,
}

pub const SPECIAL_STATE_COUNT: usize = 14;

pub const ALL_SPECIAL_STATES: [SpecialStateKind; SPECIAL_STATE_COUNT] = [
    SpecialStateKind::Overtake,
    SpecialStateKind::OvertakeTarget,
    SpecialStateKind::BlockedFront,
    SpecialStateKind::BlockedSide,
    SpecialStateKind::InfrontNearLane,
    SpecialStateKind::BehindNearLane,
    SpecialStateKind::NearCount,
    SpecialStateKind::NearInfrontCount,
    SpecialStateKind::Surrounded,
    SpecialStateKind::TemptationBehind,
    SpecialStateKind::ChangeOrderUpMiddle,
    SpecialStateKind::ChangeOrderUpEndAfter,
    SpecialStateKind::ChangeOrderUpFinalCorner,
    SpecialStateKind::OvertakeTargetNoOrderUp,
];

impl SpecialStateKind {
    pub fn name(self) -> &'static str {
        match self {
            SpecialStateKind::Overtake => "overtake",
            SpecialStateKind::OvertakeTarget => "overtake_target",
            SpecialStateKind::BlockedFront => "blocked_front",
            SpecialStateKind::BlockedSide => "blocked_side",
            SpecialStateKind::InfrontNearLane => "infront_near_lane",
            SpecialStateKind::BehindNearLane => "behind_near_lane",
            SpecialStateKind::NearCount => "near_count",
            SpecialStateKind::NearInfrontCount => "near_infront_count",
            SpecialStateKind::Surrounded => "is_surrounded",
            SpecialStateKind::TemptationBehind => "temptation_opponent_count_behind",
            SpecialStateKind::ChangeOrderUpMiddle => "change_order_up_middle",
            SpecialStateKind::ChangeOrderUpEndAfter => "change_order_up_end_after",
            SpecialStateKind::ChangeOrderUpFinalCorner => "change_order_up_finalcorner_after",
            SpecialStateKind::OvertakeTargetNoOrderUp => "overtake_target_no_order_up_time",
        }
    }
}

/// Map a condition-type name to the counter it reads and the threshold
/// adjustment. Time-window variants compare against "at least value seconds"
/// and therefore shift by one.
pub fn special_state_for_condition(kind: &str) -> Option<(SpecialStateKind, i32)> {
    let mapped = match kind {
        "overtake" => (SpecialStateKind::Overtake, 0),
        "overtake_target_time" => (SpecialStateKind::OvertakeTarget, -1),
        "blocked_front" => (SpecialStateKind::BlockedFront, 0),
        "blocked_front_continuetime" => (SpecialStateKind::BlockedFront, -1),
        "blocked_side_continuetime" => (SpecialStateKind::BlockedSide, -1),
        "infront_near_lane_time" => (SpecialStateKind::InfrontNearLane, -1),
        "behind_near_lane_time" | "behind_near_lane_time_set1" => {
            (SpecialStateKind::BehindNearLane, -1)
        }
        "near_count" => (SpecialStateKind::NearCount, 0),
        "near_infront_count" => (SpecialStateKind::NearInfrontCount, 0),
        "is_surrounded" => (SpecialStateKind::Surrounded, 0),
        "temptation_opponent_count_behind" => (SpecialStateKind::TemptationBehind, 0),
        "change_order_up_middle" => (SpecialStateKind::ChangeOrderUpMiddle, 0),
        "change_order_up_end_after" => (SpecialStateKind::ChangeOrderUpEndAfter, 0),
        "change_order_up_finalcorner_after" => (SpecialStateKind::ChangeOrderUpFinalCorner, 0),
        "overtake_target_no_order_up_time" => (SpecialStateKind::OvertakeTargetNoOrderUp, 0),
        _ => return None,
    };
    Some(mapped)
}

/// Counter block for the approximated opponent situations.
#[derive(Debug, Clone, Default)]
pub struct SpecialStates {
    values: [i32; SPECIAL_STATE_COUNT],
}

impl SpecialStates {
    pub fn get(&self, kind: SpecialStateKind) -> i32 {
        self.values[kind as usize]
    }

    pub fn set(&mut self, kind: SpecialStateKind, value: i32) {
        self.values[kind as usize] = value;
    }

    /// Continue (increment) or reset one counter.
    pub fn roll(&mut self, kind: SpecialStateKind, active: bool) {
        let slot = &mut self.values[kind as usize];
        *slot = if active { *slot + 1 } else { 0 };
    }
}

/// Per-second continuation rates for the approximated opponent situations.
/// These are tunable policy values, not derived quantities.
#[derive(Debug, Clone)]
pub struct SystemSettings {
    /// Operating speed effects roll this chance of a lane shift before the
    /// final corner.
    pub skill_lane_change_rate: f64,
    /// Front-runner lead competition starts at this fixed position.
    pub lead_competition_position: f64,
    /// Per-second chance of entering the compete-fight in the final straight.
    pub compete_fight_rate_per_second: f64,
    /// Chance of choosing stamina-keep when stamina is short at phase-2 entry.
    pub stamina_keep_rate: f64,
    /// Chance of position competition at phase-2 entry.
    pub position_competition_rate: f64,
    /// Chance of secure-lead for non-chasers at phase-2 entry.
    pub secure_lead_rate: f64,
    /// Per-second activation chance for each approximated opponent counter.
    pub special_state_rate: f64,
    /// When set, all randomness collapses to its deterministic branch:
    /// no temptation, no bad start, wisdom gate always passes.
    pub fix_random: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            skill_lane_change_rate: 0.4,
            lead_competition_position: 200.0,
            compete_fight_rate_per_second: 0.4,
            stamina_keep_rate: 0.9,
            position_competition_rate: 0.8,
            secure_lead_rate: 0.3,
            special_state_rate: 0.1,
            fix_random: false,
        }
    }
}

impl SystemSettings {
    /// Sections (of the first 10) where a style considers pace-down in
    /// approximate position-keep mode.
    pub fn pace_down_sections(style: Style) -> &'static [usize] {
        match style {
            Style::Nige | Style::Oonige => &[],
            Style::Sen => &[0],
            Style::Sasi => &[0, 3],
            Style::Oi => &[0, 2, 7],
        }
    }
}

/// Resolved last-spurt plan: from `spurt_distance` before the goal, run at
/// `speed`; `stamina_remainder` is the projected stamina at the finish.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpurtParameters {
    pub spurt_distance: f64,
    pub speed: f64,
    pub stamina_remainder: f64,
}

/// A skill effect currently operating on the runner.
#[derive(Debug, Clone)]
pub struct OperatingEffect {
    pub skill: SkillIndex,
    pub trigger: usize,
    pub start_frame: u32,
    pub end_frame: u32,
    pub effect: SkillEffect,
}

impl OperatingEffect {
    pub fn active(&self, frame: u32) -> bool {
        frame < self.end_frame
    }
}

/// One frame of the representative trace.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub frame: u32,
    pub position: f64,
    pub speed: f64,
    pub target_speed: f64,
    pub acceleration: f64,
    pub movement: f64,
    pub consumption: f64,
    pub stamina: f64,
    pub lane: f64,
    pub start_dash: bool,
    pub temptation: bool,
    pub downhill_mode: bool,
    pub position_keep: PositionKeepState,
    pub spurting: bool,
    pub triggered_skills: Vec<SkillIndex>,
    pub ended_skills: Vec<SkillIndex>,
    pub operating_skills: Vec<SkillIndex>,
    pub pace_maker_position: Option<f64>,
}

/// One skill activation within a trial.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TriggeredRecord {
    pub skill: SkillIndex,
    pub frame: u32,
    pub position: f64,
    pub phase: usize,
}

/// Per-skill counters a trial keeps for the aggregate summary.
#[derive(Debug, Clone, Default)]
pub struct SkillTimingTracker {
    pub trigger_count: u32,
    pub first_frame: Option<u32>,
    pub first_position: Option<f64>,
    pub phase_counts: [u32; 4],
    /// Triggers that fired while the runner could not benefit (already at or
    /// past spurt speed for speed skills, full stamina for heals).
    pub invalid_count: u32,
    /// Effect still operating at the moment the last spurt began.
    pub spurt_connected: bool,
}

impl SkillTimingTracker {
    pub fn record(&mut self, frame: u32, position: f64, phase: usize, invalid: bool) {
        self.trigger_count += 1;
        if self.first_frame.is_none() {
            self.first_frame = Some(frame);
            self.first_position = Some(position);
        }
        self.phase_counts[phase.min(3)] += 1;
        if invalid {
            self.invalid_count += 1;
        }
    }
}

/// Output of one trial, the unit the reducer consumes.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResult {
    pub finish_time: f64,
    pub stamina_margin: f64,
    pub max_spurt: bool,
    pub stamina_survived: bool,
    pub depletion_position: Option<f64>,
    pub bad_start: bool,
    pub temptation_occurred: bool,
    pub position_competition: bool,
    pub stamina_keep: bool,
    pub secure_lead: bool,
    pub compete_fight: bool,
    pub stamina_limit_break: bool,
    pub conserve_power: bool,
    pub phase_change_frames: [u32; 3],
    pub triggered: Vec<TriggeredRecord>,
    /// Indexed by catalog skill index; zero-filled for unequipped skills.
    #[serde(skip)]
    pub skill_timing: Vec<SkillTimingTracker>,
}
