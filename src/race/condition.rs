//! Skill condition compilation. Condition trees are compiled once per trial
//! into predicate objects; per-frame evaluation never touches strings or the
//! RNG. Random-zone conditions sample their trigger intervals at compile time
//! under the trial's bias policy, cached so identical conditions on different
//! skills share one zone.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::race::course::CourseDescriptor;
use crate::race::params::RaceParameters;
use crate::race::profile::CompetitorProfile;
use crate::race::rng::Rng;
use crate::race::skills::{CompareOp, SkillCondition};
use crate::race::state::{special_state_for_condition, SpecialStateKind, SpecialStates};

/// Where inside each eligible zone the trigger window lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomPolicy {
    #[default]
    Random,
    Fastest,
    Fast,
    Middle,
    Slow,
    Slowest,
}

impl RandomPolicy {
    fn rate(self, rng: &mut Rng) -> f64 {
        match self {
            RandomPolicy::Random => rng.next_f64(),
            RandomPolicy::Fastest => 0.0,
            RandomPolicy::Fast => 0.25,
            RandomPolicy::Middle => 0.5,
            RandomPolicy::Slow => 0.75,
            RandomPolicy::Slowest => 0.98,
        }
    }
}

/// Dynamic quantity a predicate can read from the live trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Probe {
    HpPer,
    ActivateCountHeal,
    ActivateCountAll,
    ActivateCountStart,
    ActivateCountMiddle,
    ActivateCountEndAfter,
    ActivateCountLaterHalf,
    AccumulateTime,
    StraightFrontType,
    BadStart,
    TemptationCount,
    RemainDistance,
    Slope,
    DistanceRate,
    Phase,
    PhaseHalf { later: bool },
    FinalCornerOrAfter,
    FinalCornerLaterHalf,
    CornerNumber,
    HealTriggeredLastFrame,
    AnyTriggeredLastFrame,
    InSpurt,
    MaxSpurt,
    InFinalStraight,
    FinalStraightOnetime,
    Furlong,
    CompeteFight,
    Special(SpecialStateKind, i32),
}

/// Live values the stepper exposes to predicates each frame.
pub struct ConditionContext<'a> {
    pub frame: u32,
    /// Position at the end of the current frame.
    pub position: f64,
    /// Position at the start of the current frame.
    pub start_position: f64,
    pub stamina: f64,
    pub phase: usize,
    pub start_delay: f64,
    pub temptation: bool,
    pub in_spurt: bool,
    pub max_spurt: bool,
    pub compete_fight: bool,
    pub heal_triggers: i32,
    pub total_triggers: i32,
    pub phase_triggers: [i32; 4],
    pub later_half_triggers: i32,
    pub any_triggered_last_frame: bool,
    pub heal_triggered_last_frame: bool,
    pub special: &'a SpecialStates,
    pub params: &'a RaceParameters,
    pub course: &'a CourseDescriptor,
}

impl ConditionContext<'_> {
    fn slope_int(&self) -> i32 {
        let grade = self.course.slope_at(self.position);
        if grade >= 1.0 {
            1
        } else if grade <= -1.0 {
            2
        } else {
            0
        }
    }

    fn in_final_straight(&self, position: f64) -> bool {
        self.course
            .final_straight()
            .map(|s| s.contains(position))
            .unwrap_or(false)
    }

    fn probe_value(&self, probe: Probe) -> i32 {
        match probe {
            Probe::HpPer => (self.stamina / self.params.sp_max * 100.0) as i32,
            Probe::ActivateCountHeal => self.heal_triggers,
            Probe::ActivateCountAll => self.total_triggers,
            Probe::ActivateCountStart => self.phase_triggers[0],
            Probe::ActivateCountMiddle => self.phase_triggers[1],
            Probe::ActivateCountEndAfter => self.phase_triggers[2] + self.phase_triggers[3],
            Probe::ActivateCountLaterHalf => self.later_half_triggers,
            Probe::AccumulateTime => (self.frame / 15) as i32,
            Probe::StraightFrontType => self.course.straight_front_type(self.position),
            Probe::BadStart => (self.start_delay >= 0.08) as i32,
            Probe::TemptationCount => self.temptation as i32,
            Probe::RemainDistance => (self.params.course_length - self.start_position) as i32,
            Probe::Slope => self.slope_int(),
            Probe::DistanceRate => {
                (self.position * 100.0 / self.params.course_length) as i32
            }
            Probe::Phase => self.phase as i32,
            Probe::PhaseHalf { later } => {
                let (start, end) = self.params.phase_start_end(self.phase);
                let in_later = self.start_position >= (start + end) / 2.0;
                if in_later == later {
                    self.phase as i32
                } else {
                    -1
                }
            }
            Probe::FinalCornerOrAfter => self
                .course
                .final_corner()
                .map(|c| self.position >= c.start)
                .unwrap_or(false) as i32,
            Probe::FinalCornerLaterHalf => {
                let in_corner_later_half = self
                    .course
                    .final_corner()
                    .map(|c| {
                        self.position >= c.start + c.length() / 2.0 && self.position <= c.end
                    })
                    .unwrap_or(false);
                (in_corner_later_half || self.in_final_straight(self.position)) as i32
            }
            Probe::CornerNumber => self.course.corner_number(self.position),
            Probe::HealTriggeredLastFrame => self.heal_triggered_last_frame as i32,
            Probe::AnyTriggeredLastFrame => self.any_triggered_last_frame as i32,
            Probe::InSpurt => self.in_spurt as i32,
            Probe::MaxSpurt => (self.in_spurt && self.max_spurt) as i32,
            Probe::InFinalStraight => self.in_final_straight(self.position) as i32,
            Probe::FinalStraightOnetime => (self.in_final_straight(self.position)
                && !self.in_final_straight(self.start_position))
                as i32,
            Probe::Furlong => (self.start_position / 200.0) as i32,
            Probe::CompeteFight => self.compete_fight as i32,
            Probe::Special(kind, adjust) => self.special.get(kind) + adjust,
        }
    }
}

/// A compiled condition leaf. No variant holds mutable state; zones are
/// resolved intervals by the time a predicate exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Const(bool),
    Dynamic { probe: Probe, op: CompareOp, value: i32 },
    InZones(Vec<(f64, f64)>),
}

impl Predicate {
    pub fn check(&self, ctx: &ConditionContext<'_>) -> bool {
        match self {
            Predicate::Const(value) => *value,
            Predicate::Dynamic { probe, op, value } => {
                op.check(ctx.probe_value(*probe), *value)
            }
            Predicate::InZones(zones) => zones
                .iter()
                .any(|&(start, end)| ctx.position >= start && ctx.position <= end),
        }
    }
}

/// Compiled OR-of-AND trigger condition. An empty tree is always true.
#[derive(Debug, Clone, Default)]
pub struct CompiledTrigger {
    groups: Vec<Vec<Predicate>>,
}

impl CompiledTrigger {
    pub fn check(&self, ctx: &ConditionContext<'_>) -> bool {
        self.groups.is_empty()
            || self
                .groups
                .iter()
                .any(|group| group.iter().all(|p| p.check(ctx)))
    }

    /// True when no branch can ever hold, so the trigger can be skipped.
    pub fn never(&self) -> bool {
        !self.groups.is_empty()
            && self.groups.iter().all(|group| {
                group.iter().any(|p| match p {
                    Predicate::Const(false) => true,
                    Predicate::InZones(zones) => zones.is_empty(),
                    _ => false,
                })
            })
    }
}

type BuilderFn = fn(&SkillCondition, &mut Compiler<'_>) -> Predicate;

/// Per-trial compilation pass: owns the zone cache and the RNG draws that
/// place random zones.
pub struct Compiler<'a> {
    pub params: &'a RaceParameters,
    pub course: &'a CourseDescriptor,
    pub profile: &'a CompetitorProfile,
    pub policy: RandomPolicy,
    pub fix_random: bool,
    rng: &'a mut Rng,
    zones: HashMap<String, Vec<(f64, f64)>>,
    warned: HashSet<String>,
}

impl<'a> Compiler<'a> {
    pub fn new(
        params: &'a RaceParameters,
        course: &'a CourseDescriptor,
        profile: &'a CompetitorProfile,
        policy: RandomPolicy,
        fix_random: bool,
        rng: &'a mut Rng,
    ) -> Self {
        Self {
            params,
            course,
            profile,
            policy,
            fix_random,
            rng,
            zones: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    pub fn compile(&mut self, conditions: &[Vec<SkillCondition>]) -> CompiledTrigger {
        let groups = conditions
            .iter()
            .map(|group| group.iter().map(|c| self.compile_one(c)).collect())
            .collect();
        CompiledTrigger { groups }
    }

    fn compile_one(&mut self, condition: &SkillCondition) -> Predicate {
        match registry().get(condition.kind.as_str()) {
            Some(builder) => builder(condition, self),
            None => {
                if let Some((kind, adjust)) = special_state_for_condition(&condition.kind) {
                    return Predicate::Dynamic {
                        probe: Probe::Special(kind, adjust),
                        op: condition.op,
                        value: condition.value,
                    };
                }
                self.warn(&condition.kind, "unsupported condition type");
                Predicate::Const(true)
            }
        }
    }

    fn warn(&mut self, kind: &str, reason: &str) {
        if self.warned.insert(kind.to_string()) {
            eprintln!("condition: {reason} '{kind}'; treating as always true");
        }
    }

    /// Trigger window inside one zone: policy picks the entry point, the
    /// window runs at most 10 m and never starts within 2 m of the zone end.
    fn choose_window(&mut self, zone_start: f64, zone_end: f64) -> Vec<(f64, f64)> {
        let rate = self.policy.rate(self.rng);
        let start = (rate * (zone_end - zone_start) + zone_start).min(zone_end - 2.0);
        let end = (start + 10.0).min(zone_end);
        vec![(start, end)]
    }

    /// Same, over a list of candidate spans treated as one contiguous zone.
    fn choose_window_multi(&mut self, spans: &[(f64, f64)]) -> Vec<(f64, f64)> {
        if spans.is_empty() {
            return Vec::new();
        }
        let total: f64 = spans.iter().map(|(s, e)| e - s).sum();
        let mut offset = self.policy.rate(self.rng) * total;
        for &(span_start, span_end) in spans {
            let len = span_end - span_start;
            if offset < len {
                let start = (span_start + offset).min(span_end - 2.0);
                let end = (start + 10.0).min(span_end);
                return vec![(start, end)];
            }
            offset -= len;
        }
        Vec::new()
    }

    /// Uniform 10 m window inside a zone, ignoring the bias policy. Used by
    /// the two-draw all-corner zones.
    fn uniform_window(&mut self, zone_start: f64, zone_end: f64) -> (f64, f64) {
        let latest = zone_start.max(zone_end - 10.0);
        let start = zone_start + self.rng.next_f64() * (latest - zone_start);
        (start, start + 10.0)
    }

    fn cached_zones(
        &mut self,
        key: String,
        build: impl FnOnce(&mut Self) -> Vec<(f64, f64)>,
    ) -> Vec<(f64, f64)> {
        if let Some(zones) = self.zones.get(&key) {
            return zones.clone();
        }
        let zones = build(self);
        self.zones.insert(key, zones.clone());
        zones
    }
}

fn prechecked(condition: &SkillCondition, actual: i32) -> Predicate {
    Predicate::Const(condition.op.check(actual, condition.value))
}

fn dynamic(condition: &SkillCondition, probe: Probe) -> Predicate {
    Predicate::Dynamic {
        probe,
        op: condition.op,
        value: condition.value,
    }
}

/// Builder that requires `== expected`; anything else logs and degrades.
fn assert_eq_value(
    condition: &SkillCondition,
    compiler: &mut Compiler<'_>,
    expected: Option<i32>,
) -> bool {
    if condition.op != CompareOp::Eq || expected.is_some_and(|v| condition.value != v) {
        compiler.warn(&condition.kind, "unsupported operator for");
        return false;
    }
    true
}

fn corner_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, None) {
        return Predicate::Const(true);
    }
    let key = format!("{}{}", condition.kind, condition.value);
    let value = condition.value;
    let zones = c.cached_zones(key, |c| {
        // Condition value counts the last four corners, oldest first; courses
        // with fewer corners leave the early slots empty.
        let corners = &c.course.corners;
        let take = corners.len().min(4);
        let tail = &corners[corners.len() - take..];
        let slot = value - 1 - (4 - take as i32);
        if slot < 0 || slot as usize >= tail.len() {
            return Vec::new();
        }
        let corner = tail[slot as usize];
        c.choose_window(corner.start, corner.end)
    });
    Predicate::InZones(zones)
}

fn all_corner_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, Some(1)) {
        return Predicate::Const(true);
    }
    let zones = c.cached_zones(condition.kind.clone(), |c| {
        let corners = c.course.corners.clone();
        let mut zones = Vec::new();
        for _ in 0..2 {
            if corners.is_empty() {
                break;
            }
            let corner = corners[c.rng.next_below(corners.len() as u64) as usize];
            zones.push(c.uniform_window(corner.start, corner.end));
        }
        zones.sort_by(|a, b| a.0.total_cmp(&b.0));
        zones
    });
    Predicate::InZones(zones)
}

fn straight_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, Some(1)) {
        return Predicate::Const(true);
    }
    let zones = c.cached_zones(condition.kind.clone(), |c| {
        let straights = &c.course.straights;
        if straights.is_empty() {
            return Vec::new();
        }
        let straight = straights[c.rng.next_below(straights.len() as u64) as usize];
        c.choose_window(straight.start, straight.end)
    });
    Predicate::InZones(zones)
}

fn slope_zone(condition: &SkillCondition, c: &mut Compiler<'_>, up: bool, later_half: bool) -> Predicate {
    if !assert_eq_value(condition, c, Some(1)) {
        return Predicate::Const(true);
    }
    let zones = c.cached_zones(condition.kind.clone(), |c| {
        let half = c.params.course_length / 2.0;
        let slopes: Vec<_> = c
            .course
            .slopes
            .iter()
            .filter(|s| {
                let direction_ok = if up { s.grade > 0.0 } else { s.grade < 0.0 };
                direction_ok && (!later_half || s.end > half)
            })
            .copied()
            .collect();
        if slopes.is_empty() {
            return Vec::new();
        }
        let slope = slopes[c.rng.next_below(slopes.len() as u64) as usize];
        let start = if later_half { slope.start.max(half) } else { slope.start };
        c.choose_window(start, slope.end)
    });
    Predicate::InZones(zones)
}

fn phase_zone(condition: &SkillCondition, c: &mut Compiler<'_>, range: (f64, f64)) -> Predicate {
    let key = format!("{}{}", condition.kind, condition.value);
    let phase = condition.value.clamp(0, 3) as usize;
    let zones = c.cached_zones(key, |c| {
        let (start, end) = c.params.phase_start_end(phase);
        let length = end - start;
        c.choose_window(start + length * range.0, end - length * (1.0 - range.1))
    });
    Predicate::InZones(zones)
}

fn phase_straight_zone(
    condition: &SkillCondition,
    c: &mut Compiler<'_>,
    range: (f64, f64),
) -> Predicate {
    let key = format!("{}{}", condition.kind, condition.value);
    let phase = condition.value.clamp(0, 3) as usize;
    let zones = c.cached_zones(key, |c| {
        let (start, end) = c.params.phase_start_end(phase);
        let length = end - start;
        let area = (start + length * range.0, end - length * (1.0 - range.1));
        let candidates: Vec<_> = c
            .course
            .straights
            .iter()
            .filter(|s| s.end >= area.0 && s.start <= area.1)
            .map(|s| (s.start.max(area.0), s.end.min(area.1)))
            .collect();
        c.choose_window_multi(&candidates)
    });
    Predicate::InZones(zones)
}

fn phase_corner_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    let key = format!("{}{}", condition.kind, condition.value);
    let phase = condition.value.clamp(0, 3) as usize;
    let zones = c.cached_zones(key, |c| {
        let (start, end) = c.params.phase_start_end(phase);
        let candidates: Vec<_> = c
            .course
            .corners
            .iter()
            .filter(|s| s.end >= start && s.start <= end)
            .map(|s| (s.start.max(start), s.end.min(end)))
            .collect();
        c.choose_window_multi(&candidates)
    });
    Predicate::InZones(zones)
}

fn final_corner_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, Some(1)) {
        return Predicate::Const(true);
    }
    let zones = c.cached_zones(condition.kind.clone(), |c| {
        match c.course.final_corner() {
            Some(corner) => c.choose_window(corner.start, corner.end),
            None => Vec::new(),
        }
    });
    Predicate::InZones(zones)
}

fn final_straight_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, Some(1)) {
        return Predicate::Const(true);
    }
    let zones = c.cached_zones("is_finalstraight_random".to_string(), |c| {
        match c.course.final_corner() {
            Some(corner) => {
                let length = c.params.course_length;
                c.choose_window(corner.end, length)
            }
            None => Vec::new(),
        }
    });
    Predicate::InZones(zones)
}

fn distance_rate_after_zone(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, None) {
        return Predicate::Const(true);
    }
    let key = format!("{}{}", condition.kind, condition.value);
    let rate = condition.value as f64 * 0.01;
    let zones = c.cached_zones(key, |c| {
        let length = c.params.course_length;
        c.choose_window(length * rate, length)
    });
    Predicate::InZones(zones)
}

fn phase_first_quarter(condition: &SkillCondition, c: &mut Compiler<'_>) -> Predicate {
    if !assert_eq_value(condition, c, None) {
        return Predicate::Const(true);
    }
    let (start, end) = c.params.phase_start_end(condition.value.clamp(0, 3) as usize);
    Predicate::InZones(vec![(start, start + (end - start) / 4.0)])
}

fn registry() -> &'static HashMap<&'static str, BuilderFn> {
    static REGISTRY: OnceLock<HashMap<&'static str, BuilderFn>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, BuilderFn> = HashMap::new();

        // Static facts, folded to constants at compile time.
        map.insert("motivation", |cond, c| {
            prechecked(cond, c.profile.motivation.condition_value())
        });
        map.insert("running_style", |cond, c| {
            prechecked(cond, c.params.basic_style.condition_value())
        });
        map.insert("rotation", |cond, c| prechecked(cond, c.course.turn));
        map.insert("ground_type", |cond, c| {
            prechecked(cond, c.course.surface.condition_value())
        });
        map.insert("ground_condition", |cond, c| {
            prechecked(cond, c.course.condition.condition_value())
        });
        map.insert("distance_type", |cond, c| {
            prechecked(cond, c.params.distance_category_value)
        });
        map.insert("track_id", |cond, c| prechecked(cond, c.course.track_id));
        map.insert("is_basis_distance", |cond, c| {
            prechecked(cond, c.course.is_basis_distance() as i32)
        });
        map.insert("course_distance", |cond, c| {
            prechecked(cond, c.course.distance as i32)
        });
        map.insert("corner_count", |cond, c| {
            prechecked(cond, c.course.corners.len() as i32)
        });
        map.insert("popularity", |cond, c| prechecked(cond, c.profile.popularity));
        map.insert("post_number", |cond, c| prechecked(cond, c.profile.gate_number));
        map.insert("base_speed", |cond, c| prechecked(cond, c.profile.speed));
        map.insert("base_stamina", |cond, c| prechecked(cond, c.profile.stamina));
        map.insert("base_power", |cond, c| prechecked(cond, c.profile.power));
        map.insert("base_guts", |cond, c| prechecked(cond, c.profile.guts));
        map.insert("base_wiz", |cond, c| prechecked(cond, c.profile.wisdom));
        map.insert("always", |_, _| Predicate::Const(true));
        map.insert("random_lot", |cond, c| {
            if !assert_eq_value(cond, c, None) {
                return Predicate::Const(true);
            }
            let passed = c.fix_random || (cond.value as u64) > c.rng.next_below(100);
            Predicate::Const(passed)
        });

        // Live state probes.
        map.insert("hp_per", |cond, _| dynamic(cond, Probe::HpPer));
        map.insert("activate_count_heal", |cond, _| {
            dynamic(cond, Probe::ActivateCountHeal)
        });
        map.insert("activate_count_all", |cond, _| {
            dynamic(cond, Probe::ActivateCountAll)
        });
        map.insert("activate_count_start", |cond, _| {
            dynamic(cond, Probe::ActivateCountStart)
        });
        map.insert("activate_count_middle", |cond, _| {
            dynamic(cond, Probe::ActivateCountMiddle)
        });
        map.insert("activate_count_end_after", |cond, _| {
            dynamic(cond, Probe::ActivateCountEndAfter)
        });
        map.insert("activate_count_later_half", |cond, _| {
            dynamic(cond, Probe::ActivateCountLaterHalf)
        });
        map.insert("accumulatetime", |cond, _| dynamic(cond, Probe::AccumulateTime));
        map.insert("straight_front_type", |cond, _| {
            dynamic(cond, Probe::StraightFrontType)
        });
        map.insert("is_badstart", |cond, _| dynamic(cond, Probe::BadStart));
        map.insert("temptation_count", |cond, _| {
            dynamic(cond, Probe::TemptationCount)
        });
        map.insert("remain_distance", |cond, _| {
            dynamic(cond, Probe::RemainDistance)
        });
        map.insert("slope", |cond, _| dynamic(cond, Probe::Slope));
        map.insert("distance_rate", |cond, _| dynamic(cond, Probe::DistanceRate));
        map.insert("phase", |cond, _| dynamic(cond, Probe::Phase));
        map.insert("phase_firsthalf", |cond, _| {
            dynamic(cond, Probe::PhaseHalf { later: false })
        });
        map.insert("phase_laterhalf", |cond, _| {
            dynamic(cond, Probe::PhaseHalf { later: true })
        });
        map.insert("phase_firstquarter", phase_first_quarter);
        map.insert("is_finalcorner", |cond, _| {
            dynamic(cond, Probe::FinalCornerOrAfter)
        });
        map.insert("is_finalcorner_laterhalf", |cond, _| {
            dynamic(cond, Probe::FinalCornerLaterHalf)
        });
        map.insert("corner", |cond, _| dynamic(cond, Probe::CornerNumber));
        map.insert("is_activate_heal_skill", |cond, _| {
            dynamic(cond, Probe::HealTriggeredLastFrame)
        });
        map.insert("is_activate_any_skill", |cond, _| {
            dynamic(cond, Probe::AnyTriggeredLastFrame)
        });
        map.insert("is_lastspurt", |cond, _| dynamic(cond, Probe::InSpurt));
        map.insert("lastspurt", |cond, c| {
            if cond.op == CompareOp::Eq && cond.value == 2 {
                Predicate::Dynamic {
                    probe: Probe::MaxSpurt,
                    op: CompareOp::Eq,
                    value: 1,
                }
            } else {
                c.warn(&cond.kind, "unsupported operator for");
                Predicate::Const(true)
            }
        });
        map.insert("is_last_straight", |cond, _| {
            dynamic(cond, Probe::InFinalStraight)
        });
        map.insert("is_last_straight_onetime", |cond, _| {
            dynamic(cond, Probe::FinalStraightOnetime)
        });
        map.insert("furlong", |cond, _| dynamic(cond, Probe::Furlong));
        map.insert("compete_fight_count", |cond, _| {
            dynamic(cond, Probe::CompeteFight)
        });

        // Random-zone families, sampled at compile time.
        map.insert("corner_random", corner_zone);
        map.insert("all_corner_random", all_corner_zone);
        map.insert("straight_random", straight_zone);
        map.insert("up_slope_random", |cond, c| slope_zone(cond, c, true, false));
        map.insert("down_slope_random", |cond, c| slope_zone(cond, c, false, false));
        map.insert("up_slope_random_later_half", |cond, c| {
            slope_zone(cond, c, true, true)
        });
        map.insert("down_slope_random_later_half", |cond, c| {
            slope_zone(cond, c, false, true)
        });
        map.insert("phase_random", |cond, c| phase_zone(cond, c, (0.0, 1.0)));
        map.insert("phase_firsthalf_random", |cond, c| {
            phase_zone(cond, c, (0.0, 0.5))
        });
        map.insert("phase_firstquarter_random", |cond, c| {
            phase_zone(cond, c, (0.0, 0.25))
        });
        map.insert("phase_laterhalf_random", |cond, c| {
            phase_zone(cond, c, (0.5, 1.0))
        });
        map.insert("phase_straight_random", |cond, c| {
            phase_straight_zone(cond, c, (0.0, 1.0))
        });
        map.insert("phase_first_half_straight_random", |cond, c| {
            phase_straight_zone(cond, c, (0.0, 0.5))
        });
        map.insert("phase_latter_half_straight_random", |cond, c| {
            phase_straight_zone(cond, c, (0.5, 1.0))
        });
        map.insert("phase_corner_random", phase_corner_zone);
        map.insert("is_finalcorner_random", final_corner_zone);
        map.insert("is_finalstraight_random", final_straight_zone);
        map.insert("last_straight_random", final_straight_zone);
        map.insert("distance_rate_after_random", distance_rate_after_zone);

        map
    })
}
