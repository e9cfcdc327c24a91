//! The frame stepper: one trial of one race, advanced in fixed 1/15 s
//! increments until the runner crosses the line.

use serde::{Deserialize, Serialize};

use crate::race::coefficients::{
    Style, FRAMES_PER_SECOND, FRAME_TIME, START_SPEED,
};
use crate::race::condition::{Compiler, ConditionContext, RandomPolicy};
use crate::race::course::CourseDescriptor;
use crate::race::effect::{EffectEngine, InvokedSkill};
use crate::race::params::RaceParameters;
use crate::race::profile::CompetitorProfile;
use crate::race::rng::Rng;
use crate::race::skills::{PassiveBonus, SkillCatalog, SkillIndex};
use crate::race::state::{
    FrameRecord, PositionKeepState, SkillTimingTracker, SpecialStates, SpurtParameters,
    SystemSettings, TrialResult, TriggeredRecord, ALL_SPECIAL_STATES,
};

/// Hard cap on trial length; a 30 minute race means the physics went wrong.
const MAX_FRAMES: u32 = 15 * 60 * 30;

/// Everything that defines one race: who runs, where, and under which
/// randomization policy. Shared read-only by all trials of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    pub profile: CompetitorProfile,
    pub course: CourseDescriptor,
    #[serde(default)]
    pub pace_maker: Option<CompetitorProfile>,
    #[serde(skip)]
    pub policy: RandomPolicy,
    #[serde(skip)]
    pub settings: SystemSettings,
}

impl RaceConfig {
    pub fn new(profile: CompetitorProfile, course: CourseDescriptor) -> Self {
        Self {
            profile,
            course,
            pace_maker: None,
            policy: RandomPolicy::default(),
            settings: SystemSettings::default(),
        }
    }
}

/// One trial's output: the reducible result, plus the frame trace when the
/// caller asked for one.
#[derive(Debug, Clone)]
pub struct TrialOutput {
    pub result: TrialResult,
    pub frames: Option<Vec<FrameRecord>>,
}

/// Run a single trial with its own RNG stream. The optional pace maker is
/// stepped in lockstep through the same physics (without its own pace maker).
pub fn run_trial(
    config: &RaceConfig,
    catalog: &SkillCatalog,
    seed: u64,
    record_frames: bool,
) -> TrialOutput {
    let mut rng = Rng::new(seed);
    let skills = catalog.resolve(&config.profile.skills);
    let has_oonige = skills.iter().any(|&i| catalog.get(i).is_oonige());
    let style = config.profile.running_style(has_oonige);

    // Passive bonuses need parameters to evaluate their conditions, and the
    // final parameters need the passive bonuses. Derive twice.
    let base_params = RaceParameters::derive(
        &config.profile,
        &config.course,
        style,
        &PassiveBonus::default(),
    );
    let passive = collect_passive(config, catalog, &skills, &base_params, &mut rng);
    let params = RaceParameters::derive(&config.profile, &config.course, style, &passive);

    let invoked = invoke_skills(config, catalog, &skills, &params, &mut rng);

    let mut pace_maker = config.pace_maker.as_ref().map(|pm_profile| {
        let pm_params = RaceParameters::derive(
            pm_profile,
            &config.course,
            pm_profile.style,
            &PassiveBonus::default(),
        );
        Box::new(Trial::new(
            pm_params,
            &config.course,
            &config.settings,
            Vec::new(),
            catalog.len(),
            Rng::new(seed ^ 0x70ac_e4a1_5eed_f00d),
            false,
        ))
    });

    let mut trial = Trial::new(
        params,
        &config.course,
        &config.settings,
        invoked,
        catalog.len(),
        rng,
        record_frames,
    );

    while !trial.finished() && trial.frame < MAX_FRAMES {
        let pm_position = pace_maker.as_mut().map(|pm| {
            if !pm.finished() {
                pm.step(None);
            }
            pm.position
        });
        trial.step(pm_position);
    }
    trial.into_output()
}

/// Sum passive bonuses from triggers whose conditions hold before the start.
fn collect_passive(
    config: &RaceConfig,
    catalog: &SkillCatalog,
    skills: &[SkillIndex],
    params: &RaceParameters,
    rng: &mut Rng,
) -> PassiveBonus {
    let mut passive = PassiveBonus::default();
    let mut compiler = Compiler::new(
        params,
        &config.course,
        &config.profile,
        config.policy,
        config.settings.fix_random,
        rng,
    );
    let special = SpecialStates::default();
    for &index in skills {
        for trigger in &catalog.get(index).triggers {
            if trigger.effect.passive.is_empty() {
                continue;
            }
            let compiled = compiler.compile(&trigger.conditions);
            let ctx = pre_race_context(params, &config.course, &special);
            if compiled.check(&ctx) {
                passive.add(&trigger.effect.passive);
            }
        }
    }
    passive
}

/// Compile the in-race triggers of every skill that passes the wisdom gate.
fn invoke_skills(
    config: &RaceConfig,
    catalog: &SkillCatalog,
    skills: &[SkillIndex],
    params: &RaceParameters,
    rng: &mut Rng,
) -> Vec<InvokedSkill> {
    let gate = params.skill_activate_rate / 100.0;
    let gated: Vec<SkillIndex> = skills
        .iter()
        .copied()
        .filter(|_| config.settings.fix_random || rng.chance(gate))
        .collect();

    let mut compiler = Compiler::new(
        params,
        &config.course,
        &config.profile,
        config.policy,
        config.settings.fix_random,
        rng,
    );
    let mut invoked = Vec::new();
    for index in gated {
        let skill = catalog.get(index);
        for (trigger_index, trigger) in skill.triggers.iter().enumerate() {
            if !trigger.effect.passive.is_empty() && trigger.effect.total_speed() == 0.0
                && trigger.effect.acceleration == 0.0
                && !trigger.effect.is_heal()
            {
                continue;
            }
            let compiled = compiler.compile(&trigger.conditions);
            if compiled.never() {
                continue;
            }
            invoked.push(InvokedSkill {
                skill: index,
                trigger: trigger_index,
                compiled,
                effect: trigger.effect.clone(),
                duration: trigger.duration,
                cooldown: trigger.cooldown,
                cooldown_group: trigger.cooldown_group.clone(),
            });
        }
    }
    invoked
}

fn pre_race_context<'a>(
    params: &'a RaceParameters,
    course: &'a CourseDescriptor,
    special: &'a SpecialStates,
) -> ConditionContext<'a> {
    ConditionContext {
        frame: 0,
        position: 0.0,
        start_position: 0.0,
        stamina: params.sp_max,
        phase: 0,
        start_delay: 0.0,
        temptation: false,
        in_spurt: false,
        max_spurt: false,
        compete_fight: false,
        heal_triggers: 0,
        total_triggers: 0,
        phase_triggers: [0; 4],
        later_half_triggers: 0,
        any_triggered_last_frame: false,
        heal_triggered_last_frame: false,
        special,
        params,
        course,
    }
}

struct Trial<'a> {
    params: RaceParameters,
    course: &'a CourseDescriptor,
    settings: &'a SystemSettings,
    rng: Rng,
    invoked: Vec<InvokedSkill>,
    effects: EffectEngine,

    frame: u32,
    position: f64,
    speed: f64,
    stamina: f64,
    lane: f64,
    target_lane: f64,
    start_dash: bool,
    start_delay: f64,
    delay_frames: u32,

    section_randoms: [f64; 24],
    spurt: Option<SpurtParameters>,
    max_spurt: bool,
    stamina_limit_break: bool,
    conserve_power_start: Option<u32>,
    conserve_power_used: bool,

    downhill_mode: bool,
    temptation_section: i32,
    temptation_start: Option<u32>,
    temptation_end: Option<u32>,
    temptation_waste: f64,

    position_keep: PositionKeepState,
    position_keep_next: u32,
    position_keep_section: usize,

    lead_competition_start: Option<u32>,
    compete_fight: bool,
    position_competition: bool,
    stamina_keep: bool,
    secure_lead: bool,
    phase2_decided: bool,

    special: SpecialStates,
    trackers: Vec<SkillTimingTracker>,
    triggered_records: Vec<TriggeredRecord>,
    phase_change_frames: [u32; 3],
    last_phase: usize,
    depletion_position: Option<f64>,
    any_triggered_last_frame: bool,
    heal_triggered_last_frame: bool,

    pending_triggered: Vec<SkillIndex>,
    finish_time: Option<f64>,
    frames: Option<Vec<FrameRecord>>,
}

impl<'a> Trial<'a> {
    fn new(
        params: RaceParameters,
        course: &'a CourseDescriptor,
        settings: &'a SystemSettings,
        invoked: Vec<InvokedSkill>,
        catalog_len: usize,
        mut rng: Rng,
        record_frames: bool,
    ) -> Self {
        let noise_span = params.section_noise_span;
        let mut section_randoms = [0.0; 24];
        for slot in section_randoms.iter_mut() {
            *slot = rng.next_f64() * 2.0 * noise_span - 0.00325;
        }

        let start_delay = if settings.fix_random {
            0.0
        } else {
            rng.next_f64() * 0.1
        };
        let delay_frames = (start_delay / FRAME_TIME).ceil() as u32;

        let temptation_section = if !settings.fix_random
            && rng.chance(params.temptation_rate.clamp(0.0, 100.0) / 100.0)
        {
            1 + rng.next_below(8) as i32
        } else {
            -1
        };

        Self {
            stamina: params.sp_max,
            params,
            course,
            settings,
            rng,
            invoked,
            effects: EffectEngine::default(),
            frame: 0,
            position: 0.0,
            speed: START_SPEED,
            lane: 0.0,
            target_lane: 0.0,
            start_dash: true,
            start_delay,
            delay_frames,
            section_randoms,
            spurt: None,
            max_spurt: false,
            stamina_limit_break: false,
            conserve_power_start: None,
            conserve_power_used: false,
            downhill_mode: false,
            temptation_section,
            temptation_start: None,
            temptation_end: None,
            temptation_waste: 0.0,
            position_keep: PositionKeepState::None,
            position_keep_next: delay_frames + 2 * FRAMES_PER_SECOND as u32,
            position_keep_section: 0,
            lead_competition_start: None,
            compete_fight: false,
            position_competition: false,
            stamina_keep: false,
            secure_lead: false,
            phase2_decided: false,
            special: SpecialStates::default(),
            trackers: vec![SkillTimingTracker::default(); catalog_len],
            triggered_records: Vec::new(),
            phase_change_frames: [0; 3],
            last_phase: 0,
            depletion_position: None,
            any_triggered_last_frame: false,
            heal_triggered_last_frame: false,
            pending_triggered: Vec::new(),
            finish_time: None,
            frames: record_frames.then(Vec::new),
        }
    }

    fn finished(&self) -> bool {
        self.finish_time.is_some()
    }

    fn in_spurt(&self) -> bool {
        self.spurt
            .map(|p| self.position + p.spurt_distance >= self.params.course_length)
            .unwrap_or(false)
    }

    fn in_temptation(&self) -> bool {
        match (self.temptation_start, self.temptation_end) {
            (Some(_), None) => true,
            (Some(_), Some(end)) => self.frame < end,
            _ => false,
        }
    }

    fn in_lead_competition(&self) -> bool {
        self.lead_competition_start
            .map(|start| ((self.frame - start) as f64) < self.params.lead_competition_frames)
            .unwrap_or(false)
    }

    fn in_conserve_power(&self) -> bool {
        self.conserve_power_start
            .map(|start| ((self.frame - start) as f64) < self.params.conserve_power_frames)
            .unwrap_or(false)
    }

    fn uphill(&self) -> bool {
        self.course.slope_at(self.position) >= 1.0
    }

    fn downhill(&self) -> bool {
        self.course.slope_at(self.position) <= -1.0
    }

    fn min_speed(&self) -> f64 {
        if self.start_dash {
            START_SPEED
        } else {
            self.params.min_speed
        }
    }

    /// Stamina per second to hold `v` over `length` meters, before modal
    /// multipliers. Used by the spurt solver.
    fn required_stamina(&self, v: f64, length: f64, spurt_phase: bool) -> f64 {
        let mut per_second = self.params.base_consumption_per_second(v);
        if spurt_phase {
            per_second *= self.params.spurt_sp_coef;
        }
        length / v * per_second
    }

    fn required_stamina_for_rest(&self) -> f64 {
        let phase2_length = (self.params.phase2_start - self.position).max(0.0);
        let phase3_length = self.params.course_length / 3.0;
        self.required_stamina(self.params.v2, phase2_length, false)
            + self.required_stamina(self.params.max_spurt_speed, phase3_length, true)
    }

    /// Resolve the last-spurt plan from the current position and stamina.
    fn solve_spurt(&mut self) -> SpurtParameters {
        let remain = (self.params.course_length - self.position - 60.0).max(1.0);
        let max_speed = self.params.max_spurt_speed;
        let required_full = self.required_stamina(max_speed, remain, true);
        if self.stamina >= required_full {
            self.max_spurt = true;
            return SpurtParameters {
                spurt_distance: remain + 60.0,
                speed: max_speed,
                stamina_remainder: self.stamina - required_full,
            };
        }

        let v3 = self.params.v3;
        let cps = |trial: &Self, v: f64| {
            trial.params.base_consumption_per_second(v) * trial.params.spurt_sp_coef / v
        };
        let cps_v3 = cps(self, v3);

        // Candidate speeds above cruise, each with the longest spurt the
        // stamina budget allows, preferred in ascending total-time order.
        let mut candidates: Vec<SpurtParameters> = Vec::new();
        let mut v = v3 + 0.1;
        while v < max_speed {
            let cps_v = cps(self, v);
            let denom = cps_v - cps_v3;
            if denom > 1e-12 {
                let distance = ((self.stamina - remain * cps_v3) / denom).clamp(0.0, remain);
                if distance > 0.0 {
                    candidates.push(SpurtParameters {
                        spurt_distance: distance,
                        speed: v,
                        stamina_remainder: 0.0,
                    });
                }
            }
            v += 0.1;
        }
        candidates.sort_by(|a, b| {
            let time_a = a.spurt_distance / a.speed + (remain - a.spurt_distance) / v3;
            let time_b = b.spurt_distance / b.speed + (remain - b.spurt_distance) / v3;
            time_a.total_cmp(&time_b)
        });

        let accept = (15.0 + 0.05 * self.params.modified_wisdom as f64) / 100.0;
        for candidate in &candidates {
            if self.settings.fix_random || self.rng.chance(accept) {
                return *candidate;
            }
        }
        SpurtParameters {
            spurt_distance: (self.stamina / cps_v3).min(remain),
            speed: v3,
            stamina_remainder: 0.0,
        }
    }

    /// Heal and its spillover. Recomputes the spurt plan in the final phases
    /// and upgrades stamina-keep when the margin is back.
    fn apply_heal(&mut self, value: f64) -> (f64, f64) {
        let heal = self.params.heal_amount(value);
        self.stamina += heal;
        let waste = (self.stamina - self.params.sp_max).max(0.0);
        self.stamina -= waste;
        if self.params.phase_at(self.position) >= 2 {
            let was_in_spurt = self.in_spurt();
            let plan = self.solve_spurt();
            self.spurt = Some(plan);
            if !was_in_spurt && self.in_spurt() {
                self.on_spurt_start();
            }
        }
        if self.stamina_keep && self.stamina >= self.required_stamina_for_rest() {
            self.stamina_keep = false;
            self.position_competition = true;
        }
        (heal, waste)
    }

    fn on_spurt_start(&mut self) {
        if self.params.conserve_power_acceleration > 0.0 && !self.conserve_power_used {
            self.conserve_power_start = Some(self.frame);
            self.conserve_power_used = true;
        }
        if self.params.stamina_limit_break_speed > 0.0 && self.max_spurt {
            self.stamina_limit_break = true;
        }
        for effect in &self.effects.operating {
            self.trackers[effect.skill].spurt_connected = true;
        }
    }

    fn phase2_entry_decisions(&mut self) {
        self.phase2_decided = true;
        self.spurt = Some(self.solve_spurt());
        if self.in_spurt() {
            self.on_spurt_start();
        }
        let short = self.stamina < self.required_stamina_for_rest();
        if short {
            if self.rng.chance(self.settings.stamina_keep_rate) {
                self.stamina_keep = true;
            }
        } else if self.rng.chance(self.settings.position_competition_rate) {
            self.position_competition = true;
        }
        if self.params.secure_lead_speed > 0.0 && self.rng.chance(self.settings.secure_lead_rate) {
            self.secure_lead = true;
        }
    }

    fn per_second_updates(&mut self) {
        for kind in ALL_SPECIAL_STATES {
            let active = !self.settings.fix_random
                && self.rng.chance(self.settings.special_state_rate);
            self.special.roll(kind, active);
        }

        // Downhill coasting mode.
        if self.downhill() {
            if self.downhill_mode {
                if self.rng.chance(0.2) {
                    self.downhill_mode = false;
                }
            } else if self
                .rng
                .chance(self.params.modified_wisdom as f64 * 0.0004)
            {
                self.downhill_mode = true;
            }
        } else {
            self.downhill_mode = false;
        }

        // Compete fight in the final straight.
        if !self.compete_fight
            && self.params.phase_at(self.position) >= 3
            && self
                .course
                .final_straight()
                .map(|s| s.contains(self.position))
                .unwrap_or(false)
            && self.rng.chance(self.settings.compete_fight_rate_per_second)
        {
            self.compete_fight = true;
        }

        // Temptation runs at least 3 s, then ends 55% per 3 s, capped at 12 s.
        if let (Some(start), None) = (self.temptation_start, self.temptation_end) {
            let elapsed = self.frame - start;
            let fps = FRAMES_PER_SECOND as u32;
            if elapsed >= 12 * fps {
                self.temptation_end = Some(self.frame);
            } else if elapsed >= 3 * fps && elapsed % (3 * fps) < fps && self.rng.chance(0.55) {
                self.temptation_end = Some(self.frame);
            }
        }
    }

    fn position_keep_decision(&mut self, pace_maker_position: Option<f64>) {
        self.position_keep_next = self.frame + 2 * FRAMES_PER_SECOND as u32;
        let section = (self.position / self.params.course_length * 10.0) as usize;
        if section >= 10 {
            self.position_keep = PositionKeepState::None;
            return;
        }
        self.position_keep_section = section;

        if let Some(leader) = pace_maker_position {
            let gap = leader - self.position;
            self.position_keep = match self.params.basic_style {
                Style::Nige | Style::Oonige => {
                    if gap > 0.0 && self.rng.chance(self.params.position_keep_speed_up_rate) {
                        if self.params.style == Style::Oonige {
                            PositionKeepState::Overtake
                        } else {
                            PositionKeepState::SpeedUp
                        }
                    } else {
                        PositionKeepState::None
                    }
                }
                _ => {
                    if gap < self.params.position_keep_min_distance {
                        PositionKeepState::PaceDown
                    } else if gap > self.params.position_keep_max_distance
                        && self.rng.chance(self.params.position_keep_pace_up_rate)
                    {
                        PositionKeepState::PaceUp
                    } else {
                        PositionKeepState::None
                    }
                }
            };
        } else {
            let sections = SystemSettings::pace_down_sections(self.params.basic_style);
            self.position_keep = if sections.contains(&section) {
                PositionKeepState::PaceDown
            } else {
                PositionKeepState::None
            };
        }
    }

    fn target_speed(&self, phase: usize) -> f64 {
        if self.stamina <= 0.0 {
            return self.min_speed();
        }
        if self.speed < self.params.v0 {
            return self.params.v0;
        }

        let base = self.params.base_speed;
        let section = self.params.section_at(self.position);
        let mut result = if self.in_spurt() {
            self.spurt.map(|p| p.speed).unwrap_or(self.params.v3)
        } else {
            let style_base = match phase {
                0 | 1 => base * self.params.style.speed_coef(phase),
                _ => {
                    base * self.params.style.speed_coef(2)
                        + self.params.distance_speed_term
                        + self.params.guts_spurt_term
                }
            };
            style_base + base * self.section_randoms[section]
        };

        result *= self.position_keep.speed_multiplier(phase);
        result += self.effects.target_speed_bonus();

        let slope = self.course.slope_at(self.position);
        if self.uphill() {
            result -= slope.abs() * 200.0 / self.params.modified_power as f64;
        } else if self.downhill_mode {
            result += slope.abs() / 10.0 + 0.3;
        }

        if self.lane != self.target_lane && self.effects.lane_change_bonus() > 0.0 {
            result += (0.0002 * self.params.modified_power as f64).powf(0.5);
        }
        if self.in_lead_competition() {
            result += self.params.lead_competition_speed;
        }
        if self.compete_fight {
            result += self.params.compete_fight_speed;
        }
        if self.position_competition {
            result += self.params.position_competition_speed;
        }
        if self.secure_lead {
            result += self.params.secure_lead_speed;
        }
        if self.stamina_limit_break {
            result += self.params.stamina_limit_break_speed;
        }
        result
    }

    fn acceleration(&self, phase: usize, target: f64) -> f64 {
        if self.speed > target {
            return if self.stamina <= 0.0 {
                -1.2
            } else if self.position_keep == PositionKeepState::PaceDown {
                -0.5
            } else {
                self.params.phase_deceleration(phase)
            };
        }
        let slope_coef = if self.uphill() { 0.0004 / 0.0006 } else { 1.0 };
        let mut acceleration = self.params.phase_acceleration(phase) * slope_coef;
        if self.start_dash {
            acceleration += crate::race::coefficients::START_DASH_ACCELERATION;
        }
        acceleration += self.effects.acceleration_bonus();
        if self.compete_fight {
            acceleration += self.params.compete_fight_acceleration;
        }
        if self.in_conserve_power() {
            acceleration += self.params.conserve_power_acceleration;
        }
        acceleration.max(0.0)
    }

    fn consumption_per_second(&self, phase: usize) -> (f64, f64) {
        let base_speed = if self.start_dash {
            self.speed
        } else {
            self.params.base_speed
        };
        let v = self.speed - base_speed + 12.0;
        let mut consume = 20.0 * v * v / 144.0 * self.params.sp_ground_coef;
        if phase >= 2 {
            consume *= self.params.spurt_sp_coef;
        }
        if self.downhill_mode {
            consume *= 0.4;
        }
        let mut waste = 0.0;
        if self.in_lead_competition() {
            let oonige = self.params.style == Style::Oonige;
            consume *= match (self.in_temptation(), oonige) {
                (true, true) => 7.7,
                (true, false) => 3.6,
                (false, true) => 3.5,
                (false, false) => 1.4,
            };
        } else if self.in_temptation() {
            waste = consume * 0.6;
            consume *= 1.6;
        }
        if self.position_keep == PositionKeepState::PaceDown {
            consume *= 0.6;
        }
        if self.position_competition {
            consume += self.params.position_competition_stamina_per_second;
        }
        if self.secure_lead {
            consume += self.params.secure_lead_stamina_per_second;
        }
        (consume, waste)
    }

    fn check_skills(&mut self, phase: usize, start_position: f64) {
        let mut triggered = Vec::new();
        let mut triggered_this_frame = false;
        let mut heal_this_frame = false;

        let in_later_half = {
            let (start, end) = self.params.phase_start_end(phase);
            start_position >= (start + end) / 2.0
        };

        // Readiness is checked per trigger, not precomputed: an activation
        // stamps its cooldown group immediately, which must hold back any
        // later trigger of the same group within this frame.
        for i in 0..self.invoked.len() {
            if !self.effects.ready(
                &self.invoked[i],
                self.frame,
                self.params.cooldown_base_frames,
            ) {
                continue;
            }
            let ctx = ConditionContext {
                frame: self.frame,
                position: self.position,
                start_position,
                stamina: self.stamina,
                phase,
                start_delay: self.start_delay,
                temptation: self.temptation_start.is_some(),
                in_spurt: self.in_spurt(),
                max_spurt: self.max_spurt,
                compete_fight: self.compete_fight,
                heal_triggers: self.effects.heal_triggers,
                total_triggers: self.effects.total_triggers,
                phase_triggers: self.effects.phase_triggers,
                later_half_triggers: self.effects.later_half_triggers,
                any_triggered_last_frame: self.any_triggered_last_frame,
                heal_triggered_last_frame: self.heal_triggered_last_frame,
                special: &self.special,
                params: &self.params,
                course: self.course,
            };
            if !self.invoked[i].compiled.check(&ctx) {
                continue;
            }
            let invoked = self.invoked[i].clone();
            let outcome = self.effects.trigger(
                &invoked,
                self.frame,
                phase,
                in_later_half,
                self.params.time_coef,
            );

            let mut invalid = false;
            if outcome.heal_requested != 0.0 {
                let (heal, waste) = self.apply_heal(outcome.heal_requested);
                invalid = waste >= heal - 1e-9;
                heal_this_frame = true;
            }
            if outcome.speed_with_decel != 0.0 {
                self.speed += outcome.speed_with_decel;
            }
            if outcome.operating && invoked.effect.total_speed() > 0.0 {
                if self.stamina <= 0.0 {
                    invalid = true;
                }
                let before_final_corner = self
                    .course
                    .final_corner()
                    .map(|c| self.position < c.start)
                    .unwrap_or(true);
                if before_final_corner && self.rng.chance(self.settings.skill_lane_change_rate) {
                    self.target_lane += crate::race::coefficients::LANE_WIDTH;
                    let blocked = self
                        .special
                        .get(crate::race::state::SpecialStateKind::BlockedSide);
                    self.special.set(
                        crate::race::state::SpecialStateKind::Overtake,
                        blocked.max(1),
                    );
                }
            }

            self.trackers[invoked.skill].record(self.frame, self.position, phase, invalid);
            self.triggered_records.push(TriggeredRecord {
                skill: invoked.skill,
                frame: self.frame,
                position: self.position,
                phase,
            });
            triggered.push(invoked.skill);
            triggered_this_frame = true;
        }

        self.any_triggered_last_frame = triggered_this_frame;
        self.heal_triggered_last_frame = heal_this_frame;
        self.pending_triggered = triggered;
    }

    fn step(&mut self, pace_maker_position: Option<f64>) {
        if self.finished() {
            return;
        }

        // Gate delay: stand still until the sampled delay has elapsed.
        if self.frame < self.delay_frames {
            self.frame += 1;
            return;
        }

        let start_position = self.position;
        let phase = self.params.phase_at(start_position);

        if self.frame % FRAMES_PER_SECOND as u32 == 0 {
            self.per_second_updates();
        }
        if self.frame >= self.position_keep_next {
            self.position_keep_decision(pace_maker_position);
        } else if self.position_keep == PositionKeepState::PaceDown
            && pace_maker_position.is_none()
        {
            // Approximate pace-down ends with its section.
            let section = (self.position / self.params.course_length * 10.0) as usize;
            if section != self.position_keep_section {
                self.position_keep = PositionKeepState::None;
            }
        }

        // Front-runner lead competition at the fixed early position.
        if self.lead_competition_start.is_none()
            && matches!(self.params.basic_style, Style::Nige)
            && self.position >= self.settings.lead_competition_position
        {
            self.lead_competition_start = Some(self.frame);
        }

        // Temptation binds to its section.
        if self.temptation_section >= 0 && self.temptation_start.is_none() {
            let section = self.params.section_at(self.position) as i32;
            if section >= self.temptation_section {
                self.temptation_start = Some(self.frame);
            }
        }

        if !self.phase2_decided && phase >= 2 {
            self.phase2_entry_decisions();
        }

        let was_in_spurt = self.in_spurt();

        // Physics for this frame.
        let target = self.target_speed(phase);
        let accel = self.acceleration(phase, target);
        let old_speed = self.speed;
        let mut new_speed = old_speed + accel * FRAME_TIME;
        if accel > 0.0 {
            new_speed = new_speed.min(target);
        } else {
            new_speed = new_speed.max(target);
        }
        new_speed = new_speed.max(self.min_speed());
        if self.start_dash && new_speed >= self.params.v0 {
            self.start_dash = false;
        }
        self.speed = new_speed;

        let movement = (old_speed + new_speed) / 2.0 * FRAME_TIME;
        let (consume_per_second, waste_per_second) = self.consumption_per_second(phase);
        let consumption = consume_per_second * FRAME_TIME;
        self.temptation_waste += waste_per_second * FRAME_TIME;
        self.stamina -= consumption;
        if self.stamina <= 0.0 && self.depletion_position.is_none() {
            self.depletion_position = Some(self.position);
        }

        self.position += movement;

        if !was_in_spurt && self.in_spurt() {
            self.on_spurt_start();
        }

        // Lane drift toward the target lane.
        if self.lane != self.target_lane {
            let lane_speed =
                self.params.lane_change_base_speed + self.effects.lane_change_bonus() * FRAME_TIME;
            let delta = (self.target_lane - self.lane).clamp(-lane_speed, lane_speed);
            self.lane += delta;
        }

        let new_phase = self.params.phase_at(self.position);
        if new_phase > self.last_phase {
            for p in self.last_phase..new_phase {
                if p < 3 {
                    self.phase_change_frames[p] = self.frame;
                }
            }
            self.last_phase = new_phase;
        }

        self.check_skills(phase, start_position);
        let ended = self.effects.expire(self.frame);

        let temptation = self.in_temptation();
        let spurting = self.in_spurt();
        if let Some(frames) = &mut self.frames {
            frames.push(FrameRecord {
                frame: self.frame,
                position: self.position,
                speed: self.speed,
                target_speed: target,
                acceleration: accel,
                movement,
                consumption,
                stamina: self.stamina,
                lane: self.lane,
                start_dash: self.start_dash,
                temptation,
                downhill_mode: self.downhill_mode,
                position_keep: self.position_keep,
                spurting,
                triggered_skills: std::mem::take(&mut self.pending_triggered),
                ended_skills: ended,
                operating_skills: self.effects.operating_skills(),
                pace_maker_position,
            });
        } else {
            self.pending_triggered.clear();
        }

        if self.position >= self.params.course_length {
            let excess = self.position - self.params.course_length;
            let fraction = if movement > 0.0 {
                (excess / movement).clamp(0.0, 1.0)
            } else {
                0.0
            };
            self.finish_time = Some((self.frame as f64 + 1.0 - fraction) * FRAME_TIME);
        }
        self.frame += 1;
    }

    fn into_output(self) -> TrialOutput {
        let finish_time = self
            .finish_time
            .unwrap_or(self.frame as f64 * FRAME_TIME);
        let result = TrialResult {
            finish_time,
            stamina_margin: self.stamina,
            max_spurt: self.max_spurt,
            stamina_survived: self.depletion_position.is_none(),
            depletion_position: self.depletion_position,
            bad_start: self.start_delay >= 0.08,
            temptation_occurred: self.temptation_start.is_some(),
            position_competition: self.position_competition,
            stamina_keep: self.stamina_keep,
            secure_lead: self.secure_lead,
            compete_fight: self.compete_fight,
            stamina_limit_break: self.stamina_limit_break,
            conserve_power: self.conserve_power_used,
            phase_change_frames: self.phase_change_frames,
            triggered: self.triggered_records,
            skill_timing: self.trackers,
        };
        TrialOutput {
            result,
            frames: self.frames,
        }
    }
}
