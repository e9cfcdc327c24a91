//! Skill effect bookkeeping: which effects operate, which cooldown groups are
//! stamped, and the aggregate bonuses the stepper folds into each frame.

use std::collections::HashMap;

use crate::race::condition::CompiledTrigger;
use crate::race::skills::{SkillEffect, SkillIndex};
use crate::race::state::OperatingEffect;

/// A skill trigger that passed the pre-race wisdom gate, with its condition
/// tree compiled for this trial.
#[derive(Debug, Clone)]
pub struct InvokedSkill {
    pub skill: SkillIndex,
    pub trigger: usize,
    pub compiled: CompiledTrigger,
    pub effect: SkillEffect,
    pub duration: f64,
    pub cooldown: f64,
    pub cooldown_group: String,
}

/// Result of one activation, for the frame record and timing trackers.
#[derive(Debug, Clone, Copy)]
pub struct TriggerOutcome {
    pub skill: SkillIndex,
    pub heal_requested: f64,
    pub operating: bool,
    pub speed_with_decel: f64,
}

#[derive(Debug, Default)]
pub struct EffectEngine {
    pub operating: Vec<OperatingEffect>,
    cooldowns: HashMap<String, u32>,
    pub heal_triggers: i32,
    pub total_triggers: i32,
    pub phase_triggers: [i32; 4],
    pub later_half_triggers: i32,
}

impl EffectEngine {
    /// Whether a trigger may fire at `frame`. A stamped group with zero
    /// cooldown ratio never refires; otherwise the group reopens once the
    /// cooldown window has fully elapsed.
    pub fn ready(&self, invoked: &InvokedSkill, frame: u32, cooldown_base_frames: f64) -> bool {
        match self.cooldowns.get(&invoked.cooldown_group) {
            None => true,
            Some(&stamp) if invoked.cooldown > 0.0 => {
                (frame - stamp) as f64 > invoked.cooldown * cooldown_base_frames
            }
            Some(_) => false,
        }
    }

    /// Register an activation. Effects with a duration become operating
    /// effects scaled by `time_coef` (course length in km); instantaneous
    /// effects only stamp the cooldown and report their payload.
    pub fn trigger(
        &mut self,
        invoked: &InvokedSkill,
        frame: u32,
        phase: usize,
        in_later_half: bool,
        time_coef: f64,
    ) -> TriggerOutcome {
        self.cooldowns.insert(invoked.cooldown_group.clone(), frame);
        self.total_triggers += 1;
        self.phase_triggers[phase.min(3)] += 1;
        if in_later_half {
            self.later_half_triggers += 1;
        }
        if invoked.effect.is_heal() {
            self.heal_triggers += 1;
        }

        let operating = invoked.duration > 0.0;
        if operating {
            let duration_frames =
                (invoked.duration * time_coef * crate::race::coefficients::FRAMES_PER_SECOND)
                    .round() as u32;
            self.operating.push(OperatingEffect {
                skill: invoked.skill,
                trigger: invoked.trigger,
                start_frame: frame,
                end_frame: frame + duration_frames.max(1),
                effect: invoked.effect.clone(),
            });
        }
        TriggerOutcome {
            skill: invoked.skill,
            heal_requested: invoked.effect.heal,
            operating,
            speed_with_decel: invoked.effect.speed_with_decel,
        }
    }

    /// Drop effects whose window has closed, returning their skill indices.
    pub fn expire(&mut self, frame: u32) -> Vec<SkillIndex> {
        let mut ended = Vec::new();
        self.operating.retain(|effect| {
            if effect.active(frame) {
                true
            } else {
                ended.push(effect.skill);
                false
            }
        });
        ended
    }

    pub fn target_speed_bonus(&self) -> f64 {
        self.operating.iter().map(|e| e.effect.total_speed()).sum()
    }

    pub fn acceleration_bonus(&self) -> f64 {
        self.operating.iter().map(|e| e.effect.acceleration).sum()
    }

    pub fn lane_change_bonus(&self) -> f64 {
        self.operating.iter().map(|e| e.effect.lane_change_speed).sum()
    }

    pub fn operating_skills(&self) -> Vec<SkillIndex> {
        self.operating.iter().map(|e| e.skill).collect()
    }
}
