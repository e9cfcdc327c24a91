//! Skill definitions and the process-wide catalog.
//!
//! A skill is one or more triggers; each trigger carries a declarative
//! condition tree (OR of AND-groups) and an effect descriptor. Definitions are
//! static and shared: profiles reference them by id, trials by catalog index.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Stable index into the catalog, assigned once at load. Per-skill statistics
/// are kept in plain vectors indexed by this, keeping string lookups out of
/// the per-frame loop.
pub type SkillIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Normal,
    Rare,
    Unique,
    Evo,
}

/// Comparison operator in a condition leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    pub fn check(self, actual: i32, expected: i32) -> bool {
        match self {
            CompareOp::Eq => actual == expected,
            CompareOp::Ne => actual != expected,
            CompareOp::Gt => actual > expected,
            CompareOp::Ge => actual >= expected,
            CompareOp::Lt => actual < expected,
            CompareOp::Le => actual <= expected,
        }
    }
}

/// One condition leaf: a named condition type compared against a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCondition {
    pub kind: String,
    pub op: CompareOp,
    pub value: i32,
}

impl SkillCondition {
    pub fn new(kind: &str, op: CompareOp, value: i32) -> Self {
        Self {
            kind: kind.to_string(),
            op,
            value,
        }
    }
}

/// Flat stat bonuses applied before the race when the trigger's static
/// conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PassiveBonus {
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub stamina: i32,
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub guts: i32,
    #[serde(default)]
    pub wisdom: i32,
    /// Additive adjustment to the temptation rate, in percent points.
    #[serde(default)]
    pub temptation_rate: i32,
}

impl PassiveBonus {
    pub fn is_empty(&self) -> bool {
        *self == PassiveBonus::default()
    }

    pub fn add(&mut self, other: &PassiveBonus) {
        self.speed += other.speed;
        self.stamina += other.stamina;
        self.power += other.power;
        self.guts += other.guts;
        self.wisdom += other.wisdom;
        self.temptation_rate += other.temptation_rate;
    }
}

/// Effect descriptor for one trigger. All speed values are m/s deltas; `heal`
/// is in ten-thousandths of stamina capacity; `duration` is base seconds
/// before the course-length scaling.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillEffect {
    #[serde(default)]
    pub target_speed: f64,
    #[serde(default)]
    pub current_speed: f64,
    /// One-shot bump to current speed applied at trigger time.
    #[serde(default)]
    pub speed_with_decel: f64,
    #[serde(default)]
    pub acceleration: f64,
    #[serde(default)]
    pub heal: f64,
    #[serde(default)]
    pub lane_change_speed: f64,
    #[serde(default)]
    pub passive: PassiveBonus,
    /// Marks the great-escape transformation skill.
    #[serde(default)]
    pub oonige: bool,
}

impl SkillEffect {
    pub fn is_heal(&self) -> bool {
        self.heal != 0.0
    }

    /// Sum of speed contributions while the effect operates.
    pub fn total_speed(&self) -> f64 {
        self.target_speed + self.speed_with_decel + self.current_speed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTrigger {
    /// OR over groups; AND within a group. An empty tree is always true.
    #[serde(default)]
    pub conditions: Vec<Vec<SkillCondition>>,
    /// Base duration in seconds; 0 for instantaneous effects.
    #[serde(default)]
    pub duration: f64,
    /// Cooldown as a ratio of the course-length-dependent base cooldown;
    /// 0 means the trigger fires at most once per race.
    #[serde(default)]
    pub cooldown: f64,
    /// Triggers sharing a group share one cooldown stamp.
    #[serde(default)]
    pub cooldown_group: String,
    pub effect: SkillEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    /// Upgrade group: tiers of the same skill share a group and differ in
    /// point cost. Used by acquire-one contribution analysis.
    #[serde(default)]
    pub group: Option<String>,
    /// Skill point cost, the denominator of the efficiency metric.
    #[serde(default)]
    pub sp_cost: u32,
    pub triggers: Vec<SkillTrigger>,
}

impl SkillDefinition {
    pub fn is_oonige(&self) -> bool {
        self.triggers.iter().any(|t| t.effect.oonige)
    }
}

/// Process-wide read-only skill table, keyed by id, indexed by `SkillIndex`.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: Vec<SkillDefinition>,
    by_id: HashMap<String, SkillIndex>,
}

impl SkillCatalog {
    pub fn new(skills: Vec<SkillDefinition>) -> Self {
        let by_id = skills
            .iter()
            .enumerate()
            .map(|(index, skill)| (skill.id.clone(), index))
            .collect();
        Self { skills, by_id }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn get(&self, index: SkillIndex) -> &SkillDefinition {
        &self.skills[index]
    }

    pub fn index_of(&self, id: &str) -> Option<SkillIndex> {
        self.by_id.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillIndex, &SkillDefinition)> {
        self.skills.iter().enumerate()
    }

    /// Resolve profile skill ids to indices. Unknown ids are reported on
    /// stderr and skipped rather than failing the run.
    pub fn resolve(&self, ids: &[String]) -> Vec<SkillIndex> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            match self.index_of(id) {
                Some(index) => resolved.push(index),
                None => eprintln!("skills: unknown skill id '{id}'; skipping"),
            }
        }
        resolved
    }

    /// Cheaper normal-rarity tiers of the same group, sorted by cost. Used by
    /// acquire-one contribution analysis to build tier chains.
    pub fn cheaper_tiers(&self, skill: &SkillDefinition) -> Vec<SkillIndex> {
        let Some(group) = skill.group.as_deref() else {
            return Vec::new();
        };
        let mut tiers: Vec<SkillIndex> = self
            .skills
            .iter()
            .enumerate()
            .filter(|(_, other)| {
                other.group.as_deref() == Some(group)
                    && other.rarity == Rarity::Normal
                    && other.sp_cost < skill.sp_cost
            })
            .map(|(index, _)| index)
            .collect();
        tiers.sort_by_key(|&index| self.skills[index].sp_cost);
        tiers
    }

    /// Load a catalog from a JSON array of definitions.
    pub fn load_json(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                eprintln!("skills: could not read '{}': {err}", path.display());
                return None;
            }
        };
        match serde_json::from_str::<Vec<SkillDefinition>>(&raw) {
            Ok(skills) => Some(Self::new(skills)),
            Err(err) => {
                eprintln!("skills: could not parse '{}': {err}", path.display());
                None
            }
        }
    }

    /// Built-in defaults covering the common trigger families; enough for the
    /// CLI, tests, and benches without a data file.
    pub fn builtin() -> Self {
        Self::new(builtin_skills())
    }
}

fn builtin_skills() -> Vec<SkillDefinition> {
    use CompareOp::*;
    vec![
        SkillDefinition {
            id: "straightaway-adept".to_string(),
            name: "Straightaway Adept".to_string(),
            rarity: Rarity::Normal,
            group: Some("straightaway".to_string()),
            sp_cost: 110,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![SkillCondition::new("straight_random", Eq, 1)]],
                duration: 3.0,
                cooldown: 2.0,
                cooldown_group: "straightaway".to_string(),
                effect: SkillEffect {
                    target_speed: 0.15,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "professor-of-curvature".to_string(),
            name: "Professor of Curvature".to_string(),
            rarity: Rarity::Rare,
            group: Some("corner-adept".to_string()),
            sp_cost: 160,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![SkillCondition::new("all_corner_random", Eq, 1)]],
                duration: 3.0,
                cooldown: 2.0,
                cooldown_group: "corner-adept".to_string(),
                effect: SkillEffect {
                    target_speed: 0.25,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "corner-adept".to_string(),
            name: "Corner Adept".to_string(),
            rarity: Rarity::Normal,
            group: Some("corner-adept".to_string()),
            sp_cost: 100,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![SkillCondition::new("all_corner_random", Eq, 1)]],
                duration: 3.0,
                cooldown: 2.0,
                cooldown_group: "corner-adept".to_string(),
                effect: SkillEffect {
                    target_speed: 0.15,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "go-with-the-flow".to_string(),
            name: "Go with the Flow".to_string(),
            rarity: Rarity::Normal,
            group: Some("middle-surge".to_string()),
            sp_cost: 120,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![
                    SkillCondition::new("phase_random", Eq, 1),
                    SkillCondition::new("running_style", Eq, 2),
                ]],
                duration: 3.0,
                cooldown: 0.0,
                cooldown_group: "middle-surge".to_string(),
                effect: SkillEffect {
                    target_speed: 0.15,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "deep-breaths".to_string(),
            name: "Deep Breaths".to_string(),
            rarity: Rarity::Normal,
            group: Some("breather".to_string()),
            sp_cost: 130,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![SkillCondition::new("phase_laterhalf_random", Eq, 1)]],
                duration: 0.0,
                cooldown: 0.0,
                cooldown_group: "breather".to_string(),
                effect: SkillEffect {
                    heal: 350.0,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "swinging-maestro".to_string(),
            name: "Swinging Maestro".to_string(),
            rarity: Rarity::Rare,
            group: Some("breather".to_string()),
            sp_cost: 170,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![SkillCondition::new("phase_laterhalf_random", Eq, 1)]],
                duration: 0.0,
                cooldown: 0.0,
                cooldown_group: "breather".to_string(),
                effect: SkillEffect {
                    heal: 550.0,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "final-push".to_string(),
            name: "Final Push".to_string(),
            rarity: Rarity::Normal,
            group: Some("final-push".to_string()),
            sp_cost: 110,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![
                    SkillCondition::new("phase", Ge, 2),
                    SkillCondition::new("is_finalcorner_random", Eq, 1),
                ]],
                duration: 3.0,
                cooldown: 0.0,
                cooldown_group: "final-push".to_string(),
                effect: SkillEffect {
                    acceleration: 0.2,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "late-start-recovery".to_string(),
            name: "Late Start Recovery".to_string(),
            rarity: Rarity::Normal,
            group: None,
            sp_cost: 80,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![SkillCondition::new("is_badstart", Eq, 1)]],
                duration: 1.2,
                cooldown: 0.0,
                cooldown_group: "late-start-recovery".to_string(),
                effect: SkillEffect {
                    acceleration: 0.2,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "pace-strategist".to_string(),
            name: "Pace Strategist".to_string(),
            rarity: Rarity::Normal,
            group: None,
            sp_cost: 90,
            triggers: vec![SkillTrigger {
                conditions: vec![vec![
                    SkillCondition::new("hp_per", Le, 60),
                    SkillCondition::new("phase", Eq, 2),
                ]],
                duration: 0.0,
                cooldown: 0.0,
                cooldown_group: "pace-strategist".to_string(),
                effect: SkillEffect {
                    heal: 150.0,
                    ..SkillEffect::default()
                },
            }],
        },
        SkillDefinition {
            id: "focus".to_string(),
            name: "Focus".to_string(),
            rarity: Rarity::Normal,
            group: None,
            sp_cost: 60,
            triggers: vec![SkillTrigger {
                conditions: Vec::new(),
                duration: 0.0,
                cooldown: 0.0,
                cooldown_group: "focus".to_string(),
                effect: SkillEffect {
                    passive: PassiveBonus {
                        wisdom: 60,
                        ..PassiveBonus::default()
                    },
                    ..SkillEffect::default()
                },
            }],
        },
    ]
}
