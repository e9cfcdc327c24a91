//! Single-runner race simulation core: constant tables, derived parameters,
//! the skill condition/effect engines, and the 15 fps frame stepper.

pub mod coefficients;
pub mod condition;
pub mod course;
pub mod effect;
pub mod export_csv;
pub mod params;
pub mod profile;
pub mod rng;
pub mod skills;
pub mod state;
pub mod stepper;

pub use coefficients::{FitRank, Motivation, Style, Surface, TrackCondition};
pub use condition::RandomPolicy;
pub use course::{CourseDescriptor, Segment, SlopeSegment};
pub use params::RaceParameters;
pub use profile::{load_profile, CompetitorProfile};
pub use skills::{SkillCatalog, SkillDefinition, SkillIndex};
pub use state::{FrameRecord, SystemSettings, TrialResult};
pub use stepper::{run_trial, RaceConfig, TrialOutput};
