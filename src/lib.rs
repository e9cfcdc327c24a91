//! Monte Carlo race performance simulator.
//!
//! `race` holds the per-trial machinery: course and competitor data, derived
//! race parameters, the skill condition/effect engines, and the frame stepper.
//! `sim` runs many trials in parallel and reduces them into summaries and
//! skill contribution tables. `parallel` is the worker-pool plumbing.

pub mod cli;
pub mod parallel;
pub mod race;
pub mod sim;

pub use race::{CompetitorProfile, CourseDescriptor, RaceConfig, SkillCatalog, TrialResult};
pub use sim::{run_monte_carlo, SimulationOptions, SimulationOutput};
