pub mod contribution;
pub mod monte_carlo;
pub mod summary;

pub use contribution::{analyze_contribution, ContributionEntry, ContributionMode, ContributionTable};
pub use monte_carlo::{
    run_monte_carlo, CancelToken, OnRunning, Progress, SimulationGate, SimulationOptions,
    SimulationOutput,
};
pub use summary::{summarize, AggregateSummary, SkillSummary, SummaryEntry};
