mod engine;
mod error;
mod phases;
mod solver;
mod types;
mod validate;

pub use engine::{Allocation, Withdrawal, allocate, classify_phase, process_year, simulate, withdraw};
pub use error::{PlannerError, PlannerResult};
pub use phases::{organize, summarize};
pub use solver::{
    candidate_range, evaluate_retirement_ages, fallback_retirement_age, find_optimal_age,
    search_retirement_age,
};
pub use types::{
    AllocationSplit, AllocationTable, CandidateResult, FinancialState, OptimalRetirementResult,
    OrganizedYear, Phase, PhaseOrganization, PlanSummary, PlannerConfig, RetirementSearch,
    SimulationInput, YearResult,
};
pub use validate::{MAX_AGE, validate_input};
