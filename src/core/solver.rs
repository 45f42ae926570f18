use super::engine::run_trajectory;
use super::error::PlannerResult;
use super::types::{
    CandidateResult, OptimalRetirementResult, RetirementSearch, SimulationInput, YearResult,
};
use super::validate::validate_input;

/// Youngest and oldest retirement ages the search will try, or `None` when
/// the lifespan leaves no room for any candidate.
pub fn candidate_range(input: &SimulationInput) -> Option<(u32, u32)> {
    let first = input.current_age + 1;
    let last = input
        .lifespan
        .saturating_sub(input.config.retirement_test_buffer);
    (first <= last).then_some((first, last))
}

pub fn fallback_retirement_age(input: &SimulationInput) -> u32 {
    input.config.default_retirement_age.min(
        input
            .lifespan
            .saturating_sub(input.config.retirement_safety_buffer),
    )
}

fn terminal_wealth(simulation: &[YearResult]) -> f64 {
    simulation.last().map(YearResult::total_wealth).unwrap_or(0.0)
}

fn evaluate_candidate(
    input: &SimulationInput,
    age: u32,
    simulation: &[YearResult],
) -> CandidateResult {
    let final_wealth = terminal_wealth(simulation);
    let retirement_wealth = simulation
        .iter()
        .find(|year| year.age == age)
        .map(YearResult::total_wealth)
        .unwrap_or(0.0);
    let required_retirement_wealth =
        input.config.retirement_wealth_multiple * input.annual_expenses();

    CandidateResult {
        age,
        final_wealth,
        retirement_wealth,
        distance_from_zero: final_wealth.abs(),
        valid: final_wealth >= -input.config.final_wealth_tolerance
            && retirement_wealth > required_retirement_wealth,
    }
}

pub fn evaluate_retirement_ages(input: &SimulationInput) -> PlannerResult<Vec<CandidateResult>> {
    validate_input(input)?;
    let Some((first, last)) = candidate_range(input) else {
        return Ok(Vec::new());
    };

    Ok((first..=last)
        .map(|age| evaluate_candidate(input, age, &run_trajectory(input, age)))
        .collect())
}

/// Picks the retirement age whose final wealth lands closest to zero without
/// going broke, falling back to the configured default age when no
/// candidate qualifies.
pub fn find_optimal_age(input: &SimulationInput) -> PlannerResult<OptimalRetirementResult> {
    search_retirement_age(input).map(|search| search.optimal)
}

/// Like [`find_optimal_age`], but also returns every candidate evaluated on
/// the way.
pub fn search_retirement_age(input: &SimulationInput) -> PlannerResult<RetirementSearch> {
    validate_input(input)?;

    let mut candidates = Vec::new();
    let mut best: Option<(CandidateResult, Vec<YearResult>)> = None;
    if let Some((first, last)) = candidate_range(input) {
        for age in first..=last {
            let simulation = run_trajectory(input, age);
            let candidate = evaluate_candidate(input, age, &simulation);
            log::debug!(
                "candidate age={} final_wealth={:.2} retirement_wealth={:.2} valid={}",
                candidate.age,
                candidate.final_wealth,
                candidate.retirement_wealth,
                candidate.valid
            );
            candidates.push(candidate);
            if !candidate.valid {
                continue;
            }
            let better = best.as_ref().is_none_or(|(current, _)| {
                candidate.distance_from_zero < current.distance_from_zero
            });
            if better {
                best = Some((candidate, simulation));
            }
        }
    }

    let optimal = match best {
        Some((candidate, simulation)) => {
            log::info!(
                "optimal retirement age {} (final wealth {:.2})",
                candidate.age,
                candidate.final_wealth
            );
            OptimalRetirementResult {
                age: candidate.age,
                simulation,
                final_wealth: candidate.final_wealth,
            }
        }
        None => {
            let age = fallback_retirement_age(input);
            log::warn!("no sustainable retirement age found; falling back to age {age}");
            let simulation = run_trajectory(input, age);
            let final_wealth = terminal_wealth(&simulation);
            OptimalRetirementResult {
                age,
                simulation,
                final_wealth,
            }
        }
    };

    Ok(RetirementSearch {
        optimal,
        candidates,
    })
}
