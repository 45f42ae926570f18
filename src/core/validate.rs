use super::error::{PlannerError, PlannerResult};
use super::types::{AllocationSplit, SimulationInput};

pub const MAX_AGE: u32 = 120;

pub fn validate_input(input: &SimulationInput) -> PlannerResult<()> {
    if input.current_age > MAX_AGE {
        return Err(PlannerError::invalid(
            "current_age",
            format!("must be <= {MAX_AGE}"),
        ));
    }
    if input.lifespan > MAX_AGE {
        return Err(PlannerError::invalid(
            "lifespan",
            format!("must be <= {MAX_AGE}"),
        ));
    }
    if input.lifespan <= input.current_age {
        return Err(PlannerError::invalid(
            "lifespan",
            "must be greater than current_age",
        ));
    }

    for (field, amount) in [
        ("gross_salary_monthly", input.gross_salary_monthly),
        ("monthly_expenses", input.monthly_expenses),
        ("initial_debt", input.initial_debt),
        ("initial_savings", input.initial_savings),
        ("initial_investments", input.initial_investments),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PlannerError::invalid(field, "must be a finite amount >= 0"));
        }
    }

    if !input.tax_rate.is_finite() || !(0.0..=1.0).contains(&input.tax_rate) {
        return Err(PlannerError::invalid("tax_rate", "must be between 0 and 1"));
    }
    if !input.investment_return_rate.is_finite()
        || !(0.0..=100.0).contains(&input.investment_return_rate)
    {
        return Err(PlannerError::invalid(
            "investment_return_rate",
            "must be between 0 and 100",
        ));
    }

    for (field, split) in [
        ("allocation.debt_phase", input.allocation.debt_phase),
        ("allocation.emergency_phase", input.allocation.emergency_phase),
        (
            "allocation.retirement_phase",
            input.allocation.retirement_phase,
        ),
    ] {
        validate_split(field, split)?;
    }

    let config = &input.config;
    if !config.emergency_fund_months.is_finite() || config.emergency_fund_months < 0.0 {
        return Err(PlannerError::invalid(
            "emergency_fund_months",
            "must be a finite value >= 0",
        ));
    }
    if !config.final_wealth_tolerance.is_finite() || config.final_wealth_tolerance < 0.0 {
        return Err(PlannerError::invalid(
            "final_wealth_tolerance",
            "must be a finite amount >= 0",
        ));
    }
    if !config.retirement_wealth_multiple.is_finite() || config.retirement_wealth_multiple < 0.0 {
        return Err(PlannerError::invalid(
            "retirement_wealth_multiple",
            "must be a finite value >= 0",
        ));
    }
    if config.default_retirement_age > MAX_AGE {
        return Err(PlannerError::invalid(
            "default_retirement_age",
            format!("must be <= {MAX_AGE}"),
        ));
    }

    Ok(())
}

fn validate_split(field: &'static str, split: AllocationSplit) -> PlannerResult<()> {
    for pct in [split.debt, split.savings, split.investments] {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(PlannerError::invalid(
                field,
                "percentages must be between 0 and 100",
            ));
        }
    }
    Ok(())
}
