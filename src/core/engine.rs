use super::error::PlannerResult;
use super::types::{AllocationTable, FinancialState, Phase, SimulationInput, YearResult};
use super::validate::validate_input;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub debt_payment: f64,
    pub savings_contribution: f64,
    pub investment_contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Withdrawal {
    pub savings_withdrawal: f64,
    pub investment_sale: f64,
}

impl Withdrawal {
    fn total(self) -> f64 {
        self.savings_withdrawal + self.investment_sale
    }
}

#[derive(Debug, Clone, Copy)]
struct InvestmentIncome {
    gross: f64,
    net: f64,
}

pub fn classify_phase(debt: f64, savings: f64, emergency_fund_target: f64) -> Phase {
    if debt > 0.0 {
        Phase::Debt
    } else if savings < emergency_fund_target {
        Phase::Emergency
    } else {
        Phase::Retirement
    }
}

pub fn allocate(
    free_capital: f64,
    phase: Phase,
    table: &AllocationTable,
    current_debt: f64,
) -> Allocation {
    let split = table.split_for(phase);
    let raw_debt = free_capital * (split.debt / 100.0);

    // Contributions keep the sign of free capital; only debt is bounded.

    Allocation {
        debt_payment: raw_debt.max(0.0).min(current_debt.max(0.0)),
        savings_contribution: free_capital * (split.savings / 100.0),
        investment_contribution: free_capital * (split.investments / 100.0),
    }
}

/// Savings are drawn before investments are sold.
pub fn withdraw(
    annual_expenses: f64,
    investment_net_income: f64,
    savings: f64,
    investments: f64,
    years_remaining: u32,
) -> Withdrawal {
    let shortfall = annual_expenses - investment_net_income;
    if shortfall <= 0.0 {
        return Withdrawal {
            savings_withdrawal: 0.0,
            investment_sale: 0.0,
        };
    }

    // years_remaining == 0 reserves nothing, same as 1.
    let future_expenses_needed = ((years_remaining as f64 - 1.0) * annual_expenses).max(0.0);
    let max_withdrawal = (savings + investments - future_expenses_needed).max(0.0);
    let actual_withdrawal = shortfall.min(max_withdrawal);

    let savings_withdrawal = actual_withdrawal.min(savings.max(0.0));
    let investment_sale = (actual_withdrawal - savings_withdrawal).max(0.0);

    Withdrawal {
        savings_withdrawal,
        investment_sale,
    }
}

fn investment_income(input: &SimulationInput, investments: f64) -> InvestmentIncome {
    let gross = investments * (input.investment_return_rate / 100.0);
    InvestmentIncome {
        gross,
        net: gross * (1.0 - input.tax_rate),
    }
}

pub fn process_year(
    input: &SimulationInput,
    state: FinancialState,
    age: u32,
    retirement_age: u32,
) -> YearResult {
    let emergency_fund_target = input.emergency_fund_target();
    let is_retired = age >= retirement_age;

    if age == input.current_age {
        return YearResult {
            age,
            debt: state.debt,
            savings: state.savings,
            investments: state.investments,
            is_retired,
            free_capital: 0.0,
            investment_gross_income: 0.0,
            investment_net_income: 0.0,
            savings_withdrawal: 0.0,
            investment_sale: 0.0,
            phase: classify_phase(state.debt, state.savings, emergency_fund_target),
        };
    }

    if is_retired {
        run_retired_year(input, state, age, emergency_fund_target)
    } else {
        run_working_year(input, state, age, emergency_fund_target)
    }
}

fn run_working_year(
    input: &SimulationInput,
    state: FinancialState,
    age: u32,
    emergency_fund_target: f64,
) -> YearResult {
    let year_index = age.saturating_sub(input.current_age);
    let income = investment_income(input, state.investments);
    let free_capital =
        input.net_salary_monthly(year_index) * 12.0 - input.annual_expenses() + income.net;

    let allocation_phase = classify_phase(state.debt, state.savings, emergency_fund_target);
    let allocation = allocate(
        free_capital,
        allocation_phase,
        &input.allocation,
        state.debt,
    );

    let debt = (state.debt - allocation.debt_payment).max(0.0);
    let savings = state.savings + allocation.savings_contribution;
    let investments = state.investments + allocation.investment_contribution;

    YearResult {
        age,
        debt,
        savings,
        investments,
        is_retired: false,
        free_capital,
        investment_gross_income: income.gross,
        investment_net_income: income.net,
        savings_withdrawal: 0.0,
        investment_sale: 0.0,
        phase: classify_phase(debt, savings, emergency_fund_target),
    }
}

fn run_retired_year(
    input: &SimulationInput,
    state: FinancialState,
    age: u32,
    emergency_fund_target: f64,
) -> YearResult {
    let income = investment_income(input, state.investments);
    let withdrawal = withdraw(
        input.annual_expenses(),
        income.net,
        state.savings,
        state.investments,
        input.lifespan.saturating_sub(age),
    );

    YearResult {
        age,
        debt: state.debt,
        savings: state.savings - withdrawal.savings_withdrawal,
        investments: state.investments - withdrawal.investment_sale,
        is_retired: true,
        free_capital: 0.0 - withdrawal.total(),
        investment_gross_income: income.gross,
        investment_net_income: income.net,
        savings_withdrawal: withdrawal.savings_withdrawal,
        investment_sale: withdrawal.investment_sale,
        phase: classify_phase(state.debt, state.savings, emergency_fund_target),
    }
}

pub fn simulate(input: &SimulationInput, retirement_age: u32) -> PlannerResult<Vec<YearResult>> {
    validate_input(input)?;
    Ok(run_trajectory(input, retirement_age))
}

pub(crate) fn run_trajectory(input: &SimulationInput, retirement_age: u32) -> Vec<YearResult> {
    let mut state = input.initial_state();
    let mut years = Vec::with_capacity((input.lifespan - input.current_age + 1) as usize);

    for age in input.current_age..=input.lifespan {
        let year = process_year(input, state, age, retirement_age);
        state = year.state();
        years.push(year);
    }

    years
}
