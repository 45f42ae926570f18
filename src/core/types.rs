use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PlannerError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Debt,
    Emergency,
    Retirement,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Debt => "debt",
            Phase::Emergency => "emergency",
            Phase::Retirement => "retirement",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debt" => Ok(Phase::Debt),
            "emergency" => Ok(Phase::Emergency),
            "retirement" => Ok(Phase::Retirement),
            _ => Err(PlannerError::UnknownPhase(s.to_string())),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationSplit {
    pub debt: f64,
    pub savings: f64,
    pub investments: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTable {
    pub debt_phase: AllocationSplit,
    pub emergency_phase: AllocationSplit,
    pub retirement_phase: AllocationSplit,
}

impl AllocationTable {
    pub fn split_for(&self, phase: Phase) -> AllocationSplit {
        match phase {
            Phase::Debt => self.debt_phase,
            Phase::Emergency => self.emergency_phase,
            Phase::Retirement => self.retirement_phase,
        }
    }
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self {
            debt_phase: AllocationSplit {
                debt: 80.0,
                savings: 10.0,
                investments: 10.0,
            },
            emergency_phase: AllocationSplit {
                debt: 0.0,
                savings: 80.0,
                investments: 20.0,
            },
            retirement_phase: AllocationSplit {
                debt: 0.0,
                savings: 10.0,
                investments: 90.0,
            },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    pub emergency_fund_months: f64,
    pub retirement_test_buffer: u32,
    pub default_retirement_age: u32,
    pub retirement_safety_buffer: u32,
    pub final_wealth_tolerance: f64,
    pub retirement_wealth_multiple: f64,
    pub tax_free_years: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            emergency_fund_months: 6.0,
            retirement_test_buffer: 5,
            default_retirement_age: 65,
            retirement_safety_buffer: 10,
            final_wealth_tolerance: 5_000.0,
            retirement_wealth_multiple: 2.0,
            tax_free_years: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    pub current_age: u32,
    pub lifespan: u32,
    pub gross_salary_monthly: f64,
    /// Flat income tax rate as a fraction (0-1).
    pub tax_rate: f64,
    /// Annual investment return in percentage points (6 means 6%).
    pub investment_return_rate: f64,
    pub monthly_expenses: f64,
    pub initial_debt: f64,
    pub initial_savings: f64,
    pub initial_investments: f64,
    pub allocation: AllocationTable,
    pub config: PlannerConfig,
}

impl SimulationInput {
    pub fn annual_expenses(&self) -> f64 {
        self.monthly_expenses * 12.0
    }

    pub fn emergency_fund_target(&self) -> f64 {
        self.monthly_expenses * self.config.emergency_fund_months
    }

    pub fn net_salary_monthly(&self, year_index: u32) -> f64 {
        if year_index <= self.config.tax_free_years {
            self.gross_salary_monthly
        } else {
            self.gross_salary_monthly * (1.0 - self.tax_rate)
        }
    }

    pub fn initial_state(&self) -> FinancialState {
        FinancialState {
            debt: self.initial_debt,
            savings: self.initial_savings,
            investments: self.initial_investments,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FinancialState {
    pub debt: f64,
    pub savings: f64,
    pub investments: f64,
}

impl FinancialState {
    pub fn total_wealth(&self) -> f64 {
        self.savings + self.investments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub age: u32,
    pub debt: f64,
    pub savings: f64,
    pub investments: f64,
    pub is_retired: bool,
    pub free_capital: f64,
    pub investment_gross_income: f64,
    pub investment_net_income: f64,
    pub savings_withdrawal: f64,
    pub investment_sale: f64,
    pub phase: Phase,
}

impl YearResult {
    pub fn total_wealth(&self) -> f64 {
        self.savings + self.investments
    }

    pub fn state(&self) -> FinancialState {
        FinancialState {
            debt: self.debt,
            savings: self.savings,
            investments: self.investments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizedYear {
    #[serde(flatten)]
    pub year: YearResult,
    pub years_from_now: u32,
    pub debt_payment: f64,
    pub savings_contribution: f64,
    pub investment_contribution: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOrganization {
    pub debt: Vec<OrganizedYear>,
    pub emergency: Vec<OrganizedYear>,
    pub retirement: Vec<OrganizedYear>,
    pub post_retirement: Vec<OrganizedYear>,
    pub debt_free_age: Option<u32>,
    pub emergency_fund_age: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub age: u32,
    pub final_wealth: f64,
    pub retirement_wealth: f64,
    pub distance_from_zero: f64,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimalRetirementResult {
    pub age: u32,
    pub simulation: Vec<YearResult>,
    pub final_wealth: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetirementSearch {
    pub optimal: OptimalRetirementResult,
    pub candidates: Vec<CandidateResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub retirement_age: Option<u32>,
    pub debt_free_age: Option<u32>,
    pub emergency_fund_age: Option<u32>,
    pub retirement_wealth: Option<f64>,
    pub final_wealth: f64,
    pub peak_wealth: f64,
    pub peak_wealth_age: u32,
    pub shortfall_years: u32,
}
