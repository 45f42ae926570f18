use super::types::{OrganizedYear, PhaseOrganization, PlanSummary, SimulationInput, YearResult};

// One cent of slack before a retired year counts as underfunded.
const SHORTFALL_EPS: f64 = 0.01;

#[derive(Debug, Default, Clone, Copy)]
struct Milestones {
    debt_free_age: Option<u32>,
    emergency_fund_age: Option<u32>,
}

impl Milestones {
    fn observe(&mut self, index: usize, year: &YearResult, emergency_fund_target: f64) {
        if index == 0 {
            return;
        }
        if self.debt_free_age.is_none() && year.debt <= 0.0 {
            self.debt_free_age = Some(year.age);
        }
        if self.emergency_fund_age.is_none() && year.savings >= emergency_fund_target {
            self.emergency_fund_age = Some(year.age);
        }
    }
}

fn milestones(trajectory: &[YearResult], emergency_fund_target: f64) -> Milestones {
    let mut milestones = Milestones::default();
    for (index, year) in trajectory.iter().enumerate() {
        milestones.observe(index, year, emergency_fund_target);
    }
    milestones
}

/// Buckets a trajectory by phase and annotates each row with its change
/// against the previous row.
pub fn organize(trajectory: &[YearResult], emergency_fund_target: f64) -> PhaseOrganization {
    let mut organization = PhaseOrganization::default();
    let Some(first) = trajectory.first() else {
        return organization;
    };
    let start_age = first.age;

    let mut previous: Option<&YearResult> = None;
    for year in trajectory {
        let (debt_payment, savings_contribution, investment_contribution) = match previous {
            Some(prev) => (
                (prev.debt - year.debt).max(0.0),
                year.savings - prev.savings,
                year.investments - prev.investments,
            ),
            None => (0.0, 0.0, 0.0),
        };
        previous = Some(year);

        let row = OrganizedYear {
            year: year.clone(),
            years_from_now: year.age.saturating_sub(start_age),
            debt_payment,
            savings_contribution,
            investment_contribution,
        };

        let bucket = if year.is_retired {
            &mut organization.post_retirement
        } else if year.debt > 0.0 {
            &mut organization.debt
        } else if year.savings < emergency_fund_target {
            &mut organization.emergency
        } else {
            &mut organization.retirement
        };
        bucket.push(row);
    }

    let reached = milestones(trajectory, emergency_fund_target);
    organization.debt_free_age = reached.debt_free_age;
    organization.emergency_fund_age = reached.emergency_fund_age;
    organization
}

pub fn summarize(trajectory: &[YearResult], input: &SimulationInput) -> PlanSummary {
    let reached = milestones(trajectory, input.emergency_fund_target());
    let annual_expenses = input.annual_expenses();
    let retirement_year = trajectory.iter().find(|year| year.is_retired);

    let mut peak_wealth = f64::NEG_INFINITY;
    let mut peak_wealth_age = input.current_age;
    for year in trajectory {
        if year.total_wealth() > peak_wealth {
            peak_wealth = year.total_wealth();
            peak_wealth_age = year.age;
        }
    }

    let shortfall_years = trajectory
        .iter()
        .skip(1)
        .filter(|year| year.is_retired)
        .filter(|year| {
            let covered =
                year.investment_net_income + year.savings_withdrawal + year.investment_sale;
            covered + SHORTFALL_EPS < annual_expenses
        })
        .count() as u32;

    PlanSummary {
        retirement_age: retirement_year.map(|year| year.age),
        debt_free_age: reached.debt_free_age,
        emergency_fund_age: reached.emergency_fund_age,
        retirement_wealth: retirement_year.map(YearResult::total_wealth),
        final_wealth: trajectory.last().map(YearResult::total_wealth).unwrap_or(0.0),
        peak_wealth: if peak_wealth.is_finite() { peak_wealth } else { 0.0 },
        peak_wealth_age,
        shortfall_years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::simulate;
    use crate::core::types::{AllocationTable, Phase, PlannerConfig};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn row(age: u32, debt: f64, savings: f64, investments: f64, is_retired: bool) -> YearResult {
        YearResult {
            age,
            debt,
            savings,
            investments,
            is_retired,
            free_capital: 0.0,
            investment_gross_income: 0.0,
            investment_net_income: 0.0,
            savings_withdrawal: 0.0,
            investment_sale: 0.0,
            phase: Phase::Debt,
        }
    }

    fn sample_input() -> SimulationInput {
        SimulationInput {
            current_age: 30,
            lifespan: 80,
            gross_salary_monthly: 5_000.0,
            tax_rate: 0.25,
            investment_return_rate: 5.0,
            monthly_expenses: 2_500.0,
            initial_debt: 25_000.0,
            initial_savings: 0.0,
            initial_investments: 0.0,
            allocation: AllocationTable::default(),
            config: PlannerConfig::default(),
        }
    }

    #[test]
    fn organize_buckets_rows_by_priority() {
        let trajectory = vec![
            row(30, 5_000.0, 0.0, 0.0, false),
            row(31, 0.0, 500.0, 100.0, false),
            row(32, 0.0, 1_500.0, 300.0, false),
            row(33, 0.0, 1_200.0, 200.0, true),
        ];
        let org = organize(&trajectory, 1_000.0);

        assert_eq!(org.debt.len(), 1);
        assert_eq!(org.emergency.len(), 1);
        assert_eq!(org.retirement.len(), 1);
        assert_eq!(org.post_retirement.len(), 1);
        assert_eq!(org.debt[0].year.age, 30);
        assert_eq!(org.emergency[0].year.age, 31);
        assert_eq!(org.retirement[0].year.age, 32);
        assert_eq!(org.post_retirement[0].year.age, 33);
    }

    #[test]
    fn organize_annotates_year_over_year_deltas() {
        let trajectory = vec![
            row(30, 5_000.0, 100.0, 0.0, false),
            row(31, 2_000.0, 400.0, 250.0, false),
            row(32, 2_500.0, 300.0, 250.0, false),
        ];
        let org = organize(&trajectory, 1_000.0);

        let first = &org.debt[0];
        assert_eq!(first.years_from_now, 0);
        assert_approx(first.debt_payment, 0.0);
        assert_approx(first.savings_contribution, 0.0);

        let second = &org.debt[1];
        assert_eq!(second.years_from_now, 1);
        assert_approx(second.debt_payment, 3_000.0);
        assert_approx(second.savings_contribution, 300.0);
        assert_approx(second.investment_contribution, 250.0);

        // Debt going up never reports a negative payment.
        let third = &org.debt[2];
        assert_approx(third.debt_payment, 0.0);
        assert_approx(third.savings_contribution, -100.0);
    }

    #[test]
    fn milestones_skip_first_row_and_latch() {
        let trajectory = vec![
            row(30, 0.0, 5_000.0, 0.0, false),
            row(31, 100.0, 500.0, 0.0, false),
            row(32, 0.0, 2_000.0, 0.0, false),
            row(33, 0.0, 500.0, 0.0, false),
            row(34, 0.0, 3_000.0, 0.0, false),
        ];
        let org = organize(&trajectory, 1_000.0);
        assert_eq!(org.debt_free_age, Some(32));
        assert_eq!(org.emergency_fund_age, Some(32));
    }

    #[test]
    fn milestones_stay_empty_when_never_reached() {
        let trajectory = vec![
            row(30, 5_000.0, 0.0, 0.0, false),
            row(31, 4_000.0, 10.0, 0.0, false),
        ];
        let org = organize(&trajectory, 1_000.0);
        assert_eq!(org.debt_free_age, None);
        assert_eq!(org.emergency_fund_age, None);
    }

    #[test]
    fn organize_empty_trajectory() {
        let org = organize(&[], 1_000.0);
        assert!(org.debt.is_empty());
        assert!(org.post_retirement.is_empty());
        assert_eq!(org.debt_free_age, None);
    }

    #[test]
    fn summarize_simulated_plan() {
        let input = sample_input();
        let years = simulate(&input, 60).expect("valid input");
        let summary = summarize(&years, &input);
        let org = organize(&years, input.emergency_fund_target());

        assert_eq!(summary.retirement_age, Some(60));
        assert_eq!(summary.debt_free_age, org.debt_free_age);
        assert_eq!(summary.emergency_fund_age, org.emergency_fund_age);
        assert!(summary.debt_free_age.is_some());
        assert!(summary.peak_wealth >= summary.final_wealth);
        assert_approx(summary.final_wealth, years[50].total_wealth());
        assert_approx(
            summary.retirement_wealth.expect("retired"),
            years[30].total_wealth(),
        );
    }

    #[test]
    fn summarize_counts_underfunded_retirement_years() {
        let trajectory = vec![
            row(60, 0.0, 50_000.0, 0.0, true),
            YearResult {
                savings_withdrawal: 30_000.0,
                ..row(61, 0.0, 20_000.0, 0.0, true)
            },
            YearResult {
                savings_withdrawal: 20_000.0,
                ..row(62, 0.0, 0.0, 0.0, true)
            },
            row(63, 0.0, 0.0, 0.0, true),
        ];
        let mut input = sample_input();
        input.current_age = 60;
        input.lifespan = 63;
        input.monthly_expenses = 2_500.0;

        let summary = summarize(&trajectory, &input);
        assert_eq!(summary.shortfall_years, 2);
        assert_eq!(summary.peak_wealth_age, 60);
        assert_approx(summary.peak_wealth, 50_000.0);
        assert_eq!(summary.retirement_age, Some(60));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_buckets_partition_the_trajectory(
            retirement_age in 31u32..80,
            salary in 0u32..12_000,
            expenses in 0u32..6_000,
            debt in 0u32..150_000
        ) {
            let mut input = sample_input();
            input.gross_salary_monthly = salary as f64;
            input.monthly_expenses = expenses as f64;
            input.initial_debt = debt as f64;
            let years = simulate(&input, retirement_age).expect("valid input");
            let org = organize(&years, input.emergency_fund_target());

            let total = org.debt.len() + org.emergency.len() + org.retirement.len()
                + org.post_retirement.len();
            prop_assert_eq!(total, years.len());
            prop_assert_eq!(org.post_retirement.len(), years.iter().filter(|y| y.is_retired).count());
            for bucket in [&org.debt, &org.emergency, &org.retirement, &org.post_retirement] {
                for pair in bucket.windows(2) {
                    prop_assert!(pair[0].year.age < pair[1].year.age);
                }
                for row in bucket.iter() {
                    prop_assert!(row.debt_payment >= 0.0);
                }
            }
        }
    }
}
