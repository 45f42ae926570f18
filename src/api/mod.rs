use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, error::ErrorKind};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AllocationSplit, AllocationTable, CandidateResult, PhaseOrganization, PlanSummary,
    PlannerConfig, PlannerError, PlannerResult, SimulationInput, YearResult,
    organize, search_retirement_age, simulate, summarize, validate_input,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    current_age: Option<u32>,
    lifespan: Option<u32>,
    gross_salary_monthly: Option<f64>,
    tax_rate: Option<f64>,
    investment_return_rate: Option<f64>,
    monthly_expenses: Option<f64>,
    debt: Option<f64>,
    savings: Option<f64>,
    investments: Option<f64>,

    debt_phase_debt: Option<f64>,
    debt_phase_savings: Option<f64>,
    debt_phase_investments: Option<f64>,
    emergency_phase_debt: Option<f64>,
    emergency_phase_savings: Option<f64>,
    emergency_phase_investments: Option<f64>,
    retirement_phase_debt: Option<f64>,
    retirement_phase_savings: Option<f64>,
    retirement_phase_investments: Option<f64>,

    emergency_fund_months: Option<f64>,
    retirement_test_buffer: Option<u32>,
    default_retirement_age: Option<u32>,
    retirement_safety_buffer: Option<u32>,
    final_wealth_tolerance: Option<f64>,
    retirement_wealth_multiple: Option<f64>,
    tax_free_years: Option<u32>,

    retirement_age: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "wealth-planner",
    about = "Deterministic wealth trajectory planner (debt payoff, emergency fund, retirement)"
)]
pub struct Cli {
    #[arg(long, default_value_t = 30)]
    current_age: u32,
    #[arg(long, default_value_t = 85, help = "Age to plan through")]
    lifespan: u32,
    #[arg(long, default_value_t = 5000.0)]
    gross_salary_monthly: f64,
    #[arg(
        long,
        default_value_t = 25.0,
        help = "Flat income tax rate in percent, applied to salary after the tax-free years and to investment income"
    )]
    tax_rate: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Annual investment return in percent"
    )]
    investment_return_rate: f64,
    #[arg(long, default_value_t = 3000.0)]
    monthly_expenses: f64,
    #[arg(long, default_value_t = 0.0, help = "Outstanding debt today")]
    debt: f64,
    #[arg(long, default_value_t = 0.0, help = "Liquid savings today")]
    savings: f64,
    #[arg(long, default_value_t = 0.0, help = "Invested balance today")]
    investments: f64,

    #[arg(
        long,
        default_value_t = 80.0,
        help = "Debt phase: percent of free capital paying down debt"
    )]
    debt_phase_debt: f64,
    #[arg(long, default_value_t = 10.0)]
    debt_phase_savings: f64,
    #[arg(long, default_value_t = 10.0)]
    debt_phase_investments: f64,
    #[arg(long, default_value_t = 0.0)]
    emergency_phase_debt: f64,
    #[arg(
        long,
        default_value_t = 80.0,
        help = "Emergency phase: percent of free capital added to savings"
    )]
    emergency_phase_savings: f64,
    #[arg(long, default_value_t = 20.0)]
    emergency_phase_investments: f64,
    #[arg(long, default_value_t = 0.0)]
    retirement_phase_debt: f64,
    #[arg(long, default_value_t = 10.0)]
    retirement_phase_savings: f64,
    #[arg(
        long,
        default_value_t = 90.0,
        help = "Retirement phase: percent of free capital invested"
    )]
    retirement_phase_investments: f64,

    #[arg(
        long,
        default_value_t = 6.0,
        help = "Months of expenses the emergency fund must hold"
    )]
    emergency_fund_months: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Latest retirement age tested is lifespan minus this many years"
    )]
    retirement_test_buffer: u32,
    #[arg(
        long,
        default_value_t = 65,
        help = "Retirement age used when no tested age is sustainable"
    )]
    default_retirement_age: u32,
    #[arg(
        long,
        default_value_t = 10,
        help = "Fallback retirement age is capped at lifespan minus this many years"
    )]
    retirement_safety_buffer: u32,
    #[arg(
        long,
        default_value_t = 5000.0,
        help = "How far below zero final wealth may end for an age to count as sustainable"
    )]
    final_wealth_tolerance: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Years of expenses required in hand at retirement"
    )]
    retirement_wealth_multiple: f64,
    #[arg(
        long,
        default_value_t = 2,
        help = "Initial working years paid without income tax"
    )]
    tax_free_years: u32,
    #[arg(
        long,
        help = "Simulate this retirement age instead of searching for the optimal one"
    )]
    retirement_age: Option<u32>,
}

#[derive(Debug)]
struct ApiRequest {
    input: SimulationInput,
    retirement_age: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    retirement_age: u32,
    optimal: bool,
    final_wealth: f64,
    emergency_fund_target: f64,
    summary: PlanSummary,
    phases: PhaseOrganization,
    years: Vec<YearResult>,
    candidates: Vec<CandidateResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_inputs(cli: &Cli) -> PlannerResult<SimulationInput> {
    if !cli.tax_rate.is_finite() || !(0.0..=100.0).contains(&cli.tax_rate) {
        return Err(PlannerError::invalid(
            "--tax-rate",
            "must be between 0 and 100",
        ));
    }

    let input = SimulationInput {
        current_age: cli.current_age,
        lifespan: cli.lifespan,
        gross_salary_monthly: cli.gross_salary_monthly,
        tax_rate: cli.tax_rate / 100.0,
        investment_return_rate: cli.investment_return_rate,
        monthly_expenses: cli.monthly_expenses,
        initial_debt: cli.debt,
        initial_savings: cli.savings,
        initial_investments: cli.investments,
        allocation: AllocationTable {
            debt_phase: AllocationSplit {
                debt: cli.debt_phase_debt,
                savings: cli.debt_phase_savings,
                investments: cli.debt_phase_investments,
            },
            emergency_phase: AllocationSplit {
                debt: cli.emergency_phase_debt,
                savings: cli.emergency_phase_savings,
                investments: cli.emergency_phase_investments,
            },
            retirement_phase: AllocationSplit {
                debt: cli.retirement_phase_debt,
                savings: cli.retirement_phase_savings,
                investments: cli.retirement_phase_investments,
            },
        },
        config: PlannerConfig {
            emergency_fund_months: cli.emergency_fund_months,
            retirement_test_buffer: cli.retirement_test_buffer,
            default_retirement_age: cli.default_retirement_age,
            retirement_safety_buffer: cli.retirement_safety_buffer,
            final_wealth_tolerance: cli.final_wealth_tolerance,
            retirement_wealth_multiple: cli.retirement_wealth_multiple,
            tax_free_years: cli.tax_free_years,
        },
    };
    validate_input(&input)?;
    Ok(input)
}

fn build_plan_response(
    input: &SimulationInput,
    retirement_age: Option<u32>,
) -> PlannerResult<PlanResponse> {
    let (retirement_age, optimal, years, candidates) = match retirement_age {
        Some(age) => {
            if age < input.current_age || age > input.lifespan {
                return Err(PlannerError::invalid(
                    "retirement_age",
                    "must be between current_age and lifespan",
                ));
            }
            (age, false, simulate(input, age)?, Vec::new())
        }
        None => {
            let search = search_retirement_age(input)?;
            (
                search.optimal.age,
                true,
                search.optimal.simulation,
                search.candidates,
            )
        }
    };

    let emergency_fund_target = input.emergency_fund_target();
    let summary = summarize(&years, input);
    Ok(PlanResponse {
        retirement_age,
        optimal,
        final_wealth: summary.final_wealth,
        emergency_fund_target,
        summary,
        phases: organize(&years, emergency_fund_target),
        years,
        candidates,
    })
}

/// Parses planner flags from `args` and renders the plan as JSON.
pub fn run_cli<I, T>(args: I) -> PlannerResult<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            PlannerError::Help(e.render().to_string())
        }
        _ => PlannerError::Usage(e.render().to_string()),
    })?;
    let input = build_inputs(&cli)?;
    let response = build_plan_response(&input, cli.retirement_age)?;
    render_json(&response)
}

fn render_json<T: Serialize>(value: &T) -> PlannerResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| PlannerError::Render(e.to_string()))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("wealth planner API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let result = api_request_from_payload(payload)
        .and_then(|request| build_plan_response(&request.input, request.retirement_age));

    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            log::warn!("rejected plan request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: PlanPayload) -> PlannerResult<ApiRequest> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.lifespan {
        cli.lifespan = v;
    }
    if let Some(v) = payload.gross_salary_monthly {
        cli.gross_salary_monthly = v;
    }
    if let Some(v) = payload.tax_rate {
        cli.tax_rate = v;
    }
    if let Some(v) = payload.investment_return_rate {
        cli.investment_return_rate = v;
    }
    if let Some(v) = payload.monthly_expenses {
        cli.monthly_expenses = v;
    }
    if let Some(v) = payload.debt {
        cli.debt = v;
    }
    if let Some(v) = payload.savings {
        cli.savings = v;
    }
    if let Some(v) = payload.investments {
        cli.investments = v;
    }

    if let Some(v) = payload.debt_phase_debt {
        cli.debt_phase_debt = v;
    }
    if let Some(v) = payload.debt_phase_savings {
        cli.debt_phase_savings = v;
    }
    if let Some(v) = payload.debt_phase_investments {
        cli.debt_phase_investments = v;
    }
    if let Some(v) = payload.emergency_phase_debt {
        cli.emergency_phase_debt = v;
    }
    if let Some(v) = payload.emergency_phase_savings {
        cli.emergency_phase_savings = v;
    }
    if let Some(v) = payload.emergency_phase_investments {
        cli.emergency_phase_investments = v;
    }
    if let Some(v) = payload.retirement_phase_debt {
        cli.retirement_phase_debt = v;
    }
    if let Some(v) = payload.retirement_phase_savings {
        cli.retirement_phase_savings = v;
    }
    if let Some(v) = payload.retirement_phase_investments {
        cli.retirement_phase_investments = v;
    }

    if let Some(v) = payload.emergency_fund_months {
        cli.emergency_fund_months = v;
    }
    if let Some(v) = payload.retirement_test_buffer {
        cli.retirement_test_buffer = v;
    }
    if let Some(v) = payload.default_retirement_age {
        cli.default_retirement_age = v;
    }
    if let Some(v) = payload.retirement_safety_buffer {
        cli.retirement_safety_buffer = v;
    }
    if let Some(v) = payload.final_wealth_tolerance {
        cli.final_wealth_tolerance = v;
    }
    if let Some(v) = payload.retirement_wealth_multiple {
        cli.retirement_wealth_multiple = v;
    }
    if let Some(v) = payload.tax_free_years {
        cli.tax_free_years = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = Some(v);
    }

    let input = build_inputs(&cli)?;
    Ok(ApiRequest {
        input,
        retirement_age: cli.retirement_age,
    })
}

fn default_cli_for_api() -> Cli {
    Cli::parse_from(["wealth-planner"])
}
