use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::{
    Category, ComparisonEntry, ComparisonInputs, EscalatingPlan, FixedPlan, FreeformPlan,
    GoalPlan, MAX_PERIODS, PERIODS_PER_YEAR, PlanDescription, PlanError, compare_plans, project,
};
use crate::report::render_csv;
use crate::store::LocalStore;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub data_file: Option<PathBuf>,
}

pub struct AppState {
    store: Mutex<LocalStore>,
}

impl AppState {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum PlanKind {
    Fixed,
    Escalating,
    Freeform,
    Goal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPlanKind {
    #[serde(alias = "sip")]
    Fixed,
    #[serde(alias = "stepUp", alias = "step-up", alias = "step_up")]
    Escalating,
    #[serde(alias = "flexible")]
    Freeform,
    #[serde(alias = "target")]
    Goal,
}

impl From<ApiPlanKind> for PlanKind {
    fn from(value: ApiPlanKind) -> Self {
        match value {
            ApiPlanKind::Fixed => PlanKind::Fixed,
            ApiPlanKind::Escalating => PlanKind::Escalating,
            ApiPlanKind::Freeform => PlanKind::Freeform,
            ApiPlanKind::Goal => PlanKind::Goal,
        }
    }
}

/// Freeform amounts arrive either as a JSON array or, from query strings, as
/// a comma-separated list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ContributionsInput {
    List(Vec<serde_json::Value>),
    Csv(String),
}

impl ContributionsInput {
    fn into_amounts(self) -> Vec<f64> {
        match self {
            ContributionsInput::List(values) => values.iter().map(coerce_amount).collect(),
            ContributionsInput::Csv(raw) => raw
                .split(',')
                .map(|part| part.trim().parse::<f64>().unwrap_or(0.0))
                .collect(),
        }
    }
}

fn coerce_amount(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    kind: Option<ApiPlanKind>,
    amount: Option<f64>,
    years: Option<u32>,
    #[serde(alias = "periods")]
    period_count: Option<u32>,
    category: Option<String>,
    escalation_rate: Option<f64>,
    contributions: Option<ContributionsInput>,
    target_value: Option<f64>,
    inflation_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    amount: Option<f64>,
    years: Option<u32>,
    escalation_rate: Option<f64>,
    inflation_rate: Option<f64>,
}

#[derive(Debug, Clone)]
struct PlanParams {
    kind: PlanKind,
    amount: f64,
    period_count: u32,
    category: Category,
    escalation_rate: f64,
    contributions: Vec<f64>,
    target_value: f64,
    inflation_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    amount: f64,
    years: u32,
    escalation_rate: f64,
    inflation_rate: f64,
    entries: Vec<ComparisonEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_params_for_api() -> PlanParams {
    PlanParams {
        kind: PlanKind::Fixed,
        amount: 10_000.0,
        period_count: 10 * PERIODS_PER_YEAR,
        category: Category::default(),
        escalation_rate: 10.0,
        contributions: Vec::new(),
        target_value: 1_000_000.0,
        inflation_rate: 0.0,
    }
}

fn params_from_payload(payload: PlanPayload) -> Result<PlanParams, PlanError> {
    let mut params = default_params_for_api();

    if let Some(v) = payload.kind {
        params.kind = v.into();
    }
    if let Some(v) = payload.amount {
        params.amount = v;
    }
    if let Some(v) = payload.years {
        params.period_count = years_to_periods(v)?;
    }
    if let Some(v) = payload.period_count {
        params.period_count = v;
    }
    if let Some(v) = payload.category {
        params.category = Category::from_key(&v);
    }
    if let Some(v) = payload.escalation_rate {
        params.escalation_rate = v;
    }
    if let Some(v) = payload.contributions {
        params.contributions = v.into_amounts();
        if payload.years.is_none() && payload.period_count.is_none() {
            params.period_count = params.contributions.len() as u32;
        }
    }
    if let Some(v) = payload.target_value {
        params.target_value = v;
    }
    if let Some(v) = payload.inflation_rate {
        params.inflation_rate = v;
    }

    Ok(params)
}

fn years_to_periods(years: u32) -> Result<u32, PlanError> {
    years
        .checked_mul(PERIODS_PER_YEAR)
        .filter(|periods| *periods <= MAX_PERIODS)
        .ok_or_else(|| {
            PlanError::invalid(
                "years",
                format!("must be <= {}", MAX_PERIODS / PERIODS_PER_YEAR),
            )
        })
}

fn build_plan(params: PlanParams) -> Result<PlanDescription, PlanError> {
    let plan = match params.kind {
        PlanKind::Fixed => PlanDescription::Fixed(FixedPlan {
            amount: params.amount,
            period_count: params.period_count,
            category: params.category,
            inflation_rate: params.inflation_rate,
        }),
        PlanKind::Escalating => PlanDescription::Escalating(EscalatingPlan {
            initial_amount: params.amount,
            period_count: params.period_count,
            escalation_rate: params.escalation_rate,
            inflation_rate: params.inflation_rate,
        }),
        PlanKind::Freeform => PlanDescription::Freeform(FreeformPlan {
            contributions: params.contributions,
            period_count: params.period_count,
            inflation_rate: params.inflation_rate,
        }),
        PlanKind::Goal => PlanDescription::Goal(GoalPlan {
            target_value: params.target_value,
            period_count: params.period_count,
            category: params.category,
            inflation_rate: params.inflation_rate,
        }),
    };
    plan.validate()?;
    Ok(plan)
}

fn plan_from_payload(payload: PlanPayload) -> Result<PlanDescription, PlanError> {
    build_plan(params_from_payload(payload)?)
}

fn comparison_from_payload(payload: ComparePayload) -> Result<ComparisonInputs, PlanError> {
    let defaults = default_params_for_api();
    let inputs = ComparisonInputs {
        amount: payload.amount.unwrap_or(defaults.amount),
        years: payload
            .years
            .unwrap_or(defaults.period_count / PERIODS_PER_YEAR),
        escalation_rate: payload.escalation_rate.unwrap_or(defaults.escalation_rate),
        inflation_rate: payload.inflation_rate.unwrap_or(defaults.inflation_rate),
    };

    // Every compared plan shares these fields, so the escalating plan carries
    // the strictest checks.
    PlanDescription::Escalating(EscalatingPlan {
        initial_amount: inputs.amount,
        period_count: years_to_periods(inputs.years)?,
        escalation_rate: inputs.escalation_rate,
        inflation_rate: inputs.inflation_rate,
    })
    .validate()?;

    Ok(inputs)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/goal", get(goal_get_handler).post(goal_post_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route(
            "/api/history",
            get(history_list_handler).post(history_save_handler),
        )
        .route(
            "/api/history/:id",
            get(history_get_handler).delete(history_delete_handler),
        )
        .route("/api/history/:id/report", get(history_report_handler))
        .route(
            "/api/draft",
            get(draft_get_handler)
                .put(draft_put_handler)
                .delete(draft_delete_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let store = match &config.data_file {
        Some(path) => LocalStore::open(path),
        None => LocalStore::in_memory(),
    };
    let state = Arc::new(AppState::new(store));
    let addr = SocketAddr::new(config.bind, config.port);
    if !config.bind.is_loopback() {
        warn!(%addr, "binding to a non-loopback address");
    }

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection API listening");

    axum::serve(listener, router(state)).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: PlanPayload) -> Response {
    let plan = match plan_from_payload(payload) {
        Ok(plan) => plan,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    debug!(kind = plan.kind_name(), periods = plan.period_count(), "projecting plan");
    json_response(StatusCode::OK, project(&plan))
}

async fn goal_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    goal_handler_impl(payload)
}

async fn goal_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    goal_handler_impl(payload)
}

fn goal_handler_impl(mut payload: PlanPayload) -> Response {
    payload.kind = Some(ApiPlanKind::Goal);
    project_handler_impl(payload)
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload)
}

fn compare_handler_impl(payload: ComparePayload) -> Response {
    let inputs = match comparison_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    debug!(amount = inputs.amount, years = inputs.years, "comparing plans");
    let response = CompareResponse {
        amount: inputs.amount,
        years: inputs.years,
        escalation_rate: inputs.escalation_rate,
        inflation_rate: inputs.inflation_rate,
        entries: compare_plans(&inputs),
    };
    json_response(StatusCode::OK, response)
}

async fn history_list_handler(State(state): State<Arc<AppState>>) -> Response {
    let store = state.store.lock().await;
    json_response(StatusCode::OK, store.list())
}

async fn history_save_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlanPayload>,
) -> Response {
    let plan = match plan_from_payload(payload) {
        Ok(plan) => plan,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    let outcome = project(&plan);
    let record = state.store.lock().await.save(plan, outcome, Utc::now());
    info!(id = %record.id, "saved projection");
    json_response(StatusCode::CREATED, record)
}

async fn history_get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    let store = state.store.lock().await;
    match store.get(id) {
        Some(record) => json_response(StatusCode::OK, record),
        None => error_response(StatusCode::NOT_FOUND, "No saved projection with that id"),
    }
}

async fn history_delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.store.lock().await.delete(id) {
        debug!(%id, "deleted projection");
        no_content()
    } else {
        error_response(StatusCode::NOT_FOUND, "No saved projection with that id")
    }
}

async fn history_report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    let store = state.store.lock().await;
    let Some(record) = store.get(id) else {
        return error_response(StatusCode::NOT_FOUND, "No saved projection with that id");
    };
    match render_csv(&record.plan, &record.result, Utc::now()) {
        Ok(csv) => {
            let disposition = format!("attachment; filename=\"projection-{id}.csv\"");
            let mut response = with_cache_control((
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                csv,
            ));
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(err) => {
            warn!(%id, error = %err, "report export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Report export failed")
        }
    }
}

async fn draft_get_handler(State(state): State<Arc<AppState>>) -> Response {
    let mut store = state.store.lock().await;
    match store.draft(Utc::now()) {
        Some(draft) => json_response(StatusCode::OK, draft),
        None => error_response(StatusCode::NOT_FOUND, "No draft saved"),
    }
}

async fn draft_put_handler(
    State(state): State<Arc<AppState>>,
    Json(plan): Json<serde_json::Value>,
) -> Response {
    state.store.lock().await.put_draft(plan, Utc::now());
    no_content()
}

async fn draft_delete_handler(State(state): State<Arc<AppState>>) -> Response {
    state.store.lock().await.clear_draft();
    no_content()
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn no_content() -> Response {
    with_cache_control(StatusCode::NO_CONTENT)
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
fn plan_from_json(json: &str) -> Result<PlanDescription, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_from_payload(payload).map_err(|e| e.to_string())
}
