use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::payroll::{PayrollEntry, PayrollRunSummary, PayrollTotals};
use crate::payroll::service::{PayrollService, Preview};

const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    /// Payroll cycle identifier, e.g. a month
    #[schema(example = "2024-01")]
    pub period: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = 50)]
    pub limit: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApprovePayroll {
    #[schema(example = "2024-01")]
    #[serde(default)]
    pub period: String,
    /// Replace an existing run for the same period
    #[schema(example = false)]
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct ApprovePerson {
    #[schema(example = "2024-01")]
    #[serde(default)]
    pub period: String,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    pub entries: Vec<PayrollEntry>,
    pub totals: PayrollTotals,
}

#[derive(Serialize, ToSchema)]
pub struct ApprovePersonResponse {
    #[schema(example = "Approved Jane Doe for 2024-01")]
    pub message: String,
    pub period: String,
    pub entry: PayrollEntry,
    pub totals: PayrollTotals,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub runs: Vec<PayrollRunSummary>,
}

#[utoipa::path(
    get,
    path = "/api/payroll/preview",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Computed entries and totals, nothing stored", body = PreviewResponse),
        (status = 400, description = "Missing period"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_payroll(
    service: web::Data<PayrollService>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, AppError> {
    let period = query.period.as_deref().unwrap_or_default();
    let Preview { entries, totals } = service.preview(period).await?;

    Ok(HttpResponse::Ok().json(PreviewResponse { entries, totals }))
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = ApprovePayroll,
    responses(
        (status = 200, description = "Payroll approved", body = Object, example = json!({
            "message": "Payroll for 2024-01 approved successfully."
        })),
        (status = 400, description = "Missing period or no active personnel"),
        (status = 409, description = "Payroll already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn approve_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    body: web::Json<ApprovePayroll>,
) -> Result<HttpResponse, AppError> {
    let run = service
        .approve(&body.period, body.overwrite, &auth.identity())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Payroll for {} approved successfully.", run.period)
    })))
}

#[utoipa::path(
    post,
    path = "/api/payroll/approve/{personnel_id}",
    params(
        ("personnel_id" = u64, Path, description = "Roster id of the person to approve")
    ),
    request_body = ApprovePerson,
    responses(
        (status = 200, description = "Entry upserted into the period's run", body = ApprovePersonResponse),
        (status = 400, description = "Missing period or personnel inactive"),
        (status = 404, description = "Personnel not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn approve_person(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
    body: web::Json<ApprovePerson>,
) -> Result<HttpResponse, AppError> {
    let (entry, run) = service
        .approve_person(&body.period, path.into_inner(), &auth.identity())
        .await?;

    let who = if entry.name.is_empty() {
        entry.armynumber.clone()
    } else {
        entry.name.clone()
    };

    Ok(HttpResponse::Ok().json(ApprovePersonResponse {
        message: format!("Approved {} for {}", who, run.period),
        period: run.period,
        entry,
        totals: run.totals,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/run",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Full run with entries; empty entries when the period has no run", body = crate::model::payroll::PayrollRun),
        (status = 400, description = "Missing period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll_run(
    service: web::Data<PayrollService>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, AppError> {
    let period = query.period.as_deref().unwrap_or_default();

    match service.get_run(period).await? {
        Some(run) => Ok(HttpResponse::Ok().json(run)),
        None => Ok(HttpResponse::Ok().json(json!({
            "period": period.trim(),
            "entries": [],
            "totals": PayrollTotals::default(),
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/payroll/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Runs newest first, without entries", body = HistoryResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payroll_history(
    service: web::Data<PayrollService>,
    config: web::Data<Config>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(config.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);
    let runs = service.history(limit).await?;

    Ok(HttpResponse::Ok().json(HistoryResponse { runs }))
}
