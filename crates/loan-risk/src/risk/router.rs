use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::assessment::{AssessmentError, AssessmentState};
use super::client::{RiskEngine, ServiceError};
use super::domain::{quote_installment, ApplicantRecord, LoanTerm};
use super::service::DashboardService;
use super::settings::{FallbackStore, RiskPolicy};
use super::validation::ValidationError;

/// Router builder exposing the dashboard core over HTTP.
pub fn dashboard_router<E, C>(service: Arc<DashboardService<E, C>>) -> Router
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    Router::new()
        .route("/api/v1/installment", post(installment_handler))
        .route("/api/v1/assessments", post(assessment_handler::<E, C>))
        .route(
            "/api/v1/settings",
            get(settings_handler::<E, C>).put(save_settings_handler::<E, C>),
        )
        .route(
            "/api/v1/settings/reset",
            post(reset_settings_handler::<E, C>),
        )
        .route(
            "/api/v1/settings/reload",
            post(reload_settings_handler::<E, C>),
        )
        .route("/api/v1/stats", get(stats_handler::<E, C>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstallmentRequest {
    pub(crate) loan_amnt: f64,
    pub(crate) int_rate: f64,
    pub(crate) term_months: LoanTerm,
}

#[derive(Debug, Serialize)]
pub(crate) struct InstallmentResponse {
    pub(crate) installment: f64,
}

pub(crate) async fn installment_handler(Json(request): Json<InstallmentRequest>) -> Response {
    match quote_installment(request.loan_amnt, request.int_rate, request.term_months) {
        Ok(installment) => {
            (StatusCode::OK, Json(InstallmentResponse { installment })).into_response()
        }
        Err(err) => validation_response(&err),
    }
}

pub(crate) async fn assessment_handler<E, C>(
    State(service): State<Arc<DashboardService<E, C>>>,
    Json(applicant): Json<ApplicantRecord>,
) -> Response
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    let result = service.assess(&applicant).await;
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(AssessmentError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(AssessmentError::Service(err)) => service_status(err),
    };

    (status, Json(AssessmentState::from(result))).into_response()
}

pub(crate) async fn settings_handler<E, C>(
    State(service): State<Arc<DashboardService<E, C>>>,
) -> Response
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    (StatusCode::OK, Json(service.policy_snapshot())).into_response()
}

pub(crate) async fn save_settings_handler<E, C>(
    State(service): State<Arc<DashboardService<E, C>>>,
    Json(policy): Json<RiskPolicy>,
) -> Response
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    match service.save_policy(policy).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => validation_response(&err),
    }
}

pub(crate) async fn reset_settings_handler<E, C>(
    State(service): State<Arc<DashboardService<E, C>>>,
) -> Response
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    service.reset_policy();
    (StatusCode::OK, Json(service.policy_snapshot())).into_response()
}

pub(crate) async fn reload_settings_handler<E, C>(
    State(service): State<Arc<DashboardService<E, C>>>,
) -> Response
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    service.reload_policy().await;
    (StatusCode::OK, Json(service.policy_snapshot())).into_response()
}

pub(crate) async fn stats_handler<E, C>(
    State(service): State<Arc<DashboardService<E, C>>>,
) -> Response
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    match service.portfolio_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (service_status(&err), Json(payload)).into_response()
        }
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
        ServiceError::Unavailable { .. } | ServiceError::Rejected { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn validation_response(err: &ValidationError) -> Response {
    let payload = json!({
        "error": err.to_string(),
        "field": err.field(),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}
