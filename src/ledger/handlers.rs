use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::{BalanceResponse, RecordEventRequest}, repo_types::Metric};
use crate::{
    api::{ApiResponse, AppJson},
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(record_event))
        .route("/events/stats", get(event_stats))
        .route("/events/metric/:metric", get(list_by_metric))
        .route("/events/balance/:metric", get(net_balance))
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let events = state.ledger.history(user_id, None).await?;
    Ok(Json(ApiResponse::data(events)))
}

#[instrument(skip(state))]
pub async fn list_by_metric(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(metric): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let events = state.ledger.history(user_id, Some(&metric)).await?;
    Ok(Json(ApiResponse::data(events)))
}

#[instrument(skip(state, payload))]
pub async fn record_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<RecordEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(metric), Some(kind), Some(value)) = (payload.metric, payload.kind, payload.value) else {
        return Err(AppError::validation("Metric, type and value are required"));
    };
    let entry = state.ledger.record_event(user_id, &metric, &kind, value).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Event recorded", entry)),
    ))
}

#[instrument(skip(state))]
pub async fn event_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.ledger.stats(user_id).await?;
    Ok(Json(ApiResponse::data(stats)))
}

#[instrument(skip(state))]
pub async fn net_balance(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(metric): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let net_balance = state.ledger.net_balance(user_id, &metric).await?;
    let metric: Metric = metric.parse()?;
    Ok(Json(ApiResponse::data(BalanceResponse {
        metric,
        net_balance,
    })))
}
