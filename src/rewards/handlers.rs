use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateRewardRequest, UpdateRewardRequest},
    repo,
    repo_types::RewardFilter,
    services,
};
use crate::{
    api::{ApiResponse, AppJson},
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

const REWARD_NOT_FOUND: &str = "Reward not found";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", get(list_rewards))
        .route("/rewards/available", get(available_rewards))
        .route("/rewards/claimed", get(claimed_rewards))
        .route("/rewards/:id", get(get_reward))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", post(create_reward))
        .route("/rewards/:id", patch(update_reward).delete(delete_reward))
        .route("/rewards/:id/claim", patch(claim_reward))
}

#[instrument(skip(state))]
pub async fn list_rewards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let rewards = repo::list_by_user(&state.db, user_id, RewardFilter::All).await?;
    Ok(Json(ApiResponse::ok("Rewards fetched successfully", rewards)))
}

#[instrument(skip(state))]
pub async fn available_rewards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let rewards = repo::list_by_user(&state.db, user_id, RewardFilter::Available).await?;
    Ok(Json(ApiResponse::ok(
        "Available rewards fetched successfully",
        rewards,
    )))
}

#[instrument(skip(state))]
pub async fn claimed_rewards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let rewards = repo::list_by_user(&state.db, user_id, RewardFilter::Claimed).await?;
    Ok(Json(ApiResponse::ok(
        "Claimed rewards fetched successfully",
        rewards,
    )))
}

#[instrument(skip(state))]
pub async fn get_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reward = repo::find(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(REWARD_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok("Reward fetched successfully", reward)))
}

#[instrument(skip(state, payload))]
pub async fn create_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateRewardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_reward = payload.validate()?;
    let reward = repo::insert(&state.db, user_id, &new_reward).await?;
    info!(%user_id, reward_id = %reward.id, "reward created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Reward created successfully", reward)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateRewardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changes = payload.validate()?;
    let reward = repo::update(&state.db, user_id, id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found(REWARD_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok("Reward updated successfully", reward)))
}

#[instrument(skip(state))]
pub async fn delete_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reward = repo::delete(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(REWARD_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok("Reward deleted successfully", reward)))
}

#[instrument(skip(state))]
pub async fn claim_reward(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = services::claim(&state.db, user_id, id).await?;
    Ok(Json(ApiResponse::ok("Reward claimed successfully", outcome)))
}
