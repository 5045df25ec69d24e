use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::UpdateProfileRequest, repo_types::PublicUser};
use crate::{
    api::{ApiResponse, AppJson},
    auth::extractors::AuthUser,
    db::StoreError,
    error::AppError,
    state::AppState,
};

const USER_NOT_FOUND: &str = "User not found";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(me).patch(update_me))
        .route("/users/me/gamification", get(my_gamification))
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<PublicUser> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(Json(ApiResponse::data(users)))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    Ok(Json(ApiResponse::data(PublicUser::from(user))))
}

#[instrument(skip(state))]
pub async fn my_gamification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    Ok(Json(ApiResponse::data(user.gamification)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changes = payload.validate()?;
    let user = state
        .users
        .update_profile(user_id, &changes)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict("Email is already in use".into()),
            other => other.into(),
        })?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    info!(%user_id, "profile updated");
    Ok(Json(ApiResponse::ok(
        "User updated successfully",
        PublicUser::from(user),
    )))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    Ok(Json(ApiResponse::data(PublicUser::from(user))))
}
