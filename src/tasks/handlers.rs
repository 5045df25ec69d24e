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
    dto::{CreateTaskRequest, UpdateTaskRequest},
    repo,
    repo_types::{Frequency, TaskStats},
    services,
};
use crate::{
    api::{ApiResponse, AppJson},
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

const TASK_NOT_FOUND: &str = "Task not found";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/stats", get(task_stats))
        .route("/tasks/frequency/:frequency", get(tasks_by_frequency))
        .route("/tasks/:id", get(get_task))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/:id", patch(update_task).delete(delete_task))
        .route("/tasks/:id/complete", patch(complete_task))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tasks = repo::list_by_user(&state.db, user_id, None).await?;
    Ok(Json(ApiResponse::ok("Tasks fetched successfully", tasks)))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let task = repo::find(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(TASK_NOT_FOUND))?;
    Ok(Json(ApiResponse::ok("Task fetched successfully", task)))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_task = payload.validate()?;
    let task = repo::insert(&state.db, user_id, &new_task).await?;
    info!(%user_id, task_id = %task.id, "task created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Task created successfully", task)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changes = payload.validate()?;
    let task = services::update_task(&state.db, user_id, id, &changes).await?;
    Ok(Json(ApiResponse::ok("Task updated successfully", task)))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let task = repo::delete(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(TASK_NOT_FOUND))?;
    info!(%user_id, task_id = %task.id, "task deleted");
    Ok(Json(ApiResponse::ok("Task deleted successfully", task)))
}

#[instrument(skip(state))]
pub async fn complete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = services::toggle_completion(&state.db, user_id, id).await?;
    let message = if outcome.task.completed {
        "Task completed successfully"
    } else {
        "Task uncompleted successfully"
    };
    Ok(Json(ApiResponse::ok(message, outcome)))
}

#[instrument(skip(state))]
pub async fn tasks_by_frequency(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(frequency): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let frequency: Frequency = frequency.parse()?;
    let tasks = repo::list_by_user(&state.db, user_id, Some(frequency)).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} tasks fetched successfully", frequency.as_str()),
        tasks,
    )))
}

#[instrument(skip(state))]
pub async fn task_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let counts = repo::counts(&state.db, user_id).await?;
    Ok(Json(ApiResponse::data(TaskStats::from(counts))))
}
