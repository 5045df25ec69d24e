use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{patch, post},
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    cookies::{self, ACCESS_COOKIE, REFRESH_COOKIE},
    dto::{AuthResponse, ChangePasswordRequest, RefreshRequest, RefreshResponse, SignInRequest, SignUpRequest},
    extractors::{AuthUser, MaybeAuthUser},
    session::AuthSession,
};
use crate::{
    api::{ApiResponse, AppJson},
    config::Environment,
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-in-or-create", post(sign_in_or_create))
        .route("/auth/refresh", post(refresh))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/change-password", patch(change_password))
}

type CookiePair = AppendHeaders<[(HeaderName, String); 2]>;

/// Both credentials always travel together on sign-up/sign-in.
fn session_cookies(session: &AuthSession, env: Environment) -> CookiePair {
    AppendHeaders([
        (
            header::SET_COOKIE,
            cookies::token_cookie(ACCESS_COOKIE, &session.tokens.access, session.persistent, env),
        ),
        (
            header::SET_COOKIE,
            cookies::token_cookie(REFRESH_COOKIE, &session.tokens.refresh, session.persistent, env),
        ),
    ])
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.sign_up(payload.into()).await?;
    let cookies = session_cookies(&session, state.config.environment);
    Ok((
        StatusCode::CREATED,
        cookies,
        Json(ApiResponse::ok(
            "User created successfully",
            AuthResponse::new(session, None),
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.sign_in(payload.into()).await?;
    let cookies = session_cookies(&session, state.config.environment);
    Ok((
        StatusCode::OK,
        cookies,
        Json(ApiResponse::ok(
            "User signed in successfully",
            AuthResponse::new(session, None),
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn sign_in_or_create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (session, created) = state.sessions.sign_in_or_create(payload.into()).await?;
    let cookies = session_cookies(&session, state.config.environment);
    let (status, message) = if created {
        (StatusCode::CREATED, "User created and signed in successfully")
    } else {
        (StatusCode::OK, "User signed in successfully")
    };
    Ok((
        status,
        cookies,
        Json(ApiResponse::ok(message, AuthResponse::new(session, Some(created)))),
    ))
}

/// Body `refresh_token` first, then the `refresh_token` cookie.
#[instrument(skip(state, headers, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let from_body = payload.and_then(|Json(body)| body.refresh_token);
    let token = from_body
        .as_deref()
        .or_else(|| cookies::read_cookie(&headers, REFRESH_COOKIE));

    let refreshed = state.sessions.refresh(token).await?;
    debug!(user_id = %refreshed.user_id, persistent = refreshed.persistent, "access cookie reissued");
    let cookie = cookies::token_cookie(
        ACCESS_COOKIE,
        &refreshed.access,
        refreshed.persistent,
        state.config.environment,
    );
    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::ok(
            "Access token refreshed",
            RefreshResponse {
                access: refreshed.access,
            },
        )),
    ))
}

/// Stateless: clears both cookies. Tokens already handed out stay valid
/// until they expire.
#[instrument(skip(state))]
pub async fn sign_out(
    State(state): State<AppState>,
    MaybeAuthUser(user_id): MaybeAuthUser,
) -> impl IntoResponse {
    state.sessions.sign_out(user_id);
    let env = state.config.environment;
    (
        StatusCode::OK,
        AppendHeaders([
            (header::SET_COOKIE, cookies::clear_cookie(ACCESS_COOKIE, env)),
            (header::SET_COOKIE, cookies::clear_cookie(REFRESH_COOKIE, env)),
        ]),
        Json(ApiResponse::ok("User signed out successfully", ())),
    )
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .sessions
        .change_password(
            user_id,
            payload.old_password.as_deref(),
            payload.new_password.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok("Password changed successfully", ())))
}
