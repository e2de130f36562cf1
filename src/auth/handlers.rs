use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/registration", post(register))
        .route("/user/login", post(login))
        .route("/user/auth", get(refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let response = services::register(&state.db, &keys, payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let response = services::login(&state.db, &keys, payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, claims))]
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let response = services::refresh(&keys, &claims)?;
    Ok(Json(response))
}
