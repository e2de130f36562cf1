use axum::{
    extract::{Query, State},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    users::{
        dto::{IdQuery, RoleUpdateRequest, StatusUpdateRequest, UpdateResponse},
        repo_types::User,
        services,
    },
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users).delete(delete_user))
        .route("/user/status", put(change_status))
        .route("/user/role", put(change_role))
}

#[instrument(skip(state, claims))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    services::ensure_admin(&claims)?;
    let users = services::list_users(&state.db).await?;
    Ok(Json(users))
}

/// Returns the deleted user record, or `null` when the id matched nothing.
#[instrument(skip(state, claims))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<Option<User>>, ApiError> {
    services::ensure_admin(&claims)?;
    let outcome = services::delete_user(&state.db, query.id).await?;
    Ok(Json(outcome.user))
}

#[instrument(skip(state, claims, payload))]
pub async fn change_status(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<IdQuery>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    services::ensure_admin(&claims)?;
    let updated = services::set_status(&state.db, query.id, payload.status).await?;
    Ok(Json(UpdateResponse { updated }))
}

#[instrument(skip(state, claims, payload))]
pub async fn change_role(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<IdQuery>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    services::ensure_admin(&claims)?;
    let updated = services::set_role(&state.db, query.id, payload.role).await?;
    Ok(Json(UpdateResponse { updated }))
}
