use crate::auth::Claims;
use crate::error::ApiError;
use crate::users::repo;
use crate::users::repo_types::{Role, Status, User};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

/// What a cascade deletion removed. `user` is `None` when the id matched
/// nothing; the counts are all zero in that case.
#[derive(Debug)]
pub struct CascadeOutcome {
    pub user: Option<User>,
    pub comments: u64,
    pub likes: u64,
    pub items: u64,
    pub collections: u64,
}

/// Admin gate for the management endpoints. Checks the role carried by the
/// caller's token.
pub fn ensure_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role != Role::Admin {
        warn!(user_id = %claims.sub, "admin endpoint called without ADMIN role");
        return Err(ApiError::Forbidden("admin role required".into()));
    }
    Ok(())
}

/// Remove a user and everything it owns, all-or-nothing.
///
/// A single transaction covers comments, likes, items under the user's
/// collections, the collections, and finally the user row, so a failure
/// partway cannot leave orphaned rows. Idempotent on a missing id: every
/// count comes back zero and no error is raised.
pub async fn delete_user(db: &PgPool, id: Uuid) -> Result<CascadeOutcome, ApiError> {
    let mut tx = db.begin().await?;

    let user = repo::fetch_for_delete(&mut tx, id).await?;
    let comments = repo::delete_comments_by_user(&mut tx, id).await?;
    let likes = repo::delete_likes_by_user(&mut tx, id).await?;
    let items = repo::delete_items_of_user(&mut tx, id).await?;
    let collections = repo::delete_collections_by_user(&mut tx, id).await?;
    repo::delete_user_row(&mut tx, id).await?;

    tx.commit().await?;

    let outcome = CascadeOutcome {
        user,
        comments,
        likes,
        items,
        collections,
    };
    info!(
        user_id = %id,
        found = outcome.user.is_some(),
        comments = outcome.comments,
        likes = outcome.likes,
        items = outcome.items,
        collections = outcome.collections,
        "cascade deletion finished"
    );
    Ok(outcome)
}

/// Single-field status update. A missing id is surfaced as `NotFound` rather
/// than a silent zero-row update.
pub async fn set_status(db: &PgPool, id: Uuid, status: Status) -> Result<u64, ApiError> {
    let updated = repo::set_status(db, id, status).await?;
    if updated == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }
    info!(user_id = %id, status = ?status, "status updated");
    Ok(updated)
}

/// Single-field role update; same `NotFound` contract as `set_status`.
pub async fn set_role(db: &PgPool, id: Uuid, role: Role) -> Result<u64, ApiError> {
    let updated = repo::set_role(db, id, role).await?;
    if updated == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }
    info!(user_id = %id, role = ?role, "role updated");
    Ok(updated)
}

pub async fn list_users(db: &PgPool) -> Result<Vec<User>, ApiError> {
    Ok(repo::list_all(db).await?)
}
