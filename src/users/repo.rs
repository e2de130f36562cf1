use crate::users::repo_types::{Role, Status, User};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Find a user by email.
pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, first_name, role, status, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

/// Create a new user with an already-hashed password.
pub async fn create(
    db: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: Option<&str>,
    role: Role,
    status: Status,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, first_name, role, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, password_hash, first_name, role, status, created_at
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(role)
    .bind(status)
    .fetch_one(db)
    .await
}

/// All users, id ascending.
pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, first_name, role, status, created_at
        FROM users
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn set_status(db: &PgPool, id: Uuid, status: Status) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn set_role(db: &PgPool, id: Uuid, role: Role) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

// Cascade deletion steps. All run inside one transaction so a failure
// anywhere rolls the whole cascade back; dependency order is
// comments/likes first, then items under the user's collections, then the
// collections, then the user row.

pub async fn fetch_for_delete(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, first_name, role, status, created_at
        FROM users
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn delete_comments_by_user(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM comments WHERE user_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_likes_by_user(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Items hang off collections, not off the user directly.
pub async fn delete_items_of_user(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM items
        WHERE collection_id IN (SELECT id FROM collections WHERE user_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_collections_by_user(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM collections WHERE user_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_user_row(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}
