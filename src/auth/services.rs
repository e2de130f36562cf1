use crate::auth::claims::Claims;
use crate::auth::dto::{LoginRequest, RegisterRequest, TokenResponse};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::users::repo;
use crate::users::repo_types::{Role, Status, User};
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}

/// Create an account and hand back a token for it. Fails fast on empty or
/// malformed input before any store access.
pub async fn register(
    db: &PgPool,
    keys: &JwtKeys,
    mut req: RegisterRequest,
) -> Result<TokenResponse, ApiError> {
    req.email = req.email.trim().to_lowercase();

    if req.email.is_empty() || req.password.is_empty() {
        warn!("registration with empty email or password");
        return Err(ApiError::Validation("email and password are required".into()));
    }
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }

    if repo::find_by_email(db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&req.password)?;
    let user = match repo::create(
        db,
        &req.email,
        &hash,
        req.first_name.as_deref(),
        req.role.unwrap_or(Role::User),
        req.status.unwrap_or(Status::Active),
    )
    .await
    {
        Ok(u) => u,
        // Lost the race against a concurrent registration for the same email.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %req.email, "email already registered");
            return Err(ApiError::Conflict("email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let token = keys.issue(&user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(TokenResponse { token })
}

/// Verify credentials and issue a token from the current record.
///
/// The status check strictly precedes password comparison: a blocked user
/// gets `Forbidden` whether or not the password is right.
pub async fn login(
    db: &PgPool,
    keys: &JwtKeys,
    mut req: LoginRequest,
) -> Result<TokenResponse, ApiError> {
    req.email = req.email.trim().to_lowercase();

    let user = repo::find_by_email(db, &req.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %req.email, "login unknown email");
            ApiError::NotFound("user not found".into())
        })?;

    authorize_login(&user, &req.password)?;

    let token = keys.issue(&user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(TokenResponse { token })
}

/// The status gate runs strictly before password comparison, so a blocked
/// account is refused without ever touching the stored hash.
fn authorize_login(user: &User, password: &str) -> Result<(), ApiError> {
    if user.status == Status::Blocked {
        warn!(user_id = %user.id, "login attempt on blocked account");
        return Err(ApiError::Forbidden("account is blocked".into()));
    }

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("wrong password".into()));
    }
    Ok(())
}

/// Re-sign the caller's current claims with a fresh expiry. Pure re-signing:
/// stale role or status in the presented claims survives this call.
pub fn refresh(keys: &JwtKeys, claims: &Claims) -> Result<TokenResponse, ApiError> {
    let token = keys.reissue(claims)?;
    Ok(TokenResponse { token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::extract::FromRef;

    fn fake_parts() -> (PgPool, JwtKeys) {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        (state.db, keys)
    }

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            first_name: None,
            role: None,
            status: None,
        }
    }

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("a@no-dot"));
    }

    // These fail before any store access, so the lazy pool is never touched.

    #[tokio::test]
    async fn register_rejects_empty_email() {
        let (db, keys) = fake_parts();
        let err = register(&db, &keys, register_req("", "pw1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_empty_password() {
        let (db, keys) = fake_parts();
        let err = register(&db, &keys, register_req("a@x.com", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let (db, keys) = fake_parts();
        let err = register(&db, &keys, register_req("not-an-email", "pw1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    fn stored_user(status: Status, password_hash: &str) -> User {
        User {
            id: uuid::Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: password_hash.into(),
            first_name: None,
            role: Role::User,
            status,
            created_at: time::OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn login_accepts_active_user_with_correct_password() {
        let hash = crate::auth::password::hash_password("pw1").expect("hash");
        let user = stored_user(Status::Active, &hash);
        assert!(authorize_login(&user, "pw1").is_ok());
    }

    #[test]
    fn login_rejects_wrong_password_with_unauthorized() {
        let hash = crate::auth::password::hash_password("pw1").expect("hash");
        let user = stored_user(Status::Active, &hash);
        let err = authorize_login(&user, "pw2").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn blocked_user_gets_forbidden_even_with_correct_password() {
        let hash = crate::auth::password::hash_password("pw1").expect("hash");
        let user = stored_user(Status::Blocked, &hash);
        let err = authorize_login(&user, "pw1").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn blocked_check_short_circuits_before_password_comparison() {
        // An unparsable stored hash would error out of verify_password, so
        // getting Forbidden proves the status gate ran first.
        let user = stored_user(Status::Blocked, "not-a-parsable-hash");
        let err = authorize_login(&user, "whatever").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[derive(Debug)]
    struct StubDbError {
        unique: bool,
    }

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stub database error")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    #[test]
    fn duplicate_key_errors_map_to_conflict() {
        let dup = sqlx::Error::Database(Box::new(StubDbError { unique: true }));
        assert!(is_unique_violation(&dup));
    }

    #[test]
    fn other_store_errors_are_not_conflicts() {
        let other = sqlx::Error::Database(Box::new(StubDbError { unique: false }));
        assert!(!is_unique_violation(&other));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn refresh_is_pure_resigning() {
        let (_, keys) = fake_parts();
        let user = crate::users::repo_types::User {
            id: uuid::Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "irrelevant".into(),
            first_name: None,
            role: Role::User,
            status: Status::Active,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let token = keys.issue(&user).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        let renewed = refresh(&keys, &claims).expect("refresh");
        let renewed_claims = keys.verify(&renewed.token).expect("verify renewed");
        assert_eq!(renewed_claims.sub, claims.sub);
        assert_eq!(renewed_claims.role, claims.role);
        assert_eq!(renewed_claims.status, claims.status);
    }
}
