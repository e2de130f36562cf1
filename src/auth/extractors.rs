use crate::auth::claims::Claims;
use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

/// Bearer-token extractor. The claims are trusted exactly as issued and are
/// not re-checked against the store, so an account blocked after issuance
/// keeps authenticating until the token expires.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            warn!("malformed Authorization header");
            ApiError::Unauthorized("invalid Authorization header".into())
        })?;

        let claims = keys.verify(token)?;
        Ok(AuthUser(claims))
    }
}
