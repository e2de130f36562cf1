use crate::auth::claims::Claims;
use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::User;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

/// Holds JWT signing and verification keys derived once from config.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::hours(cfg.ttl_hours),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
        let token = encode(&Header::default(), claims, &self.encoding)
            .map_err(anyhow::Error::new)?;
        debug!(user_id = %claims.sub, "jwt signed");
        Ok(token)
    }

    /// Issue a token embedding the record's identity fields as of now.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            role: user.role,
            status: user.status,
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
        };
        self.sign(&claims)
    }

    /// Re-sign presented claims verbatim with a fresh expiry. Identity fields
    /// are trusted as-is, not re-read from the store.
    pub fn reissue(&self, claims: &Claims) -> Result<String, ApiError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
            ..claims.clone()
        };
        self.sign(&claims)
    }

    /// Returns the embedded claims exactly as issued, or `InvalidToken` on a
    /// bad signature, malformed token, or passed expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            warn!(error = %e, "jwt verification failed");
            ApiError::InvalidToken
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::{Role, Status};
    use uuid::Uuid;

    fn make_keys(secret: &str, ttl_hours: i64) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_hours,
        })
    }

    fn make_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "irrelevant".into(),
            first_name: Some("Ada".into()),
            role: Role::Admin,
            status: Status::Active,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn issue_and_verify_roundtrips_all_claims() {
        let keys = make_keys("dev-secret", 24);
        let user = make_user();
        let token = keys.issue(&user).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.first_name, user.first_name);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.status, Status::Active);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_expired_token() {
        // Negative ttl puts exp two hours in the past, well beyond leeway.
        let keys = make_keys("dev-secret", -2);
        let token = keys.issue(&make_user()).expect("issue");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let good = make_keys("secret-one", 24);
        let bad = make_keys("secret-two", 24);
        let token = good.issue(&make_user()).expect("issue");
        let err = bad.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", 24);
        let err = keys.verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn reissue_preserves_identity_and_extends_expiry() {
        let keys = make_keys("dev-secret", 24);
        let user = make_user();
        let token = keys.issue(&user).expect("issue");
        let claims = keys.verify(&token).expect("verify");

        let renewed = keys.reissue(&claims).expect("reissue");
        let renewed_claims = keys.verify(&renewed).expect("verify renewed");
        assert_eq!(renewed_claims.sub, claims.sub);
        assert_eq!(renewed_claims.email, claims.email);
        assert_eq!(renewed_claims.first_name, claims.first_name);
        assert_eq!(renewed_claims.role, claims.role);
        assert_eq!(renewed_claims.status, claims.status);
        assert!(renewed_claims.exp >= claims.exp);
    }
}
