use crate::users::repo_types::{Role, Status};
use serde::{Deserialize, Serialize};

/// Request body for user registration. Role and status may be supplied by
/// seeding tools; normal signups leave them at the defaults.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<Status>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after registration, login or refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
