use crate::users::repo_types::{Role, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `?id=` query parameter used by the admin endpoints.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Status,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub updated: u64,
}
