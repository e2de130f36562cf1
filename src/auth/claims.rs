use crate::users::repo_types::{Role, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication. Carries the identity attributes the
/// record had at issue time; nothing here is re-read from the store on
/// verification, so a blocked or demoted account keeps its old claims until
/// the token expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,                  // user ID
    pub email: String,              // email at issue time
    pub first_name: Option<String>, // display name, if any
    pub role: Role,                 // role at issue time
    pub status: Status,             // status at issue time
    pub iat: usize,                 // issued at (unix timestamp)
    pub exp: usize,                 // expires at (unix timestamp)
}
