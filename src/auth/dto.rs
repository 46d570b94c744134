use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;
use crate::profiles::repo_types::Profile;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A user as clients see it: no password, profile populated.
#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefetchResponse {
    pub user_id: Uuid,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MsgResponse {
    pub msg: &'static str,
}
