use serde::Serialize;

use super::repo_types::Profile;

/// Always a list, empty when the user has no profile yet.
#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub profile: Vec<Profile>,
}

#[derive(Debug, Serialize)]
pub struct SavedProfileResponse {
    pub message: &'static str,
    pub image: String,
}
