use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{ProfileListResponse, SavedProfileResponse};
use super::repo::ProfileRepo;
use super::repo_types::ProfileFields;
use crate::{
    auth::{repo::UserRepo, AuthUser},
    error::{AppError, AppResult, ResultExt},
    images::services::{read_upload_form, store_image, UploadForm},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/profile/:id", get(get_profile))
}

pub fn write_routes(state: &AppState) -> Router<AppState> {
    let limit = state.config.upload_limit_mb * 1024 * 1024;
    Router::new()
        .route("/profile", post(save_profile))
        .layer(DefaultBodyLimit::max(limit))
}

/// GET /profile/:id where `id` is the owning user's id.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProfileListResponse>> {
    let Ok(owner) = Uuid::parse_str(&id) else {
        return Ok(Json(ProfileListResponse { profile: Vec::new() }));
    };
    let profile = state
        .store
        .find_profile_by_owner(owner)
        .await
        .or_internal("Something went wrong.Try again.")?;
    Ok(Json(ProfileListResponse {
        profile: profile.into_iter().collect(),
    }))
}

fn birth_year(form: &UploadForm) -> AppResult<i32> {
    form.require("birthYear")?
        .parse::<i32>()
        .ok()
        .filter(|y| (1000..=9999).contains(y))
        .ok_or_else(AppError::invalid_inputs)
}

/// POST /profile (multipart)
/// Fields: image (file), firstName, lastName, birthYear, country, address.
#[instrument(skip(state, multipart))]
pub async fn save_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<SavedProfileResponse>)> {
    let mut form = read_upload_form(multipart).await?;
    let first_name = form.require("firstName")?;
    let last_name = form.require("lastName")?;
    let birth_year = birth_year(&form)?;
    let country = form.require("country")?;
    let address = form.require("address")?;
    let image = form.require_image()?;

    state
        .store
        .find_user_by_id(identity.user_id)
        .await
        .or_internal("Creating profile failed,please try again.")?
        .ok_or_else(|| {
            warn!(user_id = %identity.user_id, "profile for a deleted user");
            AppError::NotFound("Could not find user".into())
        })?;

    let image = store_image(&state, "profiles", identity.user_id, image).await?;

    let (profile, created) = state
        .store
        .upsert_profile(ProfileFields {
            owner_id: identity.user_id,
            first_name,
            last_name,
            birth_year,
            country,
            address,
            image,
        })
        .await
        .or_internal("Saving profile failed,please try again.")?;

    let message = if created {
        state
            .store
            .link_profile(identity.user_id, profile.id)
            .await
            .or_internal("Creating profile failed,please try again.")?;
        "Profile created successfully."
    } else {
        "Profile updated successfully."
    };

    info!(profile_id = %profile.id, owner = %identity.user_id, created, "profile saved");
    Ok((
        StatusCode::CREATED,
        Json(SavedProfileResponse {
            message,
            image: profile.image,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_owner_gets_empty_list() {
        let state = AppState::fake();
        let Json(res) = get_profile(State(state.clone()), Path(Uuid::new_v4().to_string()))
            .await
            .unwrap();
        assert!(res.profile.is_empty());

        let Json(res) = get_profile(State(state), Path("garbage".into())).await.unwrap();
        assert!(res.profile.is_empty());
    }

    #[tokio::test]
    async fn lists_the_owned_profile() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        state
            .store
            .upsert_profile(ProfileFields {
                owner_id: owner,
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                birth_year: 1815,
                country: "UK".into(),
                address: "London".into(),
                image: "https://images.test/ada.png".into(),
            })
            .await
            .unwrap();

        let Json(res) = get_profile(State(state), Path(owner.to_string())).await.unwrap();
        assert_eq!(res.profile.len(), 1);
        assert_eq!(res.profile[0].first_name, "Ada");
        assert_eq!(res.profile[0].owner_id, owner);
    }
}
