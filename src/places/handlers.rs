use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{MessageResponse, PlaceResponse, PlacesResponse, UpdatePlaceRequest};
use super::repo::PlaceRepo;
use super::repo_types::{NewPlace, Place};
use crate::{
    auth::{guard::authorize, repo::UserRepo, AuthUser},
    error::{parse_id, ApiJson, AppError, AppResult, ResultExt},
    images::services::{read_upload_form, store_image},
    state::AppState,
};

const NO_PLACES: &str = "Could not find places";
const NO_PLACE: &str = "Could not find place for the provided id.";

// --- routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/place", get(list_places))
}

pub fn write_routes(state: &AppState) -> Router<AppState> {
    let limit = state.config.upload_limit_mb * 1024 * 1024;
    Router::new()
        .route("/place", axum::routing::post(create_place))
        .route("/place/user/:id", get(list_user_places))
        .route(
            "/place/:id",
            get(get_place).patch(update_place).delete(delete_place),
        )
        .layer(DefaultBodyLimit::max(limit))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_places(State(state): State<AppState>) -> AppResult<Json<PlacesResponse>> {
    let places = state
        .store
        .list_places()
        .await
        .or_internal("Something went wrong.Try again.")?;
    if places.is_empty() {
        return Err(AppError::NotFound(NO_PLACES.into()));
    }
    Ok(Json(PlacesResponse { places }))
}

#[instrument(skip(state))]
pub async fn list_user_places(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<PlacesResponse>> {
    let creator = parse_id(&id, NO_PLACES)?;
    let places = state
        .store
        .list_places_by_creator(creator)
        .await
        .or_internal("Something went wrong.Try again.")?;
    if places.is_empty() {
        return Err(AppError::NotFound(NO_PLACES.into()));
    }
    Ok(Json(PlacesResponse { places }))
}

#[instrument(skip(state))]
pub async fn get_place(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<PlaceResponse>> {
    let id = parse_id(&id, NO_PLACE)?;
    let place = state
        .store
        .find_place(id)
        .await
        .or_internal("Something went wrong.Try again.")?
        .ok_or_else(|| AppError::NotFound(NO_PLACE.into()))?;
    Ok(Json(PlaceResponse { place }))
}

/// POST /place (multipart)
/// Fields: image (file), title, description, address.
#[instrument(skip(state, multipart))]
pub async fn create_place(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let mut form = read_upload_form(multipart).await?;
    let title = form.require("title")?;
    let description = form.require("description")?;
    let address = form.require("address")?;
    let image = form.require_image()?;

    state
        .store
        .find_user_by_id(identity.user_id)
        .await
        .or_internal("Creating place failed,please try again.")?
        .ok_or_else(|| AppError::NotFound("Could not find user".into()))?;

    let location = state
        .geocoder
        .locate(&address)
        .await
        .or_internal("Could not resolve the address,please try again.")?
        .ok_or_else(|| {
            warn!(%address, "address not geocodable");
            AppError::Validation("Could not find location for the specified address.".into())
        })?;

    let image = store_image(&state, "places", identity.user_id, image).await?;

    let place = state
        .store
        .create_place(NewPlace {
            title,
            description,
            address,
            location,
            image,
            creator: identity.user_id,
        })
        .await
        .or_internal("Creating place failed,please try again.")?;

    info!(place_id = %place.id, creator = %place.creator, "place created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "Place created successfully!" }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_place(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdatePlaceRequest>,
) -> AppResult<Json<Place>> {
    let title = payload.title.trim();
    let description = payload.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::invalid_inputs());
    }

    let id = parse_id(&id, NO_PLACE)?;
    let place = state
        .store
        .find_place(id)
        .await
        .or_internal("Something went wrong.Try again.")?
        .ok_or_else(|| AppError::NotFound(NO_PLACE.into()))?;

    authorize(place.creator, identity.user_id, "You are not allowed to edit this place")
        .inspect_err(|_| warn!(place_id = %place.id, user_id = %identity.user_id, "edit refused"))?;

    let updated = state
        .store
        .update_place(place.id, title, description)
        .await
        .or_internal("Something went wrong.")?
        .ok_or_else(|| AppError::NotFound(NO_PLACE.into()))?;

    info!(place_id = %updated.id, "place updated");
    Ok(Json(updated))
}

/// Any signed-in user may delete any place unless the owner-only policy is on.
#[instrument(skip(state))]
pub async fn delete_place(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, NO_PLACE)?;

    if state.config.policy.place_delete_requires_owner {
        let place = state
            .store
            .find_place(id)
            .await
            .or_internal("Something went wrong.Try again.")?
            .ok_or_else(|| AppError::NotFound(NO_PLACE.into()))?;
        authorize(place.creator, identity.user_id, "You are not allowed to delete this place")?;
    }

    let deleted = state
        .store
        .delete_place(id)
        .await
        .or_internal("Something went wrong.Try again.")?;
    if !deleted {
        return Err(AppError::NotFound(NO_PLACE.into()));
    }

    info!(place_id = %id, user_id = %identity.user_id, "place deleted");
    Ok(Json(MessageResponse { message: "Place deleted" }))
}
