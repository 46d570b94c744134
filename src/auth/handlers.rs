use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use cookie::{Cookie, SameSite};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::SessionClaims,
        dto::{LoginRequest, LoginResponse, MsgResponse, RefetchResponse, RegisterRequest, UserView},
        extractors::AuthUser,
        password::{hash_password_blocking, verify_password_blocking},
        repo::UserRepo,
        repo_types::{NewUser, User},
        SESSION_COOKIE,
    },
    config::CookieConfig,
    error::{parse_id, ApiJson, AppError, AppResult, ResultExt},
    places::repo::PlaceRepo,
    profiles::repo::ProfileRepo,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

/// Routes taking an `AuthUser` argument reject unauthenticated callers themselves.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/refetch", get(refetch))
        .route("/auth/user/:id", get(get_user).delete(delete_user))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() >= 5 && EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(token: String, cfg: &CookieConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::days(cfg.max_age_days))
        .secure(cfg.secure)
        .build()
}

fn cleared_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::ZERO)
        .same_site(SameSite::None)
        .secure(true)
        .build()
}

async fn view_of(state: &AppState, user: User) -> AppResult<UserView> {
    let profile = state
        .store
        .find_profile_by_owner(user.id)
        .await
        .or_internal("Something went wrong")?;
    Ok(UserView { user, profile })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MsgResponse>)> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);

    let short_password = payload.password.chars().count() < MIN_PASSWORD_LEN;
    if name.is_empty() || !is_valid_email(&email) || short_password {
        warn!(%email, "invalid registration input");
        return Err(AppError::invalid_inputs());
    }

    let existing = state
        .store
        .find_user_by_email(&email)
        .await
        .or_internal("Something went wrong")?;
    if existing.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("User exist already,please login.".into()));
    }

    let password_hash = hash_password_blocking(payload.password)
        .await
        .or_internal("Something went wrong")?;

    let created = state
        .store
        .create_user(NewUser {
            name,
            email: email.clone(),
            password_hash,
        })
        .await
        .or_internal("Something went wrong")?;

    // A concurrent registration may win between the lookup and the insert.
    let Some(user) = created else {
        warn!(%email, "email taken during registration");
        return Err(AppError::Conflict("User exist already,please login.".into()));
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(MsgResponse { msg: "New user created!" })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    let generic = state.config.policy.login_generic_errors;
    let rejected = |specific: &str| {
        AppError::Unauthorized(if generic { "Invalid credentials." } else { specific }.into())
    };

    let user = state
        .store
        .find_user_by_email(&email)
        .await
        .or_internal("Login failed.Please try again!")?
        .ok_or_else(|| {
            warn!(%email, "login unknown email");
            rejected("Invalid email.")
        })?;

    let ok = verify_password_blocking(payload.password, user.password_hash.clone())
        .await
        .or_internal("Could not log you in,please check your credentials and try again.")?;
    if !ok {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(rejected("Invalid password."));
    }

    let view = view_of(&state, user).await?;
    let token = state
        .keys
        .issue(&SessionClaims {
            user_id: view.user.id,
            email: view.user.email.clone(),
            image: view.profile.as_ref().map(|p| p.image.clone()),
        })
        .map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AppError::Internal("Something went wrong".into())
        })?;

    info!(user_id = %view.user.id, "user logged in");
    let cookie = session_cookie(token, &state.config.cookie);
    Ok((
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(LoginResponse { user: view }),
    ))
}

#[instrument]
pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, cleared_cookie().to_string())]),
        Json(MsgResponse { msg: "User logged out successfully!" }),
    )
}

#[instrument(skip(state))]
pub async fn refetch(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<RefetchResponse>> {
    let user = state
        .store
        .find_user_by_id(identity.user_id)
        .await
        .or_internal("Something went wrong")?
        .ok_or_else(|| AppError::NotFound("User not found!".into()))?;
    let profile = state
        .store
        .find_profile_by_owner(user.id)
        .await
        .or_internal("Something went wrong")?;

    Ok(Json(RefetchResponse {
        user_id: identity.user_id,
        email: identity.email,
        image: profile.map(|p| p.image),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserView>> {
    let id = parse_id(&id, "User not found!")?;
    let user = state
        .store
        .find_user_by_id(id)
        .await
        .or_internal("Something went wrong")?
        .ok_or_else(|| AppError::NotFound("User not found!".into()))?;
    Ok(Json(view_of(&state, user).await?))
}

/// Removes the profile, then the places, then the user. Not atomic: a failure
/// part way leaves the user row in place with some dependents already gone,
/// so the request can simply be retried.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MsgResponse>> {
    let id = parse_id(&id, "No user found for provided id")?;
    let user = state
        .store
        .find_user_by_id(id)
        .await
        .or_internal("Something went wrong")?
        .ok_or_else(|| AppError::NotFound("No user found for provided id".into()))?;

    let profiles = state
        .store
        .delete_profiles_by_owner(user.id)
        .await
        .or_internal("Something went wrong")?;
    let places = state
        .store
        .delete_places_by_creator(user.id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, profiles, "cascade stopped after profile delete");
            AppError::Internal("Something went wrong".into())
        })?;
    let deleted = state.store.delete_user(user.id).await.map_err(|e| {
        error!(error = %e, user_id = %user.id, profiles, places, "cascade stopped before user delete");
        AppError::Internal("Something went wrong".into())
    })?;
    if !deleted {
        return Err(AppError::NotFound("No user found for provided id".into()));
    }

    info!(user_id = %user.id, profiles, places, "user deleted");
    Ok(Json(MsgResponse { msg: "User deleted successfully." }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn email_is_case_normalized() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn session_cookie_attributes() {
        let cfg = CookieConfig {
            max_age_days: 30,
            secure: false,
        };
        let raw = session_cookie("tok".into(), &cfg).to_string();
        assert!(raw.starts_with("jwtToken=tok"));
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("Path=/"));
        assert!(raw.contains("Max-Age=2592000"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let raw = cleared_cookie().to_string();
        assert!(raw.starts_with("jwtToken=;"));
        assert!(raw.contains("Max-Age=0"));
    }
}
