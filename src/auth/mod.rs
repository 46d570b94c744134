use crate::state::AppState;
use axum::Router;
use thiserror::Error;

mod claims;
mod dto;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;

pub use claims::IdentityContext;
pub use extractors::AuthUser;
pub use jwt::TokenKeys;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "jwtToken";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no session cookie")]
    Missing,
    #[error("invalid or expired session token")]
    Invalid,
    #[error("{0}")]
    Forbidden(&'static str),
}

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
