use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use cookie::Cookie;
use tracing::warn;

use super::{claims::IdentityContext, jwt::TokenKeys, AuthError, SESSION_COOKIE};
use crate::error::AppError;

/// Reads the session token out of the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for cookie in Cookie::split_parse(raw).flatten() {
            if cookie.name() == SESSION_COOKIE && !cookie.value().is_empty() {
                return Some(cookie.value().to_string());
            }
        }
    }
    None
}

pub fn identify(headers: &HeaderMap, keys: &TokenKeys) -> Result<IdentityContext, AuthError> {
    let token = session_token(headers).ok_or(AuthError::Missing)?;
    let claims = keys.verify(&token)?;
    Ok(claims.into())
}

/// The auth gate. A handler taking this argument only runs for a caller
/// holding a valid session cookie; the token is verified once, here.
///
/// CORS pre-flight `OPTIONS` requests are answered by the CORS layer in
/// front of the router and never reach an extractor.
pub struct AuthUser(pub IdentityContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        match identify(&parts.headers, &keys) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(e) => {
                warn!(reason = %e, method = %parts.method, uri = %parts.uri, "authentication failed");
                Err(e.into())
            }
        }
    }
}
