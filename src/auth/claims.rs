use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity facts carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
    pub image: Option<String>,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,             // user ID
    pub email: String,         // user email at issue time
    pub image: Option<String>, // profile image URL, if any
    pub iat: usize,            // issued at (unix timestamp)
    pub exp: usize,            // expires at (unix timestamp)
    pub iss: String,           // issuer
    pub aud: String,           // audience
}

impl Claims {
    pub fn session(&self) -> SessionClaims {
        SessionClaims {
            user_id: self.sub,
            email: self.email.clone(),
            image: self.image.clone(),
        }
    }
}

/// Verified identity handed to handlers behind the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: Uuid,
    pub email: String,
    pub image: Option<String>,
}

impl From<Claims> for IdentityContext {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.sub,
            email: c.email,
            image: c.image,
        }
    }
}
