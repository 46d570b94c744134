use uuid::Uuid;

use super::AuthError;

/// Allows the action only when the acting user created the resource.
pub fn authorize(creator_id: Uuid, actor_id: Uuid, denied: &'static str) -> Result<(), AuthError> {
    if creator_id == actor_id {
        Ok(())
    } else {
        Err(AuthError::Forbidden(denied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_is_allowed() {
        let id = Uuid::new_v4();
        assert!(authorize(id, id, "no").is_ok());
    }

    #[test]
    fn equal_ids_from_different_representations_match() {
        let stored = Uuid::new_v4();
        let from_token = Uuid::parse_str(&stored.hyphenated().to_string().to_uppercase()).unwrap();
        assert!(authorize(stored, from_token, "no").is_ok());
    }

    #[test]
    fn someone_else_is_forbidden() {
        let err = authorize(Uuid::new_v4(), Uuid::new_v4(), "You are not allowed").unwrap_err();
        assert_eq!(err, AuthError::Forbidden("You are not allowed"));
    }
}
