use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    #[serde(rename = "creator")]
    pub owner_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_year: i32,
    pub country: String,
    pub address: String,
    pub image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct ProfileFields {
    pub owner_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_year: i32,
    pub country: String,
    pub address: String,
    pub image: String,
}

/// Row returned by the upsert, with whether it was freshly inserted.
#[derive(Debug, FromRow)]
pub(crate) struct UpsertedProfile {
    #[sqlx(flatten)]
    pub profile: Profile,
    pub inserted: bool,
}
