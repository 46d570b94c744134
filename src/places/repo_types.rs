use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::geocode::Coordinates;

#[derive(Debug, Clone, FromRow)]
pub struct PlaceRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
    pub creator: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: Coordinates,
    pub image: String,
    pub creator: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PlaceRow> for Place {
    fn from(r: PlaceRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            address: r.address,
            location: Coordinates { lat: r.lat, lng: r.lng },
            image: r.image,
            creator: r.creator,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPlace {
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: Coordinates,
    pub image: String,
    pub creator: Uuid,
}
