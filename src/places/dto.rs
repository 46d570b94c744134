use serde::{Deserialize, Serialize};

use super::repo_types::Place;

#[derive(Debug, Serialize)]
pub struct PlacesResponse {
    pub places: Vec<Place>,
}

#[derive(Debug, Serialize)]
pub struct PlaceResponse {
    pub place: Place,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
