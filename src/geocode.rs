use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeocoderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the provider has no match for the address.
    async fn locate(&self, address: &str) -> anyhow::Result<Option<Coordinates>>;
}

/// LocationIQ forward geocoding.
pub struct LocationIq {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl LocationIq {
    pub fn new(cfg: &GeocoderConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build geocoder http client")?;
        Ok(Self {
            http,
            url: cfg.url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    lat: String,
    lon: String,
}

fn first_hit(hits: &[Hit]) -> anyhow::Result<Option<Coordinates>> {
    let Some(hit) = hits.first() else {
        return Ok(None);
    };
    let lat = hit.lat.parse::<f64>().context("latitude")?;
    let lng = hit.lon.parse::<f64>().context("longitude")?;
    Ok(Some(Coordinates { lat, lng }))
}

#[async_trait]
impl Geocoder for LocationIq {
    async fn locate(&self, address: &str) -> anyhow::Result<Option<Coordinates>> {
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("format", "json"),
                ("q", address),
            ])
            .send()
            .await
            .context("locationiq request")?;

        // LocationIQ answers 404 "Unable to geocode" for unknown addresses.
        if res.status() == StatusCode::NOT_FOUND {
            debug!(%address, "no geocoding match");
            return Ok(None);
        }
        let hits: Vec<Hit> = res
            .error_for_status()
            .context("locationiq status")?
            .json()
            .await
            .context("locationiq body")?;
        first_hit(&hits)
    }
}
