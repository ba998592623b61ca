//! Free-text address resolution.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::offer::GeoPoint;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves an address to a coordinate. An address with no match is an `Upstream` error.
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError>;
}

/// Nominatim search client. Coordinates come back as decimal strings.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(url: String, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build geocoding HTTP client")?;
        Ok(Self { client, url })
    }
}

fn parse_place(place: &Place) -> Option<GeoPoint> {
    let lon = place.lon.trim().parse::<f64>().ok()?;
    let lat = place.lat.trim().parse::<f64>().ok()?;
    Some(GeoPoint { lon, lat })
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                warn!("Geocoding request failed: {e}");
                AppError::Upstream(format!("geocoding failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Geocoder returned {status} for '{address}'");
            return Err(AppError::Upstream(format!("geocoder returned {status}")));
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid geocoder response: {e}")))?;

        let point = places
            .first()
            .and_then(parse_place)
            .ok_or_else(|| AppError::Upstream(format!("address not found: {address}")))?;

        debug!("Geocoded '{address}' to {:?}", point);
        Ok(point)
    }
}
