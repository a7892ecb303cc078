//! Reverse geocoding of shared locations.

use crate::classifier::Coordinates;
use crate::error::GeocodeError;
use async_trait::async_trait;
use rootcause::Report;
use serde::Deserialize;
use tracing::{instrument, warn};

/// Address component type that marks a place name worth showing.
const POLITICAL: &str = "political";

/// Trait for reverse geocoders.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves coordinates to a short place name.
    ///
    /// Returns `None` on any failure; lookups never fail a conversation.
    async fn reverse_lookup(&self, coordinates: &Coordinates) -> Option<String>;
}

/// Configuration for the Google Maps geocoder.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

impl GeocoderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Google Maps geocode API client.
pub struct GoogleGeocoder {
    http: reqwest::Client,
    config: GeocoderConfig,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GoogleGeocoder {
    #[must_use]
    pub fn new(http: reqwest::Client, config: GeocoderConfig) -> Self {
        Self { http, config }
    }

    async fn lookup(&self, coordinates: &Coordinates) -> Result<String, Report<GeocodeError>> {
        let url = format!(
            "{}/geocode/json",
            self.config.base_url.trim_end_matches('/')
        );
        let latlng = format!("{},{}", coordinates.lat, coordinates.long);

        let response = self
            .http
            .get(url)
            .query(&[("latlng", latlng.as_str()), ("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: GeocodeResponse =
            response
                .json()
                .await
                .map_err(|e| GeocodeError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        first_political_name(parsed).ok_or_else(|| GeocodeError::NoPlaceName.into())
    }
}

/// Short name of the first political component of the first result.
fn first_political_name(response: GeocodeResponse) -> Option<String> {
    response
        .results
        .into_iter()
        .next()?
        .address_components
        .into_iter()
        .find(|c| c.types.iter().any(|t| t == POLITICAL))
        .map(|c| c.short_name)
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self), fields(lat = %coordinates.lat, long = %coordinates.long))]
    async fn reverse_lookup(&self, coordinates: &Coordinates) -> Option<String> {
        match self.lookup(coordinates).await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(error = %e, "reverse geocoding failed");
                None
            }
        }
    }
}
