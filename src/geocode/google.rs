//! Google Geocoding API client.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GeocodeError, Geocoder};
use crate::models::GeoPoint;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Forward geocoder backed by the Google Geocoding web service
pub struct GoogleGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeCandidate>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    geometry: CandidateGeometry,
}

#[derive(Debug, Deserialize)]
struct CandidateGeometry {
    location: CandidateLocation,
}

#[derive(Debug, Deserialize)]
struct CandidateLocation {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid geocoder endpoint: {}", endpoint))?;
        let client = Client::builder()
            .user_agent(concat!("kinmap/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    fn request_url(&self, place: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", place)
            .append_pair("key", &self.api_key);
        url
    }
}

impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        debug!("Geocoding '{}'", place);

        let response = self
            .client
            .get(self.request_url(place))
            .send()
            .await?
            .error_for_status()?;

        let body: GeocodeResponse = response.json().await?;
        interpret(body)
    }
}

/// Map a provider response onto the first candidate, a miss or an error.
fn interpret(response: GeocodeResponse) -> Result<Option<GeoPoint>, GeocodeError> {
    let message = response.error_message.unwrap_or_default();

    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .next()
            .map(|c| GeoPoint::new(c.geometry.location.lat, c.geometry.location.lng))),
        "ZERO_RESULTS" => Ok(None),
        "REQUEST_DENIED" | "OVER_DAILY_LIMIT" => Err(GeocodeError::Rejected {
            status: response.status.clone(),
            message,
        }),
        _ => Err(GeocodeError::Status {
            status: response.status.clone(),
            message,
        }),
    }
}
