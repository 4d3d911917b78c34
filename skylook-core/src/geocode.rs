//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses Nominatim (OpenStreetMap), which needs no API key.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{config::DEFAULT_GEOCODING_URL, model::Coordinates};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("skylook/", env!("CARGO_PKG_VERSION"));

pub const UNKNOWN_LOCATION: &str = "Unknown location";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
}

impl NominatimAddress {
    /// Prefer city > town > village > state.
    fn place_name(self) -> Option<String> {
        [self.city, self.town, self.village, self.state]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    base_url: String,
    http: Option<Client>,
}

impl Default for ReverseGeocoder {
    fn default() -> Self {
        Self::new(DEFAULT_GEOCODING_URL)
    }
}

impl ReverseGeocoder {
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .inspect_err(|e| tracing::warn!("Failed to create geocoding client: {}", e))
            .ok();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Best-effort place name; any failure degrades to "Unknown location".
    pub async fn place_name(&self, at: Coordinates) -> String {
        match self.lookup(at).await {
            Some(name) => {
                tracing::info!("Reverse geocoded {} to {}", at, name);
                name
            }
            None => UNKNOWN_LOCATION.to_string(),
        }
    }

    async fn lookup(&self, at: Coordinates) -> Option<String> {
        let client = self.http.as_ref()?;
        let url = format!("{}/reverse", self.base_url);

        let response = match client
            .get(&url)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        body.address?.place_name()
    }
}
