use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::models::Coordinate;
use crate::services::location::{LocationError, LocationProvider};

/// Geocoding client for a Nominatim-compatible HTTP API
///
/// Handles:
/// - Forward geocoding via `/search`
/// - Reverse geocoding via `/reverse`
///
/// A server process has no device position, so `current_location` answers
/// with the configured fallback location, if any.
pub struct HttpGeocoder {
    base_url: String,
    user_agent: String,
    fallback_location: Option<Coordinate>,
    client: Client,
}

impl HttpGeocoder {
    /// Create a new geocoding client
    pub fn new(
        base_url: String,
        user_agent: String,
        timeout: Duration,
        fallback_location: Option<Coordinate>,
    ) -> Result<Self, LocationError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            user_agent,
            fallback_location,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json(&self, url: &str) -> Result<Value, LocationError> {
        tracing::debug!("Geocoding request: {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::warn!("Geocoding request failed: {} - {}", status, body);
            return Err(LocationError::Unavailable(format!(
                "Geocoder returned {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

/// Nominatim encodes coordinates as strings; accept numbers too
fn parse_degrees(value: Option<&Value>, field: &str) -> Result<f64, LocationError> {
    match value {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| LocationError::InvalidResponse(format!("Non-numeric {}: {}", field, s))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| LocationError::InvalidResponse(format!("Invalid {}", field))),
        _ => Err(LocationError::InvalidResponse(format!("Missing {}", field))),
    }
}

#[async_trait]
impl LocationProvider for HttpGeocoder {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        self.fallback_location.ok_or_else(|| {
            LocationError::Unavailable("no fallback location configured".to_string())
        })
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate, LocationError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LocationError::NotFound(String::new()));
        }

        let url = format!(
            "{}?q={}&format=jsonv2&limit=1",
            self.endpoint("search"),
            urlencoding::encode(address)
        );

        let json = self.get_json(&url).await?;

        let places = json
            .as_array()
            .ok_or_else(|| LocationError::InvalidResponse("Expected an array of places".into()))?;

        let place = places
            .first()
            .ok_or_else(|| LocationError::NotFound(address.to_string()))?;

        let latitude = parse_degrees(place.get("lat"), "lat")?;
        let longitude = parse_degrees(place.get("lon"), "lon")?;

        Ok(Coordinate::new(latitude, longitude)?)
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, LocationError> {
        coordinate.validate()?;

        let url = format!(
            "{}?lat={}&lon={}&format=jsonv2",
            self.endpoint("reverse"),
            coordinate.latitude(),
            coordinate.longitude()
        );

        let json = self.get_json(&url).await?;

        if json.get("error").is_some() {
            return Err(LocationError::NotFound(coordinate.to_string()));
        }

        json.get("display_name")
            .and_then(|name| name.as_str())
            .map(str::to_string)
            .ok_or_else(|| LocationError::InvalidResponse("Missing display_name".into()))
    }

    fn provider_name(&self) -> &'static str {
        "nominatim"
    }
}
