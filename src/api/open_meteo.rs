//! Provides a client for the Open-Meteo forecast API.
//!
//! This module defines the `OpenMeteoClient` struct, which fetches hourly
//! temperature, humidity, wind speed and (optionally) precipitation for one coordinate pair.

use crate::error::{AppError, Result};
use crate::models::ForecastResponse;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

const HOURLY_VARIABLES: [&str; 3] = ["temperature_2m", "relative_humidity_2m", "wind_speed_10m"];
const PRECIPITATION_VARIABLE: &str = "precipitation";

/// An asynchronous client for the Open-Meteo `/v1/forecast` endpoint.
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    fetch_precipitation: bool,
}

impl OpenMeteoClient {
    /// Creates a client against `base_url` whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, fetch_precipitation: bool) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            fetch_precipitation,
        })
    }

    /// Comma-separated list of hourly variables requested from the API.
    fn hourly_variables(&self) -> String {
        let mut variables = HOURLY_VARIABLES.to_vec();
        if self.fetch_precipitation {
            variables.push(PRECIPITATION_VARIABLE);
        }
        variables.join(",")
    }

    /// Fetches the hourly forecast for one coordinate pair.
    ///
    /// No retry happens here; a failed fetch is retried by whoever scheduled the run.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` on transport failures, timeouts and non-2xx statuses,
    /// and `AppError::JsonParse` if the body is not a forecast document.
    pub async fn fetch_hourly(&self, latitude: f64, longitude: f64) -> Result<ForecastResponse> {
        info!(
            "Fetching hourly weather for latitude {} longitude {}",
            latitude, longitude
        );

        // Build the request URL; coordinates and variables go in the query string
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", self.hourly_variables()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Error requesting forecast from {}: {}", url, e);
                AppError::Api(e.into())
            })?;

        // Check for non-success status codes (e.g., 4xx, 5xx)
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                error!(
                    "Forecast request failed with status {}: {}",
                    e.status().unwrap_or_default(),
                    e
                );
                return Err(AppError::Api(e.into()));
            },
        };

        // Read the body first so a decoding failure is reported as JSON, not transport
        let body = response.text().await.map_err(|e| {
            error!("Error reading forecast response body: {}", e);
            AppError::Api(e.into())
        })?;
        let forecast: ForecastResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Error parsing forecast response JSON: {}", e);
            AppError::JsonParse(e.into())
        })?;

        debug!(
            "Received {} hourly readings (timezone {:?})",
            forecast.hourly.time.len(),
            forecast.timezone
        );
        Ok(forecast)
    }
}
