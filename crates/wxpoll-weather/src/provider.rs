//! OpenWeather HTTP client.
//!
//! Current conditions are always requested in standard units (Kelvin, hPa,
//! m/s); conversion to the configured unit system happens locally so that a
//! unit change never needs a new request.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use wxpoll_core::WeatherConfig;

use crate::snapshot::WeatherSnapshot;
use crate::types::FetchError;

pub const WEATHER_PATH: &str = "/data/2.5/weather";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("wxpoll/", env!("CARGO_PKG_VERSION"));

/// Parameters of one current-weather query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub location: String,
    pub api_key: String,
}

impl WeatherRequest {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            location: config.location.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_base_url: String,
    icon_base_url: String,
}

impl WeatherProvider {
    /// Build a provider for the endpoints named in `config`.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        Self::with_base_urls(&config.api_base_url, &config.icon_base_url)
    }

    pub fn with_base_urls(api_base_url: &str, icon_base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            icon_base_url: icon_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current conditions for the requested location.
    #[instrument(skip(self, request), fields(location = %request.location), level = "info")]
    pub async fn fetch_current(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, FetchError> {
        let url = format!("{}{}", self.api_base_url, WEATHER_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", request.location.as_str()),
                ("units", "standard"),
                ("appid", request.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let payload = match serde_json::from_str::<Value>(&body) {
            Ok(payload) => payload,
            Err(e) if status.is_success() => {
                return Err(FetchError::Parse(format!("JSON parse error: {}", e)));
            }
            Err(_) => Value::Null,
        };

        classify_response(status, payload)
    }

    /// Fetch the raw icon image for a condition code.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_icon(&self, code: &str) -> Result<Vec<u8>, FetchError> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FetchError::Parse(format!("invalid icon code: {:?}", code)));
        }

        let url = format!("{}/img/wn/{}@2x.png", self.icon_base_url, code);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: status_reason(status),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Sort a weather response into a snapshot or one of the provider failures.
///
/// An `{"error": {"message": ..}}` body is a provider error regardless of
/// status code.
pub fn classify_response(status: StatusCode, payload: Value) -> Result<WeatherSnapshot, FetchError> {
    if let Some(message) = payload.pointer("/error/message").and_then(Value::as_str) {
        return Err(FetchError::Provider(message.to_string()));
    }

    if status.is_success() {
        if !payload.is_object() {
            return Err(FetchError::Parse("expected a JSON object".to_string()));
        }
        return Ok(WeatherSnapshot::new(payload));
    }

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| status_reason(status));

    if status == StatusCode::UNAUTHORIZED {
        Err(FetchError::Unauthorized(message))
    } else {
        Err(FetchError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
