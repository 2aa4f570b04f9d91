//! Centralized error types for wxpoll.
//!
//! This module provides a typed error hierarchy that:
//! - Separates configuration, network and provider failures
//! - Provides short messages suitable for a host status line
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a host-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    /// Returns a short message for the host status display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => e.user_message().to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather provider is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => "Received an unexpected response.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Unreadable { .. } => "Configuration file could not be read.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Weather provider errors, as seen by the host.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,
}

impl WeatherError {
    /// Provider messages are shown as-is.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::LocationNotFound(message) | WeatherError::ApiError(message) => {
                message.clone()
            }
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.".to_string(),
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Network(NetworkError::Timeout),
            AppError::Config(ConfigError::ParseError("expected `=`".into())),
            AppError::Weather(WeatherError::InvalidApiKey),
            AppError::Weather(WeatherError::LocationNotFound("city not found".into())),
        ];

        for e in errors {
            assert!(!e.user_message().is_empty(), "empty message for {:?}", e);
        }
    }

    #[test]
    fn test_provider_text_passes_through() {
        let err = AppError::Weather(WeatherError::ApiError("quota exceeded".into()));
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let upstream = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let client = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert!(upstream.user_message().contains("provider"));
        assert_ne!(upstream.user_message(), client.user_message());
    }

    #[test]
    fn test_from_conversions() {
        let err: AppError = ConfigError::Invalid("units".into()).into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("units"));
    }

    #[tokio::test]
    async fn test_connect_failure_maps_to_connection_failed() {
        let err = reqwest::get("http://127.0.0.1:9").await.unwrap_err();
        assert!(matches!(
            err.into_network_error(),
            NetworkError::ConnectionFailed(_)
        ));
    }
}
