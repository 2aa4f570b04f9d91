use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wxpoll_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError};

use crate::variables::VARIABLE_TABLE;

/// A single rendered variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum VariableValue {
    Text(String),
    Flag(bool),
    /// Source data was missing, malformed, or the variable is inert
    #[default]
    Empty,
}

impl VariableValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for VariableValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{}", b),
            Self::Empty => Ok(()),
        }
    }
}

/// Complete set of variable values, one per entry of [`VARIABLE_TABLE`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableValues(BTreeMap<String, VariableValue>);

impl VariableValues {
    /// Every table key present and empty
    pub fn empty() -> Self {
        Self(
            VARIABLE_TABLE
                .iter()
                .map(|spec| (spec.key.to_string(), VariableValue::Empty))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&VariableValue> {
        self.0.get(key)
    }

    /// Display string for a key; empty for unset or unknown keys
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    /// Set a table key; keys outside [`VARIABLE_TABLE`] are ignored
    pub fn set(&mut self, key: &str, value: VariableValue) -> bool {
        match self.0.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in [`VARIABLE_TABLE`] order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableValue)> {
        VARIABLE_TABLE
            .iter()
            .filter_map(|spec| self.0.get(spec.key).map(|value| (spec.key, value)))
    }
}

impl Default for VariableValues {
    fn default() -> Self {
        Self::empty()
    }
}

/// Connection status reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    Connecting,
    Ok,
    BadConfig,
    ConnectionFailure,
    UnknownError,
}

/// Failure to resolve a variable's source value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("missing field: {0}")]
    Missing(String),
    #[error("field {path} is not a {expected}")]
    WrongType { path: String, expected: &'static str },
    #[error("{0} out of range")]
    OutOfRange(String),
}

/// Weather or icon request failures
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Invalid API key: {0}")]
    Unauthorized(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Host status this failure is reported as
    pub fn host_status(&self) -> HostStatus {
        match self {
            Self::Network(_) => HostStatus::ConnectionFailure,
            Self::Unauthorized(_) => HostStatus::BadConfig,
            Self::Provider(_) | Self::Status { .. } | Self::Parse(_) => HostStatus::UnknownError,
        }
    }

    /// Message forwarded to the host along with the status
    pub fn message(&self) -> String {
        match self {
            Self::Network(e) => e.to_string(),
            Self::Provider(m) | Self::Unauthorized(m) | Self::Parse(m) => m.clone(),
            Self::Status { message, .. } => message.clone(),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Network(err) => AppError::Network(err.into_network_error()),
            FetchError::Unauthorized(_) => AppError::Weather(WeatherError::InvalidApiKey),
            FetchError::Status { status: 404, message } => {
                AppError::Weather(WeatherError::LocationNotFound(message))
            }
            FetchError::Status { status, message } if status >= 500 => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            FetchError::Status { message, .. } | FetchError::Provider(message) => {
                AppError::Weather(WeatherError::ApiError(message))
            }
            FetchError::Parse(message) => AppError::Network(NetworkError::InvalidResponse(message)),
        }
    }
}

/// Icon processing failures
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("Icon fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Icon image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Icon render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
