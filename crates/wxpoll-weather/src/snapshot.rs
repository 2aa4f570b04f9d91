//! Raw provider payload with typed path lookups.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::FieldError;

/// One full current-weather response for a location at a point in time.
///
/// Kept as the raw JSON tree: the variable table decides which fields matter,
/// and a field the provider omits only blanks the variables that read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherSnapshot(Value);

impl WeatherSnapshot {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Resolve a dotted path such as `sys.sunrise` or `weather.0.icon`.
    ///
    /// Numeric segments index into arrays.
    pub fn lookup(&self, path: &str) -> Result<&Value, FieldError> {
        let mut current = &self.0;
        for segment in path.split('.') {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = match next {
                Some(Value::Null) | None => return Err(FieldError::Missing(path.to_string())),
                Some(value) => value,
            };
        }
        Ok(current)
    }

    pub fn number(&self, path: &str) -> Result<f64, FieldError> {
        self.lookup(path)?
            .as_f64()
            .ok_or_else(|| FieldError::WrongType {
                path: path.to_string(),
                expected: "number",
            })
    }

    pub fn integer(&self, path: &str) -> Result<i64, FieldError> {
        let value = self.lookup(path)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .ok_or_else(|| FieldError::WrongType {
                path: path.to_string(),
                expected: "integer",
            })
    }

    pub fn text(&self, path: &str) -> Result<&str, FieldError> {
        self.lookup(path)?
            .as_str()
            .ok_or_else(|| FieldError::WrongType {
                path: path.to_string(),
                expected: "string",
            })
    }

    /// Observation time, epoch seconds
    pub fn timestamp(&self) -> Result<i64, FieldError> {
        self.integer("dt")
    }

    /// Seconds east of UTC for the location; UTC when the provider omits it
    pub fn timezone_offset(&self) -> i32 {
        self.integer("timezone")
            .ok()
            .and_then(|tz| i32::try_from(tz).ok())
            .unwrap_or(0)
    }

    pub fn sunrise(&self) -> Result<i64, FieldError> {
        self.integer("sys.sunrise")
    }

    pub fn sunset(&self) -> Result<i64, FieldError> {
        self.integer("sys.sunset")
    }

    /// Icon code of the first (authoritative) condition, e.g. `01d`
    pub fn condition_code(&self) -> Option<&str> {
        self.text("weather.0.icon").ok().filter(|code| !code.is_empty())
    }

    /// True when the observation falls strictly between sunrise and sunset
    pub fn is_daytime(&self) -> Result<bool, FieldError> {
        let dt = self.timestamp()?;
        Ok(dt > self.sunrise()? && dt < self.sunset()?)
    }
}

impl From<Value> for WeatherSnapshot {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}
