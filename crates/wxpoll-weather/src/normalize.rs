//! Turns a snapshot into the full set of display values.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use wxpoll_core::UnitSystem;

use crate::snapshot::WeatherSnapshot;
use crate::types::{FieldError, VariableValue, VariableValues};
use crate::units::{self, PressureUnit, TemperatureUnit};
use crate::variables::{Format, Section, VariableSpec, VARIABLE_TABLE};

/// Output of one normalization pass
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// One entry per table key, failed keys left empty
    pub values: VariableValues,
    /// Icon code of the first condition, for the icon cache
    pub condition_code: Option<String>,
    pub is_day: Option<bool>,
}

/// Render every variable of [`VARIABLE_TABLE`] from `snapshot`.
///
/// A key whose source is missing or malformed is left empty; the rest of the
/// table is still rendered.
pub fn normalize(snapshot: &WeatherSnapshot, system: UnitSystem) -> Normalized {
    let mut values = VariableValues::empty();

    for spec in VARIABLE_TABLE {
        let value = match render(spec, snapshot, system) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key = spec.key, "Variable left empty: {}", e);
                VariableValue::Empty
            }
        };
        values.set(spec.key, value);
    }

    Normalized {
        values,
        condition_code: snapshot.condition_code().map(str::to_string),
        is_day: snapshot.is_daytime().ok(),
    }
}

/// Render a single variable.
pub fn render(
    spec: &VariableSpec,
    snapshot: &WeatherSnapshot,
    system: UnitSystem,
) -> Result<VariableValue, FieldError> {
    match spec.section {
        Section::Forecast => Ok(VariableValue::Empty),
        Section::Internal => render_internal(spec, snapshot),
        Section::Root | Section::Sys | Section::Weather => {
            raw_value(spec, snapshot.lookup(source(spec)?)?)
        }
        Section::Main | Section::Local => render_measurement(spec, snapshot, system),
        Section::Wind => match spec.format {
            Format::WindSpeed => {
                let mps = snapshot.number(source(spec)?)?;
                Ok(VariableValue::Text(units::format_wind_speed(mps, system)))
            }
            _ => raw_value(spec, snapshot.lookup(source(spec)?)?),
        },
        Section::Time => {
            let epoch = snapshot.integer(source(spec)?)?;
            let local = local_time(epoch, snapshot.timezone_offset())?;
            let pattern = match spec.format {
                Format::Stamp => "%m-%d %H:%M",
                _ => "%H:%M",
            };
            Ok(VariableValue::Text(local.format(pattern).to_string()))
        }
    }
}

fn source(spec: &VariableSpec) -> Result<&'static str, FieldError> {
    spec.source
        .ok_or_else(|| FieldError::Missing(spec.key.to_string()))
}

fn render_internal(
    spec: &VariableSpec,
    snapshot: &WeatherSnapshot,
) -> Result<VariableValue, FieldError> {
    match spec.format {
        Format::Daytime => snapshot.is_daytime().map(VariableValue::Flag),
        Format::Compass => {
            let degrees = snapshot.number("wind.deg")?;
            Ok(VariableValue::Text(units::compass_point(degrees).to_string()))
        }
        _ => Ok(VariableValue::Empty),
    }
}

fn render_measurement(
    spec: &VariableSpec,
    snapshot: &WeatherSnapshot,
    system: UnitSystem,
) -> Result<VariableValue, FieldError> {
    let path = source(spec)?;
    let text = match spec.format {
        Format::Temperature => {
            let unit = spec
                .temperature_unit()
                .unwrap_or_else(|| TemperatureUnit::for_system(system));
            units::format_temperature(snapshot.number(path)?, unit)
        }
        Format::Pressure => {
            let unit = spec
                .pressure_unit()
                .unwrap_or_else(|| PressureUnit::for_system(system));
            units::format_pressure(snapshot.number(path)?, unit)
        }
        Format::Humidity => units::format_humidity(snapshot.number(path)?),
        _ => return raw_value(spec, snapshot.lookup(path)?),
    };
    Ok(VariableValue::Text(text))
}

fn raw_value(spec: &VariableSpec, value: &Value) -> Result<VariableValue, FieldError> {
    match value {
        Value::String(s) => Ok(VariableValue::Text(s.clone())),
        Value::Bool(b) => Ok(VariableValue::Flag(*b)),
        Value::Number(n) => {
            let text = match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(u)) => u.to_string(),
                _ => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
            };
            Ok(VariableValue::Text(text))
        }
        _ => Err(FieldError::WrongType {
            path: spec.source.unwrap_or(spec.key).to_string(),
            expected: "scalar",
        }),
    }
}

fn local_time(epoch: i64, offset_secs: i32) -> Result<DateTime<FixedOffset>, FieldError> {
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| FieldError::OutOfRange("timezone".to_string()))?;
    let utc = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| FieldError::OutOfRange(format!("timestamp {}", epoch)))?;
    Ok(utc.with_timezone(&offset))
}
