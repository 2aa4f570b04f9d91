//! Declarative table of every variable published to the host.
//!
//! The table is data: `normalize` interprets it, the host uses it for
//! variable definitions. Order is presentation order only.

use serde::Serialize;

use crate::units::{PressureUnit, TemperatureUnit};

/// Payload block a variable is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Top-level passthrough (location name)
    Root,
    Main,
    Sys,
    Wind,
    /// First element of the condition array
    Weather,
    /// Epoch seconds rendered as local clock time
    Time,
    /// Derived from several fields, no source path
    Internal,
    /// Like `Main` with an explicit unit encoded in the key
    Local,
    /// Reserved, never populated
    Forecast,
}

/// How a resolved value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Raw,
    Temperature,
    Pressure,
    Humidity,
    WindSpeed,
    /// `HH:MM`
    Clock,
    /// `MM-DD HH:MM`
    Stamp,
    Daytime,
    Compass,
    /// Condition icon code
    Condition,
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariableSpec {
    pub key: &'static str,
    pub description: &'static str,
    pub section: Section,
    pub source: Option<&'static str>,
    pub format: Format,
}

impl VariableSpec {
    const fn new(
        key: &'static str,
        description: &'static str,
        section: Section,
        source: Option<&'static str>,
        format: Format,
    ) -> Self {
        Self {
            key,
            description,
            section,
            source,
            format,
        }
    }

    /// Temperature unit encoded in the key suffix (`_c`, `_f`, `_k`)
    pub fn temperature_unit(&self) -> Option<TemperatureUnit> {
        match self.key.rsplit_once('_')?.1 {
            "c" => Some(TemperatureUnit::Celsius),
            "f" => Some(TemperatureUnit::Fahrenheit),
            "k" => Some(TemperatureUnit::Kelvin),
            _ => None,
        }
    }

    /// Pressure unit encoded in the key suffix (`_inhg`, `_mmhg`, `_hpa`)
    pub fn pressure_unit(&self) -> Option<PressureUnit> {
        match self.key.rsplit_once('_')?.1 {
            "inhg" => Some(PressureUnit::InHg),
            "mmhg" => Some(PressureUnit::MmHg),
            "hpa" => Some(PressureUnit::Hpa),
            _ => None,
        }
    }
}

use Format::*;
use Section::*;

pub static VARIABLE_TABLE: &[VariableSpec] = &[
    VariableSpec::new("l_name", "Location Name", Root, Some("name"), Raw),
    VariableSpec::new("l_country", "Country", Sys, Some("sys.country"), Raw),
    VariableSpec::new("c_time", "Time last updated", Time, Some("dt"), Stamp),
    VariableSpec::new("c_sunrise", "Sunrise", Time, Some("sys.sunrise"), Clock),
    VariableSpec::new("c_sunset", "Sunset", Time, Some("sys.sunset"), Clock),
    VariableSpec::new("c_temp", "Temperature", Main, Some("main.temp"), Temperature),
    VariableSpec::new("c_feels", "Feels like", Main, Some("main.feels_like"), Temperature),
    VariableSpec::new("c_temp_min", "Minimum temperature", Main, Some("main.temp_min"), Temperature),
    VariableSpec::new("c_temp_max", "Maximum temperature", Main, Some("main.temp_max"), Temperature),
    VariableSpec::new("c_temp_c", "Temperature (Celsius)", Local, Some("main.temp"), Temperature),
    VariableSpec::new("c_temp_f", "Temperature (Fahrenheit)", Local, Some("main.temp"), Temperature),
    VariableSpec::new("c_temp_k", "Temperature (Kelvin)", Local, Some("main.temp"), Temperature),
    VariableSpec::new("c_pressure", "Pressure", Main, Some("main.pressure"), Pressure),
    VariableSpec::new("c_pressure_inhg", "Pressure (inHg)", Local, Some("main.pressure"), Pressure),
    VariableSpec::new("c_pressure_mmhg", "Pressure (mmHg)", Local, Some("main.pressure"), Pressure),
    VariableSpec::new("c_pressure_hpa", "Pressure (hPa)", Local, Some("main.pressure"), Pressure),
    VariableSpec::new("c_humidity", "Humidity", Main, Some("main.humidity"), Humidity),
    VariableSpec::new("c_day", "Is it daytime?", Internal, None, Daytime),
    VariableSpec::new("c_text", "Conditions", Weather, Some("weather.0.main"), Raw),
    VariableSpec::new("c_desc", "Condition details", Weather, Some("weather.0.description"), Raw),
    VariableSpec::new("c_icon", "Condition icon code", Weather, Some("weather.0.icon"), Condition),
    VariableSpec::new("c_wind", "Wind speed", Wind, Some("wind.speed"), WindSpeed),
    VariableSpec::new("c_gust", "Wind gust", Wind, Some("wind.gust"), WindSpeed),
    VariableSpec::new("c_winddeg", "Wind degrees", Wind, Some("wind.deg"), Raw),
    VariableSpec::new("c_winddir", "Wind direction", Internal, None, Compass),
    VariableSpec::new("f_high", "Forecast high", Forecast, None, Inert),
    VariableSpec::new("f_low", "Forecast low", Forecast, None, Inert),
];

/// Look up a spec by key
pub fn find(key: &str) -> Option<&'static VariableSpec> {
    VARIABLE_TABLE.iter().find(|spec| spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<_> = VARIABLE_TABLE.iter().map(|s| s.key).collect();
        assert_eq!(keys.len(), VARIABLE_TABLE.len());
    }

    #[test]
    fn test_sourced_sections_have_paths() {
        for spec in VARIABLE_TABLE {
            match spec.section {
                Section::Internal | Section::Forecast => assert!(spec.source.is_none(), "{}", spec.key),
                _ => assert!(spec.source.is_some(), "{} needs a source", spec.key),
            }
        }
    }

    #[test]
    fn test_local_specs_carry_explicit_units() {
        for spec in VARIABLE_TABLE.iter().filter(|s| s.section == Section::Local) {
            let explicit = match spec.format {
                Format::Temperature => spec.temperature_unit().is_some(),
                Format::Pressure => spec.pressure_unit().is_some(),
                _ => false,
            };
            assert!(explicit, "{} has no unit suffix", spec.key);
        }
    }

    #[test]
    fn test_unit_suffixes() {
        assert_eq!(find("c_temp_k").and_then(|s| s.temperature_unit()), Some(TemperatureUnit::Kelvin));
        assert_eq!(find("c_pressure_mmhg").and_then(|s| s.pressure_unit()), Some(PressureUnit::MmHg));
        // "c_temp" splits into "c" / "temp", not a unit
        assert_eq!(find("c_temp").and_then(|s| s.temperature_unit()), None);
        assert_eq!(find("c_pressure").and_then(|s| s.pressure_unit()), None);
    }

    #[test]
    fn test_find_unknown() {
        assert!(find("c_nope").is_none());
    }
}
