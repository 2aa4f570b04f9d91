//! Unit conversion for raw provider measurements.
//!
//! The provider is always queried in standard units (Kelvin, hPa, m/s) and
//! every display value is derived here. The rounding rules are deliberately
//! biased downward (`floor(x + 0.49)`) so that exact `.5` values round down.

use wxpoll_core::UnitSystem;

/// Degree sign appended to temperatures
pub const DEGREE: char = '\u{b0}';

/// Sixteen compass points, clockwise from north
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const KELVIN_OFFSET: f64 = 273.15;
const HPA_PER_INHG: f64 = 33.863_886_7;
const HPA_PER_MMHG: f64 = 133.322_387;
const MPS_TO_DECI_MPH: f64 = 22.3694;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Default temperature unit for a unit system
    pub fn for_system(system: UnitSystem) -> Self {
        match system {
            UnitSystem::Imperial => Self::Fahrenheit,
            UnitSystem::Metric => Self::Celsius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    InHg,
    MmHg,
    Hpa,
}

impl PressureUnit {
    /// Default pressure unit for a unit system
    pub fn for_system(system: UnitSystem) -> Self {
        match system {
            UnitSystem::Imperial => Self::InHg,
            UnitSystem::Metric => Self::Hpa,
        }
    }
}

/// Convert Kelvin to `unit`, rounded to a whole degree.
pub fn convert_temperature(kelvin: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => (kelvin - KELVIN_OFFSET + 0.49).floor(),
        TemperatureUnit::Fahrenheit => ((kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.49).floor(),
        TemperatureUnit::Kelvin => (kelvin + 0.49).floor(),
    }
}

/// Temperature display string, e.g. `72°`
pub fn format_temperature(kelvin: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", convert_temperature(kelvin, unit) as i64, DEGREE)
}

/// Convert hPa to `unit`. inHg keeps two decimals, the others are floored.
pub fn convert_pressure(hpa: f64, unit: PressureUnit) -> f64 {
    match unit {
        PressureUnit::InHg => (hpa / HPA_PER_INHG * 100.0).round() / 100.0,
        PressureUnit::MmHg => (hpa / HPA_PER_MMHG).floor(),
        PressureUnit::Hpa => hpa.floor(),
    }
}

pub fn format_pressure(hpa: f64, unit: PressureUnit) -> String {
    let value = convert_pressure(hpa, unit);
    match unit {
        PressureUnit::InHg => format!("{:.2}", value),
        PressureUnit::MmHg | PressureUnit::Hpa => format!("{}", value as i64),
    }
}

/// Convert a wind speed in m/s for display.
///
/// Imperial gives mph with one decimal; metric keeps m/s with two decimals.
pub fn convert_wind_speed(mps: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Imperial => (mps * MPS_TO_DECI_MPH + 0.49).floor() / 10.0,
        UnitSystem::Metric => (mps * 100.0 + 0.49).floor() / 100.0,
    }
}

pub fn format_wind_speed(mps: f64, system: UnitSystem) -> String {
    convert_wind_speed(mps, system).to_string()
}

pub fn format_humidity(percent: f64) -> String {
    format!("{}%", percent.round() as i64)
}

/// Index into [`COMPASS_POINTS`] for a bearing in degrees.
pub fn compass_index(degrees: f64) -> usize {
    let sector = (degrees.rem_euclid(360.0) / 22.5 + 0.5).floor() as usize;
    sector % COMPASS_POINTS.len()
}

pub fn compass_point(degrees: f64) -> &'static str {
    COMPASS_POINTS[compass_index(degrees)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_bias_rounds_half_down() {
        // 20.5 C: naive rounding gives 21
        assert_eq!(convert_temperature(293.65, TemperatureUnit::Celsius), 20.0);
        assert_eq!(convert_temperature(300.15, TemperatureUnit::Celsius), 27.0);
        assert_eq!(convert_temperature(300.0, TemperatureUnit::Celsius), 27.0);
    }

    #[test]
    fn test_fahrenheit_matches_formula() {
        for k in [0.0, 250.0, 273.15, 288.7, 300.0, 310.93] {
            let expected = ((k - 273.15) * 9.0 / 5.0 + 32.49_f64).floor();
            assert_eq!(convert_temperature(k, TemperatureUnit::Fahrenheit), expected);
        }
        assert_eq!(convert_temperature(300.0, TemperatureUnit::Fahrenheit), 80.0);
        assert_eq!(convert_temperature(273.15, TemperatureUnit::Fahrenheit), 32.0);
    }

    #[test]
    fn test_kelvin_passthrough() {
        assert_eq!(convert_temperature(300.0, TemperatureUnit::Kelvin), 300.0);
        assert_eq!(convert_temperature(300.5, TemperatureUnit::Kelvin), 300.0);
        assert_eq!(convert_temperature(300.6, TemperatureUnit::Kelvin), 301.0);
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(300.0, TemperatureUnit::Fahrenheit), "80\u{b0}");
        assert_eq!(format_temperature(0.0, TemperatureUnit::Fahrenheit), "-460\u{b0}");
        assert_eq!(format_temperature(0.0, TemperatureUnit::Celsius), "-273\u{b0}");
    }

    #[test]
    fn test_pressure_conversions() {
        assert_eq!(convert_pressure(1013.0, PressureUnit::InHg), 29.91);
        assert_eq!(convert_pressure(1013.0, PressureUnit::MmHg), 7.0);
        assert_eq!(convert_pressure(1013.0, PressureUnit::MmHg), (1013.0_f64 / 133.322_387).floor());
        assert_eq!(convert_pressure(1013.7, PressureUnit::Hpa), 1013.0);
        assert_eq!(format_pressure(1013.0, PressureUnit::InHg), "29.91");
        assert_eq!(format_pressure(1013.0, PressureUnit::MmHg), "7");
    }

    #[test]
    fn test_wind_speed_imperial() {
        assert_eq!(convert_wind_speed(5.0, UnitSystem::Imperial), 11.2);
        assert_eq!(format_wind_speed(5.0, UnitSystem::Imperial), "11.2");
        assert_eq!(format_wind_speed(0.0, UnitSystem::Imperial), "0");
    }

    #[test]
    fn test_wind_speed_metric() {
        assert_eq!(convert_wind_speed(3.6, UnitSystem::Metric), 3.6);
        assert_eq!(convert_wind_speed(4.12, UnitSystem::Metric), 4.12);
        assert_eq!(format_wind_speed(5.0, UnitSystem::Metric), "5");
    }

    #[test]
    fn test_humidity() {
        assert_eq!(format_humidity(81.0), "81%");
    }

    #[test]
    fn test_compass_boundaries() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(360.0), "N");
        assert_eq!(compass_point(348.75), "N");
        assert_eq!(compass_point(11.24), "N");
        assert_eq!(compass_point(11.26), "NNE");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(225.0), "SW");
        assert_eq!(compass_point(-90.0), "W");
        assert_eq!(compass_point(720.0 + 180.0), "S");
    }

    #[test]
    fn test_unit_defaults() {
        assert_eq!(
            TemperatureUnit::for_system(UnitSystem::Imperial),
            TemperatureUnit::Fahrenheit
        );
        assert_eq!(TemperatureUnit::for_system(UnitSystem::Metric), TemperatureUnit::Celsius);
        assert_eq!(PressureUnit::for_system(UnitSystem::Imperial), PressureUnit::InHg);
        assert_eq!(PressureUnit::for_system(UnitSystem::Metric), PressureUnit::Hpa);
    }
}
