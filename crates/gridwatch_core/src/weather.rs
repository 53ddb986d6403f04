use serde::{Deserialize, Serialize};

/// Current conditions for one city as returned by the weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Degrees Celsius.
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    /// Hectopascal.
    pub pressure: f64,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Meters per second.
    pub wind_speed: f64,
    /// Degrees, meteorological convention.
    pub wind_direction: f64,
    /// Meters.
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn celsius_to_fahrenheit(celsius: f64) -> i64 {
    (celsius * 9.0 / 5.0 + 32.0).round() as i64
}

/// Meters per second to miles per hour, one decimal.
pub fn mps_to_mph(mps: f64) -> f64 {
    (mps * 2.237 * 10.0).round() / 10.0
}

/// Hectopascal to inches of mercury, two decimals.
pub fn hpa_to_inhg(hpa: f64) -> f64 {
    (hpa * 0.02953 * 100.0).round() / 100.0
}

/// Meters to miles, one decimal.
pub fn meters_to_miles(meters: f64) -> f64 {
    (meters * 0.000_621_371 * 10.0).round() / 10.0
}

/// Sixteen-point compass name for a bearing in degrees.
pub fn compass_direction(degrees: f64) -> &'static str {
    let sector = (degrees / 22.5).round().rem_euclid(16.0) as usize;
    COMPASS_POINTS[sector % 16]
}

impl WeatherRecord {
    pub fn temperature_f(&self) -> i64 {
        celsius_to_fahrenheit(self.temperature)
    }

    pub fn wind_summary(&self) -> String {
        format!(
            "{} mph {}",
            mps_to_mph(self.wind_speed),
            compass_direction(self.wind_direction)
        )
    }
}
