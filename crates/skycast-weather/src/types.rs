use serde::{Deserialize, Serialize};

use crate::units::UnitSystem;

/// Current conditions for a city.
///
/// Temperatures follow the unit system of the fetch; wind is always km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    /// Relative humidity, 0-100
    pub humidity: u8,
    pub wind_speed_kph: f64,
    pub description: String,
    pub icon_ref: String,
    /// Cloud cover, 0-100
    pub clouds: u8,
    pub uv_index: f64,
    pub visibility_meters: f64,
    pub pressure_hpa: f64,
}

/// One day of forecast. Index 0 of a snapshot's `daily` is today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub epoch_seconds: i64,
    pub temp_max: f64,
    pub temp_min: f64,
    pub description: String,
    pub icon_ref: String,
    /// Chance of precipitation, 0-100
    pub precipitation_chance: u8,
}

/// Everything fetched for one city at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Canonical city name as returned by the provider
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub current: CurrentConditions,
    /// Chronological, never empty for a successful fetch
    pub daily: Vec<DailyForecast>,
    /// Unit system the temperatures were fetched in
    pub units: UnitSystem,
    pub fetched_at_epoch_millis: i64,
}

impl WeatherSnapshot {
    /// Today's forecast entry.
    pub fn today(&self) -> Option<&DailyForecast> {
        self.daily.first()
    }

    /// Age of the snapshot relative to `now_millis`, never negative.
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        (now_millis - self.fetched_at_epoch_millis).max(0)
    }

    /// True once the snapshot is at least `threshold_millis` old.
    pub fn is_stale(&self, now_millis: i64, threshold_millis: i64) -> bool {
        self.age_millis(now_millis) >= threshold_millis
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
