//! Synthetic intraday series derived from a daily forecast.
//!
//! The provider only reports today's min/max plus the current reading, so the
//! 24-hour view is approximated: temperature follows a sine curve peaking at
//! 14:00, humidity moves inversely to it, and both humidity and wind get a
//! fixed per-slot jitter. The output depends only on the snapshot.

use std::f64::consts::PI;

use serde::Serialize;

use crate::types::WeatherSnapshot;
use crate::units::UnitSystem;

/// Number of two-hour slots in the series.
pub const SLOT_COUNT: usize = 12;

const FIRST_HOUR: u32 = 6;
const PEAK_HOUR: f64 = 14.0;
const MIN_HUMIDITY: f64 = 10.0;
const MAX_HUMIDITY: f64 = 100.0;

/// Rounds half-up toward positive infinity, so `-2.5` becomes `-2`.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round1(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// 12-hour clock label: `0` is "12 AM", `12` is "12 PM".
fn time_label(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        1..=11 => format!("{} AM", hour),
        12 => "12 PM".to_string(),
        _ => format!("{} PM", hour - 12),
    }
}

/// One slot of the synthetic series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsPoint {
    /// Hour of day, 0-23
    pub hour: u32,
    pub time_label: String,
    /// Same unit system as the source snapshot, 1 decimal
    pub temp: f64,
    /// Relative humidity, 10-100
    pub humidity: u8,
    /// km/h, 1 decimal, never negative
    pub wind_speed_kph: f64,
}

/// Coarse humidity band for the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HumidityLevel {
    Dry,
    Normal,
    Humid,
}

impl HumidityLevel {
    pub fn from_percent(humidity: u8) -> Self {
        match humidity {
            0..=39 => Self::Dry,
            40..=69 => Self::Normal,
            _ => Self::Humid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dry => "Dry",
            Self::Normal => "Normal",
            Self::Humid => "Humid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    /// Mean of the series temperatures, 1 decimal
    pub avg_temp: f64,
    /// Today's forecast max, 1 decimal
    pub max_temp: f64,
    /// Today's forecast min, 1 decimal
    pub min_temp: f64,
    /// Mean of the series humidities, rounded
    pub avg_humidity: u8,
}

impl AnalyticsSummary {
    pub fn humidity_level(&self) -> HumidityLevel {
        HumidityLevel::from_percent(self.avg_humidity)
    }
}

/// Derived analytics for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSeries {
    pub city: String,
    pub units: UnitSystem,
    pub points: Vec<AnalyticsPoint>,
    pub summary: AnalyticsSummary,
}

impl AnalyticsSeries {
    /// Wind at the 12 PM slot, falling back to the first slot.
    pub fn midday_wind(&self) -> f64 {
        self.points
            .iter()
            .find(|p| p.hour == 12)
            .or_else(|| self.points.first())
            .map(|p| p.wind_speed_kph)
            .unwrap_or_default()
    }

    /// Highest wind speed across the series.
    pub fn peak_wind(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.wind_speed_kph)
            .fold(0.0, f64::max)
    }
}

/// Expand `snapshot` into the 12-slot series and its summary.
///
/// Returns `None` when the snapshot has no daily forecast to anchor on.
pub fn derive_series(snapshot: &WeatherSnapshot) -> Option<AnalyticsSeries> {
    let today = snapshot.today()?;
    let min_t = today.temp_min;
    let max_t = today.temp_max;
    let base_humidity = f64::from(snapshot.current.humidity);
    let base_wind = snapshot.current.wind_speed_kph;

    let points: Vec<AnalyticsPoint> = (0..SLOT_COUNT as u32)
        .map(|i| {
            let hour = (FIRST_HOUR + 2 * i) % 24;
            let radians = ((f64::from(hour) - PEAK_HOUR) / 24.0) * 2.0 * PI;
            let normalised = (radians.sin() + 1.0) / 2.0;

            let temp = min_t + normalised * (max_t - min_t);

            let humidity_offset =
                -((normalised - 0.5) * 20.0) + (f64::from((i * 7) % 11) - 5.0);
            let humidity =
                round_half_up(base_humidity + humidity_offset).clamp(MIN_HUMIDITY, MAX_HUMIDITY);

            let wind_offset = (f64::from((i * 13) % 9) - 4.0) * 0.8;
            let wind = round1(base_wind + wind_offset).max(0.0);

            AnalyticsPoint {
                hour,
                time_label: time_label(hour),
                temp: round1(temp),
                humidity: humidity as u8,
                wind_speed_kph: wind,
            }
        })
        .collect();

    let count = points.len() as f64;
    let avg_temp = points.iter().map(|p| p.temp).sum::<f64>() / count;
    let avg_humidity = points.iter().map(|p| f64::from(p.humidity)).sum::<f64>() / count;

    Some(AnalyticsSeries {
        city: snapshot.city.clone(),
        units: snapshot.units,
        summary: AnalyticsSummary {
            avg_temp: round1(avg_temp),
            max_temp: round1(max_t),
            min_temp: round1(min_t),
            avg_humidity: round_half_up(avg_humidity) as u8,
        },
        points,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::mock::sample_snapshot;

    fn reference_snapshot() -> WeatherSnapshot {
        let mut snapshot = sample_snapshot("Paris", UnitSystem::Metric);
        snapshot.daily[0].temp_min = 10.0;
        snapshot.daily[0].temp_max = 20.0;
        snapshot.current.humidity = 50;
        snapshot.current.wind_speed_kph = 10.0;
        snapshot
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_series() {
        let series = derive_series(&reference_snapshot()).unwrap();
        assert_eq!(series.points.len(), 12);

        let hours: Vec<u32> = series.points.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![6, 8, 10, 12, 14, 16, 18, 20, 22, 0, 2, 4]);

        let temps = [10.7, 10.0, 10.7, 12.5, 15.0, 17.5, 19.3, 20.0, 19.3, 17.5, 15.0, 12.5];
        let humidities = [54, 62, 57, 60, 51, 42, 45, 40, 37, 48, 49, 50];
        let winds = [6.8, 10.0, 13.2, 9.2, 12.4, 8.4, 11.6, 7.6, 10.8, 6.8, 10.0, 13.2];

        for (i, point) in series.points.iter().enumerate() {
            assert!(close(point.temp, temps[i]), "temp at slot {}: {}", i, point.temp);
            assert_eq!(point.humidity, humidities[i], "humidity at slot {}", i);
            assert!(
                close(point.wind_speed_kph, winds[i]),
                "wind at slot {}: {}",
                i,
                point.wind_speed_kph
            );
        }

        assert_eq!(series.points[6].hour, 18);
        assert_eq!(series.points[6].time_label, "6 PM");
    }

    #[test]
    fn test_reference_summary() {
        let series = derive_series(&reference_snapshot()).unwrap();

        let mean = series.points.iter().map(|p| p.temp).sum::<f64>() / 12.0;
        assert!(close(series.summary.avg_temp, round1(mean)));
        assert!(close(series.summary.avg_temp, 15.0));
        assert!(close(series.summary.max_temp, 20.0));
        assert!(close(series.summary.min_temp, 10.0));
        assert_eq!(series.summary.avg_humidity, 50);
        assert_eq!(series.summary.humidity_level(), HumidityLevel::Normal);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let snapshot = reference_snapshot();
        assert_eq!(derive_series(&snapshot), derive_series(&snapshot));
    }

    #[test]
    fn test_time_labels() {
        assert_eq!(time_label(0), "12 AM");
        assert_eq!(time_label(4), "4 AM");
        assert_eq!(time_label(12), "12 PM");
        assert_eq!(time_label(22), "10 PM");
    }

    #[test]
    fn test_humidity_is_clamped() {
        let mut snapshot = reference_snapshot();
        snapshot.current.humidity = 98;
        let series = derive_series(&snapshot).unwrap();
        assert!(series.points.iter().all(|p| p.humidity <= 100));
        assert_eq!(series.points[1].humidity, 100);

        snapshot.current.humidity = 2;
        let series = derive_series(&snapshot).unwrap();
        assert!(series.points.iter().all(|p| p.humidity >= 10));
    }

    #[test]
    fn test_wind_never_negative() {
        let mut snapshot = reference_snapshot();
        snapshot.current.wind_speed_kph = 1.0;
        let series = derive_series(&snapshot).unwrap();
        assert!(series.points.iter().all(|p| p.wind_speed_kph >= 0.0));
        assert_eq!(series.points[0].wind_speed_kph, 0.0);
    }

    #[test]
    fn test_midday_and_peak_wind() {
        let series = derive_series(&reference_snapshot()).unwrap();
        assert!(close(series.midday_wind(), 9.2));
        assert!(close(series.peak_wind(), 13.2));
    }

    #[test]
    fn test_empty_daily_yields_none() {
        let mut snapshot = reference_snapshot();
        snapshot.daily.clear();
        assert!(derive_series(&snapshot).is_none());
    }

    #[test]
    fn test_humidity_levels() {
        assert_eq!(HumidityLevel::from_percent(39), HumidityLevel::Dry);
        assert_eq!(HumidityLevel::from_percent(40), HumidityLevel::Normal);
        assert_eq!(HumidityLevel::from_percent(70), HumidityLevel::Humid);
    }

    #[test]
    fn test_round_half_up_matches_browser_rounding() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-0.4), 0.0);
    }
}
