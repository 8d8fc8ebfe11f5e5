//! Mock provider for testing.
//!
//! [`MockProvider`] implements [`WeatherProvider`] without any network access.
//!
//! # Features
//!
//! - **Failure injection**: make fetches for specific cities fail with a message
//! - **Canonical names**: map typed input to the name the provider "resolves" it to
//! - **Latency simulation**: delay every fetch to exercise in-flight states

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::provider::WeatherProvider;
use crate::types::{now_epoch_millis, CurrentConditions, DailyForecast, WeatherSnapshot};
use crate::units::UnitSystem;
use skycast_core::ProviderError;

const SECONDS_PER_DAY: i64 = 86_400;

fn to_fahrenheit(celsius: f64) -> f64 {
    ((celsius * 9.0 / 5.0 + 32.0) * 10.0).round() / 10.0
}

/// Capitalize each word, the way the real provider reports city names.
fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A deterministic snapshot for `city`: today 10-20 °C, humidity 50 %, wind 10 km/h.
pub fn sample_snapshot(city: &str, units: UnitSystem) -> WeatherSnapshot {
    let convert = |c: f64| match units {
        UnitSystem::Metric => c,
        UnitSystem::Imperial => to_fahrenheit(c),
    };
    let fetched_at = now_epoch_millis();
    let today = fetched_at / 1000 / SECONDS_PER_DAY * SECONDS_PER_DAY;

    let daily = (0..5)
        .map(|d| DailyForecast {
            epoch_seconds: today + d * SECONDS_PER_DAY,
            temp_max: convert(20.0 + d as f64),
            temp_min: convert(10.0 + d as f64),
            description: "Partly cloudy".to_string(),
            icon_ref: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
            precipitation_chance: (d * 10) as u8,
        })
        .collect();

    WeatherSnapshot {
        city: city.to_string(),
        country: "Testland".to_string(),
        lat: 0.0,
        lon: 0.0,
        current: CurrentConditions {
            temp: convert(15.0),
            feels_like: convert(14.0),
            humidity: 50,
            wind_speed_kph: 10.0,
            description: "Partly cloudy".to_string(),
            icon_ref: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
            clouds: 40,
            uv_index: 3.0,
            visibility_meters: 10_000.0,
            pressure_hpa: 1015.0,
        },
        daily,
        units,
        fetched_at_epoch_millis: fetched_at,
    }
}

/// An in-process [`WeatherProvider`].
#[derive(Default)]
pub struct MockProvider {
    failures: RwLock<HashMap<String, String>>,
    aliases: RwLock<HashMap<String, String>>,
    latency: Option<Duration>,
    calls: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Resolve `input` (any casing) to `canonical`.
    pub fn with_alias(self, input: &str, canonical: &str) -> Self {
        self.aliases
            .write()
            .insert(input.to_lowercase(), canonical.to_string());
        self
    }

    /// Make fetches for `city` (any casing) fail with `message`.
    pub fn set_failure(&self, city: &str, message: &str) {
        self.failures
            .write()
            .insert(city.to_lowercase(), message.to_string());
    }

    pub fn clear_failure(&self, city: &str) {
        self.failures.write().remove(&city.to_lowercase());
    }

    /// Number of fetches started so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn canonical_name(&self, city: &str) -> String {
        self.aliases
            .read()
            .get(&city.to_lowercase())
            .cloned()
            .unwrap_or_else(|| title_case(city))
    }
}

#[async_trait]
impl WeatherProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, city: &str, units: UnitSystem) -> Result<WeatherSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failures.read().get(&city.to_lowercase()).cloned();
        if let Some(message) = failure {
            return Err(ProviderError::Api {
                status: 400,
                message,
            });
        }

        Ok(sample_snapshot(&self.canonical_name(city), units))
    }
}
