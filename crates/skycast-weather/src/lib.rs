//! Weather data for Skycast
//!
//! Snapshot model, unit handling, the provider seam with its WeatherAPI.com
//! client, and the synthetic intraday analytics derived from a snapshot.

pub mod analytics;
pub mod mock;
pub mod provider;
pub mod types;
pub mod units;
pub mod weather_api;

pub use analytics::{
    derive_series, AnalyticsPoint, AnalyticsSeries, AnalyticsSummary, HumidityLevel,
};
pub use mock::MockProvider;
pub use provider::WeatherProvider;
pub use types::*;
pub use units::{UnitSystem, WindSpeedUnit};
pub use weather_api::WeatherApiClient;

pub use skycast_core::ProviderError;
