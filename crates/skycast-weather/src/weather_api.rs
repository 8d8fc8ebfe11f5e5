//! WeatherAPI.com client.
//!
//! One `forecast.json` request returns both current conditions and the daily
//! forecast; the provider resolves free-form city names itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::provider::WeatherProvider;
use crate::types::{now_epoch_millis, CurrentConditions, DailyForecast, WeatherSnapshot};
use crate::units::UnitSystem;
use skycast_core::{ProviderConfig, ProviderError, ReqwestErrorExt};

const USER_AGENT: &str = "Skycast/0.1.0";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: ApiLocation,
    current: ApiCurrent,
    forecast: ApiForecast,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    temp_f: f64,
    feelslike_c: f64,
    feelslike_f: f64,
    humidity: f64,
    wind_kph: f64,
    condition: ApiCondition,
    cloud: f64,
    uv: f64,
    vis_km: f64,
    pressure_mb: f64,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    date_epoch: i64,
    day: ApiDay,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    maxtemp_c: f64,
    maxtemp_f: f64,
    mintemp_c: f64,
    mintemp_f: f64,
    condition: ApiCondition,
    #[serde(default)]
    daily_chance_of_rain: f64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

impl ForecastResponse {
    fn into_snapshot(
        self,
        units: UnitSystem,
        fetched_at_epoch_millis: i64,
    ) -> Result<WeatherSnapshot, ProviderError> {
        let metric = units == UnitSystem::Metric;

        if self.forecast.forecastday.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "no forecast days returned for {}",
                self.location.name
            )));
        }

        let daily = self
            .forecast
            .forecastday
            .into_iter()
            .map(|d| DailyForecast {
                epoch_seconds: d.date_epoch,
                temp_max: if metric { d.day.maxtemp_c } else { d.day.maxtemp_f },
                temp_min: if metric { d.day.mintemp_c } else { d.day.mintemp_f },
                description: d.day.condition.text,
                icon_ref: d.day.condition.icon,
                precipitation_chance: percent(d.day.daily_chance_of_rain),
            })
            .collect();

        let c = self.current;
        Ok(WeatherSnapshot {
            city: self.location.name,
            country: self.location.country,
            lat: self.location.lat,
            lon: self.location.lon,
            current: CurrentConditions {
                temp: if metric { c.temp_c } else { c.temp_f },
                feels_like: if metric { c.feelslike_c } else { c.feelslike_f },
                humidity: percent(c.humidity),
                wind_speed_kph: c.wind_kph,
                description: c.condition.text,
                icon_ref: c.condition.icon,
                clouds: percent(c.cloud),
                uv_index: c.uv,
                visibility_meters: c.vis_km * 1000.0,
                pressure_hpa: c.pressure_mb,
            },
            daily,
            units,
            fetched_at_epoch_millis,
        })
    }
}

/// HTTP client for the WeatherAPI.com v1 API.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    forecast_days: u8,
}

impl WeatherApiClient {
    /// Create a client.
    ///
    /// A missing API key is not an error here; each fetch then fails with
    /// `NotConfigured` so the failure shows up on the city that was requested.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        forecast_days: u8,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            forecast_days: forecast_days.clamp(1, 14),
        })
    }

    /// Create a client from the `[provider]` config section.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.base_url,
            config.resolved_api_key(),
            config.forecast_days,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .map(|e| e.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

        ProviderError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    fn name(&self) -> &str {
        "weatherapi"
    }

    async fn fetch(&self, city: &str, units: UnitSystem) -> Result<WeatherSnapshot, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no API key (set provider.api_key or {})",
                skycast_core::config::API_KEY_ENV
            ))
        })?;

        let url = format!("{}/forecast.json", self.base_url);
        let days = self.forecast_days.to_string();

        tracing::debug!("Requesting forecast for '{}' ({})", city, units);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", api_key),
                ("q", city),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_provider_error)?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            tracing::debug!("Forecast request for '{}' failed: {}", city, err);
            return Err(err);
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.into_snapshot(units, now_epoch_millis())
    }
}
