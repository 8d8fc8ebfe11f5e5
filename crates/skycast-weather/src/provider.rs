//! Provider seam between the city cache and whatever fetches weather.

use async_trait::async_trait;

use crate::types::WeatherSnapshot;
use crate::units::UnitSystem;
use skycast_core::ProviderError;

/// Source of weather snapshots.
///
/// Implementations resolve a free-form city name to the provider's canonical
/// city and return current conditions plus a daily forecast in `units`. The
/// returned snapshot's `daily` must not be empty.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Fetch a snapshot for `city`.
    ///
    /// # Errors
    /// Any HTTP or provider-level failure. The error's `Display` output is
    /// shown to the user as-is.
    async fn fetch(&self, city: &str, units: UnitSystem) -> Result<WeatherSnapshot, ProviderError>;
}
