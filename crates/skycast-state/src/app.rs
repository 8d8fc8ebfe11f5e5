use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use skycast_core::{AppError, Config};
use skycast_weather::{
    now_epoch_millis, AnalyticsSeries, UnitSystem, WeatherApiClient, WeatherProvider,
    WeatherSnapshot,
};

use crate::city_cache::{CityWeatherCache, FetchOutcome, RefreshSummary};
use crate::favourites::FavouritesStore;
use crate::fetch_status::FetchStatus;
use crate::kv::{KeyValueStore, MemoryStore, SqliteKvStore};
use crate::selectors::Selectors;
use crate::settings::{SettingField, Settings, SettingsStore};

/// Application state: the three stores plus their selectors.
///
/// Built once at startup and passed to whatever presents it.
pub struct App {
    config: Arc<Config>,
    cache: CityWeatherCache,
    favourites: FavouritesStore,
    settings: SettingsStore,
    selectors: Selectors,
    analytics_choice: Mutex<Option<String>>,
}

impl App {
    /// Create an application over the given provider and storage.
    pub fn new(
        config: Config,
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        tracing::info!("Using weather provider: {}", provider.name());

        Self {
            config: Arc::new(config),
            cache: CityWeatherCache::new(provider),
            favourites: FavouritesStore::load(Arc::clone(&store)),
            settings: SettingsStore::load(store),
            selectors: Selectors::new(),
            analytics_choice: Mutex::new(None),
        }
    }

    /// Create an application backed by the preferences database and the
    /// WeatherAPI.com client.
    ///
    /// An unusable database is replaced by in-memory storage for this run.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let provider = WeatherApiClient::from_config(&config.provider)?;

        let path = config.storage_path();
        let store: Arc<dyn KeyValueStore> = match SqliteKvStore::open(&path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(
                    "Could not open preferences at {}, changes will not be saved: {}",
                    path.display(),
                    e
                );
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config, Arc::new(provider), store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn staleness_millis(&self) -> i64 {
        i64::try_from(self.config.dashboard.staleness_secs)
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or(i64::MAX)
    }

    pub fn cache(&self) -> &CityWeatherCache {
        &self.cache
    }

    pub fn favourites_store(&self) -> &FavouritesStore {
        &self.favourites
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    // Commands

    /// Fetch `city` in the current temperature unit. See
    /// [`CityWeatherCache::request_fetch`].
    pub fn request_fetch(&self, city: &str) -> impl Future<Output = FetchOutcome> + Send + 'static {
        self.cache.request_fetch(city, self.settings.temperature_unit())
    }

    /// Fetch several cities in the current temperature unit, all-settled.
    pub async fn fetch_cities(&self, cities: &[String]) -> RefreshSummary {
        let units = self.settings.temperature_unit();
        self.cache
            .fetch_all(cities.iter().map(|c| (c.clone(), units)).collect())
            .await
    }

    pub async fn refresh_all(&self) -> RefreshSummary {
        self.cache.refresh_all().await
    }

    /// Refetch cities older than `dashboard.staleness_secs`.
    pub async fn refresh_stale(&self) -> RefreshSummary {
        self.cache
            .refresh_stale(now_epoch_millis(), self.staleness_millis())
            .await
    }

    /// Fetch every favourite that has no snapshot yet.
    pub async fn sync_favourites(&self) -> RefreshSummary {
        let pending = self.selectors.pending_favourites(&self.cache, &self.favourites);
        if pending.is_empty() {
            return RefreshSummary::default();
        }

        tracing::debug!("Syncing {} favourites", pending.len());
        self.fetch_cities(&pending).await
    }

    pub fn remove(&self, city: &str) -> bool {
        self.cache.remove(city)
    }

    /// Returns true if `city` is now a favourite.
    pub fn toggle_favourite(&self, city: &str) -> bool {
        self.favourites.toggle(city)
    }

    /// Returns false if `value` is not valid for `field`.
    pub fn set_setting(&self, field: SettingField, value: &str) -> bool {
        self.settings.set(field, value)
    }

    pub fn toggle_temperature_unit(&self) -> UnitSystem {
        self.settings.toggle_temperature_unit()
    }

    /// Choose the city analytics are shown for; `None` restores the default.
    pub fn select_analytics_city(&self, city: Option<&str>) {
        *self.analytics_choice.lock() = city.map(str::to_string);
    }

    // Read API

    pub fn all_cities(&self) -> Arc<Vec<Arc<WeatherSnapshot>>> {
        self.selectors.all_cities(&self.cache)
    }

    pub fn city_status(&self, city: &str) -> Arc<FetchStatus> {
        self.selectors.city_status(&self.cache, city)
    }

    pub fn unit_symbol(&self) -> &'static str {
        self.selectors.unit_symbol(&self.settings)
    }

    pub fn favourites(&self) -> Arc<Vec<String>> {
        self.selectors.favourites(&self.favourites)
    }

    pub fn is_favourite(&self, city: &str) -> bool {
        self.selectors.is_favourite(&self.favourites, city)
    }

    pub fn favourite_cities(&self) -> Arc<Vec<Arc<WeatherSnapshot>>> {
        self.selectors.favourite_cities(&self.cache, &self.favourites)
    }

    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    pub fn wind_speed_display(&self, kph: f64) -> String {
        self.selectors.wind_speed_display(&self.settings, kph)
    }

    pub fn is_stale(&self, city: &str) -> bool {
        self.selectors
            .is_stale(&self.cache, city, now_epoch_millis(), self.staleness_millis())
    }

    /// Analytics for the selected city, falling back to the first favourite
    /// and then the first cached city.
    pub fn analytics(&self) -> Option<Arc<AnalyticsSeries>> {
        let choice = self.analytics_choice.lock().clone();
        self.selectors
            .analytics(&self.cache, &self.favourites, choice.as_deref())
    }
}
