//! Read-only projections over the stores.
//!
//! Memoized projections remember the `Arc` they were computed from and hand
//! back the previous result while the store still returns that same `Arc`,
//! so consumers can compare outputs with `Arc::ptr_eq` to skip work.

use std::sync::Arc;

use parking_lot::Mutex;
use skycast_weather::{derive_series, AnalyticsSeries, WeatherSnapshot};

use crate::city_cache::{CachedCity, CityWeatherCache};
use crate::city_key::CityKey;
use crate::favourites::FavouritesStore;
use crate::fetch_status::FetchStatus;
use crate::settings::SettingsStore;

type Snapshots = Arc<Vec<Arc<WeatherSnapshot>>>;

struct CitiesMemo {
    source: Arc<Vec<CachedCity>>,
    output: Snapshots,
}

struct FavouriteCitiesMemo {
    source: Arc<Vec<CachedCity>>,
    favourites: Arc<Vec<String>>,
    output: Snapshots,
}

struct AnalyticsMemo {
    snapshot: Arc<WeatherSnapshot>,
    output: Arc<AnalyticsSeries>,
}

#[derive(Default)]
pub struct Selectors {
    all_cities: Mutex<Option<CitiesMemo>>,
    favourite_cities: Mutex<Option<FavouriteCitiesMemo>>,
    analytics: Mutex<Option<AnalyticsMemo>>,
    idle: Arc<FetchStatus>,
}

impl Selectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cached snapshot, in insertion order.
    pub fn all_cities(&self, cache: &CityWeatherCache) -> Snapshots {
        let source = cache.cities();
        let mut memo = self.all_cities.lock();

        if let Some(m) = memo.as_ref() {
            if Arc::ptr_eq(&m.source, &source) {
                return Arc::clone(&m.output);
            }
        }

        let output: Snapshots = Arc::new(source.iter().map(|c| Arc::clone(&c.snapshot)).collect());
        *memo = Some(CitiesMemo {
            source,
            output: Arc::clone(&output),
        });
        output
    }

    /// Status of `city`, `Idle` if it was never requested.
    ///
    /// The shared idle value is returned for absent cities; nothing is
    /// written to the cache.
    pub fn city_status(&self, cache: &CityWeatherCache, city: &str) -> Arc<FetchStatus> {
        cache
            .status(city)
            .unwrap_or_else(|| Arc::clone(&self.idle))
    }

    pub fn unit_symbol(&self, settings: &SettingsStore) -> &'static str {
        settings.temperature_unit().symbol()
    }

    pub fn favourites(&self, favourites: &FavouritesStore) -> Arc<Vec<String>> {
        favourites.list()
    }

    pub fn is_favourite(&self, favourites: &FavouritesStore, city: &str) -> bool {
        favourites.contains(city)
    }

    /// Cached snapshots of favourite cities, in favourite order.
    pub fn favourite_cities(
        &self,
        cache: &CityWeatherCache,
        favourites: &FavouritesStore,
    ) -> Snapshots {
        let source = cache.cities();
        let names = favourites.list();
        let mut memo = self.favourite_cities.lock();

        if let Some(m) = memo.as_ref() {
            if Arc::ptr_eq(&m.source, &source) && Arc::ptr_eq(&m.favourites, &names) {
                return Arc::clone(&m.output);
            }
        }

        let output: Snapshots = Arc::new(
            names
                .iter()
                .filter_map(|name| {
                    let key = CityKey::new(name);
                    source.iter().find(|c| c.key == key)
                })
                .map(|c| Arc::clone(&c.snapshot))
                .collect(),
        );
        *memo = Some(FavouriteCitiesMemo {
            source,
            favourites: names,
            output: Arc::clone(&output),
        });
        output
    }

    /// Favourites with no cached snapshot yet.
    pub fn pending_favourites(
        &self,
        cache: &CityWeatherCache,
        favourites: &FavouritesStore,
    ) -> Vec<String> {
        let cities = cache.cities();
        favourites
            .list()
            .iter()
            .filter(|name| {
                let key = CityKey::new(name);
                !cities.iter().any(|c| c.key == key)
            })
            .cloned()
            .collect()
    }

    /// True if `city` has a snapshot at least `threshold_millis` old.
    pub fn is_stale(
        &self,
        cache: &CityWeatherCache,
        city: &str,
        now_millis: i64,
        threshold_millis: i64,
    ) -> bool {
        cache
            .get(city)
            .is_some_and(|s| s.is_stale(now_millis, threshold_millis))
    }

    /// `kph` converted to the preferred wind unit, with its label.
    pub fn wind_speed_display(&self, settings: &SettingsStore, kph: f64) -> String {
        let unit = settings.wind_speed_unit();
        format!("{} {}", unit.convert_from_kph(kph), unit.label())
    }

    /// The snapshot analytics should be shown for: `choice` if cached, else the
    /// first favourite if cached, else the first cached city.
    pub fn analytics_source(
        &self,
        cache: &CityWeatherCache,
        favourites: &FavouritesStore,
        choice: Option<&str>,
    ) -> Option<Arc<WeatherSnapshot>> {
        choice
            .and_then(|city| cache.get(city))
            .or_else(|| favourites.list().first().and_then(|city| cache.get(city)))
            .or_else(|| cache.cities().first().map(|c| Arc::clone(&c.snapshot)))
    }

    /// Analytics for the selected city, `None` when nothing is cached.
    ///
    /// Recomputed only when the selected snapshot is a different allocation
    /// from the last call.
    pub fn analytics(
        &self,
        cache: &CityWeatherCache,
        favourites: &FavouritesStore,
        choice: Option<&str>,
    ) -> Option<Arc<AnalyticsSeries>> {
        let snapshot = self.analytics_source(cache, favourites, choice)?;
        let mut memo = self.analytics.lock();

        if let Some(m) = memo.as_ref() {
            if Arc::ptr_eq(&m.snapshot, &snapshot) {
                return Some(Arc::clone(&m.output));
            }
        }

        let output = Arc::new(derive_series(&snapshot)?);
        tracing::debug!("Derived analytics for {}", snapshot.city);
        *memo = Some(AnalyticsMemo {
            snapshot,
            output: Arc::clone(&output),
        });
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::kv::MemoryStore;
    use skycast_weather::{MockProvider, UnitSystem, WindSpeedUnit};

    struct Fixture {
        cache: CityWeatherCache,
        favourites: FavouritesStore,
        settings: SettingsStore,
        selectors: Selectors,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            cache: CityWeatherCache::new(Arc::new(MockProvider::new())),
            favourites: FavouritesStore::load(store.clone()),
            settings: SettingsStore::load(store),
            selectors: Selectors::new(),
        }
    }

    #[tokio::test]
    async fn all_cities_is_stable_until_cache_changes() {
        let f = fixture();
        f.cache.request_fetch("Paris", UnitSystem::Metric).await;

        let first = f.selectors.all_cities(&f.cache);
        let second = f.selectors.all_cities(&f.cache);
        assert!(Arc::ptr_eq(&first, &second));

        f.favourites.toggle("Paris");
        assert!(Arc::ptr_eq(&first, &f.selectors.all_cities(&f.cache)));

        f.cache.request_fetch("Oslo", UnitSystem::Metric).await;
        let third = f.selectors.all_cities(&f.cache);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
        assert_eq!(third[1].city, "Oslo");
    }

    #[tokio::test]
    async fn status_defaults_to_idle_without_storing() {
        let f = fixture();
        assert_eq!(*f.selectors.city_status(&f.cache, "Lima"), FetchStatus::Idle);
        assert!(f.cache.status("Lima").is_none());
        assert!(f.cache.statuses().is_empty());
    }

    #[test]
    fn unit_symbol_follows_setting() {
        let f = fixture();
        assert_eq!(f.selectors.unit_symbol(&f.settings), "°C");
        f.settings.toggle_temperature_unit();
        assert_eq!(f.selectors.unit_symbol(&f.settings), "°F");
    }

    #[test]
    fn wind_display_uses_preferred_unit() {
        let f = fixture();
        assert_eq!(f.selectors.wind_speed_display(&f.settings, 36.0), "36 km/h");
        f.settings.set_wind_speed_unit(WindSpeedUnit::Ms);
        assert_eq!(f.selectors.wind_speed_display(&f.settings, 36.0), "10 m/s");
    }

    #[tokio::test]
    async fn analytics_selection_rule() {
        let f = fixture();
        assert!(f.selectors.analytics(&f.cache, &f.favourites, None).is_none());

        f.cache.request_fetch("Paris", UnitSystem::Metric).await;
        f.cache.request_fetch("Oslo", UnitSystem::Metric).await;

        let series = f.selectors.analytics(&f.cache, &f.favourites, None).unwrap();
        assert_eq!(series.city, "Paris");

        f.favourites.toggle("Lima");
        f.favourites.toggle("oslo");
        let series = f.selectors.analytics(&f.cache, &f.favourites, None).unwrap();
        assert_eq!(series.city, "Paris");

        f.favourites.toggle("Lima");
        let series = f.selectors.analytics(&f.cache, &f.favourites, None).unwrap();
        assert_eq!(series.city, "Oslo");

        let series = f.selectors.analytics(&f.cache, &f.favourites, Some("PARIS")).unwrap();
        assert_eq!(series.city, "Paris");

        let series = f.selectors.analytics(&f.cache, &f.favourites, Some("Atlantis")).unwrap();
        assert_eq!(series.city, "Oslo");
    }

    #[tokio::test]
    async fn analytics_memo_keyed_on_snapshot() {
        let f = fixture();
        f.cache.request_fetch("Paris", UnitSystem::Metric).await;

        let first = f.selectors.analytics(&f.cache, &f.favourites, None).unwrap();
        let again = f.selectors.analytics(&f.cache, &f.favourites, Some("paris")).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        f.cache.request_fetch("Paris", UnitSystem::Metric).await;
        let refreshed = f.selectors.analytics(&f.cache, &f.favourites, None).unwrap();
        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert_eq!(first.points, refreshed.points);
    }

    #[tokio::test]
    async fn favourite_views() {
        let f = fixture();
        f.cache.request_fetch("Paris", UnitSystem::Metric).await;
        f.cache.request_fetch("Oslo", UnitSystem::Metric).await;
        f.favourites.toggle("oslo");
        f.favourites.toggle("Lima");
        f.favourites.toggle("Paris");

        let cities = f.selectors.favourite_cities(&f.cache, &f.favourites);
        let names: Vec<&str> = cities.iter().map(|s| s.city.as_str()).collect();
        assert_eq!(names, vec!["Oslo", "Paris"]);
        assert!(Arc::ptr_eq(&cities, &f.selectors.favourite_cities(&f.cache, &f.favourites)));

        assert_eq!(
            f.selectors.pending_favourites(&f.cache, &f.favourites),
            vec!["Lima".to_string()]
        );
        assert!(f.selectors.is_favourite(&f.favourites, "LIMA"));
    }

    #[tokio::test]
    async fn staleness_by_city() {
        let f = fixture();
        f.cache.request_fetch("Paris", UnitSystem::Metric).await;
        let fetched_at = f.cache.get("Paris").unwrap().fetched_at_epoch_millis;

        assert!(!f.selectors.is_stale(&f.cache, "paris", fetched_at + 59_999, 60_000));
        assert!(f.selectors.is_stale(&f.cache, "paris", fetched_at + 60_000, 60_000));
        assert!(!f.selectors.is_stale(&f.cache, "Lima", fetched_at + 60_000, 60_000));
    }
}
