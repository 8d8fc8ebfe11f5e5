//! Starred cities, persisted as a JSON array.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::city_key::CityKey;
use crate::kv::KeyValueStore;

pub const FAVOURITES_KEY: &str = "favourites";

/// Ordered, case-insensitively unique list of starred city names.
///
/// Names keep the casing they were added with. The list is copy-on-write:
/// [`FavouritesStore::list`] hands out the current `Arc`, which stays the same
/// allocation until the next mutation.
pub struct FavouritesStore {
    cities: Mutex<Arc<Vec<String>>>,
    store: Arc<dyn KeyValueStore>,
}

impl FavouritesStore {
    /// Read the persisted list. Any fault yields an empty list.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let cities = match store.get(FAVOURITES_KEY) {
            Ok(Some(raw)) => Self::parse(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read favourites, starting empty: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} favourites", cities.len());

        Self {
            cities: Mutex::new(Arc::new(cities)),
            store,
        }
    }

    fn parse(raw: &str) -> Vec<String> {
        let parsed: Vec<String> = match serde_json::from_str(raw) {
            Ok(cities) => cities,
            Err(e) => {
                tracing::warn!("Stored favourites are malformed, starting empty: {}", e);
                return Vec::new();
            }
        };

        // A hand-edited database may hold case duplicates; keep the first.
        let mut unique: Vec<String> = Vec::with_capacity(parsed.len());
        for city in parsed {
            if !unique.iter().any(|c| CityKey::new(c).matches(&city)) {
                unique.push(city);
            }
        }
        unique
    }

    /// Current list.
    pub fn list(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.cities.lock())
    }

    pub fn contains(&self, city: &str) -> bool {
        let key = CityKey::new(city);
        self.cities.lock().iter().any(|c| key.matches(c))
    }

    pub fn len(&self) -> usize {
        self.cities.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.lock().is_empty()
    }

    /// Add `city` if absent, remove it otherwise. Returns true if it is now a favourite.
    pub fn toggle(&self, city: &str) -> bool {
        let key = CityKey::new(city);
        let mut guard = self.cities.lock();
        let cities = Arc::make_mut(&mut guard);

        let added = match cities.iter().position(|c| key.matches(c)) {
            Some(index) => {
                cities.remove(index);
                false
            }
            None => {
                cities.push(city.to_string());
                true
            }
        };

        tracing::debug!(
            "Favourite '{}' {}",
            city,
            if added { "added" } else { "removed" }
        );
        self.persist(cities);
        added
    }

    /// Append `city` unless an entry with the same key exists. Returns true if added.
    pub fn add(&self, city: &str) -> bool {
        let key = CityKey::new(city);
        let mut guard = self.cities.lock();
        if guard.iter().any(|c| key.matches(c)) {
            return false;
        }

        let cities = Arc::make_mut(&mut guard);
        cities.push(city.to_string());
        self.persist(cities);
        true
    }

    /// Remove every entry matching `city`. Returns true if anything was removed.
    pub fn remove(&self, city: &str) -> bool {
        let key = CityKey::new(city);
        let mut guard = self.cities.lock();
        if !guard.iter().any(|c| key.matches(c)) {
            return false;
        }

        let cities = Arc::make_mut(&mut guard);
        cities.retain(|c| !key.matches(c));
        self.persist(cities);
        true
    }

    fn persist(&self, cities: &[String]) {
        let raw = match serde_json::to_string(cities) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not serialize favourites: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set(FAVOURITES_KEY, &raw) {
            tracing::warn!("Could not save favourites: {}", e);
        }
    }
}
