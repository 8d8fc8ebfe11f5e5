//! Per-city snapshot cache and the fetch state machine.
//!
//! Each request takes a ticket from a counter and records it as the latest
//! request for its city key. A resolution whose ticket is no longer the
//! latest (a newer request started, or the city was removed) is discarded.
//!
//! Provider calls run as spawned tasks, so every request settles even if
//! nobody awaits it. The cache lock is only held for synchronous
//! bookkeeping, never across the provider call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use skycast_weather::{UnitSystem, WeatherProvider, WeatherSnapshot};
use tokio::runtime::Handle;

use crate::city_key::CityKey;
use crate::fetch_status::FetchStatus;

/// A successfully fetched city.
#[derive(Debug, Clone)]
pub struct CachedCity {
    pub key: CityKey,
    pub snapshot: Arc<WeatherSnapshot>,
    /// Unit system of the request that produced the snapshot
    pub units: UnitSystem,
}

/// How a single fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Snapshot stored under the provider's canonical name
    Applied { city: String },
    /// Provider failed; the message is recorded on the input key
    Failed { city: String, message: String },
    /// A newer request or a removal overtook this one; nothing was written
    Superseded { city: String },
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}

/// Result of a batch of fetches, in request order.
#[derive(Debug, Clone, Default)]
pub struct RefreshSummary {
    pub outcomes: Vec<FetchOutcome>,
}

impl RefreshSummary {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    /// `(city, message)` for every failed fetch.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FetchOutcome::Failed { city, message } => Some((city.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[derive(Default)]
struct CacheState {
    /// Insertion ordered; an update replaces the entry in place
    cities: Arc<Vec<CachedCity>>,
    statuses: Arc<HashMap<CityKey, Arc<FetchStatus>>>,
    latest_request: HashMap<CityKey, u64>,
    next_request: u64,
    /// Last ticket issued before each removal. A pending fetch typed as an
    /// alias resolves to a canonical key it holds no ticket for, so this is
    /// what keeps it from recreating a removed city.
    removed_at: HashMap<CityKey, u64>,
}

impl CacheState {
    fn set_status(&mut self, key: CityKey, status: FetchStatus) {
        if self.statuses.get(&key).map(|s| s.as_ref()) == Some(&status) {
            return;
        }
        Arc::make_mut(&mut self.statuses).insert(key, Arc::new(status));
    }

    fn clear_status(&mut self, key: &CityKey) {
        if self.statuses.contains_key(key) {
            Arc::make_mut(&mut self.statuses).remove(key);
        }
    }

    fn settle(
        &mut self,
        city: String,
        key: CityKey,
        ticket: u64,
        units: UnitSystem,
        result: Result<WeatherSnapshot, String>,
    ) -> FetchOutcome {
        if self.latest_request.get(&key) != Some(&ticket) {
            tracing::debug!("Fetch #{} for '{}' superseded, discarding", ticket, city);
            return FetchOutcome::Superseded { city };
        }
        self.latest_request.remove(&key);

        match result {
            Ok(snapshot) => {
                let canonical = CityKey::new(&snapshot.city);
                let name = snapshot.city.clone();

                if self.removed_at.get(&canonical).is_some_and(|&last| ticket <= last) {
                    tracing::debug!("'{}' removed during fetch #{}, discarding", name, ticket);
                    self.clear_status(&key);
                    return FetchOutcome::Superseded { city };
                }

                self.upsert(CachedCity {
                    key: canonical.clone(),
                    snapshot: Arc::new(snapshot),
                    units,
                });

                // A request typed as the canonical name may still be running.
                if canonical == key || !self.latest_request.contains_key(&canonical) {
                    self.set_status(canonical.clone(), FetchStatus::Success);
                }
                if canonical != key {
                    self.clear_status(&key);
                }

                tracing::info!("Fetched weather for {}", name);
                FetchOutcome::Applied { city: name }
            }
            Err(message) => {
                tracing::warn!("Fetch for '{}' failed: {}", city, message);
                self.set_status(key, FetchStatus::Error(message.clone()));
                FetchOutcome::Failed { city, message }
            }
        }
    }

    fn upsert(&mut self, entry: CachedCity) {
        let cities = Arc::make_mut(&mut self.cities);
        match cities.iter_mut().find(|c| c.key == entry.key) {
            Some(existing) => *existing = entry,
            None => cities.push(entry),
        }
    }
}

/// Snapshot cache keyed by [`CityKey`].
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct CityWeatherCache {
    state: Arc<Mutex<CacheState>>,
    provider: Arc<dyn WeatherProvider>,
}

impl CityWeatherCache {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            provider,
        }
    }

    /// Start fetching `city`.
    ///
    /// The input key is marked loading before this returns and the provider
    /// call is spawned onto the current Tokio runtime. Awaiting the returned
    /// future yields the outcome; dropping it leaves the fetch running.
    /// Outside a runtime the request fails immediately with an error status.
    pub fn request_fetch(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let key = CityKey::new(city);
        let ticket = {
            let mut state = self.state.lock();
            state.next_request += 1;
            let ticket = state.next_request;
            state.latest_request.insert(key.clone(), ticket);
            state.set_status(key.clone(), FetchStatus::Loading);
            ticket
        };

        tracing::debug!("Fetch #{} started for '{}' ({})", ticket, city, units);

        let state = Arc::clone(&self.state);
        let city = city.to_string();

        let task = match Handle::try_current() {
            Ok(runtime) => {
                let provider = Arc::clone(&self.provider);
                let state = Arc::clone(&state);
                let city = city.clone();
                let key = key.clone();
                Ok(runtime.spawn(async move {
                    let result = provider.fetch(&city, units).await.map_err(|e| e.to_string());
                    Self::resolve(&state, city, key, ticket, units, result)
                }))
            }
            Err(e) => {
                tracing::error!("Cannot fetch '{}' without an async runtime: {}", city, e);
                let message = format!("No async runtime available: {}", e);
                Err(Self::resolve(&state, city.clone(), key.clone(), ticket, units, Err(message)))
            }
        };

        async move {
            match task {
                Ok(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let message = format!("Fetch task failed: {}", e);
                        Self::resolve(&state, city, key, ticket, units, Err(message))
                    }
                },
                Err(outcome) => outcome,
            }
        }
    }

    fn resolve(
        state: &Mutex<CacheState>,
        city: String,
        key: CityKey,
        ticket: u64,
        units: UnitSystem,
        result: Result<WeatherSnapshot, String>,
    ) -> FetchOutcome {
        let mut state = state.lock();
        let outcome = state.settle(city, key, ticket, units, result);

        if state.latest_request.is_empty() {
            state.removed_at.clear();
        }
        outcome
    }

    /// Drop the snapshot and status for `city`. Any fetch still in flight for
    /// it, including one typed as an alias that resolves to `city`, will be
    /// discarded. Returns true if anything was removed.
    pub fn remove(&self, city: &str) -> bool {
        let key = CityKey::new(city);
        let mut state = self.state.lock();

        let had_pending = state.latest_request.remove(&key).is_some();
        let had_status = state.statuses.contains_key(&key);
        let had_city = state.cities.iter().any(|c| c.key == key);

        if had_city {
            Arc::make_mut(&mut state.cities).retain(|c| c.key != key);
        }
        state.clear_status(&key);

        if !state.latest_request.is_empty() {
            let last_ticket = state.next_request;
            state.removed_at.insert(key.clone(), last_ticket);
        }

        let removed = had_pending || had_status || had_city;
        if removed {
            tracing::debug!("Removed '{}' from cache", key);
        }
        removed
    }

    /// Fetch every `(city, units)` pair concurrently and wait for all of them.
    ///
    /// All requests are marked loading before the first one is polled. One
    /// failure never prevents the others from completing.
    pub async fn fetch_all(&self, requests: Vec<(String, UnitSystem)>) -> RefreshSummary {
        let fetches: Vec<_> = requests
            .iter()
            .map(|(city, units)| self.request_fetch(city, *units))
            .collect();

        RefreshSummary {
            outcomes: join_all(fetches).await,
        }
    }

    /// Refetch every cached city with the unit system it was last fetched in.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let requests = self
            .cities()
            .iter()
            .map(|c| (c.snapshot.city.clone(), c.units))
            .collect();

        let summary = self.fetch_all(requests).await;
        tracing::info!(
            "Refreshed {} of {} cities",
            summary.applied(),
            summary.outcomes.len()
        );
        summary
    }

    /// Refetch only cities whose snapshot is at least `threshold_millis` old.
    pub async fn refresh_stale(&self, now_millis: i64, threshold_millis: i64) -> RefreshSummary {
        let requests = self
            .cities()
            .iter()
            .filter(|c| c.snapshot.is_stale(now_millis, threshold_millis))
            .map(|c| (c.snapshot.city.clone(), c.units))
            .collect();

        self.fetch_all(requests).await
    }

    /// All cached cities in insertion order.
    ///
    /// Returns the same allocation until a snapshot is added, replaced or removed.
    pub fn cities(&self) -> Arc<Vec<CachedCity>> {
        Arc::clone(&self.state.lock().cities)
    }

    /// Status map. Cities never requested are absent.
    pub fn statuses(&self) -> Arc<HashMap<CityKey, Arc<FetchStatus>>> {
        Arc::clone(&self.state.lock().statuses)
    }

    /// Recorded status for `city`, `None` if it was never requested.
    pub fn status(&self, city: &str) -> Option<Arc<FetchStatus>> {
        self.state.lock().statuses.get(&CityKey::new(city)).cloned()
    }

    pub fn get(&self, city: &str) -> Option<Arc<WeatherSnapshot>> {
        let key = CityKey::new(city);
        self.state
            .lock()
            .cities
            .iter()
            .find(|c| c.key == key)
            .map(|c| Arc::clone(&c.snapshot))
    }

    pub fn contains(&self, city: &str) -> bool {
        let key = CityKey::new(city);
        self.state.lock().cities.iter().any(|c| c.key == key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().cities.is_empty()
    }
}
