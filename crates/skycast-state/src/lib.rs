//! Client-side state for Skycast
//!
//! Per-city fetch tracking, persisted favourites and settings, and the
//! memoized read views built on top of them.

pub mod app;
pub mod city_cache;
pub mod city_key;
pub mod favourites;
pub mod fetch_status;
pub mod kv;
pub mod selectors;
pub mod settings;

pub use app::App;
pub use city_cache::{CachedCity, CityWeatherCache, FetchOutcome, RefreshSummary};
pub use city_key::CityKey;
pub use favourites::FavouritesStore;
pub use fetch_status::FetchStatus;
pub use kv::{KeyValueStore, MemoryStore, SqliteKvStore};
pub use selectors::Selectors;
pub use settings::{SettingField, Settings, SettingsStore, Theme};
