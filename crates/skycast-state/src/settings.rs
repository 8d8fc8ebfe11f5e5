//! User preferences: temperature unit, wind-speed unit and theme.
//!
//! Each field is stored under its own key as the raw enum string. Loading and
//! saving never fail: bad or missing values fall back to defaults and write
//! faults are logged.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use skycast_core::ValidationError;
use skycast_weather::{UnitSystem, WindSpeedUnit};

use crate::kv::KeyValueStore;

pub const TEMPERATURE_UNIT_KEY: &str = "temperature_unit";
pub const WIND_SPEED_UNIT_KEY: &str = "wind_speed_unit";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            "auto" => Ok(Self::Auto),
            other => Err(ValidationError::new("theme", other)),
        }
    }
}

/// A settable preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    TemperatureUnit,
    WindSpeedUnit,
    Theme,
}

impl SettingField {
    pub const ALL: [SettingField; 3] = [
        SettingField::TemperatureUnit,
        SettingField::WindSpeedUnit,
        SettingField::Theme,
    ];

    /// Storage key, also accepted as the field's name on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TemperatureUnit => TEMPERATURE_UNIT_KEY,
            Self::WindSpeedUnit => WIND_SPEED_UNIT_KEY,
            Self::Theme => THEME_KEY,
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SettingField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature_unit" | "unit" => Ok(Self::TemperatureUnit),
            "wind_speed_unit" | "wind" => Ok(Self::WindSpeedUnit),
            "theme" => Ok(Self::Theme),
            other => Err(ValidationError::new("setting", other)),
        }
    }
}

/// Snapshot of all preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub temperature_unit: UnitSystem,
    pub wind_speed_unit: WindSpeedUnit,
    pub theme: Theme,
}

impl Settings {
    /// Current value of `field` as its stored string.
    pub fn value_of(&self, field: SettingField) -> &'static str {
        match field {
            SettingField::TemperatureUnit => self.temperature_unit.as_str(),
            SettingField::WindSpeedUnit => self.wind_speed_unit.as_str(),
            SettingField::Theme => self.theme.as_str(),
        }
    }
}

pub struct SettingsStore {
    state: Mutex<Settings>,
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    /// Read every field, falling back to its default on any problem.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = Settings {
            temperature_unit: load_field(store.as_ref(), TEMPERATURE_UNIT_KEY),
            wind_speed_unit: load_field(store.as_ref(), WIND_SPEED_UNIT_KEY),
            theme: load_field(store.as_ref(), THEME_KEY),
        };

        tracing::debug!(
            "Loaded settings: unit={}, wind={}, theme={}",
            settings.temperature_unit,
            settings.wind_speed_unit,
            settings.theme
        );

        Self {
            state: Mutex::new(settings),
            store,
        }
    }

    pub fn get(&self) -> Settings {
        *self.state.lock()
    }

    pub fn temperature_unit(&self) -> UnitSystem {
        self.state.lock().temperature_unit
    }

    pub fn wind_speed_unit(&self) -> WindSpeedUnit {
        self.state.lock().wind_speed_unit
    }

    pub fn theme(&self) -> Theme {
        self.state.lock().theme
    }

    /// Set `field` from its string form.
    ///
    /// An invalid value leaves the state untouched. Returns true if applied.
    pub fn set(&self, field: SettingField, value: &str) -> bool {
        let applied = match field {
            SettingField::TemperatureUnit => value
                .parse::<UnitSystem>()
                .map(|unit| self.set_temperature_unit(unit)),
            SettingField::WindSpeedUnit => value
                .parse::<WindSpeedUnit>()
                .map(|unit| self.set_wind_speed_unit(unit)),
            SettingField::Theme => value.parse::<Theme>().map(|theme| self.set_theme(theme)),
        };

        match applied {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Ignoring setting change: {}", e);
                false
            }
        }
    }

    pub fn set_temperature_unit(&self, unit: UnitSystem) {
        self.state.lock().temperature_unit = unit;
        self.persist(TEMPERATURE_UNIT_KEY, unit.as_str());
    }

    pub fn set_wind_speed_unit(&self, unit: WindSpeedUnit) {
        self.state.lock().wind_speed_unit = unit;
        self.persist(WIND_SPEED_UNIT_KEY, unit.as_str());
    }

    pub fn set_theme(&self, theme: Theme) {
        self.state.lock().theme = theme;
        self.persist(THEME_KEY, theme.as_str());
    }

    /// Flip metric and imperial. Returns the new unit.
    pub fn toggle_temperature_unit(&self) -> UnitSystem {
        let unit = {
            let mut state = self.state.lock();
            state.temperature_unit = state.temperature_unit.toggled();
            state.temperature_unit
        };
        self.persist(TEMPERATURE_UNIT_KEY, unit.as_str());
        unit
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Could not save setting '{}': {}", key, e);
        }
    }
}

fn load_field<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: FromStr<Err = ValidationError> + Default,
{
    match store.get(key) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Ignoring stored setting: {}", e);
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("Could not read setting '{}': {}", key, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::kv::MemoryStore;

    #[test]
    fn defaults_when_nothing_stored() {
        let settings = SettingsStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(
            settings.get(),
            Settings {
                temperature_unit: UnitSystem::Metric,
                wind_speed_unit: WindSpeedUnit::Kph,
                theme: Theme::Dark,
            }
        );
    }

    #[test]
    fn corrupt_theme_falls_back_to_dark() {
        let store = MemoryStore::new()
            .with_value(THEME_KEY, "neon")
            .with_value(WIND_SPEED_UNIT_KEY, "mph");
        let settings = SettingsStore::load(Arc::new(store));

        assert_eq!(settings.theme(), Theme::Dark);
        assert_eq!(settings.wind_speed_unit(), WindSpeedUnit::Mph);
    }

    #[test]
    fn read_failure_falls_back_to_defaults() {
        let store = MemoryStore::new().with_value(TEMPERATURE_UNIT_KEY, "imperial");
        store.set_fail_reads(true);
        let settings = SettingsStore::load(Arc::new(store));
        assert_eq!(settings.temperature_unit(), UnitSystem::Metric);
    }

    #[test]
    fn set_persists_only_that_field() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(store.clone());

        assert!(settings.set(SettingField::Theme, "light"));
        assert_eq!(settings.theme(), Theme::Light);
        assert_eq!(store.peek(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(store.peek(TEMPERATURE_UNIT_KEY), None);
        assert_eq!(store.peek(WIND_SPEED_UNIT_KEY), None);
    }

    #[test]
    fn invalid_value_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(store.clone());
        settings.set(SettingField::WindSpeedUnit, "ms");

        assert!(!settings.set(SettingField::WindSpeedUnit, "knots"));
        assert!(!settings.set(SettingField::Theme, "Dark"));
        assert_eq!(settings.wind_speed_unit(), WindSpeedUnit::Ms);
        assert_eq!(settings.theme(), Theme::Dark);
        assert_eq!(store.peek(THEME_KEY), None);
    }

    #[test]
    fn toggle_flips_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(store.clone());

        assert_eq!(settings.toggle_temperature_unit(), UnitSystem::Imperial);
        assert_eq!(store.peek(TEMPERATURE_UNIT_KEY).as_deref(), Some("imperial"));
        assert_eq!(settings.toggle_temperature_unit(), UnitSystem::Metric);
    }

    #[test]
    fn write_failure_still_updates_state() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(store.clone());
        store.set_fail_writes(true);

        settings.set_theme(Theme::Auto);
        assert_eq!(settings.theme(), Theme::Auto);
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("unit".parse::<SettingField>(), Ok(SettingField::TemperatureUnit));
        assert_eq!("wind_speed_unit".parse::<SettingField>(), Ok(SettingField::WindSpeedUnit));
        assert!("colour".parse::<SettingField>().is_err());
    }
}
