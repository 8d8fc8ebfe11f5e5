use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skycast_core::ValidationError;

/// Unit system requested from the provider.
///
/// Doubles as the temperature-unit preference: metric is °C, imperial is °F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Temperature symbol shown next to values fetched in this system.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Metric => Self::Imperial,
            Self::Imperial => Self::Metric,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(ValidationError::new("temperature unit", other)),
        }
    }
}

/// Display unit for wind speed. Snapshots always carry km/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kph,
    Ms,
    Mph,
}

const KPH_PER_MS: f64 = 3.6;
const MPH_PER_KPH: f64 = 0.621371;

impl WindSpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kph => "kph",
            Self::Ms => "ms",
            Self::Mph => "mph",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Kph => "km/h",
            Self::Ms => "m/s",
            Self::Mph => "mph",
        }
    }

    /// Convert a canonical km/h reading into this unit, rounded to 1 decimal.
    pub fn convert_from_kph(&self, kph: f64) -> f64 {
        let value = match self {
            Self::Kph => kph,
            Self::Ms => kph / KPH_PER_MS,
            Self::Mph => kph * MPH_PER_KPH,
        };
        (value * 10.0).round() / 10.0
    }
}

impl fmt::Display for WindSpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindSpeedUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kph" => Ok(Self::Kph),
            "ms" => Ok(Self::Ms),
            "mph" => Ok(Self::Mph),
            other => Err(ValidationError::new("wind speed unit", other)),
        }
    }
}
