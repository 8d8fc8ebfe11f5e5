use std::fmt;

/// Case-insensitive identity of a city name.
///
/// `"Paris"`, `"PARIS"` and `"paris"` are the same key. The original casing
/// is not kept here; callers that display a name keep their own copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityKey(String);

impl CityKey {
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// True if `name` normalizes to this key.
    pub fn matches(&self, name: &str) -> bool {
        self.0 == name.to_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CityKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_variants_are_equal() {
        assert_eq!(CityKey::new("Paris"), CityKey::new("PARIS"));
        assert_eq!(CityKey::new("São Paulo"), CityKey::new("SÃO PAULO"));
        assert_ne!(CityKey::new("Paris"), CityKey::new("Paris "));
    }

    #[test]
    fn matches_any_casing() {
        let key = CityKey::new("New York");
        assert!(key.matches("new york"));
        assert!(!key.matches("newyork"));
        assert_eq!(key.as_str(), "new york");
    }
}
