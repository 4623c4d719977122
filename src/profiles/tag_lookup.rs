//! Tag lookup utility for profiles
//!
//! Provides convenient access to the key/value tag list of a way.

/// Borrowed view over a way's tags
#[derive(Debug, Clone, Copy)]
pub struct TagLookup<'a> {
    tags: &'a [(String, String)],
}

impl<'a> TagLookup<'a> {
    pub fn new(tags: &'a [(String, String)]) -> Self {
        Self { tags }
    }

    /// Get a tag value by key name
    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    /// True if `key` carries one of the usual affirmative values
    pub fn is_yes(&self, key: &str) -> bool {
        matches!(self.get_str(key), Some("yes" | "true" | "1"))
    }

    /// Parse a `maxspeed`-style value in km/h. Handles plain numbers and "mph" suffixes.
    pub fn get_speed_kmh(&self, key: &str) -> Option<f64> {
        let raw = self.get_str(key)?.trim();
        if let Some(mph) = raw.strip_suffix("mph") {
            return mph.trim().parse::<f64>().ok().map(|v| v * 1.609_344);
        }
        raw.trim_end_matches("km/h")
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| *v > 0.0)
    }
}
