//! Place and coordinate types shared by the resolver and the views.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Render as the `"(lat, lon)"` text stored in the raw coordinates column.
    ///
    /// Debug formatting keeps a decimal point on whole numbers (`12.0`), so the
    /// text always reads back through the coordinate splitter.
    pub fn to_pair_string(&self) -> String {
        format!("({:?}, {:?})", self.lat, self.lon)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// A person placed on a map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonLocation {
    pub name: Option<String>,
    pub location: GeoPoint,
}

/// Outcome of resolving one place string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// First candidate returned by the geocoder
    Found(GeoPoint),
    /// The geocoder had nothing for this place (or failed transiently)
    NoResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_string_keeps_decimal_point() {
        assert_eq!(GeoPoint::new(12.0, -56.78).to_pair_string(), "(12.0, -56.78)");
        assert_eq!(
            GeoPoint::new(42.3803, 20.4308).to_pair_string(),
            "(42.3803, 20.4308)"
        );
    }
}
