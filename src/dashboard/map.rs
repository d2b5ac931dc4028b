use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::enrich::{derived_column, CoordinateSuffix};
use crate::models::{normalize_column_name, PersonLocation};

/// Point feature in GeoJSON-like format
#[derive(Debug, Serialize)]
pub struct PointFeature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub geometry: PointGeometry,
    pub properties: PointProperties,
}

#[derive(Debug, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub geo_type: &'static str,
    /// [lon, lat]
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct PointProperties {
    pub name: Option<String>,
}

impl From<PersonLocation> for PointFeature {
    fn from(person: PersonLocation) -> Self {
        Self {
            feature_type: "Feature",
            geometry: PointGeometry {
                geo_type: "Point",
                coordinates: [person.location.lon, person.location.lat],
            },
            properties: PointProperties { name: person.name },
        }
    }
}

/// Stored latitude and longitude column names for a geocoded column, given
/// either its original (`"Birth place"`) or stored (`"BIRTH_PLACE"`) name.
pub fn coordinate_columns(column: &str) -> (String, String) {
    (
        normalize_column_name(&derived_column(column, CoordinateSuffix::Latitude)),
        normalize_column_name(&derived_column(column, CoordinateSuffix::Longitude)),
    )
}

/// Keep people whose name contains `needle`, ignoring case.
pub fn filter_by_name(points: &mut Vec<PersonLocation>, needle: &str) {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return;
    }
    points.retain(|p| {
        p.name
            .as_deref()
            .map(|name| name.to_lowercase().contains(&needle))
            .unwrap_or(false)
    });
}

/// Map jitter when the request does not name one, in degrees
pub const DEFAULT_JITTER: f64 = 0.001;

/// Largest jitter a request may ask for, in degrees
pub const MAX_JITTER: f64 = 1.0;

/// Requested jitter if it lies within `0..=MAX_JITTER`.
pub fn checked_jitter(requested: f64) -> Option<f64> {
    (0.0..=MAX_JITTER).contains(&requested).then_some(requested)
}

/// Add normal noise with standard deviation `scale` degrees to every point
/// so people at the same place do not hide each other. The scale is taken
/// as absolute and capped at `MAX_JITTER`.
pub fn jitter<R: Rng + ?Sized>(points: &mut [PersonLocation], scale: f64, rng: &mut R) {
    if scale.is_nan() || scale == 0.0 {
        return;
    }
    let scale = scale.abs().min(MAX_JITTER);
    let Ok(noise) = Normal::new(0.0, scale) else {
        return;
    };
    for p in points {
        p.location.lat += noise.sample(rng);
        p.location.lon += noise.sample(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn person(name: Option<&str>, lat: f64, lon: f64) -> PersonLocation {
        PersonLocation {
            name: name.map(str::to_string),
            location: GeoPoint::new(lat, lon),
        }
    }

    #[test]
    fn test_coordinate_columns() {
        let expected = (
            "BIRTH_PLACE_LATITUDE".to_string(),
            "BIRTH_PLACE_LONGITUDE".to_string(),
        );
        assert_eq!(coordinate_columns("BIRTH_PLACE"), expected);
        assert_eq!(coordinate_columns("Birth place"), expected);
    }

    #[test]
    fn test_filter_by_name() {
        let mut points = vec![
            person(Some("Agim Nushi"), 1.0, 1.0),
            person(Some("Drita Krasniqi"), 2.0, 2.0),
            person(None, 3.0, 3.0),
        ];
        filter_by_name(&mut points, "nushi");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name.as_deref(), Some("Agim Nushi"));

        let mut all = vec![person(None, 3.0, 3.0)];
        filter_by_name(&mut all, "  ");
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_jitter_spreads_points_near_origin() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut points = vec![person(Some("a"), 42.0, 20.0); 50];
        jitter(&mut points, DEFAULT_JITTER, &mut rng);

        for p in &points {
            assert!((p.location.lat - 42.0).abs() <= 0.01);
            assert!((p.location.lon - 20.0).abs() <= 0.01);
        }
        assert!(points.iter().any(|p| p.location != GeoPoint::new(42.0, 20.0)));

        let mut still = vec![person(Some("a"), 42.0, 20.0)];
        jitter(&mut still, 0.0, &mut rng);
        jitter(&mut still, f64::NAN, &mut rng);
        assert_eq!(still[0].location, GeoPoint::new(42.0, 20.0));
    }

    #[test]
    fn test_oversized_jitter_is_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut points = vec![person(Some("a"), 42.0, 20.0); 20];
        jitter(&mut points, 1e308, &mut rng);

        for p in &points {
            assert!(p.location.lat.is_finite() && p.location.lon.is_finite());
            assert!((p.location.lat - 42.0).abs() <= 10.0 * MAX_JITTER);
            assert!((p.location.lon - 20.0).abs() <= 10.0 * MAX_JITTER);
        }

        let mut infinite = vec![person(Some("a"), 42.0, 20.0)];
        jitter(&mut infinite, f64::INFINITY, &mut rng);
        assert!((infinite[0].location.lat - 42.0).abs() <= 10.0 * MAX_JITTER);
    }

    #[test]
    fn test_negative_jitter_uses_its_magnitude() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut points = vec![person(Some("a"), 42.0, 20.0); 20];
        jitter(&mut points, -DEFAULT_JITTER, &mut rng);

        for p in &points {
            assert!((p.location.lat - 42.0).abs() <= 0.01);
        }
        assert!(points.iter().any(|p| p.location != GeoPoint::new(42.0, 20.0)));
    }

    #[test]
    fn test_checked_jitter_bounds() {
        assert_eq!(checked_jitter(0.0), Some(0.0));
        assert_eq!(checked_jitter(DEFAULT_JITTER), Some(DEFAULT_JITTER));
        assert_eq!(checked_jitter(MAX_JITTER), Some(MAX_JITTER));
        assert_eq!(checked_jitter(-0.001), None);
        assert_eq!(checked_jitter(500.0), None);
        assert_eq!(checked_jitter(1e308), None);
        assert_eq!(checked_jitter(f64::NAN), None);
        assert_eq!(checked_jitter(f64::INFINITY), None);
    }

    #[test]
    fn test_feature_is_lon_lat() {
        let feature = PointFeature::from(person(Some("Agim"), 42.38, 20.43));
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["coordinates"][0], 20.43);
        assert_eq!(json["geometry"]["coordinates"][1], 42.38);
        assert_eq!(json["properties"]["name"], "Agim");
    }
}
