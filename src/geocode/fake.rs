//! In-memory geocoder for tests.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{GeocodeError, Geocoder};
use crate::models::GeoPoint;

/// Answers from a fixed table and records every request.
#[derive(Default)]
pub(crate) struct FakeGeocoder {
    pub known: HashMap<String, GeoPoint>,
    pub transient_failures: Vec<String>,
    pub reject_all: bool,
    pub calls: RefCell<Vec<String>>,
}

impl FakeGeocoder {
    pub fn with_places(places: &[(&str, f64, f64)]) -> Self {
        Self {
            known: places
                .iter()
                .map(|(name, lat, lon)| (name.to_string(), GeoPoint::new(*lat, *lon)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Geocoder for FakeGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        self.calls.borrow_mut().push(place.to_string());
        if self.reject_all {
            return Err(GeocodeError::Rejected {
                status: "REQUEST_DENIED".to_string(),
                message: "bad key".to_string(),
            });
        }
        if self.transient_failures.iter().any(|p| p == place) {
            return Err(GeocodeError::Status {
                status: "UNKNOWN_ERROR".to_string(),
                message: String::new(),
            });
        }
        Ok(self.known.get(place).copied())
    }
}
