//! Place-name geocoding with a per-run memoizing resolver.

mod cache;
#[cfg(test)]
pub(crate) mod fake;
mod google;
mod resolver;

pub use cache::PlaceCache;
pub use google::{GoogleGeocoder, DEFAULT_ENDPOINT};
pub use resolver::{PlaceResolver, ResolverStats};

use thiserror::Error;

use crate::models::GeoPoint;

/// Errors from a geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a status that only affects this request
    #[error("geocoder returned {status}: {message}")]
    Status { status: String, message: String },

    /// Provider refused the credentials; every further request would fail too
    #[error("geocoder rejected the request ({status}): {message}")]
    Rejected { status: String, message: String },
}

impl GeocodeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, GeocodeError::Rejected { .. })
    }
}

/// One place string in, the first candidate's coordinates (or nothing) out.
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}
