//! Memoizing place resolver.

use tracing::{debug, warn};

use super::{GeocodeError, Geocoder, PlaceCache};
use crate::models::Resolution;

/// Counters for one resolver's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Non-blank places asked for
    pub lookups: u64,
    /// Lookups answered from the cache
    pub cache_hits: u64,
    /// Requests sent to the geocoder
    pub requests: u64,
    /// Requests that came back without a candidate
    pub misses: u64,
    /// Requests that failed and were recorded as a miss
    pub failures: u64,
}

impl std::fmt::Display for ResolverStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lookups, {} cache hits, {} requests, {} misses, {} failures",
            self.lookups, self.cache_hits, self.requests, self.misses, self.failures
        )
    }
}

/// Resolves place strings through a geocoder, at most once per distinct
/// string while it stays cached. Misses are cached too.
pub struct PlaceResolver<G> {
    geocoder: G,
    cache: PlaceCache,
    stats: ResolverStats,
}

impl<G: Geocoder> PlaceResolver<G> {
    pub fn new(geocoder: G, cache: PlaceCache) -> Self {
        Self {
            geocoder,
            cache,
            stats: ResolverStats::default(),
        }
    }

    /// Resolve one place.
    ///
    /// Blank input resolves to `NoResult` without a request. Only a fatal
    /// provider rejection is returned as an error; anything else that goes
    /// wrong for a single place is logged and cached as `NoResult`.
    pub async fn resolve(&mut self, place: &str) -> Result<Resolution, GeocodeError> {
        if place.trim().is_empty() {
            return Ok(Resolution::NoResult);
        }

        self.stats.lookups += 1;
        if let Some(cached) = self.cache.get(place) {
            self.stats.cache_hits += 1;
            return Ok(cached);
        }

        self.stats.requests += 1;
        let resolution = match self.geocoder.geocode(place).await {
            Ok(Some(point)) => {
                debug!("Resolved '{}' to ({})", place, point);
                Resolution::Found(point)
            }
            Ok(None) => {
                debug!("No geocoding result for '{}'", place);
                self.stats.misses += 1;
                Resolution::NoResult
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Geocoding '{}' failed, recording as no result: {}", place, e);
                self.stats.failures += 1;
                Resolution::NoResult
            }
        };

        self.cache.insert(place, resolution);
        Ok(resolution)
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    pub fn cache(&self) -> &PlaceCache {
        &self.cache
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }
}
