//! Fixed-capacity least-recently-used cache of place resolutions.

use hashbrown::HashMap;
use std::collections::BTreeMap;

use crate::models::Resolution;

struct Slot {
    resolution: Resolution,
    last_used: u64,
}

/// Place string -> resolution, evicting the least recently used entry once
/// more than `capacity` places are held. Keys are used verbatim.
pub struct PlaceCache {
    capacity: usize,
    clock: u64,
    entries: HashMap<String, Slot>,
    /// last_used tick -> key, oldest first
    recency: BTreeMap<u64, String>,
}

impl PlaceCache {
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a cache holding at most `capacity` places (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            clock: 0,
            entries: HashMap::with_capacity(capacity),
            recency: BTreeMap::new(),
        }
    }

    /// Look up a place and mark it as most recently used.
    pub fn get(&mut self, place: &str) -> Option<Resolution> {
        let tick = self.tick();
        let slot = self.entries.get_mut(place)?;
        self.recency.remove(&slot.last_used);
        slot.last_used = tick;
        self.recency.insert(tick, place.to_string());
        Some(slot.resolution)
    }

    pub fn insert(&mut self, place: &str, resolution: Resolution) {
        let tick = self.tick();
        if let Some(slot) = self.entries.get_mut(place) {
            self.recency.remove(&slot.last_used);
            slot.resolution = resolution;
            slot.last_used = tick;
        } else {
            self.entries.insert(
                place.to_string(),
                Slot {
                    resolution,
                    last_used: tick,
                },
            );
        }
        self.recency.insert(tick, place.to_string());

        while self.entries.len() > self.capacity {
            match self.recency.pop_first() {
                Some((_, oldest)) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn contains(&self, place: &str) -> bool {
        self.entries.contains_key(place)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl Default for PlaceCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
