//! In-memory triple store backed by DashMap.
//!
//! Used for tests and memory-only sessions. All data is lost on process exit.

use std::collections::BTreeSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StoreError;
use crate::triple::{Element, Pair, Triple};

use super::{StoreResult, TripleStore};

/// Concurrent in-memory store using sharded hashmaps.
#[derive(Debug, Default)]
pub struct MemTripleStore {
    /// Canonical pair → result.
    pairs: DashMap<Pair, Element>,
    /// Element name → pairs whose fact mentions it.
    by_element: DashMap<Element, BTreeSet<Pair>>,
}

impl MemTripleStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: DashMap::with_capacity(capacity),
            by_element: DashMap::with_capacity(capacity),
        }
    }

    fn index(&self, triple: &Triple, pair: &Pair) {
        for name in [&triple.a, &triple.b, &triple.c] {
            self.by_element
                .entry(name.clone())
                .or_default()
                .insert(pair.clone());
        }
    }
}

impl TripleStore for MemTripleStore {
    fn find(&self, pair: &Pair) -> StoreResult<Option<Element>> {
        Ok(self.pairs.get(pair).map(|c| c.value().clone()))
    }

    fn insert(&self, triple: &Triple) -> StoreResult<()> {
        let pair = triple.pair();
        // The entry guard holds the shard lock, making check-and-insert atomic.
        match self.pairs.entry(pair.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Duplicate {
                    a: pair.first().to_string(),
                    b: pair.second().to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(triple.c.clone());
            }
        }
        // Pair shard lock is released before touching the element index.
        let canonical = pair.clone().yields(triple.c.clone());
        self.index(&canonical, &pair);
        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<Triple>> {
        Ok(self
            .pairs
            .iter()
            .map(|entry| entry.key().clone().yields(entry.value().clone()))
            .collect())
    }

    fn involving(&self, element: &str, limit: usize) -> StoreResult<Vec<Triple>> {
        // Snapshot the pair list first so no index guard is held while
        // reading the pair map.
        let pairs: Vec<Pair> = match self.by_element.get(element) {
            Some(set) => set.iter().take(limit).cloned().collect(),
            None => return Ok(Vec::new()),
        };
        Ok(pairs
            .into_iter()
            .filter_map(|pair| {
                let c = self.pairs.get(&pair).map(|c| c.value().clone())?;
                Some(pair.yields(c))
            })
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.pairs.len())
    }

    fn clear(&self) -> StoreResult<()> {
        self.pairs.clear();
        self.by_element.clear();
        Ok(())
    }
}
