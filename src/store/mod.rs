//! Triple storage for world-graph.
//!
//! Two backends implement [`TripleStore`]:
//!
//! - [`MemTripleStore`]: process-local, concurrent hashmaps (DashMap)
//! - [`DurableTripleStore`]: ACID transactions on disk (redb)
//!
//! Both key records by the canonical [`Pair`], so `(a, b)` and `(b, a)` hit
//! the same record. An insert for a pair that already has a record fails with
//! [`StoreError::Duplicate`]; that check and the write happen atomically, so
//! the first writer of a pair always wins.

pub mod durable;
pub mod mem;

use std::path::Path;
use std::sync::Arc;

pub use durable::DurableTripleStore;
pub use mem::MemTripleStore;

use crate::error::StoreError;
use crate::triple::{Element, Pair, Triple};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Append-only, pair-keyed storage of combination facts.
pub trait TripleStore: Send + Sync {
    /// Look up the stored result for a pair.
    fn find(&self, pair: &Pair) -> StoreResult<Option<Element>>;

    /// Persist a new fact.
    ///
    /// Fails with [`StoreError::Duplicate`] when the pair already has a
    /// record, even if the stored result differs from `triple.c`.
    fn insert(&self, triple: &Triple) -> StoreResult<()>;

    /// Every stored fact. Order is unspecified.
    fn all(&self) -> StoreResult<Vec<Triple>>;

    /// Up to `limit` facts that mention `element` in any position.
    fn involving(&self, element: &str, limit: usize) -> StoreResult<Vec<Triple>>;

    /// Number of stored facts.
    fn len(&self) -> StoreResult<usize>;

    /// Whether nothing is stored yet.
    fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Remove every fact. Administrative only; never called while resolving.
    fn clear(&self) -> StoreResult<()>;
}

impl<S: TripleStore + ?Sized> TripleStore for Arc<S> {
    fn find(&self, pair: &Pair) -> StoreResult<Option<Element>> {
        (**self).find(pair)
    }

    fn insert(&self, triple: &Triple) -> StoreResult<()> {
        (**self).insert(triple)
    }

    fn all(&self) -> StoreResult<Vec<Triple>> {
        (**self).all()
    }

    fn involving(&self, element: &str, limit: usize) -> StoreResult<Vec<Triple>> {
        (**self).involving(element, limit)
    }

    fn len(&self) -> StoreResult<usize> {
        (**self).len()
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}

/// Open the store for a data directory, or a memory-only store for `None`.
pub fn open(data_dir: Option<&Path>) -> StoreResult<Arc<dyn TripleStore>> {
    match data_dir {
        Some(dir) => Ok(Arc::new(DurableTripleStore::open(dir)?)),
        None => Ok(Arc::new(MemTripleStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_only_when_no_dir() {
        let store = open(None).unwrap();
        assert!(store.is_empty().unwrap());
        store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn durable_when_dir_given() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = open(Some(dir.path())).unwrap();
        store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        assert!(dir.path().join(durable::DB_FILE).exists());
        assert_eq!(
            store.find(&Pair::new("Water", "Fire")).unwrap().as_deref(),
            Some("Steam")
        );
    }

    #[test]
    fn arc_forwards() {
        let store = Arc::new(MemTripleStore::new());
        let shared: Arc<MemTripleStore> = Arc::clone(&store);
        shared.insert(&Triple::new("Fire", "Earth", "Lava")).unwrap();
        assert_eq!(TripleStore::len(&store).unwrap(), 1);
    }
}
