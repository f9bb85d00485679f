//! ACID-durable triple store backed by redb.
//!
//! Two tables:
//!
//! - `pairs`: canonical `(first, second)` → result. The primary record.
//! - `elements`: multimap from element name → canonical pairs mentioning it,
//!   the secondary index behind [`TripleStore::involving`].
//!
//! redb admits one write transaction at a time, so the duplicate check and
//! the insert inside [`DurableTripleStore::insert`] cannot interleave with
//! another writer.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, MultimapTableDefinition, ReadableTable, ReadableTableMetadata, TableDefinition,
};

use crate::error::StoreError;
use crate::triple::{Element, Pair, Triple};

use super::{StoreResult, TripleStore};

/// File name of the database inside the data directory.
pub const DB_FILE: &str = "world-graph.redb";

/// Canonical pair → result.
const PAIRS: TableDefinition<(&str, &str), &str> = TableDefinition::new("pairs");

/// Element name → canonical pairs whose fact mentions it.
const ELEMENTS: MultimapTableDefinition<&str, (&str, &str)> =
    MultimapTableDefinition::new("elements");

fn redb_err(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Redb {
        message: format!("{context} failed: {e}"),
    }
}

/// ACID-durable store using redb.
///
/// All writes go through transactions. Reads use MVCC snapshots and never
/// block writers.
pub struct DurableTripleStore {
    db: Arc<Database>,
}

impl DurableTripleStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        tracing::debug!(path = %db_path.display(), "opened triple store");
        Ok(store)
    }

    /// Create both tables so read transactions can always open them.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            txn.open_table(PAIRS)
                .map_err(|e| redb_err("open_table", e))?;
            txn.open_multimap_table(ELEMENTS)
                .map_err(|e| redb_err("open_multimap_table", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl TripleStore for DurableTripleStore {
    fn find(&self, pair: &Pair) -> StoreResult<Option<Element>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(PAIRS)
            .map_err(|e| redb_err("open_table", e))?;
        let found = table
            .get((pair.first(), pair.second()))
            .map_err(|e| redb_err("get", e))?;
        Ok(found.map(|guard| guard.value().to_string()))
    }

    fn insert(&self, triple: &Triple) -> StoreResult<()> {
        let pair = triple.pair();
        let key = (pair.first(), pair.second());
        let c = triple.c.as_str();

        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        {
            let mut pairs = txn
                .open_table(PAIRS)
                .map_err(|e| redb_err("open_table", e))?;
            let exists = pairs
                .get(key)
                .map_err(|e| redb_err("get", e))?
                .is_some();
            if exists {
                // Dropping the uncommitted transaction aborts it.
                return Err(StoreError::Duplicate {
                    a: pair.first().to_string(),
                    b: pair.second().to_string(),
                });
            }
            pairs
                .insert(key, c)
                .map_err(|e| redb_err("insert", e))?;

            let mut elements = txn
                .open_multimap_table(ELEMENTS)
                .map_err(|e| redb_err("open_multimap_table", e))?;
            for name in [pair.first(), pair.second(), c] {
                elements
                    .insert(name, key)
                    .map_err(|e| redb_err("index insert", e))?;
            }
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<Triple>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(PAIRS)
            .map_err(|e| redb_err("open_table", e))?;
        let iter = table.iter().map_err(|e| redb_err("iter", e))?;

        let mut triples = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(|e| redb_err("iter", e))?;
            let (a, b) = key.value();
            triples.push(Triple {
                a: a.to_string(),
                b: b.to_string(),
                c: value.value().to_string(),
            });
        }
        Ok(triples)
    }

    fn involving(&self, element: &str, limit: usize) -> StoreResult<Vec<Triple>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read", e))?;
        let elements = txn
            .open_multimap_table(ELEMENTS)
            .map_err(|e| redb_err("open_multimap_table", e))?;
        let pairs = txn
            .open_table(PAIRS)
            .map_err(|e| redb_err("open_table", e))?;

        let mut triples = Vec::new();
        let values = elements
            .get(element)
            .map_err(|e| redb_err("index get", e))?;
        for value in values.take(limit) {
            let value = value.map_err(|e| redb_err("index get", e))?;
            let (a, b) = value.value();
            let c = pairs
                .get((a, b))
                .map_err(|e| redb_err("get", e))?
                .ok_or_else(|| StoreError::Corrupt {
                    message: format!("index entry {a} + {b} for \"{element}\" has no record"),
                })?;
            triples.push(Triple {
                a: a.to_string(),
                b: b.to_string(),
                c: c.value().to_string(),
            });
        }
        Ok(triples)
    }

    fn len(&self) -> StoreResult<usize> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read", e))?;
        let table = txn
            .open_table(PAIRS)
            .map_err(|e| redb_err("open_table", e))?;
        let n = table.len().map_err(|e| redb_err("len", e))?;
        Ok(n as usize)
    }

    fn clear(&self) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write", e))?;
        txn.delete_table(PAIRS)
            .map_err(|e| redb_err("delete_table", e))?;
        txn.delete_multimap_table(ELEMENTS)
            .map_err(|e| redb_err("delete_multimap_table", e))?;
        {
            txn.open_table(PAIRS)
                .map_err(|e| redb_err("open_table", e))?;
            txn.open_multimap_table(ELEMENTS)
                .map_err(|e| redb_err("open_multimap_table", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit", e))?;
        tracing::info!("cleared all stored combinations");
        Ok(())
    }
}

impl std::fmt::Debug for DurableTripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableTripleStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_find_all() {
        let dir = TempDir::new().unwrap();
        let store = DurableTripleStore::open(dir.path()).unwrap();

        store.insert(&Triple::new("Water", "Fire", "Steam")).unwrap();
        store.insert(&Triple::new("Fire", "Earth", "Lava")).unwrap();

        assert_eq!(
            store.find(&Pair::new("Fire", "Water")).unwrap().as_deref(),
            Some("Steam")
        );
        assert_eq!(store.find(&Pair::new("Air", "Water")).unwrap(), None);

        let mut all = store.all().unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                Triple::new("Earth", "Fire", "Lava"),
                Triple::new("Fire", "Water", "Steam"),
            ]
        );
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn duplicate_pair_rejected_and_original_kept() {
        let dir = TempDir::new().unwrap();
        let store = DurableTripleStore::open(dir.path()).unwrap();

        store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        let err = store
            .insert(&Triple::new("Water", "Fire", "Mist"))
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(
            store.find(&Pair::new("Fire", "Water")).unwrap().as_deref(),
            Some("Steam")
        );
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.involving("Mist", 10).unwrap().is_empty());
    }

    #[test]
    fn involving_reads_secondary_index() {
        let dir = TempDir::new().unwrap();
        let store = DurableTripleStore::open(dir.path()).unwrap();
        store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        store.insert(&Triple::new("Fire", "Earth", "Lava")).unwrap();
        store.insert(&Triple::new("Fire", "Fire", "Inferno")).unwrap();

        assert_eq!(store.involving("Fire", 10).unwrap().len(), 3);
        assert_eq!(store.involving("Fire", 2).unwrap().len(), 2);
        assert_eq!(
            store.involving("Lava", 10).unwrap(),
            vec![Triple::new("Earth", "Fire", "Lava")]
        );
    }

    #[test]
    fn persistence_across_reopens() {
        let dir = TempDir::new().unwrap();
        {
            let store = DurableTripleStore::open(dir.path()).unwrap();
            store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        }
        let store = DurableTripleStore::open(dir.path()).unwrap();
        assert_eq!(
            store.find(&Pair::new("Water", "Fire")).unwrap().as_deref(),
            Some("Steam")
        );
    }

    #[test]
    fn clear_then_reuse() {
        let dir = TempDir::new().unwrap();
        let store = DurableTripleStore::open(dir.path()).unwrap();
        store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
        assert!(store.all().unwrap().is_empty());
        assert!(store.involving("Fire", 10).unwrap().is_empty());
        store.insert(&Triple::new("Fire", "Water", "Mist")).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }
}
