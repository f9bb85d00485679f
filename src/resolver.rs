//! Combination resolver: lookup, or generate and persist.
//!
//! [`Resolver::combine`] is the single entry point. For a pair it
//!
//! 1. reads the store under the canonical pair and returns a hit as-is;
//! 2. on a miss, asks the oracle, with stored facts about either input as
//!    context;
//! 3. returns blank or `undefined` answers as a non-combination without
//!    storing anything;
//! 4. otherwise inserts the new fact. If another resolver stored the pair in
//!    the meantime the insert fails as a duplicate, and the stored answer is
//!    read back and returned in place of the local one.
//!
//! No lock is held while the oracle runs. The store's atomic insert is the
//! only coordination point, so any number of `combine` calls may run at once.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::error::{CombineError, StoreError};
use crate::oracle::Oracle;
use crate::oracle::prompt::UNDEFINED;
use crate::store::TripleStore;
use crate::triple::{Element, Pair, Triple};

/// Where a resolution's answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Already stored, either before this call or by a concurrent winner.
    Stored,
    /// Generated by the oracle during this call and stored.
    Discovered,
    /// The oracle had nothing to offer; nothing was stored.
    NonCombination,
}

/// Outcome of combining two elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub a: Element,
    pub b: Element,
    /// The result, or the oracle's raw answer for a non-combination.
    pub c: Element,
    pub source: ResolutionSource,
}

impl Resolution {
    fn from_triple(triple: Triple, source: ResolutionSource) -> Self {
        Self {
            a: triple.a,
            b: triple.b,
            c: triple.c,
            source,
        }
    }

    /// Whether this produced (or recalled) a real element.
    pub fn is_combination(&self) -> bool {
        self.source != ResolutionSource::NonCombination
    }

    /// The stored fact, if this is a real combination.
    pub fn triple(&self) -> Option<Triple> {
        self.is_combination()
            .then(|| Triple::new(self.a.clone(), self.b.clone(), self.c.clone()))
    }
}

/// Whether an oracle answer means "these do not combine".
///
/// Blank answers and the `undefined` sentinel in any letter case qualify.
/// Element names are otherwise case-sensitive; only this check ignores case.
pub fn is_non_combination(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNDEFINED)
}

/// Configuration for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Stored facts per input element offered to the oracle as context.
    pub examples: usize,
    /// Keep an in-process read-through cache of stored results.
    pub cache: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            examples: 5,
            cache: false,
        }
    }
}

/// Memoizing combination resolver.
pub struct Resolver {
    store: Arc<dyn TripleStore>,
    oracle: Arc<dyn Oracle>,
    config: ResolverConfig,
    cache: Option<DashMap<Pair, Element>>,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn TripleStore>,
        oracle: Arc<dyn Oracle>,
        config: ResolverConfig,
    ) -> Self {
        let cache = config.cache.then(DashMap::new);
        Self {
            store,
            oracle,
            config,
            cache,
        }
    }

    /// The underlying store, for read-side consumers such as graph export.
    pub fn store(&self) -> &Arc<dyn TripleStore> {
        &self.store
    }

    /// Combine `a` and `b`.
    pub fn combine(&self, a: &str, b: &str) -> Result<Resolution, CombineError> {
        let pair = Pair::new(a, b);

        if let Some(c) = self.lookup(&pair)? {
            tracing::debug!(%pair, %c, "combination recalled");
            return Ok(Resolution::from_triple(pair.yields(c), ResolutionSource::Stored));
        }

        let examples = self.examples_for(&pair)?;
        let c = self
            .oracle
            .generate(pair.first(), pair.second(), &examples)
            .map_err(|e| {
                tracing::warn!(%pair, error = %e, "oracle failed");
                CombineError::from(e)
            })?;

        if is_non_combination(&c) {
            tracing::debug!(%pair, answer = %c, "no combination");
            return Ok(Resolution::from_triple(
                pair.yields(c),
                ResolutionSource::NonCombination,
            ));
        }

        let triple = pair.clone().yields(c);
        match self.store.insert(&triple) {
            Ok(()) => {
                tracing::info!(a = %triple.a, b = %triple.b, c = %triple.c, "new combination");
                self.remember(&pair, &triple.c);
                Ok(Resolution::from_triple(triple, ResolutionSource::Discovered))
            }
            Err(e) if e.is_duplicate() => {
                let stored = self.store.find(&pair)?.ok_or_else(|| StoreError::Corrupt {
                    message: format!("{pair} reported as duplicate but not found"),
                })?;
                tracing::info!(%pair, discarded = %triple.c, kept = %stored, "lost race to store pair");
                self.remember(&pair, &stored);
                Ok(Resolution::from_triple(
                    pair.yields(stored),
                    ResolutionSource::Stored,
                ))
            }
            Err(e) => {
                tracing::error!(%pair, error = %e, "failed to store combination");
                Err(e.into())
            }
        }
    }

    /// Remove every stored combination and drop the cache.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        Ok(())
    }

    fn lookup(&self, pair: &Pair) -> Result<Option<Element>, StoreError> {
        if let Some(c) = self.cache.as_ref().and_then(|cache| cache.get(pair)) {
            return Ok(Some(c.value().clone()));
        }
        let found = self.store.find(pair)?;
        if let Some(c) = &found {
            self.remember(pair, c);
        }
        Ok(found)
    }

    fn remember(&self, pair: &Pair, c: &str) {
        if let Some(cache) = &self.cache {
            cache.insert(pair.clone(), c.to_string());
        }
    }

    /// Stored facts mentioning either input, de-duplicated.
    fn examples_for(&self, pair: &Pair) -> Result<Vec<Triple>, StoreError> {
        let limit = self.config.examples;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut examples = self.store.involving(pair.first(), limit)?;
        if pair.second() != pair.first() {
            for t in self.store.involving(pair.second(), limit)? {
                if !examples.contains(&t) {
                    examples.push(t);
                }
            }
        }
        Ok(examples)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("cached", &self.cache.as_ref().map(DashMap::len))
            .finish()
    }
}
