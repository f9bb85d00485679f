// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # world-graph
//!
//! A memoizing combination engine. Two elements combine into a third; the
//! first time a pair is seen, a generative oracle proposes the result and
//! the fact is stored, and from then on the pair always resolves to that
//! stored result, whichever order the elements come in.
//!
//! ## Architecture
//!
//! - **Triples** (`triple`): canonical unordered pairs and `a + b = c` facts
//! - **Storage** (`store`): pair-keyed, append-only stores (DashMap in memory, redb on disk)
//! - **Oracle** (`oracle`): Ollama completion adapter, prompt builder, majority voting
//! - **Resolver** (`resolver`): lookup-or-generate-and-persist, race-safe via the store
//! - **Export** (`export`): node/edge projection, DOT rendering, lineage walks
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use world_graph::oracle::{OllamaConfig, OllamaOracle};
//! use world_graph::resolver::{Resolver, ResolverConfig};
//! use world_graph::store::DurableTripleStore;
//!
//! let store = DurableTripleStore::open(std::path::Path::new(".world-graph")).unwrap();
//! let oracle = OllamaOracle::new(OllamaConfig::default());
//! let resolver = Resolver::new(Arc::new(store), Arc::new(oracle), ResolverConfig::default());
//! let steam = resolver.combine("Water", "Fire").unwrap();
//! println!("{} + {} = {}", steam.a, steam.b, steam.c);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod oracle;
pub mod resolver;
pub mod store;
pub mod triple;
