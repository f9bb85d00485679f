//! Rich diagnostic error types for world-graph.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. Oracle and config errors
//! live next to their subsystems and are re-wrapped here.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::oracle::OracleError;

/// Top-level error type for world-graph.
#[derive(Debug, Error, Diagnostic)]
pub enum WorldError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Combine(#[from] CombineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(world::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(world::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             If the database file was damaged, move it aside and start again."
        )
    )]
    Redb { message: String },

    #[error("combination already recorded: {a} + {b}")]
    #[diagnostic(
        code(world::store::duplicate),
        help("Another writer stored this pair first. Read the stored result instead.")
    )]
    Duplicate { a: String, b: String },

    #[error("stored data is inconsistent: {message}")]
    #[diagnostic(
        code(world::store::corrupt),
        help("The element index and the pair table disagree. Run `world-graph reset --yes` to start over.")
    )]
    Corrupt { message: String },
}

impl StoreError {
    /// Whether this is the race signal raised when a pair is already stored.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

// ---------------------------------------------------------------------------
// Combination errors
// ---------------------------------------------------------------------------

/// Errors that cross the resolver boundary.
///
/// Duplicate inserts never appear here: the resolver turns them into a re-read.
#[derive(Debug, Error, Diagnostic)]
pub enum CombineError {
    #[error("oracle unavailable: {source}")]
    #[diagnostic(
        code(world::combine::oracle_unavailable),
        help("Nothing was stored for this pair. The combination can be retried.")
    )]
    OracleUnavailable {
        #[source]
        source: OracleError,
    },

    #[error("storage failure: {source}")]
    #[diagnostic(
        code(world::combine::storage),
        help("The combination could not be read or recorded. Check the data directory.")
    )]
    Storage {
        #[source]
        source: StoreError,
    },
}

impl From<StoreError> for CombineError {
    fn from(source: StoreError) -> Self {
        CombineError::Storage { source }
    }
}

impl From<OracleError> for CombineError {
    fn from(source: OracleError) -> Self {
        CombineError::OracleUnavailable { source }
    }
}

/// Convenience alias for functions returning world-graph results.
pub type WorldResult<T> = std::result::Result<T, WorldError>;
