//! Generative oracle: proposes a result for a pair nobody has combined yet.
//!
//! The oracle is an unreliable external dependency. Implementations build a
//! request, parse the reply into a single name, and report transport or parse
//! failures as [`OracleError`]. They do not retry, and they do not judge the
//! name they return: an empty reply or the `undefined` sentinel is passed
//! through as-is for the resolver to classify.

pub mod ollama;
pub mod prompt;
pub mod sample;

use miette::Diagnostic;
use thiserror::Error;

use crate::triple::{Element, Triple};

pub use ollama::{OllamaConfig, OllamaOracle};
pub use sample::MajorityVote;

/// Errors from the oracle subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error("Ollama is not available at {url}")]
    #[diagnostic(
        code(world::oracle::unavailable),
        help("Start Ollama with `ollama serve`, or point --ollama-url at a running instance.")
    )]
    Unavailable { url: String },

    #[error("oracle request failed: {message}")]
    #[diagnostic(
        code(world::oracle::request_failed),
        help("Check that Ollama is running and the model is pulled (`ollama pull <model>`).")
    )]
    RequestFailed { message: String },

    #[error("failed to parse oracle response: {message}")]
    #[diagnostic(
        code(world::oracle::parse_error),
        help("The backend returned an unexpected response format.")
    )]
    ParseError { message: String },

    #[error("oracle request timed out after {timeout_secs}s")]
    #[diagnostic(
        code(world::oracle::timeout),
        help("Increase `oracle.timeout_secs` or use a smaller model.")
    )]
    Timeout { timeout_secs: u64 },

    #[error("sampling asked for zero generations")]
    #[diagnostic(
        code(world::oracle::no_samples),
        help("Set `oracle.samples` to at least 1.")
    )]
    NoSamples,
}

/// A backend that proposes `c` for `a + b`.
///
/// `examples` are stored facts involving `a` or `b`, offered as context.
pub trait Oracle: Send + Sync {
    fn generate(&self, a: &str, b: &str, examples: &[Triple]) -> Result<Element, OracleError>;
}

impl<F> Oracle for F
where
    F: Fn(&str, &str, &[Triple]) -> Result<Element, OracleError> + Send + Sync,
{
    fn generate(&self, a: &str, b: &str, examples: &[Triple]) -> Result<Element, OracleError> {
        self(a, b, examples)
    }
}
