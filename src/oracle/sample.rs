//! Majority-vote sampling over a noisy oracle.
//!
//! A sampling model can answer the same pair differently from one call to the
//! next. [`MajorityVote`] asks the inner oracle several times in parallel and
//! keeps the most frequent answer, which makes the stored result less
//! dependent on a single unlucky draw.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::triple::{Element, Triple};

use super::{Oracle, OracleError};

/// Oracle decorator that returns the most common of `samples` answers.
#[derive(Debug)]
pub struct MajorityVote<O> {
    inner: O,
    samples: usize,
}

impl<O: Oracle> MajorityVote<O> {
    pub fn new(inner: O, samples: usize) -> Self {
        Self { inner, samples }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl<O: Oracle> Oracle for MajorityVote<O> {
    fn generate(&self, a: &str, b: &str, examples: &[Triple]) -> Result<Element, OracleError> {
        if self.samples == 0 {
            return Err(OracleError::NoSamples);
        }

        let results: Vec<Result<Element, OracleError>> = (0..self.samples)
            .into_par_iter()
            .map(|_| self.inner.generate(a, b, examples))
            .collect();

        let mut answers = Vec::with_capacity(results.len());
        let mut last_err = None;
        for result in results {
            match result {
                Ok(name) => answers.push(name),
                Err(e) => last_err = Some(e),
            }
        }

        if answers.is_empty() {
            tracing::warn!(%a, %b, samples = self.samples, "every oracle sample failed");
            return Err(last_err.unwrap_or(OracleError::NoSamples));
        }

        Ok(majority(answers))
    }
}

/// Most frequent answer; ties go to the answer seen first.
fn majority(answers: Vec<Element>) -> Element {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, name) in answers.iter().enumerate() {
        counts.entry(name.as_str()).or_insert((0, i)).0 += 1;
    }
    let winner = counts
        .into_iter()
        .max_by(|(_, (n1, first1)), (_, (n2, first2))| n1.cmp(n2).then(first2.cmp(first1)))
        .map(|(_, (_, first))| first)
        .unwrap_or(0);
    answers.into_iter().nth(winner).unwrap_or_default()
}
