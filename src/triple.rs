//! Combination facts: elements, canonical pairs, and triples.
//!
//! An element is just a name. It has no table of its own and exists only as
//! a value inside stored triples. Names are opaque and case-sensitive:
//! `"fire"` and `"Fire"` are different elements.
//!
//! Combination is commutative, so every lookup and insert goes through a
//! [`Pair`], whose constructor puts the two names in a fixed order. `(a, b)`
//! and `(b, a)` therefore address the same record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An element name.
pub type Element = String;

/// An unordered pair of element names in canonical order.
///
/// The smaller name (byte-wise lexicographic) is always stored first. The
/// fields are private so a non-canonical `Pair` cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Pair {
    #[serde(rename = "a")]
    first: Element,
    #[serde(rename = "b")]
    second: Element,
}

impl Pair {
    /// Build the canonical pair for `a` and `b`, in either order.
    pub fn new(a: impl Into<Element>, b: impl Into<Element>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The lexicographically smaller name.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// The lexicographically larger name.
    pub fn second(&self) -> &str {
        &self.second
    }

    /// Whether `name` is one of the two inputs.
    pub fn contains(&self, name: &str) -> bool {
        self.first == name || self.second == name
    }

    /// Attach a result, producing the full fact.
    pub fn yields(self, c: impl Into<Element>) -> Triple {
        Triple {
            a: self.first,
            b: self.second,
            c: c.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.first, self.second)
    }
}

/// Deserializing always canonicalizes, whatever order the input used.
impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            a: Element,
            b: Element,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Pair::new(raw.a, raw.b))
    }
}

/// An immutable combination fact: `a + b = c`.
///
/// Triples built through [`Triple::new`] or [`Pair::yields`] always carry
/// their inputs in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub a: Element,
    pub b: Element,
    pub c: Element,
}

impl Triple {
    /// Create a triple, canonicalizing the input order.
    pub fn new(a: impl Into<Element>, b: impl Into<Element>, c: impl Into<Element>) -> Self {
        Pair::new(a, b).yields(c)
    }

    /// The canonical pair of inputs.
    pub fn pair(&self) -> Pair {
        Pair::new(self.a.clone(), self.b.clone())
    }

    /// Whether `name` appears in any position.
    pub fn involves(&self, name: &str) -> bool {
        self.a == name || self.b == name || self.c == name
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {} = {}", self.a, self.b, self.c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_order_independent() {
        assert_eq!(Pair::new("Water", "Fire"), Pair::new("Fire", "Water"));
        let pair = Pair::new("Water", "Fire");
        assert_eq!(pair.first(), "Fire");
        assert_eq!(pair.second(), "Water");
    }

    #[test]
    fn pair_keeps_case() {
        assert_ne!(Pair::new("fire", "Water"), Pair::new("Fire", "Water"));
        // Uppercase sorts before lowercase byte-wise.
        assert_eq!(Pair::new("fire", "Water").first(), "Water");
    }

    #[test]
    fn self_pair() {
        let pair = Pair::new("Fire", "Fire");
        assert_eq!(pair.first(), "Fire");
        assert_eq!(pair.second(), "Fire");
        assert!(pair.contains("Fire"));
    }

    #[test]
    fn triple_new_canonicalizes() {
        let t = Triple::new("Water", "Fire", "Steam");
        assert_eq!(t.a, "Fire");
        assert_eq!(t.b, "Water");
        assert_eq!(t.c, "Steam");
        assert_eq!(t.pair(), Pair::new("Fire", "Water"));
        assert_eq!(t.to_string(), "Fire + Water = Steam");
    }

    #[test]
    fn deserialized_pair_is_canonical() {
        let pair: Pair = serde_json::from_str(r#"{"a":"Water","b":"Fire"}"#).unwrap();
        assert_eq!(pair.first(), "Fire");
        assert_eq!(pair.second(), "Water");
    }

    #[test]
    fn involves_checks_every_position() {
        let t = Triple::new("Fire", "Earth", "Lava");
        assert!(t.involves("Fire"));
        assert!(t.involves("Earth"));
        assert!(t.involves("Lava"));
        assert!(!t.involves("Water"));
    }
}
