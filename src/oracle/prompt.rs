//! Few-shot completion prompt for the combination oracle.
//!
//! The prompt is written for completion (not chat) models: it explains the
//! game through example lines of the form `% A + B = C` and ends with an
//! unfinished line for the pair being resolved, so the model's next line is
//! the answer.

use crate::triple::Triple;

/// Sentinel a model emits when two elements have no sensible combination.
pub const UNDEFINED: &str = "undefined";

const PREAMBLE: &str = "\
This is World Graph, a game about how things relate.

Two things added together with `+` make a third thing.

% Water + Fire = Steam
% King + Woman = Queen

Order never matters:
% Fire + Water = Steam
% Woman + King = Queen

Some things do not combine. Their result is undefined:
% Moss + Karl Marx = undefined
% Nuclear + Lipstick = undefined

Results are short nouns, never adjectives or sentences:
% Sand + Water = Mud
% Water + Sea = Ocean
% Knowledge + Power = Wisdom

Results do not just count things:
% Planet + Planet = Solar System
";

/// Render the prompt for `a + b`, listing `examples` as known facts.
pub fn build(a: &str, b: &str, examples: &[Triple]) -> String {
    let mut prompt = String::from(PREAMBLE);
    if !examples.is_empty() {
        prompt.push_str("\nFacts discovered so far:\n");
        for t in examples {
            prompt.push_str(&format!("% {} + {} = {}\n", t.a, t.b, t.c));
        }
    }
    prompt.push_str(&format!("\n% {a} + {b} ="));
    prompt
}

/// Strip a raw completion down to a single candidate name.
///
/// Keeps the first line and trims surrounding whitespace. Nothing else is
/// interpreted: an empty string or the sentinel comes back unchanged.
pub fn parse_completion(raw: &str) -> String {
    raw.trim_start().lines().next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_ends_with_open_line() {
        let p = build("Fire", "Earth", &[]);
        assert!(p.ends_with("% Fire + Earth ="));
        assert!(!p.contains("Facts discovered"));
    }

    #[test]
    fn prompt_lists_examples() {
        let examples = vec![
            Triple::new("Fire", "Water", "Steam"),
            Triple::new("Earth", "Water", "Mud"),
        ];
        let p = build("Steam", "Earth", &examples);
        assert!(p.contains("% Fire + Water = Steam\n"));
        assert!(p.contains("% Earth + Water = Mud\n"));
        assert!(p.contains(UNDEFINED));
    }

    #[test]
    fn completion_keeps_first_trimmed_line() {
        assert_eq!(parse_completion(" Lava\n% Fire + Air = Smoke"), "Lava");
        assert_eq!(parse_completion("\n  Obsidian  "), "Obsidian");
        assert_eq!(parse_completion("   "), "");
        assert_eq!(parse_completion(" Undefined"), "Undefined");
    }
}
