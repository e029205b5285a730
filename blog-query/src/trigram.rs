//! Trigram similarity compatible with PostgreSQL's `pg_trgm` extension.
//!
//! A string is split into words on non-alphanumeric characters, each word is
//! lowercased and padded with two spaces in front and one behind, and every
//! 3-character window of the padded word is a trigram. Similarity is the size
//! of the shared trigram set divided by the size of the union.

use std::collections::BTreeSet;

/// Minimum similarity (exclusive) for a title to count as a match.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

pub fn trigrams(input: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for word in input.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();
        for w in padded.windows(3) {
            out.insert(w.iter().collect());
        }
    }
    out
}

/// Similarity in `[0, 1]`; 0 when either side has no trigrams.
pub fn similarity(a: &str, b: &str) -> f32 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    similarity_of_sets(&ta, &tb)
}

pub fn similarity_of_sets(ta: &BTreeSet<String>, tb: &BTreeSet<String>) -> f32 {
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(tb).count();
    let union = ta.len() + tb.len() - shared;
    shared as f32 / union as f32
}
