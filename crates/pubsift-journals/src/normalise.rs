//! Journal name normalisation.
//!
//! PubMed reports the same journal under many spellings ("Nature Medicine",
//! "NATURE MEDICINE.", "nature  medicine"). Every spelling is reduced to one
//! lookup key before it touches the index.

use std::fmt;

/// Canonical lookup form of a journal name.
///
/// Lower-cased, whitespace runs collapsed to one space, ends trimmed and
/// trailing periods removed. Two names denote the same journal iff their
/// keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JournalKey(String);

impl JournalKey {
    pub fn new(name: &str) -> Self {
        Self(normalise_journal_name(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JournalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalise a free-text journal name into its lookup form.
pub fn normalise_journal_name(name: &str) -> String {
    let collapsed = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    // "Nature ." must not leave a dangling space behind
    collapsed
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}
