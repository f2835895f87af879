//! Reference table loading.
//!
//! The table is a JSON array produced offline from the JIF spreadsheet:
//!
//! ```json
//! [{ "name": "Cell", "aliases": ["Cell J"], "quartile": "Q1", "jif": 66.8, "category": "Molecular Biology" }]
//! ```
//!
//! A missing or unreadable table is not an error: the index is built empty
//! and no journal is recognised.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use pubsift_common::{PubsiftError, Result};

use crate::index::{JournalIndex, JournalRecord, Quartile, UNKNOWN_CATEGORY};

/// Locations tried when no candidates are configured.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "journal_impact_factors/top_journals.json",
    ".private_data/top_journals.json",
    "top_journals.json",
];

/// Parse the JSON reference table.
///
/// Rows are converted one at a time: a row without a usable `name` is
/// skipped with a warning and the rest of the table is kept. Bare `NaN` and
/// `Infinity` tokens, as written by Python's `json.dump`, read as `null`.
pub fn parse_journal_table(json: &str) -> Result<Vec<JournalRecord>> {
    let rows: Vec<Value> = serde_json::from_str(&non_finite_as_null(json))?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match record_from_row(row) {
            Some(record) => records.push(record),
            None => warn!(row = i, "Skipping journal table row without a name"),
        }
    }
    Ok(records)
}

fn record_from_row(row: &Value) -> Option<JournalRecord> {
    let name = row.get("name")?.as_str().filter(|n| !n.trim().is_empty())?;

    let aliases: Vec<&str> = row
        .get("aliases")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let jif = match row.get("jif") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };

    let category = row
        .get("category")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNKNOWN_CATEGORY);

    let mut record = JournalRecord::new(name)
        .with_aliases(aliases)
        .with_jif(jif)
        .with_category(category);
    record.quartile = row.get("quartile").and_then(quartile_from_value);
    Some(record)
}

/// `"Q1"`, `"1"` or `1` all read as Q1; anything else is absent.
fn quartile_from_value(value: &Value) -> Option<Quartile> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|d| d.to_string().parse().ok()),
        _ => None,
    }
}

/// Replace bare `NaN`, `Infinity` and `-Infinity` tokens outside string
/// literals with `null`.
fn non_finite_as_null(json: &str) -> Cow<'_, str> {
    if !json.contains("NaN") && !json.contains("Infinity") {
        return Cow::Borrowed(json);
    }

    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = json;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

/// Records loaded from the first usable candidate.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub records: Vec<JournalRecord>,
    /// `None` when no candidate could be loaded.
    pub source: Option<PathBuf>,
}

/// Tries an ordered list of candidate paths and keeps the first one that
/// exists and parses.
#[derive(Debug, Clone)]
pub struct JournalTableLoader {
    candidates: Vec<PathBuf>,
}

impl Default for JournalTableLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATES.iter().map(PathBuf::from))
    }
}

impl JournalTableLoader {
    pub fn new<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self { candidates: candidates.into_iter().map(Into::into).collect() }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn load(&self) -> LoadedTable {
        for path in &self.candidates {
            match read_table(path) {
                Ok(records) => {
                    info!(path = %path.display(), journals = records.len(), "Loaded journal reference table");
                    return LoadedTable { records, source: Some(path.clone()) };
                }
                Err(PubsiftError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Journal table candidate not found");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable journal table");
                }
            }
        }

        warn!(
            candidates = self.candidates.len(),
            "No journal reference table found; no journal will be recognised"
        );
        LoadedTable::default()
    }

    pub fn load_index(&self) -> JournalIndex {
        JournalIndex::build(&self.load().records)
    }
}

fn read_table(path: &Path) -> Result<Vec<JournalRecord>> {
    let json = std::fs::read_to_string(path)?;
    parse_journal_table(&json)
}
