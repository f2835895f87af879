//! Journal reference index.
//!
//! Maps every normalised canonical name and alias to the journal's quality
//! record. Built once, read-only afterwards; share it behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::normalise::JournalKey;

/// Category assigned when the reference table has none.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// JIF quartile bucket. `Q1` is the top 25% of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quartile {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quartile {
    /// 1 for Q1 … 4 for Q4.
    pub fn rank(self) -> u8 {
        match self {
            Quartile::Q1 => 1,
            Quartile::Q2 => 2,
            Quartile::Q3 => 3,
            Quartile::Q4 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quartile::Q1 => "Q1",
            Quartile::Q2 => "Q2",
            Quartile::Q3 => "Q3",
            Quartile::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quartile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quartile {
    type Err = String;

    /// Accepts `Q1`..`Q4` in any case, or a bare digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digit = s
            .strip_prefix('Q')
            .or_else(|| s.strip_prefix('q'))
            .unwrap_or(s);
        match digit {
            "1" => Ok(Quartile::Q1),
            "2" => Ok(Quartile::Q2),
            "3" => Ok(Quartile::Q3),
            "4" => Ok(Quartile::Q4),
            _ => Err(format!("not a quartile: {s:?}")),
        }
    }
}

/// One journal from the reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub name: String,
    pub aliases: Vec<String>,
    pub quartile: Option<Quartile>,
    /// Journal Impact Factor; 0.0 means unknown or below the reporting threshold.
    pub jif: f64,
    pub category: String,
}

impl JournalRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            quartile: None,
            jif: 0.0,
            category: UNKNOWN_CATEGORY.to_string(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_quartile(mut self, quartile: Quartile) -> Self {
        self.quartile = Some(quartile);
        self
    }

    pub fn with_jif(mut self, jif: f64) -> Self {
        self.jif = if jif.is_finite() && jif > 0.0 { jif } else { 0.0 };
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Canonical name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Quality annotation attached to an article whose journal is indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityInfo {
    pub canonical_name: String,
    pub quartile: Option<Quartile>,
    pub impact_score: f64,
    pub category: String,
}

impl From<&JournalRecord> for QualityInfo {
    fn from(record: &JournalRecord) -> Self {
        Self {
            canonical_name: record.name.clone(),
            quartile: record.quartile,
            impact_score: record.jif,
            category: record.category.clone(),
        }
    }
}

/// Normalised journal name → quality record.
#[derive(Debug, Clone, Default)]
pub struct JournalIndex {
    entries: HashMap<JournalKey, QualityInfo>,
    journals: usize,
    collisions: usize,
}

impl JournalIndex {
    /// Index every canonical name and alias of `records`.
    ///
    /// When two different journals share a key, the one that comes later in
    /// `records` wins.
    pub fn build(records: &[JournalRecord]) -> Self {
        let mut entries: HashMap<JournalKey, QualityInfo> = HashMap::new();
        let mut collisions = 0;

        for record in records {
            let info = QualityInfo::from(record);
            for name in record.names() {
                let key = JournalKey::new(name);
                if key.is_empty() {
                    continue;
                }
                if let Some(previous) = entries.insert(key.clone(), info.clone()) {
                    if previous.canonical_name != info.canonical_name {
                        collisions += 1;
                        warn!(
                            key = %key,
                            kept = %info.canonical_name,
                            replaced = %previous.canonical_name,
                            "Journal key collision in reference table"
                        );
                    }
                }
            }
        }

        debug!(journals = records.len(), keys = entries.len(), collisions, "Journal index built");
        Self { entries, journals: records.len(), collisions }
    }

    /// Look up a raw journal name as printed by the provider.
    pub fn get(&self, journal: &str) -> Option<&QualityInfo> {
        self.get_key(&JournalKey::new(journal))
    }

    pub fn get_key(&self, key: &JournalKey) -> Option<&QualityInfo> {
        self.entries.get(key)
    }

    pub fn is_known(&self, journal: &str) -> bool {
        self.get(journal).is_some()
    }

    /// Number of distinct lookup keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of reference records the index was built from.
    pub fn journal_count(&self) -> usize {
        self.journals
    }

    /// Keys that were claimed by more than one distinct journal.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}
