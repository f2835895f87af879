//! pubsift-journals — Journal quality reference data.
//!
//! - Journal name normalisation (`JournalKey`)
//! - Reference index: name/alias → quartile, JIF, category
//! - Reference table loading from an ordered list of candidate paths

pub mod index;
pub mod loader;
pub mod normalise;

pub use index::{JournalIndex, JournalRecord, QualityInfo, Quartile};
pub use loader::{JournalTableLoader, LoadedTable};
pub use normalise::{normalise_journal_name, JournalKey};
