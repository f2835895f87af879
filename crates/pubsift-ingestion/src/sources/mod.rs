//! Literature source clients.

pub mod pubmed;

use async_trait::async_trait;

use crate::assembler::AbstractMap;
use crate::error::SearchError;
use crate::models::{DocSummary, SearchHits};
use crate::query::DateWindow;

/// The three remote phases of a search.
///
/// Only `search` can fail; the batch phases degrade per batch instead.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Find up to `max_results` identifiers matching `term` within `window`.
    async fn search(
        &self,
        term: &str,
        window: &DateWindow,
        max_results: usize,
    ) -> Result<SearchHits, SearchError>;

    /// Summary metadata, in request order. Unknown identifiers are left out.
    async fn fetch_summaries(&self, pmids: &[String]) -> Vec<(String, DocSummary)>;

    /// Abstract text per identifier.
    async fn fetch_abstracts(&self, pmids: &[String]) -> AbstractMap;
}
