//! End-to-end search pipeline.
//!
//! Orchestrates one search:
//!   1. Build the PubMed term and date window from the request
//!   2. esearch for identifiers (the only phase that can fail the search)
//!   3. esummary in batches, assembling annotated articles
//!   4. efetch abstracts in batches, degrading failed batches to a sentinel
//!   5. Keep top journals only unless show-all is set
//!   6. Sort by the requested order
//!
//! Every outcome, including failures, is a status message plus a list.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{info, instrument, warn};

use pubsift_journals::JournalIndex;

use crate::assembler::assemble_article;
use crate::error::SearchError;
use crate::models::{ArticleRecord, SearchRequest, SortOrder};
use crate::query::{build_search_term, DateWindow};
use crate::sources::LiteratureSource;

// ── Filter / sort ─────────────────────────────────────────────────────────────

/// Keep articles from indexed journals, or everything when `show_all` is set.
/// Order is preserved.
pub fn filter_by_journal(
    articles: Vec<ArticleRecord>,
    index: &JournalIndex,
    show_all: bool,
) -> Vec<ArticleRecord> {
    if show_all {
        return articles;
    }
    articles.into_iter().filter(|a| index.is_known(&a.journal)).collect()
}

/// Stable sort by the requested order.
///
/// A missing impact score counts as 0.0. Articles without a quartile go
/// after every article that has one, in either quartile direction.
pub fn sort_articles(articles: &mut [ArticleRecord], order: SortOrder) {
    let impact = |a: &ArticleRecord| a.impact_score().unwrap_or(0.0);

    match order {
        SortOrder::Relevance => {}
        SortOrder::ImpactDesc => articles.sort_by(|a, b| impact(b).total_cmp(&impact(a))),
        SortOrder::ImpactAsc => articles.sort_by(|a, b| impact(a).total_cmp(&impact(b))),
        SortOrder::QuartileAsc => articles.sort_by(|a, b| quartile_cmp(a, b, false)),
        SortOrder::QuartileDesc => articles.sort_by(|a, b| quartile_cmp(a, b, true)),
    }
}

fn quartile_cmp(a: &ArticleRecord, b: &ArticleRecord, worst_first: bool) -> Ordering {
    match (a.quartile(), b.quartile()) {
        (Some(x), Some(y)) if worst_first => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Counts reported after a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    /// Matches PubMed reports in total.
    pub total_found: u64,
    /// Articles actually assembled (capped by `max_results`).
    pub retrieved: usize,
    /// Articles left after journal filtering.
    pub kept: usize,
    /// Whether the top-journal filter was applied.
    pub journal_filter: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    EmptyQuery,
    Failed(SearchError),
    NoResults { query: String },
    Completed(SearchSummary),
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchState::EmptyQuery => write!(f, "Please enter a search query."),
            SearchState::Failed(e) => f.write_str(&e.user_message()),
            SearchState::NoResults { query } => write!(
                f,
                "🔍 No articles found for '{query}'. Try:\n\
                 • Broader search terms\n\
                 • Increase 'Years Back' range\n\
                 • Turn on 'Show All Journals'"
            ),
            SearchState::Completed(summary) => {
                write!(f, "✅ {} found", summary.total_found)?;
                if (summary.retrieved as u64) < summary.total_found {
                    write!(f, " → {} after date/filter limits", summary.retrieved)?;
                }
                let label = if summary.journal_filter { "Top journals" } else { "All journals" };
                write!(f, " → {} kept ({label})", summary.kept)
            }
        }
    }
}

/// Status plus the final, ordered article list.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub state: SearchState,
    pub articles: Vec<ArticleRecord>,
}

impl SearchOutcome {
    fn without_articles(state: SearchState) -> Self {
        Self { state, articles: Vec::new() }
    }

    pub fn status(&self) -> String {
        self.state.to_string()
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.state, SearchState::Failed(_))
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Runs searches against a literature source with a shared journal index.
///
/// The index is read-only; one pipeline can serve concurrent `run` calls.
#[derive(Clone)]
pub struct SearchPipeline {
    source: Arc<dyn LiteratureSource>,
    index: Arc<JournalIndex>,
}

impl SearchPipeline {
    pub fn new(source: Arc<dyn LiteratureSource>, index: Arc<JournalIndex>) -> Self {
        Self { source, index }
    }

    #[instrument(skip(self, request), fields(query = %request.query))]
    pub async fn run(&self, request: &SearchRequest) -> SearchOutcome {
        let query = request.query.trim();
        if query.is_empty() {
            return SearchOutcome::without_articles(SearchState::EmptyQuery);
        }

        let term = build_search_term(request);
        let window = DateWindow::years_back(request.years_back, Local::now().date_naive());
        let max_results = request.capped_max_results();
        info!(term = %term, from = %window.min_param(), to = %window.max_param(), max_results, "Searching PubMed");

        // ── 1. Identifiers ────────────────────────────────────────────────────
        let hits = match self.source.search(&term, &window, max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "PubMed search failed");
                return SearchOutcome::without_articles(SearchState::Failed(e));
            }
        };
        if hits.ids.is_empty() {
            info!("No PubMed matches");
            return SearchOutcome::without_articles(SearchState::NoResults { query: query.to_string() });
        }

        // ── 2. Summaries → articles ───────────────────────────────────────────
        let summaries = self.source.fetch_summaries(&hits.ids).await;
        let mut articles: Vec<ArticleRecord> = summaries
            .iter()
            .map(|(pmid, summary)| assemble_article(pmid, summary, &self.index))
            .collect();
        let retrieved = articles.len();

        // ── 3. Abstracts ──────────────────────────────────────────────────────
        let pmids: Vec<String> = articles.iter().map(|a| a.pmid.clone()).collect();
        let abstracts = self.source.fetch_abstracts(&pmids).await;
        for article in &mut articles {
            article.abstract_text = abstracts.resolve(&article.pmid);
        }

        // ── 4. Filter and sort ────────────────────────────────────────────────
        let mut kept = filter_by_journal(articles, &self.index, request.show_all_journals);
        sort_articles(&mut kept, request.sort);

        let summary = SearchSummary {
            total_found: hits.total,
            retrieved,
            kept: kept.len(),
            journal_filter: !request.show_all_journals,
        };
        info!(
            total = summary.total_found,
            retrieved,
            kept = summary.kept,
            abstracts = abstracts.found_count(),
            "Search complete"
        );

        SearchOutcome { state: SearchState::Completed(summary), articles: kept }
    }
}
