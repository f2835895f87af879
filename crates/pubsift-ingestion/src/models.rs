//! Data models for the search pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pubsift_journals::{QualityInfo, Quartile};

/// Hard upper bound on articles requested from PubMed, whatever the caller asks.
pub const MAX_RESULTS_CAP: usize = 100;

pub const NO_TITLE: &str = "No title available";
pub const UNKNOWN_JOURNAL: &str = "Unknown Journal";
pub const UNKNOWN: &str = "Unknown";
pub const NO_ABSTRACT: &str = "No abstract available";
pub const ABSTRACT_UNAVAILABLE: &str = "Abstract temporarily unavailable";

const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// One PubMed article ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub pmid: String,
    pub title: String,
    /// Journal name exactly as PubMed printed it.
    pub journal: String,
    /// Four-digit year or [`UNKNOWN`].
    pub year: String,
    pub publication_type: String,
    pub url: String,
    pub abstract_text: String,
    /// `None` when the journal is not in the reference table.
    pub quality: Option<QualityInfo>,
}

impl ArticleRecord {
    pub fn article_url(pmid: &str) -> String {
        format!("{PUBMED_ARTICLE_URL}/{pmid}/")
    }

    pub fn impact_score(&self) -> Option<f64> {
        self.quality.as_ref().map(|q| q.impact_score)
    }

    pub fn quartile(&self) -> Option<Quartile> {
        self.quality.as_ref().and_then(|q| q.quartile)
    }
}

/// Summary fields returned by esummary for one PMID.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fulljournalname: Option<String>,
    /// Abbreviated journal name.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub pubdate: Option<String>,
    #[serde(default)]
    pub pubtype: Vec<String>,
}

/// Result of the esearch phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    /// Total matches PubMed reports, not just the ones returned.
    pub total: u64,
    pub ids: Vec<String>,
}

/// Publication-type filters offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleType {
    ResearchArticle,
    RandomizedControlledTrial,
    MetaAnalysis,
    SystematicReview,
    ClinicalTrial,
    Review,
}

impl ArticleType {
    /// Map a UI label to a filter. Unknown or empty labels mean no filter.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Research Article" => Some(ArticleType::ResearchArticle),
            "RCT" | "Randomized Controlled Trial" => Some(ArticleType::RandomizedControlledTrial),
            "Meta-Analysis" => Some(ArticleType::MetaAnalysis),
            "Systematic Review" => Some(ArticleType::SystematicReview),
            "Clinical Trial" => Some(ArticleType::ClinicalTrial),
            "Review" => Some(ArticleType::Review),
            _ => None,
        }
    }

    /// PubMed search clause for this filter.
    pub fn clause(self) -> &'static str {
        match self {
            ArticleType::ResearchArticle => "Journal Article[Publication Type]",
            ArticleType::RandomizedControlledTrial => "Randomized Controlled Trial[Publication Type]",
            ArticleType::MetaAnalysis => "Meta-Analysis[Publication Type]",
            ArticleType::SystematicReview => "Systematic Review[Publication Type]",
            ArticleType::ClinicalTrial => "Clinical Trial[Publication Type]",
            ArticleType::Review => "Review[Publication Type]",
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// PubMed's own order.
    #[default]
    Relevance,
    ImpactDesc,
    ImpactAsc,
    /// Q1 first.
    QuartileAsc,
    /// Q4 first.
    QuartileDesc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::ImpactDesc => "jif-desc",
            SortOrder::ImpactAsc => "jif-asc",
            SortOrder::QuartileAsc => "quartile-asc",
            SortOrder::QuartileDesc => "quartile-desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    /// Accepts the short names and the labels of the search form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "relevance" | "default" | "Default (by relevance)" => Ok(SortOrder::Relevance),
            "jif-desc" | "JIF (High to Low)" => Ok(SortOrder::ImpactDesc),
            "jif-asc" | "JIF (Low to High)" => Ok(SortOrder::ImpactAsc),
            "quartile-asc" | "Quartile (Q1 to Q4)" => Ok(SortOrder::QuartileAsc),
            "quartile-desc" | "Quartile (Q4 to Q1)" => Ok(SortOrder::QuartileDesc),
            other => Err(format!(
                "unknown sort order {other:?} (expected relevance, jif-desc, jif-asc, quartile-asc or quartile-desc)"
            )),
        }
    }
}

/// Parameters of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub article_type: Option<ArticleType>,
    pub humans_only: bool,
    pub open_access: bool,
    pub years_back: u32,
    pub max_results: usize,
    pub show_all_journals: bool,
    pub sort: SortOrder,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            article_type: None,
            humans_only: true,
            open_access: false,
            years_back: 5,
            max_results: 50,
            show_all_journals: false,
            sort: SortOrder::Relevance,
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    /// `max_results` clamped to [`MAX_RESULTS_CAP`].
    pub fn capped_max_results(&self) -> usize {
        self.max_results.min(MAX_RESULTS_CAP)
    }
}
