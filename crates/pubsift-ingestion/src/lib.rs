//! pubsift-ingestion — PubMed search pipeline.
//! - Query term and date window construction
//! - PubMed E-utilities client (esearch → esummary → efetch)
//! - Article assembly with journal quality annotation
//! - Journal filtering and quality sorting
//! - End-to-end search orchestration with a status summary

pub mod assembler;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod sources;

pub use error::SearchError;
pub use models::{ArticleRecord, ArticleType, SearchRequest, SortOrder};
pub use pipeline::{SearchOutcome, SearchPipeline, SearchState, SearchSummary};
