//! Plain-text and JSON output.

use serde::Serialize;

use pubsift_ingestion::{ArticleRecord, SearchOutcome};

const ABSTRACT_PREVIEW_CHARS: usize = 300;

#[derive(Serialize)]
struct JsonOutput<'a> {
    status: String,
    articles: &'a [ArticleRecord],
}

pub fn to_json(outcome: &SearchOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonOutput {
        status: outcome.status(),
        articles: &outcome.articles,
    })
}

pub fn to_text(outcome: &SearchOutcome) -> String {
    let mut out = outcome.status();
    for (i, article) in outcome.articles.iter().enumerate() {
        out.push_str("\n\n");
        out.push_str(&article_block(i + 1, article));
    }
    out
}

fn article_block(n: usize, article: &ArticleRecord) -> String {
    let mut meta = format!("{} • {} • {}", article.journal, article.year, article.publication_type);
    if let Some(jif) = article.impact_score() {
        meta.push_str(&format!(" [JIF {jif}]"));
    }
    if let Some(quartile) = article.quartile() {
        meta.push_str(&format!(" [{quartile}]"));
    }

    format!(
        "{n}. {}\n   {meta}\n   {}\n   {}",
        article.title,
        article.url,
        preview(&article.abstract_text, ABSTRACT_PREVIEW_CHARS)
    )
}

/// First `max_chars` characters, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubsift_ingestion::{SearchState, SearchSummary};
    use pubsift_journals::{QualityInfo, Quartile};

    fn outcome() -> SearchOutcome {
        SearchOutcome {
            state: SearchState::Completed(SearchSummary {
                total_found: 1,
                retrieved: 1,
                kept: 1,
                journal_filter: true,
            }),
            articles: vec![ArticleRecord {
                pmid: "42".to_string(),
                title: "A trial".to_string(),
                journal: "Cell".to_string(),
                year: "2024".to_string(),
                publication_type: "Review".to_string(),
                url: ArticleRecord::article_url("42"),
                abstract_text: "Short.".to_string(),
                quality: Some(QualityInfo {
                    canonical_name: "Cell".to_string(),
                    quartile: Some(Quartile::Q1),
                    impact_score: 66.8,
                    category: "Molecular Biology".to_string(),
                }),
            }],
        }
    }

    #[test]
    fn test_text_output() {
        let text = to_text(&outcome());
        assert!(text.starts_with("✅ 1 found → 1 kept (Top journals)"));
        assert!(text.contains("1. A trial"));
        assert!(text.contains("Cell • 2024 • Review [JIF 66.8] [Q1]"));
        assert!(text.contains("https://pubmed.ncbi.nlm.nih.gov/42/"));
    }

    #[test]
    fn test_json_output() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&outcome()).unwrap()).unwrap();
        assert_eq!(json["articles"][0]["pmid"], "42");
        assert_eq!(json["articles"][0]["quality"]["quartile"], "Q1");
        assert!(json["status"].as_str().unwrap().contains("kept"));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("short", 300), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}
