//! Record assembly.
//!
//! Turns esummary entries into [`ArticleRecord`]s and efetch XML into
//! abstract text. Nothing here fails: missing fields become sentinels and a
//! broken XML document yields no abstracts.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::warn;

use pubsift_journals::JournalIndex;

use crate::models::{
    ArticleRecord, DocSummary, ABSTRACT_UNAVAILABLE, NO_ABSTRACT, NO_TITLE, UNKNOWN,
    UNKNOWN_JOURNAL,
};

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex");
}

/// Build an article from its esummary entry. The abstract is filled in later.
pub fn assemble_article(pmid: &str, summary: &DocSummary, index: &JournalIndex) -> ArticleRecord {
    let journal = non_blank(&summary.fulljournalname)
        .or_else(|| non_blank(&summary.source))
        .unwrap_or(UNKNOWN_JOURNAL)
        .to_string();

    let quality = index.get(&journal).cloned();

    ArticleRecord {
        pmid: pmid.to_string(),
        title: non_blank(&summary.title).unwrap_or(NO_TITLE).to_string(),
        year: extract_year(summary.pubdate.as_deref().unwrap_or_default()),
        publication_type: summary
            .pubtype
            .first()
            .map(String::as_str)
            .and_then(non_blank_str)
            .unwrap_or(UNKNOWN)
            .to_string(),
        url: ArticleRecord::article_url(pmid),
        abstract_text: String::new(),
        quality,
        journal,
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().and_then(non_blank_str)
}

fn non_blank_str(s: &str) -> Option<&str> {
    if s.trim().is_empty() { None } else { Some(s) }
}

/// First 19xx/20xx year in a free-text PubMed date ("2023 Jan-Feb", "Spring 2019").
pub fn extract_year(pubdate: &str) -> String {
    YEAR_RE
        .find(pubdate)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Abstracts gathered by the efetch phase.
#[derive(Debug, Clone, Default)]
pub struct AbstractMap {
    found: HashMap<String, String>,
    unavailable: HashSet<String>,
}

impl AbstractMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_found(&mut self, abstracts: HashMap<String, String>) {
        self.found.extend(abstracts);
    }

    /// Mark PMIDs whose batch request failed.
    pub fn mark_unavailable<'a>(&mut self, pmids: impl IntoIterator<Item = &'a String>) {
        self.unavailable.extend(pmids.into_iter().cloned());
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    pub fn unavailable_count(&self) -> usize {
        self.unavailable.len()
    }

    /// Abstract text for a PMID, or the matching sentinel.
    pub fn resolve(&self, pmid: &str) -> String {
        if let Some(text) = self.found.get(pmid) {
            text.clone()
        } else if self.unavailable.contains(pmid) {
            ABSTRACT_UNAVAILABLE.to_string()
        } else {
            NO_ABSTRACT.to_string()
        }
    }
}

/// Section being collected inside an `<AbstractText>` element.
struct Section {
    label: Option<String>,
    text: String,
    depth: usize,
}

/// Parse efetch XML into PMID → abstract.
///
/// Labelled sections are written as `"<Label>: <text>"`; sections are joined
/// by a blank line. Returns an empty map for malformed documents.
pub fn parse_abstracts(xml: &str) -> HashMap<String, String> {
    match try_parse_abstracts(xml) {
        Ok(abstracts) => abstracts,
        Err(e) => {
            warn!("Abstract XML parse error: {}", e);
            HashMap::new()
        }
    }
}

fn try_parse_abstracts(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut abstracts = HashMap::new();
    let mut reader = Reader::from_str(xml);

    // Per-article state
    let mut in_article = false;
    let mut pmid: Option<String> = None;
    let mut in_pmid = false;
    let mut pmid_text = String::new();
    let mut parts: Vec<String> = Vec::new();
    let mut section: Option<Section> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"PubmedArticle" => {
                    in_article = true;
                    pmid = None;
                    parts.clear();
                }
                b"PMID" if in_article && pmid.is_none() => {
                    in_pmid = true;
                    pmid_text.clear();
                }
                b"AbstractText" if in_article && section.is_none() => {
                    section = Some(Section { label: label_of(e), text: String::new(), depth: 0 });
                }
                _ => {
                    if let Some(ref mut s) = section {
                        s.depth += 1;
                    }
                }
            },
            Event::Text(ref e) => {
                let text = e.unescape()?;
                if in_pmid {
                    pmid_text.push_str(&text);
                } else if let Some(ref mut s) = section {
                    s.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(ref mut s) = section {
                    s.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"PMID" if in_pmid => {
                    in_pmid = false;
                    let id = pmid_text.trim();
                    if !id.is_empty() {
                        pmid = Some(id.to_string());
                    }
                }
                b"AbstractText" if section.as_ref().is_some_and(|s| s.depth == 0) => {
                    if let Some(s) = section.take() {
                        let text = s.text.trim();
                        if !text.is_empty() {
                            parts.push(match s.label {
                                Some(label) => format!("{label}: {text}"),
                                None => text.to_string(),
                            });
                        }
                    }
                }
                b"PubmedArticle" => {
                    in_article = false;
                    if let Some(id) = pmid.take() {
                        if !parts.is_empty() {
                            abstracts.insert(id, parts.join("\n\n"));
                        }
                    }
                    parts.clear();
                }
                _ => {
                    if let Some(ref mut s) = section {
                        s.depth = s.depth.saturating_sub(1);
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(abstracts)
}

fn label_of(e: &BytesStart<'_>) -> Option<String> {
    e.try_get_attribute("Label")
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.trim().to_string())
        .filter(|label| !label.is_empty())
}
