//! PubMed E-utilities client.
//!
//! Endpoints used:
//!   esearch:  identifiers matching a term
//!   esummary: JSON summary metadata (batches of 200)
//!   efetch:   XML records for abstracts (batches of 50)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use pubsift_common::sandbox::{SandboxClient, DEFAULT_TIMEOUT};

use super::LiteratureSource;
use crate::assembler::{parse_abstracts, AbstractMap};
use crate::error::SearchError;
use crate::models::{DocSummary, SearchHits};
use crate::query::DateWindow;

pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Caller identification NCBI asks every client to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NcbiIdentity {
    pub tool: String,
    pub email: String,
    /// Raises the NCBI rate limit from 3 to 10 requests per second.
    pub api_key: Option<String>,
}

impl Default for NcbiIdentity {
    fn default() -> Self {
        Self {
            tool: "pubsift".to_string(),
            email: "pubsift@example.com".to_string(),
            api_key: None,
        }
    }
}

/// Retry, pacing and batching rules for E-utilities calls.
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    /// Extra attempts after a retryable status.
    pub max_retries: u32,
    pub retryable: fn(StatusCode) -> bool,
    pub retry_delay: Duration,
    /// Pause between consecutive batch requests.
    pub batch_delay: Duration,
    pub timeout: Duration,
    pub summary_batch_size: usize,
    pub fetch_batch_size: usize,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retryable: is_server_error,
            retry_delay: Duration::from_secs(1),
            batch_delay: Duration::from_millis(100),
            timeout: DEFAULT_TIMEOUT,
            summary_batch_size: 200,
            fetch_batch_size: 50,
        }
    }
}

impl RequestPolicy {
    /// Same retry and batching rules without any sleeping.
    pub fn immediate() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

pub fn is_server_error(status: StatusCode) -> bool {
    status.is_server_error()
}

pub struct PubMedClient {
    client: SandboxClient,
    base_url: String,
    identity: NcbiIdentity,
    policy: RequestPolicy,
}

impl PubMedClient {
    pub fn new(identity: NcbiIdentity, policy: RequestPolicy) -> pubsift_common::Result<Self> {
        Ok(Self {
            client: SandboxClient::with_timeout(policy.timeout)?,
            base_url: EUTILS_BASE_URL.to_string(),
            identity,
            policy,
        })
    }

    /// Point the client at another E-utilities root (mirror or test server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        if let Some(host) = Url::parse(base_url).ok().and_then(|u| u.host_str().map(String::from)) {
            self.client.allow_domain(&host);
        }
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", self.identity.tool.clone()),
            ("email", self.identity.email.clone()),
        ];
        if let Some(key) = self.identity.api_key.as_ref().filter(|k| !k.is_empty()) {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// GET an endpoint and return the body of a 200 response.
    ///
    /// Retryable statuses are retried up to `max_retries` times; transport
    /// errors are not retried.
    #[instrument(skip(self, params))]
    async fn get_text(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<String, SearchError> {
        let url = self.endpoint(endpoint);
        let mut attempt = 0;

        loop {
            let response = self
                .client
                .get(&url)
                .map_err(|e| SearchError::Connection(e.to_string()))?
                .query(params)
                .send()
                .await
                .map_err(|e| SearchError::Connection(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::OK {
                return response
                    .text()
                    .await
                    .map_err(|e| SearchError::Connection(e.to_string()));
            }

            if attempt < self.policy.max_retries && (self.policy.retryable)(status) {
                attempt += 1;
                warn!(%status, attempt, "Server error from PubMed, retrying");
                tokio::time::sleep(self.policy.retry_delay).await;
                continue;
            }

            warn!(%status, "PubMed request failed");
            return Err(SearchError::Status(status.as_u16()));
        }
    }

    async fn pause_between_batches(&self, batch: usize) {
        if batch > 0 && !self.policy.batch_delay.is_zero() {
            tokio::time::sleep(self.policy.batch_delay).await;
        }
    }

    #[instrument(skip(self, window))]
    async fn esearch(&self, term: &str, window: &DateWindow, max_results: usize) -> Result<SearchHits, SearchError> {
        let mut params = self.base_params();
        params.push(("term", term.to_string()));
        params.push(("retmode", "json".to_string()));
        params.push(("retmax", max_results.to_string()));
        params.push(("sort", "pub_date".to_string()));
        params.push(("datetype", "pdat".to_string()));
        params.push(("mindate", window.min_param()));
        params.push(("maxdate", window.max_param()));

        let body = self.get_text("esearch.fcgi", &params).await?;
        let hits = parse_esearch(&body)?;
        info!(total = hits.total, returned = hits.ids.len(), "PubMed esearch complete");
        Ok(hits)
    }

    #[instrument(skip(self, pmids), fields(n = pmids.len()))]
    async fn esummary(&self, pmids: &[String]) -> Vec<(String, DocSummary)> {
        let mut summaries = Vec::with_capacity(pmids.len());

        for (i, batch) in pmids.chunks(self.policy.summary_batch_size.max(1)).enumerate() {
            self.pause_between_batches(i).await;

            let mut params = self.base_params();
            params.push(("id", batch.join(",")));
            params.push(("retmode", "json".to_string()));

            let result = match self.get_text("esummary.fcgi", &params).await {
                Ok(body) => parse_esummary(&body, batch),
                Err(e) => Err(e),
            };
            match result {
                Ok(entries) => {
                    debug!(batch = i, requested = batch.len(), received = entries.len(), "esummary batch");
                    summaries.extend(entries);
                }
                Err(e) => warn!(batch = i, error = %e, "esummary batch failed; skipping its articles"),
            }
        }

        summaries
    }

    #[instrument(skip(self, pmids), fields(n = pmids.len()))]
    async fn efetch_abstracts(&self, pmids: &[String]) -> AbstractMap {
        let mut abstracts = AbstractMap::new();

        for (i, batch) in pmids.chunks(self.policy.fetch_batch_size.max(1)).enumerate() {
            self.pause_between_batches(i).await;

            let mut params = self.base_params();
            params.push(("id", batch.join(",")));
            params.push(("rettype", "abstract".to_string()));
            params.push(("retmode", "xml".to_string()));

            match self.get_text("efetch.fcgi", &params).await {
                Ok(xml) => {
                    let parsed = parse_abstracts(&xml);
                    debug!(batch = i, requested = batch.len(), parsed = parsed.len(), "efetch batch");
                    abstracts.extend_found(parsed);
                }
                Err(e) => {
                    warn!(batch = i, error = %e, "efetch batch failed; abstracts unavailable");
                    abstracts.mark_unavailable(batch);
                }
            }
        }

        abstracts
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn search(
        &self,
        term: &str,
        window: &DateWindow,
        max_results: usize,
    ) -> Result<SearchHits, SearchError> {
        self.esearch(term, window, max_results).await
    }

    async fn fetch_summaries(&self, pmids: &[String]) -> Vec<(String, DocSummary)> {
        self.esummary(pmids).await
    }

    async fn fetch_abstracts(&self, pmids: &[String]) -> AbstractMap {
        self.efetch_abstracts(pmids).await
    }
}

/// Parse an esearch JSON body.
fn parse_esearch(body: &str) -> Result<SearchHits, SearchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SearchError::Malformed(format!("esearch body is not JSON: {e}")))?;

    if let Some(message) = value["error"].as_str() {
        return Err(SearchError::Provider(message.to_string()));
    }

    let result = value
        .get("esearchresult")
        .ok_or_else(|| SearchError::Malformed("missing esearchresult".to_string()))?;

    if let Some(message) = result["ERROR"].as_str() {
        return Err(SearchError::Provider(message.to_string()));
    }
    if let Some(message) = result["errorlist"]["errormessage"]
        .as_array()
        .and_then(|messages| messages.first())
        .and_then(Value::as_str)
    {
        return Err(SearchError::Provider(message.to_string()));
    }

    let total = match &result["count"] {
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    };

    let ids = result["idlist"]
        .as_array()
        .map(|ids| ids.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    Ok(SearchHits { total, ids })
}

/// Parse an esummary JSON body, keeping the batch order.
fn parse_esummary(body: &str, batch: &[String]) -> Result<Vec<(String, DocSummary)>, SearchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SearchError::Malformed(format!("esummary body is not JSON: {e}")))?;

    let result = value
        .get("result")
        .ok_or_else(|| SearchError::Malformed("missing result".to_string()))?;

    let mut entries = Vec::with_capacity(batch.len());
    for pmid in batch {
        let Some(entry) = result.get(pmid) else {
            debug!(pmid = %pmid, "PMID missing from esummary response");
            continue;
        };
        if entry.get("error").is_some() {
            debug!(pmid = %pmid, "esummary reported an error for PMID");
            continue;
        }
        match serde_json::from_value::<DocSummary>(entry.clone()) {
            Ok(summary) => entries.push((pmid.clone(), summary)),
            Err(e) => warn!(pmid = %pmid, error = %e, "Unreadable esummary entry"),
        }
    }

    Ok(entries)
}
