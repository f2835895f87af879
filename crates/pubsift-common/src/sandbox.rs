use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::PubsiftError;

/// Default per-request timeout. Every remote call is bounded by it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that only allows requests to approved domains.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default timeout and the NCBI allowlist.
    pub fn new() -> Result<Self, PubsiftError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, PubsiftError> {
        let domains = [
            "eutils.ncbi.nlm.nih.gov",  // E-utilities
            "pubmed.ncbi.nlm.nih.gov",  // Article pages
            "localhost",
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("pubsift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PubsiftError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        // Exact match or a subdomain of an allowed domain
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    /// Builds a GET request if the URL passes the allowlist.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, PubsiftError> {
        if !self.is_allowed(url) {
            return Err(PubsiftError::SecurityError(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ncbi_hosts_allowed() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"));
        assert!(client.is_allowed("http://127.0.0.1:8080/esearch.fcgi"));
    }

    #[test]
    fn test_unknown_host_rejected() {
        let client = SandboxClient::new().unwrap();
        assert!(!client.is_allowed("https://example.org/esearch.fcgi"));
        assert!(!client.is_allowed("not a url"));
        assert!(matches!(
            client.get("https://example.org/"),
            Err(PubsiftError::SecurityError(_))
        ));
    }

    #[test]
    fn test_allow_domain_extends_allowlist() {
        let mut client = SandboxClient::new().unwrap();
        assert!(!client.is_allowed("https://mirror.example.org/efetch.fcgi"));
        client.allow_domain("example.org");
        assert!(client.is_allowed("https://mirror.example.org/efetch.fcgi"));
    }
}
