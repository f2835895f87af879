//! Configuration loading for pubsift.
//! Reads pubsift.toml from the current directory or the path in PUBSIFT_CONFIG.
//! NCBI identity can be overridden from the environment (or a .env file).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pubsift_ingestion::sources::pubmed::{NcbiIdentity, RequestPolicy, EUTILS_BASE_URL};
use pubsift_journals::loader::DEFAULT_CANDIDATES;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ncbi: NcbiConfig,
    #[serde(default)]
    pub journals: JournalsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub search: SearchDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NcbiConfig {
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for NcbiConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            email: default_email(),
            api_key: None,
            base_url: default_base_url(),
        }
    }
}

fn default_tool()     -> String { "pubsift".to_string() }
fn default_email()    -> String { "pubsift@example.com".to_string() }
fn default_base_url() -> String { EUTILS_BASE_URL.to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalsConfig {
    /// Reference tables tried in order; the first readable one is used.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<PathBuf>,
}

impl Default for JournalsConfig {
    fn default() -> Self {
        Self { candidates: default_candidates() }
    }
}

fn default_candidates() -> Vec<PathBuf> {
    DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_summary_batch")]
    pub summary_batch_size: usize,
    #[serde(default = "default_fetch_batch")]
    pub fetch_batch_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            summary_batch_size: default_summary_batch(),
            fetch_batch_size: default_fetch_batch(),
        }
    }
}

fn default_timeout_secs()   -> u64   { 30 }
fn default_max_retries()    -> u32   { 1 }
fn default_retry_delay_ms() -> u64   { 1_000 }
fn default_batch_delay_ms() -> u64   { 100 }
fn default_summary_batch()  -> usize { 200 }
fn default_fetch_batch()    -> usize { 50 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "default_years_back")]
    pub years_back: u32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "bool_true")]
    pub humans_only: bool,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            years_back: default_years_back(),
            max_results: default_max_results(),
            humans_only: true,
        }
    }
}

fn default_years_back()  -> u32   { 5 }
fn default_max_results() -> usize { 50 }
fn bool_true()           -> bool  { true }


impl Config {
    /// Load configuration from pubsift.toml.
    /// Checks PUBSIFT_CONFIG first, then the current directory. A missing
    /// file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PUBSIFT_CONFIG")
            .unwrap_or_else(|_| "pubsift.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(Path::new(&path))?
        } else {
            tracing::warn!("Config file not found: {path}; using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override the NCBI identity from NCBI_TOOL_NAME, NCBI_CONTACT_EMAIL and NCBI_API_KEY.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(tool) = non_empty("NCBI_TOOL_NAME") {
            self.ncbi.tool = tool;
        }
        if let Some(email) = non_empty("NCBI_CONTACT_EMAIL") {
            self.ncbi.email = email;
        }
        if let Some(key) = non_empty("NCBI_API_KEY") {
            self.ncbi.api_key = Some(key);
        }
    }

    pub fn identity(&self) -> NcbiIdentity {
        NcbiIdentity {
            tool: self.ncbi.tool.clone(),
            email: self.ncbi.email.clone(),
            api_key: self.ncbi.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    pub fn request_policy(&self) -> RequestPolicy {
        RequestPolicy {
            max_retries: self.http.max_retries,
            retry_delay: Duration::from_millis(self.http.retry_delay_ms),
            batch_delay: Duration::from_millis(self.http.batch_delay_ms),
            timeout: Duration::from_secs(self.http.timeout_secs.max(1)),
            summary_batch_size: self.http.summary_batch_size,
            fetch_batch_size: self.http.fetch_batch_size,
            ..RequestPolicy::default()
        }
    }
}
