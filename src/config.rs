//! Scraper configuration.
//!
//! [`ScrapeConfig`] carries every knob the pipeline reads. Values come from,
//! in increasing precedence: the documented defaults, an optional YAML file,
//! and CLI flags. The result is validated once with
//! [`ScrapeConfig::validate`] before any browser work starts.
//!
//! # YAML example
//!
//! ```yaml
//! target_url: https://hacks.mozilla.org/
//! retry_attempts: 3
//! request_delay_ms: 1000
//! output_dir: ./output
//! formats: [json, csv, txt]
//! browser:
//!   headless: true
//!   no_sandbox: false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

use crate::error::ScrapeError;

/// Listing page scraped when nothing else is configured.
pub const DEFAULT_TARGET_URL: &str = "https://hacks.mozilla.org/";

/// Options passed to the browser at launch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Pass `--no-sandbox` to Chromium (needed in most containers).
    pub no_sandbox: bool,
    /// How long to wait for the browser process to come up.
    pub launch_timeout_secs: u64,
    /// Explicit Chromium binary; autodetected when unset.
    pub executable: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: false,
            launch_timeout_secs: 30,
            executable: None,
        }
    }
}

impl BrowserOptions {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }
}

/// Everything the extraction and export stages need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Listing page to scrape.
    pub target_url: String,
    /// Navigation attempts before giving up. Must be at least 1.
    pub retry_attempts: u32,
    /// Base of the linear backoff between navigation attempts.
    pub request_delay_ms: u64,
    /// Timeout for a single page load.
    pub page_timeout_secs: u64,
    /// Timeout for the article list to appear once the page has loaded.
    pub content_timeout_secs: u64,
    /// Directory that receives `articles.<ext>` files.
    pub output_dir: PathBuf,
    /// Requested output formats by name.
    pub formats: Vec<String>,
    pub browser: BrowserOptions,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            retry_attempts: 3,
            request_delay_ms: 1000,
            page_timeout_secs: 30,
            content_timeout_secs: 10,
            output_dir: PathBuf::from("./output"),
            formats: ["json", "csv", "xlsx", "txt", "pdf"]
                .into_iter()
                .map(String::from)
                .collect(),
            browser: BrowserOptions::default(),
        }
    }
}

impl ScrapeConfig {
    /// Visible browser and a single attempt, for working on selectors.
    pub fn development() -> Self {
        Self {
            retry_attempts: 1,
            browser: BrowserOptions {
                headless: false,
                ..BrowserOptions::default()
            },
            ..Self::default()
        }
    }

    /// Headless, sandbox disabled, three attempts.
    pub fn production() -> Self {
        Self {
            retry_attempts: 3,
            browser: BrowserOptions {
                headless: true,
                no_sandbox: true,
                ..BrowserOptions::default()
            },
            ..Self::default()
        }
    }

    /// Load a YAML file. Keys that are absent keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn from_file(path: &Path) -> Result<Self, ScrapeError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScrapeError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml(&text)?;
        info!("Loaded configuration file");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ScrapeError> {
        serde_yaml::from_str(text)
            .map_err(|e| ScrapeError::invalid_config(format!("malformed YAML: {e}")))
    }

    /// Check the constraints and return the parsed target URL.
    pub fn validate(&self) -> Result<Url, ScrapeError> {
        let url = Url::parse(&self.target_url).map_err(|e| {
            ScrapeError::invalid_config(format!("target URL {:?}: {e}", self.target_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::invalid_config(format!(
                "target URL must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.retry_attempts == 0 {
            return Err(ScrapeError::invalid_config(
                "retry_attempts must be greater than 0",
            ));
        }
        if self.page_timeout_secs == 0 || self.content_timeout_secs == 0 {
            return Err(ScrapeError::invalid_config(
                "page and content timeouts must be greater than 0",
            ));
        }
        Ok(url)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }
}
