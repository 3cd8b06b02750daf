//! Article scraper for the listing page.
//!
//! [`ArticleScraper`] owns one browser session for its whole life and uses
//! it strictly sequentially: one page, one navigation attempt at a time.
//!
//! # Retry Strategy
//!
//! - `retry_attempts` navigation attempts (default 3)
//! - An attempt succeeds only once the page loaded *and* the article list
//!   appeared, each under its own timeout
//! - Linear backoff between attempts: `request_delay * next_attempt`, so the
//!   waits are 2x, 3x, ... the configured delay
//!
//! # Cleanup
//!
//! [`ArticleScraper::scrape_articles`] always closes the session, whether the
//! run succeeded or not. Close failures are logged and never replace the
//! error that ended the run.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

use super::schema::{ARTICLE_LIST, CompiledSchema};
use super::{BrowserLauncher, BrowserSession, ChromiumLauncher};
use crate::config::ScrapeConfig;
use crate::error::{BrowserError, ScrapeError};
use crate::models::{Article, RawArticle};
use crate::normalize::normalize;

/// Delay slept after failed attempt number `failed_attempt` (1-based).
///
/// Scales with the number of the attempt about to be made.
pub fn backoff_delay(base: Duration, failed_attempt: u32) -> Duration {
    base.saturating_mul(failed_attempt.saturating_add(1))
}

/// Drives a browser session through launch, navigation and extraction.
pub struct ArticleScraper<L: BrowserLauncher> {
    launcher: L,
    config: ScrapeConfig,
    target: Url,
    session: Option<L::Session>,
}

impl ArticleScraper<ChromiumLauncher> {
    /// Default configuration pointed at another listing page.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::InvalidConfig`] if `target_url` is not a well-formed
    /// http(s) URL.
    pub fn for_url(target_url: &str) -> Result<Self, ScrapeError> {
        let config = ScrapeConfig {
            target_url: target_url.to_string(),
            ..ScrapeConfig::default()
        };
        Self::new(ChromiumLauncher, config)
    }
}

impl<L: BrowserLauncher> ArticleScraper<L> {
    /// Validate `config` and build an idle scraper. No browser is started yet.
    pub fn new(launcher: L, config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let target = config.validate()?;
        Ok(Self {
            launcher,
            config,
            target,
            session: None,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Start the browser and open the page.
    #[instrument(level = "info", skip_all)]
    pub async fn initialize(&mut self) -> Result<(), ScrapeError> {
        if self.session.is_some() {
            warn!("Browser session already initialized");
            return Ok(());
        }
        let session = self
            .launcher
            .launch(&self.config.browser)
            .await
            .map_err(|source| ScrapeError::BrowserInit { source })?;
        self.session = Some(session);
        Ok(())
    }

    /// Load `target_url` until the article list is present.
    ///
    /// Makes at most `max_attempts` attempts and sleeps
    /// [`backoff_delay`]`(base_delay, attempt)` after each failed one except
    /// the last.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Navigation`] with the last attempt's cause once every
    /// attempt has failed.
    #[instrument(level = "info", skip_all, fields(url = %target_url, max_attempts = max_attempts))]
    pub async fn navigate(
        &mut self,
        target_url: &Url,
        max_attempts: u32,
        base_delay: Duration,
    ) -> Result<(), ScrapeError> {
        if max_attempts == 0 {
            return Err(ScrapeError::invalid_config(
                "retry_attempts must be greater than 0",
            ));
        }
        let page_timeout = self.config.page_timeout();
        let content_timeout = self.config.content_timeout();
        let session = self.session.as_mut().ok_or_else(|| ScrapeError::Navigation {
            attempts: 0,
            source: BrowserError::Other("browser session not initialized".to_string()),
        })?;

        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            info!(attempt, max = max_attempts, "Navigating to listing page");
            let attempt_t0 = Instant::now();

            let loaded = match session.goto(target_url.as_str(), page_timeout).await {
                Ok(()) => {
                    session
                        .wait_for_selector(ARTICLE_LIST, content_timeout)
                        .await
                }
                Err(e) => Err(e),
            };

            match loaded {
                Ok(()) => {
                    info!(
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Page loaded successfully"
                    );
                    return Ok(());
                }
                Err(e) if attempt >= max_attempts => {
                    error!(
                        attempt,
                        max = max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "Navigation exhausted retries"
                    );
                    return Err(ScrapeError::Navigation {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    let delay = backoff_delay(base_delay, attempt);
                    warn!(
                        attempt,
                        max = max_attempts,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        ?delay,
                        error = %e,
                        "Navigation attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Read one [`RawArticle`] per list item, in document order.
    #[instrument(level = "info", skip_all)]
    pub async fn extract_raw(&mut self) -> Result<Vec<RawArticle>, ScrapeError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ScrapeError::extraction("browser session not initialized"))?;

        info!("Extracting article data");
        let html = session.content().await.map_err(ScrapeError::extraction)?;
        let schema = CompiledSchema::compile()?;
        let raw = schema.extract(&html, &self.target);

        let incomplete = raw
            .iter()
            .filter(|item| item.title.is_empty() || item.url.is_empty())
            .count();
        if incomplete > 0 {
            warn!(incomplete, "List items without a title or link will be dropped");
        }
        info!(count = raw.len(), "Extracted list items");
        Ok(raw)
    }

    /// Close the session if one is open. Safe to call more than once.
    #[instrument(level = "info", skip_all)]
    pub async fn cleanup(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match session.close().await {
            Ok(()) => info!("Browser session closed"),
            Err(e) => warn!(error = %e, "Cleanup warning: failed to close browser session"),
        }
    }

    /// Full extraction run: launch, navigate, extract, normalize, clean up.
    #[instrument(level = "info", skip_all, fields(url = %self.target))]
    pub async fn scrape_articles(&mut self) -> Result<Vec<Article>, ScrapeError> {
        let result = self.run().await;
        self.cleanup().await;
        if let Err(e) = &result {
            error!(error = %e, "Scraping failed");
        }
        result
    }

    async fn run(&mut self) -> Result<Vec<Article>, ScrapeError> {
        self.initialize().await?;
        let target = self.target.clone();
        let max_attempts = self.config.retry_attempts;
        let base_delay = self.config.request_delay();
        self.navigate(&target, max_attempts, base_delay).await?;
        let raw = self.extract_raw().await?;
        normalize(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowserOptions;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const PAGE: &str = r#"
<ul>
  <li class="list-item">
    <h3 class="post__title"><a href="/2025/05/one/">One</a></h3>
    <p class="post__tease">First teaser</p>
    <img alt="Ann Lee avatar" src="/img/ann.png">
  </li>
  <li class="list-item">
    <h3 class="post__title"><a href="/2025/04/two/">Two</a></h3>
  </li>
</ul>"#;

    const PAGE_WITHOUT_LINKS: &str = r#"
<ul>
  <li class="list-item"><h3 class="post__title">One</h3></li>
  <li class="list-item"><h3 class="post__title">Two</h3></li>
</ul>"#;

    #[derive(Debug, Default)]
    struct Calls {
        gotos: AtomicU32,
        waits: AtomicU32,
        closes: AtomicU32,
    }

    #[derive(Debug, Clone)]
    struct ScriptedLauncher {
        calls: Arc<Calls>,
        fail_launch: bool,
        failing_gotos: u32,
        html: Option<&'static str>,
        fail_close: bool,
    }

    impl ScriptedLauncher {
        fn new(failing_gotos: u32) -> Self {
            Self {
                calls: Arc::new(Calls::default()),
                fail_launch: false,
                failing_gotos,
                html: Some(PAGE),
                fail_close: false,
            }
        }
    }

    struct ScriptedSession {
        script: ScriptedLauncher,
    }

    impl BrowserLauncher for ScriptedLauncher {
        type Session = ScriptedSession;

        async fn launch(&self, _options: &BrowserOptions) -> Result<ScriptedSession, BrowserError> {
            if self.fail_launch {
                return Err(BrowserError::Other("chrome not found".to_string()));
            }
            Ok(ScriptedSession {
                script: self.clone(),
            })
        }
    }

    impl BrowserSession for ScriptedSession {
        async fn goto(&mut self, _url: &str, _timeout: Duration) -> Result<(), BrowserError> {
            let call = self.script.calls.gotos.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.script.failing_gotos {
                Err(BrowserError::Other(format!("net::ERR_CONNECTION_RESET on call {call}")))
            } else {
                Ok(())
            }
        }

        async fn wait_for_selector(
            &mut self,
            selector: &str,
            _timeout: Duration,
        ) -> Result<(), BrowserError> {
            assert_eq!(selector, ARTICLE_LIST);
            self.script.calls.waits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn content(&mut self) -> Result<String, BrowserError> {
            self.script
                .html
                .map(str::to_string)
                .ok_or_else(|| BrowserError::Other("target closed".to_string()))
        }

        async fn close(self) -> Result<(), BrowserError> {
            self.script.calls.closes.fetch_add(1, Ordering::SeqCst);
            if self.script.fail_close {
                Err(BrowserError::Other("browser already gone".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn config(retry_attempts: u32) -> ScrapeConfig {
        ScrapeConfig {
            target_url: "https://hacks.mozilla.org/".to_string(),
            retry_attempts,
            request_delay_ms: 0,
            ..ScrapeConfig::default()
        }
    }

    #[test]
    fn test_backoff_is_linear() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(3000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(Duration::ZERO, 5), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_navigation_succeeds_on_kth_call() {
        for k in 1..=3u32 {
            let launcher = ScriptedLauncher::new(k - 1);
            let calls = Arc::clone(&launcher.calls);
            let mut scraper = ArticleScraper::new(launcher, config(3)).unwrap();

            scraper.initialize().await.unwrap();
            let target = scraper.target().clone();
            scraper.navigate(&target, 3, Duration::ZERO).await.unwrap();

            assert_eq!(calls.gotos.load(Ordering::SeqCst), k);
            assert_eq!(calls.waits.load(Ordering::SeqCst), 1);
            scraper.cleanup().await;
        }
    }

    #[tokio::test]
    async fn test_navigation_gives_up_after_max_attempts() {
        let launcher = ScriptedLauncher::new(10);
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(3)).unwrap();

        scraper.initialize().await.unwrap();
        let target = scraper.target().clone();
        let err = scraper
            .navigate(&target, 3, Duration::ZERO)
            .await
            .unwrap_err();

        match err {
            ScrapeError::Navigation { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("call 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.gotos.load(Ordering::SeqCst), 3);
        assert_eq!(calls.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scrape_articles_normalizes_in_order_and_closes_once() {
        let launcher = ScriptedLauncher::new(1);
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(2)).unwrap();

        let articles = scraper.scrape_articles().await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "One");
        assert_eq!(articles[0].url, "https://hacks.mozilla.org/2025/05/one/");
        assert_eq!(articles[0].author, "Ann Lee");
        assert_eq!(
            articles[0].featured_image,
            "https://hacks.mozilla.org/img/ann.png"
        );
        assert_eq!(articles[1].title, "Two");
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);

        scraper.cleanup().await;
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_navigation_still_cleans_up_once() {
        let launcher = ScriptedLauncher::new(5);
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(2)).unwrap();

        let err = scraper.scrape_articles().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation { attempts: 2, .. }));
        assert_eq!(calls.gotos.load(Ordering::SeqCst), 2);
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_is_browser_init_error() {
        let launcher = ScriptedLauncher {
            fail_launch: true,
            ..ScriptedLauncher::new(0)
        };
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(3)).unwrap();

        let err = scraper.scrape_articles().await.unwrap_err();
        assert!(matches!(err, ScrapeError::BrowserInit { .. }));
        assert_eq!(calls.gotos.load(Ordering::SeqCst), 0);
        assert_eq!(calls.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dom_read_failure_is_extraction_error() {
        let launcher = ScriptedLauncher {
            html: None,
            ..ScriptedLauncher::new(0)
        };
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(3)).unwrap();

        let err = scraper.scrape_articles().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { .. }));
        assert!(err.to_string().contains("target closed"));
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_items_without_links_yield_no_valid_articles() {
        let launcher = ScriptedLauncher {
            html: Some(PAGE_WITHOUT_LINKS),
            ..ScriptedLauncher::new(0)
        };
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(3)).unwrap();

        let err = scraper.scrape_articles().await.unwrap_err();
        assert!(matches!(err, ScrapeError::NoValidArticles));
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_success() {
        let launcher = ScriptedLauncher {
            fail_close: true,
            ..ScriptedLauncher::new(0)
        };
        let calls = Arc::clone(&launcher.calls);
        let mut scraper = ArticleScraper::new(launcher, config(1)).unwrap();

        let articles = scraper.scrape_articles().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_replace_earlier_error() {
        let launcher = ScriptedLauncher {
            fail_close: true,
            ..ScriptedLauncher::new(9)
        };
        let mut scraper = ArticleScraper::new(launcher, config(1)).unwrap();

        let err = scraper.scrape_articles().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation { attempts: 1, .. }));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        assert!(matches!(
            ArticleScraper::for_url("not a url"),
            Err(ScrapeError::InvalidConfig { .. })
        ));
        assert!(ArticleScraper::new(ScriptedLauncher::new(0), config(0)).is_err());
    }

    #[test]
    fn test_for_url_accepts_other_listing() {
        let scraper = ArticleScraper::for_url("https://example.com/blog/").unwrap();
        assert_eq!(scraper.target().as_str(), "https://example.com/blog/");
    }
}
