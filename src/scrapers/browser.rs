//! Chromium driver built on `chromiumoxide`.
//!
//! A [`ChromiumSession`] owns the browser process, the DevTools event loop
//! task and exactly one page. Closing the session tears down all three.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use super::{BrowserLauncher, BrowserSession, USER_AGENT, VIEWPORT};
use crate::config::BrowserOptions;
use crate::error::BrowserError;

/// How often the content-ready wait re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches a local Chromium through the DevTools protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumLauncher;

fn browser_config(options: &BrowserOptions) -> Result<BrowserConfig, BrowserError> {
    let (width, height) = VIEWPORT;
    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .viewport(Viewport {
            width,
            height,
            ..Viewport::default()
        })
        .launch_timeout(options.launch_timeout());

    if !options.headless {
        builder = builder.with_head();
    }
    if options.no_sandbox {
        builder = builder.no_sandbox();
    }
    if let Some(path) = &options.executable {
        builder = builder.chrome_executable(path);
    }

    builder.build().map_err(BrowserError::Other)
}

impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    #[instrument(level = "info", skip_all, fields(headless = options.headless))]
    async fn launch(&self, options: &BrowserOptions) -> Result<ChromiumSession, BrowserError> {
        let config = browser_config(options)?;
        let (mut browser, mut handler) = Browser::launch(config).await?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "DevTools handler stopped");
                    break;
                }
            }
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after page setup error");
                }
                events.abort();
                return Err(e);
            }
        };

        info!("Browser session ready");
        Ok(ChromiumSession {
            browser,
            page,
            events,
        })
    }
}

async fn open_page(browser: &Browser) -> Result<Page, BrowserError> {
    let page = browser.new_page("about:blank").await?;
    page.set_user_agent(user_agent_override()).await?;
    Ok(page)
}

fn user_agent_override() -> SetUserAgentOverrideParams {
    SetUserAgentOverrideParams::new(USER_AGENT)
}

/// A running Chromium with a single open page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    events: JoinHandle<()>,
}

impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str, limit: Duration) -> Result<(), BrowserError> {
        match timeout(limit, self.page.goto(url)).await {
            Ok(result) => result.map(|_| ()).map_err(BrowserError::from),
            Err(_) => Err(BrowserError::Timeout {
                operation: "page load",
                timeout: limit,
            }),
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        limit: Duration,
    ) -> Result<(), BrowserError> {
        let page = &self.page;
        let poll = async {
            while page.find_element(selector).await.is_err() {
                sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        timeout(limit, poll)
            .await
            .map_err(|_| BrowserError::Timeout {
                operation: "waiting for article list",
                timeout: limit,
            })
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.page.content().await?)
    }

    async fn close(self) -> Result<(), BrowserError> {
        let ChromiumSession {
            mut browser,
            page,
            events,
        } = self;

        let page_closed = page.close().await;
        let browser_closed = browser.close().await;
        if browser_closed.is_ok() {
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "Browser process did not exit cleanly");
            }
        }
        events.abort();

        page_closed?;
        browser_closed?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_override_uses_desktop_agent() {
        let params = user_agent_override();
        assert_eq!(params.user_agent, USER_AGENT);
        assert!(params.accept_language.is_none());
    }
}
