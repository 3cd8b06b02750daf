//! Headless-browser extraction of the article listing.
//!
//! The scraper follows a fixed sequence against a single browser session:
//!
//! 1. **Launch**: start the browser and open one page
//! 2. **Navigate**: load the listing with bounded, linearly backed-off retries
//!    until the article list is present
//! 3. **Extract**: read the rendered HTML through the [`schema`] table
//! 4. **Normalize**: hand the raw items to [`crate::normalize`]
//! 5. **Cleanup**: close page and browser, exactly once, on every path
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`hacks`] | [`ArticleScraper`]: the sequence above |
//! | [`browser`] | Chromium driver over the DevTools protocol |
//! | [`schema`] | Field-to-selector table and HTML evaluation |
//!
//! The driver sits behind [`BrowserLauncher`] / [`BrowserSession`] so the
//! retry and cleanup rules can run against a scripted session in tests.

use std::time::Duration;

use crate::config::BrowserOptions;
use crate::error::BrowserError;

pub mod browser;
pub mod hacks;
pub mod schema;

pub use browser::ChromiumLauncher;
pub use hacks::ArticleScraper;

/// User agent presented by every page.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Desktop viewport as `(width, height)`.
pub const VIEWPORT: (u32, u32) = (1920, 1080);

/// One open page inside a running browser.
pub trait BrowserSession {
    /// Load `url`, failing if it takes longer than `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Wait until `selector` matches at least one element.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// The current rendered HTML of the page.
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Close the page and the browser behind it.
    async fn close(self) -> Result<(), BrowserError>;
}

/// Starts browser sessions.
pub trait BrowserLauncher {
    type Session: BrowserSession;

    async fn launch(&self, options: &BrowserOptions) -> Result<Self::Session, BrowserError>;
}
