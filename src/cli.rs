//! Command-line interface definitions for the article scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also be provided via environment variables. Flags given
//! here override the values from `--config` or `--profile`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ScrapeConfig;

/// Built-in configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Visible browser, single navigation attempt
    Development,
    /// Headless, sandbox disabled, three attempts
    Production,
}

impl Profile {
    pub fn preset(self) -> ScrapeConfig {
        match self {
            Profile::Development => ScrapeConfig::development(),
            Profile::Production => ScrapeConfig::production(),
        }
    }
}

/// Command-line arguments for the article scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape the default listing into ./output in every format
/// hacks_scraper
///
/// # Only JSON and CSV, into a custom directory
/// hacks_scraper -o ./exports -f json,csv
///
/// # Watch the browser while tuning selectors
/// hacks_scraper --profile development
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, env = "HACKS_SCRAPER_CONFIG", conflicts_with = "profile")]
    pub config: Option<PathBuf>,

    /// Start from a built-in preset instead of a config file
    #[arg(long, value_enum)]
    pub profile: Option<Profile>,

    /// Listing page to scrape
    #[arg(short, long, env = "HACKS_SCRAPER_URL")]
    pub url: Option<String>,

    /// Output directory for the exported files
    #[arg(short, long, env = "HACKS_SCRAPER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comma separated list of output formats (json,csv,xlsx,txt,pdf)
    #[arg(short, long, value_delimiter = ',')]
    pub formats: Option<Vec<String>>,

    /// Navigation attempts before giving up
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Base delay between navigation attempts, in milliseconds
    #[arg(long)]
    pub request_delay_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Print the supported output formats and exit
    #[arg(long)]
    pub list_formats: bool,
}

impl Cli {
    /// Overlay every flag that was given onto `config`.
    pub fn apply_overrides(&self, config: &mut ScrapeConfig) {
        if let Some(url) = &self.url {
            config.target_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(formats) = &self.formats {
            config.formats = formats.clone();
        }
        if let Some(attempts) = self.retry_attempts {
            config.retry_attempts = attempts;
        }
        if let Some(delay) = self.request_delay_ms {
            config.request_delay_ms = delay;
        }
        if self.headful {
            config.browser.headless = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["hacks_scraper"]);
        assert!(cli.profile.is_none());
        assert!(cli.formats.is_none());
        assert!(!cli.headful);
        assert!(!cli.list_formats);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "hacks_scraper",
            "-u",
            "https://example.com/blog/",
            "-o",
            "/tmp/out",
            "-f",
            "json,csv",
        ]);

        assert_eq!(cli.url.as_deref(), Some("https://example.com/blog/"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(
            cli.formats,
            Some(vec!["json".to_string(), "csv".to_string()])
        );
    }

    #[test]
    fn test_profile_parsing() {
        let cli = Cli::parse_from(["hacks_scraper", "--profile", "production"]);
        assert_eq!(cli.profile, Some(Profile::Production));
        assert!(cli.profile.unwrap().preset().browser.no_sandbox);
    }

    #[test]
    fn test_config_conflicts_with_profile() {
        let result = Cli::try_parse_from([
            "hacks_scraper",
            "--config",
            "config.yaml",
            "--profile",
            "development",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let cli = Cli::parse_from([
            "hacks_scraper",
            "--retry-attempts",
            "5",
            "--request-delay-ms",
            "250",
            "--headful",
        ]);
        let mut config = ScrapeConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.request_delay_ms, 250);
        assert!(!config.browser.headless);
        assert_eq!(config.target_url, ScrapeConfig::default().target_url);
        assert_eq!(config.formats.len(), 5);
    }
}
