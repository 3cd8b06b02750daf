//! Utility functions for text layout, size formatting, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Text truncation and word wrapping for the text and PDF renderings
//! - Human readable byte sizes for the final report
//! - Output directory validation and atomic artifact writes

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, instrument};

/// Truncate a string to `max` characters, appending `...` when cut.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_text("short", 60), "short");
/// assert_eq!(truncate_text("abcdef", 3), "abc...");
/// ```
pub fn truncate_text(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

/// Greedy word wrap on spaces.
///
/// Words longer than `width` are kept whole on their own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Format a byte count with binary units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"").await?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}

/// Create the parent directory of `path` if it is missing.
pub async fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

/// Sibling path used while an artifact is being written.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".partial");
    path.with_file_name(name)
}

/// Write `bytes` to `path` so readers never see a half-written file.
///
/// The data goes to a hidden sibling first and is renamed over `path` once
/// complete. Returns the number of bytes written.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<u64> {
    ensure_parent_dir(path).await?;
    let staging = staging_path(path);

    if let Err(e) = fs::write(&staging, bytes).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact");
    Ok(bytes.len() as u64)
}
