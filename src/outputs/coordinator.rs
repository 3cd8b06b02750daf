//! Concurrent fan-out of one article collection to many export tasks.
//!
//! Each task runs on its own tokio task over a shared `Arc` of the
//! articles. A failing or panicking exporter only affects its own
//! [`ExportResult`]; the batch always completes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use itertools::Itertools;
use tokio::task::JoinError;
use tracing::{error, info, instrument};

use super::{ExportFormat, ExportMeta, ExportTask};
use crate::error::{ExportError, ScrapeError};
use crate::models::{Article, ExportOutcome, ExportResult};

/// Comparison key for destinations: absolute, with `.` components and
/// repeated separators removed. `..` and symlinks are not resolved.
fn destination_key(path: &Path) -> PathBuf {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .components()
        .collect()
}

fn outcome_of(
    format: ExportFormat,
    joined: Result<Result<u64, ExportError>, JoinError>,
) -> ExportOutcome {
    match joined {
        Ok(Ok(bytes)) => ExportOutcome::Written { bytes },
        Ok(Err(e)) => ExportOutcome::Failed {
            error: e.to_string(),
        },
        Err(e) => ExportOutcome::Failed {
            error: format!("{} exporter panicked: {e}", format.format_name()),
        },
    }
}

/// Run every task concurrently and collect one result per task, in input order.
///
/// # Errors
///
/// The batch is rejected up front, before anything is written, when:
/// - `tasks` is empty ([`ScrapeError::NoExportTasks`])
/// - two tasks name the same file, compared after making the paths absolute
///   ([`ScrapeError::DuplicateDestination`])
///
/// Per-format failures are never returned as `Err`; they appear as
/// [`ExportOutcome::Failed`] entries.
#[instrument(level = "info", skip_all, fields(articles = articles.len(), tasks = tasks.len()))]
pub async fn export_all(
    articles: Arc<Vec<Article>>,
    tasks: &[ExportTask],
    meta: &ExportMeta,
) -> Result<Vec<ExportResult>, ScrapeError> {
    if tasks.is_empty() {
        return Err(ScrapeError::NoExportTasks);
    }
    if let Some(task) = tasks
        .iter()
        .duplicates_by(|task| destination_key(&task.destination))
        .next()
    {
        return Err(ScrapeError::DuplicateDestination {
            destination: task.destination.clone(),
        });
    }

    let handles = tasks.iter().cloned().map(|task| {
        let articles = Arc::clone(&articles);
        let meta = meta.clone();
        tokio::spawn(async move {
            task.format
                .export_to_file(&task.destination, &articles, &meta)
                .await
        })
    });
    let joined = join_all(handles).await;

    let results: Vec<ExportResult> = tasks
        .iter()
        .zip(joined)
        .map(|(task, joined)| {
            let outcome = outcome_of(task.format, joined);
            if let ExportOutcome::Failed { error } = &outcome {
                error!(
                    format = task.format.format_name(),
                    path = %task.destination.display(),
                    error = %error,
                    "Export failed"
                );
            }
            ExportResult {
                format: task.format,
                destination: task.destination.clone(),
                outcome,
            }
        })
        .collect();

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        succeeded,
        failed = results.len() - succeeded,
        "Export batch finished"
    );
    Ok(results)
}
