//! Monthly archival of the active service log.
//!
//! Once per calendar month the active log file is copied to
//! `MM-DD-YYYY_sigbridge_log.txt` in the logs directory and then
//! truncated. Rollover bookkeeping is the one piece of state shared
//! across concurrent requests, so it runs under a single global lock.

use std::path::Path;

use chrono::{Datelike, Local};
use tokio::sync::Mutex;

/// File name of the active log.
pub const ACTIVE_LOG_NAME: &str = "sigbridge_log.txt";

/// Suffix of archived log file names.
const ARCHIVE_SUFFIX: &str = "_sigbridge_log.txt";

static ROLLOVER_LOCK: Mutex<()> = Mutex::const_new(());

/// Archive the active log if no archive exists yet for the current month.
///
/// Missing directories or a missing active log are treated as "nothing
/// to archive". Holding the global lock serializes rollover across
/// concurrent requests.
///
/// # Errors
///
/// Returns an I/O error if listing, copying or truncating fails.
pub async fn archive_monthly(logs_dir: &Path, active_log: &Path) -> std::io::Result<()> {
    let _guard = ROLLOVER_LOCK.lock().await;

    if !logs_dir.is_dir() {
        tracing::debug!(path = %logs_dir.display(), "Logs directory does not exist, skipping archive");
        return Ok(());
    }
    if !active_log.is_file() {
        tracing::debug!(path = %active_log.display(), "No active log to archive");
        return Ok(());
    }

    let now = Local::now();
    let month = format!("{:02}", now.month());
    let day = format!("{:02}", now.day());
    let year = format!("{:04}", now.year());

    if archive_exists(logs_dir, &month, &year).await? {
        return Ok(());
    }

    // Archived names are MM-DD-YYYY_sigbridge_log.txt.
    let destination = logs_dir.join(format!("{month}-{day}-{year}{ARCHIVE_SUFFIX}"));
    tracing::info!(path = %destination.display(), "Saving monthly log archive");
    tokio::fs::copy(active_log, &destination).await?;

    tracing::info!("Clearing active log");
    tokio::fs::write(active_log, b"").await?;
    Ok(())
}

/// Check whether an archive already exists for the given month and year.
async fn archive_exists(logs_dir: &Path, month: &str, year: &str) -> std::io::Result<bool> {
    let mut entries = tokio::fs::read_dir(logs_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(ARCHIVE_SUFFIX) {
            continue;
        }
        // Name layout: MM-DD-YYYY_sigbridge_log.txt
        let (log_month, log_year) = (name.get(0..2), name.get(6..10));
        if log_month == Some(month) && log_year == Some(year) {
            return Ok(true);
        }
    }
    Ok(false)
}
