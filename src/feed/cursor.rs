//! Durable feed cursor: one epoch-seconds scalar in one file.
//!
//! The cursor is the sole durability boundary of the poller. It is loaded
//! once at startup and rewritten (atomically, tmp + rename) after every
//! single emission, so a crash can duplicate at most the one item whose
//! persist had not landed yet.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{error, info};

/// Timestamp of the most recently announced feed item, backed by a file.
#[derive(Debug)]
pub struct FeedCursor {
    path: PathBuf,
    value: i64,
}

impl FeedCursor {
    /// Load the cursor from `path`. A missing or unparseable file means
    /// "nothing announced yet" and loads as 0.
    pub async fn load(path: PathBuf) -> Self {
        let value = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents.trim().parse().unwrap_or(0),
            Err(_) => 0,
        };
        info!(path = %path.display(), value, "feed cursor loaded");
        Self { path, value }
    }

    /// The current cursor value (epoch seconds).
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Persist `timestamp`, then adopt it in memory.
    ///
    /// A persist failure is logged and the in-memory value still advances —
    /// no duplicates can happen within this process lifetime; only the
    /// crash-restart window widens until a later persist succeeds.
    pub async fn advance(&mut self, timestamp: i64) {
        if let Err(e) = write_cursor_file(&self.path, timestamp).await {
            error!(path = %self.path.display(), error = %e, "failed to persist feed cursor");
        }
        self.value = timestamp;
    }
}

/// Write the value to a temp file and rename it into place, so readers and
/// crashed half-writes never leave a torn file behind.
async fn write_cursor_file(path: &Path, value: i64) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("failed to create cursor directory")?;
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, value.to_string().as_bytes())
        .await
        .context("failed to write cursor temp file")?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .context("failed to rename cursor temp file")?;
    Ok(())
}
