//! Filesystem adapter for diagnostic images.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use omr_core::DebugStorage;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

/// Writes diagnostic images into a directory.
///
/// Files are named `{label}_{unix_ts}_{id}.{format}` where `id` is the first
/// eight hex digits of a random UUID. With a retention window set, files
/// older than the window are deleted after every save.
#[derive(Debug, Clone)]
pub struct FsDebugStorage {
    dir: PathBuf,
    retention: Option<Duration>,
}

impl FsDebugStorage {
    /// Creates a storage rooted at `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create debug directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            retention: None,
        })
    }

    /// Deletes files older than `max_age` after each save.
    #[must_use]
    pub const fn with_retention(mut self, max_age: Duration) -> Self {
        self.retention = Some(max_age);
        self
    }

    /// Directory images are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes regular files last modified more than `max_age` ago.
    ///
    /// Files that cannot be inspected or removed are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn cleanup_old_files(&self, max_age: Duration) -> Result<usize> {
        let max_age = time::Duration::try_from(max_age).context("Retention age out of range")?;
        let cutoff = OffsetDateTime::now_utc()
            .checked_sub(max_age)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read debug directory: {}", self.dir.display()))?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let modified = match entry.metadata().and_then(|m| {
                if m.is_file() {
                    m.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => OffsetDateTime::from(modified),
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to inspect {}: {e}", path.display());
                    continue;
                }
            };

            if modified <= cutoff {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Failed to remove {}: {e}", path.display()),
                }
            }
        }

        debug!(
            "Removed {removed} diagnostic files from {}",
            self.dir.display()
        );
        Ok(removed)
    }

    fn file_name(label: &str, format: &str) -> String {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let id = Uuid::new_v4().simple().to_string();
        format!("{label}_{timestamp}_{}.{format}", &id[..8])
    }
}

impl DebugStorage for FsDebugStorage {
    fn save_debug_image(&self, image_data: &[u8], label: &str, format: &str) -> Result<String> {
        let path = self.dir.join(Self::file_name(label, format));
        std::fs::write(&path, image_data)
            .with_context(|| format!("Failed to write debug image: {}", path.display()))?;
        debug!("Wrote {} bytes to {}", image_data.len(), path.display());

        if let Some(max_age) = self.retention {
            if let Err(e) = self.cleanup_old_files(max_age) {
                warn!("Debug image cleanup failed: {e:#}");
            }
        }

        Ok(path.to_string_lossy().into_owned())
    }
}
