//! Persistent storage for scheduled announcements.
//!
//! The whole pending list lives in one JSON file, rewritten as a complete
//! snapshot on every save.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

use super::model::ScheduledAnnouncement;
use crate::core::clock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("announcement store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("announcement store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct AnnouncementStore {
    path: PathBuf,
}

impl AnnouncementStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load pending announcements as of the current local time.
    pub fn load(&self) -> Vec<ScheduledAnnouncement> {
        self.load_at(clock::now())
    }

    /// Load pending announcements, dropping any whose time has passed.
    ///
    /// Never fails: a missing or unreadable file yields an empty list.
    /// If anything was dropped the cleaned list is written back.
    pub fn load_at(&self, now: NaiveDateTime) -> Vec<ScheduledAnnouncement> {
        if !self.path.exists() {
            log::info!(
                "No announcement file at {}, starting with an empty schedule",
                self.path.display()
            );
            return Vec::new();
        }

        let loaded = match self.read() {
            Ok(list) => list,
            Err(e) => {
                log::error!("Error loading announcements from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        let total = loaded.len();
        let future: Vec<_> = loaded
            .into_iter()
            .filter(|a| a.announcement_time > now)
            .collect();

        let dropped = total - future.len();
        if dropped > 0 {
            log::info!("Dropped {} past announcement(s) on load", dropped);
            if let Err(e) = self.save(&future) {
                log::error!("Error rewriting announcement file: {}", e);
            }
        }

        log::info!("Loaded {} scheduled announcement(s)", future.len());
        future
    }

    fn read(&self) -> Result<Vec<ScheduledAnnouncement>, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the file with `announcements`.
    pub fn save(&self, announcements: &[ScheduledAnnouncement]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec_pretty(announcements)?;
        atomic_write(&self.path, &content)
    }
}

/// Write to a sibling temp file then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, data)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
