//! Persistence of the reconciliation caches
//!
//! The month cache, rate cache and cached daily readings are stored as
//! pretty-printed JSON so a restart does not re-fetch closed months.

use crate::error::Result;
use crate::history::HistoryState;
use crate::logging::get_logger;
use std::path::{Path, PathBuf};

/// Persistence manager
pub struct PersistenceManager {
    file_path: PathBuf,
    logger: crate::logging::StructuredLogger,
}

impl PersistenceManager {
    /// Create a new persistence manager
    pub fn new<P: Into<PathBuf>>(file_path: P) -> Self {
        Self {
            file_path: file_path.into(),
            logger: get_logger("persistence"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Load state from disk; `None` when no state file exists yet
    pub fn load(&self) -> Result<Option<HistoryState>> {
        if !self.file_path.exists() {
            self.logger
                .info("No persistent state file found, starting with empty history");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let state: HistoryState = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded persistent state from disk: {} cached months",
            state.months.len()
        ));

        Ok(Some(state))
    }

    /// Save state to disk
    pub fn save(&self, state: &HistoryState) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved persistent state to disk");

        Ok(())
    }
}
