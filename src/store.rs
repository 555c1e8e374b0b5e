use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// File-backed set of giveaway ids that have already been announced.
/// Ids are only ever added; the set never shrinks for the lifetime of
/// the file.
pub struct SentStore {
    path: PathBuf,
}

impl SentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted id set. An absent or unparseable file is an
    /// empty set, never an error.
    pub fn load(&self) -> HashSet<u64> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No sent-games file at {}: {}", self.path.display(), e);
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<u64>>(&content) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!(
                    "Ignoring corrupt sent-games file {}: {}",
                    self.path.display(),
                    e
                );
                HashSet::new()
            }
        }
    }

    /// Persist the full id set. Writes a sibling temp file first and
    /// renames it over the target, so a torn write can never leave the
    /// file unparseable.
    pub fn save(&self, ids: &HashSet<u64>) -> Result<()> {
        let list: Vec<u64> = ids.iter().copied().collect();
        let content =
            serde_json::to_string(&list).context("Failed to serialize sent-games list")?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
