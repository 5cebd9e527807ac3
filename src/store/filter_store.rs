use std::path::{Path, PathBuf};

use crate::{error::AppResult, models::FilterSelection};

/// Persists the last applied filter selection between runs
///
/// Stored as a small JSON document. A missing file means "no filter".
#[derive(Debug, Clone)]
pub struct FilterStore {
    path: PathBuf,
}

impl FilterStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> AppResult<FilterSelection> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => {
                let selection = serde_json::from_str(&json)?;
                tracing::debug!(path = %self.path.display(), "Restored filter selection");
                Ok(selection)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FilterSelection::none()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves half a document
    pub async fn save(&self, selection: &FilterSelection) -> AppResult<()> {
        let json = serde_json::to_string_pretty(selection)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Saved filter selection");
        Ok(())
    }
}
