//! [`StateStore`] implementation backed by a JSON file.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt as _;
use tracing::debug;
use watering_app::ports::{LoadedState, StateStore};
use watering_domain::error::{StateLoadError, StateSaveError};
use watering_domain::state::StateMap;

use crate::error::JsonStoreError;

/// Pot state persisted as a pretty-printed JSON object keyed by pot id.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the new state is written to before being renamed over
    /// [`path`](Self::path).
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("state"), ToOwned::to_owned);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read(&self) -> Result<LoadedState, JsonStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LoadedState::Missing),
            Err(err) => return Err(JsonStoreError::io(&self.path, err)),
        };
        let states = serde_json::from_slice(&bytes).map_err(|source| JsonStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(LoadedState::Restored(states))
    }

    async fn write(&self, states: &StateMap) -> Result<(), JsonStoreError> {
        let mut json = serde_json::to_vec_pretty(states).map_err(|source| JsonStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        json.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| JsonStoreError::io(parent, err))?;
        }

        let temp = self.temp_path();
        write_synced(&temp, &json)
            .await
            .map_err(|err| JsonStoreError::io(&temp, err))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|err| JsonStoreError::io(&self.path, err))
    }
}

/// Write `bytes` to a fresh `path` and flush them to the device, so the
/// rename that follows never exposes an empty file after a power cut.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<LoadedState, StateLoadError> {
        debug!(path = %self.path.display(), "loading pot state");
        Ok(self.read().await?)
    }

    async fn save(&self, states: &StateMap) -> Result<(), StateSaveError> {
        debug!(path = %self.path.display(), pots = states.len(), "saving pot state");
        Ok(self.write(states).await?)
    }
}
