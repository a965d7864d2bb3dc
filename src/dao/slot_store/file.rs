use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tracing::warn;

use crate::dao::{
    slot_store::MatchStore,
    storage::{StorageError, StorageResult},
};

/// Failures of the file-backed store.
#[derive(Debug, Error)]
pub enum SlotFileError {
    /// The slot file exists but could not be read.
    #[error("failed to read `{path}`")]
    Read {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Writing or replacing the slot file failed.
    #[error("failed to write `{path}`")]
    Write {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document could not be rendered as JSON.
    #[error("failed to serialize document for `{path}`")]
    Serialize {
        /// File involved.
        path: PathBuf,
        /// Underlying encoding failure.
        #[source]
        source: serde_json::Error,
    },
}

impl From<SlotFileError> for StorageError {
    fn from(err: SlotFileError) -> Self {
        StorageError::unavailable("file slot store", err)
    }
}

/// Stores the document as one JSON file named after the storage key.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    path: Arc<PathBuf>,
}

impl FileSlotStore {
    /// Store the document for `key` inside `directory`.
    pub fn new(directory: impl AsRef<Path>, key: &str) -> Self {
        let path = directory.as_ref().join(format!("{}.json", file_stem(key)));
        Self {
            path: Arc::new(path),
        }
    }

    /// Location of the slot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turn a storage key such as `badminton-scoreboard/v1` into a safe file stem.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

async fn ensure_parent(path: &Path) -> Result<(), SlotFileError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| SlotFileError::Write {
                    path: parent.to_path_buf(),
                    source,
                })
        }
        _ => Ok(()),
    }
}

impl MatchStore for FileSlotStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let path = self.path.clone();
        Box::pin(async move {
            let contents = match fs::read_to_string(path.as_path()).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(source) => {
                    return Err(SlotFileError::Read {
                        path: path.to_path_buf(),
                        source,
                    }
                    .into());
                }
            };

            match serde_json::from_str(&contents) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "slot file is not valid JSON; treating it as empty"
                    );
                    Ok(None)
                }
            }
        })
    }

    fn save(&self, document: Value) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        Box::pin(async move {
            let body =
                serde_json::to_vec_pretty(&document).map_err(|source| SlotFileError::Serialize {
                    path: path.to_path_buf(),
                    source,
                })?;
            ensure_parent(&path).await?;

            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, body)
                .await
                .map_err(|source| SlotFileError::Write {
                    path: tmp.clone(),
                    source,
                })?;
            fs::rename(&tmp, path.as_path())
                .await
                .map_err(|source| SlotFileError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        Box::pin(async move { ensure_parent(&path).await.map_err(Into::into) })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "badminton-scoreboard-{name}-{}",
            std::process::id()
        ))
    }

    #[test]
    fn key_becomes_safe_file_name() {
        let store = FileSlotStore::new("/data", "badminton-scoreboard/v1");
        assert_eq!(
            store.path(),
            Path::new("/data/badminton-scoreboard_v1.json")
        );
    }

    #[tokio::test]
    async fn save_replaces_previous_document() {
        let dir = scratch_dir("cycle");
        let store = FileSlotStore::new(&dir, "slot");

        assert!(store.load().await.unwrap().is_none());
        store.save(json!({ "scores": { "A": 2 } })).await.unwrap();
        store.save(json!({ "scores": { "A": 3 } })).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded["scores"]["A"], json!(3));
        assert!(!store.path().with_extension("json.tmp").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn unreadable_json_is_treated_as_empty() {
        let dir = scratch_dir("garbage");
        let store = FileSlotStore::new(&dir, "slot");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(store.load().await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
