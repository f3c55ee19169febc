//! JSON-file watermark store
//!
//! The document is `{ "last_created_at": "YYYY-MM-DD HH:MM:SS" }`. Commits go
//! through a sibling temp file and a rename, so a crash mid-write leaves the
//! previous cursor in place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::errors::CursorError;
use crate::domain::services::CursorStore;
use crate::domain::watermark::Watermark;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorDocument {
    #[serde(default)]
    last_created_at: Option<String>,
}

/// [`CursorStore`] backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonCursorStore {
    path: PathBuf,
}

impl JsonCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> CursorError {
        CursorError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CursorStore for JsonCursorStore {
    async fn load(&self) -> Result<Watermark, CursorError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No cursor file, starting from epoch");
                return Ok(Watermark::epoch());
            }
            Err(source) => {
                return Err(CursorError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document: CursorDocument =
            serde_json::from_slice(&bytes).map_err(|source| CursorError::Parse {
                path: self.path.clone(),
                source,
            })?;

        match document.last_created_at.as_deref().map(str::trim) {
            None | Some("") => Ok(Watermark::epoch()),
            Some(value) => Watermark::parse(value).map_err(|source| CursorError::InvalidWatermark {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn commit(&self, watermark: &Watermark) -> Result<(), CursorError> {
        let document = CursorDocument {
            last_created_at: Some(watermark.as_str().to_string()),
        };
        let payload = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let written = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&payload).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            // Best effort; the previous cursor is untouched either way
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(self.write_error(e));
        }

        tracing::info!(path = %self.path.display(), watermark = %watermark, "Cursor committed");
        Ok(())
    }
}
