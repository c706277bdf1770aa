use std::path::{Path, PathBuf};

use pkg_constants::paths::MANIFEST_SCRATCH_DIR;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("failed to create scratch dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize manifest {0}: {1}")]
    Serialize(String, #[source] serde_json::Error),
    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes manifests as JSON files into a scratch directory for `kubectl -f`.
#[derive(Debug, Clone)]
pub struct ManifestStager {
    dir: PathBuf,
}

impl Default for ManifestStager {
    fn default() -> Self {
        Self::new(MANIFEST_SCRATCH_DIR)
    }
}

impl ManifestStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize `manifest` to `<logical>-<uuid>.json`.
    ///
    /// The returned handle owns the file: it is removed by [`StagedManifest::unstage`]
    /// or, failing that, when the handle is dropped.
    pub async fn stage<T: Serialize + ?Sized>(
        &self,
        logical: &str,
        manifest: &T,
    ) -> Result<StagedManifest, StagingError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let body = serde_json::to_vec_pretty(manifest)
            .map_err(|e| StagingError::Serialize(logical.to_string(), e))?;
        let path = self
            .dir
            .join(format!("{}-{}.json", logical, uuid::Uuid::new_v4()));
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| StagingError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(StagedManifest { path: Some(path) })
    }
}

/// A manifest file on disk. Removed exactly once.
#[derive(Debug)]
pub struct StagedManifest {
    path: Option<PathBuf>,
}

impl StagedManifest {
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Remove the file now. Removal failures are logged, never returned.
    pub async fn unstage(mut self) {
        if let Some(path) = self.path.take()
            && let Err(e) = tokio::fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove staged manifest {}: {}", path.display(), e);
        }
    }
}

impl Drop for StagedManifest {
    fn drop(&mut self) {
        if let Some(path) = self.path.take()
            && let Err(e) = std::fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove staged manifest {}: {}", path.display(), e);
        }
    }
}
