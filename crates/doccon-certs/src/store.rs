//! Storage for rendered certificate PDFs.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CertError;

/// Location and size of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub path: String,
    pub size: u64,
}

/// Where rendered PDFs live.
pub trait ArtifactStore: Send + Sync {
    fn save(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<StoredArtifact, CertError>> + Send;

    fn load(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, CertError>> + Send;

    fn remove(&self, path: &str) -> impl Future<Output = Result<(), CertError>> + Send;
}

/// Filesystem store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<StoredArtifact, CertError> {
        // Only the final path component is honoured.
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty file name"))?;

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Stored certificate artifact");
        Ok(StoredArtifact {
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as u64,
        })
    }

    async fn load(&self, path: &str) -> Result<Vec<u8>, CertError> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn remove(&self, path: &str) -> Result<(), CertError> {
        tokio::fs::remove_file(path).await?;
        debug!(path, "Removed certificate artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("doccon-store-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = FsArtifactStore::new(scratch_dir("roundtrip"));
        let saved = store.save("certificate-CERT-1.pdf", b"%PDF-1.5 test").await.unwrap();

        assert_eq!(saved.size, 13);
        assert!(saved.path.ends_with("certificate-CERT-1.pdf"));
        assert_eq!(store.load(&saved.path).await.unwrap(), b"%PDF-1.5 test");

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[tokio::test]
    async fn directory_components_are_stripped() {
        let store = FsArtifactStore::new(scratch_dir("strip"));
        let saved = store.save("../../escape.pdf", b"x").await.unwrap();
        assert_eq!(Path::new(&saved.path).parent(), Some(store.root()));

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_saved_file() {
        let store = FsArtifactStore::new(scratch_dir("remove"));
        let saved = store.save("certificate-CERT-2.pdf", b"x").await.unwrap();

        store.remove(&saved.path).await.unwrap();
        assert!(store.load(&saved.path).await.is_err());

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[tokio::test]
    async fn loading_missing_file_is_storage_error() {
        let store = FsArtifactStore::new(scratch_dir("missing"));
        let err = store.load("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, CertError::Storage(_)));
    }
}
