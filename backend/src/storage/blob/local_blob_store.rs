use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::storage::traits::BlobStorage;

/// Stores uploaded files in a local directory that is served over HTTP
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new<P: AsRef<Path>>(root: P, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_plain_file_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStore {
    async fn upload(&self, name: &str, bytes: &[u8], content_type: Option<&str>) -> Result<String> {
        if !Self::is_plain_file_name(name) {
            bail!("Invalid upload name: '{}'", name);
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload directory {}", self.root.display()))?;

        let path = self.root.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            "Stored upload {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            content_type.unwrap_or("unknown type")
        );
        Ok(format!("{}/{}", self.public_base_url, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads"), "http://localhost:3000/uploads/");

        let url = store
            .upload("1718454600000-abcd1234.png", b"png-bytes", Some("image/png"))
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/uploads/1718454600000-abcd1234.png");
        let written = std::fs::read(store.root().join("1718454600000-abcd1234.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost/uploads");

        assert!(store.upload("../escape.png", b"x", None).await.is_err());
        assert!(store.upload("", b"x", None).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let store = LocalBlobStore::new(&blocker, "http://localhost/uploads");

        assert!(store.upload("a.png", b"x", None).await.is_err());
    }
}
