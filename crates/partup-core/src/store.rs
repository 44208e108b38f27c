//! Directory-backed part store.
//!
//! Stands in for a remote storage endpoint: each delivered part is written to
//! `<root>/<file_id>/<part_index>.part` (via a temp file and rename, so a part
//! is either complete or absent). Parts can later be assembled back into the
//! original file. Used by the CLI and by tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::error::TransportError;
use crate::request::PartUploadRequest;
use crate::session::{EndpointId, SessionProvider, UploadSession};

/// Suffix of a stored part file.
pub const PART_SUFFIX: &str = "part";

/// Endpoint id reported by [`LocalProvider`].
pub const LOCAL_ENDPOINT: EndpointId = 1;

/// Stores parts under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_dir(&self, file_id: i64) -> PathBuf {
        self.root.join(file_id.to_string())
    }

    /// Path of part `part_index` of `file_id`.
    pub fn part_path(&self, file_id: i64, part_index: u32) -> PathBuf {
        self.file_dir(file_id)
            .join(format!("{part_index}.{PART_SUFFIX}"))
    }

    /// Write one part, replacing any earlier copy.
    pub async fn put_part(&self, file_id: i64, part_index: u32, bytes: &[u8]) -> std::io::Result<()> {
        let dir = self.file_dir(file_id);
        tokio::fs::create_dir_all(&dir).await?;
        let final_path = self.part_path(file_id, part_index);
        let tmp_path = dir.join(format!("{part_index}.{PART_SUFFIX}.tmp"));
        let mut f = tokio::fs::File::create(&tmp_path).await?;
        f.write_all(bytes).await?;
        f.sync_all().await?;
        drop(f);
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }

    /// Indexes of stored parts for `file_id`, sorted.
    pub async fn stored_parts(&self, file_id: i64) -> std::io::Result<Vec<u32>> {
        let mut parts = Vec::new();
        let mut entries = match tokio::fs::read_dir(self.file_dir(file_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(parts),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(index) = name
                .strip_suffix(&format!(".{PART_SUFFIX}"))
                .and_then(|stem| stem.parse::<u32>().ok())
            {
                parts.push(index);
            }
        }
        parts.sort_unstable();
        Ok(parts)
    }

    /// Parts in `0..total_parts` not yet stored.
    pub async fn missing_parts(&self, file_id: i64, total_parts: u32) -> std::io::Result<Vec<u32>> {
        let stored = self.stored_parts(file_id).await?;
        Ok((0..total_parts)
            .filter(|i| stored.binary_search(i).is_err())
            .collect())
    }

    /// Concatenate parts `0..total_parts` into `out`. Fails if any part is missing.
    pub async fn assemble(&self, file_id: i64, total_parts: u32, out: &Path) -> anyhow::Result<u64> {
        let missing = self.missing_parts(file_id, total_parts).await?;
        if !missing.is_empty() {
            anyhow::bail!("file {file_id} is missing parts {missing:?}");
        }
        let mut dest = tokio::fs::File::create(out).await?;
        let mut written = 0u64;
        for part in 0..total_parts {
            let bytes = tokio::fs::read(self.part_path(file_id, part)).await?;
            dest.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }
        dest.sync_all().await?;
        tracing::info!(file_id, parts = total_parts, bytes = written, out = %out.display(), "assembled file");
        Ok(written)
    }
}

#[async_trait]
impl UploadSession for DirectoryStore {
    async fn invoke(&self, request: PartUploadRequest) -> Result<(), TransportError> {
        self.put_part(request.file_id(), request.part_index(), request.payload())
            .await?;
        Ok(())
    }
}

/// Provider handing out a [`DirectoryStore`] as the media session.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    store: Arc<DirectoryStore>,
}

impl LocalProvider {
    pub fn new(store: DirectoryStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &DirectoryStore {
        &self.store
    }
}

#[async_trait]
impl SessionProvider for LocalProvider {
    async fn home_endpoint(&self) -> Result<EndpointId, TransportError> {
        Ok(LOCAL_ENDPOINT)
    }

    async fn media_session(&self, _endpoint: EndpointId) -> Result<Arc<dyn UploadSession>, TransportError> {
        Ok(self.store.clone())
    }
}
