//! Remote file materialization.
//!
//! Downloads a rendered image into a content-addressed directory and
//! registers it as a `File` node in the host store.

use crate::digest::bytes_digest;
use crate::error::CaptureError;
use crate::host::HostContext;
use crate::node::FileNode;
use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_EXTENSION: &str = "png";

/// Fetches a remote URL into the host's file store.
#[async_trait]
pub trait FileMaterializer: Send + Sync {
    async fn materialize(&self, url: &str, host: HostContext<'_>) -> Result<FileNode, CaptureError>;
}

/// What the cache remembers about a previous download.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedDownload {
    etag: Option<String>,
    path: PathBuf,
    digest: String,
    size: u64,
}

/// Downloads with reqwest, reusing the previous file when the server
/// answers `304 Not Modified` to the cached ETag.
pub struct RemoteFileMaterializer {
    client: Client,
    cache_dir: PathBuf,
    owner: Option<String>,
}

impl RemoteFileMaterializer {
    pub fn new(client: Client, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    async fn cached(&self, key: &str, host: &HostContext<'_>) -> Result<Option<CachedDownload>, CaptureError> {
        let Some(value) = host.cache.get(key).await? else {
            return Ok(None);
        };
        let Ok(entry) = serde_json::from_value::<CachedDownload>(value) else {
            return Ok(None);
        };
        if tokio::fs::metadata(&entry.path).await.is_ok() {
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    async fn download(
        &self,
        url: &str,
        mut previous: Option<CachedDownload>,
    ) -> Result<CachedDownload, CaptureError> {
        let materialize_err = |reason: String| CaptureError::Materialize {
            url: url.to_string(),
            reason,
        };

        let mut request = self.client.get(url);
        if let Some(etag) = previous.as_ref().and_then(|p| p.etag.as_deref()) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request
            .send()
            .await
            .map_err(|e| materialize_err(e.to_string()))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            if let Some(previous) = previous.take() {
                debug!(url, path = %previous.path.display(), "Remote file not modified");
                return Ok(previous);
            }
        }

        if !response.status().is_success() {
            return Err(materialize_err(format!("status {}", response.status())));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| materialize_err(e.to_string()))?;

        let digest = bytes_digest(&bytes);
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let path = self
            .cache_dir
            .join(format!("{}.{}", digest, extension_of(url)));
        tokio::fs::write(&path, &bytes).await?;

        if let Some(previous) = previous.filter(|p| p.path != path) {
            remove_stale(&previous.path).await?;
        }

        info!(url, path = %path.display(), size = bytes.len(), "Downloaded remote file");

        Ok(CachedDownload {
            etag,
            path,
            digest,
            size: bytes.len() as u64,
        })
    }
}

#[async_trait]
impl FileMaterializer for RemoteFileMaterializer {
    async fn materialize(&self, url: &str, host: HostContext<'_>) -> Result<FileNode, CaptureError> {
        let key = format!("remote-file:{}", url);
        let previous = self.cached(&key, &host).await?;
        let download = self.download(url, previous).await?;

        let cache_entry = serde_json::to_value(&download)
            .map_err(|e| CaptureError::Digest(e.to_string()))?;
        host.cache.set(&key, cache_entry).await?;

        let file = FileNode::new(
            host.ids.create_node_id(url),
            url.to_string(),
            download.path.to_string_lossy().into_owned(),
            extension_of(url),
            download.size,
            download.digest,
            self.owner.clone(),
        );
        host.store.create_node(file.to_node()?)?;
        Ok(file)
    }
}

/// Drop a file superseded by a newer download of the same URL.
async fn remove_stale(path: &Path) -> Result<(), CaptureError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale remote file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// File extension taken from the URL path, `png` when there is none.
pub fn extension_of(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
