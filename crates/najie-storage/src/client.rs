use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use najie_core::types::{
    DownloadReceipt, Downloaded, FileList, SignedUrl, UploadProgress, UploadReceipt, Uploaded,
};
use najie_core::{ConfigStore, CosConfig, CosError, Envelope, Result};

use crate::body::{ProgressSender, UploadBody};
use crate::provider::{ConnectionIdentity, Connector, ObjectBackend};

pub const DEFAULT_LIST_LIMIT: usize = 1000;
pub const DEFAULT_URL_EXPIRES_SECS: u64 = 3600;

struct CachedHandle {
    identity: ConnectionIdentity,
    backend: Arc<dyn ObjectBackend>,
}

/// Storage operations against the configured bucket.
///
/// Every public operation returns an [`Envelope`]; nothing here panics or
/// bubbles a `Result` to the caller. Configuration and local-file problems are
/// reported before any connection is built, and each remote call is attempted
/// exactly once.
pub struct ObjectStorageClient {
    store: ConfigStore,
    connector: Arc<dyn Connector>,
    handle: Mutex<Option<CachedHandle>>,
}

impl ObjectStorageClient {
    pub fn new(store: ConfigStore, connector: Arc<dyn Connector>) -> Self {
        Self {
            store,
            connector,
            handle: Mutex::new(None),
        }
    }

    /// Client talking to Tencent COS with the record from `store`.
    #[cfg(feature = "s3")]
    pub fn cos(store: ConfigStore) -> Self {
        Self::new(store, Arc::new(crate::s3::S3Connector::cos()))
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    /// Drop the cached connection so the next operation rebuilds it.
    pub async fn invalidate(&self) {
        self.handle.lock().await.take();
    }

    // ── Public operations ────────────────────────────────────

    /// Check that `config` is complete and its bucket is reachable.
    pub async fn test_connection(&self, config: &CosConfig) -> Envelope<()> {
        self.try_test_connection(config).await.into()
    }

    /// List up to `limit` objects under `prefix`, in service order.
    pub async fn list(&self, prefix: &str, limit: usize) -> Envelope<FileList> {
        self.try_list(prefix, limit).await.into()
    }

    /// Stream `local_path` to `key` (default: the file's base name).
    ///
    /// Progress is sent on `progress`, non-decreasing, reaching 100% on success.
    pub async fn upload(
        &self,
        local_path: &Path,
        key: Option<&str>,
        progress: Option<ProgressSender>,
    ) -> Envelope<Uploaded> {
        self.try_upload(local_path, key, progress).await.into()
    }

    /// Stream `key` into `output_path`, replacing it only once fully received.
    pub async fn download(&self, key: &str, output_path: &Path) -> Envelope<Downloaded> {
        self.try_download(key, output_path).await.into()
    }

    pub async fn delete(&self, key: &str) -> Envelope<()> {
        self.try_delete(key).await.into()
    }

    /// A signed GET URL valid for `expires_in_secs`. Existence is not checked.
    pub async fn signed_url(&self, key: &str, expires_in_secs: u64) -> Envelope<SignedUrl> {
        self.try_signed_url(key, expires_in_secs).await.into()
    }

    // ── Internals ────────────────────────────────────────────

    async fn current_config(&self) -> Result<CosConfig> {
        let config = self.store.require().await?;
        config.ensure_complete()?;
        Ok(config)
    }

    /// Reuse the cached handle when the identity matches, rebuild otherwise.
    async fn backend_for(&self, config: &CosConfig) -> Result<Arc<dyn ObjectBackend>> {
        let identity = ConnectionIdentity::from(config);
        let mut cached = self.handle.lock().await;
        if let Some(handle) = cached.as_ref() {
            if handle.identity == identity {
                return Ok(handle.backend.clone());
            }
        }

        tracing::debug!(region = %identity.region, "building connection handle");
        let backend = self.connector.connect(&identity).await?;
        *cached = Some(CachedHandle {
            identity,
            backend: backend.clone(),
        });
        Ok(backend)
    }

    async fn try_test_connection(&self, config: &CosConfig) -> Result<()> {
        config.ensure_complete()?;
        let backend = self.backend_for(config).await?;
        backend.head_bucket(&config.bucket).await?;
        tracing::info!(bucket = %config.bucket, region = %config.region, "connection OK");
        Ok(())
    }

    async fn try_list(&self, prefix: &str, limit: usize) -> Result<FileList> {
        if limit == 0 {
            return Err(CosError::InvalidArgument("limit must be at least 1".into()));
        }
        let config = self.current_config().await?;
        let backend = self.backend_for(&config).await?;

        let files = backend.list_objects(&config.bucket, prefix, limit).await?;
        tracing::info!(
            bucket = %config.bucket,
            prefix = %prefix,
            count = files.len(),
            "listed objects"
        );
        Ok(FileList { files })
    }

    async fn try_upload(
        &self,
        local_path: &Path,
        key: Option<&str>,
        progress: Option<ProgressSender>,
    ) -> Result<Uploaded> {
        let config = self.current_config().await?;

        match tokio::fs::metadata(local_path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(CosError::LocalFileNotFound(local_path.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CosError::LocalFileNotFound(local_path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        let key = match key.filter(|k| !k.is_empty()) {
            Some(k) => k.to_string(),
            None => default_key(local_path)?,
        };

        let body = UploadBody::open(local_path, progress.clone()).await?;
        let total = body.content_length();
        let backend = self.backend_for(&config).await?;

        let started = Instant::now();
        tracing::info!(
            bucket = %config.bucket,
            key = %key,
            size_bytes = total,
            "upload started"
        );

        let outcome = backend.put_object(&config.bucket, &key, body).await?;

        // An empty body yields no chunks, so no progress was reported yet.
        if total == 0 {
            if let Some(tx) = &progress {
                let _ = tx.send(UploadProgress::new(0, 0));
            }
        }

        tracing::info!(
            bucket = %config.bucket,
            key = %key,
            size_bytes = total,
            etag = %outcome.etag,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upload complete"
        );

        Ok(Uploaded {
            data: UploadReceipt {
                location: outcome.location,
                etag: outcome.etag,
                key,
            },
        })
    }

    async fn try_download(&self, key: &str, output_path: &Path) -> Result<Downloaded> {
        if key.is_empty() {
            return Err(CosError::InvalidArgument("key must not be empty".into()));
        }
        let config = self.current_config().await?;
        let backend = self.backend_for(&config).await?;

        let started = Instant::now();
        let mut chunks = backend.get_object(&config.bucket, key).await?;

        let mut part = PartFile::create(output_path).await?;
        let mut bytes = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            part.file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        part.commit().await?;

        tracing::info!(
            bucket = %config.bucket,
            key = %key,
            output = %output_path.display(),
            size_bytes = bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "download complete"
        );

        Ok(Downloaded {
            data: DownloadReceipt {
                key: key.to_string(),
                output_path: output_path.to_path_buf(),
                bytes,
            },
        })
    }

    async fn try_delete(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CosError::InvalidArgument("key must not be empty".into()));
        }
        let config = self.current_config().await?;
        let backend = self.backend_for(&config).await?;
        backend.delete_object(&config.bucket, key).await?;
        tracing::info!(bucket = %config.bucket, key = %key, "object deleted");
        Ok(())
    }

    async fn try_signed_url(&self, key: &str, expires_in_secs: u64) -> Result<SignedUrl> {
        if key.is_empty() {
            return Err(CosError::InvalidArgument("key must not be empty".into()));
        }
        if expires_in_secs == 0 {
            return Err(CosError::InvalidArgument(
                "expires must be a positive number of seconds".into(),
            ));
        }
        let config = self.current_config().await?;
        let backend = self.backend_for(&config).await?;
        let url = backend
            .presign_get(&config.bucket, key, Duration::from_secs(expires_in_secs))
            .await?;
        tracing::debug!(key = %key, expires_in_secs, "signed url generated");
        Ok(SignedUrl { url })
    }
}

fn default_key(local_path: &Path) -> Result<String> {
    local_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CosError::InvalidArgument(format!(
                "cannot derive an object key from {}",
                local_path.display()
            ))
        })
}

/// Uniquely named sibling file that replaces the target only on [`commit`].
///
/// Removed on drop unless committed, so failures and cancellation never leave
/// a partial file at the target path. Every download gets its own file, so
/// overlapping downloads to one target never share bytes.
///
/// [`commit`]: PartFile::commit
struct PartFile {
    file: tokio::fs::File,
    path: TempPath,
    target: PathBuf,
}

impl PartFile {
    async fn create(target: &Path) -> Result<Self> {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CosError::InvalidArgument(format!("invalid output path: {}", target.display()))
            })?;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (file, path) = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".part")
            .tempfile_in(dir)?
            .into_parts();
        Ok(Self {
            file: tokio::fs::File::from_std(file),
            path,
            target: target.to_path_buf(),
        })
    }

    async fn commit(self) -> Result<()> {
        let Self {
            mut file,
            path,
            target,
        } = self;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        path.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}
