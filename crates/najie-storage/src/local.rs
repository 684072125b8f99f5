use std::io::{ErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use md5::{Digest, Md5};
use sha2::Sha256;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use najie_core::types::ObjectRecord;
use najie_core::{CosError, Result};

use crate::body::{UPLOAD_CHUNK_SIZE, UploadBody};
use crate::provider::{ByteChunks, ConnectionIdentity, Connector, ObjectBackend, PutOutcome};

/// Staging directory for in-flight puts. Bucket names cannot start with a dot.
const STAGING_DIR: &str = ".uploads";

/// Filesystem-backed object store: `<root>/<bucket>/<key>`.
///
/// Mirrors the remote service's semantics closely enough for offline use and
/// tests: error codes, idempotent delete, atomic puts, sorted listings.
#[derive(Debug, Clone)]
pub struct LocalConnector {
    root: PathBuf,
}

impl LocalConnector {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, identity: &ConnectionIdentity) -> Result<Arc<dyn ObjectBackend>> {
        Ok(Arc::new(LocalBackend {
            root: self.root.clone(),
            signing_key: identity.secret_key.clone(),
            name: format!("local:{}", self.root.display()),
        }))
    }
}

pub struct LocalBackend {
    root: PathBuf,
    signing_key: String,
    name: String,
}

impl LocalBackend {
    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
            return Err(CosError::Remote(format!("InvalidBucketName: {bucket}")));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let valid = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(CosError::Remote(format!("InvalidKey: {key}")));
        }
        Ok(self.bucket_path(bucket)?.join(rel))
    }

    async fn require_bucket(&self, bucket: &str) -> Result<PathBuf> {
        let path = self.bucket_path(bucket)?;
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_dir() => Ok(path),
            _ => Err(CosError::Remote(
                "NoSuchBucket: The specified bucket does not exist.".into(),
            )),
        }
    }

    fn signature(&self, bucket: &str, key: &str, expires_at: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_key.as_bytes());
        hasher.update(b"\n");
        hasher.update(format!("{bucket}/{key}\n{expires_at}").as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn file_etag(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

fn walk(bucket_root: &Path, dir: &Path, out: &mut Vec<ObjectRecord>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let meta = entry.metadata()?;
        if meta.is_dir() {
            walk(bucket_root, &path, out)?;
            continue;
        }
        let Ok(rel) = path.strip_prefix(bucket_root) else {
            continue;
        };
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push(ObjectRecord {
            key,
            size: meta.len(),
            last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
            etag: file_etag(&path)?,
        });
    }
    Ok(())
}

#[async_trait]
impl ObjectBackend for LocalBackend {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.require_bucket(bucket).await.map(|_| ())
    }

    async fn put_object(&self, bucket: &str, key: &str, mut body: UploadBody) -> Result<PutOutcome> {
        self.require_bucket(bucket).await?;
        let target = self.object_path(bucket, key)?;

        // The staged file is removed on drop, so a failed or cancelled put
        // leaves nothing under the staging directory.
        let staging = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging).await?;
        let (file, part) = tempfile::NamedTempFile::new_in(&staging)?.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut hasher = Md5::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        part.persist(&target).map_err(|e| e.error)?;

        Ok(PutOutcome {
            location: format!("file://{}", target.display()),
            etag: format!("\"{}\"", hex::encode(hasher.finalize())),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteChunks> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CosError::Remote(
                    "NoSuchKey: The specified key does not exist.".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let chunks = futures::stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);
            Ok::<_, std::io::Error>(Some((bytes::Bytes::from(buf), file)))
        });
        Ok(Box::pin(chunks))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: usize,
    ) -> Result<Vec<ObjectRecord>> {
        let bucket_root = self.require_bucket(bucket).await?;
        let prefix = prefix.to_string();

        let listed = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<ObjectRecord>> {
            let mut all = Vec::new();
            walk(&bucket_root, &bucket_root, &mut all)?;
            all.retain(|o| o.key.starts_with(&prefix));
            all.sort_by(|a, b| a.key.cmp(&b.key));
            all.truncate(max_keys);
            Ok(all)
        })
        .await
        .map_err(|e| CosError::Remote(format!("listing task failed: {e}")))??;

        Ok(listed)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Like S3: deleting an absent key succeeds.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        let path = self.object_path(bucket, key)?;
        let secs = i64::try_from(expires_in.as_secs())
            .map_err(|_| CosError::InvalidArgument("expiry too large".into()))?;
        let expires_at = chrono::Utc::now().timestamp() + secs;
        let signature = self.signature(bucket, key, expires_at);
        Ok(format!(
            "file://{}?expires={expires_at}&signature={signature}",
            path.display()
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::TempDir;

    async fn backend(tmp: &TempDir) -> Arc<dyn ObjectBackend> {
        std::fs::create_dir_all(tmp.path().join("bucket")).unwrap();
        LocalConnector::new(tmp.path())
            .connect(&ConnectionIdentity {
                secret_id: "AK1".into(),
                secret_key: "SK1".into(),
                region: "local".into(),
            })
            .await
            .unwrap()
    }

    async fn put(backend: &Arc<dyn ObjectBackend>, tmp: &TempDir, key: &str, data: &[u8]) {
        let src = tmp.path().join("src.bin");
        std::fs::write(&src, data).unwrap();
        let body = UploadBody::open(&src, None).await.unwrap();
        backend.put_object("bucket", key, body).await.unwrap();
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;

        put(&backend, &tmp, "docs/a.txt", b"hello world").await;
        let chunks: Vec<bytes::Bytes> = backend
            .get_object("bucket", "docs/a.txt")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"hello world");

        backend.delete_object("bucket", "docs/a.txt").await.unwrap();
        assert!(backend.get_object("bucket", "docs/a.txt").await.is_err());
        // second delete is still fine
        backend.delete_object("bucket", "docs/a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn etag_is_quoted_md5() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        put(&backend, &tmp, "a.txt", b"hello world").await;
        let listed = backend.list_objects("bucket", "", 10).await.unwrap();
        assert_eq!(listed[0].etag, "\"5eb63bbbe01eeed093cb22bb8f5acdc3\"");
    }

    #[tokio::test]
    async fn listing_is_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        for key in ["b.txt", "a/2.txt", "a/1.txt", "c.txt"] {
            put(&backend, &tmp, key, key.as_bytes()).await;
        }
        let keys: Vec<String> = backend
            .list_objects("bucket", "", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, ["a/1.txt", "a/2.txt", "b.txt", "c.txt"]);

        let under_a = backend.list_objects("bucket", "a/", 1).await.unwrap();
        assert_eq!(under_a.len(), 1);
        assert_eq!(under_a[0].key, "a/1.txt");
    }

    #[tokio::test]
    async fn missing_bucket_and_key_use_service_codes() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        let err = backend.head_bucket("nope").await.unwrap_err();
        assert!(err.to_string().starts_with("NoSuchBucket"));
        let err = match backend.get_object("bucket", "missing.txt").await {
            Err(e) => e,
            Ok(_) => panic!("expected NoSuchKey"),
        };
        assert!(err.to_string().starts_with("NoSuchKey"));
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        assert!(backend.delete_object("bucket", "../outside").await.is_err());
    }

    #[tokio::test]
    async fn presign_embeds_expiry_and_signature() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        let before = chrono::Utc::now().timestamp();
        let url = backend
            .presign_get("bucket", "a.txt", Duration::from_secs(3600))
            .await
            .unwrap();
        let expires: i64 = url
            .split("expires=")
            .nth(1)
            .and_then(|s| s.split('&').next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(expires >= before + 3600 && expires <= before + 3601 + 5);
        assert!(url.contains("a.txt"));
        assert!(url.contains("signature="));
    }

    #[tokio::test]
    async fn cancelled_put_leaves_no_staged_file() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp).await;
        let src = tmp.path().join("big.bin");
        std::fs::write(&src, vec![9u8; UPLOAD_CHUNK_SIZE * 64]).unwrap();
        let staging = tmp.path().join(STAGING_DIR);
        let staged = || {
            std::fs::read_dir(&staging)
                .map(|entries| entries.count())
                .unwrap_or(0)
        };

        let body = UploadBody::open(&src, None).await.unwrap();
        let mut put = backend.put_object("bucket", "big.bin", body);
        let mut saw_staged = false;
        for _ in 0..10_000 {
            if futures::poll!(&mut put).is_ready() {
                break;
            }
            if staged() > 0 {
                saw_staged = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(saw_staged, "put finished before a staged file was observed");

        drop(put);
        assert_eq!(staged(), 0);
        assert!(!tmp.path().join("bucket/big.bin").exists());
    }
}
