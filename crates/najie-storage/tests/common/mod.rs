#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use najie_core::types::ObjectRecord;
use najie_core::{ConfigStore, CosConfig, Result};
use najie_storage::provider::{ByteChunks, ConnectionIdentity, Connector, ObjectBackend, PutOutcome};
use najie_storage::{LocalConnector, ObjectStorageClient, UploadBody};

pub const BUCKET: &str = "bucket-1250000000";

/// Per-primitive call counters shared by every handle a connector builds.
#[derive(Debug, Default)]
pub struct Calls {
    pub connect: AtomicUsize,
    pub head: AtomicUsize,
    pub put: AtomicUsize,
    pub get: AtomicUsize,
    pub list: AtomicUsize,
    pub delete: AtomicUsize,
    pub presign: AtomicUsize,
}

impl Calls {
    pub fn connects(&self) -> usize {
        self.connect.load(Ordering::SeqCst)
    }

    /// Calls that would have reached the network.
    pub fn remote(&self) -> usize {
        [&self.head, &self.put, &self.get, &self.list, &self.delete]
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    pub fn presigns(&self) -> usize {
        self.presign.load(Ordering::SeqCst)
    }
}

/// Wraps [`LocalConnector`] and counts what the client asks of it.
pub struct RecordingConnector {
    inner: LocalConnector,
    pub calls: Arc<Calls>,
}

impl RecordingConnector {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalConnector::new(root),
            calls: Arc::new(Calls::default()),
        }
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, identity: &ConnectionIdentity) -> Result<Arc<dyn ObjectBackend>> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.connect(identity).await?;
        Ok(Arc::new(RecordingBackend {
            inner,
            calls: self.calls.clone(),
        }))
    }
}

struct RecordingBackend {
    inner: Arc<dyn ObjectBackend>,
    calls: Arc<Calls>,
}

#[async_trait]
impl ObjectBackend for RecordingBackend {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.calls.head.fetch_add(1, Ordering::SeqCst);
        self.inner.head_bucket(bucket).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: UploadBody) -> Result<PutOutcome> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        self.inner.put_object(bucket, key, body).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteChunks> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(bucket, key).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: usize,
    ) -> Result<Vec<ObjectRecord>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.inner.list_objects(bucket, prefix, max_keys).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_object(bucket, key).await
    }

    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        self.calls.presign.fetch_add(1, Ordering::SeqCst);
        self.inner.presign_get(bucket, key, expires_in).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

pub fn complete_config() -> CosConfig {
    CosConfig::new("AKIDEXAMPLE01", "SK1", BUCKET, "ap-guangzhou")
}

/// A client over a temp directory holding `BUCKET`, plus its call counters.
pub struct Harness {
    pub tmp: TempDir,
    pub client: ObjectStorageClient,
    pub calls: Arc<Calls>,
}

impl Harness {
    /// No config file written yet.
    pub fn unconfigured() -> Self {
        let tmp = TempDir::new().unwrap();
        let data_root = tmp.path().join("store");
        std::fs::create_dir_all(data_root.join(BUCKET)).unwrap();

        let connector = RecordingConnector::new(&data_root);
        let calls = connector.calls.clone();
        let store = ConfigStore::at(tmp.path().join("home/.najie/storage-cos.json"));
        Self {
            client: ObjectStorageClient::new(store, Arc::new(connector)),
            tmp,
            calls,
        }
    }

    pub async fn configured() -> Self {
        let h = Self::unconfigured();
        h.client
            .config_store()
            .write(&complete_config())
            .await
            .unwrap();
        h
    }

    pub fn write_local(&self, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = self.tmp.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    pub async fn put(&self, key: &str, data: &[u8]) {
        let src = self.write_local("seed.bin", data);
        let env = self.client.upload(&src, Some(key), None).await;
        assert!(env.is_ok(), "seed upload failed: {:?}", env.error());
    }
}
