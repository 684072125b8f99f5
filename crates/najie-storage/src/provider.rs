use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use najie_core::types::ObjectRecord;
use najie_core::{CosConfig, Result};

use crate::body::UploadBody;

/// Streamed object content.
pub type ByteChunks = BoxStream<'static, std::io::Result<Bytes>>;

/// What a successful put reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    pub location: String,
    pub etag: String,
}

/// The bucket-scoped primitives a remote object store must offer.
///
/// Implementations make a single attempt per call and report the service's own
/// error text through `CosError::Remote`.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Lightweight existence check of a bucket.
    async fn head_bucket(&self, bucket: &str) -> Result<()>;

    /// Store `body` under `key`. The object becomes visible only when complete.
    async fn put_object(&self, bucket: &str, key: &str, body: UploadBody) -> Result<PutOutcome>;

    /// Open an object for streaming. Fails before yielding if the key is absent.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteChunks>;

    /// Up to `max_keys` entries under `prefix`, in service order.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: usize,
    ) -> Result<Vec<ObjectRecord>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Sign a time-limited GET URL. Local computation, no request is sent.
    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Credentials and location a connection handle is bound to.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    pub secret_id: String,
    pub secret_key: String,
    pub region: String,
}

impl fmt::Debug for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionIdentity")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

impl From<&CosConfig> for ConnectionIdentity {
    fn from(config: &CosConfig) -> Self {
        Self {
            secret_id: config.secret_id.clone(),
            secret_key: config.secret_key.clone(),
            region: config.region.clone(),
        }
    }
}

/// Builds connection handles. Building must not touch the network.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, identity: &ConnectionIdentity) -> Result<Arc<dyn ObjectBackend>>;
}
