//! Object-storage operations for the COS client.
//!
//! [`ObjectStorageClient`](client::ObjectStorageClient) turns storage intents
//! into calls on an [`ObjectBackend`](provider::ObjectBackend) and normalizes
//! every outcome into an [`Envelope`](najie_core::Envelope).

pub mod body;
pub mod client;
pub mod local;
pub mod provider;
pub mod s3;

pub use body::{ProgressSender, UploadBody, progress_channel};
pub use client::{DEFAULT_LIST_LIMIT, DEFAULT_URL_EXPIRES_SECS, ObjectStorageClient};
pub use local::LocalConnector;
pub use provider::{ByteChunks, ConnectionIdentity, Connector, ObjectBackend, PutOutcome};
#[cfg(feature = "s3")]
pub use s3::S3Connector;
