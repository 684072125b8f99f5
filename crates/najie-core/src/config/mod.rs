pub mod masking;

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::{CosError, Result};

/// Directory under the user's home that holds all najie sub-application state.
pub const NAMESPACE_DIR: &str = ".najie";
/// File name of the COS credential record inside [`NAMESPACE_DIR`].
pub const CONFIG_FILE_NAME: &str = "storage-cos.json";

/// The single credential/configuration record, stored as JSON.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CosConfig {
    pub secret_id: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl fmt::Debug for CosConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosConfig")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

impl CosConfig {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Names (as persisted) of the fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("secretId", &self.secret_id),
            ("secretKey", &self.secret_key),
            ("bucket", &self.bucket),
            ("region", &self.region),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn ensure_complete(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CosError::IncompleteConfig { missing })
        }
    }
}

/// Reads and writes the credential record at a fixed, user-scoped path.
///
/// There is no in-process locking: concurrent saves race and the last writer
/// wins. Configuration edits are rare and human-driven.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at `~/.najie/storage-cos.json`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::at(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(NAMESPACE_DIR).join(CONFIG_FILE_NAME))
            .ok_or_else(|| CosError::Persistence("Cannot determine home directory".to_string()))
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. A missing file is `Ok(None)`, not an error.
    pub async fn read(&self) -> Result<Option<CosConfig>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file yet");
                return Ok(None);
            }
            Err(e) => return Err(CosError::Persistence(e.to_string())),
        };
        let config = serde_json::from_str(&content)?;
        Ok(Some(config))
    }

    /// Replace the on-disk record with `config`. Callers merge beforehand.
    pub async fn write(&self, config: &CosConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CosError::Persistence(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| CosError::Persistence(e.to_string()))?;
        tracing::info!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Like [`read`](Self::read) but requires a record to exist.
    pub async fn require(&self) -> Result<CosConfig> {
        self.read().await?.ok_or(CosError::ConfigNotFound)
    }

    pub async fn load(&self) -> Envelope<Option<CosConfig>> {
        self.read().await.into()
    }

    pub async fn save(&self, config: &CosConfig) -> Envelope<()> {
        self.write(config).await.into()
    }
}
