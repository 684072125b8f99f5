//! Secret masking at the edges where configuration leaves or enters the process.
//!
//! Outward, `secretKey` becomes [`MASK_TOKEN`] and `secretId` keeps a short
//! prefix. Inward, a value equal to its masked form means "unchanged" and is
//! swapped back for the stored secret before anything else looks at it.

use serde::{Deserialize, Serialize};

use super::CosConfig;

/// Placeholder shown in place of a stored secret key.
pub const MASK_TOKEN: &str = "********";

const SECRET_ID_VISIBLE_CHARS: usize = 8;
const SECRET_ID_MASK_SUFFIX: &str = "****";

/// Marker rendered for empty fields by human-facing output.
pub const NOT_CONFIGURED: &str = "(not configured)";

/// `AKIDxxxxxxxx…` → `AKIDxxxx****`. Empty stays `None`.
pub fn mask_secret_id(secret_id: &str) -> Option<String> {
    if secret_id.is_empty() {
        return None;
    }
    let prefix: String = secret_id.chars().take(SECRET_ID_VISIBLE_CHARS).collect();
    Some(format!("{prefix}{SECRET_ID_MASK_SUFFIX}"))
}

pub fn mask_secret_key(secret_key: &str) -> Option<String> {
    (!secret_key.is_empty()).then(|| MASK_TOKEN.to_string())
}

/// Configuration as it may be shown to a user or returned over the API.
/// `None` means the field is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedConfig {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
}

impl From<&CosConfig> for MaskedConfig {
    fn from(config: &CosConfig) -> Self {
        let verbatim = |v: &str| (!v.is_empty()).then(|| v.to_string());
        Self {
            secret_id: mask_secret_id(&config.secret_id),
            secret_key: mask_secret_key(&config.secret_key),
            bucket: verbatim(&config.bucket),
            region: verbatim(&config.region),
        }
    }
}

impl MaskedConfig {
    /// Human-readable lines, one per field.
    pub fn display_lines(&self) -> Vec<(&'static str, &str)> {
        fn show(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or(NOT_CONFIGURED)
        }
        vec![
            ("SecretId", show(&self.secret_id)),
            ("SecretKey", show(&self.secret_key)),
            ("Bucket", show(&self.bucket)),
            ("Region", show(&self.region)),
        ]
    }
}

/// A possibly-partial configuration arriving from a caller.
///
/// `None` fields keep the stored value. Masked sentinels are recognised by
/// [`resolve`](Self::resolve) and never persisted literally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
}

impl ConfigUpdate {
    /// Substitute sentinels with the stored secrets, then merge field-wise
    /// over `previous`.
    ///
    /// With no previous record a sentinel resolves to an empty secret.
    pub fn resolve(self, previous: Option<&CosConfig>) -> CosConfig {
        let prior = previous.cloned().unwrap_or_default();

        let secret_key = match self.secret_key {
            Some(v) if v == MASK_TOKEN => prior.secret_key.clone(),
            Some(v) => v,
            None => prior.secret_key.clone(),
        };

        let secret_id = match self.secret_id {
            Some(v) if is_masked_secret_id(&v, &prior.secret_id) => prior.secret_id.clone(),
            Some(v) => v,
            None => prior.secret_id.clone(),
        };

        CosConfig {
            secret_id,
            secret_key,
            bucket: self.bucket.unwrap_or(prior.bucket),
            region: self.region.unwrap_or(prior.region),
        }
    }
}

impl From<CosConfig> for ConfigUpdate {
    fn from(config: CosConfig) -> Self {
        Self {
            secret_id: Some(config.secret_id),
            secret_key: Some(config.secret_key),
            bucket: Some(config.bucket),
            region: Some(config.region),
        }
    }
}

fn is_masked_secret_id(incoming: &str, stored: &str) -> bool {
    if incoming.is_empty() || stored.is_empty() {
        return false;
    }
    incoming != stored && mask_secret_id(stored).as_deref() == Some(incoming)
}
