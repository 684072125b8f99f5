//! Core model of the COS storage client: the credential record and its
//! on-disk store, secret masking at the trust boundary, and the uniform
//! result envelope returned to the CLI and HTTP surfaces.

pub mod config;
pub mod envelope;
pub mod error;
pub mod types;

pub use config::masking::{ConfigUpdate, MASK_TOKEN, MaskedConfig};
pub use config::{ConfigStore, CosConfig};
pub use envelope::Envelope;
pub use error::{CosError, Result};
