use najie_storage::ObjectStorageClient;
use serde::{Deserialize, Serialize};

pub struct AppState {
    pub client: ObjectStorageClient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_addr")]
    pub listen_addr: String,
}

fn default_web_addr() -> String {
    "127.0.0.1:5175".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_web_addr(),
        }
    }
}
