use crate::proxy::ProxyConfig;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: BlobStorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Main backend the gateway forwards to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL (`MAIN_BACKEND_URL`). Handlers fail with a configuration error while unset.
    #[serde(default)]
    pub url: Option<String>,
    /// Static service key sent as `x-api-key` (`MAIN_BACKEND_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Object storage used by the upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    #[serde(default = "default_blob_api_url")]
    pub api_url: String,
    /// `BLOB_READ_WRITE_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_blob_api_url(),
            token: None,
        }
    }
}

fn default_blob_api_url() -> String {
    "https://blob.vercel-storage.com".to_string()
}

/// Session credential cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
    /// Adds `Secure` to issued cookies; only disable for plain-http local setups
    #[serde(default = "default_secure")]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_secs: default_max_age(),
            secure: default_secure(),
        }
    }
}

fn default_cookie_name() -> String {
    "user_id".to_string()
}

fn default_max_age() -> u64 {
    3600
}

fn default_secure() -> bool {
    true
}
