use serde::{Deserialize, Serialize};

/// Gateway listener and outbound client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Allow LAN access
    /// - false: local only 127.0.0.1 (default)
    /// - true: listen on 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum accepted request body, in bytes (uploads included)
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,

    /// Outbound proxy for backend and storage calls
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            request_timeout: default_request_timeout(),
            body_limit: default_body_limit(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    3100
}

fn default_request_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    20 * 1024 * 1024
}

impl ProxyConfig {
    /// Get actual listening address
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}
