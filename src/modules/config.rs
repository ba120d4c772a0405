use std::fs;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const CONFIG_FILE: &str = "gateway_config.json";
const DATA_DIR_NAME: &str = "school-gateway";
const DATA_DIR_ENV: &str = "SCHOOL_GATEWAY_DATA_DIR";

/// Get data directory, creating it if needed
pub fn get_data_dir() -> AppResult<PathBuf> {
    let data_dir = match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| AppError::Config("Failed to resolve data directory".to_string()))?
            .join(DATA_DIR_NAME),
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Load application config from the data directory, then apply environment overrides
pub fn load_app_config() -> AppResult<AppConfig> {
    let data_dir = get_data_dir()?;
    let config_path = data_dir.join(CONFIG_FILE);

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Overlay environment variables on top of the file configuration.
///
/// `lookup` is `std::env::var` in production; empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("MAIN_BACKEND_URL") {
        config.backend.url = Some(url.trim().trim_end_matches('/').to_string());
    }
    if let Some(key) = get("MAIN_BACKEND_API_KEY") {
        config.backend.api_key = Some(key);
    }
    if let Some(token) = get("BLOB_READ_WRITE_TOKEN") {
        config.storage.token = Some(token);
    }
    if let Some(url) = get("BLOB_API_URL") {
        config.storage.api_url = url.trim().trim_end_matches('/').to_string();
    }

    if let Some(port) = get("GATEWAY_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.proxy.port = port,
            Err(_) => tracing::warn!("Ignoring invalid GATEWAY_PORT: {}", port),
        }
    }
    if let Some(addr) = get("GATEWAY_BIND") {
        if addr != "127.0.0.1" && addr != "localhost" {
            config.proxy.allow_lan_access = true;
        }
    }
    if let Some(value) = get("GATEWAY_ALLOW_LAN") {
        config.proxy.allow_lan_access = is_truthy(&value);
    }
    if let Some(timeout) = get("GATEWAY_REQUEST_TIMEOUT") {
        match timeout.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.proxy.request_timeout = secs,
            _ => tracing::warn!("Ignoring invalid GATEWAY_REQUEST_TIMEOUT: {}", timeout),
        }
    }
    if let Some(value) = get("SESSION_COOKIE_SECURE") {
        config.session.secure = is_truthy(&value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn backend_settings_come_from_env() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("MAIN_BACKEND_URL", "https://api.example.com/"),
                ("MAIN_BACKEND_API_KEY", "svc-key"),
                ("BLOB_READ_WRITE_TOKEN", "blob-token"),
            ]),
        );
        assert_eq!(config.backend.url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.backend.api_key.as_deref(), Some("svc-key"));
        assert_eq!(config.storage.token.as_deref(), Some("blob-token"));
    }

    #[test]
    fn empty_and_invalid_values_are_ignored() {
        let mut config = AppConfig::default();
        let port = config.proxy.port;
        apply_env_overrides(
            &mut config,
            env(&[("MAIN_BACKEND_URL", "  "), ("GATEWAY_PORT", "not-a-port")]),
        );
        assert!(config.backend.url.is_none());
        assert_eq!(config.proxy.port, port);
    }

    #[test]
    fn network_switches() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("GATEWAY_BIND", "0.0.0.0"),
                ("GATEWAY_PORT", "9100"),
                ("GATEWAY_REQUEST_TIMEOUT", "5"),
                ("SESSION_COOKIE_SECURE", "off"),
            ]),
        );
        assert!(config.proxy.allow_lan_access);
        assert_eq!(config.proxy.get_bind_address(), "0.0.0.0");
        assert_eq!(config.proxy.port, 9100);
        assert_eq!(config.proxy.request_timeout, 5);
        assert!(!config.session.secure);
    }
}
