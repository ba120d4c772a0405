// Object storage client for uploaded files

use bytes::Bytes;
use reqwest::{header, Client};
use serde_json::Value;

use super::client::{UpstreamClient, UpstreamReply};
use crate::error::{AppError, AppResult};
use crate::models::BlobStorageConfig;

const MAX_FILENAME_LEN: usize = 100;

/// Write-only handle on the blob provider, borrowed per upload
pub struct BlobStore<'a> {
    http: &'a Client,
    api_url: &'a str,
    token: &'a str,
}

impl<'a> BlobStore<'a> {
    pub fn new(upstream: &'a UpstreamClient, config: &'a BlobStorageConfig) -> AppResult<Self> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Config("BLOB_READ_WRITE_TOKEN is not set".to_string()))?;
        Ok(Self {
            http: upstream.http(),
            api_url: config.api_url.as_str(),
            token,
        })
    }

    /// `<millis>-<filename>` with the filename reduced to `[A-Za-z0-9._-]`
    pub fn object_key(filename: &str, now_millis: i64) -> String {
        let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
        let mut clean: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '-'
                }
            })
            .take(MAX_FILENAME_LEN)
            .collect();
        clean = clean.trim_matches(|c| c == '.' || c == '-').to_string();
        if clean.is_empty() {
            clean = "upload".to_string();
        }
        format!("{}-{}", now_millis, clean)
    }

    /// Store `data` under `key` and return its public URL
    pub async fn put(&self, key: &str, content_type: Option<&str>, data: Bytes) -> AppResult<String> {
        let url = UpstreamClient::build_url(self.api_url, &[key.to_string()], &[])?;
        let content_type = content_type.unwrap_or("application/octet-stream");

        tracing::debug!("Blob PUT {} ({} bytes)", url, data.len());

        let response = self
            .http
            .put(url)
            .bearer_auth(self.token)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-content-type", content_type)
            .body(data)
            .send()
            .await?;

        let reply = UpstreamReply {
            status: response.status().as_u16(),
            content_type: None,
            body: response.bytes().await?,
        };

        if !reply.is_success() {
            return Err(AppError::Upstream {
                status: reply.status,
                message: reply.error_message(),
            });
        }

        reply
            .json()
            .and_then(|json| json.get("url").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| AppError::Unknown("Blob provider response has no url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_timestamp_prefixed() {
        assert_eq!(
            BlobStore::object_key("report card.pdf", 1_700_000_000_000),
            "1700000000000-report-card.pdf"
        );
    }

    #[test]
    fn object_key_drops_directories_and_junk() {
        assert_eq!(BlobStore::object_key("../../etc/passwd", 1), "1-passwd");
        assert_eq!(BlobStore::object_key("C:\\photos\\me.png", 2), "2-me.png");
        assert_eq!(BlobStore::object_key("...", 3), "3-upload");
        assert_eq!(BlobStore::object_key("", 4), "4-upload");
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let upstream = UpstreamClient::new(5, None).unwrap();
        let config = BlobStorageConfig::default();
        assert!(matches!(
            BlobStore::new(&upstream, &config),
            Err(AppError::Config(_))
        ));
    }
}
