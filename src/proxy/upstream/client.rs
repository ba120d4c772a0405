// Upstream client for the main backend

use bytes::Bytes;
use reqwest::{header, Client, Method};
use serde_json::Value;
use tokio::time::Duration;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::proxy::config::UpstreamProxyConfig;

const USER_AGENT: &str = concat!("school-gateway/", env!("CARGO_PKG_VERSION"));

/// One forwarded call
pub struct UpstreamRequest<'a> {
    pub method: Method,
    pub url: Url,
    /// Session credential, sent as `Authorization: Bearer`
    pub bearer: Option<&'a str>,
    /// Static service key, sent as `x-api-key`
    pub api_key: Option<&'a str>,
    pub body: Option<&'a Value>,
}

/// Buffered upstream response
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Structured failure message: `message`, `error`, or `error.message`
    pub fn error_message(&self) -> Option<String> {
        let json = self.json()?;
        let message = json
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| json.get("error").and_then(Value::as_str))
            .or_else(|| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
            })?;
        let message = message.trim();
        (!message.is_empty()).then(|| message.to_string())
    }
}

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(timeout_secs: u64, proxy_config: Option<UpstreamProxyConfig>) -> AppResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(USER_AGENT);

        if let Some(config) = proxy_config {
            if config.enabled && !config.url.is_empty() {
                match reqwest::Proxy::all(&config.url) {
                    Ok(proxy) => {
                        builder = builder.proxy(proxy);
                        tracing::info!("UpstreamClient enabled proxy: {}", config.url);
                    }
                    Err(e) => {
                        tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                    }
                }
            }
        }

        let http_client = builder.build()?;
        Ok(Self { http_client })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    /// Join `segments` onto `base` (percent-encoding each one) and append `query`
    pub fn build_url(base: &str, segments: &[String], query: &[(String, String)]) -> AppResult<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| AppError::Config(format!("Invalid backend URL '{}': {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Backend URL '{}' cannot be a base", base)))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Issue the call and buffer the reply. Non-2xx statuses are returned, not raised.
    pub async fn send(&self, request: UpstreamRequest<'_>) -> AppResult<UpstreamReply> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = request.bearer {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| AppError::Unauthorized)?,
            );
        }
        if let Some(key) = request.api_key {
            headers.insert(
                "x-api-key",
                header::HeaderValue::from_str(key)
                    .map_err(|e| AppError::Config(format!("Invalid backend API key: {}", e)))?,
            );
        }

        tracing::debug!("Upstream {} {}", request.method, request.url);

        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
