//! Validated proxy handler.
//!
//! Every row of the endpoint table runs through [`handle`]: resolve path
//! parameters, check the session credential, validate the body, forward once,
//! translate the reply. Failures before the forward never touch the network.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::modules::session;
use crate::proxy::routes::{Credential, Endpoint, ResponseMode};
use crate::proxy::server::AppState;
use crate::proxy::upstream::{UpstreamClient, UpstreamReply, UpstreamRequest};

/// Parts of the client request the engine needs
#[derive(Debug, Default)]
pub struct InboundRequest {
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Run `endpoint` for one request; never fails, errors become JSON responses
pub async fn dispatch(state: &AppState, endpoint: &Endpoint, inbound: InboundRequest) -> Response {
    match handle(state, endpoint, inbound).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("[{}] failed: {}", endpoint.name, e);
            e.into_response()
        }
    }
}

pub async fn handle(
    state: &AppState,
    endpoint: &Endpoint,
    inbound: InboundRequest,
) -> AppResult<Response> {
    // 1. Path parameters and backend location
    let segments = endpoint.render_upstream(&inbound.params).map_err(|param| {
        AppError::Config(format!(
            "{}: missing path parameter '{}'",
            endpoint.name, param
        ))
    })?;
    let backend_url = state
        .config
        .backend
        .url
        .as_deref()
        .ok_or_else(|| AppError::Config("MAIN_BACKEND_URL is not set".to_string()))?;

    // 2. Session credential
    let token = match endpoint.credential {
        Credential::Required => Some(
            session::credential(&inbound.headers, &state.config.session)
                .ok_or(AppError::Unauthorized)?,
        ),
        Credential::Public => None,
    };

    // 3. Request envelope
    let envelope = match endpoint.schema {
        Some(schema) => Some(schema.parse(&inbound.body).map_err(AppError::Validation)?),
        None => None,
    };

    // 4. Upstream request
    let api_key = if endpoint.api_key {
        Some(
            state
                .config
                .backend
                .api_key
                .as_deref()
                .ok_or_else(|| AppError::Config("MAIN_BACKEND_API_KEY is not set".to_string()))?,
        )
    } else {
        None
    };
    let query = endpoint.forwarded_query(&inbound.query);
    let url = UpstreamClient::build_url(backend_url, &segments, &query)?;

    tracing::info!("[{}] {} -> {}", endpoint.name, endpoint.method, url.path());

    // 5. The only network call
    let reply = state
        .upstream
        .send(UpstreamRequest {
            method: endpoint.method.clone(),
            url,
            bearer: token.as_deref(),
            api_key,
            body: envelope.as_ref(),
        })
        .await?;

    // 6-7. Translate
    if !reply.is_success() {
        let message = reply.error_message();
        tracing::warn!(
            "[{}] upstream returned {}: {}",
            endpoint.name,
            reply.status,
            message.as_deref().unwrap_or("<unstructured body>")
        );
        return Err(AppError::Upstream {
            status: reply.status,
            message,
        });
    }

    match endpoint.mode {
        ResponseMode::Relay => Ok(relay(endpoint.success, reply)),
        ResponseMode::IssueSession => issue_session(state, endpoint.success, &reply),
    }
}

/// Upstream body under the endpoint's own success status
fn relay(status: StatusCode, reply: UpstreamReply) -> Response {
    if reply.body.iter().all(u8::is_ascii_whitespace) {
        return (status, Json(json!({}))).into_response();
    }
    if let Some(json) = reply.json() {
        return (status, Json(json)).into_response();
    }

    let content_type = reply
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}

/// Session token from a login reply: `data.token`, or top-level `token`
fn session_token(reply: &UpstreamReply) -> Option<String> {
    let json = reply.json()?;
    json.pointer("/data/token")
        .or_else(|| json.get("token"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn issue_session(state: &AppState, status: StatusCode, reply: &UpstreamReply) -> AppResult<Response> {
    let token = session_token(reply)
        .ok_or_else(|| AppError::Unknown("Login reply carries no token".to_string()))?;
    let cookie = session::issue_cookie(&state.config.session, &token)?;

    tracing::info!("Session issued");

    let mut response = (
        status,
        Json(json!({ "message": "Login successful", "token": token })),
    )
        .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &str, content_type: Option<&str>) -> UpstreamReply {
        UpstreamReply {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn token_lookup() {
        assert_eq!(
            session_token(&reply(r#"{"data":{"token":"T"}}"#, None)).as_deref(),
            Some("T")
        );
        assert_eq!(
            session_token(&reply(r#"{"token":"U"}"#, None)).as_deref(),
            Some("U")
        );
        assert_eq!(session_token(&reply(r#"{"data":{}}"#, None)), None);
        assert_eq!(session_token(&reply(r#"{"data":{"token":""}}"#, None)), None);
    }

    #[tokio::test]
    async fn relay_uses_declared_status() {
        let response = relay(StatusCode::CREATED, reply(r#"{"id":"x"}"#, None));
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"id":"x"}));
    }

    #[tokio::test]
    async fn relay_empty_and_text_bodies() {
        let response = relay(StatusCode::OK, reply("", None));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"{}");

        let response = relay(StatusCode::OK, reply("done", Some("text/plain")));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"done");
    }
}
