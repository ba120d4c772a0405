// Session endpoints that never reach the backend
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::modules::session;
use crate::proxy::server::AppState;

#[derive(Debug, Serialize)]
struct SessionStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

/// Clear the session cookie. Succeeds whether or not a session existed.
pub async fn handle_logout(State(state): State<AppState>) -> Response {
    let cookie = match session::clear_cookie(&state.config.session) {
        Ok(cookie) => cookie,
        Err(e) => return e.into_response(),
    };

    tracing::info!("Session cleared");

    let mut response = (
        StatusCode::OK,
        Json(json!({ "message": "Logout successful" })),
    )
        .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    response
}

/// Report whether the request carries a live session credential
pub async fn handle_session_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let status = match session::credential(&headers, &state.config.session) {
        Some(token) => SessionStatus {
            authenticated: true,
            expires_at: session::token_expiry(&token).map(|exp| exp.to_rfc3339()),
        },
        None => SessionStatus {
            authenticated: false,
            expires_at: None,
        },
    };
    Json(status).into_response()
}

/// Fallback for unknown routes so clients always get a JSON body
pub async fn handle_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
