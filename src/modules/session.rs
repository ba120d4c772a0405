//! Session credential carried in an HTTP-only cookie.
//!
//! The token is issued by the backend at login and is opaque to the gateway,
//! except that a JWT-shaped token's `exp` claim is honoured.

use axum::http::{header, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::SessionConfig;

/// Read cookie `name` from every `Cookie` header on the request
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn cookie_attributes(config: &SessionConfig, max_age: u64) -> String {
    let mut attrs = format!("HttpOnly; Path=/; Max-Age={}; SameSite=Strict", max_age);
    if config.secure {
        attrs.push_str("; Secure");
    }
    attrs
}

/// `Set-Cookie` value that stores `token` as the session credential
pub fn issue_cookie(config: &SessionConfig, token: &str) -> AppResult<HeaderValue> {
    let cookie = format!(
        "{}={}; {}",
        config.cookie_name,
        token,
        cookie_attributes(config, config.max_age_secs)
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Unknown(format!("Token is not a valid cookie value: {}", e)))
}

/// `Set-Cookie` value that removes the session credential
pub fn clear_cookie(config: &SessionConfig) -> AppResult<HeaderValue> {
    let cookie = format!("{}=; {}", config.cookie_name, cookie_attributes(config, 0));
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Config(format!("Invalid session cookie name: {}", e)))
}

/// Expiry embedded in a JWT-shaped token, if any
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}

pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    token_expiry(token).is_some_and(|exp| exp <= now)
}

/// Session credential from the request, treating expired tokens as absent
pub fn credential(headers: &HeaderMap, config: &SessionConfig) -> Option<String> {
    let token = extract_cookie(headers, &config.cookie_name)?;
    if is_expired(&token, Utc::now()) {
        tracing::debug!("Session cookie '{}' carries an expired token", config.cookie_name);
        return None;
    }
    Some(token)
}
