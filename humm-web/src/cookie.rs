//! Session values carried in a cookie
//!
//! The cookie holds the session map as JSON, encoded with URL-safe base64.
//! Unreadable cookies start an empty session.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use humm::MemorySession;
use tracing::debug;

pub const SESSION_COOKIE: &str = "humm_session";

pub fn encode_session(values: &BTreeMap<String, String>) -> String {
    // A map of strings always serializes
    let json = serde_json::to_vec(values).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode_session(value: &str) -> Option<BTreeMap<String, String>> {
    let json = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
    serde_json::from_slice(&json).ok()
}

/// Session found in a `Cookie` header
pub fn session_from_header(header: Option<&str>) -> MemorySession {
    let Some(header) = header else {
        return MemorySession::new();
    };

    let cookie = header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE);

    match cookie.map(|(_, value)| decode_session(value)) {
        Some(Some(values)) => MemorySession(values),
        Some(None) => {
            debug!("Ignoring an unreadable session cookie");
            MemorySession::new()
        }
        None => MemorySession::new(),
    }
}

/// `Set-Cookie` value storing `values`
pub fn set_cookie_header(values: &BTreeMap<String, String>) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        encode_session(values)
    )
}
