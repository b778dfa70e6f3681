use axum::http::{HeaderMap, HeaderName};

use crate::types::normalize_username;

/// Reads the trusted username from `header`.
/// Returns None when the header is absent, not UTF-8, or blank.
pub fn extract_username(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    let value = headers.get(header)?;
    let raw = std::str::from_utf8(value.as_bytes()).ok()?;
    normalize_username(raw).map(str::to_string)
}
