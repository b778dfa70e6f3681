use axum::Json;
use axum::extract::rejection::JsonRejection;

use crate::server::response::ApiError;
use crate::types::normalize_username;

const MAX_USERNAME_LEN: usize = 254;
const MAX_TRACK_ID_LEN: usize = 64;
const MAX_COMMENT_LEN: usize = 10_000;

/// Unwraps a JSON body, turning malformed input into a 400 with the API envelope.
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))
}

/// Requires a non-blank value and returns it trimmed.
pub fn require_field<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

pub fn validate_username(name: Option<&str>, message: &str) -> Result<String, ApiError> {
    let name = name
        .and_then(normalize_username)
        .ok_or_else(|| ApiError::bad_request(message))?;
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ApiError::bad_request(
            "Username cannot contain control characters",
        ));
    }
    Ok(name.to_string())
}

pub fn validate_track_id(track_id: Option<&str>, message: &str) -> Result<String, ApiError> {
    let track_id = require_field(track_id, message)?;
    if track_id.len() > MAX_TRACK_ID_LEN {
        return Err(ApiError::bad_request(format!(
            "Track id cannot exceed {MAX_TRACK_ID_LEN} characters"
        )));
    }
    Ok(track_id.to_string())
}

pub fn validate_comment_text(text: Option<&str>, message: &str) -> Result<String, ApiError> {
    let text = require_field(text, message)?;
    if text.len() > MAX_COMMENT_LEN {
        return Err(ApiError::bad_request(format!(
            "Comment cannot exceed {MAX_COMMENT_LEN} bytes"
        )));
    }
    Ok(text.to_string())
}

/// Parses an integer query parameter, treating a blank value as absent.
pub fn parse_optional_int(value: Option<&str>, message: &str) -> Result<Option<i64>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(message)),
        None => Ok(None),
    }
}
