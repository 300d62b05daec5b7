use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_RAW_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            429 => Self::RateLimited,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_response(status: u16, body: &str) -> Self {
        Self::new(
            ErrorCode::from_status(status),
            extract_error_message(status, body),
        )
    }
}

/// Pulls a human-readable message out of a backend error body.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = message_from_json(&value) {
            return message;
        }
    } else if !trimmed.is_empty() && !trimmed.starts_with('<') {
        return trimmed.chars().take(MAX_RAW_BODY_CHARS).collect();
    }
    format!("request failed with status {status}")
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(message_from_json),
        Value::Object(map) => {
            for key in ["detail", "message", "error", "non_field_errors"] {
                if let Some(found) = map.get(key).and_then(message_from_json) {
                    return Some(found);
                }
            }
            map.iter().find_map(|(field, errors)| {
                message_from_json(errors).map(|message| format!("{field}: {message}"))
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_detail_over_other_keys() {
        let body = r#"{"message": "secondary", "detail": "Not found."}"#;
        assert_eq!(extract_error_message(404, body), "Not found.");
    }

    #[test]
    fn reads_first_non_field_error() {
        let body = r#"{"non_field_errors": ["dataset is still importing", "other"]}"#;
        assert_eq!(extract_error_message(400, body), "dataset is still importing");
    }

    #[test]
    fn falls_back_to_field_errors() {
        let body = r#"{"name": ["This field is required."]}"#;
        assert_eq!(
            extract_error_message(400, body),
            "name: This field is required."
        );
    }

    #[test]
    fn uses_plain_text_body_and_status_for_html() {
        assert_eq!(extract_error_message(500, "boom"), "boom");
        assert_eq!(
            extract_error_message(502, "<html>bad gateway</html>"),
            "request failed with status 502"
        );
        assert_eq!(extract_error_message(503, ""), "request failed with status 503");
    }

    #[test]
    fn classifies_status_codes() {
        let error = ApiError::from_response(403, r#"{"detail": "nope"}"#);
        assert_eq!(error.code, ErrorCode::Forbidden);
        assert_eq!(error.message, "nope");
        assert_eq!(ErrorCode::from_status(418), ErrorCode::Internal);
    }
}
