//! Error message extraction for collaborator responses.

use serde_json::Value;

/// Field names probed for a human-readable message, in priority order.
const MESSAGE_FIELDS: [&str; 3] = ["detail", "error", "message"];

/// Extracts a human-readable message from a non-success response body.
///
/// Probes `detail`, `error` and `message` in that order. Structured values
/// (such as the store's `{"error": {"reason": ...}}`) use their `reason`
/// when present. Any other body yields its trimmed text, and an empty body
/// yields `HTTP status N`.
pub fn extract_message(body: &str, status: u16) -> String {
    let raw = body.trim();
    if raw.is_empty() {
        return format!("HTTP status {status}");
    }

    let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };

    MESSAGE_FIELDS
        .iter()
        .find_map(|field| parsed.get(field).and_then(message_from_value))
        .unwrap_or_else(|| raw.to_string())
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(obj) => Some(
            obj.get("reason")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| value.to_string()),
        ),
        Value::Array(items) if !items.is_empty() => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_wins_over_error_and_message() {
        let body = r#"{"message": "m", "error": "e", "detail": "d"}"#;
        assert_eq!(extract_message(body, 400), "d");
    }

    #[test]
    fn test_error_before_message() {
        let body = r#"{"message": "m", "error": "e"}"#;
        assert_eq!(extract_message(body, 400), "e");
    }

    #[test]
    fn test_message_field() {
        assert_eq!(extract_message(r#"{"message": "bad key"}"#, 401), "bad key");
    }

    #[test]
    fn test_structured_store_error_uses_reason() {
        let body = r#"{"error": {"type": "index_not_found_exception", "reason": "no such index [x]"}, "status": 404}"#;
        assert_eq!(extract_message(body, 404), "no such index [x]");
    }

    #[test]
    fn test_structured_error_without_reason() {
        let body = r#"{"error": {"type": "boom"}}"#;
        assert_eq!(extract_message(body, 500), r#"{"type":"boom"}"#);
    }

    #[test]
    fn test_json_without_known_fields_falls_back_to_body() {
        let body = r#"{"status": 503}"#;
        assert_eq!(extract_message(body, 503), body);
    }

    #[test]
    fn test_empty_string_field_is_skipped() {
        let body = r#"{"detail": "", "message": "fallback"}"#;
        assert_eq!(extract_message(body, 400), "fallback");
    }

    #[test]
    fn test_unparsable_body_is_used_as_is() {
        assert_eq!(
            extract_message("Bad Gateway: upstream es-node-3 unreachable\n", 502),
            "Bad Gateway: upstream es-node-3 unreachable"
        );
        assert_eq!(extract_message("<html>502</html>", 502), "<html>502</html>");
    }

    #[test]
    fn test_empty_body_falls_back_to_status() {
        assert_eq!(extract_message("", 500), "HTTP status 500");
        assert_eq!(extract_message("  \n", 503), "HTTP status 503");
    }
}
