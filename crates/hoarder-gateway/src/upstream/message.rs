use serde_json::Value;

/// Longest slice of a raw upstream body ever surfaced to callers.
pub const MAX_BODY_PREVIEW_CHARS: usize = 200;

/// Fields inspected, in order, for a human-readable upstream error.
const MESSAGE_FIELDS: [(&str, &str); 3] = [
    ("message", "Message"),
    ("error", "Error"),
    ("code", "Code"),
];

/// Build the message attached to an upstream status error.
///
/// Uses the first non-null of `message`, `error`, `code` from a JSON object
/// body, falling back to the start of the raw body.
pub fn compose_status_message(status: u16, body: &str) -> String {
    let prefix = format!("Hoarder API request failed with status {status}.");

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for (key, label) in MESSAGE_FIELDS {
            match fields.get(key) {
                Some(Value::Null) | None => continue,
                Some(value) => return format!("{prefix} {label}: {}", render(value)),
            }
        }
    }

    format!("{prefix} Body: {}", truncate_chars(body, MAX_BODY_PREVIEW_CHARS))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
