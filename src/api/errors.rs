use serde_json::Value;

/// Turn an error body into one human-readable line.
///
/// `{"errors": {"field": ["msg", ...]}}` flattens to every message joined with
/// `", "`; otherwise `message` is used; otherwise a generic status line.
pub fn normalize_error(status: u16, body: &Value) -> String {
    if let Some(Value::Object(fields)) = body.get("errors") {
        let messages: Vec<&str> = fields
            .values()
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                Value::String(s) => vec![s.as_str()],
                _ => Vec::new(),
            })
            .collect();
        if !messages.is_empty() {
            return messages.join(", ");
        }
    }

    match body.get("message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => format!("HTTP error! status: {}", status),
    }
}
