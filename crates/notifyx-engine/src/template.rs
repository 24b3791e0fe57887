use serde_json::{Map, Value};

/// Substitute every `{{key}}` placeholder with the matching payload field.
///
/// Total and single-pass: unknown or null keys keep the literal placeholder,
/// substituted text is never re-scanned, and no input can make this fail.
pub fn render(template: &str, vars: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(close) = rest[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + close;

        out.push_str(&rest[..start]);
        let key = rest[start + 2..end].trim();
        match vars.get(key) {
            Some(value) if !value.is_null() => out.push_str(&value_text(value)),
            _ => out.push_str(&rest[start..end + 2]),
        }
        rest = &rest[end + 2..];
    }

    out.push_str(rest);
    out
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
