//! Keeps credentials and oversized payloads out of debug logs.

use serde_json::Value;

/// Characters of a payload kept in a log line.
const LOG_LIMIT: usize = 256;

const MASK: &str = "***";

/// Field names whose values never reach a log line.
const SENSITIVE_KEYS: &[&str] = &["password", "secret", "token", "apikey", "api_key", "key_data"];

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

fn mask_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if is_sensitive(key) && !v.is_null() {
                    *v = Value::String(MASK.to_string());
                } else {
                    mask_in_place(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_in_place),
        _ => {}
    }
}

/// Cut `s` to the log limit on a char boundary, noting the original size.
pub fn truncate_for_log(s: &str) -> String {
    match s.char_indices().nth(LOG_LIMIT) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}... [{} bytes total]", &s[..cut], s.len()),
    }
}

/// Render a request body for logging: JSON bodies get credential fields masked,
/// anything else is shown lossily. Both are truncated.
pub fn body_for_log(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut json) => {
            mask_in_place(&mut json);
            truncate_for_log(&json.to_string())
        }
        Err(_) => truncate_for_log(&String::from_utf8_lossy(body)),
    }
}
