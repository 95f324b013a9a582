//! Rendering of opaque HTTP payloads into log-friendly JSON.
//!
//! Bodies always travel through the proxy as raw bytes. Only the log copy is
//! decoded: JSON and form bodies become structured values, other UTF-8 text
//! becomes a string, and anything else (or any `application/octet-stream`)
//! is stored base64-encoded.

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

const OCTET_STREAM: &str = "application/octet-stream";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Render a body for the log, capped at `max_bytes`.
///
/// Bodies over the cap are replaced by a truncated UTF-8 preview carrying
/// the true size, so a single huge upload cannot blow up the log file.
pub fn capture_body(content_type: Option<&str>, bytes: &[u8], max_bytes: usize) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }

    if bytes.len() > max_bytes {
        return json!({
            "truncated": true,
            "size": bytes.len(),
            "preview": String::from_utf8_lossy(&bytes[..max_bytes]),
        });
    }

    let mime = content_type.map(essence).unwrap_or_default();

    if mime == OCTET_STREAM {
        return encode_binary(bytes);
    }

    if is_json(&mime) {
        if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
            return value;
        }
    }

    if mime == FORM_URLENCODED {
        return Value::Object(pairs_to_map(url::form_urlencoded::parse(bytes)));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => encode_binary(bytes),
    }
}

/// Parse a raw query string into a mapping; repeated keys become arrays.
pub fn query_to_map(raw: Option<&str>) -> Map<String, Value> {
    match raw {
        Some(raw) => pairs_to_map(url::form_urlencoded::parse(raw.as_bytes())),
        None => Map::new(),
    }
}

/// Snapshot headers as a mapping of lowercase names to values.
///
/// A header sent more than once is recorded as an array of its values.
pub fn headers_to_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        map.insert(name.as_str().to_string(), value);
    }
    map
}

fn pairs_to_map<'a, I>(pairs: I) -> Map<String, Value>
where
    I: Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
{
    let mut map = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(existing)) => existing.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json(mime: &str) -> bool {
    mime == "application/json" || mime.ends_with("+json")
}

fn encode_binary(bytes: &[u8]) -> Value {
    json!({
        "encoding": "base64",
        "data": STANDARD.encode(bytes),
    })
}
