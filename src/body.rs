use serde_json::Value;

/// Normalize a provider response body into structured data.
///
/// JSON is tried first; anything that is not valid JSON falls back to an
/// URL-encoded key/value parse. The order matters: Twitter-style OAuth1
/// endpoints answer with form-encoded bodies that are not JSON, while other
/// providers answer with JSON that must never be misread as form pairs.
pub(crate) fn parse_body(body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => Value::Object(
            url::form_urlencoded::parse(body.as_bytes())
                .into_owned()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        ),
    }
}

/// Pull a string field out of a normalized body.
pub(crate) fn body_str(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}
