use crate::ConfigError;
use std::collections::BTreeMap;

/// Parses a cookie set given as a JSON object of name/value pairs
///
/// Non-string JSON values are rendered with their JSON text, so
/// `{"id": 42}` yields the cookie `id=42`.
///
/// # Example
///
/// ```
/// use mirror_crawl::config::parse_cookies;
///
/// let cookies = parse_cookies(r#"{"session": "abc"}"#).unwrap();
/// assert_eq!(cookies["session"], "abc");
/// ```
pub fn parse_cookies(json: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;

    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

/// Renders a cookie set as the value of a `Cookie` request header
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
