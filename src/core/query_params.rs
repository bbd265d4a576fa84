/// Parse query parameters from a URI or raw query string
///
/// Handles URL decoding (including `+` as space) and keeps parameters in the
/// order they appear. Repeated keys are all kept; lookups return the first.
///
/// # Example
/// ```
/// use parler_search::core::query_params::{parse_query_params, get_string};
///
/// let params = parse_query_params("/users?search_term=john&page=2");
/// assert_eq!(get_string(&params, "search_term"), "john");
/// assert_eq!(get_string(&params, "page"), "2");
/// ```
pub fn parse_query_params(uri: &str) -> Vec<(String, String)> {
    let query = match uri.find('?') {
        Some(query_start) => &uri[query_start + 1..],
        None if uri.starts_with('/') => return Vec::new(),
        None => uri,
    };

    query
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| match param.find('=') {
            Some(eq_idx) => (decode(&param[..eq_idx]), decode(&param[eq_idx + 1..])),
            // Flag parameter without value
            None => (decode(param), String::new()),
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Get a string parameter, empty when absent
pub fn get_string(params: &[(String, String)], key: &str) -> String {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

/// Get the zero-based page index, defaulting to 0 when missing or unparsable
pub fn get_page(params: &[(String, String)]) -> i64 {
    params
        .iter()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

/// Re-encode parameters into a query string
pub fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
