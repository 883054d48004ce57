//! Query-string helpers.

use serde_json::{Map, Value};

/// Parse a URL query string into a JSON object of strings.
///
/// Keys and values are URL-decoded and kept as strings; typing is left to the
/// schema's data types, so `zip=01234` stays `"01234"` and `name=null` stays
/// `"null"`. A pair with an empty value is treated as absent. A repeated key
/// keeps its last value.
pub fn parse_query_string(query: &str) -> Map<String, Value> {
    query
        .split('&')
        .filter_map(|pair| {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() || raw.is_empty() {
                return None;
            }
            Some((url_decode(key), Value::String(url_decode(raw))))
        })
        .collect()
}

/// Percent-decode a query component; `+` is a space. Invalid escapes are
/// kept literally.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
