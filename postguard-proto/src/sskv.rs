//! Semicolon-separated `key=value;` codec.
//!
//! Both the MTA-STS and TLSRPT TXT records use this shape on the wire:
//! `v=STSv1; id=20240115;`. Decoding is lenient (segments without `=`
//! are skipped, later duplicates win); encoding is driven by the record
//! type's declared field order so output is bit-exact.

use std::collections::HashMap;

/// Decodes semicolon-delimited `key=value` text into a field map.
///
/// Segments are trimmed of surrounding whitespace. Empty segments and
/// segments without a `=` are silently skipped; the split is on the
/// first `=` so values may themselves contain `=`. When the same key
/// appears more than once the last occurrence wins.
///
/// Returns `None` when no key/value pairs could be extracted, since
/// there is no record to build from such text.
#[must_use]
pub fn decode(text: &str) -> Option<HashMap<String, String>> {
    let mut fields = HashMap::new();

    for segment in text.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if let Some((key, value)) = segment.split_once('=') {
            fields.insert(key.to_string(), value.to_string());
        }
    }

    if fields.is_empty() { None } else { Some(fields) }
}

/// Encodes a field map as `key1=value1; key2=value2;`.
///
/// Iteration follows `order` (the record type's declared field order),
/// not the map's own ordering. Keys absent from the map are omitted
/// entirely, with no placeholder.
#[must_use]
pub fn encode(fields: &HashMap<String, String>, order: &[&str]) -> String {
    order
        .iter()
        .filter_map(|key| fields.get(*key).map(|value| format!("{key}={value};")))
        .collect::<Vec<_>>()
        .join(" ")
}
