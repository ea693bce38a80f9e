// 🗂️ Locale Record
// Flattened view of one locale's CLDR data: category -> field key -> value.
// Records are immutable once loaded; a refresh replaces the whole record.

use crate::error::{CldrError, Result};
use crate::locale::LocaleId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub type FieldMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleRecord {
    pub locale: LocaleId,
    pub categories: BTreeMap<String, FieldMap>,
}

impl LocaleRecord {
    pub fn new(locale: LocaleId) -> Self {
        LocaleRecord {
            locale,
            categories: BTreeMap::new(),
        }
    }

    /// Builder: set one field value
    pub fn with_field(
        mut self,
        category: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Builder: attach a whole category
    pub fn with_category(mut self, category: impl Into<String>, fields: FieldMap) -> Self {
        self.categories.insert(category.into(), fields);
        self
    }

    pub fn category(&self, name: &str) -> Option<&FieldMap> {
        self.categories.get(name)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Raw value, present even when empty
    pub fn value(&self, category: &str, key: &str) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|fields| fields.get(key))
            .map(String::as_str)
    }

    /// True when the field exists and holds something other than whitespace
    pub fn is_populated(&self, category: &str, key: &str) -> bool {
        self.value(category, key)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn field_count(&self) -> usize {
        self.categories.values().map(|f| f.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// SHA-256 over the record content, used to notice when a refresh
    /// actually changed anything
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.locale.as_str().as_bytes());
        for (category, fields) in &self.categories {
            hasher.update([0u8]);
            hasher.update(category.as_bytes());
            for (key, value) in fields {
                hasher.update([1u8]);
                hasher.update(key.as_bytes());
                hasher.update([2u8]);
                hasher.update(value.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// CLDR JSON FLATTENING
// ============================================================================

/// Parse a CLDR JSON document into dotted-key fields.
///
/// CLDR documents wrap their payload as `{"main": {"<locale>": {...}}}`. The
/// envelope and the `identity` block are dropped so that the same datum gets
/// the same key in every locale.
pub fn parse_document(document: &str, text: &str) -> Result<FieldMap> {
    let value: Value = serde_json::from_str(text).map_err(|e| CldrError::parse(document, e))?;

    if !value.is_object() {
        return Err(CldrError::parse(document, "top-level value is not an object"));
    }

    Ok(flatten_document(&value))
}

pub fn flatten_document(document: &Value) -> FieldMap {
    let payload = unwrap_envelope(document);

    let mut fields = FieldMap::new();
    if let Value::Object(map) = payload {
        for (key, value) in map {
            if key == "identity" {
                continue;
            }
            flatten_into(value, key, &mut fields);
        }
    }
    fields
}

fn unwrap_envelope(document: &Value) -> &Value {
    match document.get("main").and_then(Value::as_object) {
        // Exactly one locale per document; its key may differ in case from
        // the requested identifier, so take whatever is there
        Some(main) if main.len() == 1 => main.values().next().unwrap_or(document),
        _ => document,
    }
}

/// Flatten nested JSON into `prefix.key` -> string value
pub fn flatten_into(value: &Value, prefix: &str, out: &mut FieldMap) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join_key(prefix, key);
                flatten_into(child, &path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = join_key(prefix, &i.to_string());
                flatten_into(child, &path, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sv() -> LocaleId {
        LocaleId::parse("sv").unwrap()
    }

    #[test]
    fn test_envelope_and_identity_stripped() {
        let doc = json!({
            "main": {
                "sv": {
                    "identity": { "language": "sv", "version": { "_cldrVersion": "46" } },
                    "numbers": {
                        "currencies": {
                            "SEK": { "displayName": "svensk krona", "symbol": "kr" }
                        }
                    }
                }
            }
        });

        let fields = flatten_document(&doc);

        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields.get("numbers.currencies.SEK.symbol").map(String::as_str),
            Some("kr")
        );
        assert!(fields.keys().all(|k| !k.starts_with("identity")));
    }

    #[test]
    fn test_same_datum_same_key_across_locales() {
        let sv = json!({ "main": { "sv": { "dates": { "fields": { "year": { "displayName": "år" } } } } } });
        let en = json!({ "main": { "en": { "dates": { "fields": { "year": { "displayName": "year" } } } } } });

        let a: Vec<String> = flatten_document(&sv).into_keys().collect();
        let b: Vec<String> = flatten_document(&en).into_keys().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scalars_and_arrays() {
        let doc = json!({
            "plain": {
                "null": null,
                "flag": true,
                "count": 3,
                "list": ["a", "b"]
            }
        });

        let fields = flatten_document(&doc);

        assert_eq!(fields["plain.null"], "");
        assert_eq!(fields["plain.flag"], "true");
        assert_eq!(fields["plain.count"], "3");
        assert_eq!(fields["plain.list.0"], "a");
        assert_eq!(fields["plain.list.1"], "b");
    }

    #[test]
    fn test_parse_document_rejects_malformed() {
        let err = parse_document("sv/units.json", "{ not json").unwrap_err();
        assert!(matches!(err, CldrError::Parse { .. }));

        let err = parse_document("sv/units.json", "[1, 2]").unwrap_err();
        assert!(matches!(err, CldrError::Parse { .. }));
    }

    #[test]
    fn test_is_populated() {
        let record = LocaleRecord::new(sv())
            .with_field("currency", "symbol", "kr")
            .with_field("currency", "name", "   ");

        assert!(record.is_populated("currency", "symbol"));
        assert!(!record.is_populated("currency", "name"));
        assert!(!record.is_populated("currency", "code"));
        assert!(!record.is_populated("units", "symbol"));
        assert_eq!(record.value("currency", "name"), Some("   "));
        assert_eq!(record.field_count(), 2);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = LocaleRecord::new(sv()).with_field("currency", "symbol", "kr");
        let b = LocaleRecord::new(sv()).with_field("currency", "symbol", "kr");
        let c = LocaleRecord::new(sv()).with_field("currency", "symbol", "SEK");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
