// 🌐 Locale identifiers
// Validates and normalizes the identifiers used to key CLDR data.

use crate::error::{CldrError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

/// A validated BCP-47 locale identifier ("sv", "en-US", "sr-Latn").
///
/// Underscores are accepted and normalized to hyphens, and subtag casing is
/// canonicalized, so `en_us` and `en-US` name the same locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleId(String);

impl LocaleId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CldrError::InvalidLocale(raw.to_string()));
        }

        // Strip encoding / modifier suffixes such as "sv_SE.UTF-8" or "sr@latin"
        let stripped = trimmed.split(['.', '@']).next().unwrap_or_default();
        let candidate = stripped.replace('_', "-");

        let langid = LanguageIdentifier::from_str(&candidate)
            .map_err(|_| CldrError::InvalidLocale(raw.to_string()))?;

        Ok(LocaleId(langid.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag ("sv" for "sv-FI")
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Variant subtags are lowercased on parsing, while CLDR spells some of
    /// its directories otherwise ("en-US-POSIX", "ca-ES-valencia")
    pub fn has_variants(&self) -> bool {
        LanguageIdentifier::from_str(&self.0)
            .map(|id| id.variants().next().is_some())
            .unwrap_or(false)
    }

    /// The same locale spelled the way a data source lists it, or None when
    /// `listed` names a different locale
    pub fn respelled(&self, listed: &str) -> Option<LocaleId> {
        let other = LocaleId::parse(listed).ok()?;
        if other != *self {
            return None;
        }
        Some(LocaleId(listed.trim().replace('_', "-")))
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocaleId {
    type Err = CldrError;

    fn from_str(s: &str) -> Result<Self> {
        LocaleId::parse(s)
    }
}

impl TryFrom<String> for LocaleId {
    type Error = CldrError;

    fn try_from(value: String) -> Result<Self> {
        LocaleId::parse(&value)
    }
}

impl From<LocaleId> for String {
    fn from(id: LocaleId) -> Self {
        id.0
    }
}

impl AsRef<str> for LocaleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_language() {
        let id = LocaleId::parse("sv").unwrap();
        assert_eq!(id.as_str(), "sv");
        assert_eq!(id.language(), "sv");
    }

    #[test]
    fn test_underscore_normalized() {
        let a = LocaleId::parse("en_US").unwrap();
        let b = LocaleId::parse("en-US").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "en-US");
    }

    #[test]
    fn test_case_canonicalized() {
        let id = LocaleId::parse("EN-us").unwrap();
        assert_eq!(id.as_str(), "en-US");
    }

    #[test]
    fn test_system_style_suffix_stripped() {
        let id = LocaleId::parse("sv_SE.UTF-8").unwrap();
        assert_eq!(id.as_str(), "sv-SE");
    }

    #[test]
    fn test_script_subtag() {
        let id = LocaleId::parse("sr-Latn").unwrap();
        assert_eq!(id.as_str(), "sr-Latn");
        assert_eq!(id.language(), "sr");
    }

    #[test]
    fn test_malformed_identifiers_rejected() {
        for raw in ["", "   ", "e", "toolonglanguage", "en-!!", "12"] {
            let err = LocaleId::parse(raw).unwrap_err();
            assert!(
                matches!(err, CldrError::InvalidLocale(_)),
                "expected InvalidLocale for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_variant_respelled_from_listing() {
        let id = LocaleId::parse("en_us_posix").unwrap();
        assert_eq!(id.as_str(), "en-US-posix");
        assert!(id.has_variants());
        assert!(!LocaleId::parse("en-US").unwrap().has_variants());

        let listed = id.respelled("en-US-POSIX").unwrap();
        assert_eq!(listed.as_str(), "en-US-POSIX");
        assert!(id.respelled("en-US").is_none());
        assert!(id.respelled("not a locale").is_none());
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let id: LocaleId = serde_json::from_str("\"fi_FI\"").unwrap();
        assert_eq!(id.as_str(), "fi-FI");

        let bad: std::result::Result<LocaleId, _> = serde_json::from_str("\"!!\"");
        assert!(bad.is_err());
    }
}
