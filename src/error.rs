// ⚠️ Error kinds for the coverage engine
// Every failure here is recoverable: callers show an empty/error state per
// locale instead of aborting a whole comparison.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CldrError {
    /// Identifier is not a well-formed BCP-47 language tag
    #[error("invalid locale identifier '{0}'")]
    InvalidLocale(String),

    /// Source has no CLDR data at all for this locale
    #[error("no CLDR data available for locale '{0}'")]
    DataUnavailable(String),

    /// Document exists but is not valid CLDR JSON
    #[error("malformed CLDR JSON in {document}: {message}")]
    Parse { document: String, message: String },

    /// Reading or fetching a document failed
    #[error("source error: {0}")]
    Source(String),

    /// Cache storage failed
    #[error("cache error: {0}")]
    Cache(String),
}

impl CldrError {
    pub fn parse(document: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CldrError::Parse {
            document: document.into(),
            message: err.to_string(),
        }
    }

    /// True when a stale cached record may stand in for fresh data
    pub fn is_transient(&self) -> bool {
        matches!(self, CldrError::Source(_))
    }
}

impl From<rusqlite::Error> for CldrError {
    fn from(err: rusqlite::Error) -> Self {
        CldrError::Cache(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CldrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CldrError::InvalidLocale("12-!!".to_string());
        assert_eq!(err.to_string(), "invalid locale identifier '12-!!'");

        let err = CldrError::parse("sv/currencies.json", "expected value at line 1");
        assert!(err.to_string().contains("sv/currencies.json"));
    }

    #[test]
    fn test_only_source_errors_are_transient() {
        assert!(CldrError::Source("timeout".to_string()).is_transient());
        assert!(!CldrError::DataUnavailable("xx".to_string()).is_transient());
        assert!(!CldrError::parse("doc", "bad").is_transient());
    }
}
