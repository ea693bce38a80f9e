// 📥 CLDR Sources
// Where raw CLDR JSON documents come from. The loader only sees the trait;
// a local cldr-json checkout, the upstream repository over HTTP (`remote`
// feature) and an in-memory table for tests all plug in behind it.

use crate::category::Category;
use crate::error::{CldrError, Result};
use crate::locale::LocaleId;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Upstream cldr-json tree on GitHub
pub const CLDR_BASE_URL: &str =
    "https://raw.githubusercontent.com/unicode-org/cldr-json/main/cldr-json";

/// Locale list document, relative to the cldr-json root
pub const AVAILABLE_LOCALES_PATH: &str = "cldr-dates-full/availableLocales.json";

pub trait CldrSource: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Raw text of one category document. `Ok(None)` means the source simply
    /// has no such document; `Err` means it could not be asked.
    fn fetch_document(&self, locale: &LocaleId, category: Category) -> Result<Option<String>>;

    /// Locale identifiers the source offers, unsorted
    fn available_locales(&self) -> Result<Vec<String>>;
}

/// Pull `availableLocales.full` out of the locale list document
pub fn parse_available_locales(text: &str) -> Result<Vec<String>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| CldrError::parse(AVAILABLE_LOCALES_PATH, e))?;

    let full = value
        .get("availableLocales")
        .and_then(|v| v.get("full"))
        .and_then(Value::as_array)
        .ok_or_else(|| CldrError::parse(AVAILABLE_LOCALES_PATH, "missing availableLocales.full"))?;

    Ok(full
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

// ============================================================================
// DIRECTORY SOURCE (local cldr-json checkout)
// ============================================================================

pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_optional(&self, relative: &str) -> Result<Option<String>> {
        let path = self.root.join(relative);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CldrError::Source(format!("{}: {}", path.display(), e))),
        }
    }

    /// Fallback when availableLocales.json is absent: list main/ directories
    fn scan_main_dir(&self) -> Result<Vec<String>> {
        let main = self.root.join(Category::Dates.package()).join("main");
        let entries = fs::read_dir(&main)
            .map_err(|e| CldrError::Source(format!("{}: {}", main.display(), e)))?;

        Ok(entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect())
    }
}

impl CldrSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn fetch_document(&self, locale: &LocaleId, category: Category) -> Result<Option<String>> {
        self.read_optional(&category.document_path(locale.as_str()))
    }

    fn available_locales(&self) -> Result<Vec<String>> {
        match self.read_optional(AVAILABLE_LOCALES_PATH)? {
            Some(text) => parse_available_locales(&text),
            None => self.scan_main_dir(),
        }
    }
}

// ============================================================================
// HTTP SOURCE (upstream cldr-json repository)
// ============================================================================

#[cfg(feature = "remote")]
pub use remote::HttpSource;

#[cfg(feature = "remote")]
mod remote {
    use super::*;
    use reqwest::blocking::Client;
    use reqwest::StatusCode;
    use std::time::Duration;

    const TIMEOUT_SECS: u64 = 15;

    pub struct HttpSource {
        client: Client,
        base_url: String,
    }

    impl HttpSource {
        pub fn new(base_url: impl Into<String>) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(TIMEOUT_SECS))
                .user_agent(concat!("cldr-viewer/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| CldrError::Source(e.to_string()))?;

            Ok(HttpSource {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            })
        }

        pub fn upstream() -> Result<Self> {
            Self::new(CLDR_BASE_URL)
        }

        fn get_optional(&self, relative: &str) -> Result<Option<String>> {
            let url = format!("{}/{}", self.base_url, relative);

            let resp = self
                .client
                .get(&url)
                .send()
                .map_err(|e| CldrError::Source(format!("{}: {}", url, e)))?;

            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(CldrError::Source(format!(
                    "{}: HTTP {}",
                    url,
                    status.as_u16()
                )));
            }

            resp.text()
                .map(Some)
                .map_err(|e| CldrError::Source(format!("{}: {}", url, e)))
        }
    }

    impl CldrSource for HttpSource {
        fn describe(&self) -> String {
            format!("remote {}", self.base_url)
        }

        fn fetch_document(&self, locale: &LocaleId, category: Category) -> Result<Option<String>> {
            self.get_optional(&category.document_path(locale.as_str()))
        }

        fn available_locales(&self) -> Result<Vec<String>> {
            match self.get_optional(AVAILABLE_LOCALES_PATH)? {
                Some(text) => parse_available_locales(&text),
                None => Err(CldrError::Source(format!(
                    "{} not found under {}",
                    AVAILABLE_LOCALES_PATH, self.base_url
                ))),
            }
        }
    }
}

// ============================================================================
// MEMORY SOURCE
// ============================================================================

/// Fixed set of documents held in memory
#[derive(Default)]
pub struct MemorySource {
    documents: HashMap<(String, Category), String>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Builder: register a document for `locale`/`category`
    pub fn with_document(mut self, locale: &str, category: Category, text: impl Into<String>) -> Self {
        self.documents
            .insert((locale.to_string(), category), text.into());
        self
    }
}

impl CldrSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} documents)", self.documents.len())
    }

    fn fetch_document(&self, locale: &LocaleId, category: Category) -> Result<Option<String>> {
        Ok(self
            .documents
            .get(&(locale.as_str().to_string(), category))
            .cloned())
    }

    fn available_locales(&self) -> Result<Vec<String>> {
        let mut locales: Vec<String> = self.documents.keys().map(|(l, _)| l.clone()).collect();
        locales.sort();
        locales.dedup();
        Ok(locales)
    }
}
