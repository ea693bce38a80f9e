// 📦 Locale Data Loader
// locale identifier -> (cache check) -> CLDR documents -> LocaleRecord
//
// A record holds every catalog category the source has for the locale.
// Categories without a document are simply absent from the record.

use crate::cache::RecordCache;
use crate::category::Category;
use crate::error::{CldrError, Result};
use crate::locale::LocaleId;
use crate::record::{parse_document, LocaleRecord};
use crate::source::CldrSource;
use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Offered when the source cannot list its locales
pub const FALLBACK_LOCALES: [&str; 2] = ["en", "sv"];

pub struct LocaleLoader {
    source: Box<dyn CldrSource>,
    cache: Box<dyn RecordCache>,
    /// Source locale list, fetched once when a variant needs its spelling
    listed: OnceLock<Vec<String>>,
}

impl LocaleLoader {
    pub fn new(source: Box<dyn CldrSource>, cache: Box<dyn RecordCache>) -> Self {
        LocaleLoader {
            source,
            cache,
            listed: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &dyn CldrSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &dyn RecordCache {
        self.cache.as_ref()
    }

    /// Validate `raw` and load its record, using the cache when fresh
    pub fn load(&self, raw: &str) -> Result<Arc<LocaleRecord>> {
        let locale = self.resolve(LocaleId::parse(raw)?);
        self.load_at(&locale, Utc::now())
    }

    /// Load as of `now`; the cache decides freshness against this instant
    pub fn load_at(&self, locale: &LocaleId, now: DateTime<Utc>) -> Result<Arc<LocaleRecord>> {
        match self.cache.get(locale, now) {
            Ok(Some(entry)) => return Ok(entry.record),
            Ok(None) => debug!(locale = %locale, "cache miss"),
            // The cache only saves work; a broken one should not block loading
            Err(e) => warn!(locale = %locale, error = %e, "cache read failed"),
        }

        self.fetch_and_store(locale, now)
    }

    /// Load ignoring any cached copy
    pub fn refresh(&self, raw: &str) -> Result<Arc<LocaleRecord>> {
        let locale = self.resolve(LocaleId::parse(raw)?);
        self.fetch_and_store(&locale, Utc::now())
    }

    /// Load two locales for a comparison. Both loads run to completion
    /// before this returns; each side fails independently.
    pub fn load_pair(
        &self,
        a: &str,
        b: &str,
    ) -> (Result<Arc<LocaleRecord>>, Result<Arc<LocaleRecord>>) {
        let first = self.load(a);
        let second = self.load(b);
        (first, second)
    }

    /// Sorted locale list; falls back to a minimal list when the source
    /// cannot provide one
    pub fn available_locales(&self) -> Vec<String> {
        match self.source.available_locales() {
            Ok(mut locales) if !locales.is_empty() => {
                locales.sort();
                locales.dedup();
                locales
            }
            Ok(_) => {
                warn!(source = %self.source.describe(), "source lists no locales, using fallback");
                FALLBACK_LOCALES.iter().map(|s| s.to_string()).collect()
            }
            Err(e) => {
                warn!(source = %self.source.describe(), error = %e, "cannot list locales, using fallback");
                FALLBACK_LOCALES.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Spell a locale with variants the way the source lists it, so its
    /// documents are found on case-sensitive paths
    pub fn resolve(&self, locale: LocaleId) -> LocaleId {
        if !locale.has_variants() {
            return locale;
        }

        let listed = match self.listed.get() {
            Some(listed) => listed,
            None => match self.source.available_locales() {
                Ok(locales) => self.listed.get_or_init(|| locales),
                Err(e) => {
                    debug!(locale = %locale, error = %e, "cannot list locales to resolve spelling");
                    return locale;
                }
            },
        };

        listed
            .iter()
            .find_map(|l| locale.respelled(l))
            .unwrap_or(locale)
    }

    pub fn clear_cache(&self) -> Result<usize> {
        let removed = self.cache.clear()?;
        info!(removed, "cache cleared");
        Ok(removed)
    }

    fn fetch_and_store(&self, locale: &LocaleId, now: DateTime<Utc>) -> Result<Arc<LocaleRecord>> {
        let record = match self.fetch_record(locale) {
            Ok(record) => Arc::new(record),
            Err(e) if e.is_transient() => return self.stale_fallback(locale, e),
            Err(e) => return Err(e),
        };

        let previous = self.cache.get_stale(locale).ok().flatten();
        let changed = previous
            .map(|p| p.record.fingerprint() != record.fingerprint())
            .unwrap_or(true);

        info!(
            locale = %locale,
            categories = record.categories.len(),
            fields = record.field_count(),
            changed,
            "locale loaded"
        );

        if let Err(e) = self.cache.put(locale, record.clone(), now) {
            warn!(locale = %locale, error = %e, "cache write failed");
        }

        Ok(record)
    }

    fn fetch_record(&self, locale: &LocaleId) -> Result<LocaleRecord> {
        let mut record = LocaleRecord::new(locale.clone());

        for category in Category::ALL {
            let document = category.document_path(locale.as_str());
            let Some(text) = self.source.fetch_document(locale, category)? else {
                debug!(locale = %locale, category = %category, "no document");
                continue;
            };

            let fields = parse_document(&document, &text)?;
            record = record.with_category(category.key(), fields);
        }

        if record.is_empty() {
            return Err(CldrError::DataUnavailable(locale.to_string()));
        }

        Ok(record)
    }

    /// Source unreachable: serve whatever we had, however old
    fn stale_fallback(&self, locale: &LocaleId, err: CldrError) -> Result<Arc<LocaleRecord>> {
        match self.cache.get_stale(locale) {
            Ok(Some(entry)) => {
                warn!(
                    locale = %locale,
                    error = %err,
                    fetched_at = %entry.fetched_at.to_rfc3339(),
                    "source failed, serving stale cached record"
                );
                Ok(entry.record)
            }
            _ => Err(err),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
