// 🗄️ Cache Layer - parsed locale records with a freshness window
//
// Expiry is checked when an entry is read; nothing is evicted in the
// background. An entry is fresh while  now - fetched_at <= ttl.
// Writes to the same locale replace the previous entry (last write wins).

use crate::error::{CldrError, Result};
use crate::locale::LocaleId;
use crate::record::LocaleRecord;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Default freshness window
pub const CACHE_TTL_HOURS: i64 = 24;

pub fn default_ttl() -> Duration {
    Duration::hours(CACHE_TTL_HOURS)
}

// ============================================================================
// CACHE ENTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub locale: LocaleId,
    pub record: Arc<LocaleRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(locale: LocaleId, record: Arc<LocaleRecord>, fetched_at: DateTime<Utc>) -> Self {
        CacheEntry {
            locale,
            record,
            fetched_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}

// ============================================================================
// CACHE TRAIT
// ============================================================================

pub trait RecordCache: Send + Sync {
    /// Fresh entry for `locale` as of `now`, or None on miss/expiry
    fn get(&self, locale: &LocaleId, now: DateTime<Utc>) -> Result<Option<CacheEntry>>;

    /// Entry regardless of age; used when the source is unreachable
    fn get_stale(&self, locale: &LocaleId) -> Result<Option<CacheEntry>>;

    fn put(&self, locale: &LocaleId, record: Arc<LocaleRecord>, fetched_at: DateTime<Utc>)
        -> Result<()>;

    /// Drop every entry, returning how many were removed
    fn clear(&self) -> Result<usize>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn ttl(&self) -> Duration;
}

fn fresh(entry: Option<CacheEntry>, now: DateTime<Utc>, ttl: Duration) -> Option<CacheEntry> {
    match entry {
        Some(entry) if !entry.is_expired(now, ttl) => {
            debug!(locale = %entry.locale, "cache hit");
            Some(entry)
        }
        Some(entry) => {
            debug!(locale = %entry.locale, age_secs = entry.age(now).num_seconds(), "cache entry expired");
            None
        }
        None => None,
    }
}

fn poisoned<T>(_: T) -> CldrError {
    CldrError::Cache("cache lock poisoned".to_string())
}

// ============================================================================
// IN-MEMORY CACHE
// ============================================================================

pub struct MemoryCache {
    entries: RwLock<HashMap<LocaleId, CacheEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_ttl(default_ttl())
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        MemoryCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCache for MemoryCache {
    fn get(&self, locale: &LocaleId, now: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        let entry = self.get_stale(locale)?;
        Ok(fresh(entry, now, self.ttl))
    }

    fn get_stale(&self, locale: &LocaleId) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(locale).cloned())
    }

    fn put(
        &self,
        locale: &LocaleId,
        record: Arc<LocaleRecord>,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            locale.clone(),
            CacheEntry::new(locale.clone(), record, fetched_at),
        );
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

// ============================================================================
// SQLITE CACHE (persists between runs)
// ============================================================================

pub struct SqliteCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: &Path, ttl: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CldrError::Cache(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)?;
        // WAL keeps readers unblocked while a refresh writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn, ttl)
    }

    pub fn open_in_memory(ttl: Duration) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, ttl)
    }

    fn from_connection(conn: Connection, ttl: Duration) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                locale TEXT PRIMARY KEY NOT NULL,
                fetched_at TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                record TEXT NOT NULL
            )",
            [],
        )?;

        Ok(SqliteCache {
            conn: Mutex::new(conn),
            ttl,
        })
    }
}

impl RecordCache for SqliteCache {
    fn get(&self, locale: &LocaleId, now: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        let entry = self.get_stale(locale)?;
        Ok(fresh(entry, now, self.ttl))
    }

    fn get_stale(&self, locale: &LocaleId) -> Result<Option<CacheEntry>> {
        let conn = self.conn.lock().map_err(poisoned)?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT fetched_at, record FROM records WHERE locale = ?1",
                params![locale.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((fetched_at, record_json)) = row else {
            return Ok(None);
        };

        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .map_err(|e| CldrError::Cache(format!("bad timestamp for {}: {}", locale, e)))?
            .with_timezone(&Utc);
        let record: LocaleRecord = serde_json::from_str(&record_json)
            .map_err(|e| CldrError::Cache(format!("bad record for {}: {}", locale, e)))?;

        Ok(Some(CacheEntry::new(
            locale.clone(),
            Arc::new(record),
            fetched_at,
        )))
    }

    fn put(
        &self,
        locale: &LocaleId,
        record: Arc<LocaleRecord>,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let record_json = serde_json::to_string(record.as_ref())
            .map_err(|e| CldrError::Cache(e.to_string()))?;

        let conn = self.conn.lock().map_err(poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO records (locale, fetched_at, fingerprint, record)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                locale.as_str(),
                fetched_at.to_rfc3339(),
                record.fingerprint(),
                record_json,
            ],
        )?;

        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let removed = conn.execute("DELETE FROM records", [])?;
        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sv_record() -> Arc<LocaleRecord> {
        Arc::new(
            LocaleRecord::new(LocaleId::parse("sv").unwrap())
                .with_field("currency", "symbol", "kr")
                .with_field("currency", "name", ""),
        )
    }

    fn sv() -> LocaleId {
        LocaleId::parse("sv").unwrap()
    }

    fn check_ttl_behaviour(cache: &dyn RecordCache) {
        let stored_at = Utc::now();
        let record = sv_record();
        cache.put(&sv(), record.clone(), stored_at).unwrap();

        // Unchanged within the window
        let hit = cache.get(&sv(), stored_at + Duration::hours(23)).unwrap().unwrap();
        assert_eq!(hit.record.as_ref(), record.as_ref());

        // Exactly at the boundary is still fresh
        assert!(cache.get(&sv(), stored_at + Duration::hours(24)).unwrap().is_some());

        // Miss afterwards
        let later = stored_at + Duration::hours(24) + Duration::seconds(1);
        assert!(cache.get(&sv(), later).unwrap().is_none());

        // But the stale copy is still there for fallback
        assert!(cache.get_stale(&sv()).unwrap().is_some());
    }

    fn check_last_write_wins(cache: &dyn RecordCache) {
        let now = Utc::now();
        cache.put(&sv(), sv_record(), now).unwrap();

        let newer = Arc::new(LocaleRecord::new(sv()).with_field("currency", "symbol", "SEK"));
        cache.put(&sv(), newer.clone(), now).unwrap();
        cache.put(&sv(), newer.clone(), now).unwrap();

        assert_eq!(cache.len().unwrap(), 1);
        let hit = cache.get(&sv(), now).unwrap().unwrap();
        assert_eq!(hit.record.value("currency", "symbol"), Some("SEK"));
    }

    #[test]
    fn test_memory_cache_ttl() {
        check_ttl_behaviour(&MemoryCache::new());
    }

    #[test]
    fn test_memory_cache_last_write_wins() {
        check_last_write_wins(&MemoryCache::new());
    }

    #[test]
    fn test_sqlite_cache_ttl() {
        check_ttl_behaviour(&SqliteCache::open_in_memory(default_ttl()).unwrap());
    }

    #[test]
    fn test_sqlite_cache_last_write_wins() {
        check_last_write_wins(&SqliteCache::open_in_memory(default_ttl()).unwrap());
    }

    #[test]
    fn test_miss_on_unknown_locale() {
        let cache = MemoryCache::new();
        let fi = LocaleId::parse("fi").unwrap();
        assert!(cache.get(&fi, Utc::now()).unwrap().is_none());
        assert!(cache.get_stale(&fi).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let cache = SqliteCache::open_in_memory(default_ttl()).unwrap();
        let now = Utc::now();
        cache.put(&sv(), sv_record(), now).unwrap();
        cache
            .put(&LocaleId::parse("en").unwrap(), sv_record(), now)
            .unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_sqlite_cache_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");
        let now = Utc::now();

        {
            let cache = SqliteCache::open(&path, default_ttl()).unwrap();
            cache.put(&sv(), sv_record(), now).unwrap();
        }

        let cache = SqliteCache::open(&path, default_ttl()).unwrap();
        let hit = cache.get(&sv(), now).unwrap().unwrap();
        assert_eq!(hit.record.as_ref(), sv_record().as_ref());
        // RFC 3339 keeps sub-second precision
        assert_eq!(hit.fetched_at, now);
    }

    #[test]
    fn test_concurrent_reads() {
        let cache = Arc::new(MemoryCache::new());
        let now = Utc::now();
        cache.put(&sv(), sv_record(), now).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get(&sv(), now).unwrap().is_some())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_custom_ttl() {
        let cache = MemoryCache::with_ttl(Duration::minutes(5));
        let now = Utc::now();
        cache.put(&sv(), sv_record(), now).unwrap();

        assert!(cache.get(&sv(), now + Duration::minutes(4)).unwrap().is_some());
        assert!(cache.get(&sv(), now + Duration::minutes(6)).unwrap().is_none());
        assert_eq!(cache.ttl(), Duration::minutes(5));
    }
}
