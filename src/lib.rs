// CLDR Viewer - Core Library
// Locale data loading, caching, coverage and comparison for Unicode CLDR.
// Exposes all modules for use in the CLI, the terminal browser, and tests.

pub mod error;
pub mod locale;
pub mod category;
pub mod record;
pub mod schema;
pub mod source;
pub mod cache;
pub mod loader;
pub mod coverage;
pub mod compare;
pub mod export;
pub mod config;

// Re-export commonly used types
pub use error::{CldrError, Result};
pub use locale::LocaleId;
pub use category::Category;
pub use record::{LocaleRecord, FieldMap, flatten_document, parse_document};
pub use schema::{CategorySchema, CategorySpec};
pub use source::{CldrSource, DirectorySource, MemorySource, CLDR_BASE_URL};
#[cfg(feature = "remote")]
pub use source::HttpSource;
pub use cache::{CacheEntry, MemoryCache, RecordCache, SqliteCache, CACHE_TTL_HOURS};
pub use loader::LocaleLoader;
pub use coverage::{CoverageBand, CoverageCalculator, CoverageReport, CoverageResult};
pub use compare::{Comparator, ComparisonResult, ComparisonRow, FieldStatus};
pub use export::{ExportFormat, ExportRow, export_to_path, write_rows};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
