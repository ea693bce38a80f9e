// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use cldr_viewer::{
    Category, CategorySchema, CldrSource, Comparator, ComparisonRow, Config,
    CoverageCalculator, CoverageReport, DirectorySource, ExportFormat, FieldStatus, LocaleId,
    LocaleLoader, LocaleRecord, MemoryCache, RecordCache, SqliteCache,
};

#[derive(Parser)]
#[command(name = "cldr-viewer")]
#[command(version, about = "Browse and compare Unicode CLDR locale data")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Local cldr-json checkout (overrides config file)
    #[arg(short, long, global = true, env = "CLDR_VIEWER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Fetch from the upstream cldr-json repository
    #[arg(long, global = true)]
    remote: bool,

    /// Cache directory (overrides config file)
    #[arg(long, global = true, env = "CLDR_VIEWER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Keep the cache in memory only for this run
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available locales
    Locales,

    /// Show the data of one locale
    Show {
        locale: String,
        #[arg(long)]
        category: Option<Category>,
        /// Only keys/values containing this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Coverage of a locale against a reference locale or schema file
    Coverage {
        locale: String,
        /// Reference locale (defaults to config reference_locale)
        #[arg(short, long)]
        reference: Option<String>,
        /// Schema JSON file used instead of a reference locale
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two locales field by field
    Compare {
        a: String,
        b: String,
        #[arg(long)]
        category: Option<Category>,
        /// Align on a schema file instead of the union of both locales' keys
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long)]
        filter: Option<String>,
        /// Only rows missing in the first locale
        #[arg(long)]
        only_missing: bool,
    },

    /// Export a comparison to CSV or JSON
    Export {
        a: String,
        /// Reference locale (defaults to config reference_locale)
        b: Option<String>,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        category: Option<Category>,
    },

    /// Remove all cached locale records
    ClearCache,

    /// Interactive terminal browser
    Browse {
        locale: String,
        /// Reference locale (defaults to config reference_locale)
        reference: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Command::Browse { .. }))?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = Some(dir);
    }
    config.remote |= cli.remote;

    // Needs no source, so it works before any data is configured
    if matches!(cli.command, Command::ClearCache) {
        return run_clear_cache(&config);
    }

    let loader = build_loader(&config, cli.no_cache)?;

    match cli.command {
        Command::Locales => run_locales(&loader),
        Command::Show { locale, category, filter } => {
            run_show(&loader, &locale, category, filter.as_deref())
        }
        Command::Coverage { locale, reference, schema, json } => {
            let reference = reference.unwrap_or_else(|| config.reference_locale.clone());
            run_coverage(&loader, &config, &locale, &reference, schema, json)
        }
        Command::Compare { a, b, category, schema, filter, only_missing } => {
            run_compare(&loader, &a, &b, category, schema, filter.as_deref(), only_missing)
        }
        Command::Export { a, b, format, output, category } => {
            let b = b.unwrap_or_else(|| config.reference_locale.clone());
            run_export(&loader, &a, &b, format, output, category)
        }
        Command::ClearCache => Ok(()),
        Command::Browse { locale, reference } => {
            let reference = reference.unwrap_or_else(|| config.reference_locale.clone());
            run_browse(loader, &locale, &reference, config.low_coverage_threshold)
        }
    }
}

fn init_tracing(quiet: bool) -> Result<()> {
    // The browser owns the terminal, so only errors get through there
    let default = if quiet { "cldr_viewer=error" } else { "cldr_viewer=info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn build_loader(config: &Config, no_cache: bool) -> Result<LocaleLoader> {
    let source = build_source(config)?;

    let cache: Box<dyn RecordCache> = if no_cache {
        Box::new(MemoryCache::with_ttl(config.ttl()))
    } else {
        let path = config.cache_db_path();
        Box::new(
            SqliteCache::open(&path, config.ttl())
                .with_context(|| format!("Failed to open cache at {}", path.display()))?,
        )
    };

    info!(source = %source.describe(), "using CLDR source");
    Ok(LocaleLoader::new(source, cache))
}

#[cfg(feature = "remote")]
fn build_source(config: &Config) -> Result<Box<dyn CldrSource>> {
    if config.remote {
        return Ok(Box::new(cldr_viewer::HttpSource::new(config.base_url.clone())?));
    }
    local_source(config)
}

#[cfg(not(feature = "remote"))]
fn build_source(config: &Config) -> Result<Box<dyn CldrSource>> {
    if config.remote {
        anyhow::bail!("remote source not available, rebuild with: cargo build --features remote");
    }
    local_source(config)
}

fn local_source(config: &Config) -> Result<Box<dyn CldrSource>> {
    let Some(dir) = &config.data_dir else {
        anyhow::bail!(
            "no CLDR data configured: pass --data-dir <cldr-json checkout>, set data_dir in the config file, or use --remote"
        );
    };
    if !dir.is_dir() {
        anyhow::bail!("CLDR data directory not found: {}", dir.display());
    }
    Ok(Box::new(DirectorySource::new(dir)))
}

/// A failed locale shows up as an empty record instead of aborting the
/// whole comparison
fn record_or_empty(
    raw: &str,
    result: cldr_viewer::Result<Arc<LocaleRecord>>,
) -> Result<Arc<LocaleRecord>> {
    match result {
        Ok(record) => Ok(record),
        Err(err) => {
            eprintln!("❌ {}: {}", raw, err);
            let locale = LocaleId::parse(raw).or_else(|_| LocaleId::parse("und"))?;
            Ok(Arc::new(LocaleRecord::new(locale)))
        }
    }
}

fn categories_for(category: Option<Category>) -> Vec<Category> {
    match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    }
}

fn union_rows(a: &LocaleRecord, b: &LocaleRecord, categories: &[Category]) -> Vec<ComparisonRow> {
    categories
        .iter()
        .flat_map(|c| Comparator::compare_union(a, b, c.key()).rows)
        .collect()
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_locales(loader: &LocaleLoader) -> Result<()> {
    let locales = loader.available_locales();
    for locale in &locales {
        println!("{}", locale);
    }
    eprintln!("✓ {} locales", locales.len());
    Ok(())
}

fn run_clear_cache(config: &Config) -> Result<()> {
    let path = config.cache_db_path();
    if !path.exists() {
        println!("🧹 Cache is already empty");
        return Ok(());
    }

    let cache = SqliteCache::open(&path, config.ttl())?;
    let removed = cache.clear()?;
    info!(removed, "cache cleared");
    println!("🧹 Removed {} cached locale records", removed);
    Ok(())
}

fn run_show(
    loader: &LocaleLoader,
    locale: &str,
    category: Option<Category>,
    filter: Option<&str>,
) -> Result<()> {
    let record = loader.load(locale)?;
    let needle = filter.unwrap_or("").to_lowercase();

    for category in categories_for(category) {
        let Some(fields) = record.category(category.key()) else {
            println!("\n📂 {} (no data)", category.label());
            continue;
        };

        println!("\n📂 {} ({} fields)", category.label(), fields.len());
        for (key, value) in fields {
            if !needle.is_empty()
                && !key.to_lowercase().contains(&needle)
                && !value.to_lowercase().contains(&needle)
            {
                continue;
            }
            println!("  {} = {}", key, value);
        }
    }

    Ok(())
}

fn print_coverage(report: &CoverageReport, threshold: f64) {
    println!("📊 Coverage for {}", report.locale);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for result in &report.categories {
        let label = result
            .category
            .parse::<Category>()
            .map(|c| c.label().to_string())
            .unwrap_or_else(|_| result.category.clone());
        println!(
            "  {:<18} {:>6.1}%  ({}/{})  {}",
            label,
            result.percent,
            result.populated,
            result.expected,
            result.band().name()
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {}", report.summary());

    for low in report.low_coverage(threshold) {
        println!("⚠️  Low coverage: {} is at {:.1}%", low.category, low.percent);
    }
}

fn coverage_report(
    loader: &LocaleLoader,
    config: &Config,
    locale: &str,
    reference: &str,
    schema_path: Option<PathBuf>,
) -> Result<CoverageReport> {
    let schema = match schema_path {
        Some(path) => CategorySchema::load(&path)?,
        None => {
            let reference = loader
                .load(reference)
                .with_context(|| format!("Failed to load reference locale {}", reference))?;
            CategorySchema::from_reference(&reference)
        }
    };

    let record = loader.load(locale)?;
    let calculator = CoverageCalculator::with_threshold(config.low_coverage_threshold);
    Ok(calculator.calculate(&record, &schema))
}

fn run_coverage(
    loader: &LocaleLoader,
    config: &Config,
    locale: &str,
    reference: &str,
    schema_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let report = coverage_report(loader, config, locale, reference, schema_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_coverage(&report, config.low_coverage_threshold);
    }

    Ok(())
}

fn run_compare(
    loader: &LocaleLoader,
    a: &str,
    b: &str,
    category: Option<Category>,
    schema_path: Option<PathBuf>,
    filter: Option<&str>,
    only_missing: bool,
) -> Result<()> {
    let (ra, rb) = loader.load_pair(a, b);
    let (ra, rb) = (record_or_empty(a, ra)?, record_or_empty(b, rb)?);

    let result = match schema_path {
        Some(path) => {
            let mut schema = CategorySchema::load(&path)?;
            if let Some(c) = category {
                schema = schema.restrict_to(c.key());
            }
            Comparator::compare(&ra, &rb, &schema)
        }
        None => cldr_viewer::ComparisonResult {
            locale_a: ra.locale.to_string(),
            locale_b: rb.locale.to_string(),
            rows: union_rows(&ra, &rb, &categories_for(category)),
        },
    };

    for row in result.filtered(filter.unwrap_or("")) {
        if only_missing && !row.is_missing_against_reference() {
            continue;
        }
        let marker = match row.status {
            FieldStatus::PresentInBoth if row.same_value => "⚠️ ",
            FieldStatus::PresentInBoth => "✅",
            FieldStatus::MissingInA => "❌",
            FieldStatus::MissingInB => "➕",
            FieldStatus::MissingInBoth => "··",
        };
        println!(
            "{} {}.{}\t{}\t{}",
            marker, row.category, row.key, row.value_a, row.value_b
        );
    }

    eprintln!("✓ {}", result.summary());
    Ok(())
}

fn run_export(
    loader: &LocaleLoader,
    locale: &str,
    reference: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
    category: Option<Category>,
) -> Result<()> {
    let (ra, rb) = loader.load_pair(locale, reference);
    let (ra, rb) = (record_or_empty(locale, ra)?, record_or_empty(reference, rb)?);

    let rows = union_rows(&ra, &rb, &categories_for(category));
    let path = output.unwrap_or_else(|| PathBuf::from(format!("cldr-export.{}", format.extension())));

    let written = cldr_viewer::export_to_path(&rows, format, &path)?;
    if written == 0 {
        println!("Nothing to export");
    } else {
        println!("💾 Exported {} rows to {}", written, path.display());
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_browse(loader: LocaleLoader, locale: &str, reference: &str, threshold: f64) -> Result<()> {
    let mut app = ui::App::new(loader, locale, reference)?.with_threshold(threshold);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_browse(_loader: LocaleLoader, _locale: &str, _reference: &str, _threshold: f64) -> Result<()> {
    eprintln!("❌ Browse mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cldr_viewer::MemorySource;

    const SV_TERRITORIES: &str = r#"{ "main": { "sv": {
        "localeDisplayNames": { "territories": { "SE": "Sverige", "DK": "Danmark" } }
    } } }"#;
    const EN_TERRITORIES: &str = r#"{ "main": { "en": {
        "localeDisplayNames": { "territories": { "SE": "Sweden", "DK": "Denmark", "AX": "Åland Islands" } }
    } } }"#;

    fn loader() -> LocaleLoader {
        let source = MemorySource::new()
            .with_document("sv", Category::Territories, SV_TERRITORIES)
            .with_document("en", Category::Territories, EN_TERRITORIES);
        LocaleLoader::new(Box::new(source), Box::new(MemoryCache::new()))
    }

    #[test]
    fn test_coverage_against_reference_locale() {
        let report = coverage_report(&loader(), &Config::default(), "sv", "en", None).unwrap();

        assert_eq!(report.locale, "sv");
        assert_eq!(report.categories.len(), Category::ALL.len());
        assert_eq!(report.get("territories").unwrap().percent, 66.7);
        assert_eq!(report.get("units").unwrap().expected, 0);

        assert!(run_coverage(&loader(), &Config::default(), "sv", "en", None, true).is_ok());
    }

    #[test]
    fn test_coverage_against_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"territories": ["localeDisplayNames.territories.SE", "localeDisplayNames.territories.NO"]}"#,
        )
        .unwrap();

        // Reference is never loaded when a schema file is given
        let report =
            coverage_report(&loader(), &Config::default(), "sv", "missing", Some(path)).unwrap();

        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.overall_percent, 50.0);
    }

    #[test]
    fn test_coverage_unknown_reference_is_error() {
        let err = coverage_report(&loader(), &Config::default(), "sv", "fi", None).unwrap_err();
        assert!(err.to_string().contains("reference locale fi"));
    }

    #[test]
    fn test_export_writes_union_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sv.csv");

        run_export(
            &loader(),
            "sv",
            "en",
            ExportFormat::Csv,
            Some(path.clone()),
            Some(Category::Territories),
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("localeDisplayNames.territories.AX,,Åland Islands,missing-in-a,true"));
    }

    #[test]
    fn test_failed_locale_becomes_empty_record() {
        let loader = loader();
        let (a, b) = loader.load_pair("fi", "en");

        let a = record_or_empty("fi", a).unwrap();
        let b = record_or_empty("en", b).unwrap();
        assert!(a.is_empty());
        assert_eq!(a.locale.as_str(), "fi");

        let rows = union_rows(&a, &b, &categories_for(None));
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.is_missing_in_a()));
    }

    #[test]
    fn test_loader_needs_a_data_source() {
        let err = build_loader(&Config::default(), true).err().unwrap();
        assert!(err.to_string().contains("no CLDR data configured"));

        let config = Config {
            data_dir: Some(PathBuf::from("/nonexistent/cldr-json")),
            ..Config::default()
        };
        assert!(build_loader(&config, true).is_err());
    }
}
