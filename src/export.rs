// 💾 Export - comparison rows to CSV or JSON

use crate::compare::ComparisonRow;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{}' (csv or json)", other)),
        }
    }
}

/// One exported line: the locale's value next to the reference value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub category: String,
    pub key: String,
    pub value: String,
    pub reference: String,
    pub status: String,
    pub missing: bool,
}

impl From<&ComparisonRow> for ExportRow {
    fn from(row: &ComparisonRow) -> Self {
        ExportRow {
            category: row.category.clone(),
            key: row.key.clone(),
            value: row.value_a.clone(),
            reference: row.value_b.clone(),
            status: row.status.name().to_string(),
            missing: row.is_missing_against_reference(),
        }
    }
}

/// Write rows to `writer`; returns how many were written
pub fn write_rows<'a, W, I>(rows: I, format: ExportFormat, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ComparisonRow>,
{
    let rows: Vec<ExportRow> = rows.into_iter().map(ExportRow::from).collect();
    if rows.is_empty() {
        return Ok(0);
    }

    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            for row in &rows {
                wtr.serialize(row).context("Failed to write CSV row")?;
            }
            wtr.flush().context("Failed to flush CSV output")?;
        }
        ExportFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &rows).context("Failed to write JSON")?;
            writeln!(writer)?;
        }
    }

    Ok(rows.len())
}

/// Export to a file. Nothing is created when there are no rows.
pub fn export_to_path<'a, I>(rows: I, format: ExportFormat, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a ComparisonRow>,
{
    let rows: Vec<&ComparisonRow> = rows.into_iter().collect();
    if rows.is_empty() {
        return Ok(0);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let written = write_rows(rows, format, &mut writer)?;
    writer.flush()?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Comparator;
    use crate::locale::LocaleId;
    use crate::record::LocaleRecord;

    fn rows() -> Vec<ComparisonRow> {
        let sv = LocaleRecord::new(LocaleId::parse("sv").unwrap())
            .with_field("territories", "SE", "Sverige");
        let en = LocaleRecord::new(LocaleId::parse("en").unwrap())
            .with_field("territories", "SE", "Sweden")
            .with_field("territories", "AX", "Åland Islands");

        Comparator::compare_union(&sv, &en, "territories").rows
    }

    #[test]
    fn test_csv_export() {
        let rows = rows();
        let mut out = Vec::new();

        let written = write_rows(&rows, ExportFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(written, 2);
        assert_eq!(lines[0], "category,key,value,reference,status,missing");
        assert_eq!(lines[1], "territories,AX,,Åland Islands,missing-in-a,true");
        assert_eq!(lines[2], "territories,SE,Sverige,Sweden,present,false");
    }

    #[test]
    fn test_json_export() {
        let rows = rows();
        let mut out = Vec::new();

        write_rows(&rows, ExportFormat::Json, &mut out).unwrap();
        let parsed: Vec<ExportRow> = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].missing);
        assert_eq!(parsed[1].value, "Sverige");
        assert_eq!(parsed[1].reference, "Sweden");
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cldr-export.csv");

        let written = export_to_path(&Vec::<ComparisonRow>::new(), ExportFormat::Csv, &path).unwrap();

        assert_eq!(written, 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cldr-export.json");

        let written = export_to_path(&rows(), ExportFormat::Json, &path).unwrap();

        assert_eq!(written, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Åland Islands"));
    }

    #[test]
    fn test_missing_when_reference_key_is_empty() {
        let sv = LocaleRecord::new(LocaleId::parse("sv").unwrap())
            .with_field("territories", "SE", "Sverige");
        let en = LocaleRecord::new(LocaleId::parse("en").unwrap())
            .with_field("territories", "SE", "Sweden")
            .with_field("territories", "XK", "");
        let rows = Comparator::compare_union(&sv, &en, "territories").rows;

        let exported: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();

        assert_eq!(exported[1].key, "XK");
        assert_eq!(exported[1].status, "missing-in-both");
        assert!(exported[1].missing);
        assert!(!exported[0].missing);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Json.extension(), "json");
    }
}
