// 📚 Category Catalog
// The CLDR categories this tool knows about, and where each one lives in the
// cldr-json distribution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "dates")]
    Dates,
    #[serde(rename = "dateFields")]
    DateFields,
    #[serde(rename = "currencies")]
    Currencies,
    #[serde(rename = "units")]
    Units,
    #[serde(rename = "timeZoneNames")]
    TimeZoneNames,
    #[serde(rename = "languages")]
    Languages,
    #[serde(rename = "territories")]
    Territories,
}

impl Category {
    /// Catalog order, which is also display order
    pub const ALL: [Category; 7] = [
        Category::Dates,
        Category::DateFields,
        Category::Currencies,
        Category::Units,
        Category::TimeZoneNames,
        Category::Languages,
        Category::Territories,
    ];

    /// Key used in records, schemas and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Category::Dates => "dates",
            Category::DateFields => "dateFields",
            Category::Currencies => "currencies",
            Category::Units => "units",
            Category::TimeZoneNames => "timeZoneNames",
            Category::Languages => "languages",
            Category::Territories => "territories",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Dates => "Date Formats",
            Category::DateFields => "Date Fields",
            Category::Currencies => "Currencies",
            Category::Units => "Units",
            Category::TimeZoneNames => "Time Zone Names",
            Category::Languages => "Language Names",
            Category::Territories => "Territory Names",
        }
    }

    /// cldr-json package holding this category
    pub fn package(&self) -> &'static str {
        match self {
            Category::Dates | Category::DateFields | Category::TimeZoneNames => "cldr-dates-full",
            Category::Currencies => "cldr-numbers-full",
            Category::Units => "cldr-units-full",
            Category::Languages | Category::Territories => "cldr-localenames-full",
        }
    }

    /// Per-locale document name inside the package
    pub fn file_name(&self) -> &'static str {
        match self {
            Category::Dates => "ca-gregorian.json",
            Category::DateFields => "dateFields.json",
            Category::Currencies => "currencies.json",
            Category::Units => "units.json",
            Category::TimeZoneNames => "timeZoneNames.json",
            Category::Languages => "languages.json",
            Category::Territories => "territories.json",
        }
    }

    /// Path of this category's document for `locale`, relative to the
    /// cldr-json root: `<package>/main/<locale>/<file>`
    pub fn document_path(&self, locale: &str) -> String {
        format!("{}/main/{}/{}", self.package(), locale, self.file_name())
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts the record key case-insensitively ("timezonenames" works too)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
                format!("unknown category '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_paths() {
        assert_eq!(
            Category::Dates.document_path("sv"),
            "cldr-dates-full/main/sv/ca-gregorian.json"
        );
        assert_eq!(
            Category::Currencies.document_path("en-GB"),
            "cldr-numbers-full/main/en-GB/currencies.json"
        );
        assert_eq!(
            Category::Territories.document_path("fi"),
            "cldr-localenames-full/main/fi/territories.json"
        );
    }

    #[test]
    fn test_parse_category() {
        assert_eq!("timeZoneNames".parse::<Category>().unwrap(), Category::TimeZoneNames);
        assert_eq!("DATEFIELDS".parse::<Category>().unwrap(), Category::DateFields);
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn test_cycle_wraps_around() {
        assert_eq!(Category::Territories.next(), Category::Dates);
        assert_eq!(Category::Dates.previous(), Category::Territories);

        let mut c = Category::Dates;
        for _ in 0..Category::ALL.len() {
            c = c.next();
        }
        assert_eq!(c, Category::Dates);
    }

    #[test]
    fn test_keys_match_serde_names() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.key()));
        }
    }
}
