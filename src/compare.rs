// ⚖️ Comparator
// Lines two locale records up field by field and reports which side is
// missing data. Records are only read, never modified.

use crate::record::LocaleRecord;
use crate::schema::CategorySchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// FIELD STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    PresentInBoth,
    MissingInA,
    MissingInB,
    MissingInBoth,
}

impl FieldStatus {
    pub fn from_presence(in_a: bool, in_b: bool) -> Self {
        match (in_a, in_b) {
            (true, true) => FieldStatus::PresentInBoth,
            (false, true) => FieldStatus::MissingInA,
            (true, false) => FieldStatus::MissingInB,
            (false, false) => FieldStatus::MissingInBoth,
        }
    }

    /// Status as seen with the two locales swapped
    pub fn swapped(&self) -> Self {
        match self {
            FieldStatus::MissingInA => FieldStatus::MissingInB,
            FieldStatus::MissingInB => FieldStatus::MissingInA,
            other => *other,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldStatus::PresentInBoth => "present",
            FieldStatus::MissingInA => "missing-in-a",
            FieldStatus::MissingInB => "missing-in-b",
            FieldStatus::MissingInBoth => "missing-in-both",
        }
    }
}

// ============================================================================
// COMPARISON RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    pub key: String,
    /// Value in locale A, empty when absent
    pub value_a: String,
    /// Value in locale B, empty when absent
    pub value_b: String,
    pub status: FieldStatus,
    /// Both present with identical text: often an untranslated copy
    pub same_value: bool,
    /// Key exists in A's data at all, even with an empty value
    #[serde(default)]
    pub key_in_a: bool,
    #[serde(default)]
    pub key_in_b: bool,
}

impl ComparisonRow {
    /// Missing in A while B has it; this is what a translator needs to fill
    pub fn is_missing_in_a(&self) -> bool {
        self.status == FieldStatus::MissingInA
    }

    /// B defines the key (possibly empty) and A has no usable value for it.
    /// Unlike `is_missing_in_a`, an empty reference value still counts.
    pub fn is_missing_against_reference(&self) -> bool {
        self.key_in_b
            && matches!(self.status, FieldStatus::MissingInA | FieldStatus::MissingInBoth)
    }

    /// Case-insensitive substring match over key and both values
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        self.key.to_lowercase().contains(&needle)
            || self.value_a.to_lowercase().contains(&needle)
            || self.value_b.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub locale_a: String,
    pub locale_b: String,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonResult {
    pub fn count(&self, status: FieldStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    pub fn same_value_count(&self) -> usize {
        self.rows.iter().filter(|r| r.same_value).count()
    }

    pub fn status_of(&self, category: &str, key: &str) -> Option<FieldStatus> {
        self.rows
            .iter()
            .find(|r| r.category == category && r.key == key)
            .map(|r| r.status)
    }

    pub fn filtered(&self, needle: &str) -> Vec<&ComparisonRow> {
        self.rows.iter().filter(|r| r.matches(needle)).collect()
    }

    /// Same comparison with A and B exchanged
    pub fn swapped(&self) -> ComparisonResult {
        ComparisonResult {
            locale_a: self.locale_b.clone(),
            locale_b: self.locale_a.clone(),
            rows: self
                .rows
                .iter()
                .map(|r| ComparisonRow {
                    category: r.category.clone(),
                    key: r.key.clone(),
                    value_a: r.value_b.clone(),
                    value_b: r.value_a.clone(),
                    status: r.status.swapped(),
                    same_value: r.same_value,
                    key_in_a: r.key_in_b,
                    key_in_b: r.key_in_a,
                })
                .collect(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} vs {}: {} fields, {} in both, {} missing in {}, {} missing in {}, {} identical",
            self.locale_a,
            self.locale_b,
            self.rows.len(),
            self.count(FieldStatus::PresentInBoth),
            self.count(FieldStatus::MissingInA),
            self.locale_a,
            self.count(FieldStatus::MissingInB),
            self.locale_b,
            self.same_value_count()
        )
    }
}

// ============================================================================
// COMPARATOR
// ============================================================================

pub struct Comparator;

impl Comparator {
    /// Compare along the schema. Iteration follows schema order, so the
    /// result is deterministic. Categories absent from a record count as
    /// all-missing on that side.
    pub fn compare(a: &LocaleRecord, b: &LocaleRecord, schema: &CategorySchema) -> ComparisonResult {
        let mut rows = Vec::with_capacity(schema.total_expected());

        for spec in schema.categories() {
            for key in &spec.fields {
                rows.push(Self::row(a, b, &spec.name, key));
            }
        }

        ComparisonResult {
            locale_a: a.locale.to_string(),
            locale_b: b.locale.to_string(),
            rows,
        }
    }

    /// Compare every key either record has in `category`, sorted by key.
    /// Used for browsing when there is no schema to align on.
    pub fn compare_union(a: &LocaleRecord, b: &LocaleRecord, category: &str) -> ComparisonResult {
        let mut keys: BTreeSet<&String> = BTreeSet::new();
        if let Some(fields) = a.category(category) {
            keys.extend(fields.keys());
        }
        if let Some(fields) = b.category(category) {
            keys.extend(fields.keys());
        }

        let rows = keys
            .into_iter()
            .map(|key| Self::row(a, b, category, key))
            .collect();

        ComparisonResult {
            locale_a: a.locale.to_string(),
            locale_b: b.locale.to_string(),
            rows,
        }
    }

    fn row(a: &LocaleRecord, b: &LocaleRecord, category: &str, key: &str) -> ComparisonRow {
        let in_a = a.is_populated(category, key);
        let in_b = b.is_populated(category, key);

        let value_a = a.value(category, key).unwrap_or_default().to_string();
        let value_b = b.value(category, key).unwrap_or_default().to_string();
        let same_value = in_a && in_b && value_a.trim() == value_b.trim();

        ComparisonRow {
            category: category.to_string(),
            key: key.to_string(),
            value_a,
            value_b,
            status: FieldStatus::from_presence(in_a, in_b),
            same_value,
            key_in_a: a.value(category, key).is_some(),
            key_in_b: b.value(category, key).is_some(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocaleId;

    fn record(locale: &str) -> LocaleRecord {
        LocaleRecord::new(LocaleId::parse(locale).unwrap())
    }

    fn schema() -> CategorySchema {
        CategorySchema::new()
            .with_category("timezone", ["name"])
            .with_category("currency", ["symbol", "name"])
    }

    #[test]
    fn test_missing_in_a() {
        let a = record("sv").with_field("currency", "symbol", "kr");
        let b = record("en")
            .with_field("timezone", "name", "Central European Time")
            .with_field("currency", "symbol", "SEK");

        let result = Comparator::compare(&a, &b, &schema());

        assert_eq!(result.status_of("timezone", "name"), Some(FieldStatus::MissingInA));
        assert_eq!(result.status_of("currency", "symbol"), Some(FieldStatus::PresentInBoth));
        assert_eq!(result.status_of("currency", "name"), Some(FieldStatus::MissingInBoth));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let a = record("sv").with_field("currency", "name", "");
        let b = record("en").with_field("currency", "name", "Swedish Krona");

        let result = Comparator::compare(&a, &b, &schema());
        assert_eq!(result.status_of("currency", "name"), Some(FieldStatus::MissingInA));
    }

    #[test]
    fn test_schema_order_is_kept() {
        let a = record("sv");
        let b = record("en");

        let result = Comparator::compare(&a, &b, &schema());
        let keys: Vec<(&str, &str)> = result
            .rows
            .iter()
            .map(|r| (r.category.as_str(), r.key.as_str()))
            .collect();

        assert_eq!(
            keys,
            vec![("timezone", "name"), ("currency", "name"), ("currency", "symbol")]
        );
        // Absent categories are all-missing
        assert_eq!(result.count(FieldStatus::MissingInBoth), 3);
    }

    #[test]
    fn test_swap_symmetry() {
        let a = record("sv")
            .with_field("currency", "symbol", "kr")
            .with_field("currency", "name", "svensk krona");
        let b = record("da")
            .with_field("timezone", "name", "Centraleuropæisk tid")
            .with_field("currency", "symbol", "kr");

        let ab = Comparator::compare(&a, &b, &schema());
        let ba = Comparator::compare(&b, &a, &schema());

        assert_eq!(ab.rows.len(), ba.rows.len());
        for (x, y) in ab.rows.iter().zip(ba.rows.iter()) {
            assert_eq!(x.key, y.key);
            assert_eq!(x.status.swapped(), y.status);
            assert_eq!(x.value_a, y.value_b);
            assert_eq!(x.same_value, y.same_value);
        }

        let swapped = ab.swapped();
        assert_eq!(swapped.rows, ba.rows);
        assert_eq!(swapped.locale_a, "da");
    }

    #[test]
    fn test_sources_untouched() {
        let a = record("sv").with_field("currency", "symbol", "kr");
        let b = record("en").with_field("currency", "symbol", "SEK");
        let (a_before, b_before) = (a.clone(), b.clone());

        let _ = Comparator::compare(&a, &b, &schema());
        let _ = Comparator::compare_union(&a, &b, "currency");

        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_same_value_flag() {
        let a = record("sv").with_field("currency", "symbol", "kr");
        let b = record("nb").with_field("currency", "symbol", "kr");

        let result = Comparator::compare(&a, &b, &schema());
        let row = result.rows.iter().find(|r| r.key == "symbol").unwrap();

        assert!(row.same_value);
        assert_eq!(result.same_value_count(), 1);
    }

    #[test]
    fn test_union_covers_both_sides() {
        let a = record("sv")
            .with_field("territories", "SE", "Sverige")
            .with_field("territories", "FI", "Finland");
        let b = record("en")
            .with_field("territories", "SE", "Sweden")
            .with_field("territories", "AX", "Åland Islands");

        let result = Comparator::compare_union(&a, &b, "territories");
        let keys: Vec<&str> = result.rows.iter().map(|r| r.key.as_str()).collect();

        assert_eq!(keys, vec!["AX", "FI", "SE"]);
        assert_eq!(result.status_of("territories", "AX"), Some(FieldStatus::MissingInA));
        assert_eq!(result.status_of("territories", "FI"), Some(FieldStatus::MissingInB));
        assert!(!result.rows.iter().find(|r| r.key == "FI").unwrap().same_value);
    }

    #[test]
    fn test_empty_reference_value_still_flags_missing() {
        let a = record("sv").with_field("territories", "SE", "Sverige");
        let b = record("en")
            .with_field("territories", "SE", "Sweden")
            .with_field("territories", "XK", "");

        let result = Comparator::compare_union(&a, &b, "territories");
        let xk = result.rows.iter().find(|r| r.key == "XK").unwrap();

        assert_eq!(xk.status, FieldStatus::MissingInBoth);
        assert!(xk.key_in_b);
        assert!(!xk.key_in_a);
        assert!(xk.is_missing_against_reference());
        assert!(!xk.is_missing_in_a());

        // Swapped, the key lives on the A side only
        let swapped = result.swapped();
        let xk = swapped.rows.iter().find(|r| r.key == "XK").unwrap();
        assert!(!xk.is_missing_against_reference());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let a = record("sv").with_field("territories", "SE", "Sverige");
        let b = record("en").with_field("territories", "SE", "Sweden");

        let result = Comparator::compare_union(&a, &b, "territories");

        assert_eq!(result.filtered("SWED").len(), 1);
        assert_eq!(result.filtered("sverige").len(), 1);
        assert_eq!(result.filtered("se").len(), 1);
        assert_eq!(result.filtered("").len(), 1);
        assert!(result.filtered("norge").is_empty());
    }
}
