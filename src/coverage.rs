// 📊 Coverage Calculator
// How much of the expected CLDR data a locale actually provides, per category.
//
//   percent = populated / expected * 100   (rounded to one decimal)
//
// A field counts as populated only when its value is non-empty after trimming.

use crate::record::LocaleRecord;
use crate::schema::CategorySchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default threshold below which a category is reported as low coverage
pub const DEFAULT_LOW_COVERAGE_THRESHOLD: f64 = 50.0;

// ============================================================================
// COVERAGE BAND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageBand {
    Complete, // >= 95%
    Good,     // >= 70%
    Partial,  // >= 40%
    Poor,     // anything above zero
    Empty,    // nothing at all
}

impl CoverageBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 95.0 {
            CoverageBand::Complete
        } else if percent >= 70.0 {
            CoverageBand::Good
        } else if percent >= 40.0 {
            CoverageBand::Partial
        } else if percent > 0.0 {
            CoverageBand::Poor
        } else {
            CoverageBand::Empty
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CoverageBand::Complete => "complete",
            CoverageBand::Good => "good",
            CoverageBand::Partial => "partial",
            CoverageBand::Poor => "poor",
            CoverageBand::Empty => "empty",
        }
    }
}

// ============================================================================
// COVERAGE RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub category: String,
    pub populated: usize,
    pub expected: usize,
    pub percent: f64,
    /// Expected keys that are absent or empty, sorted
    pub missing_keys: Vec<String>,
}

impl CoverageResult {
    pub fn missing(&self) -> usize {
        self.expected - self.populated
    }

    pub fn band(&self) -> CoverageBand {
        CoverageBand::from_percent(self.percent)
    }

    pub fn is_complete(&self) -> bool {
        self.expected > 0 && self.populated == self.expected
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub locale: String,
    pub categories: Vec<CoverageResult>,
    pub populated: usize,
    pub expected: usize,
    pub overall_percent: f64,
}

impl CoverageReport {
    pub fn get(&self, category: &str) -> Option<&CoverageResult> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Categories with some but too little data (0 < percent < threshold)
    pub fn low_coverage(&self, threshold: f64) -> Vec<&CoverageResult> {
        self.categories
            .iter()
            .filter(|c| c.percent > 0.0 && c.percent < threshold)
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Coverage for {}: {:.1}% ({}/{}) across {} categories, {} complete",
            self.locale,
            self.overall_percent,
            self.populated,
            self.expected,
            self.categories.len(),
            self.categories.iter().filter(|c| c.is_complete()).count()
        )
    }
}

// ============================================================================
// COVERAGE CALCULATOR
// ============================================================================

pub struct CoverageCalculator {
    /// Categories under this percentage are logged as low coverage
    pub low_coverage_threshold: f64,
}

impl CoverageCalculator {
    pub fn new() -> Self {
        CoverageCalculator {
            low_coverage_threshold: DEFAULT_LOW_COVERAGE_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        CoverageCalculator {
            low_coverage_threshold: threshold.clamp(0.0, 100.0),
        }
    }

    /// Coverage of a single schema category. A category missing from the
    /// record is simply 0% rather than an error.
    pub fn category_coverage(
        &self,
        record: &LocaleRecord,
        category: &str,
        expected_keys: &std::collections::BTreeSet<String>,
    ) -> CoverageResult {
        let mut populated = 0;
        let mut missing_keys = Vec::new();

        for key in expected_keys {
            if record.is_populated(category, key) {
                populated += 1;
            } else {
                missing_keys.push(key.clone());
            }
        }

        let expected = expected_keys.len();

        CoverageResult {
            category: category.to_string(),
            populated,
            expected,
            percent: percent(populated, expected),
            missing_keys,
        }
    }

    pub fn calculate(&self, record: &LocaleRecord, schema: &CategorySchema) -> CoverageReport {
        let categories: Vec<CoverageResult> = schema
            .categories()
            .map(|spec| self.category_coverage(record, &spec.name, &spec.fields))
            .collect();

        let populated = categories.iter().map(|c| c.populated).sum();
        let expected = categories.iter().map(|c| c.expected).sum();

        let report = CoverageReport {
            locale: record.locale.to_string(),
            categories,
            populated,
            expected,
            overall_percent: percent(populated, expected),
        };

        debug!(locale = %report.locale, percent = report.overall_percent, "coverage computed");

        for low in report.low_coverage(self.low_coverage_threshold) {
            warn!(
                locale = %report.locale,
                category = %low.category,
                percent = low.percent,
                "low coverage"
            );
        }

        report
    }
}

impl Default for CoverageCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// populated/expected as a percentage with one decimal. Nothing expected
/// gives 0%. The rounded value only reaches 100 when every field is
/// populated, and only reaches 0 when none is.
pub fn percent(populated: usize, expected: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    let populated = populated.min(expected);
    let raw = populated as f64 / expected as f64 * 100.0;
    let rounded = (raw * 10.0).round() / 10.0;

    match populated {
        0 => 0.0,
        p if p == expected => 100.0,
        _ => rounded.clamp(0.1, 99.9),
    }
}

// ============================================================================
// TESTS
// ============================================================================
