// 📐 Category Schema
// What a locale is expected to contain: category -> expected field keys.
// The schema is the denominator for coverage and the alignment grid for
// comparisons.

use crate::category::Category;
use crate::error::{CldrError, Result};
use crate::record::LocaleRecord;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    pub name: String,
    pub fields: BTreeSet<String>,
}

/// Ordered set of categories; iteration order is insertion order so results
/// come out deterministic. Schemas built by `from_reference` and `from_json`
/// put catalog categories first, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySchema {
    categories: Vec<CategorySpec>,
}

impl CategorySchema {
    pub fn new() -> Self {
        CategorySchema::default()
    }

    /// Builder: add (or replace) a category
    pub fn with_category<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, fields: BTreeSet<String>) {
        let name = name.into();
        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.fields = fields,
            None => self.categories.push(CategorySpec { name, fields }),
        }
    }

    /// Derive the schema from a reference locale: every key the reference has
    /// is expected, even if its value there is empty. Every catalog category
    /// is listed, in catalog order; one the reference lacks expects nothing.
    pub fn from_reference(reference: &LocaleRecord) -> Self {
        let mut schema = CategorySchema::new();

        for category in Category::ALL {
            let fields = reference
                .category(category.key())
                .map(|f| f.keys().cloned().collect())
                .unwrap_or_default();
            schema.insert(category.key(), fields);
        }

        for (name, fields) in &reference.categories {
            if schema.contains(name) {
                continue;
            }
            schema.insert(name.clone(), fields.keys().cloned().collect());
        }

        schema
    }

    /// Parse `{"category": ["key", ...], ...}`. JSON objects carry no order,
    /// so catalog categories come first, then the rest by name.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CldrError::parse("schema", e))?;

        let map = value
            .as_object()
            .ok_or_else(|| CldrError::parse("schema", "expected an object of category arrays"))?;

        let mut schema = CategorySchema::new();
        for (name, keys) in map {
            let keys = keys.as_array().ok_or_else(|| {
                CldrError::parse("schema", format!("category '{}' must be an array", name))
            })?;

            let mut fields = BTreeSet::new();
            for key in keys {
                let key = key.as_str().ok_or_else(|| {
                    CldrError::parse("schema", format!("non-string key in category '{}'", name))
                })?;
                fields.insert(key.to_string());
            }
            schema.insert(name.clone(), fields);
        }

        schema.categories.sort_by_key(|c| catalog_rank(&c.name));
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CldrError::Source(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for spec in &self.categories {
            map.insert(
                spec.name.clone(),
                Value::Array(spec.fields.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(map)
    }

    /// Keep only the named category
    pub fn restrict_to(&self, name: &str) -> Self {
        CategorySchema {
            categories: self
                .categories
                .iter()
                .filter(|c| c.name == name)
                .cloned()
                .collect(),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategorySpec> {
        self.categories.iter()
    }

    pub fn fields(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.fields)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    pub fn total_expected(&self) -> usize {
        self.categories.iter().map(|c| c.fields.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Position in the catalog; unknown categories sort after all known ones
fn catalog_rank(name: &str) -> usize {
    Category::ALL
        .iter()
        .position(|c| c.key() == name)
        .unwrap_or(Category::ALL.len())
}
