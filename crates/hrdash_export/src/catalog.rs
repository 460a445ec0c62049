use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

/// One exportable attribute of a row collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required,
        }
    }

    pub fn required(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, true)
    }

    pub fn optional(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, false)
    }
}

// ---------------------------------------------------------------------------
// FieldCatalog
// ---------------------------------------------------------------------------

/// Ordered list of exportable fields for one report type.
///
/// Order matters: it is the default CSV column order and the fixed column
/// order of the print document. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FieldCatalog {
    fields: Vec<FieldSpec>,
}

impl FieldCatalog {
    /// Build a catalog, rejecting duplicate keys.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.key.is_empty() {
                return Err(ExportError::InvalidCatalog("empty field key".into()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(ExportError::InvalidCatalog(format!(
                    "duplicate key `{}`",
                    field.key
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Parse a catalog from a JSON array of `{key, label, required}` objects.
    pub fn from_json(input: &str) -> Result<Self> {
        let fields: Vec<FieldSpec> = serde_json::from_str(input)?;
        if fields.is_empty() {
            return Err(ExportError::InvalidCatalog("catalog has no fields".into()));
        }
        Self::new(fields)
    }

    /// Load a JSON catalog from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether `key` names a mandatory field. Unknown keys are not required.
    pub fn is_required(&self, key: &str) -> bool {
        self.get(key).is_some_and(|f| f.required)
    }

    /// Header label for `key`. Keys outside the catalog use the key itself.
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map_or(key, |f| f.label.as_str())
    }

    /// All keys in catalog order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.key.clone()).collect()
    }

    /// Keys of the mandatory fields, in catalog order.
    pub fn required_keys(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.clone())
            .collect()
    }

    /// All labels in catalog order.
    pub fn labels(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.label.as_str()).collect()
    }
}

impl TryFrom<Vec<FieldSpec>> for FieldCatalog {
    type Error = ExportError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<FieldCatalog> for Vec<FieldSpec> {
    fn from(catalog: FieldCatalog) -> Self {
        catalog.fields
    }
}
