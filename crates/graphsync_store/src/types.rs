//! Row types persisted by the store.
//!
//! Rows carry storage-assigned numeric IDs. A zero ID means the row has not
//! been persisted yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form options map used by fields and blocks.
pub type Options = Map<String, Value>;

/// Creation, update and deletion times of a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTimestamps {
    /// When the row was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the row was last updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// When the row was soft-deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A namespace groups modules, pages and charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// URL-safe handle.
    #[serde(default)]
    pub slug: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the namespace is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Free-form metadata.
    #[serde(default)]
    pub meta: Value,
    /// Row timestamps.
    #[serde(default, flatten)]
    pub timestamps: RowTimestamps,
}

/// A module describes the shape of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// Owning namespace.
    #[serde(default)]
    pub namespace_id: u64,
    /// Handle, unique within the namespace.
    #[serde(default)]
    pub handle: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form metadata.
    #[serde(default)]
    pub meta: Value,
    /// Field definitions, ordered by `place`.
    #[serde(default)]
    pub fields: Vec<ModuleField>,
    /// Row timestamps.
    #[serde(default, flatten)]
    pub timestamps: RowTimestamps,
}

impl Module {
    /// Returns the field with the given name.
    pub fn field(&self, name: &str) -> Option<&ModuleField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single field definition of a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleField {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// Owning module.
    #[serde(default)]
    pub module_id: u64,
    /// Field kind (String, Number, Record, ...).
    #[serde(default)]
    pub kind: String,
    /// Field name, unique within the module.
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Kind specific options.
    #[serde(default)]
    pub options: Options,
    /// Whether a value is required.
    #[serde(default)]
    pub required: bool,
    /// Whether the field holds multiple values.
    #[serde(default)]
    pub multi: bool,
    /// Position within the module.
    #[serde(default)]
    pub place: u32,
}

/// A record holds values for the fields of one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// Module the record belongs to.
    #[serde(default)]
    pub module_id: u64,
    /// Namespace the record belongs to.
    #[serde(default)]
    pub namespace_id: u64,
    /// Field values.
    #[serde(default)]
    pub values: Vec<RecordValue>,
    /// Row timestamps.
    #[serde(default, flatten)]
    pub timestamps: RowTimestamps,
    /// Creating user.
    #[serde(default)]
    pub created_by: u64,
    /// Last updating user.
    #[serde(default)]
    pub updated_by: u64,
    /// Deleting user.
    #[serde(default)]
    pub deleted_by: u64,
    /// Owning user.
    #[serde(default)]
    pub owned_by: u64,
}

impl Record {
    /// Returns the value stored under the given field name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }
}

/// One value of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValue {
    /// Field name.
    pub name: String,
    /// Raw value.
    pub value: String,
    /// Position for multi-value fields.
    #[serde(default)]
    pub place: u32,
}

/// A page of the compose UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// Owning namespace.
    #[serde(default)]
    pub namespace_id: u64,
    /// Module for record pages, zero otherwise.
    #[serde(default)]
    pub module_id: u64,
    /// Parent page, zero for top level pages.
    #[serde(default)]
    pub self_id: u64,
    /// Handle, unique within the namespace.
    #[serde(default)]
    pub handle: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page description.
    #[serde(default)]
    pub description: String,
    /// Whether the page is shown in navigation.
    #[serde(default)]
    pub visible: bool,
    /// Ordering weight.
    #[serde(default)]
    pub weight: i32,
    /// Page blocks.
    #[serde(default)]
    pub blocks: Vec<PageBlock>,
    /// Row timestamps.
    #[serde(default, flatten)]
    pub timestamps: RowTimestamps,
}

/// A block placed on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    /// Block kind (RecordList, Chart, Calendar, ...).
    pub kind: String,
    /// Block title.
    #[serde(default)]
    pub title: String,
    /// Kind specific options.
    #[serde(default)]
    pub options: Options,
    /// Presentation hints.
    #[serde(default)]
    pub style: Options,
}

/// A chart definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// Owning namespace.
    #[serde(default)]
    pub namespace_id: u64,
    /// Handle, unique within the namespace.
    #[serde(default)]
    pub handle: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Chart configuration.
    #[serde(default)]
    pub config: ChartConfig,
    /// Row timestamps.
    #[serde(default, flatten)]
    pub timestamps: RowTimestamps,
}

/// Chart configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Data reports drawn by the chart.
    #[serde(default)]
    pub reports: Vec<ChartReport>,
}

/// A single data report of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartReport {
    /// Module the report reads from.
    #[serde(default)]
    pub module_id: u64,
    /// Record filter expression.
    #[serde(default)]
    pub filter: String,
    /// Metric definitions.
    #[serde(default)]
    pub metrics: Vec<Value>,
    /// Dimension definitions.
    #[serde(default)]
    pub dimensions: Vec<Value>,
}

/// A system user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row ID.
    #[serde(default)]
    pub id: u64,
    /// Handle.
    #[serde(default)]
    pub handle: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_field_lookup() {
        let module = Module {
            fields: vec![
                ModuleField {
                    name: "first_name".into(),
                    ..Default::default()
                },
                ModuleField {
                    name: "email".into(),
                    place: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert_eq!(module.field("email").map(|f| f.place), Some(1));
        assert!(module.field("missing").is_none());
    }

    #[test]
    fn record_value_lookup() {
        let record = Record {
            values: vec![RecordValue {
                name: "email".into(),
                value: "a@example.com".into(),
                place: 0,
            }],
            ..Default::default()
        };

        assert_eq!(record.value("email"), Some("a@example.com"));
        assert_eq!(record.value("phone"), None);
    }

    #[test]
    fn page_deserializes_with_defaults() {
        let page: Page = serde_json::from_str(
            r#"{"handle":"home","blocks":[{"kind":"RecordList","options":{"module":"contacts"}}]}"#,
        )
        .unwrap();

        assert_eq!(page.id, 0);
        assert_eq!(page.handle, "home");
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].options["module"], "contacts");
        assert!(page.timestamps.created_at.is_none());
    }
}
