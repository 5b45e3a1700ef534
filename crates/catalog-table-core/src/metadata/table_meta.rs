//! Table-level metadata and the schema of recognized sidecar properties.
//!
//! [`TableMeta`] is opaque to the propagation engine: it is carried through
//! slices and copies and round-tripped through the sidecar, nothing more.
//! [`TableSchema`] replaces a process-wide property list with an explicit value
//! that is validated once, when it is built, and then handed to the codec.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::prelude::*;

/// Sidecar keys owned by the codec; never table properties.
pub(crate) const RESERVED_SIDECAR_KEYS: [&str; 2] = ["primary_key", "fields"];

/// Dataset identity for a whole table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableMeta {
    /// Short, snake_case identifier of the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer description of the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Namespace the dataset belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Dataset version, e.g. `2024-01-15`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Additional properties recognized by a custom [`TableSchema`].
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TableMeta {
    /// Names of the typed properties, in serialization order.
    pub const TYPED_FIELDS: [&'static str; 5] =
        ["short_name", "title", "description", "namespace", "version"];

    /// Convenience constructor setting only the short name.
    pub fn named(short_name: impl Into<String>) -> Self {
        TableMeta {
            short_name: Some(short_name.into()),
            ..Default::default()
        }
    }
}

/// Errors produced while building a [`TableSchema`].
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum TableSchemaError {
    /// The schema lists no properties at all.
    #[snafu(display("table schema must recognize at least one property"))]
    NoProperties,

    /// A JSON Schema document lacked a `properties` object.
    #[snafu(display("JSON schema document has no \"properties\" object"))]
    MissingPropertiesObject,

    /// A property was listed twice.
    #[snafu(display("table schema lists property '{name}' more than once"))]
    DuplicateProperty {
        /// The repeated property name.
        name: String,
    },

    /// A property collides with a key the sidecar codec owns.
    #[snafu(display("'{name}' is reserved by the sidecar format and cannot be a table property"))]
    ReservedProperty {
        /// The reserved name.
        name: String,
    },
}

/// The set of top-level table properties a sidecar may contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    properties: Vec<String>,
}

impl TableSchema {
    /// Schema recognizing exactly the typed [`TableMeta`] fields.
    pub fn builtin() -> Self {
        TableSchema {
            properties: TableMeta::TYPED_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build a schema from an explicit property list.
    pub fn new<I, S>(properties: I) -> Result<Self, TableSchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        ensure!(!properties.is_empty(), NoPropertiesSnafu);

        let mut seen = HashSet::new();
        for name in &properties {
            ensure!(
                !RESERVED_SIDECAR_KEYS.contains(&name.as_str()),
                ReservedPropertySnafu { name }
            );
            ensure!(seen.insert(name.as_str()), DuplicatePropertySnafu { name });
        }

        Ok(TableSchema { properties })
    }

    /// Build a schema from the keys of a JSON Schema document's `properties`.
    pub fn from_json_schema(doc: &Value) -> Result<Self, TableSchemaError> {
        let props = doc
            .get("properties")
            .and_then(Value::as_object)
            .context(MissingPropertiesObjectSnafu)?;
        TableSchema::new(props.keys().cloned())
    }

    /// Whether `name` is a recognized table property.
    pub fn recognizes(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    /// Recognized property names, in declaration order.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        TableSchema::builtin()
    }
}
