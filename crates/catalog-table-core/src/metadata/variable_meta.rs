//! Column-level provenance records.
//!
//! A [`VariableMeta`] travels with a column through slicing, renaming and
//! arithmetic. Unknown values are `None`, never an empty string, so "we do not
//! know the unit" stays distinguishable from "the unit is known to be empty".
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where the data in a column came from.
///
/// Two sources are the same source only if every field matches; this is what
/// metadata merging deduplicates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct Source {
    /// Short name of the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description of the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Landing page of the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Direct link to the raw data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_data_url: Option<String>,
    /// Link to the republished copy of the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owid_data_url: Option<String>,
    /// Day the data was retrieved, stored as `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_accessed: Option<NaiveDate>,
    /// Day the data was published, stored as `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    /// Year of publication when no exact date is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    /// Organization or author that published the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_by: Option<String>,
}

/// License under which the data in a column is distributed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct License {
    /// License name, e.g. `CC BY 4.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Link to the license text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One derivation event in a column's lineage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProcessingStep {
    /// Name of the column the step produced.
    pub variable: String,
    /// Operands, as column names or the string form of scalars.
    pub parents: Vec<String>,
    /// Operation tag, e.g. `+` or `fillna`.
    pub operation: String,
}

impl ProcessingStep {
    /// Replace every occurrence of `from` with `to` in all text of this step.
    pub(crate) fn replace_text(&mut self, from: &str, to: &str) {
        self.variable = self.variable.replace(from, to);
        for parent in &mut self.parents {
            *parent = parent.replace(from, to);
        }
        self.operation = self.operation.replace(from, to);
    }
}

/// Provenance metadata for a single column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VariableMeta {
    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer description of what the column measures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Physical unit, e.g. `people`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Abbreviated unit for display, e.g. `$`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_unit: Option<String>,
    /// Ordered list of sources.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Ordered list of licenses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<License>,
    /// Append-only lineage trail.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub processing_log: Vec<ProcessingStep>,
}

impl VariableMeta {
    /// Replace the placeholder `from` with `to` throughout the processing log.
    pub(crate) fn rename_in_processing_log(&mut self, from: &str, to: &str) {
        for step in &mut self.processing_log {
            step.replace_text(from, to);
        }
    }
}
