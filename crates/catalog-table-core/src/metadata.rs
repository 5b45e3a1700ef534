//! Metadata layer.
//!
//! This module groups the durable provenance model (column-level
//! [`VariableMeta`] and table-level [`TableMeta`]), the per-table
//! [`MetadataStore`] that columns resolve their metadata through, and the
//! [`TableSchema`] describing which table-level properties a sidecar may carry.

pub mod store;
pub mod table_meta;
pub mod variable_meta;

pub use store::{MetadataStore, SharedStore};
pub use table_meta::{TableMeta, TableSchema, TableSchemaError};
pub use variable_meta::{License, ProcessingStep, Source, VariableMeta};
