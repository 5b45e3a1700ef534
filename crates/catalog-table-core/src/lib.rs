//! Core engine for metadata-tagged, column-oriented tables.
//!
//! This crate provides the foundational pieces for `catalog-table-format`:
//!
//! - Strongly-typed provenance records for tables ([`TableMeta`]) and for
//!   individual columns ([`VariableMeta`]: title, unit, sources, licenses and
//!   an append-only processing log) (`metadata` module).
//! - A per-table [`MetadataStore`] that columns read and write through, so
//!   metadata follows renames, copies and slices (`metadata::store`).
//! - Lineage-aware column arithmetic that merges the operands' metadata
//!   instead of dropping it (`column` and `merge` modules).
//! - A [`Table`] abstraction over an Arrow `RecordBatch` with an ordered
//!   primary key (`table` module).
//! - A two-file persistence codec: a plain data file (CSV, Arrow IPC or
//!   Parquet) plus a `.meta.json` sidecar (`codec` module).
//!
//! Higher-level entry points (for example, the `catalog-table-format` facade)
//! are expected to depend on this core crate rather than re-implementing the
//! propagation rules.
#![deny(missing_docs)]
pub mod codec;
pub mod column;
pub mod merge;
pub mod metadata;
pub mod naming;
pub mod table;

pub use codec::{CodecError, DataFormat, FormatError, SidecarError, TableCodec, sidecar_path};
pub use column::{Column, ColumnError};
pub use merge::{MergeOutcome, MergedField, Operand, Operation, Scalar, SchemaWarning};
pub use metadata::{
    License, MetadataStore, ProcessingStep, SharedStore, Source, TableMeta, TableSchema,
    TableSchemaError, VariableMeta,
};
pub use naming::{NamingError, UNNAMED_VARIABLE};
pub use table::{ColumnValue, Table, TableError};
