//! # catalog-table-format
//!
//! Column-oriented tables whose columns keep their provenance metadata
//! (title, unit, sources, licenses, processing log) through arithmetic,
//! renames, slices and persistence.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalog_table_format::prelude::*;
//!
//! let mut table = Table::read_csv("gdp.csv")?;
//! let ratio = table.column("gdp")?.divide(&table.column("pop")?)?;
//! table.assign_column("gdp_per_capita", ratio)?;
//! table.to_csv("gdp_per_capita.csv")?;
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Persistence namespace: data formats and the sidecar codec.
pub mod codec {
    pub use catalog_table_core::codec::{
        CodecError, DataFormat, FormatError, SidecarError, TableCodec, sidecar_path,
    };
}

/// Lineage namespace: operands, operations and merge results.
pub mod merge {
    pub use catalog_table_core::merge::{
        MergeOutcome, MergedField, Operand, Operation, Scalar, SchemaWarning, combine_metadata,
    };
}

pub use catalog_table_core::column::{Column, ColumnError};
pub use catalog_table_core::metadata::{
    License, MetadataStore, ProcessingStep, Source, TableMeta, TableSchema, TableSchemaError,
    VariableMeta,
};
pub use catalog_table_core::naming::{NamingError, UNNAMED_VARIABLE, underscore, validate_snake_case};
pub use catalog_table_core::table::{ColumnValue, Table, TableError};
