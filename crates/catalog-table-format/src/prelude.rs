//! Wrapper prelude.
//!
//! The `catalog-table-format` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::codec::{CodecError, DataFormat, TableCodec};
pub use crate::merge::{Operation, Scalar, SchemaWarning};
pub use crate::{
    Column, ColumnError, ColumnValue, License, ProcessingStep, Source, Table, TableError,
    TableMeta, TableSchema, VariableMeta,
};
