//! Error types and SNAFU context selectors for `codec`.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::{codec::DataFormat, table::TableError};

/// A data file path whose extension does not match the requested format.
#[derive(Debug, Snafu)]
#[snafu(
    display("{format} data must use a '.{}' file, got {path}", format.extension()),
    visibility(pub(crate))
)]
pub struct FormatError {
    /// The requested format.
    pub format: DataFormat,
    /// The offending path.
    pub path: String,
}

/// Errors reading or writing the `.meta.json` sidecar.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SidecarError {
    /// No sidecar exists next to the data file.
    #[snafu(display("metadata sidecar not found: {path}"))]
    NotFound {
        /// Where the sidecar was expected.
        path: String,
    },

    /// Reading or writing the sidecar failed.
    #[snafu(display("I/O error on metadata sidecar {path}: {source}"))]
    Io {
        /// Sidecar path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The sidecar is not valid JSON, or a value has the wrong shape.
    #[snafu(display("malformed metadata sidecar {path}: {source}"))]
    Malformed {
        /// Sidecar path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The sidecar's top-level value is not a JSON object.
    #[snafu(display("metadata sidecar {path} must contain a JSON object"))]
    NotAnObject {
        /// Sidecar path.
        path: String,
    },

    /// A table-level property is not recognized by the table schema.
    #[snafu(display("unrecognized table property '{name}'"))]
    UnrecognizedField {
        /// The unrecognized property name.
        name: String,
    },

    /// Table metadata could not be converted to JSON.
    #[snafu(display("failed to encode table metadata: {source}"))]
    Encode {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors from [`TableCodec`](crate::codec::TableCodec) reads and writes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    /// The path does not match the data format.
    #[snafu(display("{source}"))]
    Extension {
        /// Underlying format error.
        source: FormatError,
    },

    /// The metadata sidecar could not be read or written.
    #[snafu(display("{source}"))]
    Sidecar {
        /// Underlying sidecar error.
        source: SidecarError,
    },

    /// Opening, creating or flushing the data file failed.
    #[snafu(display("I/O error on data file {path}: {source}"))]
    DataFile {
        /// Data file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV or Arrow IPC codec failed.
    #[snafu(display("Arrow error on data file {path}: {source}"))]
    Arrow {
        /// Data file path.
        path: String,
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// The Parquet codec failed.
    #[snafu(display("Parquet error on data file {path}: {source}"))]
    Parquet {
        /// Data file path.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// The loaded data and sidecar do not form a valid table.
    #[snafu(display("cannot assemble table: {source}"))]
    Table {
        /// Underlying table error.
        source: TableError,
    },
}
