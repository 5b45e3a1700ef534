//! Error types and SNAFU context selectors for `table`.
//!
//! Every fallible table mutation validates its inputs before touching any
//! field, so an error here means the table is exactly as it was.

use arrow::error::ArrowError;
use snafu::prelude::*;

use crate::naming::NamingError;

/// Errors from table-level operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    /// The named column does not exist.
    #[snafu(display("column '{name}' not found"))]
    ColumnNotFound {
        /// The missing column name.
        name: String,
    },

    /// A rename would overwrite an existing column.
    #[snafu(display("column '{name}' already exists"))]
    ColumnExists {
        /// The conflicting column name.
        name: String,
    },

    /// Column names must be non-empty.
    #[snafu(display("column name must not be empty"))]
    EmptyName,

    /// The assigned values do not match the table's row count.
    #[snafu(display("column '{name}' has {actual} values but the table has {expected} rows"))]
    LengthMismatch {
        /// Column being assigned.
        name: String,
        /// Table row count.
        expected: usize,
        /// Length of the assigned values.
        actual: usize,
    },

    /// A primary key listed the same column twice.
    #[snafu(display("column '{name}' appears more than once in the primary key"))]
    DuplicateKey {
        /// The repeated key column.
        name: String,
    },

    /// Two columns would end up with the same name.
    #[snafu(display("columns '{first}' and '{second}' would both be named '{name}'"))]
    NameCollision {
        /// The colliding target name.
        name: String,
        /// First source column.
        first: String,
        /// Second source column.
        second: String,
    },

    /// A column name could not be normalized.
    #[snafu(display("invalid column name: {source}"))]
    Naming {
        /// Underlying naming error.
        source: NamingError,
    },

    /// Arrow rejected the resulting record batch or a kernel failed.
    #[snafu(display("Arrow error while reshaping table: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}
