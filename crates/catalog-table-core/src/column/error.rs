//! Error types and SNAFU context selectors for `column`.

use arrow::{datatypes::DataType, error::ArrowError};
use snafu::prelude::*;

use crate::merge::Operation;

/// Errors from column-level operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ColumnError {
    /// Arithmetic was requested on a column whose type is not numeric.
    #[snafu(display(
        "cannot apply '{operation}' to non-numeric operand '{operand}' of type {data_type}"
    ))]
    NonNumeric {
        /// Lineage name of the offending operand.
        operand: String,
        /// Operation that was requested.
        operation: Operation,
        /// The operand's Arrow type.
        data_type: DataType,
    },

    /// The Arrow kernel rejected the computation (length mismatch, overflow, ...).
    #[snafu(display("Arrow error while computing '{operation}': {source}"))]
    Compute {
        /// Operation that was being computed.
        operation: Operation,
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// The column could not be cast to the requested type.
    #[snafu(display("cannot cast column to {to}: {source}"))]
    Cast {
        /// Requested target type.
        to: DataType,
        /// Underlying Arrow error.
        source: ArrowError,
    },
}
