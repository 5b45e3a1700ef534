//! Persistence codec: a data file plus a `.meta.json` sidecar.
//!
//! A table is stored as two files side by side:
//!
//! - `<base>.<ext>`: the rows, key columns first, in one of the
//!   [`DataFormat`]s;
//! - `<base>.meta.json`: table metadata, the primary key and one metadata
//!   record per column (see the `sidecar` module for the layout).
//!
//! Writes validate the path and the table metadata before touching the
//! filesystem. Reads require both files to be present.

pub mod error;
mod formats;
mod sidecar;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::debug;
use snafu::prelude::*;

pub use error::{CodecError, FormatError, SidecarError};

use crate::{
    codec::error::{ExtensionSnafu, FormatSnafu, SidecarSnafu, TableSnafu},
    metadata::{MetadataStore, TableSchema},
    table::Table,
};

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// Comma-separated values with a header row (`.csv`).
    Csv,
    /// Arrow IPC file format (`.feather`).
    Feather,
    /// Apache Parquet (`.parquet`).
    Parquet,
}

impl DataFormat {
    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Feather => "feather",
            DataFormat::Parquet => "parquet",
        }
    }

    /// The format implied by `path`'s extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        [DataFormat::Csv, DataFormat::Feather, DataFormat::Parquet]
            .into_iter()
            .find(|format| format.extension() == ext)
    }

    fn check(self, path: &Path) -> Result<(), FormatError> {
        ensure!(
            DataFormat::from_path(path) == Some(self),
            FormatSnafu {
                format: self,
                path: path.display().to_string(),
            }
        );
        Ok(())
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataFormat::Csv => "CSV",
            DataFormat::Feather => "Feather",
            DataFormat::Parquet => "Parquet",
        };
        f.write_str(name)
    }
}

/// The sidecar path for a data file: `dir/base.csv` becomes `dir/base.meta.json`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Reads and writes tables together with their metadata sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCodec {
    /// Top-level table properties the sidecar may contain.
    pub schema: TableSchema,
    /// Pretty-print the sidecar JSON.
    pub pretty: bool,
}

impl Default for TableCodec {
    fn default() -> Self {
        TableCodec {
            schema: TableSchema::builtin(),
            pretty: true,
        }
    }
}

impl TableCodec {
    /// A pretty-printing codec recognizing the properties of `schema`.
    pub fn new(schema: TableSchema) -> Self {
        TableCodec {
            schema,
            ..Default::default()
        }
    }

    /// Write `table` to `path` and its sidecar next to it.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Extension`] if `path` does not end in `format`'s extension.
    /// - [`CodecError::Sidecar`] if the table metadata has a property the
    ///   schema does not recognize, or the sidecar cannot be written.
    /// - [`CodecError::DataFile`], [`CodecError::Arrow`] or [`CodecError::Parquet`]
    ///   if the data file cannot be written.
    pub fn write(&self, table: &Table, path: &Path, format: DataFormat) -> Result<(), CodecError> {
        format.check(path).context(ExtensionSnafu)?;
        let doc = sidecar::encode(table, &self.schema).context(SidecarSnafu)?;
        let batch = table.to_record_batch().context(TableSnafu)?;

        debug!(
            "writing {} rows to {} ({format})",
            batch.num_rows(),
            path.display()
        );
        formats::write(path, format, &batch)?;

        let meta_path = sidecar_path(path);
        debug!("writing metadata sidecar {}", meta_path.display());
        sidecar::write(&meta_path, &doc, self.pretty).context(SidecarSnafu)
    }

    /// Read a table from `path` and its sidecar.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Extension`] if `path` does not end in `format`'s extension.
    /// - [`CodecError::Sidecar`] if the sidecar is missing, malformed or has
    ///   an unrecognized property.
    /// - [`CodecError::Table`] if the primary key names a column the data
    ///   file lacks.
    pub fn read(&self, path: &Path, format: DataFormat) -> Result<Table, CodecError> {
        format.check(path).context(ExtensionSnafu)?;

        let meta_path = sidecar_path(path);
        debug!("reading metadata sidecar {}", meta_path.display());
        let sidecar = sidecar::read(&meta_path, &self.schema).context(SidecarSnafu)?;

        debug!("reading {} ({format})", path.display());
        let batch = formats::read(path, format)?;

        let fields: MetadataStore = sidecar
            .fields
            .into_iter()
            .filter(|(name, _)| batch.schema_ref().column_with_name(name).is_some())
            .collect();
        let mut table = Table::from_parts(batch, Vec::new(), sidecar.metadata, fields);
        table
            .set_primary_key(&sidecar.primary_key)
            .context(TableSnafu)?;
        Ok(table)
    }
}

impl Table {
    /// Write as CSV plus sidecar with the default [`TableCodec`].
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        TableCodec::default().write(self, path.as_ref(), DataFormat::Csv)
    }

    /// Write as Arrow IPC (feather) plus sidecar with the default [`TableCodec`].
    pub fn to_feather(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        TableCodec::default().write(self, path.as_ref(), DataFormat::Feather)
    }

    /// Write as Parquet plus sidecar with the default [`TableCodec`].
    pub fn to_parquet(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        TableCodec::default().write(self, path.as_ref(), DataFormat::Parquet)
    }

    /// Read a CSV file and its sidecar with the default [`TableCodec`].
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Table, CodecError> {
        TableCodec::default().read(path.as_ref(), DataFormat::Csv)
    }

    /// Read an Arrow IPC (feather) file and its sidecar with the default [`TableCodec`].
    pub fn read_feather(path: impl AsRef<Path>) -> Result<Table, CodecError> {
        TableCodec::default().read(path.as_ref(), DataFormat::Feather)
    }

    /// Read a Parquet file and its sidecar with the default [`TableCodec`].
    pub fn read_parquet(path: impl AsRef<Path>) -> Result<Table, CodecError> {
        TableCodec::default().read(path.as_ref(), DataFormat::Parquet)
    }
}
