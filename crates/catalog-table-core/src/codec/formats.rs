//! Data file encoders and decoders for each [`DataFormat`].
//!
//! Each function opens, fully writes or reads, and closes its file before it
//! returns, on success and on error.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Seek, Write},
    path::Path,
    sync::Arc,
};

use arrow::{
    array::RecordBatch,
    compute::concat_batches,
    csv::{self, reader::Format},
    datatypes::SchemaRef,
    error::ArrowError,
    ipc::{reader::FileReader, writer::FileWriter},
};
use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};
use snafu::prelude::*;

use crate::codec::{
    DataFormat,
    error::{ArrowSnafu, CodecError, DataFileSnafu, ParquetSnafu},
};

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn collect(
    schema: SchemaRef,
    batches: impl Iterator<Item = Result<RecordBatch, ArrowError>>,
) -> Result<RecordBatch, ArrowError> {
    let batches = batches.collect::<Result<Vec<_>, _>>()?;
    concat_batches(&schema, &batches)
}

/// Write `batch` to `path` in `format`.
pub(crate) fn write(path: &Path, format: DataFormat, batch: &RecordBatch) -> Result<(), CodecError> {
    let file = File::create(path).context(DataFileSnafu { path: display(path) })?;
    match format {
        DataFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .with_header(true)
                .build(BufWriter::new(file));
            writer
                .write(batch)
                .context(ArrowSnafu { path: display(path) })?;
            writer
                .into_inner()
                .flush()
                .context(DataFileSnafu { path: display(path) })?;
        }
        DataFormat::Feather => {
            let mut writer = FileWriter::try_new(BufWriter::new(file), &batch.schema())
                .context(ArrowSnafu { path: display(path) })?;
            writer
                .write(batch)
                .context(ArrowSnafu { path: display(path) })?;
            writer.finish().context(ArrowSnafu { path: display(path) })?;
        }
        DataFormat::Parquet => {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
                .context(ParquetSnafu { path: display(path) })?;
            writer
                .write(batch)
                .context(ParquetSnafu { path: display(path) })?;
            writer.close().context(ParquetSnafu { path: display(path) })?;
        }
    }
    Ok(())
}

/// Read the whole file at `path` as one batch.
pub(crate) fn read(path: &Path, format: DataFormat) -> Result<RecordBatch, CodecError> {
    let mut file = File::open(path).context(DataFileSnafu { path: display(path) })?;
    match format {
        DataFormat::Csv => {
            let csv_format = Format::default().with_header(true);
            let (schema, _) = csv_format
                .infer_schema(&mut file, None)
                .context(ArrowSnafu { path: display(path) })?;
            file.rewind().context(DataFileSnafu { path: display(path) })?;

            let schema = Arc::new(schema);
            let reader = csv::ReaderBuilder::new(Arc::clone(&schema))
                .with_format(csv_format)
                .build(BufReader::new(file))
                .context(ArrowSnafu { path: display(path) })?;
            collect(schema, reader).context(ArrowSnafu { path: display(path) })
        }
        DataFormat::Feather => {
            let reader = FileReader::try_new(BufReader::new(file), None)
                .context(ArrowSnafu { path: display(path) })?;
            collect(reader.schema(), reader).context(ArrowSnafu { path: display(path) })
        }
        DataFormat::Parquet => {
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)
                .context(ParquetSnafu { path: display(path) })?;
            let schema = Arc::clone(builder.schema());
            let reader = builder
                .build()
                .context(ParquetSnafu { path: display(path) })?;
            collect(schema, reader).context(ArrowSnafu { path: display(path) })
        }
    }
}
