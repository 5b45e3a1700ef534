//! The `.meta.json` sidecar written next to every data file.
//!
//! Layout of the JSON object, in key order:
//!
//! - the [`TableMeta`] properties at top level;
//! - `primary_key`: array of key column names (empty when there is none);
//! - `fields`: column name to [`VariableMeta`], in all-columns order.
//!
//! Every top-level property other than `primary_key` and `fields` must be
//! recognized by the codec's [`TableSchema`], on write and on read.

use std::{
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::Path,
};

use serde_json::{Map, Value};
use snafu::prelude::*;

use crate::{
    codec::error::{
        EncodeSnafu, IoSnafu, MalformedSnafu, NotAnObjectSnafu, NotFoundSnafu, SidecarError,
        UnrecognizedFieldSnafu,
    },
    metadata::{TableMeta, TableSchema, VariableMeta},
    table::Table,
};

const PRIMARY_KEY: &str = "primary_key";
const FIELDS: &str = "fields";

/// Decoded sidecar contents.
#[derive(Debug)]
pub(crate) struct Sidecar {
    pub(crate) metadata: TableMeta,
    pub(crate) primary_key: Vec<String>,
    pub(crate) fields: Vec<(String, VariableMeta)>,
}

fn check_properties<'a>(
    keys: impl IntoIterator<Item = &'a String>,
    schema: &TableSchema,
) -> Result<(), SidecarError> {
    for key in keys {
        ensure!(
            schema.recognizes(key),
            UnrecognizedFieldSnafu { name: key.as_str() }
        );
    }
    Ok(())
}

/// Build the sidecar document for `table`, rejecting unrecognized properties.
pub(crate) fn encode(table: &Table, schema: &TableSchema) -> Result<Value, SidecarError> {
    let mut doc = match serde_json::to_value(table.metadata()).context(EncodeSnafu)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    check_properties(doc.keys(), schema)?;

    let columns = table.all_columns();
    let records = table.store().borrow_mut().all_columns_metadata(&columns);
    let mut fields = Map::new();
    for (name, meta) in records {
        fields.insert(name, serde_json::to_value(meta).context(EncodeSnafu)?);
    }

    doc.insert(
        PRIMARY_KEY.to_string(),
        Value::from(table.primary_key().to_vec()),
    );
    doc.insert(FIELDS.to_string(), Value::Object(fields));
    Ok(Value::Object(doc))
}

/// Write `doc` to `path`, replacing any existing file.
pub(crate) fn write(path: &Path, doc: &Value, pretty: bool) -> Result<(), SidecarError> {
    let display = path.display().to_string();
    let file = File::create(path).context(IoSnafu { path: &display })?;
    let mut writer = BufWriter::new(file);
    let encoded = if pretty {
        serde_json::to_writer_pretty(&mut writer, doc)
    } else {
        serde_json::to_writer(&mut writer, doc)
    };
    encoded.context(EncodeSnafu)?;
    writer.flush().context(IoSnafu { path: display })?;
    Ok(())
}

/// Read and validate the sidecar at `path`.
pub(crate) fn read(path: &Path, schema: &TableSchema) -> Result<Sidecar, SidecarError> {
    let display = path.display().to_string();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return NotFoundSnafu { path: display }.fail();
        }
        Err(e) => return Err(e).context(IoSnafu { path: display }),
    };

    let value: Value = serde_json::from_str(&text).context(MalformedSnafu { path: &display })?;
    let Value::Object(mut doc) = value else {
        return NotAnObjectSnafu { path: display }.fail();
    };

    let primary_key: Vec<String> = match doc.remove(PRIMARY_KEY) {
        Some(value) => serde_json::from_value(value).context(MalformedSnafu { path: &display })?,
        None => Vec::new(),
    };

    let mut fields = Vec::new();
    if let Some(value) = doc.remove(FIELDS) {
        let records: Map<String, Value> =
            serde_json::from_value(value).context(MalformedSnafu { path: &display })?;
        for (name, record) in records {
            let meta: VariableMeta =
                serde_json::from_value(record).context(MalformedSnafu { path: &display })?;
            fields.push((name, meta));
        }
    }

    check_properties(doc.keys(), schema)?;
    let metadata: TableMeta =
        serde_json::from_value(Value::Object(doc)).context(MalformedSnafu { path: display })?;

    Ok(Sidecar {
        metadata,
        primary_key,
        fields,
    })
}
