//! Table layer.
//!
//! A [`Table`] is an Arrow `RecordBatch` plus:
//!
//! - an ordered primary key naming the columns that identify rows;
//! - table-level [`TableMeta`];
//! - one [`MetadataStore`](crate::metadata::MetadataStore) shared with every
//!   [`Column`] the table hands out.
//!
//! Metadata is propagated on column assignment ([`Table::assign_column`]),
//! renames, and on every slice or copy (see the `slice` module). Copying a
//! table with `clone` deep-copies its store; tables never share stores.

pub mod error;
mod slice;

use std::{collections::HashMap, rc::Rc, sync::Arc};

use arrow::{
    array::{ArrayRef, RecordBatch, RecordBatchOptions},
    datatypes::{Field, FieldRef, Schema},
};
use snafu::prelude::*;

pub use error::TableError;

use crate::{
    column::Column,
    metadata::{MetadataStore, SharedStore, TableMeta, VariableMeta},
    naming::underscore,
    table::error::{
        ArrowSnafu, ColumnExistsSnafu, ColumnNotFoundSnafu, DuplicateKeySnafu, EmptyNameSnafu,
        LengthMismatchSnafu, NameCollisionSnafu, NamingSnafu,
    },
};

/// Right-hand side of [`Table::assign_column`].
#[derive(Debug, Clone)]
pub enum ColumnValue {
    /// A column whose metadata (if it has any) is carried over.
    Column(Column),
    /// Raw values; the destination gets a fresh, empty metadata record.
    Values(ArrayRef),
}

impl ColumnValue {
    fn data(&self) -> &ArrayRef {
        match self {
            ColumnValue::Column(column) => column.data(),
            ColumnValue::Values(values) => values,
        }
    }
}

impl From<Column> for ColumnValue {
    fn from(column: Column) -> Self {
        ColumnValue::Column(column)
    }
}

impl From<ArrayRef> for ColumnValue {
    fn from(values: ArrayRef) -> Self {
        ColumnValue::Values(values)
    }
}

fn build_batch(
    fields: Vec<FieldRef>,
    columns: Vec<ArrayRef>,
    row_count: usize,
) -> Result<RecordBatch, TableError> {
    RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(row_count)),
    )
    .context(ArrowSnafu)
}

/// A column-oriented table whose columns carry provenance metadata.
#[derive(Debug)]
pub struct Table {
    batch: RecordBatch,
    primary_key: Vec<String>,
    metadata: TableMeta,
    fields: SharedStore,
}

impl Table {
    /// An empty table with default metadata.
    pub fn new() -> Self {
        Table {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
            primary_key: Vec::new(),
            metadata: TableMeta::default(),
            fields: MetadataStore::new().into_shared(),
        }
    }

    /// Wrap existing data. Every column starts with an empty metadata record.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Table {
            batch,
            ..Table::new()
        }
    }

    /// Build a table from named value arrays, in order.
    pub fn try_from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: AsRef<str>,
    {
        let mut table = Table::new();
        for (name, values) in columns {
            table.assign_column(name.as_ref(), values)?;
        }
        Ok(table)
    }

    pub(crate) fn from_parts(
        batch: RecordBatch,
        primary_key: Vec<String>,
        metadata: TableMeta,
        fields: MetadataStore,
    ) -> Self {
        Table {
            batch,
            primary_key,
            metadata,
            fields: fields.into_shared(),
        }
    }

    /// Builder: replace the table-level metadata.
    pub fn with_metadata(mut self, metadata: TableMeta) -> Self {
        self.metadata = metadata;
        self
    }

    /// Table-level metadata.
    pub fn metadata(&self) -> &TableMeta {
        &self.metadata
    }

    /// Mutable table-level metadata.
    pub fn metadata_mut(&mut self) -> &mut TableMeta {
        &mut self.metadata
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns, key columns included.
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// The underlying data in storage order.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub(crate) fn store(&self) -> &SharedStore {
        &self.fields
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.batch
            .schema_ref()
            .column_with_name(name)
            .map(|(index, _)| index)
    }

    fn ensure_exists(&self, name: &str) -> Result<usize, TableError> {
        self.position(name)
            .context(ColumnNotFoundSnafu { name })
    }

    /// Whether a column (key or data) named `name` exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Key column names, in key order.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Promote `keys` to the primary key, replacing the current one.
    pub fn set_primary_key<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<(), TableError> {
        let mut primary_key: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            ensure!(!key.is_empty(), EmptyNameSnafu);
            self.ensure_exists(key)?;
            ensure!(
                !primary_key.iter().any(|k| k == key),
                DuplicateKeySnafu { name: key }
            );
            primary_key.push(key.to_string());
        }
        self.primary_key = primary_key;
        Ok(())
    }

    /// Demote all key columns to ordinary data columns.
    pub fn reset_primary_key(&mut self) {
        self.primary_key.clear();
    }

    /// Non-key column names, in storage order.
    pub fn data_columns(&self) -> Vec<String> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| field.name())
            .filter(|name| !name.is_empty() && !self.primary_key.contains(name))
            .cloned()
            .collect()
    }

    /// Key columns (in key order) followed by data columns.
    pub fn all_columns(&self) -> Vec<String> {
        let mut names = self.primary_key.clone();
        names.extend(self.data_columns());
        names
    }

    /// The column `name`, bound to this table's metadata store.
    pub fn column(&self, name: &str) -> Result<Column, TableError> {
        let index = self.ensure_exists(name)?;
        Ok(Column::attached(
            name,
            Arc::clone(self.batch.column(index)),
            Rc::clone(&self.fields),
        ))
    }

    /// A copy of the metadata record of column `name`.
    pub fn column_metadata(&self, name: &str) -> Result<VariableMeta, TableError> {
        self.ensure_exists(name)?;
        Ok(self.fields.borrow_mut().get(name))
    }

    /// Overwrite the metadata record of column `name`.
    pub fn set_column_metadata(&self, name: &str, meta: VariableMeta) -> Result<(), TableError> {
        self.ensure_exists(name)?;
        self.fields.borrow_mut().set(name, meta);
        Ok(())
    }

    /// Write `value` under `name`, adding or replacing a column.
    ///
    /// A named [`Column`] brings its metadata record along, with the
    /// placeholder name rewritten to `name` in its processing log. Raw values
    /// (or an unnamed column) reset `name` to an empty record: new data, no
    /// lineage.
    pub fn assign_column(
        &mut self,
        name: &str,
        value: impl Into<ColumnValue>,
    ) -> Result<(), TableError> {
        ensure!(!name.is_empty(), EmptyNameSnafu);
        let value = value.into();

        let actual = value.data().len();
        let expected = self.num_rows();
        ensure!(
            self.num_columns() == 0 || actual == expected,
            LengthMismatchSnafu {
                name,
                expected,
                actual,
            }
        );

        let schema = self.batch.schema();
        let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
        let mut columns = self.batch.columns().to_vec();
        let field = Arc::new(Field::new(name, value.data().data_type().clone(), true));
        match self.position(name) {
            Some(index) => {
                fields[index] = field;
                columns[index] = Arc::clone(value.data());
            }
            None => {
                fields.push(field);
                columns.push(Arc::clone(value.data()));
            }
        }
        let batch = build_batch(fields, columns, actual)?;

        let meta = match value {
            ColumnValue::Column(column) => column.into_assignment(name).1,
            ColumnValue::Values(_) => None,
        };
        self.batch = batch;
        self.fields
            .borrow_mut()
            .set(name, meta.unwrap_or_default());
        Ok(())
    }

    fn renamed_batch(&self, renames: &HashMap<&str, &str>) -> Result<RecordBatch, TableError> {
        let fields = self
            .batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| match renames.get(field.name().as_str()) {
                Some(new) => Arc::new(field.as_ref().clone().with_name(*new)),
                None => Arc::clone(field),
            })
            .collect();
        build_batch(fields, self.batch.columns().to_vec(), self.num_rows())
    }

    /// Rename column `old` to `new`; its metadata and key position follow.
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<(), TableError> {
        self.ensure_exists(old)?;
        ensure!(!new.is_empty(), EmptyNameSnafu);
        if old == new {
            return Ok(());
        }
        ensure!(!self.contains_column(new), ColumnExistsSnafu { name: new });

        self.batch = self.renamed_batch(&HashMap::from([(old, new)]))?;
        self.fields.borrow_mut().rename(old, new);
        for key in &mut self.primary_key {
            if key == old {
                *key = new.to_string();
            }
        }
        Ok(())
    }

    /// Remove columns (key or data) and their metadata.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), TableError> {
        for name in names {
            self.ensure_exists(name.as_ref())?;
        }
        let dropped: Vec<&str> = names.iter().map(AsRef::as_ref).collect();

        let schema = self.batch.schema();
        let (fields, columns): (Vec<FieldRef>, Vec<ArrayRef>) = schema
            .fields()
            .iter()
            .zip(self.batch.columns())
            .filter(|(field, _)| !dropped.contains(&field.name().as_str()))
            .map(|(field, column)| (Arc::clone(field), Arc::clone(column)))
            .unzip();
        self.batch = build_batch(fields, columns, self.num_rows())?;

        let mut store = self.fields.borrow_mut();
        for name in &dropped {
            store.remove(name);
        }
        self.primary_key.retain(|key| !dropped.contains(&key.as_str()));
        Ok(())
    }

    /// Normalize every column name with [`underscore`], moving metadata along.
    ///
    /// All names are validated first; on error nothing is renamed.
    pub fn underscore_names(&mut self) -> Result<(), TableError> {
        let mut renames: Vec<(String, String)> = Vec::new();
        let mut targets: HashMap<String, String> = HashMap::new();
        for field in self.batch.schema_ref().fields() {
            let old = field.name().clone();
            let new = underscore(&old).context(NamingSnafu)?;
            if let Some(first) = targets.insert(new.clone(), old.clone()) {
                return NameCollisionSnafu {
                    name: new,
                    first,
                    second: old,
                }
                .fail();
            }
            renames.push((old, new));
        }

        let lookup: HashMap<&str, &str> = renames
            .iter()
            .map(|(old, new)| (old.as_str(), new.as_str()))
            .collect();
        self.batch = self.renamed_batch(&lookup)?;

        let mut store = self.fields.borrow_mut();
        let moved: Vec<(&str, VariableMeta)> = renames
            .iter()
            .map(|(old, new)| (new.as_str(), store.remove(old).unwrap_or_default()))
            .collect();
        for (new, meta) in moved {
            store.set(new, meta);
        }
        drop(store);

        for key in &mut self.primary_key {
            if let Some(new) = lookup.get(key.as_str()) {
                *key = new.to_string();
            }
        }
        Ok(())
    }

    /// The data with key columns first, then data columns, as a plain batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch, TableError> {
        let indices: Vec<usize> = self
            .all_columns()
            .iter()
            .filter_map(|name| self.position(name))
            .collect();
        self.batch.project(&indices).context(ArrowSnafu)
    }

    /// Table metadata and data are equal; per-column metadata is ignored.
    pub fn equals_table(&self, other: &Table) -> bool {
        if self.metadata != other.metadata || self.primary_key != other.primary_key {
            return false;
        }

        let mut mine = self.all_columns();
        let mut theirs = other.all_columns();
        mine.sort();
        theirs.sort();
        if mine != theirs || self.num_rows() != other.num_rows() {
            return false;
        }

        mine.iter().all(|name| {
            match (self.position(name), other.position(name)) {
                (Some(a), Some(b)) => {
                    self.batch.column(a).as_ref() == other.batch.column(b).as_ref()
                }
                _ => false,
            }
        })
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

impl Clone for Table {
    /// Deep-copies the metadata store; the data buffers are shared.
    fn clone(&self) -> Self {
        Table {
            batch: self.batch.clone(),
            primary_key: self.primary_key.clone(),
            metadata: self.metadata.clone(),
            fields: self.fields.borrow().clone().into_shared(),
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float64Array, Int64Array, StringArray};

    use super::*;
    use crate::{metadata::ProcessingStep, naming::UNNAMED_VARIABLE};

    fn strings(values: &[&str]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    fn floats(values: &[f64]) -> ArrayRef {
        Arc::new(Float64Array::from(values.to_vec()))
    }

    fn unit(unit: &str) -> VariableMeta {
        VariableMeta {
            unit: Some(unit.to_string()),
            ..Default::default()
        }
    }

    fn countries() -> Table {
        let mut table = Table::try_from_columns([
            ("country", strings(&["France", "Spain"])),
            ("pop", floats(&[68.0, 48.0])),
            ("gdp", floats(&[3000.0, 1500.0])),
        ])
        .unwrap()
        .with_metadata(TableMeta::named("countries"));
        table.set_primary_key(&["country"]).unwrap();
        table.set_column_metadata("pop", unit("people")).unwrap();
        table.set_column_metadata("gdp", unit("USD")).unwrap();
        table
    }

    #[test]
    fn all_columns_lists_keys_first() {
        let table = countries();
        assert_eq!(table.primary_key(), ["country"]);
        assert_eq!(table.data_columns(), ["pop", "gdp"]);
        assert_eq!(table.all_columns(), ["country", "pop", "gdp"]);
    }

    #[test]
    fn columns_share_the_table_store() {
        let table = countries();
        let pop = table.column("pop").unwrap();
        assert!(pop.is_attached_to(&table));
        assert!(!pop.is_attached_to(&table.clone()));
        assert_eq!(pop.metadata().unwrap(), unit("people"));

        pop.update_metadata(|meta| meta.title = Some("Population".to_string()))
            .unwrap();
        assert_eq!(
            table.column_metadata("pop").unwrap().title.as_deref(),
            Some("Population")
        );
    }

    #[test]
    fn assigning_derived_column_rebinds_placeholder() {
        let mut table = countries();
        let ratio = table
            .column("gdp")
            .unwrap()
            .divide(&table.column("pop").unwrap())
            .unwrap();
        table.assign_column("gdp_per_capita", ratio).unwrap();

        let meta = table.column_metadata("gdp_per_capita").unwrap();
        assert_eq!(meta.unit, None);
        assert_eq!(
            meta.processing_log,
            vec![ProcessingStep {
                variable: "gdp_per_capita".to_string(),
                parents: vec!["gdp".to_string(), "pop".to_string()],
                operation: "/".to_string(),
            }]
        );
        let store = table.store().borrow();
        assert!(!store.contains(UNNAMED_VARIABLE));
    }

    #[test]
    fn assigning_raw_values_resets_metadata() {
        let mut table = countries();
        table.assign_column("pop", floats(&[1.0, 2.0])).unwrap();
        assert_eq!(table.column_metadata("pop").unwrap(), VariableMeta::default());
    }

    #[test]
    fn copying_an_attached_column_keeps_the_source_record() {
        let mut table = countries();
        let pop = table.column("pop").unwrap();
        table.assign_column("pop_copy", pop).unwrap();

        assert_eq!(table.column_metadata("pop").unwrap(), unit("people"));
        assert_eq!(table.column_metadata("pop_copy").unwrap(), unit("people"));
    }

    #[test]
    fn length_mismatch_leaves_table_untouched() {
        let mut table = countries();
        let err = table
            .assign_column("pop", floats(&[1.0, 2.0, 3.0]))
            .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { expected: 2, actual: 3, .. }));
        assert_eq!(table.column_metadata("pop").unwrap(), unit("people"));
        assert_eq!(table.column("pop").unwrap().len(), 2);
    }

    #[test]
    fn rename_column_moves_metadata_and_key() {
        let mut table = countries();
        table.rename_column("pop", "population").unwrap();
        table.rename_column("country", "entity").unwrap();

        assert_eq!(table.all_columns(), ["entity", "population", "gdp"]);
        assert_eq!(table.column_metadata("population").unwrap(), unit("people"));
        assert!(matches!(
            table.rename_column("gdp", "entity"),
            Err(TableError::ColumnExists { .. })
        ));
    }

    #[test]
    fn renaming_through_a_column_moves_the_record() {
        let table = countries();
        let before = table.column_metadata("pop").unwrap();
        let mut pop = table.column("pop").unwrap();

        pop.set_name(Some("y"));

        let mut store = table.store().borrow_mut();
        assert_eq!(store.get("y"), before);
        assert_eq!(store.get("pop"), VariableMeta::default());
    }

    #[test]
    fn primary_key_validation() {
        let mut table = countries();
        assert!(matches!(
            table.set_primary_key(&["missing"]),
            Err(TableError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            table.set_primary_key(&["pop", "pop"]),
            Err(TableError::DuplicateKey { .. })
        ));
        assert_eq!(table.primary_key(), ["country"]);

        table.reset_primary_key();
        assert_eq!(table.all_columns(), ["country", "pop", "gdp"]);
    }

    #[test]
    fn clone_deep_copies_store() {
        let table = countries();
        let copy = table.clone();
        copy.set_column_metadata("pop", unit("millions")).unwrap();

        assert_eq!(table.column_metadata("pop").unwrap(), unit("people"));
        assert!(copy.equals_table(&table));
    }

    #[test]
    fn drop_columns_removes_data_and_key() {
        let mut table = countries();
        table.drop_columns(&["country", "gdp"]).unwrap();
        assert_eq!(table.all_columns(), ["pop"]);
        assert!(table.primary_key().is_empty());
        assert!(!table.store().borrow().contains("gdp"));
    }

    #[test]
    fn underscore_names_moves_metadata() {
        let mut table = Table::try_from_columns([
            ("Country Name", strings(&["France"])),
            ("GDP-Total", floats(&[1.0])),
        ])
        .unwrap();
        table.set_primary_key(&["Country Name"]).unwrap();
        table.set_column_metadata("GDP-Total", unit("USD")).unwrap();

        table.underscore_names().unwrap();

        assert_eq!(table.all_columns(), ["country_name", "gdp_total"]);
        assert_eq!(table.column_metadata("gdp_total").unwrap(), unit("USD"));
    }

    #[test]
    fn underscore_names_rejects_collisions_without_renaming() {
        let mut table = Table::try_from_columns([
            ("a b", floats(&[1.0])),
            ("a-b", floats(&[2.0])),
        ])
        .unwrap();
        assert!(matches!(
            table.underscore_names(),
            Err(TableError::NameCollision { .. })
        ));
        assert_eq!(table.all_columns(), ["a b", "a-b"]);
    }

    #[test]
    fn to_record_batch_puts_keys_first() {
        let mut table = Table::try_from_columns([
            ("value", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("year", Arc::new(Int64Array::from(vec![2000, 2001])) as ArrayRef),
        ])
        .unwrap();
        table.set_primary_key(&["year"]).unwrap();

        let batch = table.to_record_batch().unwrap();
        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, ["year", "value"]);
    }
}
