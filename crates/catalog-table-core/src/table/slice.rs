//! Row and column subsets of a table.
//!
//! Every derived table carries the source's [`TableMeta`](crate::metadata::TableMeta)
//! and primary key, and owns a fresh store holding the records of the columns it
//! retained.

use arrow::{
    array::{BooleanArray, RecordBatch},
    compute::filter_record_batch,
};
use snafu::prelude::*;

use crate::table::{
    Table,
    error::{ArrowSnafu, TableError},
};

impl Table {
    fn derive(&self, batch: RecordBatch, primary_key: Vec<String>) -> Table {
        let retained: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| field.name().as_str())
            .collect();
        let fields = self.fields.borrow().subset(&retained);
        Table::from_parts(batch, primary_key, self.metadata.clone(), fields)
    }

    /// The key columns plus `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let mut columns = self.primary_key.clone();
        for name in names {
            let name = name.as_ref();
            self.ensure_exists(name)?;
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }

        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|name| self.position(name))
            .collect();
        let batch = self.batch.project(&indices).context(ArrowSnafu)?;
        Ok(self.derive(batch, self.primary_key.clone()))
    }

    /// Rows `offset..offset + len`, clamped to the table's bounds.
    pub fn slice(&self, offset: usize, len: usize) -> Table {
        let offset = offset.min(self.num_rows());
        let len = len.min(self.num_rows() - offset);
        self.derive(self.batch.slice(offset, len), self.primary_key.clone())
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.slice(0, n)
    }

    /// Rows where `mask` is true. Null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanArray) -> Result<Table, TableError> {
        let batch = filter_record_batch(&self.batch, mask).context(ArrowSnafu)?;
        Ok(self.derive(batch, self.primary_key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, StringArray};

    use crate::metadata::{TableMeta, VariableMeta};

    use super::*;

    fn table() -> Table {
        let mut table = Table::try_from_columns([
            (
                "country",
                Arc::new(StringArray::from(vec!["France", "Spain", "Chile"])) as ArrayRef,
            ),
            ("pop", Arc::new(Float64Array::from(vec![68.0, 48.0, 19.0])) as ArrayRef),
            ("gdp", Arc::new(Float64Array::from(vec![3.0, 1.5, 0.3])) as ArrayRef),
        ])
        .unwrap()
        .with_metadata(TableMeta::named("countries"));
        table.set_primary_key(&["country"]).unwrap();
        table
            .set_column_metadata(
                "pop",
                VariableMeta {
                    title: Some("Population".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        table
    }

    #[test]
    fn select_keeps_keys_and_prunes_store() {
        let source = table();
        let selected = source.select(&["pop"]).unwrap();

        assert_eq!(selected.all_columns(), ["country", "pop"]);
        assert_eq!(selected.metadata(), source.metadata());
        assert_eq!(
            selected.column_metadata("pop").unwrap().title.as_deref(),
            Some("Population")
        );
        assert!(!selected.store().borrow().contains("gdp"));
    }

    #[test]
    fn select_unknown_column_fails() {
        assert!(matches!(
            table().select(&["missing"]),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn derived_tables_do_not_share_the_store() {
        let source = table();
        let head = source.head(2);
        head.set_column_metadata("pop", VariableMeta::default())
            .unwrap();

        assert_eq!(head.num_rows(), 2);
        assert_eq!(
            source.column_metadata("pop").unwrap().title.as_deref(),
            Some("Population")
        );
    }

    #[test]
    fn slice_is_clamped() {
        let source = table();
        assert_eq!(source.slice(2, 10).num_rows(), 1);
        assert_eq!(source.slice(5, 1).num_rows(), 0);
    }

    #[test]
    fn filter_drops_rows_and_keeps_metadata() {
        let source = table();
        let mask = BooleanArray::from(vec![Some(true), None, Some(false)]);
        let filtered = source.filter(&mask).unwrap();

        assert_eq!(filtered.num_rows(), 1);
        assert_eq!(filtered.primary_key(), ["country"]);
        assert_eq!(
            filtered.column_metadata("pop").unwrap().title.as_deref(),
            Some("Population")
        );
    }
}
