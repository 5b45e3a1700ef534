//! A single named data column bound to a metadata store.
//!
//! A [`Column`] never embeds its metadata. It holds a handle to a
//! [`MetadataStore`](crate::metadata::MetadataStore) plus its current name, and
//! every metadata read or write goes through `store[name]`:
//!
//! - Columns obtained from a [`Table`](crate::table::Table) share the table's
//!   store, so writes through the column are visible in the table.
//! - Columns built with [`Column::new`] and arithmetic results own a private
//!   store until they are assigned into a table, at which point their record
//!   is copied into the table's store.
//!
//! Arithmetic (`add`, `subtract`, ...) and [`Column::fill_missing`] always
//! return a new detached column named [`UNNAMED_VARIABLE`] whose metadata is
//! the merge of the operands'. The receiver and its store are left untouched.

pub mod compute;
pub mod error;

use std::{rc::Rc, sync::Arc};

use arrow::{array::ArrayRef, compute::cast, datatypes::DataType};
use snafu::prelude::*;

pub use error::ColumnError;

use crate::{
    column::error::{CastSnafu, ComputeSnafu, NonNumericSnafu},
    merge::{MergeOutcome, Operand, Operation, SchemaWarning, combine_metadata},
    metadata::{MetadataStore, SharedStore, VariableMeta},
    naming::{NamingError, UNNAMED_VARIABLE, UnnamedSnafu},
    table::Table,
};

/// A named array of values with live access to its metadata record.
///
/// Cloning a column clones the handle, not the store: both clones resolve
/// metadata through the same store.
#[derive(Debug, Clone)]
pub struct Column {
    name: Option<String>,
    data: ArrayRef,
    fields: SharedStore,
    warnings: Vec<SchemaWarning>,
}

impl Column {
    /// Create a detached column with an empty metadata record.
    pub fn new(name: impl Into<String>, data: ArrayRef) -> Self {
        let name = name.into();
        let mut store = MetadataStore::new();
        store.entry(&name);
        Column {
            name: Some(name),
            data,
            fields: store.into_shared(),
            warnings: Vec::new(),
        }
    }

    /// Create a detached column without a name. It cannot hold metadata
    /// until it is named.
    pub fn unnamed(data: ArrayRef) -> Self {
        Column {
            name: None,
            data,
            fields: MetadataStore::new().into_shared(),
            warnings: Vec::new(),
        }
    }

    /// A column bound to an existing (table-owned) store.
    pub(crate) fn attached(name: &str, data: ArrayRef, fields: SharedStore) -> Self {
        fields.borrow_mut().entry(name);
        Column {
            name: Some(name.to_string()),
            data,
            fields,
            warnings: Vec::new(),
        }
    }

    fn derived(data: ArrayRef, outcome: MergeOutcome) -> Self {
        let mut store = MetadataStore::new();
        store.set(UNNAMED_VARIABLE, outcome.metadata);
        Column {
            name: Some(UNNAMED_VARIABLE.to_string()),
            data,
            fields: store.into_shared(),
            warnings: outcome.warnings,
        }
    }

    /// Builder: replace the metadata record of this column.
    pub fn with_metadata(self, meta: VariableMeta) -> Result<Self, NamingError> {
        self.set_metadata(meta)?;
        Ok(self)
    }

    /// Current name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rename the column.
    ///
    /// With `Some(new)`, the record stored under the previous name moves to
    /// `new` and `new` is guaranteed to have a record afterwards. With `None`,
    /// the store is left untouched.
    pub fn set_name(&mut self, name: Option<&str>) {
        if let Some(new) = name {
            let mut store = self.fields.borrow_mut();
            if let Some(old) = self.name.as_deref() {
                store.rename(old, new);
            }
            store.entry(new);
        }
        self.name = name.map(str::to_string);
    }

    /// The name, or [`NamingError::Unnamed`] if the column has none.
    pub fn checked_name(&self) -> Result<&str, NamingError> {
        self.name.as_deref().context(UnnamedSnafu)
    }

    /// A copy of this column's metadata record.
    pub fn metadata(&self) -> Result<VariableMeta, NamingError> {
        let name = self.checked_name()?;
        Ok(self.fields.borrow_mut().get(name))
    }

    /// Overwrite this column's metadata record.
    pub fn set_metadata(&self, meta: VariableMeta) -> Result<(), NamingError> {
        let name = self.checked_name()?;
        self.fields.borrow_mut().set(name, meta);
        Ok(())
    }

    /// Edit this column's metadata record in place.
    pub fn update_metadata<F>(&self, f: F) -> Result<(), NamingError>
    where
        F: FnOnce(&mut VariableMeta),
    {
        let name = self.checked_name()?;
        f(self.fields.borrow_mut().entry(name));
        Ok(())
    }

    /// Give a placeholder-named column its final name.
    ///
    /// Every occurrence of [`UNNAMED_VARIABLE`] in the processing log is
    /// replaced by `name`, then the column is renamed through
    /// [`Column::set_name`].
    pub fn rebind(&mut self, name: &str) -> Result<(), NamingError> {
        let current = self.checked_name()?.to_string();
        self.fields
            .borrow_mut()
            .entry(&current)
            .rename_in_processing_log(UNNAMED_VARIABLE, name);
        self.set_name(Some(name));
        Ok(())
    }

    /// The underlying values.
    pub fn data(&self) -> &ArrayRef {
        &self.data
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Arrow type of the values.
    pub fn data_type(&self) -> &DataType {
        self.data.data_type()
    }

    /// Warnings raised by the metadata merge that produced this column.
    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    pub(crate) fn store(&self) -> &SharedStore {
        &self.fields
    }

    /// Whether this column resolves metadata through `table`'s store.
    pub fn is_attached_to(&self, table: &Table) -> bool {
        Rc::ptr_eq(&self.fields, table.store())
    }

    /// Whether nothing else holds this column's store.
    pub(crate) fn owns_store(&self) -> bool {
        Rc::strong_count(&self.fields) == 1
    }

    /// Split the column into the values and record to store under `name`.
    ///
    /// A column that is the sole holder of its store is rebound in place. A
    /// column sharing its store (typically with a table) must not disturb it,
    /// so only a copy of its record is rebound. `None` means the column had no
    /// name and therefore no metadata to carry over.
    pub(crate) fn into_assignment(mut self, name: &str) -> (ArrayRef, Option<VariableMeta>) {
        let meta = if self.owns_store() {
            self.rebind(name).and_then(|()| self.metadata()).ok()
        } else {
            self.metadata().ok().map(|mut meta| {
                meta.rename_in_processing_log(UNNAMED_VARIABLE, name);
                meta
            })
        };
        (self.data, meta)
    }

    /// Convert the values to `to`, keeping the name and metadata binding.
    pub fn cast(&self, to: &DataType) -> Result<Column, ColumnError> {
        let data = cast(&self.data, to).context(CastSnafu { to: to.clone() })?;
        Ok(Column {
            name: self.name.clone(),
            data,
            fields: Rc::clone(&self.fields),
            warnings: Vec::new(),
        })
    }

    fn ensure_numeric(
        operand: &Operand<'_>,
        data: &ArrayRef,
        operation: Operation,
    ) -> Result<(), ColumnError> {
        ensure!(
            data.data_type().is_numeric(),
            NonNumericSnafu {
                operand: operand.lineage_name(),
                operation,
                data_type: data.data_type().clone(),
            }
        );
        Ok(())
    }

    fn derive(&self, other: Operand<'_>, operation: Operation) -> Result<Column, ColumnError> {
        let rhs = match &other {
            Operand::Column(column) => Arc::clone(&column.data),
            Operand::Scalar(scalar) => compute::broadcast(scalar, self.len()),
        };

        let data = if operation == Operation::FillMissing {
            compute::fill_nulls(&self.data, &rhs)
        } else {
            Self::ensure_numeric(&Operand::Column(self), &self.data, operation)?;
            Self::ensure_numeric(&other, &rhs, operation)?;
            compute::arithmetic(operation, &self.data, &rhs)
        }
        .context(ComputeSnafu { operation })?;

        let outcome = combine_metadata(
            &[Operand::Column(self), other],
            operation,
            UNNAMED_VARIABLE,
        );
        Ok(Column::derived(data, outcome))
    }

    /// `self + other`
    pub fn add<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::Add)
    }

    /// `self - other`
    pub fn subtract<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::Subtract)
    }

    /// `self * other`
    pub fn multiply<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::Multiply)
    }

    /// `self / other` (true division).
    pub fn divide<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::Divide)
    }

    /// `self // other` (floored division).
    pub fn floor_divide<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::FloorDivide)
    }

    /// `self % other` (floored remainder).
    pub fn modulo<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::Modulo)
    }

    /// `self ** other`
    pub fn power<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(other.into(), Operation::Power)
    }

    /// Replace missing values with `value` (a scalar, or another column
    /// read position by position).
    pub fn fill_missing<'a>(&self, value: impl Into<Operand<'a>>) -> Result<Column, ColumnError> {
        self.derive(value.into(), Operation::FillMissing)
    }
}

impl PartialEq for Column {
    /// Name and values; metadata is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data.as_ref() == other.data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float64Array, Int32Array, StringArray};

    use super::*;
    use crate::metadata::ProcessingStep;

    fn floats(values: &[f64]) -> ArrayRef {
        Arc::new(Float64Array::from(values.to_vec()))
    }

    fn with_unit(name: &str, unit: &str) -> Column {
        Column::new(name, floats(&[1.0, 2.0]))
            .with_metadata(VariableMeta {
                unit: Some(unit.to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn unnamed_column_cannot_resolve_metadata() {
        let column = Column::unnamed(floats(&[1.0]));
        assert_eq!(column.checked_name(), Err(NamingError::Unnamed));
        assert_eq!(column.metadata(), Err(NamingError::Unnamed));
        assert_eq!(
            column.set_metadata(VariableMeta::default()),
            Err(NamingError::Unnamed)
        );
    }

    #[test]
    fn renaming_moves_metadata() {
        let mut column = with_unit("x", "kg");
        let before = column.metadata().unwrap();

        column.set_name(Some("y"));

        assert_eq!(column.name(), Some("y"));
        assert_eq!(column.metadata().unwrap(), before);
        let mut store = column.store().borrow_mut();
        assert_eq!(store.get("x"), VariableMeta::default());
        assert_eq!(store.get("y"), before);
    }

    #[test]
    fn clearing_the_name_leaves_the_store_alone() {
        let mut column = with_unit("x", "kg");
        column.set_name(None);

        assert_eq!(column.name(), None);
        let store = column.store().borrow();
        assert_eq!(store.peek("x").and_then(|m| m.unit.clone()), Some("kg".into()));
    }

    #[test]
    fn arithmetic_returns_detached_placeholder_column() {
        let a = with_unit("a", "kg");
        let b = with_unit("b", "kg");

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.name(), Some(UNNAMED_VARIABLE));
        assert_eq!(sum.data().as_ref(), floats(&[2.0, 4.0]).as_ref());
        assert_eq!(sum.metadata().unwrap().unit.as_deref(), Some("kg"));
        assert!(sum.warnings().is_empty());
        assert!(!Rc::ptr_eq(sum.store(), a.store()));

        // operands untouched
        assert_eq!(a.metadata().unwrap().processing_log, vec![]);
        assert_eq!(b.metadata().unwrap().unit.as_deref(), Some("kg"));
    }

    #[test]
    fn mismatched_units_degrade_to_unknown_with_warning() {
        let a = with_unit("a", "kg");
        let b = with_unit("b", "g");

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.metadata().unwrap().unit, None);
        assert_eq!(sum.warnings().len(), 1);
    }

    #[test]
    fn multiplication_drops_even_matching_units() {
        let a = with_unit("a", "m");
        let b = with_unit("b", "m");

        let product = a.multiply(&b).unwrap();
        assert_eq!(product.metadata().unwrap().unit, None);
        assert!(product.warnings().is_empty());
    }

    #[test]
    fn scalar_operands_are_named_in_the_lineage() {
        let a = with_unit("a", "m");
        let doubled = a.multiply(2).unwrap();

        assert_eq!(doubled.data().as_ref(), floats(&[2.0, 4.0]).as_ref());
        assert_eq!(
            doubled.metadata().unwrap().processing_log,
            vec![ProcessingStep {
                variable: UNNAMED_VARIABLE.to_string(),
                parents: vec!["a".to_string(), "2".to_string()],
                operation: "*".to_string(),
            }]
        );
    }

    #[test]
    fn arithmetic_on_strings_is_rejected() {
        let words = Column::new("w", Arc::new(StringArray::from(vec!["a", "b"])));
        let err = words.add(1).unwrap_err();
        assert!(matches!(err, ColumnError::NonNumeric { .. }), "{err}");
    }

    #[test]
    fn fill_missing_keeps_title() {
        let column = Column::new("deaths", Arc::new(Float64Array::from(vec![Some(1.0), None])))
            .with_metadata(VariableMeta {
                title: Some("Deaths".to_string()),
                ..Default::default()
            })
            .unwrap();

        let filled = column.fill_missing(0.0).unwrap();
        assert_eq!(filled.data().null_count(), 0);
        assert_eq!(filled.metadata().unwrap().title.as_deref(), Some("Deaths"));
        assert_eq!(
            filled.metadata().unwrap().processing_log[0].operation,
            "fillna"
        );
    }

    #[test]
    fn cast_keeps_name_and_binding() {
        let column = Column::new("n", Arc::new(Int32Array::from(vec![1, 2])))
            .with_metadata(VariableMeta {
                unit: Some("items".to_string()),
                ..Default::default()
            })
            .unwrap();

        let wide = column.cast(&DataType::Float64).unwrap();
        assert_eq!(wide.name(), Some("n"));
        assert_eq!(wide.data_type(), &DataType::Float64);
        assert!(Rc::ptr_eq(wide.store(), column.store()));
        assert_eq!(wide.metadata().unwrap().unit.as_deref(), Some("items"));
    }

    #[test]
    fn rebind_replaces_placeholder_in_processing_log() {
        let a = with_unit("a", "kg");
        let mut sum = a.add(&a).unwrap().add(1).unwrap();

        sum.rebind("total").unwrap();

        assert_eq!(sum.name(), Some("total"));
        let log = sum.metadata().unwrap().processing_log;
        assert_eq!(log.len(), 2);
        for step in &log {
            assert_eq!(step.variable, "total");
            assert!(step.parents.iter().all(|p| p != UNNAMED_VARIABLE));
        }
        assert_eq!(log[1].parents, vec!["total", "1"]);
    }
}
