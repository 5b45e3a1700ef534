//! Metadata merging for derived columns.
//!
//! When a column is computed from other columns (and possibly scalars), its
//! metadata is derived from theirs:
//!
//! - `unit` / `short_unit` survive only `+` and `-`, and only when every
//!   metadata-bearing operand agrees. Multiplicative operations change the
//!   physical unit, so the result unit is unknown rather than wrong.
//! - `title` / `description` survive `+`, `-` and `fillna` under the same
//!   agreement rule.
//! - `sources` and `licenses` are concatenated and deduplicated, keeping the
//!   first-seen order.
//! - `processing_log` is the concatenation of the operands' logs plus exactly
//!   one new step naming the result, its parents and the operation.
//!
//! Disagreement never fails the computation: the field becomes unknown and a
//! [`SchemaWarning`] is logged and returned alongside the merged record.
use std::fmt;

use log::warn;

use crate::{
    column::Column,
    metadata::{ProcessingStep, VariableMeta},
};

/// Operations whose result metadata is derived by [`combine_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `//`
    FloorDivide,
    /// `%`
    Modulo,
    /// `**`
    Power,
    /// `fillna`
    FillMissing,
}

impl Operation {
    /// Tag recorded in the processing log.
    pub fn tag(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::FloorDivide => "//",
            Operation::Modulo => "%",
            Operation::Power => "**",
            Operation::FillMissing => "fillna",
        }
    }

    fn keeps_units(self) -> bool {
        matches!(self, Operation::Add | Operation::Subtract)
    }

    // Deliberately wider than `keeps_units`.
    fn keeps_titles(self) -> bool {
        matches!(
            self,
            Operation::Add | Operation::Subtract | Operation::FillMissing
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A scalar operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Boolean.
    Boolean(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int64(v) => write!(f, "{v}"),
            // `{:?}` keeps the trailing `.0` on whole floats.
            Scalar::Float64(v) => write!(f, "{v:?}"),
            Scalar::Utf8(v) => f.write_str(v),
            Scalar::Boolean(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int64(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int64(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float64(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Utf8(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Utf8(v)
    }
}

/// One operand of a derivation: a column or a bare scalar.
#[derive(Debug, Clone)]
pub enum Operand<'a> {
    /// A column, which may carry metadata.
    Column(&'a Column),
    /// A scalar, which carries no metadata but is named in the lineage.
    Scalar(Scalar),
}

impl Operand<'_> {
    /// Identifier recorded among a processing step's parents.
    pub fn lineage_name(&self) -> String {
        match self {
            Operand::Column(column) => column.name().unwrap_or("None").to_string(),
            Operand::Scalar(scalar) => scalar.to_string(),
        }
    }

    fn metadata(&self) -> Option<VariableMeta> {
        match self {
            Operand::Column(column) => column.metadata().ok(),
            Operand::Scalar(_) => None,
        }
    }
}

impl<'a> From<&'a Column> for Operand<'a> {
    fn from(column: &'a Column) -> Self {
        Operand::Column(column)
    }
}

macro_rules! operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand<'_> {
                fn from(value: $ty) -> Self {
                    Operand::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

operand_from_scalar!(Scalar, i64, i32, f64, bool, &str, String);

/// A descriptive field that may be dropped when operands disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergedField {
    /// `title`
    Title,
    /// `description`
    Description,
    /// `unit`
    Unit,
    /// `short_unit`
    ShortUnit,
}

impl MergedField {
    fn name(self) -> &'static str {
        match self {
            MergedField::Title => "title",
            MergedField::Description => "description",
            MergedField::Unit => "unit",
            MergedField::ShortUnit => "short_unit",
        }
    }

    fn read(self, meta: &VariableMeta) -> Option<String> {
        match self {
            MergedField::Title => meta.title.clone(),
            MergedField::Description => meta.description.clone(),
            MergedField::Unit => meta.unit.clone(),
            MergedField::ShortUnit => meta.short_unit.clone(),
        }
    }
}

/// Non-fatal notice that operands disagreed on a descriptive field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaWarning {
    /// Field the operands disagreed on.
    pub field: MergedField,
    /// Operation being performed.
    pub operation: Operation,
    /// Distinct values seen, in first-seen order (`None` is unknown).
    pub values: Vec<Option<String>>,
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "different values of '{}' detected among operands of '{}': {:?}",
            self.field.name(),
            self.operation,
            self.values
        )
    }
}

/// Merged metadata plus the warnings produced while merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// The merged record.
    pub metadata: VariableMeta,
    /// Disagreements that degraded a field to unknown.
    pub warnings: Vec<SchemaWarning>,
}

/// Order-preserving dedup by full equality.
fn unique<T: PartialEq + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn merge_field(
    field: MergedField,
    operation: Operation,
    metas: &[VariableMeta],
    warnings: &mut Vec<SchemaWarning>,
) -> Option<String> {
    let applies = match field {
        MergedField::Unit | MergedField::ShortUnit => operation.keeps_units(),
        MergedField::Title | MergedField::Description => operation.keeps_titles(),
    };
    if !applies || metas.is_empty() {
        return None;
    }

    let mut values = unique(metas.iter().map(|m| field.read(m)));
    if values.len() == 1 {
        return values.pop().flatten();
    }

    let warning = SchemaWarning {
        field,
        operation,
        values,
    };
    warn!("{warning}");
    warnings.push(warning);
    None
}

/// Merge the metadata of `operands` for a result named `name`.
pub fn combine_metadata(
    operands: &[Operand<'_>],
    operation: Operation,
    name: &str,
) -> MergeOutcome {
    let metas: Vec<VariableMeta> = operands.iter().filter_map(Operand::metadata).collect();
    let mut warnings = Vec::new();

    let title = merge_field(MergedField::Title, operation, &metas, &mut warnings);
    let description = merge_field(MergedField::Description, operation, &metas, &mut warnings);
    let unit = merge_field(MergedField::Unit, operation, &metas, &mut warnings);
    let short_unit = merge_field(MergedField::ShortUnit, operation, &metas, &mut warnings);

    let sources = unique(metas.iter().flat_map(|m| m.sources.iter().cloned()));
    let licenses = unique(metas.iter().flat_map(|m| m.licenses.iter().cloned()));

    let mut processing_log: Vec<ProcessingStep> = metas
        .iter()
        .flat_map(|m| m.processing_log.iter().cloned())
        .collect();
    processing_log.push(ProcessingStep {
        variable: name.to_string(),
        parents: operands.iter().map(Operand::lineage_name).collect(),
        operation: operation.tag().to_string(),
    });

    MergeOutcome {
        metadata: VariableMeta {
            title,
            description,
            unit,
            short_unit,
            sources,
            licenses,
            processing_log,
        },
        warnings,
    }
}
