//! Element-wise kernels behind column arithmetic.
//!
//! Type rules:
//! - integer ⊕ integer stays `Int64`, anything else is computed in `Float64`;
//! - `/` is true division and always yields `Float64`;
//! - `//`, `%` and `**` are computed in `Float64` and cast back to `Int64`
//!   when both inputs are integers (non-finite results become null);
//! - `%` is floored: the result takes the sign of the divisor.
use std::{iter, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray},
    compute::{
        cast, is_null,
        kernels::{arity, numeric, zip::zip},
    },
    datatypes::{DataType, Float64Type},
    error::ArrowError,
};

use crate::merge::{Operation, Scalar};

/// Repeat `scalar` into an array of length `len`.
pub(crate) fn broadcast(scalar: &Scalar, len: usize) -> ArrayRef {
    match scalar {
        Scalar::Int64(v) => Arc::new(Int64Array::from_value(*v, len)),
        Scalar::Float64(v) => Arc::new(Float64Array::from_value(*v, len)),
        Scalar::Utf8(v) => Arc::new(StringArray::from_iter_values(iter::repeat_n(v, len))),
        Scalar::Boolean(v) => Arc::new(BooleanArray::from(vec![*v; len])),
    }
}

fn float_binary(
    lhs: &ArrayRef,
    rhs: &ArrayRef,
    op: impl Fn(f64, f64) -> f64,
) -> Result<ArrayRef, ArrowError> {
    let lhs = cast(lhs, &DataType::Float64)?;
    let rhs = cast(rhs, &DataType::Float64)?;
    let out: Float64Array = arity::binary(
        lhs.as_primitive::<Float64Type>(),
        rhs.as_primitive::<Float64Type>(),
        op,
    )?;
    Ok(Arc::new(out))
}

fn restore_integers(out: ArrayRef, integral: bool) -> Result<ArrayRef, ArrowError> {
    if integral {
        cast(&out, &DataType::Int64)
    } else {
        Ok(out)
    }
}

/// Apply an arithmetic `operation` to two equal-length arrays.
pub(crate) fn arithmetic(
    operation: Operation,
    lhs: &ArrayRef,
    rhs: &ArrayRef,
) -> Result<ArrayRef, ArrowError> {
    let integral = lhs.data_type().is_integer() && rhs.data_type().is_integer();

    match operation {
        Operation::Add | Operation::Subtract | Operation::Multiply => {
            let target = if integral {
                DataType::Int64
            } else {
                DataType::Float64
            };
            let lhs = cast(lhs, &target)?;
            let rhs = cast(rhs, &target)?;
            match operation {
                Operation::Add => numeric::add(&lhs, &rhs),
                Operation::Subtract => numeric::sub(&lhs, &rhs),
                _ => numeric::mul(&lhs, &rhs),
            }
        }
        Operation::Divide => float_binary(lhs, rhs, |a, b| a / b),
        Operation::FloorDivide => {
            restore_integers(float_binary(lhs, rhs, |a, b| (a / b).floor())?, integral)
        }
        Operation::Modulo => restore_integers(
            float_binary(lhs, rhs, |a, b| a - (a / b).floor() * b)?,
            integral,
        ),
        Operation::Power => restore_integers(float_binary(lhs, rhs, f64::powf)?, integral),
        Operation::FillMissing => Err(ArrowError::InvalidArgumentError(
            "fillna is not an arithmetic operation".to_string(),
        )),
    }
}

/// Replace nulls in `data` with the value of `fill` at the same position.
pub(crate) fn fill_nulls(data: &ArrayRef, fill: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    let fill = cast(fill, data.data_type())?;
    let mask = is_null(data.as_ref())?;
    zip(&mask, &fill, data)
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::Int64Type;

    use super::*;

    fn ints(values: Vec<Option<i64>>) -> ArrayRef {
        Arc::new(Int64Array::from(values))
    }

    fn floats(values: Vec<Option<f64>>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }

    #[test]
    fn integer_addition_stays_integral() {
        let out = arithmetic(
            Operation::Add,
            &ints(vec![Some(1), Some(2)]),
            &ints(vec![Some(10), None]),
        )
        .unwrap();
        assert_eq!(out.data_type(), &DataType::Int64);
        assert_eq!(out.as_ref(), ints(vec![Some(11), None]).as_ref());
    }

    #[test]
    fn mixed_types_compute_in_float() {
        let out = arithmetic(
            Operation::Multiply,
            &ints(vec![Some(2), Some(3)]),
            &floats(vec![Some(0.5), Some(2.0)]),
        )
        .unwrap();
        assert_eq!(out.as_ref(), floats(vec![Some(1.0), Some(6.0)]).as_ref());
    }

    #[test]
    fn true_division_always_yields_float() {
        let out = arithmetic(
            Operation::Divide,
            &ints(vec![Some(7)]),
            &ints(vec![Some(2)]),
        )
        .unwrap();
        assert_eq!(out.as_ref(), floats(vec![Some(3.5)]).as_ref());
    }

    #[test]
    fn floor_division_and_modulo_follow_floored_semantics() {
        let lhs = ints(vec![Some(7), Some(-7)]);
        let rhs = ints(vec![Some(2), Some(2)]);

        let quotient = arithmetic(Operation::FloorDivide, &lhs, &rhs).unwrap();
        assert_eq!(quotient.as_primitive::<Int64Type>().values().to_vec(), vec![3, -4]);

        let remainder = arithmetic(Operation::Modulo, &lhs, &rhs).unwrap();
        assert_eq!(remainder.as_primitive::<Int64Type>().values().to_vec(), vec![1, 1]);
    }

    #[test]
    fn power_with_float_exponent() {
        let out = arithmetic(
            Operation::Power,
            &floats(vec![Some(4.0), Some(9.0)]),
            &broadcast(&Scalar::Float64(0.5), 2),
        )
        .unwrap();
        assert_eq!(out.as_ref(), floats(vec![Some(2.0), Some(3.0)]).as_ref());
    }

    #[test]
    fn fill_nulls_casts_fill_to_column_type() {
        let data = floats(vec![Some(1.5), None, None]);
        let out = fill_nulls(&data, &broadcast(&Scalar::Int64(0), 3)).unwrap();
        assert_eq!(out.as_ref(), floats(vec![Some(1.5), Some(0.0), Some(0.0)]).as_ref());
        assert_eq!(out.null_count(), 0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = arithmetic(
            Operation::Divide,
            &floats(vec![Some(1.0)]),
            &floats(vec![Some(1.0), Some(2.0)]),
        );
        assert!(err.is_err());
    }
}
