// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The arbitrary-precision numeric type, a wrapper around [`rust-dec`].
//!
//! Both the `DECIMAL` type and the arbitrary-precision integer type are
//! backed by [`Numeric`]; the static type distinguishes them.
//!
//! [`rust-dec`]: https://github.com/MaterializeInc/rust-dec/

use std::error::Error;
use std::fmt;

use dec::{Context, Decimal};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The number of internal decimal units in a [`Numeric`] value.
pub const NUMERIC_DATUM_WIDTH: u8 = 13;

/// The value of [`NUMERIC_DATUM_WIDTH`] as a [`usize`].
pub const NUMERIC_DATUM_WIDTH_USIZE: usize = NUMERIC_DATUM_WIDTH as usize;

/// The maximum number of digits expressable in a [`Numeric`] value.
pub const NUMERIC_DATUM_MAX_PRECISION: u8 = NUMERIC_DATUM_WIDTH * 3;

/// A numeric value.
pub type Numeric = Decimal<NUMERIC_DATUM_WIDTH_USIZE>;

/// The number of internal decimal units in a [`NumericAgg`] value.
pub const NUMERIC_AGG_WIDTH: u8 = 27;

/// The value of [`NUMERIC_AGG_WIDTH`] as a [`usize`].
pub const NUMERIC_AGG_WIDTH_USIZE: usize = NUMERIC_AGG_WIDTH as usize;

/// The maximum number of digits expressable in a [`NumericAgg`] value.
pub const NUMERIC_AGG_MAX_PRECISION: u8 = NUMERIC_AGG_WIDTH * 3;

/// A double-width version of [`Numeric`] for use in aggregations.
pub type NumericAgg = Decimal<NUMERIC_AGG_WIDTH_USIZE>;

static CX_DATUM: Lazy<Context<Numeric>> = Lazy::new(|| {
    let mut cx = Context::<Numeric>::default();
    cx.set_max_exponent(isize::from(NUMERIC_DATUM_MAX_PRECISION - 1))
        .unwrap();
    cx.set_min_exponent(-isize::from(NUMERIC_DATUM_MAX_PRECISION))
        .unwrap();
    cx
});
static CX_AGG: Lazy<Context<NumericAgg>> = Lazy::new(|| {
    let mut cx = Context::<NumericAgg>::default();
    cx.set_max_exponent(isize::from(NUMERIC_AGG_MAX_PRECISION - 1))
        .unwrap();
    cx.set_min_exponent(-isize::from(NUMERIC_AGG_MAX_PRECISION))
        .unwrap();
    cx
});

/// Returns a new context appropriate for operating on numeric datums.
pub fn cx_datum() -> Context<Numeric> {
    CX_DATUM.clone()
}

/// Returns a new context appropriate for operating on numeric aggregates.
pub fn cx_agg() -> Context<NumericAgg> {
    CX_AGG.clone()
}

/// Narrows an aggregate-width value back to datum width.
///
/// Errors if the value's coefficient requires more than
/// [`NUMERIC_DATUM_MAX_PRECISION`] digits.
pub fn from_agg(n: NumericAgg) -> Result<Numeric, ()> {
    let mut cx = cx_datum();
    let d = cx.to_width(n);
    if cx.status().inexact() || cx.status().overflow() {
        Err(())
    } else {
        Ok(d)
    }
}

/// Reports whether `n` is representable as an integer, i.e. has no
/// fractional component.
pub fn is_integral(n: &Numeric) -> bool {
    if n.is_special() {
        return false;
    }
    if n.exponent() >= 0 {
        return true;
    }
    let mut cx = cx_datum();
    let mut trunc = *n;
    cx.round(&mut trunc);
    trunc == *n
}

/// The `max_precision` of a [`ScalarType::Decimal`].
///
/// This newtype wrapper ensures that the precision is within the valid range.
///
/// [`ScalarType::Decimal`]: crate::ScalarType::Decimal
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct NumericMaxPrecision(u8);

impl NumericMaxPrecision {
    /// Consumes the newtype wrapper, returning the contents as a `u8`.
    pub fn into_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for NumericMaxPrecision {
    type Error = InvalidNumericMaxPrecisionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(p) if p > 0 && p <= NUMERIC_DATUM_MAX_PRECISION => Ok(NumericMaxPrecision(p)),
            _ => Err(InvalidNumericMaxPrecisionError(value)),
        }
    }
}

/// The error returned when constructing a [`NumericMaxPrecision`] from an
/// invalid value.
#[derive(Debug, Clone)]
pub struct InvalidNumericMaxPrecisionError(i64);

impl fmt::Display for InvalidNumericMaxPrecisionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "precision for type numeric must be between 1 and {}, got {}",
            NUMERIC_DATUM_MAX_PRECISION, self.0
        )
    }
}

impl Error for InvalidNumericMaxPrecisionError {}

/// The `max_scale` of a [`ScalarType::Decimal`].
///
/// This newtype wrapper ensures that the scale is within the valid range.
///
/// [`ScalarType::Decimal`]: crate::ScalarType::Decimal
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct NumericMaxScale(u8);

impl NumericMaxScale {
    /// A scale of 0, i.e. an integer-valued decimal.
    pub const ZERO: NumericMaxScale = NumericMaxScale(0);

    /// Consumes the newtype wrapper, returning the contents as a `u8`.
    pub fn into_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for NumericMaxScale {
    type Error = InvalidNumericMaxScaleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(s) if s <= NUMERIC_DATUM_MAX_PRECISION => Ok(NumericMaxScale(s)),
            _ => Err(InvalidNumericMaxScaleError(value)),
        }
    }
}

/// The error returned when constructing a [`NumericMaxScale`] from an invalid
/// value.
#[derive(Debug, Clone)]
pub struct InvalidNumericMaxScaleError(i64);

impl fmt::Display for InvalidNumericMaxScaleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "scale for type numeric must be between 0 and {}, got {}",
            NUMERIC_DATUM_MAX_PRECISION, self.0
        )
    }
}

impl Error for InvalidNumericMaxScaleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrality() {
        assert!(is_integral(&Numeric::from(42)));
        assert!(is_integral(&Numeric::from(-3)));
        let mut cx = cx_datum();
        let mut half = Numeric::from(1);
        cx.div(&mut half, &Numeric::from(2));
        assert!(!is_integral(&half));
    }

    #[test]
    fn agg_narrowing() {
        let mut cx = cx_agg();
        let mut sum = NumericAgg::zero();
        for _ in 0..1000 {
            cx.add(&mut sum, &NumericAgg::from(7));
        }
        assert_eq!(from_agg(sum).unwrap(), Numeric::from(7000));
    }
}
