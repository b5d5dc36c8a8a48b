// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Scalar function bodies.
//!
//! Each function the catalog exposes dispatches through one of the enums in
//! this module ([`NullaryFunc`], [`UnaryFunc`], [`BinaryFunc`],
//! [`VariadicFunc`]). Bodies run after the invocation protocol has already
//! elided null and missing arguments (for null-call functions) and checked
//! runtime types, so the `unwrap_*` and `widen_*` accessors below are safe;
//! the exceptions, like `and` and `is_null`, inspect their raw arguments and
//! say so.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sq_repr::adt::datetime::{Date, DateTimeUnits, Timestamp};
use sq_repr::adt::numeric::{self, Numeric};
use sq_repr::Datum;

use crate::scalar::{like_pattern, EvalContext, EvalError};

pub mod datetime;
pub mod string;

/// Widens any integer datum of at most 16 bits to `i16`.
pub(crate) fn widen_int16(d: &Datum) -> i16 {
    match d {
        Datum::Int8(i) => i16::from(*i),
        Datum::Int16(i) => *i,
        _ => panic!("widen_int16 called on {:?}", d),
    }
}

/// Widens any integer datum of at most 32 bits to `i32`.
pub(crate) fn widen_int32(d: &Datum) -> i32 {
    match d {
        Datum::Int8(i) => i32::from(*i),
        Datum::Int16(i) => i32::from(*i),
        Datum::Int32(i) => *i,
        _ => panic!("widen_int32 called on {:?}", d),
    }
}

/// Widens any fixed-width integer datum to `i64`.
pub(crate) fn widen_int64(d: &Datum) -> i64 {
    match d {
        Datum::Int8(i) => i64::from(*i),
        Datum::Int16(i) => i64::from(*i),
        Datum::Int32(i) => i64::from(*i),
        Datum::Int64(i) => *i,
        _ => panic!("widen_int64 called on {:?}", d),
    }
}

/// Widens any exact numeric datum to [`Numeric`].
pub(crate) fn widen_numeric(d: &Datum) -> Numeric {
    match d {
        Datum::Numeric(n) => n.0,
        d => Numeric::from(widen_int64(d)),
    }
}

/// Widens any numeric datum to `f32`. Lossy for wide integers, as the
/// numeric tower dictates.
#[allow(clippy::as_conversions)]
pub(crate) fn widen_float32(d: &Datum) -> f32 {
    match d {
        Datum::Float32(f) => f.into_inner(),
        Datum::Numeric(n) => n.0.to_string().parse::<f32>().unwrap_or(f32::NAN),
        d => widen_int64(d) as f32,
    }
}

/// Widens any numeric datum to `f64`. Lossy for wide integers, as the
/// numeric tower dictates.
#[allow(clippy::as_conversions)]
pub(crate) fn widen_float64(d: &Datum) -> f64 {
    match d {
        Datum::Float32(f) => f64::from(f.into_inner()),
        Datum::Float64(f) => f.into_inner(),
        Datum::Numeric(n) => n.0.to_string().parse::<f64>().unwrap_or(f64::NAN),
        d => widen_int64(d) as f64,
    }
}

macro_rules! checked_int_arith {
    ($name:ident, $widen:ident, $method:ident) => {
        fn $name(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
            $widen(a)
                .$method($widen(b))
                .ok_or(EvalError::NumericFieldOverflow)
                .map(Datum::from)
        }
    };
}

checked_int_arith!(add_int8, unwrap_int8_ref, checked_add);
checked_int_arith!(add_int16, widen_int16, checked_add);
checked_int_arith!(add_int32, widen_int32, checked_add);
checked_int_arith!(add_int64, widen_int64, checked_add);
checked_int_arith!(sub_int8, unwrap_int8_ref, checked_sub);
checked_int_arith!(sub_int16, widen_int16, checked_sub);
checked_int_arith!(sub_int32, widen_int32, checked_sub);
checked_int_arith!(sub_int64, widen_int64, checked_sub);
checked_int_arith!(mul_int8, unwrap_int8_ref, checked_mul);
checked_int_arith!(mul_int16, widen_int16, checked_mul);
checked_int_arith!(mul_int32, widen_int32, checked_mul);
checked_int_arith!(mul_int64, widen_int64, checked_mul);

fn unwrap_int8_ref(d: &Datum) -> i8 {
    d.unwrap_int8()
}

macro_rules! checked_int_div {
    ($name:ident, $widen:ident, $method:ident) => {
        fn $name(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
            let b = $widen(b);
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            $widen(a)
                .$method(b)
                .ok_or(EvalError::NumericFieldOverflow)
                .map(Datum::from)
        }
    };
}

checked_int_div!(div_int8, unwrap_int8_ref, checked_div);
checked_int_div!(div_int16, widen_int16, checked_div);
checked_int_div!(div_int32, widen_int32, checked_div);
checked_int_div!(div_int64, widen_int64, checked_div);
checked_int_div!(mod_int8, unwrap_int8_ref, checked_rem);
checked_int_div!(mod_int16, widen_int16, checked_rem);
checked_int_div!(mod_int32, widen_int32, checked_rem);
checked_int_div!(mod_int64, widen_int64, checked_rem);

macro_rules! float_arith {
    ($name:ident, $widen:ident, $op:tt) => {
        fn $name(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
            let result = $widen(a) $op $widen(b);
            if result.is_infinite() && $widen(a).is_finite() && $widen(b).is_finite() {
                Err(EvalError::FloatOverflow)
            } else {
                Ok(Datum::from(result))
            }
        }
    };
}

float_arith!(add_float32, widen_float32, +);
float_arith!(add_float64, widen_float64, +);
float_arith!(sub_float32, widen_float32, -);
float_arith!(sub_float64, widen_float64, -);
float_arith!(mul_float32, widen_float32, *);
float_arith!(mul_float64, widen_float64, *);

macro_rules! float_div {
    ($name:ident, $widen:ident, $op:tt) => {
        fn $name(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
            let b = $widen(b);
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Datum::from($widen(a) $op b))
        }
    };
}

float_div!(div_float32, widen_float32, /);
float_div!(div_float64, widen_float64, /);
float_div!(mod_float32, widen_float32, %);
float_div!(mod_float64, widen_float64, %);

fn add_numeric(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
    let mut cx = numeric::cx_datum();
    let mut a = widen_numeric(a);
    cx.add(&mut a, &widen_numeric(b));
    if cx.status().overflow() {
        Err(EvalError::NumericFieldOverflow)
    } else {
        Ok(Datum::from(a))
    }
}

fn sub_numeric(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
    let mut cx = numeric::cx_datum();
    let mut a = widen_numeric(a);
    cx.sub(&mut a, &widen_numeric(b));
    if cx.status().overflow() {
        Err(EvalError::NumericFieldOverflow)
    } else {
        Ok(Datum::from(a))
    }
}

fn mul_numeric(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
    let mut cx = numeric::cx_datum();
    let mut a = widen_numeric(a);
    cx.mul(&mut a, &widen_numeric(b));
    let status = cx.status();
    if status.overflow() {
        Err(EvalError::NumericFieldOverflow)
    } else if status.subnormal() {
        Err(EvalError::FloatUnderflow)
    } else {
        Ok(Datum::from(a))
    }
}

fn div_numeric(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
    let mut cx = numeric::cx_datum();
    let mut a = widen_numeric(a);
    let b = widen_numeric(b);
    cx.div(&mut a, &b);
    let status = cx.status();
    // The status alone is not enough: the underlying library treats 0/0 as
    // undefined rather than as division by zero.
    if b.is_zero() {
        Err(EvalError::DivisionByZero)
    } else if status.overflow() {
        Err(EvalError::NumericFieldOverflow)
    } else if status.subnormal() {
        Err(EvalError::FloatUnderflow)
    } else {
        Ok(Datum::from(a))
    }
}

fn mod_numeric(a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
    let mut cx = numeric::cx_datum();
    let mut a = widen_numeric(a);
    let b = widen_numeric(b);
    if b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    cx.rem(&mut a, &b);
    Ok(Datum::from(a))
}

// The runtime type check admits narrower subtypes, so negation widens its
// argument like the binary operators do.
macro_rules! neg_int {
    ($name:ident, $widen:ident) => {
        fn $name(a: &Datum) -> Result<Datum, EvalError> {
            $widen(a)
                .checked_neg()
                .ok_or(EvalError::NumericFieldOverflow)
                .map(Datum::from)
        }
    };
}

neg_int!(neg_int8, unwrap_int8_ref);
neg_int!(neg_int16, widen_int16);
neg_int!(neg_int32, widen_int32);
neg_int!(neg_int64, widen_int64);

fn neg_numeric(a: &Datum) -> Result<Datum, EvalError> {
    let mut cx = numeric::cx_datum();
    let mut a = widen_numeric(a);
    cx.neg(&mut a);
    Ok(Datum::from(a))
}

/// The shared shape of every numeric datum, for cross-width comparison.
enum NumericValue {
    Int(i64),
    Exact(Numeric),
    Float(f64),
}

fn numeric_value(d: &Datum) -> Option<NumericValue> {
    match d {
        Datum::Int8(_) | Datum::Int16(_) | Datum::Int32(_) | Datum::Int64(_) => {
            Some(NumericValue::Int(widen_int64(d)))
        }
        Datum::Numeric(n) => Some(NumericValue::Exact(n.0)),
        Datum::Float32(_) | Datum::Float64(_) => Some(NumericValue::Float(widen_float64(d))),
        _ => None,
    }
}

/// Orders two datums, coercing numeric datums of different widths to a
/// common representation first. Timestamps and times order by the instant
/// they denote, so values with different offsets but the same UTC reading
/// compare equal. Other non-numeric datums fall back to structural order,
/// which is only meaningful between datums of the same variant.
pub(crate) fn order_datums(a: &Datum, b: &Datum) -> Ordering {
    use NumericValue::*;
    match (a, b) {
        (Datum::Timestamp(x), Datum::Timestamp(y)) => {
            return x.utc_datetime().cmp(&y.utc_datetime());
        }
        (Datum::Time(x), Datum::Time(y)) => {
            return datetime::utc_nanos_of_day(x).cmp(&datetime::utc_nanos_of_day(y));
        }
        _ => {}
    }
    match (numeric_value(a), numeric_value(b)) {
        (Some(Int(x)), Some(Int(y))) => x.cmp(&y),
        (Some(Float(_)), Some(_)) | (Some(_), Some(Float(_))) => {
            widen_float64(a).total_cmp(&widen_float64(b))
        }
        (Some(na), Some(nb)) => {
            let exact = |v: NumericValue| match v {
                Int(i) => Numeric::from(i),
                Exact(n) => n,
                Float(_) => unreachable!("handled above"),
            };
            dec::OrderedDecimal(exact(na)).cmp(&dec::OrderedDecimal(exact(nb)))
        }
        _ => a.cmp(b),
    }
}

fn eval_cmp(op: &BinaryFunc, a: &Datum, b: &Datum) -> Datum {
    let ord = order_datums(a, b);
    let result = match op {
        BinaryFunc::Eq => ord == Ordering::Equal,
        BinaryFunc::NotEq => ord != Ordering::Equal,
        BinaryFunc::Lt => ord == Ordering::Less,
        BinaryFunc::Lte => ord != Ordering::Greater,
        BinaryFunc::Gt => ord == Ordering::Greater,
        BinaryFunc::Gte => ord != Ordering::Less,
        _ => unreachable!("eval_cmp called on non-comparison function"),
    };
    Datum::from(result)
}

/// The truth value of a datum under three-valued logic, where both null and
/// missing read as unknown.
fn truth_value(d: &Datum) -> Option<bool> {
    match d {
        Datum::True => Some(true),
        Datum::False => Some(false),
        _ => None,
    }
}

// `and` and `or` are not null-call: false AND anything is false, and true OR
// anything is true, even when the other operand is unknown.
fn and(a: &Datum, b: &Datum) -> Datum {
    match (truth_value(a), truth_value(b)) {
        (Some(false), _) | (_, Some(false)) => Datum::False,
        (Some(true), Some(true)) => Datum::True,
        _ => Datum::Null,
    }
}

fn or(a: &Datum, b: &Datum) -> Datum {
    match (truth_value(a), truth_value(b)) {
        (Some(true), _) | (_, Some(true)) => Datum::True,
        (Some(false), Some(false)) => Datum::False,
        _ => Datum::Null,
    }
}

fn not(a: &Datum) -> Datum {
    Datum::from(!a.unwrap_bool())
}

fn exists(a: &Datum) -> Datum {
    let empty = match a {
        Datum::Struct(fields) => fields.is_empty(),
        _ => a.unwrap_elements().is_empty(),
    };
    Datum::from(!empty)
}

fn size(a: &Datum) -> Result<Datum, EvalError> {
    let len = match a {
        Datum::Struct(fields) => fields.len(),
        _ => a.unwrap_elements().len(),
    };
    i32::try_from(len)
        .map(Datum::from)
        .map_err(|_| EvalError::NumericFieldOverflow)
}

fn coalesce(args: &[Datum]) -> Datum {
    args.iter()
        .find(|d| !d.is_absent())
        .cloned()
        .unwrap_or(Datum::Null)
}

fn nullif(a: &Datum, b: &Datum) -> Datum {
    if order_datums(a, b) == Ordering::Equal {
        Datum::Null
    } else {
        a.clone()
    }
}

fn like(args: &[Datum]) -> Result<Datum, EvalError> {
    let (text, pattern, escape) = match args {
        [text, pattern] => (text, pattern, like_pattern::DEFAULT_ESCAPE),
        [text, pattern, escape] => (text, pattern, escape.unwrap_str()),
        _ => {
            return Err(EvalError::Internal(format!(
                "like invoked with {} arguments",
                args.len()
            )))
        }
    };
    let matcher = like_pattern::compile(pattern.unwrap_str(), escape)?;
    Ok(Datum::from(matcher.is_match(text.unwrap_str())))
}

/// A function that takes no arguments and reads only the evaluation context.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum NullaryFunc {
    UtcNow,
    CurrentDate,
    CurrentUser,
}

impl NullaryFunc {
    pub fn eval(&self, ecx: &EvalContext) -> Result<Datum, EvalError> {
        match self {
            NullaryFunc::UtcNow => Ok(Datum::from(Timestamp::from_utc_instant(ecx.now)?)),
            NullaryFunc::CurrentDate => {
                let date = Date::try_from(ecx.now.date_naive())?;
                Ok(Datum::from(date))
            }
            NullaryFunc::CurrentUser => Ok(match &ecx.current_user {
                Some(user) => Datum::String(user.clone()),
                None => Datum::Null,
            }),
        }
    }
}

/// A function of one argument.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum UnaryFunc {
    Not,
    IsNull,
    IsMissing,
    NegInt8,
    NegInt16,
    NegInt32,
    NegInt64,
    NegNumeric,
    NegFloat32,
    NegFloat64,
    Exists,
    Size,
    Upper,
    Lower,
    CharLength,
    ExtractDate(DateTimeUnits),
    ExtractTime(DateTimeUnits),
    ExtractTimestamp(DateTimeUnits),
}

impl UnaryFunc {
    pub fn eval(&self, _ecx: &EvalContext, a: &Datum) -> Result<Datum, EvalError> {
        match self {
            UnaryFunc::Not => Ok(not(a)),
            // `MISSING IS NULL` is true: null-ness is the weaker of the two
            // absence states.
            UnaryFunc::IsNull => Ok(Datum::from(a.is_absent())),
            UnaryFunc::IsMissing => Ok(Datum::from(a.is_missing())),
            UnaryFunc::NegInt8 => neg_int8(a),
            UnaryFunc::NegInt16 => neg_int16(a),
            UnaryFunc::NegInt32 => neg_int32(a),
            UnaryFunc::NegInt64 => neg_int64(a),
            UnaryFunc::NegNumeric => neg_numeric(a),
            UnaryFunc::NegFloat32 => Ok(Datum::from(-widen_float32(a))),
            UnaryFunc::NegFloat64 => Ok(Datum::from(-widen_float64(a))),
            UnaryFunc::Exists => Ok(exists(a)),
            UnaryFunc::Size => size(a),
            UnaryFunc::Upper => Ok(string::upper(a.unwrap_str())),
            UnaryFunc::Lower => Ok(string::lower(a.unwrap_str())),
            UnaryFunc::CharLength => string::char_length(a.unwrap_str()),
            UnaryFunc::ExtractDate(units) => datetime::extract_date(*units, a.unwrap_date()),
            UnaryFunc::ExtractTime(units) => datetime::extract_time(*units, &a.unwrap_time()),
            UnaryFunc::ExtractTimestamp(units) => {
                datetime::extract_timestamp(*units, &a.unwrap_timestamp())
            }
        }
    }

    /// Whether the invocation protocol should return null without calling
    /// this function when the argument is null.
    pub fn propagates_nulls(&self) -> bool {
        !matches!(self, UnaryFunc::IsNull | UnaryFunc::IsMissing)
    }

    /// Whether the invocation protocol should collapse a missing argument
    /// before calling this function.
    pub fn propagates_missing(&self) -> bool {
        !matches!(self, UnaryFunc::IsNull | UnaryFunc::IsMissing)
    }
}

/// A function of two arguments.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BinaryFunc {
    AddInt8,
    AddInt16,
    AddInt32,
    AddInt64,
    AddNumeric,
    AddFloat32,
    AddFloat64,
    SubInt8,
    SubInt16,
    SubInt32,
    SubInt64,
    SubNumeric,
    SubFloat32,
    SubFloat64,
    MulInt8,
    MulInt16,
    MulInt32,
    MulInt64,
    MulNumeric,
    MulFloat32,
    MulFloat64,
    DivInt8,
    DivInt16,
    DivInt32,
    DivInt64,
    DivNumeric,
    DivFloat32,
    DivFloat64,
    ModInt8,
    ModInt16,
    ModInt32,
    ModInt64,
    ModNumeric,
    ModFloat32,
    ModFloat64,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    NullIf,
    TextConcat,
    Position,
    DateAddDate(DateTimeUnits),
    DateAddTime(DateTimeUnits),
    DateAddTimestamp(DateTimeUnits),
    DateDiffDate(DateTimeUnits),
    DateDiffTime(DateTimeUnits),
    DateDiffTimestamp(DateTimeUnits),
}

impl BinaryFunc {
    pub fn eval(&self, _ecx: &EvalContext, a: &Datum, b: &Datum) -> Result<Datum, EvalError> {
        match self {
            BinaryFunc::AddInt8 => add_int8(a, b),
            BinaryFunc::AddInt16 => add_int16(a, b),
            BinaryFunc::AddInt32 => add_int32(a, b),
            BinaryFunc::AddInt64 => add_int64(a, b),
            BinaryFunc::AddNumeric => add_numeric(a, b),
            BinaryFunc::AddFloat32 => add_float32(a, b),
            BinaryFunc::AddFloat64 => add_float64(a, b),
            BinaryFunc::SubInt8 => sub_int8(a, b),
            BinaryFunc::SubInt16 => sub_int16(a, b),
            BinaryFunc::SubInt32 => sub_int32(a, b),
            BinaryFunc::SubInt64 => sub_int64(a, b),
            BinaryFunc::SubNumeric => sub_numeric(a, b),
            BinaryFunc::SubFloat32 => sub_float32(a, b),
            BinaryFunc::SubFloat64 => sub_float64(a, b),
            BinaryFunc::MulInt8 => mul_int8(a, b),
            BinaryFunc::MulInt16 => mul_int16(a, b),
            BinaryFunc::MulInt32 => mul_int32(a, b),
            BinaryFunc::MulInt64 => mul_int64(a, b),
            BinaryFunc::MulNumeric => mul_numeric(a, b),
            BinaryFunc::MulFloat32 => mul_float32(a, b),
            BinaryFunc::MulFloat64 => mul_float64(a, b),
            BinaryFunc::DivInt8 => div_int8(a, b),
            BinaryFunc::DivInt16 => div_int16(a, b),
            BinaryFunc::DivInt32 => div_int32(a, b),
            BinaryFunc::DivInt64 => div_int64(a, b),
            BinaryFunc::DivNumeric => div_numeric(a, b),
            BinaryFunc::DivFloat32 => div_float32(a, b),
            BinaryFunc::DivFloat64 => div_float64(a, b),
            BinaryFunc::ModInt8 => mod_int8(a, b),
            BinaryFunc::ModInt16 => mod_int16(a, b),
            BinaryFunc::ModInt32 => mod_int32(a, b),
            BinaryFunc::ModInt64 => mod_int64(a, b),
            BinaryFunc::ModNumeric => mod_numeric(a, b),
            BinaryFunc::ModFloat32 => mod_float32(a, b),
            BinaryFunc::ModFloat64 => mod_float64(a, b),
            BinaryFunc::Eq
            | BinaryFunc::NotEq
            | BinaryFunc::Lt
            | BinaryFunc::Lte
            | BinaryFunc::Gt
            | BinaryFunc::Gte => Ok(eval_cmp(self, a, b)),
            BinaryFunc::And => Ok(and(a, b)),
            BinaryFunc::Or => Ok(or(a, b)),
            BinaryFunc::NullIf => Ok(nullif(a, b)),
            BinaryFunc::TextConcat => {
                let mut buf = String::with_capacity(a.unwrap_str().len() + b.unwrap_str().len());
                buf.push_str(a.unwrap_str());
                buf.push_str(b.unwrap_str());
                Ok(Datum::String(buf))
            }
            BinaryFunc::Position => string::position(a.unwrap_str(), b.unwrap_str()),
            BinaryFunc::DateAddDate(units) => {
                datetime::date_add_date(*units, widen_int64(a), b.unwrap_date())
            }
            BinaryFunc::DateAddTime(units) => {
                datetime::date_add_time(*units, widen_int64(a), &b.unwrap_time())
            }
            BinaryFunc::DateAddTimestamp(units) => {
                datetime::date_add_timestamp(*units, widen_int64(a), &b.unwrap_timestamp())
            }
            BinaryFunc::DateDiffDate(units) => {
                datetime::date_diff_date(*units, a.unwrap_date(), b.unwrap_date())
            }
            BinaryFunc::DateDiffTime(units) => {
                datetime::date_diff_time(*units, &a.unwrap_time(), &b.unwrap_time())
            }
            BinaryFunc::DateDiffTimestamp(units) => {
                datetime::date_diff_timestamp(*units, &a.unwrap_timestamp(), &b.unwrap_timestamp())
            }
        }
    }

    /// Whether the invocation protocol should return null without calling
    /// this function when either argument is null.
    pub fn propagates_nulls(&self) -> bool {
        !matches!(self, BinaryFunc::And | BinaryFunc::Or)
    }

    /// Whether the invocation protocol should collapse a missing argument
    /// before calling this function.
    pub fn propagates_missing(&self) -> bool {
        !matches!(self, BinaryFunc::And | BinaryFunc::Or)
    }
}

/// A function over a variable number of arguments.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum VariadicFunc {
    Coalesce,
    Trim,
    Substring,
    Like,
}

impl VariadicFunc {
    pub fn eval(&self, _ecx: &EvalContext, args: &[Datum]) -> Result<Datum, EvalError> {
        match self {
            VariadicFunc::Coalesce => Ok(coalesce(args)),
            VariadicFunc::Trim => string::trim(args),
            VariadicFunc::Substring => string::substring(args),
            VariadicFunc::Like => like(args),
        }
    }

    /// Whether the invocation protocol should return null without calling
    /// this function when any argument is null.
    pub fn propagates_nulls(&self) -> bool {
        !matches!(self, VariadicFunc::Coalesce)
    }

    /// Whether the invocation protocol should collapse a missing argument
    /// before calling this function.
    pub fn propagates_missing(&self) -> bool {
        !matches!(self, VariadicFunc::Coalesce)
    }
}

#[cfg(test)]
mod tests {
    use sq_repr::adt::datetime::{Time, TimestampPrecision, Timezone};
    use sq_repr::Datum;

    use super::*;
    use crate::scalar::EvalContext;

    fn test_ecx() -> EvalContext {
        EvalContext {
            now: chrono::DateTime::from_timestamp(1_500_000_000, 0).unwrap(),
            current_user: Some("ion".into()),
        }
    }

    #[test]
    fn three_valued_and_or() {
        let cases = [
            (BinaryFunc::And, Datum::False, Datum::Null, Datum::False),
            (BinaryFunc::And, Datum::True, Datum::Null, Datum::Null),
            (BinaryFunc::And, Datum::True, Datum::True, Datum::True),
            (BinaryFunc::And, Datum::Null, Datum::Missing, Datum::Null),
            (BinaryFunc::Or, Datum::True, Datum::Null, Datum::True),
            (BinaryFunc::Or, Datum::False, Datum::Null, Datum::Null),
            (BinaryFunc::Or, Datum::False, Datum::False, Datum::False),
            (BinaryFunc::Or, Datum::Missing, Datum::True, Datum::True),
        ];
        let ecx = test_ecx();
        for (func, a, b, expected) in cases {
            assert_eq!(
                func.eval(&ecx, &a, &b).unwrap(),
                expected,
                "{:?}({:?}, {:?})",
                func,
                a,
                b
            );
        }
    }

    #[test]
    fn absence_predicates() {
        let ecx = test_ecx();
        let is_null = |d: &Datum| UnaryFunc::IsNull.eval(&ecx, d).unwrap();
        let is_missing = |d: &Datum| UnaryFunc::IsMissing.eval(&ecx, d).unwrap();
        assert_eq!(is_null(&Datum::Null), Datum::True);
        assert_eq!(is_null(&Datum::Missing), Datum::True);
        assert_eq!(is_null(&Datum::from(0i32)), Datum::False);
        assert_eq!(is_missing(&Datum::Missing), Datum::True);
        assert_eq!(is_missing(&Datum::Null), Datum::False);
    }

    #[test]
    fn checked_integer_arithmetic() {
        let ecx = test_ecx();
        assert_eq!(
            BinaryFunc::AddInt32
                .eval(&ecx, &Datum::from(2i32), &Datum::from(3i32))
                .unwrap(),
            Datum::from(5i32),
        );
        // A narrower argument widens to the resolved type.
        assert_eq!(
            BinaryFunc::AddInt32
                .eval(&ecx, &Datum::from(2i8), &Datum::from(3i32))
                .unwrap(),
            Datum::from(5i32),
        );
        assert_eq!(
            BinaryFunc::AddInt8
                .eval(&ecx, &Datum::from(i8::MAX), &Datum::from(1i8))
                .unwrap_err(),
            EvalError::NumericFieldOverflow,
        );
        assert_eq!(
            BinaryFunc::DivInt64
                .eval(&ecx, &Datum::from(1i64), &Datum::from(0i64))
                .unwrap_err(),
            EvalError::DivisionByZero,
        );
    }

    #[test]
    fn negation_widens_narrow_arguments() {
        let ecx = test_ecx();
        assert_eq!(
            UnaryFunc::NegInt32.eval(&ecx, &Datum::from(2i8)).unwrap(),
            Datum::from(-2i32),
        );
        assert_eq!(
            UnaryFunc::NegFloat64
                .eval(&ecx, &Datum::from(1.5f32))
                .unwrap(),
            Datum::from(-1.5f64),
        );
        assert_eq!(
            UnaryFunc::NegNumeric
                .eval(&ecx, &Datum::from(3i64))
                .unwrap(),
            Datum::from(Numeric::from(-3)),
        );
        assert_eq!(
            UnaryFunc::NegInt8
                .eval(&ecx, &Datum::from(i8::MIN))
                .unwrap_err(),
            EvalError::NumericFieldOverflow,
        );
    }

    #[test]
    fn cross_width_comparison() {
        let ecx = test_ecx();
        let gt = |a: Datum, b: Datum| BinaryFunc::Gt.eval(&ecx, &a, &b).unwrap();
        assert_eq!(gt(Datum::from(2i8), Datum::from(1i64)), Datum::True);
        assert_eq!(gt(Datum::from(2i64), Datum::from(2.5f64)), Datum::False);
        assert_eq!(
            gt(Datum::from(Numeric::from(3)), Datum::from(2i32)),
            Datum::True
        );
    }

    #[test]
    fn datetime_comparison_normalizes_offsets() {
        let ecx = test_ecx();
        let p0 = TimestampPrecision::try_from(0).unwrap();
        let ts = |h: u32, offset: i32| {
            let dt = chrono::NaiveDate::from_ymd_opt(2017, 1, 10)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap();
            Datum::from(Timestamp::new(dt, Some(Timezone::Offset(offset)), p0).unwrap())
        };
        let eq = |a: &Datum, b: &Datum| BinaryFunc::Eq.eval(&ecx, a, b).unwrap();
        let lt = |a: &Datum, b: &Datum| BinaryFunc::Lt.eval(&ecx, a, b).unwrap();

        // 05:00+00:00 and 06:00+01:00 are the same instant.
        assert_eq!(eq(&ts(5, 0), &ts(6, 60)), Datum::True);
        // 06:00+02:00 is an hour before 05:00+00:00 as an instant, though
        // its clock-face reading is later.
        assert_eq!(lt(&ts(6, 120), &ts(5, 0)), Datum::True);

        let time = |h: u32, offset: i32| {
            Datum::from(Time::new(
                chrono::NaiveTime::from_hms_opt(h, 30, 0).unwrap(),
                Some(Timezone::Offset(offset)),
                p0,
            ))
        };
        assert_eq!(eq(&time(5, 0), &time(6, 60)), Datum::True);
        assert_eq!(lt(&time(6, 120), &time(5, 0)), Datum::True);
    }

    #[test]
    fn coalesce_skips_both_absent_states() {
        let ecx = test_ecx();
        let out = VariadicFunc::Coalesce
            .eval(
                &ecx,
                &[Datum::Null, Datum::Missing, Datum::from(7i32), Datum::Null],
            )
            .unwrap();
        assert_eq!(out, Datum::from(7i32));
        let out = VariadicFunc::Coalesce
            .eval(&ecx, &[Datum::Null, Datum::Missing])
            .unwrap();
        assert_eq!(out, Datum::Null);
    }

    #[test]
    fn context_functions_read_injected_context() {
        let ecx = test_ecx();
        let now = NullaryFunc::UtcNow.eval(&ecx).unwrap();
        let ts = now.unwrap_timestamp();
        assert_eq!(ts.utc_datetime(), ecx.now.naive_utc());
        assert_eq!(
            NullaryFunc::CurrentUser.eval(&ecx).unwrap(),
            Datum::from("ion"),
        );
        let anon = EvalContext {
            current_user: None,
            ..ecx
        };
        assert_eq!(NullaryFunc::CurrentUser.eval(&anon).unwrap(), Datum::Null);
    }

    #[test]
    fn size_and_exists() {
        let ecx = test_ecx();
        let empty = Datum::Struct(vec![]);
        let one = Datum::Struct(vec![("a".into(), Datum::from(1i32))]);
        assert_eq!(
            UnaryFunc::Size.eval(&ecx, &empty).unwrap(),
            Datum::from(0i32)
        );
        assert_eq!(UnaryFunc::Size.eval(&ecx, &one).unwrap(), Datum::from(1i32));
        assert_eq!(UnaryFunc::Exists.eval(&ecx, &empty).unwrap(), Datum::False);
        assert_eq!(
            UnaryFunc::Exists
                .eval(&ecx, &Datum::Bag(vec![Datum::Null]))
                .unwrap(),
            Datum::True
        );
    }
}
