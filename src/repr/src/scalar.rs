// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use dec::OrderedDecimal;
use enum_kinds::EnumKind;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::adt::char::{CharLength, LobMaxLength, VarCharMaxLength};
use crate::adt::datetime::{Date, Time, Timestamp, TimestampPrecision};
use crate::adt::numeric::{Numeric, NumericMaxPrecision, NumericMaxScale};
use crate::ColumnType;

/// A single value.
///
/// A `Datum` is the runtime form of a value: a tagged union over every scalar
/// and container shape the dialect can produce. Two absent states exist and
/// are tracked independently: [`Datum::Null`] (SQL's unknown) and
/// [`Datum::Missing`] (the attribute was not there at all). Neither implies
/// the other.
///
/// The `unwrap_*` accessors panic on a datum of the wrong variant. Callers
/// run behind the invocation protocol's type check, which turns a mismatched
/// runtime type into an error before any body observes it.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, EnumKind)]
#[enum_kind(DatumKind, derive(Ord, PartialOrd))]
pub enum Datum {
    /// The `false` boolean value.
    False,
    /// The `true` boolean value.
    True,
    /// An 8-bit signed integer.
    Int8(i8),
    /// A 16-bit signed integer.
    Int16(i16),
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// An exact decimal number, possibly with a fractional component, with up
    /// to 39 digits of precision. Integers wider than 64 bits are also
    /// carried in this variant.
    Numeric(OrderedDecimal<Numeric>),
    /// A 32-bit floating point number.
    Float32(OrderedFloat<f32>),
    /// A 64-bit floating point number.
    Float64(OrderedFloat<f64>),
    /// A date.
    Date(Date),
    /// A time of day.
    Time(Time),
    /// A date and time of day, possibly with a timezone.
    Timestamp(Timestamp),
    /// A sequence of Unicode codepoints.
    String(String),
    /// An interned-style identifier string.
    Symbol(String),
    /// A sequence of untyped bytes.
    Bytes(Vec<u8>),
    /// An ordered sequence of datums.
    Array(Vec<Datum>),
    /// An unordered collection of datums.
    Bag(Vec<Datum>),
    /// An s-expression: an ordered sequence with list semantics.
    Sexp(Vec<Datum>),
    /// An ordered map from field names to datums.
    Struct(Vec<(String, Datum)>),
    /// An unknown value.
    Null,
    /// An absent value.
    Missing,
}

impl Datum {
    /// Reports whether this datum is `Datum::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Reports whether this datum is `Datum::Missing`.
    pub fn is_missing(&self) -> bool {
        matches!(self, Datum::Missing)
    }

    /// Reports whether this datum is null or missing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Datum::Null | Datum::Missing)
    }

    /// Unwraps the boolean value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::False`] or [`Datum::True`].
    pub fn unwrap_bool(&self) -> bool {
        match self {
            Datum::False => false,
            Datum::True => true,
            _ => panic!("Datum::unwrap_bool called on {:?}", self),
        }
    }

    /// Unwraps the 8-bit integer value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Int8`].
    pub fn unwrap_int8(&self) -> i8 {
        match self {
            Datum::Int8(i) => *i,
            _ => panic!("Datum::unwrap_int8 called on {:?}", self),
        }
    }

    /// Unwraps the 16-bit integer value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Int16`].
    pub fn unwrap_int16(&self) -> i16 {
        match self {
            Datum::Int16(i) => *i,
            _ => panic!("Datum::unwrap_int16 called on {:?}", self),
        }
    }

    /// Unwraps the 32-bit integer value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Int32`].
    pub fn unwrap_int32(&self) -> i32 {
        match self {
            Datum::Int32(i) => *i,
            _ => panic!("Datum::unwrap_int32 called on {:?}", self),
        }
    }

    /// Unwraps the 64-bit integer value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Int64`].
    pub fn unwrap_int64(&self) -> i64 {
        match self {
            Datum::Int64(i) => *i,
            _ => panic!("Datum::unwrap_int64 called on {:?}", self),
        }
    }

    /// Unwraps the decimal value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Numeric`].
    pub fn unwrap_numeric(&self) -> OrderedDecimal<Numeric> {
        match self {
            Datum::Numeric(n) => *n,
            _ => panic!("Datum::unwrap_numeric called on {:?}", self),
        }
    }

    /// Unwraps the 32-bit floating-point value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Float32`].
    pub fn unwrap_float32(&self) -> f32 {
        match self {
            Datum::Float32(f) => f.into_inner(),
            _ => panic!("Datum::unwrap_float32 called on {:?}", self),
        }
    }

    /// Unwraps the 64-bit floating-point value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Float64`].
    pub fn unwrap_float64(&self) -> f64 {
        match self {
            Datum::Float64(f) => f.into_inner(),
            _ => panic!("Datum::unwrap_float64 called on {:?}", self),
        }
    }

    /// Unwraps the date value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Date`].
    pub fn unwrap_date(&self) -> Date {
        match self {
            Datum::Date(d) => *d,
            _ => panic!("Datum::unwrap_date called on {:?}", self),
        }
    }

    /// Unwraps the time value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Time`].
    pub fn unwrap_time(&self) -> Time {
        match self {
            Datum::Time(t) => *t,
            _ => panic!("Datum::unwrap_time called on {:?}", self),
        }
    }

    /// Unwraps the timestamp value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Timestamp`].
    pub fn unwrap_timestamp(&self) -> Timestamp {
        match self {
            Datum::Timestamp(ts) => *ts,
            _ => panic!("Datum::unwrap_timestamp called on {:?}", self),
        }
    }

    /// Unwraps the string value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::String`] or [`Datum::Symbol`].
    pub fn unwrap_str(&self) -> &str {
        match self {
            Datum::String(s) | Datum::Symbol(s) => s,
            _ => panic!("Datum::unwrap_str called on {:?}", self),
        }
    }

    /// Unwraps the bytes value within this datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Bytes`].
    pub fn unwrap_bytes(&self) -> &[u8] {
        match self {
            Datum::Bytes(b) => b,
            _ => panic!("Datum::unwrap_bytes called on {:?}", self),
        }
    }

    /// Unwraps the elements of a container datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Array`], [`Datum::Bag`], or
    /// [`Datum::Sexp`].
    pub fn unwrap_elements(&self) -> &[Datum] {
        match self {
            Datum::Array(elems) | Datum::Bag(elems) | Datum::Sexp(elems) => elems,
            _ => panic!("Datum::unwrap_elements called on {:?}", self),
        }
    }

    /// Unwraps the fields of a struct datum.
    ///
    /// # Panics
    ///
    /// Panics if the datum is not [`Datum::Struct`].
    pub fn unwrap_struct(&self) -> &[(String, Datum)] {
        match self {
            Datum::Struct(fields) => fields,
            _ => panic!("Datum::unwrap_struct called on {:?}", self),
        }
    }

    /// Reports whether this datum is an instance of the specified scalar
    /// type, i.e. whether a function body expecting that type may consume it.
    ///
    /// `Null` and `Missing` are instances of every type; the invocation
    /// protocol elides them before any body runs.
    pub fn is_instance_of(&self, scalar_type: &ScalarType) -> bool {
        match (self, scalar_type) {
            (_, ScalarType::Dynamic) => true,
            (Datum::Null, _) | (Datum::Missing, _) => true,
            (Datum::False | Datum::True, ScalarType::Bool) => true,
            (Datum::Int8(_), ScalarType::TinyInt) => true,
            (Datum::Int16(_), ScalarType::SmallInt) => true,
            (Datum::Int32(_), ScalarType::Int) => true,
            (Datum::Int64(_), ScalarType::BigInt) => true,
            (Datum::Numeric(_), ScalarType::IntArbitrary | ScalarType::Decimal { .. }) => true,
            (Datum::Float32(_), ScalarType::Real) => true,
            (Datum::Float64(_), ScalarType::Double) => true,
            (Datum::Date(_), ScalarType::Date) => true,
            (Datum::Time(_), ScalarType::Time { .. }) => true,
            (Datum::Timestamp(_), ScalarType::Timestamp { .. }) => true,
            (
                Datum::String(_),
                ScalarType::Char { .. }
                | ScalarType::VarChar { .. }
                | ScalarType::String
                | ScalarType::Clob { .. },
            ) => true,
            (Datum::Symbol(_), ScalarType::Symbol) => true,
            (Datum::Bytes(_), ScalarType::Blob { .. }) => true,
            (Datum::Array(_), ScalarType::Array) => true,
            (Datum::Bag(_), ScalarType::Bag) => true,
            (Datum::Sexp(_), ScalarType::Sexp) => true,
            (Datum::Struct(_), ScalarType::Struct) => true,
            _ => false,
        }
    }

    /// The dynamic [`ScalarType`] of this datum, with unconstrained
    /// parameters. Used for diagnostics and for aggregates that must discover
    /// their input type at the first row.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Datum::False | Datum::True => ScalarType::Bool,
            Datum::Int8(_) => ScalarType::TinyInt,
            Datum::Int16(_) => ScalarType::SmallInt,
            Datum::Int32(_) => ScalarType::Int,
            Datum::Int64(_) => ScalarType::BigInt,
            Datum::Numeric(_) => ScalarType::Decimal {
                max_precision: None,
                max_scale: None,
            },
            Datum::Float32(_) => ScalarType::Real,
            Datum::Float64(_) => ScalarType::Double,
            Datum::Date(_) => ScalarType::Date,
            Datum::Time(t) => ScalarType::Time {
                precision: Some(t.precision),
            },
            Datum::Timestamp(ts) => ScalarType::Timestamp {
                precision: Some(ts.precision),
            },
            Datum::String(_) => ScalarType::String,
            Datum::Symbol(_) => ScalarType::Symbol,
            Datum::Bytes(_) => ScalarType::Blob { max_length: None },
            Datum::Array(_) => ScalarType::Array,
            Datum::Bag(_) => ScalarType::Bag,
            Datum::Sexp(_) => ScalarType::Sexp,
            Datum::Struct(_) => ScalarType::Struct,
            Datum::Null => ScalarType::Null,
            Datum::Missing => ScalarType::Missing,
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Datum {
        if b {
            Datum::True
        } else {
            Datum::False
        }
    }
}

impl From<i8> for Datum {
    fn from(i: i8) -> Datum {
        Datum::Int8(i)
    }
}

impl From<i16> for Datum {
    fn from(i: i16) -> Datum {
        Datum::Int16(i)
    }
}

impl From<i32> for Datum {
    fn from(i: i32) -> Datum {
        Datum::Int32(i)
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Datum {
        Datum::Int64(i)
    }
}

impl From<f32> for Datum {
    fn from(f: f32) -> Datum {
        Datum::Float32(OrderedFloat(f))
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Datum {
        Datum::Float64(OrderedFloat(f))
    }
}

impl From<Numeric> for Datum {
    fn from(n: Numeric) -> Datum {
        Datum::Numeric(OrderedDecimal(n))
    }
}

impl From<OrderedDecimal<Numeric>> for Datum {
    fn from(n: OrderedDecimal<Numeric>) -> Datum {
        Datum::Numeric(n)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Datum {
        Datum::String(s.into())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Datum {
        Datum::String(s)
    }
}

impl From<Date> for Datum {
    fn from(d: Date) -> Datum {
        Datum::Date(d)
    }
}

impl From<Time> for Datum {
    fn from(t: Time) -> Datum {
        Datum::Time(t)
    }
}

impl From<Timestamp> for Datum {
    fn from(ts: Timestamp) -> Datum {
        Datum::Timestamp(ts)
    }
}

impl<T> From<Option<T>> for Datum
where
    Datum: From<T>,
{
    fn from(o: Option<T>) -> Datum {
        match o {
            Some(v) => v.into(),
            None => Datum::Null,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_elements(f: &mut fmt::Formatter, elems: &[Datum]) -> fmt::Result {
            let mut first = true;
            for elem in elems {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{}", elem)?;
            }
            Ok(())
        }

        match self {
            Datum::False => f.write_str("false"),
            Datum::True => f.write_str("true"),
            Datum::Int8(i) => write!(f, "{}", i),
            Datum::Int16(i) => write!(f, "{}", i),
            Datum::Int32(i) => write!(f, "{}", i),
            Datum::Int64(i) => write!(f, "{}", i),
            Datum::Numeric(n) => write!(f, "{}", n.0.to_standard_notation_string()),
            Datum::Float32(n) => write!(f, "{}", n),
            Datum::Float64(n) => write!(f, "{}", n),
            Datum::Date(d) => write!(f, "{}", d),
            Datum::Time(t) => write!(f, "{}", t),
            Datum::Timestamp(ts) => write!(f, "{}", ts),
            Datum::String(s) => write!(f, "{:?}", s),
            Datum::Symbol(s) => f.write_str(s),
            Datum::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Datum::Array(elems) => {
                f.write_str("[")?;
                write_elements(f, elems)?;
                f.write_str("]")
            }
            Datum::Bag(elems) => {
                f.write_str("<<")?;
                write_elements(f, elems)?;
                f.write_str(">>")
            }
            Datum::Sexp(elems) => {
                f.write_str("(")?;
                write_elements(f, elems)?;
                f.write_str(")")
            }
            Datum::Struct(fields) => {
                f.write_str("{")?;
                let mut first = true;
                for (name, value) in fields {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str("}")
            }
            Datum::Null => f.write_str("null"),
            Datum::Missing => f.write_str("missing"),
        }
    }
}

/// The type of a [`Datum`].
///
/// There is a direct correspondence between `Datum` variants and `ScalarType`
/// variants, except that several text and numeric types share a datum
/// representation and are distinguished only statically.
#[derive(
    Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, EnumKind, Serialize, Deserialize,
)]
#[enum_kind(
    ScalarBaseType,
    derive(Hash, Ord, PartialOrd, Serialize, Deserialize)
)]
pub enum ScalarType {
    /// The type of [`Datum::Int8`].
    TinyInt,
    /// The type of [`Datum::Int16`].
    SmallInt,
    /// The type of [`Datum::Int32`].
    Int,
    /// The type of [`Datum::Int64`].
    BigInt,
    /// An integer of unbounded width, carried as [`Datum::Numeric`].
    IntArbitrary,
    /// The type of [`Datum::Numeric`].
    Decimal {
        /// The maximum number of significant digits, if bounded.
        max_precision: Option<NumericMaxPrecision>,
        /// The maximum number of digits after the decimal point, if bounded.
        max_scale: Option<NumericMaxScale>,
    },
    /// The type of [`Datum::Float32`].
    Real,
    /// The type of [`Datum::Float64`].
    Double,
    /// The type of [`Datum::False`] and [`Datum::True`].
    Bool,
    /// Stored as [`Datum::String`], padded to exactly `length` codepoints.
    Char {
        /// The number of codepoints, if bounded.
        length: Option<CharLength>,
    },
    /// Stored as [`Datum::String`], limited to `max_length` codepoints.
    VarChar {
        /// The maximum number of codepoints, if bounded.
        max_length: Option<VarCharMaxLength>,
    },
    /// The type of [`Datum::String`].
    String,
    /// The type of [`Datum::Symbol`].
    Symbol,
    /// A character large object, stored as [`Datum::String`].
    Clob {
        /// The maximum number of codepoints, if bounded.
        max_length: Option<LobMaxLength>,
    },
    /// The type of [`Datum::Bytes`].
    Blob {
        /// The maximum number of bytes, if bounded.
        max_length: Option<LobMaxLength>,
    },
    /// The type of [`Datum::Date`].
    Date,
    /// The type of [`Datum::Time`].
    Time {
        /// The number of fractional-second digits retained, if declared.
        precision: Option<TimestampPrecision>,
    },
    /// The type of [`Datum::Timestamp`].
    Timestamp {
        /// The number of fractional-second digits retained, if declared.
        precision: Option<TimestampPrecision>,
    },
    /// The type of [`Datum::Array`].
    Array,
    /// The type of [`Datum::Bag`].
    Bag,
    /// The type of [`Datum::Sexp`].
    Sexp,
    /// The type of [`Datum::Struct`].
    Struct,
    /// The top of the type lattice: every type is a subtype of `Dynamic`.
    /// Used in signatures to accept any argument; never the dynamic type of
    /// a value.
    Dynamic,
    /// The type of [`Datum::Null`].
    Null,
    /// The type of [`Datum::Missing`].
    Missing,
}

impl ScalarType {
    /// Derives a [`ColumnType`] from this scalar type with the specified
    /// nullability.
    pub fn nullable(self, nullable: bool) -> ColumnType {
        ColumnType {
            scalar_type: self,
            nullable,
        }
    }

    /// Reports whether the base types (variants, disregarding parameters) of
    /// `self` and `other` are equal.
    pub fn base_eq(&self, other: &ScalarType) -> bool {
        ScalarBaseType::from(self) == ScalarBaseType::from(other)
    }

    /// The position of this type in the numeric tower, or `None` if it is
    /// not numeric. Widening is permitted from a lower rank to a higher one.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            ScalarType::TinyInt => Some(0),
            ScalarType::SmallInt => Some(1),
            ScalarType::Int => Some(2),
            ScalarType::BigInt => Some(3),
            ScalarType::IntArbitrary => Some(4),
            ScalarType::Decimal { .. } => Some(5),
            ScalarType::Real => Some(6),
            ScalarType::Double => Some(7),
            _ => None,
        }
    }

    /// Reports whether this type is in the numeric tower.
    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Reports whether this type is a text type stored as [`Datum::String`].
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ScalarType::Char { .. }
                | ScalarType::VarChar { .. }
                | ScalarType::String
                | ScalarType::Clob { .. }
        )
    }

    /// Reports whether `self` is a subtype of `other`.
    ///
    /// The partial order is driven by three relations, plus reflexivity:
    ///
    /// * every type is a subtype of [`ScalarType::Dynamic`], and
    ///   [`ScalarType::Null`] and [`ScalarType::Missing`] are subtypes of
    ///   every type;
    /// * a numeric type is a subtype of every numeric type of greater or
    ///   equal rank (see [`ScalarType::numeric_rank`]);
    /// * bounded text, blob, and datetime types are subtypes of the same (or
    ///   a laxer) base type with a greater or equal bound, where an absent
    ///   bound is the laxest.
    pub fn is_subtype_of(&self, other: &ScalarType) -> bool {
        fn bound_within<T: Ord + Copy>(inner: Option<T>, outer: Option<T>) -> bool {
            match (inner, outer) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(i), Some(o)) => i <= o,
            }
        }

        if self == other {
            return true;
        }
        match (self, other) {
            (_, ScalarType::Dynamic) => true,
            (ScalarType::Null, _) | (ScalarType::Missing, _) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => a.numeric_rank() <= b.numeric_rank(),
            (ScalarType::Char { length: a }, ScalarType::Char { length: b }) => {
                bound_within(a.map(CharLength::into_u32), b.map(CharLength::into_u32))
            }
            (ScalarType::Char { length: a }, ScalarType::VarChar { max_length: b }) => {
                bound_within(
                    a.map(CharLength::into_u32),
                    b.map(VarCharMaxLength::into_u32),
                )
            }
            (ScalarType::VarChar { max_length: a }, ScalarType::VarChar { max_length: b }) => {
                bound_within(
                    a.map(VarCharMaxLength::into_u32),
                    b.map(VarCharMaxLength::into_u32),
                )
            }
            (ScalarType::Char { .. } | ScalarType::VarChar { .. }, ScalarType::String) => true,
            (
                ScalarType::Char { .. } | ScalarType::VarChar { .. } | ScalarType::String,
                ScalarType::Clob { max_length: b },
            ) => {
                // String and the bounded text types fit in an unbounded clob;
                // a bounded clob only admits text bounded at least as
                // tightly.
                let a = match self {
                    ScalarType::Char { length } => length.map(CharLength::into_u32),
                    ScalarType::VarChar { max_length } => {
                        max_length.map(VarCharMaxLength::into_u32)
                    }
                    _ => None,
                };
                match (a, b) {
                    (_, None) => true,
                    (Some(a), Some(b)) => a <= b.into_u32(),
                    (None, Some(_)) => false,
                }
            }
            (ScalarType::Clob { max_length: a }, ScalarType::Clob { max_length: b })
            | (ScalarType::Blob { max_length: a }, ScalarType::Blob { max_length: b }) => {
                bound_within(
                    a.map(LobMaxLength::into_u32),
                    b.map(LobMaxLength::into_u32),
                )
            }
            (ScalarType::Time { precision: a }, ScalarType::Time { precision: b })
            | (ScalarType::Timestamp { precision: a }, ScalarType::Timestamp { precision: b }) => {
                bound_within(
                    a.map(TimestampPrecision::into_u8),
                    b.map(TimestampPrecision::into_u8),
                )
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn any_scalar_type() -> impl Strategy<Value = ScalarType> {
        prop_oneof![
            Just(ScalarType::TinyInt),
            Just(ScalarType::SmallInt),
            Just(ScalarType::Int),
            Just(ScalarType::BigInt),
            Just(ScalarType::IntArbitrary),
            Just(ScalarType::Decimal {
                max_precision: None,
                max_scale: None
            }),
            Just(ScalarType::Real),
            Just(ScalarType::Double),
            Just(ScalarType::Bool),
            (1i64..64).prop_map(|n| ScalarType::Char {
                length: Some(CharLength::try_from(n).unwrap())
            }),
            (1i64..64).prop_map(|n| ScalarType::VarChar {
                max_length: Some(VarCharMaxLength::try_from(n).unwrap())
            }),
            Just(ScalarType::String),
            Just(ScalarType::Symbol),
            Just(ScalarType::Date),
            (0i64..9).prop_map(|p| ScalarType::Timestamp {
                precision: Some(TimestampPrecision::try_from(p).unwrap())
            }),
            Just(ScalarType::Array),
            Just(ScalarType::Struct),
            Just(ScalarType::Dynamic),
            Just(ScalarType::Null),
            Just(ScalarType::Missing),
        ]
    }

    proptest! {
        #[test]
        fn subtyping_is_reflexive(ty in any_scalar_type()) {
            prop_assert!(ty.is_subtype_of(&ty));
        }

        #[test]
        fn subtyping_is_transitive(
            a in any_scalar_type(),
            b in any_scalar_type(),
            c in any_scalar_type(),
        ) {
            if a.is_subtype_of(&b) && b.is_subtype_of(&c) {
                prop_assert!(a.is_subtype_of(&c));
            }
        }

        #[test]
        fn dynamic_is_top(ty in any_scalar_type()) {
            prop_assert!(ty.is_subtype_of(&ScalarType::Dynamic));
        }
    }

    #[test]
    fn numeric_tower_widens_upward() {
        let tower = [
            ScalarType::TinyInt,
            ScalarType::SmallInt,
            ScalarType::Int,
            ScalarType::BigInt,
            ScalarType::IntArbitrary,
            ScalarType::Decimal {
                max_precision: None,
                max_scale: None,
            },
            ScalarType::Real,
            ScalarType::Double,
        ];
        for (i, narrow) in tower.iter().enumerate() {
            for (j, wide) in tower.iter().enumerate() {
                assert_eq!(narrow.is_subtype_of(wide), i <= j, "{:?} vs {:?}", narrow, wide);
            }
        }
    }

    #[test]
    fn text_length_containment() {
        let char4 = ScalarType::Char {
            length: Some(CharLength::try_from(4).unwrap()),
        };
        let varchar8 = ScalarType::VarChar {
            max_length: Some(VarCharMaxLength::try_from(8).unwrap()),
        };
        let varchar2 = ScalarType::VarChar {
            max_length: Some(VarCharMaxLength::try_from(2).unwrap()),
        };
        assert!(char4.is_subtype_of(&varchar8));
        assert!(!char4.is_subtype_of(&varchar2));
        assert!(char4.is_subtype_of(&ScalarType::String));
        assert!(ScalarType::String.is_subtype_of(&ScalarType::Clob { max_length: None }));
        assert!(!ScalarType::String.is_subtype_of(&varchar8));
    }

    #[test]
    fn null_and_missing_are_bottom() {
        for ty in [ScalarType::Int, ScalarType::String, ScalarType::Struct] {
            assert!(ScalarType::Null.is_subtype_of(&ty));
            assert!(ScalarType::Missing.is_subtype_of(&ty));
            assert!(!ty.is_subtype_of(&ScalarType::Null));
        }
    }

    #[test]
    fn datum_instance_checks() {
        assert!(Datum::from(5i32).is_instance_of(&ScalarType::Int));
        assert!(!Datum::from(5i32).is_instance_of(&ScalarType::BigInt));
        assert!(Datum::from(5i32).is_instance_of(&ScalarType::Dynamic));
        assert!(Datum::Null.is_instance_of(&ScalarType::Int));
        assert!(Datum::from("a").is_instance_of(&ScalarType::VarChar { max_length: None }));
        assert!(!Datum::from("a").is_instance_of(&ScalarType::Symbol));
    }
}
