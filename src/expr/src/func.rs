// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The signature catalog and overload resolution.
//!
//! A [`Catalog`] maps function names to overload groups. Resolution runs
//! once per call site, against static argument types; the winning
//! [`FuncImpl`] is then invoked once per row. The preference order when
//! several overloads accept the arguments is part of the public contract:
//! an exact match beats one that required numeric promotion, which beats
//! one that fell through to a `Dynamic` parameter, and any remaining tie
//! goes to the overload declared first.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use itertools::Itertools;
use sq_repr::adt::datetime::DateTimeUnits;
use sq_repr::{ColumnType, Datum, ScalarType};
use tracing::debug;

use crate::relation::func::{Accumulator, AggregateFunc};
use crate::scalar::func::{BinaryFunc, NullaryFunc, UnaryFunc, VariadicFunc};
use crate::scalar::{EvalContext, EvalError};

/// A parameter type in a function signature.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum ParamType {
    /// Accepts any argument whose type is a subtype of the given type.
    Plain(ScalarType),
    /// Accepts any argument at all. Equivalent to `Plain(Dynamic)` during
    /// matching, and exempt from the runtime type check.
    Any,
}

/// How well an argument type fit a parameter, from best to worst.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum MatchQuality {
    Exact,
    Promoted,
    Dynamic,
}

impl ParamType {
    fn match_quality(&self, arg: &ScalarType) -> Option<MatchQuality> {
        match self {
            ParamType::Any | ParamType::Plain(ScalarType::Dynamic) => Some(MatchQuality::Dynamic),
            ParamType::Plain(param) if arg == param => Some(MatchQuality::Exact),
            ParamType::Plain(param) if arg.base_eq(param) && arg.is_subtype_of(param) => {
                Some(MatchQuality::Exact)
            }
            ParamType::Plain(param) if arg.is_subtype_of(param) => Some(MatchQuality::Promoted),
            ParamType::Plain(_) => None,
        }
    }

    /// The runtime counterpart of [`ParamType::match_quality`]: whether a
    /// datum that arrives at evaluation time is acceptable here.
    fn accepts_datum(&self, datum: &Datum) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Plain(param) => {
                datum.is_instance_of(param) || datum.scalar_type().is_subtype_of(param)
            }
        }
    }
}

impl From<ScalarType> for ParamType {
    fn from(ty: ScalarType) -> ParamType {
        ParamType::Plain(ty)
    }
}

/// The parameters of one signature: a fixed list, or a single type repeated
/// for every argument (`trim`'s specification-plus-remainder form).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum ParamList {
    Exact(Vec<ParamType>),
    Variadic(ParamType),
}

impl ParamList {
    fn matches_arity(&self, arity: usize) -> bool {
        match self {
            ParamList::Exact(params) => params.len() == arity,
            ParamList::Variadic(_) => arity >= 1,
        }
    }

    /// The parameter governing the argument at `position`.
    fn param(&self, position: usize) -> &ParamType {
        match self {
            ParamList::Exact(params) => &params[position],
            ParamList::Variadic(param) => param,
        }
    }

    fn match_qualities(&self, arg_types: &[ScalarType]) -> Option<Vec<MatchQuality>> {
        if !self.matches_arity(arg_types.len()) {
            return None;
        }
        arg_types
            .iter()
            .enumerate()
            .map(|(i, arg)| self.param(i).match_quality(arg))
            .collect()
    }
}

impl fmt::Display for ParamList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamList::Exact(params) => {
                write!(f, "({})", params.iter().map(|p| format!("{:?}", p)).join(", "))
            }
            ParamList::Variadic(param) => write!(f, "({:?}...)", param),
        }
    }
}

/// The executable behind a signature.
#[derive(Debug, Clone)]
pub enum Operation {
    Nullary(NullaryFunc),
    Unary(UnaryFunc),
    Binary(BinaryFunc),
    Variadic(VariadicFunc),
    Aggregate(AggregateFunc),
}

impl Operation {
    fn propagates_nulls(&self) -> bool {
        match self {
            Operation::Nullary(_) => false,
            Operation::Unary(f) => f.propagates_nulls(),
            Operation::Binary(f) => f.propagates_nulls(),
            Operation::Variadic(f) => f.propagates_nulls(),
            // Aggregates do their own null skipping, row by row.
            Operation::Aggregate(_) => false,
        }
    }

    fn propagates_missing(&self) -> bool {
        match self {
            Operation::Nullary(_) => false,
            Operation::Unary(f) => f.propagates_missing(),
            Operation::Binary(f) => f.propagates_missing(),
            Operation::Variadic(f) => f.propagates_missing(),
            Operation::Aggregate(_) => false,
        }
    }
}

/// One overload: a parameter list, a declared return type, and a body.
#[derive(Debug, Clone)]
pub struct FuncImpl {
    pub params: ParamList,
    pub return_type: ColumnType,
    pub op: Operation,
}

impl FuncImpl {
    /// Evaluates this function over one row of arguments.
    ///
    /// The protocol runs in order: missing elision (missing takes precedence
    /// over null, and both collapse to a typed null), then null elision,
    /// then a defensive runtime type check, then the body. Functions like
    /// `is_null`, `is_missing`, `and`, and `or` opt out of elision and see
    /// their arguments raw.
    pub fn invoke(&self, ecx: &EvalContext, args: &[Datum]) -> Result<Datum, EvalError> {
        if self.op.propagates_missing() && args.iter().any(Datum::is_missing) {
            return Ok(Datum::Null);
        }
        if self.op.propagates_nulls() && args.iter().any(Datum::is_null) {
            return Ok(Datum::Null);
        }
        for (i, arg) in args.iter().enumerate() {
            let param = self.params.param(i);
            if !param.accepts_datum(arg) {
                let expected = match param {
                    ParamType::Plain(ty) => ty.clone(),
                    ParamType::Any => ScalarType::Dynamic,
                };
                return Err(EvalError::TypeCheck {
                    expected,
                    actual: arg.scalar_type(),
                });
            }
        }
        match &self.op {
            Operation::Nullary(f) => f.eval(ecx),
            Operation::Unary(f) => f.eval(ecx, &args[0]),
            Operation::Binary(f) => f.eval(ecx, &args[0], &args[1]),
            Operation::Variadic(f) => f.eval(ecx, args),
            Operation::Aggregate(_) => Err(EvalError::Internal(
                "aggregate function invoked as a scalar".into(),
            )),
        }
    }

    /// Creates the accumulator for an aggregate signature, or `None` for a
    /// scalar one.
    pub fn accumulator(&self) -> Option<Accumulator> {
        match &self.op {
            Operation::Aggregate(f) => Some(f.accumulator()),
            _ => None,
        }
    }
}

/// An overload group: every signature registered under one name.
#[derive(Debug, Clone, Default)]
pub struct Func {
    impls: Vec<FuncImpl>,
}

impl Func {
    /// The signatures in declaration order.
    pub fn impls(&self) -> &[FuncImpl] {
        &self.impls
    }
}

/// The reasons resolution can fail. These abort planning; no row ever flows
/// through an unresolved call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionError {
    UnknownFunction(String),
    NoApplicableOverload {
        name: String,
        actual: Vec<ScalarType>,
        expected: Vec<ParamList>,
    },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResolutionError::UnknownFunction(name) => {
                write!(f, "function {} does not exist", name)
            }
            ResolutionError::NoApplicableOverload {
                name,
                actual,
                expected,
            } => {
                write!(
                    f,
                    "no overload of {} accepts arguments of type ({}); candidates are: {}",
                    name,
                    actual.iter().map(|t| format!("{:?}", t)).join(", "),
                    expected.iter().map(|p| format!("{}", p)).join("; "),
                )
            }
        }
    }
}

impl Error for ResolutionError {}

/// The error returned when registering a signature that collides with an
/// existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateSignatureError {
    pub name: String,
    pub params: ParamList,
}

impl fmt::Display for DuplicateSignatureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "function {} is already registered with parameters {}",
            self.name, self.params
        )
    }
}

impl Error for DuplicateSignatureError {}

/// The function catalog.
///
/// Built once at engine start and immutable afterwards; lookup and
/// resolution take `&self` and are safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    funcs: BTreeMap<&'static str, Func>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Catalog {
        Catalog::default()
    }

    /// Registers a signature. Fails if a signature with the same name and
    /// parameter types already exists.
    pub fn register(
        &mut self,
        name: &'static str,
        imp: FuncImpl,
    ) -> Result<(), DuplicateSignatureError> {
        let func = self.funcs.entry(name).or_default();
        if func.impls.iter().any(|prior| prior.params == imp.params) {
            return Err(DuplicateSignatureError {
                name: name.into(),
                params: imp.params,
            });
        }
        func.impls.push(imp);
        Ok(())
    }

    /// The overload group for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Func> {
        self.funcs.get(name)
    }

    /// Selects the one signature for a call site.
    ///
    /// Deterministic: the same name and argument types always resolve to
    /// the same overload.
    pub fn resolve(
        &self,
        name: &str,
        arg_types: &[ScalarType],
    ) -> Result<&FuncImpl, ResolutionError> {
        let func = self
            .lookup(name)
            .ok_or_else(|| ResolutionError::UnknownFunction(name.into()))?;

        // Score: how many positions matched exactly, and of the rest how
        // many needed only promotion. Higher is better; the first declared
        // wins ties.
        let mut best: Option<(&FuncImpl, (usize, usize))> = None;
        for imp in &func.impls {
            let qualities = match imp.params.match_qualities(arg_types) {
                Some(qualities) => qualities,
                None => continue,
            };
            let exact = qualities
                .iter()
                .filter(|q| **q == MatchQuality::Exact)
                .count();
            let promoted = qualities
                .iter()
                .filter(|q| **q == MatchQuality::Promoted)
                .count();
            let score = (exact, promoted);
            match &best {
                Some((_, best_score)) if *best_score >= score => {}
                _ => best = Some((imp, score)),
            }
        }

        match best {
            Some((imp, _)) => Ok(imp),
            None => {
                debug!(name, ?arg_types, "no applicable overload");
                Err(ResolutionError::NoApplicableOverload {
                    name: name.into(),
                    actual: arg_types.to_vec(),
                    expected: func.impls.iter().map(|imp| imp.params.clone()).collect(),
                })
            }
        }
    }

    /// Builds the full builtin catalog.
    pub fn standard() -> Catalog {
        let mut catalog = Catalog::new();
        builtins::install(&mut catalog);
        debug!(
            functions = catalog.funcs.len(),
            "constructed standard catalog"
        );
        catalog
    }
}

macro_rules! params {
    ($p:expr; ...) => { ParamList::Variadic($p.into()) };
    ($($p:expr),*) => { ParamList::Exact(vec![$($p.into(),)*]) };
}

mod builtins {
    use super::*;

    fn decimal() -> ScalarType {
        ScalarType::Decimal {
            max_precision: None,
            max_scale: None,
        }
    }

    fn time() -> ScalarType {
        ScalarType::Time { precision: None }
    }

    fn timestamp() -> ScalarType {
        ScalarType::Timestamp { precision: None }
    }

    /// The numeric tower, narrowest first, with the arithmetic ops for each
    /// member. One row per type keeps the operator registrations data-driven
    /// instead of hand-duplicated.
    #[rustfmt::skip]
    fn tower() -> Vec<(ScalarType, [BinaryFunc; 5], UnaryFunc)> {
        use BinaryFunc::*;
        vec![
            (ScalarType::TinyInt, [AddInt8, SubInt8, MulInt8, DivInt8, ModInt8], UnaryFunc::NegInt8),
            (ScalarType::SmallInt, [AddInt16, SubInt16, MulInt16, DivInt16, ModInt16], UnaryFunc::NegInt16),
            (ScalarType::Int, [AddInt32, SubInt32, MulInt32, DivInt32, ModInt32], UnaryFunc::NegInt32),
            (ScalarType::BigInt, [AddInt64, SubInt64, MulInt64, DivInt64, ModInt64], UnaryFunc::NegInt64),
            (ScalarType::IntArbitrary, [AddNumeric, SubNumeric, MulNumeric, DivNumeric, ModNumeric], UnaryFunc::NegNumeric),
            (decimal(), [AddNumeric, SubNumeric, MulNumeric, DivNumeric, ModNumeric], UnaryFunc::NegNumeric),
            (ScalarType::Real, [AddFloat32, SubFloat32, MulFloat32, DivFloat32, ModFloat32], UnaryFunc::NegFloat32),
            (ScalarType::Double, [AddFloat64, SubFloat64, MulFloat64, DivFloat64, ModFloat64], UnaryFunc::NegFloat64),
        ]
    }

    /// The `date_add_*` and `date_diff_*` names for an interval unit.
    fn interval_names(units: DateTimeUnits) -> (&'static str, &'static str) {
        match units {
            DateTimeUnits::Year => ("date_add_year", "date_diff_year"),
            DateTimeUnits::Month => ("date_add_month", "date_diff_month"),
            DateTimeUnits::Day => ("date_add_day", "date_diff_day"),
            DateTimeUnits::Hour => ("date_add_hour", "date_diff_hour"),
            DateTimeUnits::Minute => ("date_add_minute", "date_diff_minute"),
            DateTimeUnits::Second => ("date_add_second", "date_diff_second"),
            DateTimeUnits::TimezoneHour | DateTimeUnits::TimezoneMinute => {
                panic!("no interval arithmetic for {}", units)
            }
        }
    }

    /// The `extract_*` name for a calendar field.
    fn extract_name(units: DateTimeUnits) -> &'static str {
        match units {
            DateTimeUnits::Year => "extract_year",
            DateTimeUnits::Month => "extract_month",
            DateTimeUnits::Day => "extract_day",
            DateTimeUnits::Hour => "extract_hour",
            DateTimeUnits::Minute => "extract_minute",
            DateTimeUnits::Second => "extract_second",
            DateTimeUnits::TimezoneHour => "extract_timezone_hour",
            DateTimeUnits::TimezoneMinute => "extract_timezone_minute",
        }
    }

    /// Every type with a total order, for the comparison operators and
    /// `min`/`max`.
    fn ordered_types() -> Vec<ScalarType> {
        let mut types: Vec<ScalarType> = tower().into_iter().map(|(ty, _, _)| ty).collect();
        types.extend([
            ScalarType::Bool,
            ScalarType::String,
            ScalarType::Symbol,
            ScalarType::Date,
            time(),
            timestamp(),
        ]);
        types
    }

    fn define(
        catalog: &mut Catalog,
        name: &'static str,
        params: ParamList,
        return_type: ColumnType,
        op: Operation,
    ) {
        let imp = FuncImpl {
            params,
            return_type,
            op,
        };
        if let Err(err) = catalog.register(name, imp) {
            panic!("duplicate builtin: {}", err);
        }
    }

    pub(super) fn install(catalog: &mut Catalog) {
        use Operation::*;

        // Arithmetic operators, one overload per member of the tower. The
        // result type matches the (widest) input type; unary minus shares
        // the "-" overload group and is told apart by arity.
        for (ty, [add, sub, mul, div, rem], neg) in tower() {
            let binary = [("+", add), ("-", sub), ("*", mul), ("/", div), ("%", rem)];
            for (name, op) in binary {
                define(
                    catalog,
                    name,
                    params!(ty.clone(), ty.clone()),
                    ty.clone().nullable(false),
                    Binary(op),
                );
            }
            define(
                catalog,
                "-",
                params!(ty.clone()),
                ty.clone().nullable(false),
                Unary(neg),
            );
        }

        // Comparisons: one overload per ordered type, plus a fully dynamic
        // fallback that fires only when no typed overload applies.
        let comparisons = [
            ("=", BinaryFunc::Eq),
            ("<>", BinaryFunc::NotEq),
            ("<", BinaryFunc::Lt),
            ("<=", BinaryFunc::Lte),
            (">", BinaryFunc::Gt),
            (">=", BinaryFunc::Gte),
        ];
        for (name, op) in comparisons {
            for ty in ordered_types() {
                define(
                    catalog,
                    name,
                    params!(ty.clone(), ty),
                    ScalarType::Bool.nullable(false),
                    Binary(op.clone()),
                );
            }
            define(
                catalog,
                name,
                params!(ParamType::Any, ParamType::Any),
                ScalarType::Bool.nullable(false),
                Binary(op),
            );
        }

        // Three-valued logic; these see nulls and handle them themselves.
        define(
            catalog,
            "and",
            params!(ScalarType::Bool, ScalarType::Bool),
            ScalarType::Bool.nullable(true),
            Binary(BinaryFunc::And),
        );
        define(
            catalog,
            "or",
            params!(ScalarType::Bool, ScalarType::Bool),
            ScalarType::Bool.nullable(true),
            Binary(BinaryFunc::Or),
        );
        define(
            catalog,
            "not",
            params!(ScalarType::Bool),
            ScalarType::Bool.nullable(false),
            Unary(UnaryFunc::Not),
        );

        // The two predicates that observe absence directly.
        define(
            catalog,
            "is_null",
            params!(ParamType::Any),
            ScalarType::Bool.nullable(false),
            Unary(UnaryFunc::IsNull),
        );
        define(
            catalog,
            "is_missing",
            params!(ParamType::Any),
            ScalarType::Bool.nullable(false),
            Unary(UnaryFunc::IsMissing),
        );

        define(
            catalog,
            "coalesce",
            params!(ParamType::Any; ...),
            ScalarType::Dynamic.nullable(true),
            Variadic(VariadicFunc::Coalesce),
        );
        define(
            catalog,
            "nullif",
            params!(ParamType::Any, ParamType::Any),
            ScalarType::Dynamic.nullable(true),
            Binary(BinaryFunc::NullIf),
        );

        // Containers.
        for ty in [
            ScalarType::Array,
            ScalarType::Bag,
            ScalarType::Sexp,
            ScalarType::Struct,
        ] {
            define(
                catalog,
                "exists",
                params!(ty.clone()),
                ScalarType::Bool.nullable(false),
                Unary(UnaryFunc::Exists),
            );
            define(
                catalog,
                "size",
                params!(ty),
                ScalarType::Int.nullable(false),
                Unary(UnaryFunc::Size),
            );
        }

        // Text.
        for name in ["char_length", "character_length"] {
            define(
                catalog,
                name,
                params!(ScalarType::String),
                ScalarType::Int.nullable(false),
                Unary(UnaryFunc::CharLength),
            );
        }
        define(
            catalog,
            "upper",
            params!(ScalarType::String),
            ScalarType::String.nullable(false),
            Unary(UnaryFunc::Upper),
        );
        define(
            catalog,
            "lower",
            params!(ScalarType::String),
            ScalarType::String.nullable(false),
            Unary(UnaryFunc::Lower),
        );
        define(
            catalog,
            "position",
            params!(ScalarType::String, ScalarType::String),
            ScalarType::Int.nullable(false),
            Binary(BinaryFunc::Position),
        );
        for name in ["||", "concat"] {
            define(
                catalog,
                name,
                params!(ScalarType::String, ScalarType::String),
                ScalarType::String.nullable(false),
                Binary(BinaryFunc::TextConcat),
            );
        }
        // The 2- and 3-argument forms are distinct fixed-arity signatures.
        define(
            catalog,
            "substring",
            params!(ScalarType::String, ScalarType::BigInt),
            ScalarType::String.nullable(false),
            Variadic(VariadicFunc::Substring),
        );
        define(
            catalog,
            "substring",
            params!(ScalarType::String, ScalarType::BigInt, ScalarType::BigInt),
            ScalarType::String.nullable(false),
            Variadic(VariadicFunc::Substring),
        );
        define(
            catalog,
            "trim",
            params!(ScalarType::String; ...),
            ScalarType::String.nullable(false),
            Variadic(VariadicFunc::Trim),
        );
        define(
            catalog,
            "like",
            params!(ScalarType::String, ScalarType::String),
            ScalarType::Bool.nullable(false),
            Variadic(VariadicFunc::Like),
        );
        define(
            catalog,
            "like",
            params!(ScalarType::String, ScalarType::String, ScalarType::String),
            ScalarType::Bool.nullable(false),
            Variadic(VariadicFunc::Like),
        );

        // Calendar arithmetic. Each unit and datetime kind pair that the
        // dialect supports gets its own name; unsupported pairs (adding
        // hours to a date, days to a time) are simply absent, so they fail
        // at resolution.
        let ymd = [DateTimeUnits::Year, DateTimeUnits::Month, DateTimeUnits::Day];
        let hms = [
            DateTimeUnits::Hour,
            DateTimeUnits::Minute,
            DateTimeUnits::Second,
        ];
        for units in ymd {
            let (add, diff) = interval_names(units);
            define(
                catalog,
                add,
                params!(ScalarType::BigInt, ScalarType::Date),
                ScalarType::Date.nullable(false),
                Binary(BinaryFunc::DateAddDate(units)),
            );
            define(
                catalog,
                diff,
                params!(ScalarType::Date, ScalarType::Date),
                ScalarType::BigInt.nullable(false),
                Binary(BinaryFunc::DateDiffDate(units)),
            );
            define(
                catalog,
                extract_name(units),
                params!(ScalarType::Date),
                ScalarType::BigInt.nullable(false),
                Unary(UnaryFunc::ExtractDate(units)),
            );
            define(
                catalog,
                extract_name(units),
                params!(timestamp()),
                ScalarType::BigInt.nullable(false),
                Unary(UnaryFunc::ExtractTimestamp(units)),
            );
        }
        for units in hms {
            let (add, diff) = interval_names(units);
            define(
                catalog,
                add,
                params!(ScalarType::BigInt, time()),
                time().nullable(false),
                Binary(BinaryFunc::DateAddTime(units)),
            );
            define(
                catalog,
                diff,
                params!(time(), time()),
                ScalarType::BigInt.nullable(false),
                Binary(BinaryFunc::DateDiffTime(units)),
            );
        }
        for units in ymd.into_iter().chain(hms) {
            let (add, diff) = interval_names(units);
            define(
                catalog,
                add,
                params!(ScalarType::BigInt, timestamp()),
                timestamp().nullable(false),
                Binary(BinaryFunc::DateAddTimestamp(units)),
            );
            define(
                catalog,
                diff,
                params!(timestamp(), timestamp()),
                ScalarType::BigInt.nullable(false),
                Binary(BinaryFunc::DateDiffTimestamp(units)),
            );
        }
        for units in [DateTimeUnits::Hour, DateTimeUnits::Minute] {
            define(
                catalog,
                extract_name(units),
                params!(time()),
                ScalarType::BigInt.nullable(false),
                Unary(UnaryFunc::ExtractTime(units)),
            );
        }
        for units in [
            DateTimeUnits::Hour,
            DateTimeUnits::Minute,
            DateTimeUnits::TimezoneHour,
            DateTimeUnits::TimezoneMinute,
        ] {
            define(
                catalog,
                extract_name(units),
                params!(timestamp()),
                ScalarType::BigInt.nullable(false),
                Unary(UnaryFunc::ExtractTimestamp(units)),
            );
        }
        for units in [DateTimeUnits::TimezoneHour, DateTimeUnits::TimezoneMinute] {
            define(
                catalog,
                extract_name(units),
                params!(time()),
                ScalarType::BigInt.nullable(false),
                Unary(UnaryFunc::ExtractTime(units)),
            );
        }
        // `second` extracts with a fraction, at the value's precision.
        define(
            catalog,
            "extract_second",
            params!(time()),
            decimal().nullable(false),
            Unary(UnaryFunc::ExtractTime(DateTimeUnits::Second)),
        );
        define(
            catalog,
            "extract_second",
            params!(timestamp()),
            decimal().nullable(false),
            Unary(UnaryFunc::ExtractTimestamp(DateTimeUnits::Second)),
        );

        // Niladic context functions; deterministic under a fixed context.
        define(
            catalog,
            "utcnow",
            params!(),
            timestamp().nullable(false),
            Nullary(NullaryFunc::UtcNow),
        );
        define(
            catalog,
            "current_date",
            params!(),
            ScalarType::Date.nullable(false),
            Nullary(NullaryFunc::CurrentDate),
        );
        define(
            catalog,
            "current_user",
            params!(),
            ScalarType::String.nullable(true),
            Nullary(NullaryFunc::CurrentUser),
        );

        // Aggregates. `sum` and `avg` widen their return type up the tower
        // to avoid silent precision loss; the Dynamic overloads exist only
        // for statically unknown inputs and pick a strategy at the first
        // row.
        define(
            catalog,
            "count",
            params!(ParamType::Any),
            ScalarType::BigInt.nullable(false),
            Aggregate(AggregateFunc::Count),
        );
        let sums = [
            (ScalarType::TinyInt, ScalarType::BigInt, AggregateFunc::SumInt),
            (ScalarType::SmallInt, ScalarType::BigInt, AggregateFunc::SumInt),
            (ScalarType::Int, ScalarType::BigInt, AggregateFunc::SumInt),
            (
                ScalarType::BigInt,
                ScalarType::IntArbitrary,
                AggregateFunc::SumNumeric,
            ),
            (
                ScalarType::IntArbitrary,
                ScalarType::IntArbitrary,
                AggregateFunc::SumNumeric,
            ),
            (decimal(), decimal(), AggregateFunc::SumNumeric),
            (ScalarType::Real, ScalarType::Double, AggregateFunc::SumFloat),
            (ScalarType::Double, ScalarType::Double, AggregateFunc::SumFloat),
        ];
        for (input, output, op) in sums {
            define(
                catalog,
                "sum",
                params!(input),
                output.nullable(true),
                Aggregate(op),
            );
        }
        for (ty, _, _) in tower() {
            let (output, op) = match ty {
                ScalarType::Real | ScalarType::Double => {
                    (ScalarType::Double, AggregateFunc::AvgFloat)
                }
                _ => (decimal(), AggregateFunc::AvgNumeric),
            };
            define(
                catalog,
                "avg",
                params!(ty),
                output.nullable(true),
                Aggregate(op),
            );
        }
        define(
            catalog,
            "sum",
            params!(ParamType::Any),
            ScalarType::Dynamic.nullable(true),
            Aggregate(AggregateFunc::SumDynamic),
        );
        define(
            catalog,
            "avg",
            params!(ParamType::Any),
            ScalarType::Dynamic.nullable(true),
            Aggregate(AggregateFunc::AvgDynamic),
        );
        for (name, op) in [("min", AggregateFunc::Min), ("max", AggregateFunc::Max)] {
            for ty in ordered_types() {
                define(
                    catalog,
                    name,
                    params!(ty.clone()),
                    ty.nullable(true),
                    Aggregate(op.clone()),
                );
            }
            define(
                catalog,
                name,
                params!(ParamType::Any),
                ScalarType::Dynamic.nullable(true),
                Aggregate(op),
            );
        }
        define(
            catalog,
            "any",
            params!(ScalarType::Bool),
            ScalarType::Bool.nullable(true),
            Aggregate(AggregateFunc::Any),
        );
        define(
            catalog,
            "every",
            params!(ScalarType::Bool),
            ScalarType::Bool.nullable(true),
            Aggregate(AggregateFunc::Every),
        );
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;
    use sq_repr::adt::datetime::{Timestamp, TimestampPrecision, Timezone};

    use super::*;

    static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::standard);

    fn ecx() -> EvalContext {
        EvalContext {
            now: chrono::DateTime::from_timestamp(1_500_000_000, 0).unwrap(),
            current_user: Some("reviewer".into()),
        }
    }

    fn resolve(name: &str, tys: &[ScalarType]) -> &'static FuncImpl {
        CATALOG.resolve(name, tys).unwrap()
    }

    #[test]
    fn resolution_is_deterministic() {
        for (name, tys) in [
            ("+", vec![ScalarType::Int, ScalarType::Int]),
            ("=", vec![ScalarType::String, ScalarType::String]),
            ("sum", vec![ScalarType::Dynamic]),
        ] {
            let first = resolve(name, &tys);
            let second = resolve(name, &tys);
            assert_eq!(first.params, second.params, "{} resolved unstably", name);
        }
    }

    #[test]
    fn exact_beats_promotion_beats_dynamic() {
        // Both Int operands: the Int overload, exactly.
        let imp = resolve("+", &[ScalarType::Int, ScalarType::Int]);
        assert_eq!(
            imp.params,
            ParamList::Exact(vec![ScalarType::Int.into(), ScalarType::Int.into()])
        );

        // A narrower left operand promotes up to Int rather than falling
        // anywhere else.
        let imp = resolve("+", &[ScalarType::TinyInt, ScalarType::Int]);
        assert_eq!(
            imp.params,
            ParamList::Exact(vec![ScalarType::Int.into(), ScalarType::Int.into()])
        );

        // The typed "=" overload wins over the Any fallback...
        let imp = resolve("=", &[ScalarType::Int, ScalarType::Int]);
        assert_eq!(
            imp.params,
            ParamList::Exact(vec![ScalarType::Int.into(), ScalarType::Int.into()])
        );
        // ...but mixed incomparable operands still resolve, to the fallback.
        let imp = resolve("=", &[ScalarType::String, ScalarType::Int]);
        assert_eq!(
            imp.params,
            ParamList::Exact(vec![ParamType::Any, ParamType::Any])
        );
    }

    #[test]
    fn arity_disambiguates_substring() {
        let two = resolve("substring", &[ScalarType::String, ScalarType::Int]);
        let three = resolve(
            "substring",
            &[ScalarType::String, ScalarType::Int, ScalarType::Int],
        );
        assert_ne!(two.params, three.params);
    }

    #[test]
    fn resolution_failures_carry_diagnostics() {
        let err = CATALOG.resolve("no_such_function", &[]).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownFunction("no_such_function".into())
        );

        let err = CATALOG
            .resolve("+", &[ScalarType::String, ScalarType::Bool])
            .unwrap_err();
        match err {
            ResolutionError::NoApplicableOverload { name, actual, expected } => {
                assert_eq!(name, "+");
                assert_eq!(actual, vec![ScalarType::String, ScalarType::Bool]);
                assert!(!expected.is_empty());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut catalog = Catalog::new();
        let imp = || FuncImpl {
            params: params!(ScalarType::Bool),
            return_type: ScalarType::Bool.nullable(false),
            op: Operation::Unary(UnaryFunc::Not),
        };
        catalog.register("flip", imp()).unwrap();
        let err = catalog.register("flip", imp()).unwrap_err();
        assert_eq!(err.name, "flip");
        // A different parameter list under the same name is a new overload.
        catalog
            .register(
                "flip",
                FuncImpl {
                    params: params!(ScalarType::Bool, ScalarType::Bool),
                    return_type: ScalarType::Bool.nullable(false),
                    op: Operation::Binary(BinaryFunc::And),
                },
            )
            .unwrap();
    }

    #[test]
    fn null_elision_skips_bodies_that_would_fail() {
        // A null divisor would raise DivisionByZero if the body ran; the
        // protocol never lets it run.
        let imp = resolve("/", &[ScalarType::Int, ScalarType::Int]);
        let out = imp
            .invoke(&ecx(), &[Datum::from(1i32), Datum::Null])
            .unwrap();
        assert_eq!(out, Datum::Null);

        // Missing takes precedence and also collapses to null.
        let out = imp
            .invoke(&ecx(), &[Datum::Missing, Datum::from(0i32)])
            .unwrap();
        assert_eq!(out, Datum::Null);
    }

    #[test]
    fn absence_predicates_observe_their_argument() {
        let is_null = resolve("is_null", &[ScalarType::Missing]);
        assert_eq!(
            is_null.invoke(&ecx(), &[Datum::Missing]).unwrap(),
            Datum::True
        );
        let is_missing = resolve("is_missing", &[ScalarType::Null]);
        assert_eq!(
            is_missing.invoke(&ecx(), &[Datum::Null]).unwrap(),
            Datum::False
        );
    }

    #[test]
    fn runtime_type_check_is_defensive() {
        let imp = resolve("+", &[ScalarType::Int, ScalarType::Int]);
        let err = imp
            .invoke(&ecx(), &[Datum::from("oops"), Datum::from(1i32)])
            .unwrap_err();
        assert!(matches!(err, EvalError::TypeCheck { .. }));
    }

    #[test]
    fn end_to_end_text_scenarios() {
        let imp = resolve(
            "substring",
            &[ScalarType::String, ScalarType::Int, ScalarType::Int],
        );
        let out = imp
            .invoke(
                &ecx(),
                &[
                    Datum::from("abcdefghi"),
                    Datum::from(-1i64),
                    Datum::from(4i64),
                ],
            )
            .unwrap();
        assert_eq!(out, Datum::from("ab"));

        let imp = resolve(
            "trim",
            &[ScalarType::String, ScalarType::String, ScalarType::String],
        );
        let out = imp
            .invoke(
                &ecx(),
                &[
                    Datum::from("both"),
                    Datum::from(" -="),
                    Datum::from("- =string =-  "),
                ],
            )
            .unwrap();
        assert_eq!(out, Datum::from("string"));

        let imp = resolve("like", &[ScalarType::String, ScalarType::String]);
        let out = imp
            .invoke(&ecx(), &[Datum::from("noodles"), Datum::from("n__dl%")])
            .unwrap();
        assert_eq!(out, Datum::True);
    }

    #[test]
    fn trim_arity_overflow_is_a_data_exception() {
        // The variadic tail accepts any arity at resolution time; the body
        // rejects the extra arguments with a data exception.
        let imp = resolve("trim", &vec![ScalarType::String; 4]);
        let args: Vec<Datum> = ["both", " ", "x", "x"].into_iter().map(Datum::from).collect();
        assert_eq!(
            imp.invoke(&ecx(), &args).unwrap_err(),
            EvalError::TrimTooManyArguments(4),
        );
    }

    #[test]
    fn calendar_functions_resolve_per_kind() {
        // Adding years to a timestamp is supported...
        assert!(CATALOG
            .resolve("date_add_year", &[ScalarType::BigInt, ScalarType::Timestamp { precision: None }])
            .is_ok());
        // ...adding hours to a date is not a function that exists.
        assert!(CATALOG
            .resolve("date_add_hour", &[ScalarType::BigInt, ScalarType::Date])
            .is_err());

        let imp = resolve(
            "extract_timezone_hour",
            &[ScalarType::Timestamp { precision: None }],
        );
        let dt = chrono::NaiveDate::from_ymd_opt(2017, 1, 10)
            .unwrap()
            .and_hms_opt(5, 30, 55)
            .unwrap();
        let ts = Timestamp::new(
            dt,
            Some(Timezone::Offset(-690)),
            TimestampPrecision::try_from(0).unwrap(),
        )
        .unwrap();
        let out = imp.invoke(&ecx(), &[Datum::from(ts)]).unwrap();
        assert_eq!(out, Datum::from(-11i64));
    }

    #[test]
    fn aggregates_resolve_up_the_tower() {
        let imp = resolve("sum", &[ScalarType::Int]);
        assert_eq!(imp.return_type.scalar_type, ScalarType::BigInt);

        let imp = resolve("sum", &[ScalarType::BigInt]);
        assert_eq!(imp.return_type.scalar_type, ScalarType::IntArbitrary);

        let imp = resolve("sum", &[ScalarType::Real]);
        assert_eq!(imp.return_type.scalar_type, ScalarType::Double);

        // The Dynamic overload only fires when nothing is known statically.
        let imp = resolve("sum", &[ScalarType::Dynamic]);
        assert_eq!(imp.return_type.scalar_type, ScalarType::Dynamic);
        let mut acc = imp.accumulator().unwrap();
        for i in 1..=3i32 {
            acc.next(&[Datum::from(i)]).unwrap();
        }
        assert_eq!(acc.finish().unwrap(), Datum::from(6i64));
    }

    #[test]
    fn niladic_functions_use_the_context() {
        let imp = resolve("current_user", &[]);
        assert_eq!(
            imp.invoke(&ecx(), &[]).unwrap(),
            Datum::from("reviewer")
        );
        let imp = resolve("utcnow", &[]);
        let out = imp.invoke(&ecx(), &[]).unwrap();
        assert_eq!(
            out.unwrap_timestamp().utc_datetime(),
            ecx().now.naive_utc()
        );
    }
}
