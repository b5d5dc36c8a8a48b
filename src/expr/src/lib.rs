// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The function catalog and evaluation engine.
//!
//! This crate provides the three surfaces the query planner and row
//! evaluator consume:
//!
//! * [`Catalog::resolve`] selects one [`FuncImpl`] for a function name and a
//!   vector of static argument types, once per call site;
//! * [`FuncImpl::invoke`] evaluates a resolved scalar function over one row
//!   of argument [`Datum`]s, applying the null/missing elision protocol
//!   before the body runs;
//! * [`FuncImpl::accumulator`] instantiates the per-group state for a
//!   resolved aggregate function.
//!
//! [`Datum`]: sq_repr::Datum

pub mod func;
pub mod relation;
pub mod scalar;

pub use crate::func::{
    Catalog, DuplicateSignatureError, Func, FuncImpl, Operation, ParamList, ParamType,
    ResolutionError,
};
pub use crate::relation::func::{Accumulator, AggregateFunc};
pub use crate::scalar::func::{BinaryFunc, NullaryFunc, UnaryFunc, VariadicFunc};
pub use crate::scalar::{EvalContext, EvalError};
