// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Fundamental data representation for the sq expression engine.
//!
//! This crate contains the types for values ([`Datum`]) and for the static
//! types of values ([`ScalarType`], [`ColumnType`]). The dialect it models is
//! a semi-structured SQL superset: in addition to SQL's `NULL`, a second
//! absent state, `MISSING`, is a first-class value, and containers (arrays,
//! bags, s-expressions, structs) nest arbitrarily.

pub mod adt;

mod relation;
mod scalar;

pub use crate::relation::ColumnType;
pub use crate::scalar::{Datum, DatumKind, ScalarBaseType, ScalarType};
