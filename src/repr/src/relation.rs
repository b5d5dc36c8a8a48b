// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::ScalarType;

/// The type of a single value position: a [`ScalarType`] together with its
/// nullability.
///
/// Function signatures use this for their return type so that the planner can
/// distinguish functions that can produce null from those that cannot.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    /// The underlying scalar type.
    pub scalar_type: ScalarType,
    /// Whether this position can hold null (or missing, which callers
    /// collapse into null).
    pub nullable: bool,
}

impl ColumnType {
    /// Consumes this `ColumnType` and returns it with the nullability set as
    /// specified.
    pub fn nullable(mut self, nullable: bool) -> ColumnType {
        self.nullable = nullable;
        self
    }
}
