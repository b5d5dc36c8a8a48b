// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Length parameters for the bounded text and binary types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `length` of a [`ScalarType::Char`].
///
/// [`ScalarType::Char`]: crate::ScalarType::Char
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CharLength(u32);

/// The `max_length` of a [`ScalarType::VarChar`].
///
/// [`ScalarType::VarChar`]: crate::ScalarType::VarChar
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct VarCharMaxLength(u32);

/// The `max_length` of a [`ScalarType::Clob`] or [`ScalarType::Blob`].
///
/// [`ScalarType::Clob`]: crate::ScalarType::Clob
/// [`ScalarType::Blob`]: crate::ScalarType::Blob
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct LobMaxLength(u32);

/// The error returned when constructing a length parameter from an invalid
/// value.
#[derive(Debug, Clone)]
pub struct InvalidLengthError {
    what: &'static str,
    value: i64,
}

impl fmt::Display for InvalidLengthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid {} length: {}", self.what, self.value)
    }
}

impl std::error::Error for InvalidLengthError {}

macro_rules! length_newtype {
    ($name:ident, $what:expr, $max:expr) => {
        impl $name {
            /// The maximum length supported by the type.
            pub const MAX: $name = $name($max);

            /// Consumes the newtype wrapper, returning the contents as a
            /// `u32`.
            pub fn into_u32(self) -> u32 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = InvalidLengthError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match u32::try_from(value) {
                    Ok(v) if v > 0 && v <= $max => Ok($name(v)),
                    _ => Err(InvalidLengthError { what: $what, value }),
                }
            }
        }
    };
}

length_newtype!(CharLength, "character", 10_485_760);
length_newtype!(VarCharMaxLength, "character varying", 10_485_760);
length_newtype!(LobMaxLength, "large object", u32::MAX);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        assert_eq!(CharLength::try_from(12).unwrap().into_u32(), 12);
        assert!(CharLength::try_from(0).is_err());
        assert!(CharLength::try_from(-7).is_err());
        assert!(VarCharMaxLength::try_from(i64::MAX).is_err());
    }
}
