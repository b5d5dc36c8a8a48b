// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sq_repr::adt::datetime::TimestampError;
use sq_repr::ScalarType;

pub mod func;
pub mod like_pattern;

/// The session state injected into every evaluation.
///
/// The niladic context functions (`utcnow`, `current_date`, `current_user`)
/// read this instead of the wall clock, so a query is deterministic given a
/// fixed context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    /// The instant at which the enclosing query started.
    pub now: DateTime<Utc>,
    /// The authenticated user, if the session has one.
    pub current_user: Option<String>,
}

/// A data exception raised while evaluating a function body.
///
/// These surface at row-evaluation time, after resolution has succeeded.
/// The invocation protocol never catches them; conversion to a permissive
/// `MISSING` result, where the dialect allows it, is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalError {
    DivisionByZero,
    NumericFieldOverflow,
    FloatOverflow,
    FloatUnderflow,
    TimestampOutOfRange,
    NoTimezone,
    NegativeSubstringLength(i64),
    InvalidTrimSpecification(String),
    TrimTooManyArguments(usize),
    UnterminatedLikeEscapeSequence,
    LikePatternTooLong,
    LikeEscapeTooLong,
    TypeCheck {
        expected: ScalarType,
        actual: ScalarType,
    },
    Internal(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::DivisionByZero => f.write_str("division by zero"),
            EvalError::NumericFieldOverflow => f.write_str("numeric field overflow"),
            EvalError::FloatOverflow => f.write_str("value out of range: overflow"),
            EvalError::FloatUnderflow => f.write_str("value out of range: underflow"),
            EvalError::TimestampOutOfRange => f.write_str("timestamp out of range"),
            EvalError::NoTimezone => f.write_str("value has no timezone field"),
            EvalError::NegativeSubstringLength(l) => {
                write!(f, "negative substring length not allowed: {}", l)
            }
            EvalError::TrimTooManyArguments(count) => {
                write!(f, "trim expects at most three arguments, got {}", count)
            }
            EvalError::InvalidTrimSpecification(spec) => {
                write!(
                    f,
                    "trim specification must be leading, trailing, or both, got {}",
                    spec
                )
            }
            EvalError::UnterminatedLikeEscapeSequence => {
                f.write_str("unterminated escape sequence in LIKE")
            }
            EvalError::LikePatternTooLong => f.write_str("LIKE pattern exceeds maximum length"),
            EvalError::LikeEscapeTooLong => {
                f.write_str("invalid escape string: must be empty or one character")
            }
            EvalError::TypeCheck { expected, actual } => {
                write!(
                    f,
                    "runtime type check failed: expected {:?}, got {:?}",
                    expected, actual
                )
            }
            EvalError::Internal(s) => write!(f, "internal error: {}", s),
        }
    }
}

impl Error for EvalError {}

impl From<TimestampError> for EvalError {
    fn from(err: TimestampError) -> EvalError {
        match err {
            TimestampError::OutOfRange => EvalError::TimestampOutOfRange,
        }
    }
}
