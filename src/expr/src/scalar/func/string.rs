// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Text function bodies.
//!
//! Every function in this module indexes by Unicode codepoint, never by byte
//! or UTF-16 code unit. A combining mark counts as its own codepoint.

use sq_repr::Datum;

use crate::scalar::func::widen_int64;
use crate::scalar::EvalError;

pub fn upper(s: &str) -> Datum {
    Datum::String(s.to_uppercase())
}

pub fn lower(s: &str) -> Datum {
    Datum::String(s.to_lowercase())
}

pub fn char_length(s: &str) -> Result<Datum, EvalError> {
    let length = s.chars().count();
    i32::try_from(length)
        .map(Datum::from)
        .map_err(|_| EvalError::NumericFieldOverflow)
}

/// The 1-based codepoint index of the first occurrence of `needle` in
/// `haystack`, or 0 when absent.
pub fn position(needle: &str, haystack: &str) -> Result<Datum, EvalError> {
    let position = match haystack.find(needle) {
        Some(byte_offset) => haystack[..byte_offset].chars().count() + 1,
        None => 0,
    };
    i32::try_from(position)
        .map(Datum::from)
        .map_err(|_| EvalError::NumericFieldOverflow)
}

/// `substring(text, start[, length])` over codepoints.
///
/// `start` is 1-based. A non-positive `start` does not merely clamp: the
/// window still ends at `start + length`, so leading positions before
/// codepoint 1 eat into the requested length. A negative `length` is a data
/// exception; a window that misses the string entirely yields `""`.
pub fn substring(args: &[Datum]) -> Result<Datum, EvalError> {
    let (text, start, length) = match args {
        [text, start] => (text.unwrap_str(), widen_int64(start), None),
        [text, start, length] => {
            let length = widen_int64(length);
            if length < 0 {
                return Err(EvalError::NegativeSubstringLength(length));
            }
            (text.unwrap_str(), widen_int64(start), Some(length))
        }
        _ => {
            return Err(EvalError::Internal(format!(
                "substring invoked with {} arguments",
                args.len()
            )))
        }
    };
    // 1-based, exclusive on the right.
    let end = match length {
        Some(length) => start.saturating_add(length),
        None => i64::MAX,
    };
    let from = start.max(1);
    if end <= from {
        return Ok(Datum::from(""));
    }
    let skip = usize::try_from(from - 1).expect("from is at least 1");
    let take = usize::try_from(end - from).expect("end exceeds from");
    let out: String = text.chars().skip(skip).take(take).collect();
    Ok(Datum::String(out))
}

/// Which side(s) of the string `trim` strips.
enum TrimSide {
    Leading,
    Trailing,
    Both,
}

fn trim_side(spec: &str) -> Result<TrimSide, EvalError> {
    match spec.to_ascii_lowercase().as_str() {
        "leading" => Ok(TrimSide::Leading),
        "trailing" => Ok(TrimSide::Trailing),
        "both" => Ok(TrimSide::Both),
        other => Err(EvalError::InvalidTrimSpecification(other.into())),
    }
}

/// `trim([spec, [removal,]] text)`.
///
/// Strips codepoints that appear in the removal set (default: a single ASCII
/// space) from the chosen side(s), one codepoint at a time. The two-argument
/// form reads its first argument as a side specification if it parses as
/// one, and as a removal set otherwise.
pub fn trim(args: &[Datum]) -> Result<Datum, EvalError> {
    let (side, removal, text) = match args {
        [text] => (TrimSide::Both, " ", text.unwrap_str()),
        [spec, text] => match trim_side(spec.unwrap_str()) {
            Ok(side) => (side, " ", text.unwrap_str()),
            Err(_) => (TrimSide::Both, spec.unwrap_str(), text.unwrap_str()),
        },
        [spec, removal, text] => (
            trim_side(spec.unwrap_str())?,
            removal.unwrap_str(),
            text.unwrap_str(),
        ),
        // The catalog declares trim with a variadic tail, so an over-long
        // call reaches the body and is a data exception, not a bug.
        _ => return Err(EvalError::TrimTooManyArguments(args.len())),
    };
    let matcher = |c: char| removal.contains(c);
    let out = match side {
        TrimSide::Leading => text.trim_start_matches(matcher),
        TrimSide::Trailing => text.trim_end_matches(matcher),
        TrimSide::Both => text.trim_matches(matcher),
    };
    Ok(Datum::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substr(text: &str, start: i64, length: Option<i64>) -> Result<String, EvalError> {
        let mut args = vec![Datum::from(text), Datum::from(start)];
        if let Some(length) = length {
            args.push(Datum::from(length));
        }
        substring(&args).map(|d| d.unwrap_str().to_owned())
    }

    #[test]
    fn substring_windows() {
        assert_eq!(substr("abcdefghi", 2, Some(3)).unwrap(), "bcd");
        assert_eq!(substr("abcdefghi", 2, None).unwrap(), "bcdefghi");
        // A negative start shifts the window's end left rather than
        // clamping in place.
        assert_eq!(substr("abcdefghi", -1, Some(4)).unwrap(), "ab");
        assert_eq!(substr("abcdefghi", 0, Some(4)).unwrap(), "abc");
        assert_eq!(substr("abcdefghi", -10, Some(4)).unwrap(), "");
        assert_eq!(substr("abcdefghi", 20, Some(4)).unwrap(), "");
        assert_eq!(substr("abcdefghi", 3, Some(0)).unwrap(), "");
        assert_eq!(
            substr("abcdefghi", 2, Some(-1)).unwrap_err(),
            EvalError::NegativeSubstringLength(-1),
        );
    }

    #[test]
    fn substring_counts_codepoints() {
        assert_eq!(substr("😁😞😸😸", 2, Some(2)).unwrap(), "😞😸");
        // A combining mark is its own codepoint.
        assert_eq!(substr("e\u{0301}f", 2, Some(1)).unwrap(), "\u{0301}");
    }

    #[test]
    fn trim_sides_and_removal_sets() {
        let run = |args: &[&str]| {
            let args: Vec<Datum> = args.iter().map(|s| Datum::from(*s)).collect();
            trim(&args).map(|d| d.unwrap_str().to_owned())
        };
        assert_eq!(run(&["  pad  "]).unwrap(), "pad");
        assert_eq!(run(&["leading", "  pad  "]).unwrap(), "pad  ");
        assert_eq!(run(&["trailing", "  pad  "]).unwrap(), "  pad");
        assert_eq!(run(&["both", " -=", "- =string =-  "]).unwrap(), "string");
        assert_eq!(run(&["xy", "yyxhixy"]).unwrap(), "hi");
        assert_eq!(
            run(&["sideways", "x", "x"]).unwrap_err(),
            EvalError::InvalidTrimSpecification("sideways".into()),
        );
        assert_eq!(
            run(&["both", " ", "x", "x"]).unwrap_err(),
            EvalError::TrimTooManyArguments(4),
        );
    }

    #[test]
    fn position_is_codepoint_indexed() {
        let pos = |needle: &str, haystack: &str| {
            position(needle, haystack).unwrap().unwrap_int32()
        };
        assert_eq!(pos("world", "hello world"), 7);
        assert_eq!(pos("q", "hello world"), 0);
        assert_eq!(pos("😸", "😁😞😸😸"), 3);
        assert_eq!(pos("", "anything"), 1);
    }

    #[test]
    fn char_length_counts_codepoints() {
        assert_eq!(char_length("").unwrap().unwrap_int32(), 0);
        assert_eq!(char_length("e\u{0301}").unwrap().unwrap_int32(), 2);
        assert_eq!(char_length("😁😞😸😸").unwrap().unwrap_int32(), 4);
    }
}
