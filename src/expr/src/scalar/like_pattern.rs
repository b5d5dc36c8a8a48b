// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Write;
use std::mem;

use regex::{Regex, RegexBuilder};

use crate::scalar::EvalError;

/// The escape string to use by default in LIKE patterns.
pub const DEFAULT_ESCAPE: &str = "\\";

/// Converts a pattern string that uses a custom escape character to one that
/// uses the default.
fn normalize_pattern(pattern: &str, escape: &str) -> Result<String, EvalError> {
    if escape.eq(DEFAULT_ESCAPE) {
        return Ok(String::from(pattern));
    }
    let default_escape_char: char = DEFAULT_ESCAPE.chars().next().unwrap();
    let mut p = String::with_capacity(2 * pattern.len());
    if escape.is_empty() {
        // An empty escape string means no escaping at all, so the default
        // escape character becomes a literal and must itself be escaped.
        for c in pattern.chars() {
            if c == default_escape_char {
                p.push(c);
            }
            p.push(c);
        }
    } else {
        let mut ecs = escape.chars();
        let custom_escape_char: char = ecs.next().unwrap();
        if ecs.next().is_some() {
            return Err(EvalError::LikeEscapeTooLong);
        }
        let mut cs = pattern.chars();
        while let Some(c) = cs.next() {
            if c == custom_escape_char {
                match cs.next() {
                    Some(c2) => {
                        p.push(default_escape_char);
                        p.push(c2);
                    }
                    None => return Err(EvalError::UnterminatedLikeEscapeSequence),
                }
                continue;
            }
            if c == default_escape_char {
                p.push(c);
            }
            p.push(c);
        }
    }
    p.shrink_to_fit();
    Ok(p)
}

/// An object that can test whether a string matches a LIKE pattern.
///
/// Simple patterns are matched by walking a chain of literal sub-patterns
/// directly; complex ones are compiled down to a regular expression.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub pattern: String,
    matcher_impl: MatcherImpl,
}

impl Matcher {
    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher_impl {
            MatcherImpl::String(subpatterns) => is_match_subpatterns(subpatterns, text),
            MatcherImpl::Regex(r) => r.is_match(text),
        }
    }
}

#[derive(Debug, Clone)]
enum MatcherImpl {
    String(Vec<Subpattern>),
    Regex(Regex),
}

/// Builds a [`Matcher`] for a LIKE pattern with the given escape string.
pub fn compile(pattern: &str, escape: &str) -> Result<Matcher, EvalError> {
    // The real limiting factor on pattern size is the number of states the
    // regex library will accept; 8 KiB stays comfortably under it and matches
    // the documented limit of several other databases.
    if pattern.len() > 8 << 10 {
        return Err(EvalError::LikePatternTooLong);
    }

    let p = normalize_pattern(pattern, escape)?;
    let subpatterns = build_subpatterns(&p)?;
    let matcher_impl = match subpatterns.len() > 5 {
        false => MatcherImpl::String(subpatterns),
        true => MatcherImpl::Regex(build_regex(&subpatterns)?),
    };
    Ok(Matcher {
        pattern: p,
        matcher_impl,
    })
}

// Any LIKE pattern decomposes into a chain of sub-patterns, each zero or
// more wildcards followed by a literal suffix:
//     <PATTERN> := <SUB-PATTERN> (<SUB-PATTERN> ...)
//     <SUB-PATTERN> := <WILDCARDS> <SUFFIX>
// The wildcards reduce to the (min, many) characters they may consume:
// "" = (0, false), "_" = (1, false), "%" = (0, true), "__%_" = (3, true).

#[derive(Debug, Default, Clone)]
struct Subpattern {
    /// The minimum number of characters consumed by the wildcard expression.
    consume: usize,
    /// Whether the wildcard expression can consume arbitrarily many
    /// characters.
    many: bool,
    /// A string literal expected after the wildcards.
    suffix: String,
}

fn is_match_subpatterns(subpatterns: &[Subpattern], mut text: &str) -> bool {
    let (subpattern, subpatterns) = match subpatterns {
        [] => return text.is_empty(),
        [subpattern, subpatterns @ ..] => (subpattern, subpatterns),
    };
    // Skip the minimum number of characters the sub-pattern consumes.
    if subpattern.consume > 0 {
        let mut chars = text.chars();
        if chars.nth(subpattern.consume - 1).is_none() {
            return false;
        }
        text = chars.as_str();
    }
    if subpattern.many {
        if subpattern.suffix.is_empty() {
            // Nothing to find; only valid as the last sub-pattern.
            assert!(subpatterns.is_empty(), "empty suffix in middle of a pattern");
            return true;
        }
        // Use rfind so we perform a greedy capture, like a regex would.
        let mut found = text.rfind(&subpattern.suffix);
        loop {
            match found {
                None => return false,
                Some(offset) => {
                    let end = offset + subpattern.suffix.len();
                    if is_match_subpatterns(subpatterns, &text[end..]) {
                        return true;
                    }
                    if offset == 0 {
                        return false;
                    }
                    found = text[..(end - 1)].rfind(&subpattern.suffix);
                }
            }
        }
    }
    // No string search needed, just a prefix match on the rest.
    if !text.starts_with(&subpattern.suffix) {
        return false;
    }
    is_match_subpatterns(subpatterns, &text[subpattern.suffix.len()..])
}

/// Breaks a LIKE pattern into a chain of sub-patterns.
fn build_subpatterns(pattern: &str) -> Result<Vec<Subpattern>, EvalError> {
    let mut subpatterns = vec![];
    let mut current = Subpattern::default();
    let mut in_wildcard = true;
    let mut in_escape = false;
    let escape_char: char = DEFAULT_ESCAPE.chars().next().unwrap();
    for c in pattern.chars() {
        match c {
            c if !in_escape && c == escape_char => {
                in_escape = true;
                in_wildcard = false;
            }
            '_' if !in_escape => {
                if !in_wildcard {
                    subpatterns.push(mem::take(&mut current));
                    in_wildcard = true;
                }
                current.consume += 1;
            }
            '%' if !in_escape => {
                if !in_wildcard {
                    subpatterns.push(mem::take(&mut current));
                    in_wildcard = true;
                }
                current.many = true;
            }
            c => {
                current.suffix.push(c);
                in_escape = false;
                in_wildcard = false;
            }
        }
    }
    if in_escape {
        return Err(EvalError::UnterminatedLikeEscapeSequence);
    }
    subpatterns.push(mem::take(&mut current));
    Ok(subpatterns)
}

/// Builds a regular expression that matches some parsed sub-patterns.
fn build_regex(subpatterns: &[Subpattern]) -> Result<Regex, EvalError> {
    let mut r = String::from("^");
    for sp in subpatterns {
        if sp.consume == 0 && sp.many {
            r.push_str(".*");
        } else if sp.consume == 1 {
            r.push('.');
            if sp.many {
                r.push('+');
            }
        } else if sp.consume > 1 {
            r.push_str(".{");
            write!(&mut r, "{}", sp.consume).unwrap();
            if sp.many {
                r.push(',');
            }
            r.push('}');
        }
        r.push_str(&regex::escape(&sp.suffix));
    }
    r.push('$');
    let mut rb = RegexBuilder::new(&r);
    rb.dot_matches_new_line(true);
    match rb.build() {
        Ok(regex) => Ok(regex),
        Err(regex::Error::CompiledTooBig(_)) => Err(EvalError::LikePatternTooLong),
        Err(e) => Err(EvalError::Internal(format!(
            "build_regex produced invalid regex: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pattern() {
        struct TestCase<'a> {
            pattern: &'a str,
            escape: &'a str,
            expected: &'a str,
        }
        let test_cases = vec![
            TestCase {
                pattern: "",
                escape: "",
                expected: "",
            },
            TestCase {
                pattern: "ban%na!",
                escape: "!",
                expected: "ban%na\\!",
            },
            TestCase {
                pattern: "ban%%!na",
                escape: "%",
                expected: "ban\\%!na",
            },
            TestCase {
                pattern: "ban%na\\!",
                escape: "",
                expected: "ban%na\\\\!",
            },
            TestCase {
                pattern: "ban_na!",
                escape: "\\",
                expected: "ban_na!",
            },
        ];
        for tc in test_cases {
            let actual = normalize_pattern(tc.pattern, tc.escape).unwrap();
            assert_eq!(actual, tc.expected, "normalizing {:?}", tc.pattern);
        }

        assert_eq!(
            normalize_pattern("abc!", "!"),
            Err(EvalError::UnterminatedLikeEscapeSequence),
        );
        assert_eq!(
            normalize_pattern("abc", "!!"),
            Err(EvalError::LikeEscapeTooLong),
        );
    }

    #[test]
    fn test_matches() {
        let cases = [
            ("", "", true),
            ("abc", "abc", true),
            ("a_c", "abc", true),
            ("a_c", "abcd", false),
            ("a%c", "abbbbc", true),
            ("%", "anything", true),
            ("n__dl%", "noodles", true),
            ("50\\%", "50%", true),
            ("50\\%", "505", false),
            ("_b%d%f_", "abcdefg", true),
            ("%a%b%c%d%", "xxaxbxcxdxx", true),
        ];
        for (pattern, text, expected) in cases {
            let matcher = compile(pattern, DEFAULT_ESCAPE).unwrap();
            assert_eq!(
                matcher.is_match(text),
                expected,
                "{:?} against {:?}",
                pattern,
                text
            );
        }
    }

    #[test]
    fn test_pattern_limit() {
        let pattern = "a".repeat((8 << 10) + 1);
        assert_eq!(
            compile(&pattern, DEFAULT_ESCAPE).unwrap_err(),
            EvalError::LikePatternTooLong,
        );
    }
}
