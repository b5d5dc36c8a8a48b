// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Aggregate functions and their accumulators.
//!
//! An [`Accumulator`] is created per aggregation group, folds one row per
//! [`Accumulator::next`] call, and is read once with
//! [`Accumulator::finish`]. Every builtin aggregate is decomposable:
//! accumulators that folded disjoint row sets combine with
//! [`Accumulator::merge`] into a state equivalent to folding the union, so a
//! parallel evaluator can run one accumulator per partition and merge at the
//! join point.
//!
//! All aggregates skip null and missing inputs; `count` counts the rows
//! whose argument is present.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sq_repr::adt::numeric::{self, Numeric, NumericAgg};
use sq_repr::Datum;

use crate::scalar::func::{order_datums, widen_float64, widen_int64};
use crate::scalar::EvalError;

/// An aggregate function the catalog can bind a signature to.
///
/// The variants distinguish accumulation strategies, not input signatures: a
/// single variant may back several overloads whose declared return types
/// differ.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    /// Sums fixed-width integers narrower than 64 bits.
    SumInt,
    /// Sums 64-bit and arbitrary-width integers and decimals.
    SumNumeric,
    /// Sums floats.
    SumFloat,
    /// Sum over a statically unknown input type; picks a strategy at the
    /// first row.
    SumDynamic,
    AvgNumeric,
    AvgFloat,
    /// Average over a statically unknown input type.
    AvgDynamic,
    Min,
    Max,
    /// Boolean OR over the group.
    Any,
    /// Boolean AND over the group.
    Every,
}

impl AggregateFunc {
    /// Creates the empty accumulator state for this aggregate.
    pub fn accumulator(&self) -> Accumulator {
        match self {
            AggregateFunc::Count => Accumulator::Count { count: 0 },
            AggregateFunc::SumInt => Accumulator::SumInt { sum: 0, any: false },
            AggregateFunc::SumNumeric => Accumulator::SumNumeric {
                sum: NumericAgg::zero(),
                any: false,
            },
            AggregateFunc::SumFloat => Accumulator::SumFloat { sum: 0.0, any: false },
            AggregateFunc::SumDynamic => Accumulator::Dynamic { inner: None, avg: false },
            AggregateFunc::AvgNumeric => Accumulator::AvgNumeric {
                sum: NumericAgg::zero(),
                count: 0,
            },
            AggregateFunc::AvgFloat => Accumulator::AvgFloat { sum: 0.0, count: 0 },
            AggregateFunc::AvgDynamic => Accumulator::Dynamic { inner: None, avg: true },
            AggregateFunc::Min => Accumulator::Extreme { best: None, keep: Ordering::Less },
            AggregateFunc::Max => Accumulator::Extreme {
                best: None,
                keep: Ordering::Greater,
            },
            AggregateFunc::Any => Accumulator::Logical { result: None, every: false },
            AggregateFunc::Every => Accumulator::Logical { result: None, every: true },
        }
    }

    /// The strategy the dynamically typed overloads use for a value of the
    /// given runtime type.
    fn strategy_for(datum: &Datum, avg: bool) -> AggregateFunc {
        match (datum, avg) {
            (Datum::Float32(_) | Datum::Float64(_), false) => AggregateFunc::SumFloat,
            (Datum::Int8(_) | Datum::Int16(_) | Datum::Int32(_), false) => AggregateFunc::SumInt,
            (_, false) => AggregateFunc::SumNumeric,
            (Datum::Float32(_) | Datum::Float64(_), true) => AggregateFunc::AvgFloat,
            (_, true) => AggregateFunc::AvgNumeric,
        }
    }
}

/// Per-group aggregation state.
#[derive(Debug, Clone)]
pub enum Accumulator {
    Count {
        count: i64,
    },
    SumInt {
        sum: i128,
        any: bool,
    },
    SumNumeric {
        sum: NumericAgg,
        any: bool,
    },
    SumFloat {
        sum: f64,
        any: bool,
    },
    AvgNumeric {
        sum: NumericAgg,
        count: u64,
    },
    AvgFloat {
        sum: f64,
        count: u64,
    },
    Extreme {
        best: Option<Datum>,
        /// The ordering a new datum must have against the current best to
        /// replace it.
        keep: Ordering,
    },
    Logical {
        result: Option<bool>,
        every: bool,
    },
    /// Deferred state for the dynamically typed overloads: the strategy is
    /// chosen when the first present value arrives and widens in place when
    /// a later row is wider than anything seen so far.
    Dynamic {
        inner: Option<Box<Accumulator>>,
        avg: bool,
    },
}

fn widen_agg(d: &Datum) -> NumericAgg {
    let mut cx = numeric::cx_agg();
    match d {
        Datum::Numeric(n) => cx.to_width(n.0),
        d => cx.to_width(Numeric::from(widen_int64(d))),
    }
}

fn agg_from_i128(sum: i128) -> NumericAgg {
    let mut cx = numeric::cx_agg();
    // An i128 has at most 39 digits, well within the doubled-width
    // coefficient, so this is exact.
    cx.parse(sum.to_string())
        .expect("i128 formats as a plain decimal")
}

fn float_from_agg(sum: &NumericAgg) -> f64 {
    sum.to_string().parse::<f64>().unwrap_or(f64::NAN)
}

impl Accumulator {
    /// Folds one row's argument into this accumulator. Null and missing
    /// arguments are skipped.
    pub fn next(&mut self, args: &[Datum]) -> Result<(), EvalError> {
        let datum = match args {
            [datum] if !datum.is_absent() => datum,
            [_] => return Ok(()),
            _ => {
                return Err(EvalError::Internal(format!(
                    "accumulator fed {} arguments",
                    args.len()
                )))
            }
        };
        match self {
            Accumulator::Count { count } => {
                *count = count
                    .checked_add(1)
                    .ok_or(EvalError::NumericFieldOverflow)?;
            }
            Accumulator::SumInt { sum, any } => {
                *sum = sum
                    .checked_add(i128::from(widen_int64(datum)))
                    .ok_or(EvalError::NumericFieldOverflow)?;
                *any = true;
            }
            Accumulator::SumNumeric { sum, any } => {
                let mut cx = numeric::cx_agg();
                cx.add(sum, &widen_agg(datum));
                if cx.status().overflow() {
                    return Err(EvalError::NumericFieldOverflow);
                }
                *any = true;
            }
            Accumulator::SumFloat { sum, any } => {
                *sum += widen_float64(datum);
                *any = true;
            }
            Accumulator::AvgNumeric { sum, count } => {
                let mut cx = numeric::cx_agg();
                cx.add(sum, &widen_agg(datum));
                if cx.status().overflow() {
                    return Err(EvalError::NumericFieldOverflow);
                }
                *count += 1;
            }
            Accumulator::AvgFloat { sum, count } => {
                *sum += widen_float64(datum);
                *count += 1;
            }
            Accumulator::Extreme { best, keep } => match best {
                Some(b) if order_datums(datum, b) != *keep => {}
                _ => *best = Some(datum.clone()),
            },
            Accumulator::Logical { result, every } => {
                let v = datum.unwrap_bool();
                *result = Some(match result {
                    None => v,
                    Some(acc) => {
                        if *every {
                            *acc && v
                        } else {
                            *acc || v
                        }
                    }
                });
            }
            Accumulator::Dynamic { inner, avg } => {
                let target = AggregateFunc::strategy_for(datum, *avg);
                let state = match inner.take() {
                    Some(prior) => Box::new((*prior).promote(&target)),
                    None => Box::new(target.accumulator()),
                };
                inner.insert(state).next(std::slice::from_ref(datum))?;
            }
        }
        Ok(())
    }

    /// The strategy a dynamically chosen accumulator is running, used to
    /// reconcile two halves that saw differently typed rows.
    fn strategy(&self) -> Option<AggregateFunc> {
        match self {
            Accumulator::SumInt { .. } => Some(AggregateFunc::SumInt),
            Accumulator::SumNumeric { .. } => Some(AggregateFunc::SumNumeric),
            Accumulator::SumFloat { .. } => Some(AggregateFunc::SumFloat),
            Accumulator::AvgNumeric { .. } => Some(AggregateFunc::AvgNumeric),
            Accumulator::AvgFloat { .. } => Some(AggregateFunc::AvgFloat),
            _ => None,
        }
    }

    /// Rewrites this accumulator's folded state under a wider strategy.
    /// States already at least as wide as `target` pass through unchanged.
    #[allow(clippy::as_conversions)]
    fn promote(self, target: &AggregateFunc) -> Accumulator {
        match (self, target) {
            (Accumulator::SumInt { sum, any }, AggregateFunc::SumNumeric) => {
                Accumulator::SumNumeric {
                    sum: agg_from_i128(sum),
                    any,
                }
            }
            (Accumulator::SumInt { sum, any }, AggregateFunc::SumFloat) => Accumulator::SumFloat {
                sum: sum as f64,
                any,
            },
            (Accumulator::SumNumeric { sum, any }, AggregateFunc::SumFloat) => {
                Accumulator::SumFloat {
                    sum: float_from_agg(&sum),
                    any,
                }
            }
            (Accumulator::AvgNumeric { sum, count }, AggregateFunc::AvgFloat) => {
                Accumulator::AvgFloat {
                    sum: float_from_agg(&sum),
                    count,
                }
            }
            (acc, _) => acc,
        }
    }

    /// Combines another accumulator that folded a disjoint set of rows into
    /// this one. Only accumulators created by the same [`AggregateFunc`] can
    /// merge.
    pub fn merge(&mut self, other: Accumulator) -> Result<(), EvalError> {
        match (self, other) {
            (Accumulator::Count { count }, Accumulator::Count { count: o }) => {
                *count = count.checked_add(o).ok_or(EvalError::NumericFieldOverflow)?;
            }
            (Accumulator::SumInt { sum, any }, Accumulator::SumInt { sum: os, any: oa }) => {
                *sum = sum.checked_add(os).ok_or(EvalError::NumericFieldOverflow)?;
                *any |= oa;
            }
            (
                Accumulator::SumNumeric { sum, any },
                Accumulator::SumNumeric { sum: os, any: oa },
            ) => {
                let mut cx = numeric::cx_agg();
                cx.add(sum, &os);
                if cx.status().overflow() {
                    return Err(EvalError::NumericFieldOverflow);
                }
                *any |= oa;
            }
            (Accumulator::SumFloat { sum, any }, Accumulator::SumFloat { sum: os, any: oa }) => {
                *sum += os;
                *any |= oa;
            }
            (
                Accumulator::AvgNumeric { sum, count },
                Accumulator::AvgNumeric { sum: os, count: oc },
            ) => {
                let mut cx = numeric::cx_agg();
                cx.add(sum, &os);
                if cx.status().overflow() {
                    return Err(EvalError::NumericFieldOverflow);
                }
                *count += oc;
            }
            (Accumulator::AvgFloat { sum, count }, Accumulator::AvgFloat { sum: os, count: oc }) => {
                *sum += os;
                *count += oc;
            }
            (Accumulator::Extreme { best, keep }, Accumulator::Extreme { best: ob, .. }) => {
                if let Some(ob) = ob {
                    match best {
                        Some(b) if order_datums(&ob, b) != *keep => {}
                        _ => *best = Some(ob),
                    }
                }
            }
            (
                Accumulator::Logical { result, every },
                Accumulator::Logical { result: or, .. },
            ) => {
                *result = match (*result, or) {
                    (None, or) => or,
                    (Some(r), None) => Some(r),
                    (Some(r), Some(o)) => Some(if *every { r && o } else { r || o }),
                };
            }
            (Accumulator::Dynamic { inner, .. }, Accumulator::Dynamic { inner: oi, .. }) => {
                if let Some(oi) = oi {
                    match inner.take() {
                        Some(prior) => {
                            // The halves may have chosen different widths;
                            // bring both to the wider strategy first.
                            let mut a = *prior;
                            let mut b = *oi;
                            if let Some(target) = b.strategy() {
                                a = a.promote(&target);
                            }
                            if let Some(target) = a.strategy() {
                                b = b.promote(&target);
                            }
                            a.merge(b)?;
                            *inner = Some(Box::new(a));
                        }
                        None => *inner = Some(oi),
                    }
                }
            }
            (s, o) => {
                return Err(EvalError::Internal(format!(
                    "cannot merge accumulators {:?} and {:?}",
                    s, o
                )))
            }
        }
        Ok(())
    }

    /// Finalizes the group, producing the aggregate's value.
    ///
    /// Every aggregate but `count` yields null over a group with no present
    /// values.
    pub fn finish(&self) -> Result<Datum, EvalError> {
        match self {
            Accumulator::Count { count } => Ok(Datum::from(*count)),
            Accumulator::SumInt { sum, any } => {
                if !any {
                    return Ok(Datum::Null);
                }
                i64::try_from(*sum)
                    .map(Datum::from)
                    .map_err(|_| EvalError::NumericFieldOverflow)
            }
            Accumulator::SumNumeric { sum, any } => {
                if !any {
                    return Ok(Datum::Null);
                }
                numeric::from_agg(*sum)
                    .map(Datum::from)
                    .map_err(|()| EvalError::NumericFieldOverflow)
            }
            Accumulator::SumFloat { sum, any } => {
                if !any {
                    return Ok(Datum::Null);
                }
                Ok(Datum::from(*sum))
            }
            Accumulator::AvgNumeric { sum, count } => {
                if *count == 0 {
                    return Ok(Datum::Null);
                }
                let mut cx = numeric::cx_agg();
                let mut quotient = *sum;
                cx.div(&mut quotient, &NumericAgg::from(*count as i64));
                if cx.status().overflow() {
                    return Err(EvalError::NumericFieldOverflow);
                }
                numeric::from_agg(quotient)
                    .map(Datum::from)
                    .map_err(|()| EvalError::NumericFieldOverflow)
            }
            Accumulator::AvgFloat { sum, count } => {
                if *count == 0 {
                    return Ok(Datum::Null);
                }
                let count = *count as f64;
                Ok(Datum::from(sum / count))
            }
            Accumulator::Extreme { best, .. } => Ok(match best {
                Some(best) => best.clone(),
                None => Datum::Null,
            }),
            Accumulator::Logical { result, .. } => Ok(match result {
                Some(result) => Datum::from(*result),
                None => Datum::Null,
            }),
            Accumulator::Dynamic { inner, .. } => match inner {
                Some(inner) => inner.finish(),
                None => Ok(Datum::Null),
            },
        }
    }
}
