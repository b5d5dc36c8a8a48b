// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Calendar arithmetic bodies: `date_add`, `date_diff`, and `extract`.
//!
//! Adding a unit is exact calendar arithmetic delegated to chrono's
//! proleptic Gregorian calendar, with the day of month saturating at month
//! boundaries. Diffing by year or month counts whole calendar boundaries
//! crossed; diffing by day and below is exact elapsed time truncated toward
//! zero. All results are range-checked to years 1 through 9999.

use chrono::{Datelike, Duration, NaiveTime, Timelike};
use sq_repr::adt::datetime::{Date, DateTimeUnits, Time, Timestamp, TimestampPrecision, Timezone};
use sq_repr::adt::numeric::Numeric;
use sq_repr::Datum;

use crate::scalar::EvalError;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn unsupported_unit(units: DateTimeUnits, what: &str) -> EvalError {
    // Signatures are registered per supported unit, so reaching this
    // indicates a catalog construction bug, not bad user input.
    EvalError::Internal(format!("unit {} is not valid for {}", units, what))
}

pub fn date_add_date(units: DateTimeUnits, interval: i64, date: Date) -> Result<Datum, EvalError> {
    let out = match units {
        DateTimeUnits::Year => {
            let months = interval
                .checked_mul(12)
                .ok_or(EvalError::TimestampOutOfRange)?;
            date.checked_add_months(months)?
        }
        DateTimeUnits::Month => date.checked_add_months(interval)?,
        DateTimeUnits::Day => date.checked_add_days(interval)?,
        _ => return Err(unsupported_unit(units, "date_add on a date")),
    };
    Ok(Datum::from(out))
}

pub fn date_add_time(units: DateTimeUnits, interval: i64, time: &Time) -> Result<Datum, EvalError> {
    // A time wraps around midnight, so the interval only matters modulo one
    // day; reducing first also keeps the duration constructors in range.
    let duration = match units {
        DateTimeUnits::Hour => Duration::hours(interval.rem_euclid(24)),
        DateTimeUnits::Minute => Duration::minutes(interval.rem_euclid(24 * 60)),
        DateTimeUnits::Second => Duration::seconds(interval.rem_euclid(24 * 60 * 60)),
        _ => return Err(unsupported_unit(units, "date_add on a time")),
    };
    Ok(Datum::from(time.wrapping_add(duration)))
}

pub fn date_add_timestamp(
    units: DateTimeUnits,
    interval: i64,
    ts: &Timestamp,
) -> Result<Datum, EvalError> {
    let out = match units {
        DateTimeUnits::Year => {
            let months = interval
                .checked_mul(12)
                .ok_or(EvalError::TimestampOutOfRange)?;
            ts.checked_add_months(months)?
        }
        DateTimeUnits::Month => ts.checked_add_months(interval)?,
        DateTimeUnits::Day => {
            let d = Duration::try_days(interval).ok_or(EvalError::TimestampOutOfRange)?;
            ts.checked_add_duration(d)?
        }
        DateTimeUnits::Hour => {
            let d = Duration::try_hours(interval).ok_or(EvalError::TimestampOutOfRange)?;
            ts.checked_add_duration(d)?
        }
        DateTimeUnits::Minute => {
            let d = Duration::try_minutes(interval).ok_or(EvalError::TimestampOutOfRange)?;
            ts.checked_add_duration(d)?
        }
        DateTimeUnits::Second => {
            let d = Duration::try_seconds(interval).ok_or(EvalError::TimestampOutOfRange)?;
            ts.checked_add_duration(d)?
        }
        _ => return Err(unsupported_unit(units, "date_add on a timestamp")),
    };
    Ok(Datum::from(out))
}

/// Whole month boundaries crossed going from `from` to `to`, where each
/// value is `(year, month, anchor)` and the anchor orders positions within
/// a month.
fn whole_months<A: Ord>(from: (i32, u32, A), to: (i32, u32, A)) -> i64 {
    let (fy, fm, fa) = from;
    let (ty, tm, ta) = to;
    let mut months =
        (i64::from(ty) - i64::from(fy)) * 12 + i64::from(tm) - i64::from(fm);
    // A partial month does not count: back off when the end has not reached
    // the start's position within the month.
    if months > 0 && ta < fa {
        months -= 1;
    } else if months < 0 && ta > fa {
        months += 1;
    }
    months
}

pub fn date_diff_date(units: DateTimeUnits, from: Date, to: Date) -> Result<Datum, EvalError> {
    let months = || whole_months((from.year(), from.month(), from.day()), (to.year(), to.month(), to.day()));
    let out = match units {
        DateTimeUnits::Year => months() / 12,
        DateTimeUnits::Month => months(),
        DateTimeUnits::Day => (*to - *from).num_days(),
        _ => return Err(unsupported_unit(units, "date_diff on a date")),
    };
    Ok(Datum::from(out))
}

/// Nanoseconds since midnight UTC, treating an unknown or absent offset as
/// zero. May be negative or exceed one day for offset-carrying values.
pub(crate) fn utc_nanos_of_day(t: &Time) -> i64 {
    let offset = t.tz.map_or(0, |tz| tz.offset_minutes());
    (t.seconds_of_day() - i64::from(offset) * 60) * NANOS_PER_SECOND
        + i64::from(t.time.nanosecond())
}

pub fn date_diff_time(units: DateTimeUnits, from: &Time, to: &Time) -> Result<Datum, EvalError> {
    let delta = utc_nanos_of_day(to) - utc_nanos_of_day(from);
    let out = match units {
        DateTimeUnits::Hour => delta / (3600 * NANOS_PER_SECOND),
        DateTimeUnits::Minute => delta / (60 * NANOS_PER_SECOND),
        DateTimeUnits::Second => delta / NANOS_PER_SECOND,
        _ => return Err(unsupported_unit(units, "date_diff on a time")),
    };
    Ok(Datum::from(out))
}

pub fn date_diff_timestamp(
    units: DateTimeUnits,
    from: &Timestamp,
    to: &Timestamp,
) -> Result<Datum, EvalError> {
    let months = || {
        let f = from.datetime();
        let t = to.datetime();
        whole_months(
            (f.year(), f.month(), (f.day(), f.time())),
            (t.year(), t.month(), (t.day(), t.time())),
        )
    };
    let delta = to.utc_datetime() - from.utc_datetime();
    let out = match units {
        DateTimeUnits::Year => months() / 12,
        DateTimeUnits::Month => months(),
        DateTimeUnits::Day => delta.num_days(),
        DateTimeUnits::Hour => delta.num_hours(),
        DateTimeUnits::Minute => delta.num_minutes(),
        DateTimeUnits::Second => delta.num_seconds(),
        _ => return Err(unsupported_unit(units, "date_diff on a timestamp")),
    };
    Ok(Datum::from(out))
}

/// Seconds within the minute, with the sub-second fraction truncated to the
/// value's declared precision, as an exact decimal.
fn extract_seconds(time: NaiveTime, precision: TimestampPrecision) -> Datum {
    let p = u32::from(precision.into_u8());
    let seconds = i64::from(time.second());
    // chrono represents leap seconds as nanosecond values above one billion.
    let nanos = i64::from(time.nanosecond()).min(NANOS_PER_SECOND - 1);
    let frac = nanos / 10i64.pow(9 - p);
    let mut n = Numeric::from(seconds * 10i64.pow(p) + frac);
    if p > 0 {
        n.set_exponent(-i32::try_from(p).expect("precision fits in i32"));
    }
    Datum::from(n)
}

fn extract_timezone(units: DateTimeUnits, tz: Option<Timezone>) -> Result<Datum, EvalError> {
    // An explicitly unknown offset extracts as zero; the absence of any
    // timezone field is a static typing error that we only catch here
    // defensively.
    let tz = tz.ok_or(EvalError::NoTimezone)?;
    let part = match units {
        DateTimeUnits::TimezoneHour => tz.hour_part(),
        DateTimeUnits::TimezoneMinute => tz.minute_part(),
        _ => return Err(unsupported_unit(units, "timezone extraction")),
    };
    Ok(Datum::from(i64::from(part)))
}

pub fn extract_date(units: DateTimeUnits, date: Date) -> Result<Datum, EvalError> {
    let out = match units {
        DateTimeUnits::Year => i64::from(date.year()),
        DateTimeUnits::Month => i64::from(date.month()),
        DateTimeUnits::Day => i64::from(date.day()),
        _ => return Err(unsupported_unit(units, "extract from a date")),
    };
    Ok(Datum::from(out))
}

pub fn extract_time(units: DateTimeUnits, time: &Time) -> Result<Datum, EvalError> {
    let out = match units {
        DateTimeUnits::Hour => Datum::from(i64::from(time.time.hour())),
        DateTimeUnits::Minute => Datum::from(i64::from(time.time.minute())),
        DateTimeUnits::Second => extract_seconds(time.time, time.precision),
        DateTimeUnits::TimezoneHour | DateTimeUnits::TimezoneMinute => {
            extract_timezone(units, time.tz)?
        }
        _ => return Err(unsupported_unit(units, "extract from a time")),
    };
    Ok(out)
}

pub fn extract_timestamp(units: DateTimeUnits, ts: &Timestamp) -> Result<Datum, EvalError> {
    let dt = ts.datetime();
    let out = match units {
        DateTimeUnits::Year => Datum::from(i64::from(dt.year())),
        DateTimeUnits::Month => Datum::from(i64::from(dt.month())),
        DateTimeUnits::Day => Datum::from(i64::from(dt.day())),
        DateTimeUnits::Hour => Datum::from(i64::from(dt.hour())),
        DateTimeUnits::Minute => Datum::from(i64::from(dt.minute())),
        DateTimeUnits::Second => extract_seconds(dt.time(), ts.precision),
        DateTimeUnits::TimezoneHour | DateTimeUnits::TimezoneMinute => {
            extract_timezone(units, ts.tz)?
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use sq_repr::adt::datetime::TimestampError;

    use super::*;

    fn ts(
        y: i32,
        mo: u32,
        d: u32,
        h: u32,
        mi: u32,
        s: u32,
        tz: Option<Timezone>,
    ) -> Timestamp {
        let dt = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        Timestamp::new(dt, tz, TimestampPrecision::try_from(3).unwrap()).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn add_year_is_calendar_exact() {
        let t = ts(2017, 1, 10, 5, 30, 55, Some(Timezone::Offset(0)));
        let got = date_add_timestamp(DateTimeUnits::Year, 1, &t).unwrap();
        assert_eq!(
            got.unwrap_timestamp().datetime(),
            NaiveDate::from_ymd_opt(2018, 1, 10)
                .unwrap()
                .and_hms_opt(5, 30, 55)
                .unwrap(),
        );
    }

    #[test]
    fn add_month_saturates_at_month_end() {
        let t = ts(2004, 1, 31, 12, 0, 0, None);
        let got = date_add_timestamp(DateTimeUnits::Month, 1, &t).unwrap();
        assert_eq!(got.unwrap_timestamp().date(), date(2004, 2, 29));
        let got = date_add_timestamp(DateTimeUnits::Month, 13, &t).unwrap();
        assert_eq!(got.unwrap_timestamp().date(), date(2005, 2, 28));
    }

    #[test]
    fn add_rejects_out_of_range() {
        let t = ts(9999, 12, 31, 23, 59, 59, None);
        assert_eq!(
            date_add_timestamp(DateTimeUnits::Second, 1, &t).unwrap_err(),
            EvalError::from(TimestampError::OutOfRange),
        );
    }

    #[test]
    fn diff_day_is_exact_elapsed() {
        let from = ts(2016, 1, 10, 5, 30, 55, Some(Timezone::Offset(0)));
        let to = ts(2017, 1, 10, 5, 30, 55, Some(Timezone::Offset(0)));
        assert_eq!(
            date_diff_timestamp(DateTimeUnits::Day, &from, &to).unwrap(),
            Datum::from(366i64),
        );
    }

    #[test]
    fn diff_month_counts_whole_boundaries() {
        // Less than a month apart, though a month boundary is crossed.
        assert_eq!(
            date_diff_date(DateTimeUnits::Month, date(2017, 1, 25), date(2017, 2, 10)).unwrap(),
            Datum::from(0i64),
        );
        assert_eq!(
            date_diff_date(DateTimeUnits::Month, date(2017, 1, 10), date(2017, 2, 10)).unwrap(),
            Datum::from(1i64),
        );
        assert_eq!(
            date_diff_date(DateTimeUnits::Month, date(2017, 2, 10), date(2017, 1, 25)).unwrap(),
            Datum::from(0i64),
        );
        assert_eq!(
            date_diff_date(DateTimeUnits::Year, date(2015, 6, 1), date(2017, 5, 30)).unwrap(),
            Datum::from(1i64),
        );
    }

    #[test]
    fn diff_respects_offsets() {
        // 05:00+00:00 and 06:00+02:00 are one hour apart the other way.
        let from = ts(2017, 1, 10, 5, 0, 0, Some(Timezone::Offset(0)));
        let to = ts(2017, 1, 10, 6, 0, 0, Some(Timezone::Offset(120)));
        assert_eq!(
            date_diff_timestamp(DateTimeUnits::Hour, &from, &to).unwrap(),
            Datum::from(-1i64),
        );
    }

    #[test]
    fn extract_fields() {
        let t = ts(2017, 1, 10, 5, 30, 55, Some(Timezone::Offset(-690)));
        let get = |units| extract_timestamp(units, &t).unwrap();
        assert_eq!(get(DateTimeUnits::Year), Datum::from(2017i64));
        assert_eq!(get(DateTimeUnits::Month), Datum::from(1i64));
        assert_eq!(get(DateTimeUnits::Day), Datum::from(10i64));
        assert_eq!(get(DateTimeUnits::Hour), Datum::from(5i64));
        assert_eq!(get(DateTimeUnits::TimezoneHour), Datum::from(-11i64));
        assert_eq!(get(DateTimeUnits::TimezoneMinute), Datum::from(-30i64));
    }

    #[test]
    fn extract_timezone_of_unknown_offset_is_zero() {
        let t = ts(2017, 1, 10, 5, 30, 55, Some(Timezone::Unknown));
        assert_eq!(
            extract_timestamp(DateTimeUnits::TimezoneHour, &t).unwrap(),
            Datum::from(0i64),
        );
        let untagged = ts(2017, 1, 10, 5, 30, 55, None);
        assert_eq!(
            extract_timestamp(DateTimeUnits::TimezoneHour, &untagged).unwrap_err(),
            EvalError::NoTimezone,
        );
    }

    #[test]
    fn extract_second_carries_declared_precision() {
        let dt = NaiveDate::from_ymd_opt(2017, 1, 10)
            .unwrap()
            .and_hms_nano_opt(5, 30, 55, 123_456_789)
            .unwrap();
        let t = Timestamp::new(dt, None, TimestampPrecision::try_from(3).unwrap()).unwrap();
        let got = extract_timestamp(DateTimeUnits::Second, &t).unwrap();
        assert_eq!(got.unwrap_numeric().0.to_string(), "55.123");

        let t0 = Timestamp::new(dt, None, TimestampPrecision::try_from(0).unwrap()).unwrap();
        let got = extract_timestamp(DateTimeUnits::Second, &t0).unwrap();
        assert_eq!(got.unwrap_numeric().0.to_string(), "55");
    }

    #[test]
    fn time_arithmetic_wraps() {
        let t = Time::new(
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            None,
            TimestampPrecision::try_from(0).unwrap(),
        );
        let got = date_add_time(DateTimeUnits::Hour, 2, &t).unwrap();
        assert_eq!(got.unwrap_time().time, NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }

    proptest! {
        // Days at most 28 keep month addition free of end-of-month
        // saturation, which is the regime where the round-trip law holds.
        #[test]
        fn month_round_trip(
            y in 1970i32..2030,
            m in 1u32..=12,
            d in 1u32..=28,
            n in -120i64..120,
        ) {
            let t = date(y, m, d);
            let added = date_add_date(DateTimeUnits::Month, n, t).unwrap().unwrap_date();
            let diff = date_diff_date(DateTimeUnits::Month, added, t).unwrap();
            prop_assert_eq!(diff, Datum::from(-n));
        }
    }
}
