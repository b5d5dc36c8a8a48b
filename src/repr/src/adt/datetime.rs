// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Date and time types and the calendar arithmetic they support.
//!
//! All values are restricted to the proleptic Gregorian years 1 through
//! 9999; arithmetic that would leave that range fails with
//! [`TimestampError::OutOfRange`] rather than wrapping.

use std::error::Error;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// The first representable date.
pub const LOW_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(d) => d,
    None => unreachable!(),
};

/// The last representable date.
pub const HIGH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(d) => d,
    None => unreachable!(),
};

/// The error returned by datetime operations that leave the representable
/// range.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TimestampError {
    /// The result fell outside years 1 through 9999.
    OutOfRange,
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimestampError::OutOfRange => f.write_str("timestamp out of range"),
        }
    }
}

impl Error for TimestampError {}

/// The `precision` of a [`ScalarType::Time`] or [`ScalarType::Timestamp`],
/// i.e. the number of fractional-second digits the value retains.
///
/// [`ScalarType::Time`]: crate::ScalarType::Time
/// [`ScalarType::Timestamp`]: crate::ScalarType::Timestamp
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TimestampPrecision(u8);

impl TimestampPrecision {
    /// The maximum number of fractional-second digits, i.e. nanoseconds.
    pub const MAX: TimestampPrecision = TimestampPrecision(9);

    /// Consumes the newtype wrapper, returning the contents as a `u8`.
    pub fn into_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for TimestampPrecision {
    type Error = InvalidTimestampPrecisionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(p) if p <= Self::MAX.0 => Ok(TimestampPrecision(p)),
            _ => Err(InvalidTimestampPrecisionError(value)),
        }
    }
}

/// The error returned when constructing a [`TimestampPrecision`] from an
/// invalid value.
#[derive(Debug, Clone)]
pub struct InvalidTimestampPrecisionError(i64);

impl fmt::Display for InvalidTimestampPrecisionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "precision for type time/timestamp must be between 0 and {}, got {}",
            TimestampPrecision::MAX.0,
            self.0
        )
    }
}

impl Error for InvalidTimestampPrecisionError {}

/// The timezone annotation on a [`Time`] or [`Timestamp`] value.
///
/// An offset of *unknown* (written `-00:00` in the wire format) is a distinct
/// state from an offset of zero: the local clock-face reading is trusted but
/// its relation to UTC is not asserted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Timezone {
    /// The offset from UTC is explicitly unknown.
    Unknown,
    /// A fixed offset from UTC, in minutes.
    Offset(i32),
}

impl Timezone {
    /// The offset in minutes, treating an unknown offset as zero.
    pub fn offset_minutes(&self) -> i32 {
        match self {
            Timezone::Unknown => 0,
            Timezone::Offset(m) => *m,
        }
    }

    /// The signed hour component of the offset.
    pub fn hour_part(&self) -> i32 {
        self.offset_minutes() / 60
    }

    /// The signed minute component of the offset.
    pub fn minute_part(&self) -> i32 {
        self.offset_minutes() % 60
    }
}

/// A calendar date, checked to lie within years 1 through 9999.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Date(NaiveDate);

impl Date {
    /// Constructs a date from a year, month, and day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Date, TimestampError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(TimestampError::OutOfRange)
            .and_then(Date::try_from)
    }

    /// Adds a whole number of months, saturating the day of month to the last
    /// valid day of the target month.
    pub fn checked_add_months(&self, months: i64) -> Result<Date, TimestampError> {
        add_months_saturating(self.0, months).and_then(Date::try_from)
    }

    /// Adds a fixed duration, truncated to whole days.
    pub fn checked_add_days(&self, days: i64) -> Result<Date, TimestampError> {
        let duration = Duration::try_days(days).ok_or(TimestampError::OutOfRange)?;
        self.0
            .checked_add_signed(duration)
            .ok_or(TimestampError::OutOfRange)
            .and_then(Date::try_from)
    }
}

impl TryFrom<NaiveDate> for Date {
    type Error = TimestampError;

    fn try_from(date: NaiveDate) -> Result<Date, TimestampError> {
        if date < LOW_DATE || date > HIGH_DATE {
            return Err(TimestampError::OutOfRange);
        }
        Ok(Date(date))
    }
}

impl Deref for Date {
    type Target = NaiveDate;

    fn deref(&self) -> &NaiveDate {
        &self.0
    }
}

impl From<Date> for NaiveDate {
    fn from(date: Date) -> NaiveDate {
        date.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A time of day with a declared fractional-second precision and an optional
/// timezone annotation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Time {
    pub time: NaiveTime,
    pub tz: Option<Timezone>,
    pub precision: TimestampPrecision,
}

impl Time {
    /// Constructs a time of day.
    pub fn new(time: NaiveTime, tz: Option<Timezone>, precision: TimestampPrecision) -> Time {
        Time { time, tz, precision }
    }

    /// Adds a fixed duration, wrapping around midnight.
    pub fn wrapping_add(&self, duration: Duration) -> Time {
        let (time, _wrapped_days) = self.time.overflowing_add_signed(duration);
        Time { time, ..*self }
    }

    /// The seconds elapsed since midnight, ignoring the timezone annotation.
    pub fn seconds_of_day(&self) -> i64 {
        i64::from(self.time.num_seconds_from_midnight())
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.time.fmt(f)
    }
}

/// A calendar timestamp: a local clock-face datetime, an optional timezone
/// annotation, and a declared fractional-second precision.
///
/// Checked to lie within years 1 through 9999.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    datetime: NaiveDateTime,
    pub tz: Option<Timezone>,
    pub precision: TimestampPrecision,
}

impl Timestamp {
    /// Constructs a timestamp, checking the range.
    pub fn new(
        datetime: NaiveDateTime,
        tz: Option<Timezone>,
        precision: TimestampPrecision,
    ) -> Result<Timestamp, TimestampError> {
        if datetime.date() < LOW_DATE || datetime.date() > HIGH_DATE {
            return Err(TimestampError::OutOfRange);
        }
        Ok(Timestamp {
            datetime,
            tz,
            precision,
        })
    }

    /// A UTC-precision-9 timestamp from an absolute instant.
    pub fn from_utc_instant(instant: DateTime<chrono::Utc>) -> Result<Timestamp, TimestampError> {
        Timestamp::new(
            instant.naive_utc(),
            Some(Timezone::Offset(0)),
            TimestampPrecision::MAX,
        )
    }

    /// The local clock-face reading.
    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    /// The date component of the local clock-face reading.
    pub fn date(&self) -> Date {
        Date(self.datetime.date())
    }

    /// The clock-face reading normalized to UTC, treating an unknown or
    /// absent offset as zero.
    pub fn utc_datetime(&self) -> NaiveDateTime {
        let offset = self.tz.map_or(0, |tz| tz.offset_minutes());
        self.datetime - Duration::minutes(i64::from(offset))
    }

    /// Adds a whole number of months, saturating the day of month to the last
    /// valid day of the target month. The time of day is unchanged.
    pub fn checked_add_months(&self, months: i64) -> Result<Timestamp, TimestampError> {
        let date = add_months_saturating(self.datetime.date(), months)?;
        Timestamp::new(date.and_time(self.datetime.time()), self.tz, self.precision)
    }

    /// Adds a fixed duration.
    pub fn checked_add_duration(&self, duration: Duration) -> Result<Timestamp, TimestampError> {
        let datetime = self
            .datetime
            .checked_add_signed(duration)
            .ok_or(TimestampError::OutOfRange)?;
        Timestamp::new(datetime, self.tz, self.precision)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.datetime.fmt(f)
    }
}

/// Adds months to a date per the calendar's rules: the year and month
/// advance exactly, and the day of month walks back to the last valid day
/// of the target month when needed (Jan 31 + 1 month is Feb 28 or 29).
fn add_months_saturating(date: NaiveDate, months: i64) -> Result<NaiveDate, TimestampError> {
    let months = i32::try_from(months).map_err(|_| TimestampError::OutOfRange)?;
    let mut month = date.month0() as i32 + months;
    let year = date
        .year()
        .checked_add(month.div_euclid(12))
        .ok_or(TimestampError::OutOfRange)?;
    month = month.rem_euclid(12) + 1;
    let mut day = date.day();
    // If the date was in the dwindling days of the source month, walk back to
    // the last day of the target month.
    loop {
        match NaiveDate::from_ymd_opt(year, month as u32, day) {
            Some(d) => return Ok(d),
            None if day > 28 => day -= 1,
            // The year is unrepresentable in chrono itself.
            None => return Err(TimestampError::OutOfRange),
        }
    }
}

/// The calendar fields addressable by the datetime functions.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum DateTimeUnits {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    TimezoneHour,
    TimezoneMinute,
}

impl fmt::Display for DateTimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateTimeUnits::Year => f.write_str("year"),
            DateTimeUnits::Month => f.write_str("month"),
            DateTimeUnits::Day => f.write_str("day"),
            DateTimeUnits::Hour => f.write_str("hour"),
            DateTimeUnits::Minute => f.write_str("minute"),
            DateTimeUnits::Second => f.write_str("second"),
            DateTimeUnits::TimezoneHour => f.write_str("timezone_hour"),
            DateTimeUnits::TimezoneMinute => f.write_str("timezone_minute"),
        }
    }
}

impl FromStr for DateTimeUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "y" | "year" => Ok(Self::Year),
            "mon" | "month" => Ok(Self::Month),
            "d" | "day" => Ok(Self::Day),
            "h" | "hour" => Ok(Self::Hour),
            "min" | "minute" => Ok(Self::Minute),
            "s" | "second" => Ok(Self::Second),
            "timezone_hour" => Ok(Self::TimezoneHour),
            "timezone_minute" => Ok(Self::TimezoneMinute),
            _ => Err(format!("unknown datetime unit {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_addition_saturates() {
        let jan31 = Date::from_ymd(2004, 1, 31).unwrap();
        assert_eq!(
            jan31.checked_add_months(1).unwrap(),
            Date::from_ymd(2004, 2, 29).unwrap(),
        );
        assert_eq!(
            jan31.checked_add_months(13).unwrap(),
            Date::from_ymd(2005, 2, 28).unwrap(),
        );
        let feb29 = Date::from_ymd(2020, 2, 29).unwrap();
        assert_eq!(
            feb29.checked_add_months(12).unwrap(),
            Date::from_ymd(2021, 2, 28).unwrap(),
        );
    }

    #[test]
    fn month_addition_is_exact_off_the_boundary() {
        let mid = Date::from_ymd(2017, 6, 15).unwrap();
        assert_eq!(
            mid.checked_add_months(-7).unwrap(),
            Date::from_ymd(2016, 11, 15).unwrap(),
        );
    }

    #[test]
    fn range_is_enforced() {
        assert_eq!(Date::from_ymd(0, 12, 31), Err(TimestampError::OutOfRange));
        let late = Date::from_ymd(9999, 12, 31).unwrap();
        assert_eq!(late.checked_add_days(1), Err(TimestampError::OutOfRange));
        assert_eq!(late.checked_add_months(1), Err(TimestampError::OutOfRange));
    }

    #[test]
    fn unknown_offset_reads_as_zero() {
        assert_eq!(Timezone::Unknown.hour_part(), 0);
        assert_eq!(Timezone::Offset(-690).hour_part(), -11);
        assert_eq!(Timezone::Offset(-690).minute_part(), -30);
    }
}
