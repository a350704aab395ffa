/*
 * Copyright 2026 QueryCtx Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Calendar and interval literals with the arithmetic expression evaluation
//! applies to them.
//!
//! Datetimes are microsecond ticks since the Unix epoch in UTC. Tick
//! arithmetic saturates at the `i64` range; month arithmetic decomposes the
//! datetime into calendar fields and clamps the day to the target month.

use crate::error::{QueryCtxError, Result};
use crate::util::strings::to_zero_padded_string;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// `month` is 1-based.
pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn clamp_day_of_month(year: i32, month: u8, day: u8) -> u8 {
    day.min(days_in_month(year, month))
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DatetimeLit {
    pub ticks: i64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DatetimeIntervalLit {
    pub micros: i64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct YearMonthIntervalLit {
    pub months: i64,
}

impl DatetimeLit {
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Self {
            ticks: seconds.saturating_mul(MICROS_PER_SECOND),
        }
    }

    pub fn from_calendar(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        micros: u32,
    ) -> Result<Self> {
        let month = Month::try_from(month)
            .map_err(|e| QueryCtxError::Eval(format!("invalid month: {e}")))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|e| QueryCtxError::Eval(format!("invalid date: {e}")))?;
        let time = Time::from_hms_micro(hour, minute, second, micros)
            .map_err(|e| QueryCtxError::Eval(format!("invalid time of day: {e}")))?;
        Ok(Self::from_primitive(PrimitiveDateTime::new(date, time)))
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.ticks.div_euclid(MICROS_PER_SECOND)
    }

    pub fn subseconds(&self) -> i64 {
        self.ticks.rem_euclid(MICROS_PER_SECOND)
    }

    fn from_primitive(dt: PrimitiveDateTime) -> Self {
        let utc = dt.assume_utc();
        Self {
            ticks: utc
                .unix_timestamp()
                .saturating_mul(MICROS_PER_SECOND)
                .saturating_add(i64::from(utc.microsecond())),
        }
    }

    fn to_offset(self) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.epoch_seconds())
            .map_err(|e| QueryCtxError::Eval(format!("datetime out of range: {e}")))
    }

    pub fn year_month_day(&self) -> Result<(i32, u8, u8)> {
        let dt = self.to_offset()?;
        Ok((dt.year(), u8::from(dt.month()), dt.day()))
    }

    /// Shift by whole months, clamping the day to the end of the target month.
    pub fn add_months(&self, months: i64) -> Result<Self> {
        let dt = self.to_offset()?;
        let total = i64::from(dt.year())
            .checked_mul(12)
            .and_then(|m| m.checked_add(i64::from(u8::from(dt.month()) - 1)))
            .and_then(|m| m.checked_add(months))
            .ok_or_else(|| QueryCtxError::Eval("year out of range".to_string()))?;
        let year = i32::try_from(total.div_euclid(12))
            .map_err(|_| QueryCtxError::Eval("year out of range".to_string()))?;
        let month = (total.rem_euclid(12) + 1) as u8;
        let day = clamp_day_of_month(year, month, dt.day());

        let month = Month::try_from(month)
            .map_err(|e| QueryCtxError::Eval(format!("invalid month: {e}")))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|e| QueryCtxError::Eval(format!("datetime out of range: {e}")))?;
        let shifted = Self::from_primitive(PrimitiveDateTime::new(date, dt.time()));
        Ok(Self {
            ticks: shifted.ticks.saturating_add(self.subseconds()),
        })
    }

    pub fn add_year_month(&self, interval: YearMonthIntervalLit) -> Result<Self> {
        self.add_months(interval.months)
    }

    pub fn sub_year_month(&self, interval: YearMonthIntervalLit) -> Result<Self> {
        self.add_months(interval.months.saturating_neg())
    }
}

impl fmt::Display for DatetimeLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(dt) = self.to_offset() else {
            return write!(f, "datetime({} ticks)", self.ticks);
        };
        let pad = |v: u8| to_zero_padded_string(u64::from(v), 2);
        write!(
            f,
            "{}-{}-{}T{}:{}:{}",
            dt.year(),
            pad(u8::from(dt.month())),
            pad(dt.day()),
            pad(dt.hour()),
            pad(dt.minute()),
            pad(dt.second())
        )?;
        if self.subseconds() != 0 {
            write!(f, ".{}", to_zero_padded_string(self.subseconds() as u64, 6))?;
        }
        Ok(())
    }
}

impl DatetimeIntervalLit {
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            micros: seconds.saturating_mul(MICROS_PER_SECOND),
        }
    }

    pub fn from_days(days: i64) -> Self {
        Self {
            micros: days.saturating_mul(MICROS_PER_DAY),
        }
    }

    pub fn checked_div(self, rhs: i64) -> Option<Self> {
        self.micros.checked_div(rhs).map(|micros| Self { micros })
    }
}

impl fmt::Display for DatetimeIntervalLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.micros < 0 { "-" } else { "" };
        let abs = self.micros.unsigned_abs();
        let micros_per_day = MICROS_PER_DAY as u64;
        let micros_per_second = MICROS_PER_SECOND as u64;
        let days = abs / micros_per_day;
        let rest = abs % micros_per_day;
        let seconds = rest / micros_per_second;
        let sub = rest % micros_per_second;
        if days > 0 {
            write!(f, "{sign}{days} day{} ", if days == 1 { "" } else { "s" })?;
        } else {
            write!(f, "{sign}")?;
        }
        write!(
            f,
            "{}:{}:{}",
            to_zero_padded_string(seconds / 3600, 2),
            to_zero_padded_string(seconds / 60 % 60, 2),
            to_zero_padded_string(seconds % 60, 2)
        )?;
        if sub != 0 {
            write!(f, ".{}", to_zero_padded_string(sub, 6))?;
        }
        Ok(())
    }
}

impl YearMonthIntervalLit {
    pub fn from_years_months(years: i64, months: i64) -> Self {
        Self {
            months: years.saturating_mul(12).saturating_add(months),
        }
    }

    pub fn checked_div(self, rhs: i64) -> Option<Self> {
        self.months.checked_div(rhs).map(|months| Self { months })
    }
}

impl fmt::Display for YearMonthIntervalLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.months < 0 { "-" } else { "" };
        let abs = self.months.unsigned_abs();
        let (years, months) = (abs / 12, abs % 12);
        write!(
            f,
            "{sign}{years} year{} {months} mon{}",
            if years == 1 { "" } else { "s" },
            if months == 1 { "" } else { "s" }
        )
    }
}

impl Add<DatetimeIntervalLit> for DatetimeLit {
    type Output = DatetimeLit;

    fn add(self, rhs: DatetimeIntervalLit) -> DatetimeLit {
        DatetimeLit {
            ticks: self.ticks.saturating_add(rhs.micros),
        }
    }
}

impl Add<DatetimeLit> for DatetimeIntervalLit {
    type Output = DatetimeLit;

    fn add(self, rhs: DatetimeLit) -> DatetimeLit {
        rhs + self
    }
}

impl Sub<DatetimeIntervalLit> for DatetimeLit {
    type Output = DatetimeLit;

    fn sub(self, rhs: DatetimeIntervalLit) -> DatetimeLit {
        DatetimeLit {
            ticks: self.ticks.saturating_sub(rhs.micros),
        }
    }
}

// Datetime minus datetime is a day-time interval, never a year-month one.
impl Sub<DatetimeLit> for DatetimeLit {
    type Output = DatetimeIntervalLit;

    fn sub(self, rhs: DatetimeLit) -> DatetimeIntervalLit {
        DatetimeIntervalLit {
            micros: self.ticks.saturating_sub(rhs.ticks),
        }
    }
}

macro_rules! interval_arith {
    ($ty:ident, $field:ident) => {
        impl Add for $ty {
            type Output = $ty;

            fn add(self, rhs: $ty) -> $ty {
                $ty {
                    $field: self.$field.saturating_add(rhs.$field),
                }
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: $ty) {
                *self = *self + rhs;
            }
        }

        impl Sub for $ty {
            type Output = $ty;

            fn sub(self, rhs: $ty) -> $ty {
                $ty {
                    $field: self.$field.saturating_sub(rhs.$field),
                }
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, rhs: $ty) {
                *self = *self - rhs;
            }
        }

        impl Neg for $ty {
            type Output = $ty;

            fn neg(self) -> $ty {
                $ty {
                    $field: self.$field.saturating_neg(),
                }
            }
        }

        impl Mul<i64> for $ty {
            type Output = $ty;

            fn mul(self, rhs: i64) -> $ty {
                $ty {
                    $field: self.$field.saturating_mul(rhs),
                }
            }
        }

        impl Mul<$ty> for i64 {
            type Output = $ty;

            fn mul(self, rhs: $ty) -> $ty {
                rhs * self
            }
        }

        impl Mul<f64> for $ty {
            type Output = $ty;

            fn mul(self, rhs: f64) -> $ty {
                $ty {
                    $field: (self.$field as f64 * rhs) as i64,
                }
            }
        }

        impl Mul<$ty> for f64 {
            type Output = $ty;

            fn mul(self, rhs: $ty) -> $ty {
                rhs * self
            }
        }

        impl Div<f64> for $ty {
            type Output = $ty;

            fn div(self, rhs: f64) -> $ty {
                $ty {
                    $field: (self.$field as f64 / rhs) as i64,
                }
            }
        }
    };
}

interval_arith!(DatetimeIntervalLit, micros);
interval_arith!(YearMonthIntervalLit, months);
