//! Recurrence rules
//!
//! A recurrence turns an anchor date, a unit and a multiplier into an endless
//! sequence of contiguous half-open periods. Period boundaries are a pure
//! function of the rule and the period index, so nothing is cached or stepped
//! incrementally: month and year periods are always computed from the anchor,
//! which keeps `bounds(i).end == bounds(i + 1).start` even across short months.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Base unit of a recurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodType {
    /// Parse a period type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" | "daily" => Some(Self::Day),
            "week" | "weeks" | "weekly" => Some(Self::Week),
            "month" | "months" | "monthly" => Some(Self::Month),
            "year" | "years" | "yearly" | "annual" => Some(Self::Year),
            _ => None,
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// When a recurrence stops producing periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceEnd {
    /// Last day covered by the recurrence (inclusive)
    Date(NaiveDate),
    /// Fixed number of periods
    Count(u32),
}

/// Errors from building a recurrence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("Recurrence multiplier must be at least 1")]
    ZeroMultiplier,

    #[error("Recurrence end date {end} is before its anchor {anchor}")]
    EndBeforeAnchor { anchor: NaiveDate, end: NaiveDate },

    #[error("Recurrence period count must be at least 1")]
    ZeroCount,
}

/// Half-open date range `[start, end)` of one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBounds {
    pub index: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodBounds {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Number of days in the period
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Last day that belongs to the period
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.end)
    }
}

/// A rule producing contiguous, non-overlapping periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub period_type: PeriodType,

    /// Number of base units per period (every `multiplier` months)
    pub multiplier: u32,

    /// Start of period 0
    pub anchor: NaiveDate,

    #[serde(default)]
    pub end: Option<RecurrenceEnd>,
}

impl Recurrence {
    /// Create an open-ended recurrence
    pub fn new(
        period_type: PeriodType,
        multiplier: u32,
        anchor: NaiveDate,
    ) -> Result<Self, RecurrenceError> {
        let recurrence = Self {
            period_type,
            multiplier,
            anchor,
            end: None,
        };
        recurrence.validate()?;
        Ok(recurrence)
    }

    /// Every month starting at `anchor`
    pub fn monthly(anchor: NaiveDate) -> Self {
        Self {
            period_type: PeriodType::Month,
            multiplier: 1,
            anchor,
            end: None,
        }
    }

    /// Set the end of the recurrence
    pub fn with_end(mut self, end: RecurrenceEnd) -> Result<Self, RecurrenceError> {
        self.end = Some(end);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), RecurrenceError> {
        if self.multiplier == 0 {
            return Err(RecurrenceError::ZeroMultiplier);
        }
        match self.end {
            Some(RecurrenceEnd::Date(end)) if end < self.anchor => {
                Err(RecurrenceError::EndBeforeAnchor {
                    anchor: self.anchor,
                    end,
                })
            }
            Some(RecurrenceEnd::Count(0)) => Err(RecurrenceError::ZeroCount),
            _ => Ok(()),
        }
    }

    /// Length of one period in days, for the fixed-length units
    fn fixed_days(&self) -> Option<i64> {
        match self.period_type {
            PeriodType::Day => Some(i64::from(self.multiplier)),
            PeriodType::Week => Some(i64::from(self.multiplier) * 7),
            PeriodType::Month | PeriodType::Year => None,
        }
    }

    /// Length of one period in months, for the calendar units
    fn step_months(&self) -> i64 {
        match self.period_type {
            PeriodType::Year => i64::from(self.multiplier) * 12,
            _ => i64::from(self.multiplier),
        }
    }

    /// First day of the `index`-th period
    pub fn period_start(&self, index: i64) -> Option<NaiveDate> {
        match self.fixed_days() {
            Some(days) => offset_days(self.anchor, index.checked_mul(days)?),
            None => offset_months(self.anchor, index.checked_mul(self.step_months())?),
        }
    }

    /// Bounds of the `index`-th period counted from the anchor
    ///
    /// Index 0 starts at the anchor; negative indices count backwards. Returns
    /// `None` only when the period falls outside the representable date range.
    pub fn period_bounds(&self, index: i64) -> Option<PeriodBounds> {
        Some(PeriodBounds {
            index,
            start: self.period_start(index)?,
            end: self.period_start(index.checked_add(1)?)?,
        })
    }

    /// Index of the period containing `date`
    pub fn period_index_for(&self, date: NaiveDate) -> i64 {
        if let Some(days) = self.fixed_days() {
            return (date - self.anchor).num_days().div_euclid(days);
        }

        let month_diff = month_ordinal(date) - month_ordinal(self.anchor);
        let mut index = month_diff.div_euclid(self.step_months());

        // Clamped month ends can push a period start past the naive estimate
        while self.period_start(index).map_or(false, |start| start > date) {
            index -= 1;
        }
        while self
            .period_start(index + 1)
            .map_or(false, |start| start <= date)
        {
            index += 1;
        }
        index
    }

    /// Number of whole periods fully contained in `[range_start, range_end)`
    pub fn periods_between(&self, range_start: NaiveDate, range_end: NaiveDate) -> u32 {
        if range_end <= range_start {
            return 0;
        }

        let mut first = self.period_index_for(range_start);
        if self
            .period_start(first)
            .map_or(false, |start| start < range_start)
        {
            first += 1;
        }
        // Period i ends on or before range_end iff i + 1 <= index_for(range_end)
        let past_last = self.period_index_for(range_end);

        u32::try_from((past_last - first).max(0)).unwrap_or(u32::MAX)
    }

    /// Number of periods the recurrence spans
    ///
    /// A count end gives the count, a date end gives the whole periods between
    /// the anchor and the end date (inclusive), and an open recurrence gives
    /// `fallback`.
    pub fn number_of_periods(&self, fallback: u32) -> u32 {
        match self.end {
            Some(RecurrenceEnd::Count(count)) => count,
            Some(RecurrenceEnd::Date(end)) => {
                let range_end = end.succ_opt().unwrap_or(end);
                self.periods_between(self.anchor, range_end)
            }
            None => fallback,
        }
    }

    /// Days from `today` until the end of the period containing it
    pub fn days_left_in_period(&self, today: NaiveDate) -> i64 {
        self.period_bounds(self.period_index_for(today))
            .map_or(0, |bounds| (bounds.end - today).num_days())
    }

    /// Short human label for the `index`-th period
    pub fn period_label(&self, index: i64) -> String {
        let Some(bounds) = self.period_bounds(index) else {
            return format!("period {}", index);
        };

        let starts_on_boundary = match self.period_type {
            PeriodType::Month => bounds.start.day() == 1,
            PeriodType::Year => bounds.start.ordinal() == 1,
            _ => false,
        };

        match (self.period_type, self.multiplier, starts_on_boundary) {
            (PeriodType::Month, 1, true) => bounds.start.format("%b %Y").to_string(),
            (PeriodType::Year, 1, true) => bounds.start.format("%Y").to_string(),
            (PeriodType::Day, 1, _) => bounds.start.to_string(),
            _ => format!("{} to {}", bounds.start, bounds.last_day()),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.multiplier == 1 {
            write!(f, "every {}", self.period_type)?;
        } else {
            write!(f, "every {} {}s", self.multiplier, self.period_type)?;
        }

        match self.end {
            Some(RecurrenceEnd::Date(end)) => write!(f, " until {}", end),
            Some(RecurrenceEnd::Count(1)) => write!(f, ", once"),
            Some(RecurrenceEnd::Count(n)) => write!(f, ", {} times", n),
            None => Ok(()),
        }
    }
}

fn offset_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Shift by whole months, clamping the day to the target month's length
fn offset_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let target = month_ordinal(date).checked_add(months)?;
    let year = i32::try_from(target.div_euclid(12)).ok()?;
    let month = u32::try_from(target.rem_euclid(12) + 1).ok()?;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(first_next.pred_opt()?.day())
}
