//! Calendar date parsing and range resolution.
//!
//! Dates are exchanged in canonical `YYYY-MM-DD` form. Every operation that
//! depends on "today" has a `*_with` variant taking a [`Clock`], so tests can
//! pin the current date instead of asserting around midnight.
//!
//! ## Expressions
//!
//! | Function | Accepts |
//! |----------|---------|
//! | [`parse_date`] | `2026-02-11` |
//! | [`parse_range`] | `7d`, `2026-01-15:2026-02-10` |
//! | [`resolve_date`] | `yesterday`, `-3d`, `2026-02-11` |

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Canonical date format.
const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Clock
// ============================================================================

/// Source of the current calendar date.
pub trait Clock {
    /// Returns today's date.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that always reports the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// ============================================================================
// Date Range
// ============================================================================

/// An inclusive calendar range with `start <= end`.
///
/// Every constructor, deserialization included, enforces the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Unchecked wire form of [`DateRange`].
#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = CoreError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            let (start, end) = (format_day(start), format_day(end));
            return Err(CoreError::invalid_range(
                &format!("{start}:{end}"),
                format!("Invalid range: start \"{start}\" is after end \"{end}\""),
            ));
        }
        Ok(Self { start, end })
    }

    /// Creates a range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Start date in canonical form.
    pub fn start_str(&self) -> String {
        format_day(self.start)
    }

    /// End date in canonical form.
    pub fn end_str(&self) -> String {
        format_day(self.end)
    }

    /// Number of days covered, both ends inclusive.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Returns true if the range covers exactly one day.
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    /// Every day in the range, most recent first.
    pub fn days(&self) -> Vec<NaiveDate> {
        descending_days(self.start, self.end)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Formats a date in canonical `YYYY-MM-DD` form.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Exact `NNNN-NN-NN` shape check; chrono alone accepts unpadded fields.
fn has_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parses a canonical date string into a [`NaiveDate`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidDate`] for malformed or non-existent dates.
pub fn parse_day(s: &str) -> Result<NaiveDate, CoreError> {
    if !has_date_shape(s) {
        return Err(CoreError::invalid_date(
            s,
            format!("Invalid date format \"{s}\". Use YYYY-MM-DD"),
        ));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| CoreError::invalid_date(s, format!("Invalid date \"{s}\"")))
}

/// Validates a `YYYY-MM-DD` string and returns it unchanged.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDate`] naming the input when the shape is wrong
/// or the date does not exist (e.g. `2026-02-30`).
pub fn parse_date(s: &str) -> Result<String, CoreError> {
    parse_day(s).map(|_| s.to_string())
}

/// Parses a range expression against the system clock.
///
/// # Errors
///
/// See [`parse_range_with`].
pub fn parse_range(expr: &str) -> Result<DateRange, CoreError> {
    parse_range_with(expr, &SystemClock)
}

/// Parses a range expression.
///
/// - `"<N>d"`: the `N` most recent days ending today, inclusive.
/// - `"<date>:<date>"`: an absolute inclusive range.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRange`] when neither form matches, when `N` is
/// zero, or when the absolute start is after the end. Malformed dates inside an
/// absolute range surface as [`CoreError::InvalidDate`].
pub fn parse_range_with(expr: &str, clock: &impl Clock) -> Result<DateRange, CoreError> {
    if let Some(count) = expr.strip_suffix('d').filter(|n| is_digits(n)) {
        let days: u64 = count.parse().map_err(|_| count_too_large(expr))?;
        if days == 0 {
            return Err(CoreError::invalid_range(
                expr,
                format!("Invalid range \"{expr}\". Day count must be positive"),
            ));
        }
        let end = clock.today();
        let start = end
            .checked_sub_days(Days::new(days - 1))
            .ok_or_else(|| count_too_large(expr))?;
        return DateRange::new(start, end);
    }

    if let Some((start, end)) = expr
        .split_once(':')
        .filter(|(a, b)| has_date_shape(a) && has_date_shape(b))
    {
        return DateRange::new(parse_day(start)?, parse_day(end)?);
    }

    Err(CoreError::invalid_range(
        expr,
        format!("Invalid range format \"{expr}\". Use '7d', '30d', or 'YYYY-MM-DD:YYYY-MM-DD'"),
    ))
}

fn count_too_large(expr: &str) -> CoreError {
    CoreError::invalid_range(expr, format!("Invalid range \"{expr}\". Day count is too large"))
}

/// Every date from `end` down to `start`, inclusive, most recent first.
///
/// Returns an empty sequence when `start` is after `end`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDate`] if either bound is not a valid date.
pub fn date_range(start: &str, end: &str) -> Result<Vec<String>, CoreError> {
    let start = parse_day(start)?;
    let end = parse_day(end)?;
    Ok(descending_days(start, end).into_iter().map(format_day).collect())
}

fn descending_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = end;
    while current >= start {
        days.push(current);
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    days
}

/// Resolves a single-date expression against the system clock.
///
/// # Errors
///
/// See [`resolve_date_with`].
pub fn resolve_date(expr: &str) -> Result<String, CoreError> {
    resolve_date_with(expr, &SystemClock)
}

/// Resolves `yesterday`, `-<N>d`, or a literal `YYYY-MM-DD`.
///
/// # Errors
///
/// Anything else is handed to [`parse_date`] and fails with
/// [`CoreError::InvalidDate`].
pub fn resolve_date_with(expr: &str, clock: &impl Clock) -> Result<String, CoreError> {
    let today = clock.today();

    let offset = if expr == "yesterday" {
        Some(1)
    } else {
        expr.strip_prefix('-')
            .and_then(|rest| rest.strip_suffix('d'))
            .filter(|n| is_digits(n))
            .and_then(|n| n.parse::<u64>().ok())
    };

    match offset {
        Some(days) => today
            .checked_sub_days(Days::new(days))
            .map(format_day)
            .ok_or_else(|| CoreError::invalid_date(expr, format!("Invalid date \"{expr}\""))),
        None => parse_date(expr),
    }
}

/// Today's date in canonical form, from the system clock.
pub fn today_str() -> String {
    today_str_with(&SystemClock)
}

/// Today's date in canonical form.
pub fn today_str_with(clock: &impl Clock) -> String {
    format_day(clock.today())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Tests
// ============================================================================
