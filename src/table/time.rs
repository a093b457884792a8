//! Timestamp parsing and fixed-width time buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Format used when timestamps are written back out as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parses a timestamp cell.
///
/// Offsets (RFC 3339) are converted to UTC; naive values are taken as-is.
/// Returns `None` for anything unparseable rather than failing.
///
/// # Examples
///
/// ```
/// use microgrid_eda::table::parse_timestamp;
///
/// assert!(parse_timestamp("2023-01-01 12:30:00").is_some());
/// assert!(parse_timestamp("2023-01-01T12:30:00+01:00").is_some());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Interprets a numeric time value as Unix epoch seconds.
pub fn timestamp_from_epoch_seconds(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64).map(|dt| dt.naive_utc())
}

/// Renders a timestamp with [`TIMESTAMP_FORMAT`]; fractional seconds only
/// appear when non-zero.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Microseconds since the Unix epoch, treating the naive value as UTC.
pub fn epoch_micros(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

/// Inverse of [`epoch_micros`].
pub fn from_epoch_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// Error returned when a bucket rule cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bucket width \"{rule}\": {reason}")]
pub struct BucketWidthError {
    pub rule: String,
    pub reason: String,
}

/// Width of a resampling bucket. Always strictly positive.
///
/// # Examples
///
/// ```
/// use microgrid_eda::table::BucketWidth;
///
/// let w: BucketWidth = "30min".parse().unwrap();
/// assert_eq!(w.as_micros(), 30 * 60 * 1_000_000);
/// assert_eq!(BucketWidth::default(), BucketWidth::hours(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketWidth(TimeDelta);

impl BucketWidth {
    /// Wraps a duration, rejecting zero, negative and sub-microsecond widths.
    pub fn new(width: TimeDelta) -> Option<Self> {
        match width.num_microseconds() {
            Some(us) if us > 0 => Some(Self(width)),
            _ => None,
        }
    }

    /// `n`-hour buckets. `n` of zero is clamped to one.
    pub fn hours(n: u32) -> Self {
        Self(TimeDelta::hours(i64::from(n.max(1))))
    }

    /// `n`-minute buckets. `n` of zero is clamped to one.
    pub fn minutes(n: u32) -> Self {
        Self(TimeDelta::minutes(i64::from(n.max(1))))
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    /// Width in microseconds; always `> 0`.
    pub fn as_micros(&self) -> i64 {
        self.0.num_microseconds().unwrap_or(i64::MAX)
    }

    /// Epoch-aligned, left-closed bucket start containing `ts`.
    pub fn floor(&self, ts: &NaiveDateTime) -> i64 {
        let us = epoch_micros(ts);
        us - us.rem_euclid(self.as_micros())
    }
}

impl Default for BucketWidth {
    fn default() -> Self {
        Self::hours(1)
    }
}

impl FromStr for BucketWidth {
    type Err = BucketWidthError;

    /// Parses rules such as `1h`, `30min`, `15m`, `90s`, `1d`, `500ms`.
    /// A bare number is seconds.
    fn from_str(rule: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| BucketWidthError {
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = rule.trim();
        if trimmed.is_empty() {
            return Err(err("rule cannot be empty"));
        }
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (value_str, unit) = trimmed.split_at(split);
        let value: i64 = value_str
            .parse()
            .map_err(|_| err("expected a leading integer"))?;

        let delta = match unit.trim() {
            "ms" => TimeDelta::try_milliseconds(value),
            "" | "s" | "S" => TimeDelta::try_seconds(value),
            "m" | "min" | "T" => TimeDelta::try_minutes(value),
            "h" | "H" => TimeDelta::try_hours(value),
            "d" | "D" => TimeDelta::try_days(value),
            _ => return Err(err("unsupported unit; expected ms, s, m/min, h or d")),
        }
        .ok_or_else(|| err("width out of range"))?;

        Self::new(delta).ok_or_else(|| err("width must be positive"))
    }
}

impl fmt::Display for BucketWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let us = self.as_micros();
        const MS: i64 = 1_000;
        const S: i64 = 1_000 * MS;
        const MIN: i64 = 60 * S;
        const H: i64 = 60 * MIN;
        const D: i64 = 24 * H;
        match us {
            _ if us % D == 0 => write!(f, "{}d", us / D),
            _ if us % H == 0 => write!(f, "{}h", us / H),
            _ if us % MIN == 0 => write!(f, "{}min", us / MIN),
            _ if us % S == 0 => write!(f, "{}s", us / S),
            _ if us % MS == 0 => write!(f, "{}ms", us / MS),
            _ => write!(f, "{us}us"),
        }
    }
}
