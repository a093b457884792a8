//! Typed table abstraction, timestamp parsing, and bucket widths.

/// Timestamp parsing, formatting, and bucket widths.
pub mod time;
pub mod types;

pub use time::{BucketWidth, BucketWidthError, format_timestamp, parse_timestamp};
pub use types::{Column, ColumnData, Table, TimeIndex, normalize_field_name, parse_number};
