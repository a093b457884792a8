//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::NaiveDateTime;
use microgrid_eda::table::{ColumnData, Table, TimeIndex};

/// Parses `YYYY-MM-DD HH:MM:SS`.
pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("fixture timestamp")
}

/// Raw microgrid table with a text `TimeStamp` column and mixed-case fields.
pub fn raw_microgrid(
    stamps: &[&str],
    consumption: &[Option<f64>],
    solar: &[Option<f64>],
    wind: &[Option<f64>],
) -> Table {
    Table::new()
        .with_column("TimeStamp", ColumnData::text(stamps.iter().map(|s| Some(*s))))
        .and_then(|t| t.with_column("Consumption ", ColumnData::numeric(consumption.iter().copied())))
        .and_then(|t| t.with_column("SOLAR", ColumnData::numeric(solar.iter().copied())))
        .and_then(|t| t.with_column("Wind", ColumnData::numeric(wind.iter().copied())))
        .expect("fixture columns share a length")
}

/// Four half-hourly rows from 12:00 to 13:30 on 2023-01-01.
pub fn half_hourly_sample() -> Table {
    raw_microgrid(
        &[
            "2023-01-01 12:00:00",
            "2023-01-01 12:30:00",
            "2023-01-01 13:00:00",
            "2023-01-01 13:30:00",
        ],
        &[Some(10.5), Some(11.0), Some(12.5), Some(13.0)],
        &[Some(5.0), Some(5.5), Some(6.0), Some(6.5)],
        &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
    )
}

/// A cleaned-looking table with a timestamp index, hourly spacing, no gaps.
pub fn cleaned_hourly(hours: usize) -> Table {
    let start = ts("2023-01-01 00:00:00");
    let index: Vec<_> = (0..hours)
        .map(|h| Some(start + chrono::TimeDelta::hours(h as i64)))
        .collect();
    Table::new()
        .with_index(TimeIndex::new("timestamp", index))
        .and_then(|t| {
            t.with_column(
                "consumption",
                ColumnData::numeric((0..hours).map(|h| Some(10.0 + h as f64 * 0.25))),
            )
        })
        .and_then(|t| {
            t.with_column(
                "solar",
                ColumnData::numeric((0..hours).map(|h| Some((h % 12) as f64 / 3.0))),
            )
        })
        .and_then(|t| {
            t.with_column(
                "wind",
                ColumnData::numeric((0..hours).map(|h| Some(2.5 + (h % 5) as f64))),
            )
        })
        .expect("fixture columns share a length")
}
