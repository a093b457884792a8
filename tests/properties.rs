//! Property tests over randomly generated microgrid readings.

mod common;

use chrono::TimeDelta;
use microgrid_eda::clean::observer::NoopObserver;
use microgrid_eda::clean::{StandardizeOptions, standardize};
use microgrid_eda::table::{BucketWidth, Table, format_timestamp, normalize_field_name};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// (minutes after start, consumption, solar, wind)
type Reading = (i64, u16, u16, u16);

fn readings() -> impl Strategy<Value = Vec<Reading>> {
    prop::collection::vec((0i64..24 * 60, 0u16..500, 0u16..500, 0u16..500), 1..60)
}

fn table_from(readings: &[Reading]) -> Table {
    let start = common::ts("2023-06-01 00:00:00");
    let stamps: Vec<String> = readings
        .iter()
        .map(|(m, ..)| format_timestamp(&(start + TimeDelta::minutes(*m))))
        .collect();
    let stamps: Vec<&str> = stamps.iter().map(String::as_str).collect();
    let column = |pick: fn(&Reading) -> u16| -> Vec<Option<f64>> {
        readings.iter().map(|r| Some(f64::from(pick(r)))).collect()
    };
    common::raw_microgrid(&stamps, &column(|r| r.1), &column(|r| r.2), &column(|r| r.3))
}

fn run(table: Table, width: BucketWidth) -> Table {
    let options = StandardizeOptions::default().with_bucket_width(width);
    standardize(table, &options, &NoopObserver).expect("generated tables are well formed")
}

fn widths() -> impl Strategy<Value = BucketWidth> {
    prop_oneof![
        Just(BucketWidth::minutes(15)),
        Just(BucketWidth::hours(1)),
        Just(BucketWidth::hours(6)),
    ]
}

proptest! {
    #[test]
    fn output_is_aligned_ascending_and_complete(readings in readings(), width in widths()) {
        let out = run(table_from(&readings), width);

        prop_assert!(!out.is_empty());
        prop_assert!(!out.has_missing());
        prop_assert_eq!(out.field_names(), vec!["consumption", "solar", "wind"]);

        let stamps: Vec<_> = out.time_index().unwrap().values.iter().flatten().copied().collect();
        prop_assert_eq!(stamps.len(), out.len());
        prop_assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        for ts in &stamps {
            let micros = ts.and_utc().timestamp_micros();
            prop_assert_eq!(micros.rem_euclid(width.as_micros()), 0);
        }
    }

    #[test]
    fn standardize_is_idempotent(readings in readings(), width in widths()) {
        let once = run(table_from(&readings), width);
        let twice = run(once.clone(), width);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn row_order_does_not_matter(readings in readings(), seed in any::<u64>()) {
        let mut shuffled = readings.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let width = BucketWidth::hours(1);
        prop_assert_eq!(run(table_from(&readings), width), run(table_from(&shuffled), width));
    }

    #[test]
    fn field_name_normalization_is_idempotent(name in "[ \tA-Za-z0-9_]{0,16}") {
        let once = normalize_field_name(&name);
        prop_assert_eq!(normalize_field_name(&once), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
    }
}
