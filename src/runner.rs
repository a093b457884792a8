//! End-to-end composition: load, validate, standardize, save.

use std::path::Path;

use crate::clean::observer::{PipelineEvent, PipelineObserver, RecordingObserver, Tee};
use crate::clean::{StandardizeOptions, standardize, validate};
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::io;
use crate::report::CleaningReport;
use crate::table::{Table, normalize_field_name};

/// Validates and standardizes an in-memory table.
///
/// When the table has no index and lacks `standardize.time_column`, the
/// validated `schema.time_axis` column is used instead, so a table that
/// passes validation always has a time axis to standardize on.
///
/// # Errors
///
/// * [`Error::Config`] if `config` fails validation.
/// * [`Error::Schema`] if the table is structurally unusable.
pub fn clean(
    table: Table,
    config: &PipelineConfig,
    observer: &dyn PipelineObserver,
) -> Result<(Table, CleaningReport), Error> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(Error::Config(errors));
    }
    let mut options = config.standardize_options()?;

    let recorder = RecordingObserver::new();
    let tee = Tee(observer, &recorder);

    validate(&table, &config.schema_rules())?;
    tee.on_event(&PipelineEvent::Validated {
        fields: table.columns().len(),
        rows: table.len(),
    });

    if !has_field(&table, &options.time_column) {
        options = StandardizeOptions {
            time_column: config.schema.time_axis.clone(),
            ..options
        };
    }

    let cleaned = standardize(table, &options, &tee)?;
    let report = CleaningReport::from_events(&recorder.events(), &cleaned);
    Ok((cleaned, report))
}

fn has_field(table: &Table, name: &str) -> bool {
    let wanted = normalize_field_name(name);
    table
        .field_names()
        .into_iter()
        .any(|field| normalize_field_name(field) == wanted)
}

/// Runs the whole pipeline from `input` to `output`.
///
/// # Errors
///
/// * [`Error::Config`] if `config` fails validation.
/// * [`Error::File`] if loading or saving fails.
/// * [`Error::Schema`] if the loaded table is structurally unusable.
pub fn run(
    config: &PipelineConfig,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    observer: &dyn PipelineObserver,
) -> Result<CleaningReport, Error> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(Error::Config(errors));
    }

    let table = io::load(input, &config.load_options())?;
    let (cleaned, report) = clean(table, config, observer)?;
    io::save(&cleaned, output, &config.save_options())?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::observer::NoopObserver;
    use crate::error::SchemaError;
    use crate::table::ColumnData;

    fn raw_table(time_column: &str) -> Table {
        Table::new()
            .with_column(
                time_column,
                ColumnData::text([Some("2023-01-01 00:15:00"), Some("2023-01-01 00:45:00")]),
            )
            .unwrap()
            .with_column("Consumption", ColumnData::numeric([Some(1.0), Some(3.0)]))
            .unwrap()
            .with_column("Solar", ColumnData::numeric([Some(0.0), Some(0.0)]))
            .unwrap()
            .with_column("Wind", ColumnData::numeric([Some(4.0), Some(2.0)]))
            .unwrap()
    }

    #[test]
    fn clean_reports_each_stage() {
        let (table, report) =
            clean(raw_table("index"), &PipelineConfig::hourly(), &NoopObserver).unwrap();
        assert_eq!(table.numeric_column("consumption").unwrap(), &[Some(2.0)]);
        assert_eq!(report.input_rows, 2);
        assert_eq!(report.buckets, 1);
        assert_eq!(report.output_rows, 1);
    }

    #[test]
    fn default_config_standardizes_validated_index_column() {
        let (table, _) =
            clean(raw_table("Index"), &PipelineConfig::hourly(), &NoopObserver).unwrap();
        assert_eq!(table.time_index().unwrap().name, "index");
        assert_eq!(table.field_names(), vec!["consumption", "solar", "wind"]);
    }

    #[test]
    fn standardize_time_column_is_preferred_when_present() {
        let mut cfg = PipelineConfig::hourly();
        cfg.schema.time_axis = "timestamp".to_string();
        let (table, _) = clean(raw_table("TimeStamp"), &cfg, &NoopObserver).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.numeric_column("wind").unwrap(), &[Some(3.0)]);
    }

    #[test]
    fn clean_fails_fast_on_schema() {
        let mut cfg = PipelineConfig::hourly();
        cfg.schema.required_fields.push("battery".to_string());
        let err = clean(raw_table("index"), &cfg, &NoopObserver).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::MissingFields { ref fields }) if fields == &["battery"]
        ));
    }

    #[test]
    fn clean_rejects_invalid_config() {
        let mut cfg = PipelineConfig::hourly();
        cfg.standardize.bucket = "soon".to_string();
        let err = clean(raw_table("index"), &cfg, &NoopObserver).unwrap_err();
        assert!(matches!(err, Error::Config(ref e) if e.len() == 1));
    }

    #[test]
    fn clean_forwards_events_to_caller() {
        let observer = RecordingObserver::new();
        clean(raw_table("index"), &PipelineConfig::hourly(), &observer).unwrap();
        let events = observer.into_events();
        assert!(matches!(events.first(), Some(PipelineEvent::Validated { rows: 2, .. })));
        assert_eq!(events.len(), 5);
    }
}
