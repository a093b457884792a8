//! Post-hoc summary of one cleaning run.

use std::fmt;

use crate::clean::observer::PipelineEvent;
use crate::table::Table;

/// What happened to a dataset on its way through the pipeline.
///
/// Computed from the observed pipeline events and the cleaned table, so the
/// numbers always agree with what was actually emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    /// Rows in the validated input table.
    pub input_rows: usize,
    /// Rows excluded because their timestamp did not parse.
    pub unparseable_timestamps: usize,
    /// Buckets produced by resampling, including empty ones.
    pub buckets: usize,
    /// Buckets removed for holding a missing value.
    pub dropped_rows: usize,
    /// Rows in the cleaned table.
    pub output_rows: usize,
    /// Field names of the cleaned table.
    pub fields: Vec<String>,
}

impl CleaningReport {
    /// Builds a report from the events of one run and its output table.
    pub fn from_events(events: &[PipelineEvent], output: &Table) -> Self {
        let mut report = Self {
            output_rows: output.len(),
            fields: output.field_names().into_iter().map(str::to_string).collect(),
            ..Self::default()
        };
        for event in events {
            match event {
                PipelineEvent::Validated { rows, .. } => report.input_rows = *rows,
                PipelineEvent::TimestampsParsed { unparseable, .. } => {
                    report.unparseable_timestamps = *unparseable;
                }
                PipelineEvent::Resampled { buckets, .. } => report.buckets = *buckets,
                PipelineEvent::IncompleteRowsDropped { dropped, .. } => {
                    report.dropped_rows = *dropped;
                }
                PipelineEvent::FieldsNormalized { .. } => {}
            }
        }
        report
    }

    /// Share of resampled buckets that survived, in percent.
    pub fn retained_pct(&self) -> f64 {
        if self.buckets == 0 {
            0.0
        } else {
            100.0 * self.output_rows as f64 / self.buckets as f64
        }
    }
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Cleaning Report ---")?;
        writeln!(f, "Input rows:             {}", self.input_rows)?;
        writeln!(f, "Unparseable timestamps: {}", self.unparseable_timestamps)?;
        writeln!(f, "Buckets:                {}", self.buckets)?;
        writeln!(f, "Dropped incomplete:     {}", self.dropped_rows)?;
        writeln!(
            f,
            "Output rows:            {} ({:.1}% retained)",
            self.output_rows,
            self.retained_pct()
        )?;
        write!(f, "Fields:                 {}", self.fields.join(", "))
    }
}
