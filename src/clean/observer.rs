//! Progress and warning reporting for the cleaning pipeline.
//!
//! The pipeline never logs on its own. Callers pass a [`PipelineObserver`]
//! and decide where events go: nowhere, to `tracing`, or into a buffer.

use std::cell::RefCell;

/// Something noteworthy that happened during validation or standardization.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Schema validation passed.
    Validated { fields: usize, rows: usize },
    /// Field names were trimmed and lowercased.
    FieldsNormalized { renamed: Vec<(String, String)> },
    /// The time axis was parsed; `unparseable` rows are excluded from bucketing.
    TimestampsParsed { parsed: usize, unparseable: usize },
    /// Rows were aggregated into `buckets` contiguous buckets.
    Resampled { input_rows: usize, buckets: usize },
    /// Buckets holding any missing value were removed.
    IncompleteRowsDropped { dropped: usize, remaining: usize },
}

impl PipelineEvent {
    /// Whether the event indicates degraded input.
    pub fn is_warning(&self) -> bool {
        match self {
            Self::TimestampsParsed { unparseable, .. } => *unparseable > 0,
            Self::IncompleteRowsDropped { dropped, .. } => *dropped > 0,
            _ => false,
        }
    }
}

/// Receiver for pipeline events.
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`: warnings at `WARN`, the rest at `INFO`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Validated { fields, rows } => {
                tracing::info!(fields, rows, "schema validated");
            }
            PipelineEvent::FieldsNormalized { renamed } => {
                for (from, to) in renamed {
                    tracing::debug!(from = %from, to = %to, "renamed field");
                }
                tracing::info!(renamed = renamed.len(), "normalized field names");
            }
            PipelineEvent::TimestampsParsed { parsed, unparseable } if *unparseable > 0 => {
                tracing::warn!(parsed, unparseable, "some timestamps could not be parsed");
            }
            PipelineEvent::TimestampsParsed { parsed, .. } => {
                tracing::info!(parsed, "parsed timestamps");
            }
            PipelineEvent::Resampled {
                input_rows,
                buckets,
            } => {
                tracing::info!(input_rows, buckets, "resampled to fixed-width buckets");
            }
            PipelineEvent::IncompleteRowsDropped { dropped, remaining } if *dropped > 0 => {
                tracing::warn!(dropped, remaining, "dropped incomplete rows");
            }
            PipelineEvent::IncompleteRowsDropped { remaining, .. } => {
                tracing::info!(remaining, "no incomplete rows");
            }
        }
    }
}

/// Keeps every event in order. Handy in tests and for building reports.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.borrow().clone()
    }

    pub fn into_events(self) -> Vec<PipelineEvent> {
        self.events.into_inner()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Fans one event out to two observers.
pub(crate) struct Tee<'a>(pub &'a dyn PipelineObserver, pub &'a dyn PipelineObserver);

impl PipelineObserver for Tee<'_> {
    fn on_event(&self, event: &PipelineEvent) {
        self.0.on_event(event);
        self.1.on_event(event);
    }
}
