//! Schema validation and the standardization pipeline.

/// Event reporting in place of global logging.
pub mod observer;
pub mod resample;
pub mod standardize;
/// Required-field and time-axis checks.
pub mod validate;

pub use observer::{NoopObserver, PipelineEvent, PipelineObserver, RecordingObserver, TracingObserver};
pub use standardize::{StandardizeOptions, standardize};
pub use validate::{SchemaRules, validate};
