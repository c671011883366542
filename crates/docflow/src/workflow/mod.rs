//! Workflow executor: runs planned actions until a document is complete.

pub mod config;
pub mod error;
pub mod executor;
pub mod progress;

pub use config::{WorkflowConfig, DEFAULT_MAX_STEPS};
pub use error::StepError;
pub use executor::{WorkflowExecutor, WorkflowOutcome, WorkflowReport, WorkflowRun};
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressKind, ProgressReporter};
