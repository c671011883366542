//! Broadcasting for real-time event streaming.

pub mod workflow_progress;

pub use workflow_progress::WorkflowProgressBroadcaster;
