use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::broadcast::WorkflowProgressBroadcaster;
use crate::document::{Action, DocumentId};

/// What happened in one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// An output was produced and persisted.
    Applied,
    /// Nothing to do: a precondition was missing, the output already
    /// existed or the capability produced nothing.
    Skipped,
    /// The action failed. Nothing was persisted; a later iteration retries.
    Failed,
    /// Terminal status persisted. Always the last event of a run.
    Completed,
    /// No action could be planned. Always the last event of a run.
    Halted,
}

impl ProgressKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressKind::Completed | ProgressKind::Halted)
    }
}

impl fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProgressKind::Applied => "applied",
            ProgressKind::Skipped => "skipped",
            ProgressKind::Failed => "failed",
            ProgressKind::Completed => "completed",
            ProgressKind::Halted => "halted",
        };
        f.write_str(label)
    }
}

/// One iteration of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub document_id: DocumentId,
    /// 1-based iteration number.
    pub step: usize,
    /// Absent when planning itself failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    pub kind: ProgressKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    fn new(
        document_id: DocumentId,
        step: usize,
        action: Option<Action>,
        kind: ProgressKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            document_id,
            step,
            action,
            kind,
            message: message.into(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn applied(
        document_id: DocumentId,
        step: usize,
        action: Action,
        message: impl Into<String>,
    ) -> Self {
        Self::new(document_id, step, Some(action), ProgressKind::Applied, message)
    }

    pub fn skipped(
        document_id: DocumentId,
        step: usize,
        action: Action,
        message: impl Into<String>,
    ) -> Self {
        Self::new(document_id, step, Some(action), ProgressKind::Skipped, message)
    }

    pub fn failed(document_id: DocumentId, step: usize, action: Action, error: String) -> Self {
        let mut event = Self::new(
            document_id,
            step,
            Some(action),
            ProgressKind::Failed,
            format!("Error: {}", error),
        );
        event.error = Some(error);
        event
    }

    pub fn completed(document_id: DocumentId, step: usize) -> Self {
        Self::new(
            document_id,
            step,
            Some(Action::Complete),
            ProgressKind::Completed,
            "Workflow complete",
        )
    }

    pub fn halted(document_id: DocumentId, step: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut event = Self::new(
            document_id,
            step,
            None,
            ProgressKind::Halted,
            "Could not determine next action",
        );
        event.error = Some(reason);
        event
    }
}

/// Observer of workflow events, called before each event is yielded.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// No-op reporter for runs nobody watches.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Forwards events to every subscriber of a broadcast channel.
pub struct BroadcastProgress {
    broadcaster: WorkflowProgressBroadcaster,
}

impl BroadcastProgress {
    pub fn new(broadcaster: WorkflowProgressBroadcaster) -> Self {
        Self { broadcaster }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: &ProgressEvent) {
        self.broadcaster.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_event_carries_error() {
        let event = ProgressEvent::failed(3, 2, Action::Summarize, "timeout".to_string());
        assert_eq!(event.kind, ProgressKind::Failed);
        assert_eq!(event.message, "Error: timeout");
        assert_eq!(event.error.as_deref(), Some("timeout"));
        assert_eq!(event.action, Some(Action::Summarize));
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(ProgressEvent::completed(1, 1).kind.is_terminal());
        assert!(ProgressEvent::halted(1, 1, "not found").kind.is_terminal());
        assert!(!ProgressKind::Applied.is_terminal());
        assert!(!ProgressKind::Failed.is_terminal());
    }

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent::applied(7, 1, Action::ExtractText, "Text extracted");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["documentId"], 7);
        assert_eq!(json["action"], "extract_text");
        assert_eq!(json["kind"], "applied");
        assert!(json.get("error").is_none());

        let back: ProgressEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_broadcast_progress_forwards() {
        let broadcaster = WorkflowProgressBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();
        let reporter = BroadcastProgress::new(broadcaster);

        reporter.report(&ProgressEvent::completed(5, 4));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.document_id, 5);
        assert_eq!(received.kind, ProgressKind::Completed);
    }
}
