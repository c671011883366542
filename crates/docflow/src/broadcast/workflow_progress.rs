//! Workflow progress broadcaster so several observers can follow runs.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::workflow::ProgressEvent;

/// Multi-consumer channel of [`ProgressEvent`]s. Cloning shares the sender.
///
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// workflow.
#[derive(Clone)]
pub struct WorkflowProgressBroadcaster {
    sender: Arc<broadcast::Sender<ProgressEvent>>,
}

impl WorkflowProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: ProgressEvent) {
        // No active receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WorkflowProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
