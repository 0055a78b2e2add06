//! Typed board events, broadcast to whoever subscribed.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::sequence::Degradation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    BoardCreated {
        board_id: String,
        cid: String,
        signature: String,
    },
    FeedbackSubmitted {
        board_id: String,
        feedback_id: String,
        cid: String,
        signature: String,
    },
    VoteRecorded {
        board_id: String,
        feedback_id: String,
        cid: String,
        signature: String,
    },
    SequenceDegraded {
        board_id: String,
        degraded: Vec<Degradation>,
    },
}

/// Cloneable handle over a broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BoardEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: BoardEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
