//! Messages from workers to the session loop

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ai::{AnalysisResult, ClientError};
use crate::refactor::RenamePlan;

/// Result of one background request
#[derive(Debug)]
pub enum SessionEvent {
    RenamePlanned {
        request_id: Uuid,
        result: Result<RenamePlan, ClientError>,
    },
    AnalysisReady {
        request_id: Uuid,
        result: Result<AnalysisResult, ClientError>,
    },
}

impl SessionEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            Self::RenamePlanned { request_id, .. } | Self::AnalysisReady { request_id, .. } => {
                *request_id
            }
        }
    }
}

/// Owns the event channel; workers get clones of the sender
#[derive(Debug)]
pub struct EventHandler {
    sender: mpsc::UnboundedSender<SessionEvent>,
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.sender.clone()
    }

    /// Wait for the next event
    ///
    /// The handler keeps a sender alive, so this only returns `None` if the
    /// channel was closed explicitly.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
