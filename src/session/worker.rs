//! Background requests against the model server

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::event::SessionEvent;
use crate::refactor::{RefactoringService, RenameRequest};

/// Cheap-to-clone handle that runs requests on the tokio runtime
///
/// Each spawned request posts exactly one [`SessionEvent`] carrying the id
/// returned by the spawn call.
#[derive(Clone)]
pub struct Worker {
    service: RefactoringService,
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl Worker {
    pub fn new(service: RefactoringService, sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { service, sender }
    }

    /// Plan a rename from a request built on the model-owning side
    pub fn spawn_plan(&self, request: RenameRequest) -> Uuid {
        let request_id = Uuid::new_v4();
        let service = self.service.clone();
        let sender = self.sender.clone();

        tokio::spawn(async move {
            debug!("Planning rename {} for {}", request_id, request.current_name);
            let result = service.plan(&request).await;
            if sender
                .send(SessionEvent::RenamePlanned { request_id, result })
                .is_err()
            {
                warn!("Session closed before rename {} finished", request_id);
            }
        });

        request_id
    }

    /// Analyze decompiled module text
    pub fn spawn_analysis(&self, source: String) -> Uuid {
        let request_id = Uuid::new_v4();
        let service = self.service.clone();
        let sender = self.sender.clone();

        tokio::spawn(async move {
            debug!("Analyzing module {} ({} bytes)", request_id, source.len());
            let result = service.analyze_module(&source).await;
            if sender
                .send(SessionEvent::AnalysisReady { request_id, result })
                .is_err()
            {
                warn!("Session closed before analysis {} finished", request_id);
            }
        });

        request_id
    }
}
