//! Where user actions meet the session. Failures end up in the session's
//! error slot; nothing propagates past this layer.

use crate::models::session_types::Operation;
use crate::models::upload_types::SelectedFile;
use crate::services::api_client::InferenceApi;
use crate::services::session::{Ticket, UploadSession};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What happened to a triggered operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Result stored in the session.
    Applied,
    /// Failure message stored in the session's error slot.
    Failed,
    /// The selection changed while the request was in flight.
    Discarded,
    /// Not started: no file selected, or already running for this file.
    Skipped,
}

pub struct UploadController<A> {
    api: Arc<A>,
    session: Arc<Mutex<UploadSession>>,
}

impl<A> Clone for UploadController<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            session: self.session.clone(),
        }
    }
}

impl<A: InferenceApi> UploadController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            session: Arc::new(Mutex::new(UploadSession::new())),
        }
    }

    pub async fn snapshot(&self) -> UploadSession {
        self.session.lock().await.clone()
    }

    pub async fn select_file(&self, file: SelectedFile) {
        log::info!("Selected {} ({} bytes)", file.name, file.len());
        self.transition(|s| s.select_file(file)).await;
    }

    pub async fn reset(&self) {
        log::info!("Upload reset");
        self.transition(UploadSession::reset).await;
    }

    pub async fn predict(&self) -> Outcome {
        let Some((ticket, file)) = self.begin(Operation::Predict).await else {
            return Outcome::Skipped;
        };

        match self.api.predict(&file).await {
            Ok(result) => {
                self.finish(ticket, |s| s.complete_predict(ticket, result))
                    .await
            }
            Err(e) => {
                log::warn!("Prediction error for {}: {}", file.name, e);
                self.finish_failed(ticket, e.to_string()).await
            }
        }
    }

    pub async fn explain(&self) -> Outcome {
        let Some((ticket, file)) = self.begin(Operation::Explain).await else {
            return Outcome::Skipped;
        };

        match self.api.explain(&file).await {
            Ok(result) => {
                self.finish(ticket, |s| s.complete_explain(ticket, result))
                    .await
            }
            Err(e) => {
                log::warn!("Explanation error for {}: {}", file.name, e);
                self.finish_failed(ticket, e.to_string()).await
            }
        }
    }

    async fn begin(&self, op: Operation) -> Option<(Ticket, SelectedFile)> {
        let mut guard = self.session.lock().await;
        let (next, ticket) = std::mem::take(&mut *guard).begin(op);
        *guard = next;

        let ticket = match ticket {
            Some(t) => t,
            None => {
                log::debug!("{} not started", op);
                return None;
            }
        };
        let file = guard.file()?.clone();
        log::info!("Starting {} for {}", op, file.name);
        Some((ticket, file))
    }

    async fn finish(
        &self,
        ticket: Ticket,
        apply: impl FnOnce(UploadSession) -> UploadSession,
    ) -> Outcome {
        let mut guard = self.session.lock().await;
        if !guard.is_current(&ticket) {
            return Outcome::Discarded;
        }
        let next = apply(std::mem::take(&mut *guard));
        *guard = next;
        Outcome::Applied
    }

    async fn finish_failed(&self, ticket: Ticket, message: String) -> Outcome {
        match self.finish(ticket, |s| s.fail(ticket, message)).await {
            Outcome::Applied => Outcome::Failed,
            other => other,
        }
    }

    async fn transition(&self, apply: impl FnOnce(UploadSession) -> UploadSession) {
        let mut guard = self.session.lock().await;
        let next = apply(std::mem::take(&mut *guard));
        *guard = next;
    }
}
