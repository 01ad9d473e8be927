//! The upload session as an immutable value.
//!
//! Every transition consumes the current state and returns the next one, so
//! the controller can apply it under a single lock. A `generation` counter,
//! bumped on every selection and reset, tells completions for an old file
//! apart from completions for the current one.

use crate::models::prediction_types::{ExplainResult, PredictResult};
use crate::models::session_types::{LoadingFlags, Operation, OperationFailure};
use crate::models::upload_types::SelectedFile;
use serde::Serialize;

/// Captured when an operation starts; presented again when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub generation: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadSession {
    #[serde(skip)]
    file: Option<SelectedFile>,
    generation: u64,
    predict_result: Option<PredictResult>,
    explain_result: Option<ExplainResult>,
    loading: LoadingFlags,
    error: Option<OperationFailure>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.file.as_ref().and_then(|f| f.preview.as_deref())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn predict_result(&self) -> Option<&PredictResult> {
        self.predict_result.as_ref()
    }

    pub fn explain_result(&self) -> Option<&ExplainResult> {
        self.explain_result.as_ref()
    }

    pub fn loading(&self) -> LoadingFlags {
        self.loading
    }

    pub fn is_loading(&self, op: Operation) -> bool {
        self.loading.get(op)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn last_failure(&self) -> Option<&OperationFailure> {
        self.error.as_ref()
    }

    /// Replace the selection. Results, error and loading flags start over;
    /// anything still in flight belongs to the previous generation.
    pub fn select_file(self, file: SelectedFile) -> Self {
        self.revoke_preview();
        Self {
            file: Some(file),
            generation: self.generation + 1,
            ..Self::default()
        }
    }

    pub fn reset(self) -> Self {
        self.revoke_preview();
        Self {
            generation: self.generation + 1,
            ..Self::default()
        }
    }

    /// Start `op` for the current file. Returns no ticket when there is no
    /// file or `op` is already running for this file.
    pub fn begin(mut self, op: Operation) -> (Self, Option<Ticket>) {
        if self.file.is_none() || self.loading.get(op) {
            return (self, None);
        }
        self.loading.set(op, true);
        self.error = None;
        let ticket = Ticket {
            operation: op,
            generation: self.generation,
        };
        (self, Some(ticket))
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    pub fn complete_predict(mut self, ticket: Ticket, result: PredictResult) -> Self {
        if !self.accepts(&ticket, Operation::Predict) {
            return self;
        }
        self.predict_result = Some(result);
        self.loading.predict = false;
        self
    }

    pub fn complete_explain(mut self, ticket: Ticket, result: ExplainResult) -> Self {
        if !self.accepts(&ticket, Operation::Explain) {
            return self;
        }
        self.explain_result = Some(result);
        self.loading.explain = false;
        self
    }

    /// Record a failure. The previous result of the same operation is kept;
    /// the error slot is last-writer-wins across operations.
    pub fn fail(mut self, ticket: Ticket, message: impl Into<String>) -> Self {
        if !self.is_current(&ticket) {
            log::debug!("discarding stale {} failure", ticket.operation);
            return self;
        }
        self.loading.set(ticket.operation, false);
        self.error = Some(OperationFailure {
            operation: ticket.operation,
            message: message.into(),
        });
        self
    }

    fn accepts(&self, ticket: &Ticket, op: Operation) -> bool {
        if ticket.operation != op {
            log::warn!("{} ticket presented to {} completion", ticket.operation, op);
            return false;
        }
        if !self.is_current(ticket) {
            log::debug!(
                "discarding stale {} result (generation {} != {})",
                op,
                ticket.generation,
                self.generation
            );
            return false;
        }
        true
    }

    fn revoke_preview(&self) {
        if let Some(file) = &self.file {
            if file.preview.is_some() {
                log::debug!("[preview] revoking preview for {}", file.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prediction_types::PredictionItem;
    use std::sync::Arc;

    fn file(name: &str) -> SelectedFile {
        SelectedFile {
            name: name.to_string(),
            bytes: Arc::from(vec![1u8, 2, 3]),
            preview: Some(Arc::from("data:image/jpeg;base64,AA==")),
        }
    }

    fn predict_result(label: &str) -> PredictResult {
        PredictResult {
            filename: Some("x.png".into()),
            predictions: vec![PredictionItem::new(label, 0.9)],
            top_prediction: PredictionItem::new(label, 0.9),
        }
    }

    fn begin(session: UploadSession, op: Operation) -> (UploadSession, Ticket) {
        let (session, ticket) = session.begin(op);
        (session, ticket.expect("ticket"))
    }

    #[test]
    fn starts_empty() {
        let session = UploadSession::new();
        assert!(session.file().is_none());
        assert!(session.predict_result().is_none());
        assert!(session.explain_result().is_none());
        assert_eq!(session.loading(), LoadingFlags::default());
        assert!(session.error().is_none());
    }

    #[test]
    fn begin_without_file_is_refused() {
        let (session, ticket) = UploadSession::new().begin(Operation::Predict);
        assert!(ticket.is_none());
        assert!(!session.is_loading(Operation::Predict));
    }

    #[test]
    fn select_clears_results_and_error() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, t) = begin(session, Operation::Predict);
        let session = session.complete_predict(t, predict_result("Normal"));
        let (session, t) = begin(session, Operation::Explain);
        let session = session.fail(t, "boom");
        assert!(session.predict_result().is_some());
        assert_eq!(session.error(), Some("boom"));

        let session = session.select_file(file("y.png"));
        assert_eq!(session.file().unwrap().name, "y.png");
        assert!(session.preview().is_some());
        assert!(session.predict_result().is_none());
        assert!(session.explain_result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn predict_success_sets_result_and_clears_flag_together() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, t) = begin(session, Operation::Predict);
        assert!(session.is_loading(Operation::Predict));

        let session = session.complete_predict(t, predict_result("Normal"));
        assert!(!session.is_loading(Operation::Predict));
        assert_eq!(session.predict_result(), Some(&predict_result("Normal")));
    }

    #[test]
    fn failure_keeps_previous_result() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, t) = begin(session, Operation::Predict);
        let session = session.complete_predict(t, predict_result("Normal"));

        let (session, t) = begin(session, Operation::Predict);
        let session = session.fail(t, "model unavailable");
        assert_eq!(session.error(), Some("model unavailable"));
        assert!(!session.is_loading(Operation::Predict));
        assert_eq!(session.predict_result(), Some(&predict_result("Normal")));
        assert_eq!(session.last_failure().unwrap().operation, Operation::Predict);
    }

    #[test]
    fn trigger_clears_error() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, t) = begin(session, Operation::Explain);
        let session = session.fail(t, "Explanation failed");
        let (session, _) = begin(session, Operation::Predict);
        assert!(session.error().is_none());
    }

    #[test]
    fn explain_failure_overwrites_error_but_not_predict_result() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, p) = begin(session, Operation::Predict);
        let (session, e) = begin(session, Operation::Explain);
        let session = session.fail(p, "first");
        let session = session.fail(e, "second");

        assert_eq!(session.error(), Some("second"));
        assert_eq!(session.last_failure().unwrap().operation, Operation::Explain);

        let session = UploadSession::new().select_file(file("x.png"));
        let (session, p) = begin(session, Operation::Predict);
        let (session, e) = begin(session, Operation::Explain);
        let session = session.complete_predict(p, predict_result("Normal"));
        let session = session.fail(e, "Explanation failed");
        assert!(session.predict_result().is_some());
        assert_eq!(session.error(), Some("Explanation failed"));
    }

    #[test]
    fn loading_flags_are_independent() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, p) = begin(session, Operation::Predict);
        let (session, e) = begin(session, Operation::Explain);
        assert_eq!(
            session.loading(),
            LoadingFlags {
                predict: true,
                explain: true
            }
        );

        let session = session.complete_explain(e, ExplainResult::default());
        assert!(session.is_loading(Operation::Predict));
        assert!(!session.is_loading(Operation::Explain));

        let session = session.complete_predict(p, predict_result("Normal"));
        assert_eq!(session.loading(), LoadingFlags::default());
    }

    #[test]
    fn stale_completions_are_discarded_after_reselect() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, p) = begin(session, Operation::Predict);
        let (session, e) = begin(session, Operation::Explain);

        let session = session.select_file(file("y.png"));
        let session = session.complete_explain(e, ExplainResult::default());
        let session = session.fail(p, "late failure");

        assert!(session.explain_result().is_none());
        assert!(session.predict_result().is_none());
        assert!(session.error().is_none());
        assert_eq!(session.loading(), LoadingFlags::default());
    }

    #[test]
    fn stale_completions_are_discarded_after_reset() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, p) = begin(session, Operation::Predict);
        let session = session.reset();
        let session = session.complete_predict(p, predict_result("Normal"));

        assert!(session.file().is_none());
        assert!(session.predict_result().is_none());
        assert!(!session.is_loading(Operation::Predict));
    }

    #[test]
    fn reselecting_the_same_file_still_invalidates() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, p) = begin(session, Operation::Predict);
        let session = session.select_file(file("x.png"));
        assert!(!session.is_current(&p));
    }

    #[test]
    fn second_trigger_while_loading_is_ignored() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, first) = begin(session, Operation::Predict);
        let (session, second) = session.begin(Operation::Predict);
        assert!(second.is_none());
        assert!(session.is_loading(Operation::Predict));

        let session = session.complete_predict(first, predict_result("Normal"));
        assert!(!session.is_loading(Operation::Predict));
    }

    #[test]
    fn mismatched_ticket_is_ignored() {
        let session = UploadSession::new().select_file(file("x.png"));
        let (session, e) = begin(session, Operation::Explain);
        let session = session.complete_predict(e, predict_result("Normal"));
        assert!(session.predict_result().is_none());
        assert!(session.is_loading(Operation::Explain));
    }
}
