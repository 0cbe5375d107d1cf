//! Publishing and reconciling the externally stored status document.

use std::sync::Arc;

use relay_core::run_state::Run;
use relay_core::status_document::{apply_terminal_states, render_status_document, StatusRowView};
use relay_core::RelayError;

use crate::collaborators::DocumentStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub replaced: usize,
    pub written: bool,
}

/// Handle on the one status document owned by an episode.
#[derive(Clone)]
pub struct StatusDocument {
    store: Arc<dyn DocumentStore>,
    document_id: u64,
}

impl StatusDocument {
    /// Renders the initial table and creates the document with one write.
    pub async fn publish<'a>(
        store: Arc<dyn DocumentStore>,
        thread_id: u64,
        rows: impl IntoIterator<Item = StatusRowView<'a>>,
    ) -> Result<Self, RelayError> {
        let body = render_status_document(rows);
        let document_id = store.create(thread_id, &body).await?;
        tracing::info!(thread_id, document_id, "status document published");
        Ok(Self { store, document_id })
    }

    pub fn document_id(&self) -> u64 {
        self.document_id
    }

    /// Writes terminal outcomes into the live document.
    ///
    /// Fetches the current body, replaces every still-present status marker
    /// of a terminal run, and skips the update when nothing changed. A missing
    /// or blank body aborts this reconcile only.
    pub async fn reconcile(&self, runs: &[Run]) -> Result<ReconcileOutcome, RelayError> {
        let body = self
            .store
            .read(self.document_id)
            .await?
            .ok_or_else(|| RelayError::DocumentPrecondition {
                document_id: self.document_id,
                reason: "document is missing".to_string(),
            })?;
        if body.trim().is_empty() {
            return Err(RelayError::DocumentPrecondition {
                document_id: self.document_id,
                reason: "document body is empty".to_string(),
            });
        }

        let rewrite = apply_terminal_states(&body, runs);
        if rewrite.is_unchanged() || rewrite.body == body {
            return Ok(ReconcileOutcome {
                replaced: 0,
                written: false,
            });
        }
        self.store.update(self.document_id, &rewrite.body).await?;
        tracing::debug!(
            document_id = self.document_id,
            replaced = rewrite.replaced.len(),
            "status document updated"
        );
        Ok(ReconcileOutcome {
            replaced: rewrite.replaced.len(),
            written: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relay_core::run_state::{DistinctId, Run, RunState};
    use relay_core::status_document::StatusRowView;
    use relay_core::RelayError;

    use super::{ReconcileOutcome, StatusDocument};
    use crate::test_support::InMemoryDocumentStore;

    fn runs() -> Vec<Run> {
        vec![
            Run::new(DistinctId::new(3, 0), "do something", RunState::Unresolved),
            Run::new(DistinctId::new(3, 1), "do a pipeline", RunState::Unresolved),
        ]
    }

    #[tokio::test]
    async fn functional_publish_creates_single_document_with_all_rows() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let runs = runs();
        let document =
            StatusDocument::publish(store.clone(), 1, runs.iter().map(StatusRowView::from))
                .await
                .expect("publish");

        assert_eq!(store.create_count(), 1);
        let body = store.body(document.document_id()).expect("body");
        assert!(body.contains("<!--status-3-0-->"));
        assert!(body.contains("<!--result-3-1-->"));
    }

    #[tokio::test]
    async fn integration_reconcile_writes_once_then_becomes_a_no_op() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let mut runs = runs();
        let document =
            StatusDocument::publish(store.clone(), 1, runs.iter().map(StatusRowView::from))
                .await
                .expect("publish");

        let untouched = document.reconcile(&runs).await.expect("reconcile");
        assert_eq!(untouched, ReconcileOutcome::default());
        assert_eq!(store.update_count(), 0);

        runs[1].resolve("https://example.test/pipeline");
        let first = document.reconcile(&runs).await.expect("reconcile");
        assert_eq!(
            first,
            ReconcileOutcome {
                replaced: 1,
                written: true
            }
        );
        let second = document.reconcile(&runs).await.expect("reconcile");
        assert!(!second.written);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn regression_reconcile_preserves_concurrent_external_edits() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let mut runs = runs();
        let document =
            StatusDocument::publish(store.clone(), 1, runs.iter().map(StatusRowView::from))
                .await
                .expect("publish");
        let edited = store
            .body(document.document_id())
            .expect("body")
            .replace("<!--result-3-0-->", "[report](https://example.test/report)");
        store.set_body(document.document_id(), &edited);

        runs[0].fail("launch rejected");
        document.reconcile(&runs).await.expect("reconcile");

        let body = store.body(document.document_id()).expect("body");
        assert!(body.contains("[report](https://example.test/report)"));
        assert!(body.contains("error: launch rejected"));
        assert!(body.contains("<!--status-3-1-->"));
    }

    #[tokio::test]
    async fn regression_reconcile_reports_missing_and_blank_documents() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let runs = runs();
        let document =
            StatusDocument::publish(store.clone(), 1, runs.iter().map(StatusRowView::from))
                .await
                .expect("publish");

        store.set_body(document.document_id(), "   ");
        let blank = document.reconcile(&runs).await.expect_err("blank body");
        assert!(matches!(blank, RelayError::DocumentPrecondition { .. }));

        store.remove(document.document_id());
        let missing = document.reconcile(&runs).await.expect_err("missing body");
        assert!(missing.to_string().contains("document is missing"));
        assert_eq!(store.update_count(), 0);
    }
}
