//! Task worker: dequeues work items and dispatches them to the
//! extraction orchestrator or the match engine.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{QueueError, TaskError};
use crate::extract::{normalize, ReceiptExtractor};
use crate::matching::{MatchEngine, MatchOutcome};
use crate::models::config::WorkerConfig;
use crate::models::receipt::ReceiptUpdate;
use crate::models::task::{ExtractPayload, MatchPayload, Task, TaskKind};

use super::queue::TaskQueue;
use super::recognize::{recognize_with_retry, TextRecognizer};
use super::store::ReceiptStore;

/// Pulls tasks from the queue, runs extraction or matching, persists the
/// results, and acknowledges, requeues, or dead-letters the task.
///
/// Both task kinds are re-entrant safe: extraction is a pure function of
/// its input text, and matching goes through the store's atomic claim,
/// so at-least-once delivery cannot double-apply either.
pub struct Worker<Q, S, R> {
    queue: Q,
    store: S,
    recognizer: R,
    extractor: ReceiptExtractor,
    engine: MatchEngine,
    config: WorkerConfig,
}

impl<Q, S, R> Worker<Q, S, R>
where
    Q: TaskQueue,
    S: ReceiptStore,
    R: TextRecognizer,
{
    pub fn new(
        queue: Q,
        store: S,
        recognizer: R,
        extractor: ReceiptExtractor,
        engine: MatchEngine,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            store,
            recognizer,
            extractor,
            engine,
            config,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dequeue and process at most one task.
    ///
    /// Returns `Ok(false)` when the queue stayed empty for the bounded
    /// wait; only queue-level failures surface as errors. Task-level
    /// failures become structured task outcomes, never bubbled errors.
    pub fn poll_once(&self) -> Result<bool, QueueError> {
        let timeout = Duration::from_millis(self.config.dequeue_timeout_ms);
        let Some(task) = self.queue.dequeue(&self.config.queue, timeout)? else {
            return Ok(false);
        };

        info!(task_id = %task.id, kind = ?task.kind, attempt = task.attempts, "processing task");

        match self.process(&task) {
            Ok(result) => self.queue.complete(&self.config.queue, &task.id, result)?,
            Err(err) if err.is_retryable() && task.attempts < self.config.max_attempts => {
                warn!(task_id = %task.id, error = %err, "task failed, requeueing");
                self.queue.requeue(&self.config.queue, &task.id)?;
            }
            Err(err) => {
                self.queue
                    .fail(&self.config.queue, &task.id, &err.to_string())?;
            }
        }
        Ok(true)
    }

    fn process(&self, task: &Task) -> Result<Value, TaskError> {
        match task.kind {
            TaskKind::Extract => self.process_extract(task.parse_payload()?),
            TaskKind::Match => self.process_match(task.parse_payload()?),
        }
    }

    /// Resolve the text (payload or recognizer over the receipt's file),
    /// run extraction, and persist the fields.
    fn process_extract(&self, payload: ExtractPayload) -> Result<Value, TaskError> {
        let receipt = self
            .store
            .get_receipt(payload.receipt_id)?
            .ok_or(TaskError::ReceiptNotFound(payload.receipt_id))?;

        let text = match payload.text {
            Some(text) => text,
            None => {
                let path = receipt.file_path.as_ref().ok_or_else(|| {
                    TaskError::MalformedPayload(format!(
                        "extract task for receipt {} has neither text nor file",
                        receipt.id
                    ))
                })?;
                let bytes = std::fs::read(path).map_err(|e| TaskError::Provider {
                    attempts: 0,
                    reason: format!("cannot read {}: {e}", path.display()),
                })?;
                recognize_with_retry(
                    &self.recognizer,
                    &bytes,
                    self.config.provider_retries,
                    Duration::from_millis(self.config.provider_retry_delay_ms),
                )
                .map_err(|e| TaskError::Provider {
                    attempts: self.config.provider_retries,
                    reason: e.to_string(),
                })?
            }
        };

        let result = self.extractor.extract(&text);
        self.store
            .update_receipt(receipt.id, &ReceiptUpdate::from(&result))?;

        info!(receipt_id = receipt.id, is_valid = result.is_valid, "receipt fields persisted");
        serde_json::to_value(&result).map_err(|e| TaskError::MalformedPayload(e.to_string()))
    }

    /// Match the document against pending receipts and claim the winner.
    fn process_match(&self, payload: MatchPayload) -> Result<Value, TaskError> {
        let document = normalize(&payload.text);
        let pending = self.store.get_pending_receipts()?;

        match self.engine.find_match(&document.text, &pending) {
            MatchOutcome::Matched { receipt_id } => {
                if self.store.claim_invoice_received(receipt_id)? {
                    info!(receipt_id, "invoice matched and claimed");
                    Ok(json!({ "matched": receipt_id }))
                } else {
                    // another worker claimed it between read and write
                    warn!(receipt_id, "lost claim race, reporting no match");
                    Ok(json!({ "matched": null }))
                }
            }
            MatchOutcome::NoMatch => Ok(json!({ "matched": null })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognizeError;
    use crate::models::config::MatchConfig;
    use crate::models::receipt::Receipt;
    use crate::models::task::TaskStatus;
    use crate::pipeline::queue::InMemoryQueue;
    use crate::pipeline::recognize::PlainTextRecognizer;
    use crate::pipeline::store::InMemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;

    const UBER_TEXT: &str =
        "UBER FRANCE SAS\n20/03/2025\nHT : 23.13 EUR\nTVA : 5.32 EUR\nTTC : 28.45 EUR";

    fn extractor() -> ReceiptExtractor {
        ReceiptExtractor::new().with_today(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    fn worker(
        store: Arc<InMemoryStore>,
    ) -> Worker<Arc<InMemoryQueue>, Arc<InMemoryStore>, PlainTextRecognizer> {
        Worker::new(
            Arc::new(InMemoryQueue::new()),
            store,
            PlainTextRecognizer,
            extractor(),
            MatchEngine::new(MatchConfig::default()),
            WorkerConfig {
                dequeue_timeout_ms: 0,
                provider_retry_delay_ms: 0,
                ..Default::default()
            },
        )
    }

    fn pending_receipt(id: i64) -> Receipt {
        let mut r = Receipt::new(id, "acme", 1);
        r.company_name = Some("UBER FRANCE SAS".to_string());
        r.gross_amount = Some(Decimal::from_str("28.45").unwrap());
        r.date = NaiveDate::from_ymd_opt(2025, 3, 20);
        r
    }

    #[test]
    fn extract_task_persists_fields() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(Receipt::new(1, "acme", 1)).unwrap();
        let worker = worker(store.clone());

        let id = worker
            .queue()
            .enqueue(
                "default",
                TaskKind::Extract,
                json!({"receipt_id": 1, "text": UBER_TEXT}),
            )
            .unwrap();

        assert!(worker.poll_once().unwrap());

        let task = worker.queue().task(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_ref().unwrap()["price_ttc"], "28.45");

        let receipt = store.get_receipt(1).unwrap().unwrap();
        assert_eq!(receipt.company_name.as_deref(), Some("UBER FRANCE SAS"));
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2025, 3, 20));
        assert_eq!(
            receipt.gross_amount,
            Some(Decimal::from_str("28.45").unwrap())
        );
    }

    #[test]
    fn malformed_extract_payload_fails_without_retry() {
        let store = Arc::new(InMemoryStore::new());
        let worker = worker(store);

        let id = worker
            .queue()
            .enqueue("default", TaskKind::Extract, json!({"text": "no id"}))
            .unwrap();

        assert!(worker.poll_once().unwrap());

        let task = worker.queue().task(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.attempts, 1);
        assert!(task.error.unwrap().contains("malformed payload"));
    }

    #[test]
    fn provider_failure_dead_letters_after_retries() {
        struct DownProvider;
        impl TextRecognizer for DownProvider {
            fn recognize(&self, _bytes: &[u8]) -> Result<String, RecognizeError> {
                Err(RecognizeError::Provider("503".to_string()))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ticket_1.pdf");
        std::fs::write(&file, b"binary").unwrap();

        let store = Arc::new(InMemoryStore::new());
        let mut receipt = Receipt::new(1, "acme", 1);
        receipt.file_path = Some(file);
        store.insert(receipt).unwrap();

        let worker = Worker::new(
            Arc::new(InMemoryQueue::new()),
            store,
            DownProvider,
            extractor(),
            MatchEngine::default(),
            WorkerConfig {
                dequeue_timeout_ms: 0,
                provider_retry_delay_ms: 0,
                ..Default::default()
            },
        );

        let id = worker
            .queue()
            .enqueue("default", TaskKind::Extract, json!({"receipt_id": 1}))
            .unwrap();
        assert!(worker.poll_once().unwrap());

        let task = worker.queue().task(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("recognition failed"));
        assert_eq!(worker.queue().dead_letters().unwrap().len(), 1);
    }

    #[test]
    fn match_task_claims_the_receipt() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(pending_receipt(1)).unwrap();
        let worker = worker(store.clone());

        let doc = "Facture Uber France SAS\nTotal : 28,45 EUR\n20/03/2025";
        let id = worker
            .queue()
            .enqueue("default", TaskKind::Match, json!({"text": doc}))
            .unwrap();
        assert!(worker.poll_once().unwrap());

        let task = worker.queue().task(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"matched": 1})));
        assert!(store.get_receipt(1).unwrap().unwrap().invoice_received);
    }

    #[test]
    fn second_match_on_same_receipt_is_no_match() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(pending_receipt(1)).unwrap();
        let worker = worker(store.clone());

        let doc = "Uber France SAS 28.45 20/03/2025";
        for _ in 0..2 {
            worker
                .queue()
                .enqueue("default", TaskKind::Match, json!({"text": doc}))
                .unwrap();
        }

        assert!(worker.poll_once().unwrap());
        assert!(worker.poll_once().unwrap());

        // exactly one match; the second run saw an empty pending set
        let receipt = store.get_receipt(1).unwrap().unwrap();
        assert!(receipt.invoice_received);

        let dead = worker.queue().dead_letters().unwrap();
        assert!(dead.is_empty());
    }

    #[test]
    fn unmatched_document_completes_with_no_match() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(pending_receipt(1)).unwrap();
        let worker = worker(store);

        let id = worker
            .queue()
            .enqueue("default", TaskKind::Match, json!({"text": "unrelated invoice"}))
            .unwrap();
        assert!(worker.poll_once().unwrap());

        let task = worker.queue().task(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"matched": null})));
    }

    #[test]
    fn empty_queue_polls_to_false() {
        let store = Arc::new(InMemoryStore::new());
        let worker = worker(store);
        assert!(!worker.poll_once().unwrap());
    }
}
