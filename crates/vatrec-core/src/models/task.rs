//! Work items consumed from the task queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TaskError;

/// Discriminator for the two kinds of work the pipeline dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Run field extraction for a receipt.
    Extract,
    /// Match an inbound invoice document against pending receipts.
    Match,
}

/// Task lifecycle: pending -> processing -> {completed | failed},
/// with failed tasks requeued to pending a bounded number of times
/// before they are dead-lettered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A queued work item.
///
/// The payload stays untyped until dispatch; a payload that does not
/// deserialize into the shape its kind requires is a malformed task
/// and fails without retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task id, assigned by the queue on enqueue.
    pub id: String,

    /// What to do with the payload.
    #[serde(rename = "type")]
    pub kind: TaskKind,

    /// Kind-specific payload.
    pub payload: Value,

    /// Current lifecycle state.
    pub status: TaskStatus,

    /// Delivery attempts so far (incremented on each dequeue).
    #[serde(default)]
    pub attempts: u32,

    /// Last failure reason, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Result recorded on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Deserialize the payload into the shape the task kind expects.
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, TaskError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| TaskError::MalformedPayload(e.to_string()))
    }
}

/// Payload of an [`TaskKind::Extract`] task.
///
/// `text` carries pre-recognized text when the producer already has it;
/// otherwise the worker recognizes the receipt's file through the
/// provider seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPayload {
    pub receipt_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Payload of a [`TaskKind::Match`] task: the recognized text of an
/// inbound invoice document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPayload {
    pub text: String,
}
