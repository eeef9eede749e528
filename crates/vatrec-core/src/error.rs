//! Error types for the vatrec-core library.

use thiserror::Error;

/// Main error type for the vatrec library.
#[derive(Error, Debug)]
pub enum VatrecError {
    /// Text recognition (OCR provider) error.
    #[error("recognition error: {0}")]
    Recognize(#[from] RecognizeError),

    /// Task processing error.
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// Queue backend error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Receipt store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the text recognition provider.
#[derive(Error, Debug)]
pub enum RecognizeError {
    /// The provider call failed and may succeed on retry.
    #[error("provider error: {0}")]
    Provider(String),

    /// The input cannot be recognized at all (e.g. not a supported format).
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

impl RecognizeError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

/// Errors surfaced as structured task outcomes by the worker.
///
/// Extraction and reconciliation themselves never fail for bad text;
/// everything here belongs to the pipeline boundary.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task payload is missing required fields. Retrying cannot fix
    /// a malformed payload, so the task fails immediately.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The receipt referenced by the task does not exist.
    #[error("receipt {0} not found")]
    ReceiptNotFound(i64),

    /// The recognition provider kept failing past the retry bound.
    #[error("recognition failed after {attempts} attempt(s): {reason}")]
    Provider { attempts: u32, reason: String },

    /// Receipt store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl TaskError {
    /// Whether the task should be requeued rather than dead-lettered.
    ///
    /// Provider failures are not retryable here: the worker already
    /// retried the provider call inside the task, so a provider error
    /// means the bound was exhausted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Errors from the task queue backend.
#[derive(Error, Debug)]
pub enum QueueError {
    /// No task with the given id is known to the queue.
    #[error("task {0} not found")]
    TaskNotFound(String),

    /// The task is not in the state the operation expects.
    #[error("task {id} is not {expected}")]
    InvalidState { id: String, expected: String },

    /// Backend failure (lock poisoning, connection loss, ...).
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Errors from the receipt store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No receipt with the given id.
    #[error("receipt {0} not found")]
    NotFound(i64),

    /// Backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for the vatrec library.
pub type Result<T> = std::result::Result<T, VatrecError>;
