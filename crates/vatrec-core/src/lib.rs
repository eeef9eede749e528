//! Core library for automated VAT recovery.
//!
//! This crate provides:
//! - Field extraction from recognized receipt text (company name, tax id,
//!   date, and the net/gross/tax/rate amounts), tolerant of French,
//!   Spanish, and English vocabulary
//! - Amount reconciliation deriving missing values from fiscal identities
//! - Matching of inbound supplier invoices back to pending receipts
//! - A task pipeline with queue, store, and recognition seams

pub mod error;
pub mod extract;
pub mod matching;
pub mod models;
pub mod pipeline;

pub use error::{QueueError, RecognizeError, Result, StoreError, TaskError, VatrecError};
pub use extract::{normalize, NormalizedText, ReceiptExtractor};
pub use matching::{MatchEngine, MatchOutcome};
pub use models::{
    ExtractionResult, Receipt, ReceiptUpdate, Task, TaskKind, TaskStatus, VatrecConfig,
};
pub use pipeline::{
    InMemoryQueue, InMemoryStore, PlainTextRecognizer, ReceiptStore, TaskQueue, TextRecognizer,
    Worker,
};
