//! Data models for receipts, extraction results, tasks, and configuration.

pub mod config;
pub mod extraction;
pub mod receipt;
pub mod task;

pub use config::{ExtractionConfig, MatchConfig, ReconcileConfig, VatrecConfig, WorkerConfig};
pub use extraction::ExtractionResult;
pub use receipt::{Receipt, ReceiptUpdate};
pub use task::{ExtractPayload, MatchPayload, Task, TaskKind, TaskStatus};
