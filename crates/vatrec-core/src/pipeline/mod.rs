//! Task pipeline: queue and store seams, the recognition capability,
//! and the worker that ties them together.

pub mod queue;
pub mod recognize;
pub mod store;
pub mod worker;

pub use queue::{InMemoryQueue, TaskQueue};
pub use recognize::{recognize_with_retry, PlainTextRecognizer, TextRecognizer};
pub use store::{InMemoryStore, ReceiptStore};
pub use worker::Worker;
