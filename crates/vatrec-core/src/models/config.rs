//! Configuration structures for the extraction and matching pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the vatrec pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VatrecConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Amount reconciliation configuration.
    pub reconcile: ReconcileConfig,

    /// Invoice matching configuration.
    pub matching: MatchConfig,

    /// Task worker configuration.
    pub worker: WorkerConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many leading lines to scan for the company name.
    pub company_scan_lines: usize,

    /// Minimum length of an upper-case line accepted as company name.
    pub company_min_upper_len: usize,

    /// Minimum length of a fallback (mixed-case) company name line.
    pub company_min_fallback_len: usize,

    /// Reject dates more than this many years before today.
    pub max_date_age_years: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            company_scan_lines: 8,
            company_min_upper_len: 3,
            company_min_fallback_len: 5,
            max_date_age_years: 5,
        }
    }
}

/// Amount reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Standard VAT rates a computed rate may snap to.
    pub standard_rates: Vec<u32>,

    /// Maximum distance (percentage points) for rate snapping.
    pub snap_tolerance: Decimal,

    /// Tolerance for the net + tax == gross balance check, in currency units.
    pub balance_tolerance: Decimal,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            // 21/10/4 (ES), 20/5 (FR/UK reduced), 19 (DE)
            standard_rates: vec![21, 20, 19, 10, 5, 4],
            snap_tolerance: Decimal::new(2, 0),
            balance_tolerance: Decimal::new(1, 1),
        }
    }
}

/// Invoice matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Date proximity window in days (a document dated within this many
    /// days of the receipt date still matches).
    pub date_window_days: i64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { date_window_days: 1 }
    }
}

/// Task worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Queue name the worker consumes.
    pub queue: String,

    /// Delivery attempts before a task is dead-lettered.
    pub max_attempts: u32,

    /// Recognition provider calls per task before giving up.
    pub provider_retries: u32,

    /// Fixed delay between provider retries, in milliseconds.
    pub provider_retry_delay_ms: u64,

    /// Bounded wait on dequeue, in milliseconds.
    pub dequeue_timeout_ms: u64,

    /// Sleep between empty polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue: "default".to_string(),
            max_attempts: 3,
            provider_retries: 3,
            provider_retry_delay_ms: 500,
            dequeue_timeout_ms: 1000,
            poll_interval_ms: 1000,
        }
    }
}

impl VatrecConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
