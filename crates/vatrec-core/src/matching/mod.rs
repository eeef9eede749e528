//! Receipt-invoice matching: associate an inbound invoice document with
//! the pending receipt it corresponds to.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::config::MatchConfig;
use crate::models::receipt::Receipt;

/// Outcome of a match attempt. "No match" is a normal result, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The document corresponds to this receipt.
    Matched { receipt_id: i64 },
    /// No pending receipt qualifies.
    NoMatch,
}

/// Scores inbound invoice documents against pending receipts.
///
/// A candidate is accepted only if its company name, gross amount, and
/// date (when recorded) all appear in the document text. The first
/// qualifying receipt wins; documents are expected to correspond to at
/// most one pending receipt, so there is no ranking beyond first match.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Find the pending receipt the document belongs to, if any.
    ///
    /// Receipts that already have `invoice_received` set are skipped
    /// even if handed in, so re-running a match can never flip state
    /// twice.
    pub fn find_match(&self, document_text: &str, pending: &[Receipt]) -> MatchOutcome {
        let haystack = document_text.to_lowercase();

        for receipt in pending {
            if receipt.invoice_received {
                continue;
            }
            if !self.company_matches(receipt, &haystack) {
                continue;
            }
            if !self.amount_matches(receipt, document_text) {
                continue;
            }
            if !self.date_matches(receipt, document_text) {
                continue;
            }

            debug!(receipt_id = receipt.id, "invoice document matched receipt");
            return MatchOutcome::Matched {
                receipt_id: receipt.id,
            };
        }

        MatchOutcome::NoMatch
    }

    /// The recorded company name, lower-cased, must appear in the
    /// document. Receipts without a recorded name cannot anchor a match.
    fn company_matches(&self, receipt: &Receipt, haystack: &str) -> bool {
        match &receipt.company_name {
            Some(name) if !name.trim().is_empty() => haystack.contains(&name.to_lowercase()),
            _ => false,
        }
    }

    /// The gross amount must appear with either decimal separator.
    fn amount_matches(&self, receipt: &Receipt, text: &str) -> bool {
        let Some(gross) = receipt.gross_amount else {
            return false;
        };
        let with_dot = render_amount(gross);
        let with_comma = with_dot.replace('.', ",");
        text.contains(&with_dot) || text.contains(&with_comma)
    }

    /// If the receipt has a date, the document must carry that date or a
    /// neighbor within the window, in `DD/MM/YYYY` or `YYYY-MM-DD` form.
    fn date_matches(&self, receipt: &Receipt, text: &str) -> bool {
        let Some(date) = receipt.date else {
            return true;
        };

        let window = self.config.date_window_days;
        (-window..=window)
            .filter_map(|offset| shift_date(date, offset))
            .any(|candidate| {
                text.contains(&candidate.format("%d/%m/%Y").to_string())
                    || text.contains(&candidate.format("%Y-%m-%d").to_string())
            })
    }
}

fn render_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn shift_date(date: NaiveDate, offset: i64) -> Option<NaiveDate> {
    if offset >= 0 {
        date.checked_add_days(Days::new(offset as u64))
    } else {
        date.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}
