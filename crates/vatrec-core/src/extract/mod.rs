//! Field extraction pipeline: normalize, match patterns, resolve dates,
//! reconcile amounts.

pub mod normalize;
pub mod reconcile;
pub mod rules;

pub use normalize::{normalize, NormalizedText};
pub use reconcile::reconcile;
pub use rules::{Amounts, CompanyExtractor, DateResolver, TaxIdExtractor};

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::models::config::VatrecConfig;
use crate::models::extraction::ExtractionResult;

use rules::extract_amounts;

/// Turns raw recognized text into a structured [`ExtractionResult`].
///
/// The pipeline is linear: normalize, extract each field independently,
/// resolve the date, reconcile amounts, then compute overall validity
/// from required-field presence. It never fails for malformed or empty
/// input; the worst case is an all-absent, `is_valid = false` result,
/// and identical input always yields an identical result.
#[derive(Debug, Clone)]
pub struct ReceiptExtractor {
    company: CompanyExtractor,
    tax_id: TaxIdExtractor,
    dates: DateResolver,
    reconcile: crate::models::config::ReconcileConfig,
}

impl ReceiptExtractor {
    /// Extractor with default configuration and today's date as the
    /// plausibility anchor.
    pub fn new() -> Self {
        Self::with_config(&VatrecConfig::default())
    }

    pub fn with_config(config: &VatrecConfig) -> Self {
        Self {
            company: CompanyExtractor {
                scan_lines: config.extraction.company_scan_lines,
                min_upper_len: config.extraction.company_min_upper_len,
                min_fallback_len: config.extraction.company_min_fallback_len,
            },
            tax_id: TaxIdExtractor,
            dates: DateResolver {
                today: Utc::now().date_naive(),
                max_age_years: config.extraction.max_date_age_years,
            },
            reconcile: config.reconcile.clone(),
        }
    }

    /// Pin the date-plausibility anchor, mainly for tests.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.dates.today = today;
        self
    }

    /// Run the full pipeline over one piece of recognized text.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            debug!("empty recognized text, nothing extractable");
            return ExtractionResult::empty(normalized.text);
        }

        let company_name = self.company.extract(&normalized.lines);
        let tax_id = self.tax_id.extract(&normalized.text);
        let date = self.dates.resolve(&normalized.text);
        let amounts = reconcile(extract_amounts(&normalized.text), &self.reconcile);

        let is_valid = company_name.is_some() && date.is_some() && amounts.gross.is_some();

        debug!(
            company = company_name.as_deref().unwrap_or("-"),
            date = date.map(|d| d.to_string()).unwrap_or_default(),
            is_valid,
            "extraction finished"
        );

        ExtractionResult {
            full_text: normalized.text,
            company_name,
            tax_id,
            date,
            net_amount: amounts.net,
            gross_amount: amounts.gross,
            tax_amount: amounts.tax,
            tax_rate: amounts.rate,
            is_valid,
        }
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}
