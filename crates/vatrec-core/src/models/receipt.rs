//! Receipt model, owned by the persistence collaborator.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::extraction::ExtractionResult;

/// An expense record awaiting a supplier invoice.
///
/// The persistence collaborator owns the schema; this core only reads
/// receipts and applies [`ReceiptUpdate`]s through the store seam.
/// `invoice_received` transitions false to true exactly once, via the
/// store's atomic claim, and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt identity.
    pub id: i64,

    /// Owning client.
    pub client_id: String,

    /// Owning user.
    pub user_id: i64,

    /// Reference to the uploaded receipt file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Recipient address used for the original invoice request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent_to: Option<String>,

    /// Supplier name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// VAT/CIF/NIF identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Receipt date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Net amount (HT).
    #[serde(rename = "price_ht", skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,

    /// Gross amount (TTC).
    #[serde(rename = "price_ttc", skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<Decimal>,

    /// Tax amount (TVA/IVA).
    #[serde(rename = "vat_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,

    /// Tax rate as an integer percentage.
    #[serde(rename = "vat_rate", skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<u32>,

    /// An invoice request email was sent for this receipt.
    #[serde(default)]
    pub email_sent: bool,

    /// A matching supplier invoice was later found.
    #[serde(default)]
    pub invoice_received: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    /// A bare receipt with the given identity and no fiscal data yet.
    pub fn new(id: i64, client_id: impl Into<String>, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            client_id: client_id.into(),
            user_id,
            file_path: None,
            email_sent_to: None,
            company_name: None,
            tax_id: None,
            date: None,
            net_amount: None,
            gross_amount: None,
            tax_amount: None,
            tax_rate: None,
            email_sent: false,
            invoice_received: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update in place, touching `updated_at`.
    ///
    /// Only fields present in the update are written; `None` means
    /// "leave as is", never "clear".
    pub fn apply(&mut self, update: &ReceiptUpdate) {
        if let Some(name) = &update.company_name {
            self.company_name = Some(name.clone());
        }
        if let Some(tax_id) = &update.tax_id {
            self.tax_id = Some(tax_id.clone());
        }
        if let Some(date) = update.date {
            self.date = Some(date);
        }
        if let Some(net) = update.net_amount {
            self.net_amount = Some(net);
        }
        if let Some(gross) = update.gross_amount {
            self.gross_amount = Some(gross);
        }
        if let Some(tax) = update.tax_amount {
            self.tax_amount = Some(tax);
        }
        if let Some(rate) = update.tax_rate {
            self.tax_rate = Some(rate);
        }
        if let Some(sent) = update.email_sent {
            self.email_sent = sent;
        }
        self.updated_at = Utc::now();
    }
}

/// Fiscal field changes the worker persists onto a receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "price_ht", skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,
    #[serde(rename = "price_ttc", skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<Decimal>,
    #[serde(rename = "vat_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,
    #[serde(rename = "vat_rate", skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
}

impl From<&ExtractionResult> for ReceiptUpdate {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            company_name: result.company_name.clone(),
            tax_id: result.tax_id.clone(),
            date: result.date,
            net_amount: result.net_amount,
            gross_amount: result.gross_amount,
            tax_amount: result.tax_amount,
            tax_rate: result.tax_rate,
            email_sent: None,
        }
    }
}
