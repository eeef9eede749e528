//! Result record produced by the extraction pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Structured fiscal fields extracted from one piece of recognized text.
///
/// Created fresh for every extraction call and immutable once returned.
/// Absent fields are omitted from the serialized form, never fabricated.
/// The external field names (`price_ht`, `price_ttc`, `vat_amount`,
/// `vat_rate`, `full_text`) are the wire contract consumed by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Normalized recognized text, retained for audit and debugging.
    pub full_text: String,

    /// Supplier name, usually the first upper-case line of the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// VAT/CIF/NIF identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Receipt date, canonical `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Net amount (HT), before tax.
    #[serde(rename = "price_ht", skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,

    /// Gross amount (TTC), tax included.
    #[serde(rename = "price_ttc", skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<Decimal>,

    /// Tax amount (TVA/IVA).
    #[serde(rename = "vat_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,

    /// Tax rate as an integer percentage of the net amount.
    #[serde(rename = "vat_rate", skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<u32>,

    /// True only if company name, date, and gross amount were all resolved.
    pub is_valid: bool,
}

impl ExtractionResult {
    /// An all-absent result for the given normalized text.
    pub fn empty(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            company_name: None,
            tax_id: None,
            date: None,
            net_amount: None,
            gross_amount: None,
            tax_amount: None,
            tax_rate: None,
            is_valid: false,
        }
    }
}
