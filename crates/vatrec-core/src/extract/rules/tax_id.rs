//! VAT/CIF/NIF identifier extraction.

use super::patterns::TAX_ID;

/// Recognizes country-prefixed VAT numbers and labeled bare national
/// tax ids, in ranked order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxIdExtractor;

impl TaxIdExtractor {
    pub fn extract(&self, text: &str) -> Option<String> {
        for pattern in TAX_ID.iter() {
            if let Some(caps) = pattern.captures(text) {
                return Some(caps[1].to_uppercase());
            }
        }
        None
    }
}
