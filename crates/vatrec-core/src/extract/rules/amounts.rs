//! Monetary field extraction with locale-tolerant decimal parsing.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::extract::normalize::normalize_decimal;

use super::patterns::{GROSS_AMOUNT, NET_AMOUNT, TAX_AMOUNT, TAX_RATE};

/// The four numeric fields of a receipt, before and after reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Amounts {
    /// Net amount (HT).
    pub net: Option<Decimal>,
    /// Tax amount (TVA/IVA).
    pub tax: Option<Decimal>,
    /// Gross amount (TTC).
    pub gross: Option<Decimal>,
    /// Tax rate, integer percentage.
    pub rate: Option<u32>,
}

/// Extract whichever numeric fields the text yields. Absence is normal
/// for partial receipts, not an error.
pub fn extract_amounts(text: &str) -> Amounts {
    Amounts {
        net: first_amount(text, &NET_AMOUNT),
        tax: first_amount(text, &TAX_AMOUNT),
        gross: first_amount(text, &GROSS_AMOUNT),
        rate: first_rate(text),
    }
}

/// Try each ranked pattern in order; the first capture that parses as a
/// decimal wins. Captures immediately followed by a percent sign are
/// rates, not amounts, and are skipped.
fn first_amount(text: &str, patterns: &[Regex]) -> Option<Decimal> {
    for pattern in patterns {
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            if followed_by_percent(text, m.end()) {
                continue;
            }
            if let Some(value) = parse_amount(m.as_str()) {
                return Some(value);
            }
        }
    }
    None
}

fn first_rate(text: &str) -> Option<u32> {
    for pattern in TAX_RATE.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(rate) = caps[1].parse::<u32>() {
                return Some(rate);
            }
        }
    }
    None
}

/// Parse a captured numeric string: comma becomes dot, then `Decimal`
/// rounded to 2 places.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&normalize_decimal(raw))
        .ok()
        .map(|d| d.round_dp(2))
}

fn followed_by_percent(text: &str, end: usize) -> bool {
    text[end..].trim_start().starts_with('%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn french_receipt_amounts() {
        let amounts =
            extract_amounts("HT : 23.13 EUR\nTVA : 5.32 EUR\nTTC : 28.45 EUR");
        assert_eq!(amounts.net, Some(dec("23.13")));
        assert_eq!(amounts.tax, Some(dec("5.32")));
        assert_eq!(amounts.gross, Some(dec("28.45")));
        assert_eq!(amounts.rate, None);
    }

    #[test]
    fn comma_decimals_are_normalized() {
        let amounts = extract_amounts("Importe total: 28,45\nIVA 21%: 4,94");
        assert_eq!(amounts.gross, Some(dec("28.45")));
        assert_eq!(amounts.tax, Some(dec("4.94")));
        assert_eq!(amounts.rate, Some(21));
    }

    #[test]
    fn rate_figures_are_not_taken_as_tax_amounts() {
        // "TVA 20%" must feed the rate, not the tax amount
        let amounts = extract_amounts("TVA 20%\nTotal TTC : 12.00");
        assert_eq!(amounts.tax, None);
        assert_eq!(amounts.rate, Some(20));
        assert_eq!(amounts.gross, Some(dec("12.00")));
    }

    #[test]
    fn rate_and_amount_on_the_same_document() {
        let amounts = extract_amounts("TVA 20%\nTVA : 5.32\nTTC : 28.45");
        assert_eq!(amounts.tax, Some(dec("5.32")));
        assert_eq!(amounts.rate, Some(20));
    }

    #[test]
    fn partial_receipt_leaves_other_fields_absent() {
        let amounts = extract_amounts("Total TTC : 34.50 EUR");
        assert_eq!(amounts.gross, Some(dec("34.50")));
        assert_eq!(amounts.net, None);
        assert_eq!(amounts.tax, None);
        assert_eq!(amounts.rate, None);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(extract_amounts(""), Amounts::default());
    }

    #[test]
    fn amounts_are_rounded_to_two_places() {
        assert_eq!(parse_amount("28,4567"), Some(dec("28.46")));
        assert_eq!(parse_amount("12"), Some(dec("12")));
        assert_eq!(parse_amount("not a number"), None);
    }
}
