//! Pattern bank: ranked, locale-tolerant matchers for receipt fields.
//!
//! Each field has an ordered list of candidate patterns covering French
//! (`TVA`, `HT`, `TTC`), Spanish (`IVA`, `NIF`, `CIF`), and generic English
//! (`VAT`, `Total`) vocabulary. The first pattern that succeeds wins for
//! its field; there is no merging across matchers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Net amount (HT / base imponible / subtotal / net), ranked
    pub static ref NET_AMOUNT: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(?:total\s+)?HT\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)base\s+imponible[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)\bsub\s*-?\s*total\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)\bnet\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
    ];

    // Gross amount (TTC / importe total / total), ranked
    pub static ref GROSS_AMOUNT: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(?:total\s+)?TTC\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)importe\s+total[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)\btotal\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
    ];

    // Tax amount (TVA / IVA / VAT), ranked. The first matcher handles the
    // "IVA 21%: 4,94" shape where the rate sits between label and amount.
    pub static ref TAX_AMOUNT: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(?:TVA|IVA|VAT)\s*\(?\d{1,2}(?:[.,]\d+)?\s*%\)?\s*[:=]?\s*(\d+[.,]\d+)").unwrap(),
        Regex::new(r"(?i)(?:montant\s+)?\bTVA\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)\bIVA\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
        Regex::new(r"(?i)\bVAT\b[\s.:=]*(\d+[.,]?\d*)").unwrap(),
    ];

    // Tax rate as an integer percentage, ranked
    pub static ref TAX_RATE: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(?:TVA|IVA|VAT)\s*\(?\s*(\d{1,2})(?:[.,]\d+)?\s*%").unwrap(),
        Regex::new(r"(?i)(\d{1,2})(?:[.,]\d+)?\s*%\s*(?:TVA|IVA|VAT)").unwrap(),
    ];

    // Tax identifiers: labeled country-prefixed VAT numbers, bare
    // country-prefixed numbers, then labeled 8-10 char national ids
    pub static ref TAX_ID: Vec<Regex> = vec![
        Regex::new(
            r"(?i)(?:TVA\s+intra(?:communautaire)?|n[°o]?\s*TVA|VAT\s*(?:ID|No\.?|Number)|NIF|CIF)\s*[:=]?\s*([A-Z]{2}[0-9A-Z]{8,12})\b"
        ).unwrap(),
        Regex::new(r"\b(FR[0-9A-Z]{2}\d{9}|ES[0-9A-Z]\d{7}[0-9A-Z]|[A-Z]{2}\d{9,11})\b").unwrap(),
        Regex::new(r"(?i)(?:NIF|CIF|SIREN|SIRET)\s*[:=]?\s*([0-9A-Z]{8,10})\b").unwrap(),
    ];

    // Date notations paired with their chrono format, ranked.
    // %y maps 00-68 to the 2000s, everything else to the 1900s.
    pub static ref DATE_FORMATS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\b(\d{2}/\d{2}/\d{4})\b").unwrap(), "%d/%m/%Y"),
        (Regex::new(r"\b(\d{2}-\d{2}-\d{4})\b").unwrap(), "%d-%m-%Y"),
        (Regex::new(r"\b(\d{2}\.\d{2}\.\d{4})\b").unwrap(), "%d.%m.%Y"),
        (Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap(), "%Y-%m-%d"),
        (Regex::new(r"\b(\d{2}/\d{2}/\d{2})\b").unwrap(), "%d/%m/%y"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gross_patterns_are_ranked_ttc_first() {
        // "Total TTC" must resolve through the TTC matcher, not the
        // generic "total" one
        let caps = GROSS_AMOUNT[0].captures("Total TTC : 34.50 EUR").unwrap();
        assert_eq!(&caps[1], "34.50");
    }

    #[test]
    fn tax_rate_requires_a_percent_sign() {
        assert!(TAX_RATE[0].captures("TVA 20%").is_some());
        assert!(TAX_RATE[0].captures("TVA : 5.32").is_none());
    }

    #[test]
    fn tax_id_matches_prefixed_vat_numbers() {
        let caps = TAX_ID[1].captures("SIRET 123, FR40303265045, page 2").unwrap();
        assert_eq!(&caps[1], "FR40303265045");

        let caps = TAX_ID[0].captures("NIF: ESB12345678").unwrap();
        assert_eq!(&caps[1], "ESB12345678");
    }
}
