//! Company name heuristic over the leading lines of a receipt.

/// Extracts the supplier name from the first few lines of normalized text.
///
/// A fully upper-case line longer than `min_upper_len` wins immediately.
/// Otherwise the first sufficiently long line without digits is kept as a
/// fallback, but an upper-case line found later still overrides it.
#[derive(Debug, Clone)]
pub struct CompanyExtractor {
    pub scan_lines: usize,
    pub min_upper_len: usize,
    pub min_fallback_len: usize,
}

impl Default for CompanyExtractor {
    fn default() -> Self {
        Self {
            scan_lines: 8,
            min_upper_len: 3,
            min_fallback_len: 5,
        }
    }
}

impl CompanyExtractor {
    pub fn extract(&self, lines: &[String]) -> Option<String> {
        let mut fallback = None;

        for line in lines.iter().take(self.scan_lines) {
            if line.chars().count() > self.min_upper_len && is_upper_line(line) {
                return Some(line.clone());
            }
            if fallback.is_none()
                && line.chars().count() > self.min_fallback_len
                && looks_like_name(line)
            {
                fallback = Some(line.clone());
            }
        }

        fallback
    }
}

/// At least one letter, none of them lower-case.
fn is_upper_line(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic()) && !line.chars().any(|c| c.is_lowercase())
}

/// Fallback candidates must not carry digits; amount and date lines are
/// long enough to pass the length check but are never company names.
fn looks_like_name(line: &str) -> bool {
    !line.chars().any(|c| c.is_ascii_digit())
}
