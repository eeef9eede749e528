//! Text normalization applied before any pattern matching.

/// Recognized text with normalized whitespace and a line-split view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Normalized text, lines joined with `\n`.
    pub text: String,
    /// Non-empty trimmed lines, used by the name and date heuristics.
    pub lines: Vec<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Normalize arbitrary recognized text.
///
/// Trims each line, collapses interior whitespace runs, and drops empty
/// lines. Empty input yields an empty result, which downstream components
/// treat as "nothing extractable", not an error.
pub fn normalize(input: &str) -> NormalizedText {
    let lines: Vec<String> = input
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();

    NormalizedText {
        text: lines.join("\n"),
        lines,
    }
}

/// Standardize the decimal separator of a captured numeric string.
pub fn normalize_decimal(raw: &str) -> String {
    raw.replace(',', ".")
}
