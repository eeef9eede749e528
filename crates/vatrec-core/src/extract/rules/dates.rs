//! Date resolution to a single canonical form.

use chrono::{Months, NaiveDate};
use tracing::warn;

use super::patterns::DATE_FORMATS;

/// Normalizes the date notations seen on receipts to `YYYY-MM-DD` and
/// rejects implausible values.
///
/// `today` is injected rather than read from the clock so that the
/// plausibility window is testable.
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    pub today: NaiveDate,
    /// Reject dates more than this many years before `today`.
    pub max_age_years: u32,
}

impl DateResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            max_age_years: 5,
        }
    }

    /// The first notation whose captured string also parses under its
    /// paired format and passes the plausibility check wins. Implausible
    /// candidates are skipped, so a warranty or expiry date printed on
    /// the receipt cannot hide the real date.
    pub fn resolve(&self, text: &str) -> Option<NaiveDate> {
        for (pattern, format) in DATE_FORMATS.iter() {
            for caps in pattern.captures_iter(text) {
                let raw = &caps[1];
                let Ok(date) = NaiveDate::parse_from_str(raw, format) else {
                    continue;
                };
                if !self.is_plausible(date) {
                    warn!(date = %date, source = raw, "implausible date candidate, skipping");
                    continue;
                }
                return Some(date);
            }
        }
        None
    }

    /// Strictly-future dates and dates older than the age window are
    /// implausible.
    fn is_plausible(&self, date: NaiveDate) -> bool {
        if date > self.today {
            return false;
        }
        let cutoff = self
            .today
            .checked_sub_months(Months::new(self.max_age_years * 12))
            .unwrap_or(NaiveDate::MIN);
        date >= cutoff
    }
}
