//! Amount reconciliation: derive missing values, snap rates, and check
//! arithmetic consistency.

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::config::ReconcileConfig;

use super::rules::Amounts;

/// Fill in whichever of {net, tax, gross, rate} are missing from the ones
/// present, using fixed fiscal identities, and resolve inconsistency.
///
/// Inconsistency is a signal, not a fatal error: this never fails, it
/// logs and applies the documented precedence (gross wins).
pub fn reconcile(mut amounts: Amounts, config: &ReconcileConfig) -> Amounts {
    derive_missing(&mut amounts);

    // net + rate, tax absent
    if amounts.tax.is_none() {
        if let (Some(net), Some(rate)) = (amounts.net, amounts.rate) {
            let tax = net * Decimal::from(rate) / Decimal::ONE_HUNDRED;
            amounts.tax = Some(tax.round_dp(2));
        }
    }

    // a derived tax may in turn determine the gross
    derive_missing(&mut amounts);

    if amounts.rate.is_none() {
        amounts.rate = snap_rate(&amounts, config);
    }

    validate_balance(&mut amounts, config);
    amounts
}

/// Apply the three-way identities when exactly one of {net, tax, gross}
/// is missing. If fewer than two are present nothing can be derived.
fn derive_missing(amounts: &mut Amounts) {
    match (amounts.net, amounts.tax, amounts.gross) {
        (Some(net), Some(tax), None) => amounts.gross = Some((net + tax).round_dp(2)),
        (Some(net), None, Some(gross)) => amounts.tax = Some((gross - net).round_dp(2)),
        (None, Some(tax), Some(gross)) => amounts.net = Some((gross - tax).round_dp(2)),
        _ => {}
    }
}

/// Compute a candidate rate from net and tax, rounded to the nearest
/// whole percent, then snap it to the nearest standard rate only if it
/// lands within the snap tolerance. A candidate nowhere near a standard
/// rate stays absent rather than guessed.
fn snap_rate(amounts: &Amounts, config: &ReconcileConfig) -> Option<u32> {
    let (net, tax) = (amounts.net?, amounts.tax?);
    if net.is_zero() {
        return None;
    }

    let candidate = (tax / net * Decimal::ONE_HUNDRED).round();
    let nearest = config
        .standard_rates
        .iter()
        .copied()
        .min_by_key(|rate| (candidate - Decimal::from(*rate)).abs())?;

    let distance = (candidate - Decimal::from(nearest)).abs();
    if distance <= config.snap_tolerance {
        Some(nearest)
    } else {
        warn!(%candidate, nearest, "computed rate too far from any standard rate, leaving absent");
        None
    }
}

/// When all three of net, tax, gross are present, `net + tax` must equal
/// `gross` within tolerance. On mismatch, gross is ground truth and net
/// is recomputed.
fn validate_balance(amounts: &mut Amounts, config: &ReconcileConfig) {
    if let (Some(net), Some(tax), Some(gross)) = (amounts.net, amounts.tax, amounts.gross) {
        let drift = (net + tax - gross).abs();
        if drift > config.balance_tolerance {
            warn!(%net, %tax, %gross, %drift, "amounts do not balance, preferring gross");
            amounts.net = Some((gross - tax).round_dp(2));
        }
    }
}
