use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AutotaxError;
use crate::money::{div_round2, round2};

/// Gross/tax/surtax/net decomposition of one filing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub gross: Decimal,
    pub tax: Decimal,
    pub surtax: Decimal,
    pub net: Decimal,
}

impl TaxBreakdown {
    /// Total amount withheld (tax + surtax)
    pub fn total_levy(&self) -> Decimal {
        self.tax + self.surtax
    }

    /// Difference between the computed net and the net that was asked for.
    ///
    /// Rounding gross, tax and surtax in sequence can move the net by a cent.
    pub fn net_drift(&self, requested_net: Decimal) -> Decimal {
        self.net - requested_net
    }
}

/// Statutory rate schedule in force for a filing year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSchedule {
    /// Capital income tax only (surtax abolished)
    Flat { tax_rate: Decimal },
    /// Capital income tax plus municipal surtax levied on the tax
    WithSurtax {
        tax_rate: Decimal,
        surtax_rate: Decimal,
    },
}

impl RateSchedule {
    pub fn tax_rate(&self) -> Decimal {
        match self {
            RateSchedule::Flat { tax_rate } | RateSchedule::WithSurtax { tax_rate, .. } => {
                *tax_rate
            }
        }
    }

    pub fn surtax_rate(&self) -> Decimal {
        match self {
            RateSchedule::Flat { .. } => Decimal::ZERO,
            RateSchedule::WithSurtax { surtax_rate, .. } => *surtax_rate,
        }
    }

    /// Compute the breakdown for a net amount under this schedule
    pub fn compute(&self, net_amount: Decimal) -> Result<TaxBreakdown, AutotaxError> {
        compute_breakdown(net_amount, self.tax_rate(), self.surtax_rate())
    }
}

/// Derive gross, tax, surtax and net from the net amount received.
///
/// `gross = round2(net / (1 - tax_rate * (1 + surtax_rate)))`, then
/// `tax = round2(gross * tax_rate)`, `surtax = round2(tax * surtax_rate)` and
/// `net = gross - tax - surtax`. Rates are fractions (0.2 for 20 %).
pub fn compute_breakdown(
    net_amount: Decimal,
    tax_rate: Decimal,
    surtax_rate: Decimal,
) -> Result<TaxBreakdown, AutotaxError> {
    if net_amount < Decimal::ZERO {
        return Err(AutotaxError::InvalidAmount(format!(
            "net amount {} is negative",
            net_amount
        )));
    }
    if tax_rate < Decimal::ZERO || surtax_rate < Decimal::ZERO {
        return Err(AutotaxError::InvalidRate(format!(
            "rates must not be negative (tax {}, surtax {})",
            tax_rate, surtax_rate
        )));
    }

    let effective_rate = tax_rate
        .checked_mul(Decimal::ONE + surtax_rate)
        .ok_or_else(|| AutotaxError::InvalidRate("effective rate overflows".to_string()))?;
    if effective_rate >= Decimal::ONE {
        return Err(AutotaxError::InvalidRate(format!(
            "effective rate {} must be below 100%",
            effective_rate
        )));
    }

    let gross = div_round2(net_amount, Decimal::ONE - effective_rate).ok_or_else(|| {
        AutotaxError::InvalidAmount(format!("net amount {} is out of range", net_amount))
    })?;
    let tax = round2(
        gross
            .checked_mul(tax_rate)
            .ok_or_else(|| AutotaxError::InvalidAmount(format!("gross {} is out of range", gross)))?,
    );
    let surtax = round2(
        tax.checked_mul(surtax_rate)
            .ok_or_else(|| AutotaxError::InvalidAmount(format!("tax {} is out of range", tax)))?,
    );
    let net = gross - tax - surtax;

    let breakdown = TaxBreakdown {
        gross,
        tax,
        surtax,
        net,
    };
    debug!(?breakdown, %tax_rate, %surtax_rate, "Computed tax breakdown");

    let drift = breakdown.net_drift(net_amount);
    if !drift.is_zero() {
        warn!(
            "Statutory rounding moved net from {} to {} ({:+})",
            net_amount, net, drift
        );
    }

    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_twenty_percent() {
        let b = compute_breakdown(dec!(1000.00), dec!(0.20), dec!(0)).unwrap();
        assert_eq!(b.gross, dec!(1250.00));
        assert_eq!(b.tax, dec!(250.00));
        assert_eq!(b.surtax, dec!(0.00));
        assert_eq!(b.net, dec!(1000.00));
    }

    #[test]
    fn test_twenty_percent_with_ten_percent_surtax() {
        // 1000 / (1 - 0.2 * 1.1) = 1000 / 0.78 = 1282.0512...
        let b = compute_breakdown(dec!(1000.00), dec!(0.20), dec!(0.10)).unwrap();
        assert_eq!(b.gross, dec!(1282.05));
        assert_eq!(b.tax, dec!(256.41));
        assert_eq!(b.surtax, dec!(25.64));
        assert_eq!(b.net, dec!(1000.00));
        assert_eq!(b.tax + b.surtax + b.net, b.gross);
    }

    #[test]
    fn test_zagreb_surtax() {
        // 18% surtax: 333.33 / 0.764 = 436.2958...
        let b = compute_breakdown(dec!(333.33), dec!(0.20), dec!(0.18)).unwrap();
        assert_eq!(b.gross, dec!(436.30));
        assert_eq!(b.tax, dec!(87.26));
        assert_eq!(b.surtax, dec!(15.71));
        assert_eq!(b.net, dec!(333.33));
    }

    #[test]
    fn test_rounding_order_can_move_net_by_a_cent() {
        // gross 1282.115... -> 1282.12, tax 256.424 -> 256.42, surtax 25.642 -> 25.64
        let b = compute_breakdown(dec!(1000.05), dec!(0.20), dec!(0.10)).unwrap();
        assert_eq!(b.gross, dec!(1282.12));
        assert_eq!(b.tax, dec!(256.42));
        assert_eq!(b.surtax, dec!(25.64));
        assert_eq!(b.net, dec!(1000.06));
        assert_eq!(b.net_drift(dec!(1000.05)), dec!(0.01));
        assert_eq!(b.tax + b.surtax + b.net, b.gross);
    }

    #[test]
    fn test_zero_net_amount() {
        let b = compute_breakdown(dec!(0), dec!(0.20), dec!(0.18)).unwrap();
        assert_eq!(b.gross, dec!(0));
        assert_eq!(b.tax, dec!(0));
        assert_eq!(b.surtax, dec!(0));
        assert_eq!(b.net, dec!(0));
    }

    #[test]
    fn test_zero_tax_rate_is_identity() {
        let b = compute_breakdown(dec!(123.45), dec!(0), dec!(0)).unwrap();
        assert_eq!(b.gross, dec!(123.45));
        assert_eq!(b.total_levy(), dec!(0));
        assert_eq!(b.net, dec!(123.45));
    }

    #[test]
    fn test_effective_rate_at_or_above_one_is_rejected() {
        assert!(matches!(
            compute_breakdown(dec!(100), dec!(1), dec!(0)),
            Err(AutotaxError::InvalidRate(_))
        ));
        // 0.5 * (1 + 1) = 1
        assert!(matches!(
            compute_breakdown(dec!(100), dec!(0.5), dec!(1)),
            Err(AutotaxError::InvalidRate(_))
        ));
        assert!(matches!(
            compute_breakdown(dec!(100), dec!(1.2), dec!(0)),
            Err(AutotaxError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_negative_inputs_are_rejected() {
        assert!(matches!(
            compute_breakdown(dec!(100), dec!(-0.1), dec!(0)),
            Err(AutotaxError::InvalidRate(_))
        ));
        assert!(matches!(
            compute_breakdown(dec!(100), dec!(0.2), dec!(-0.1)),
            Err(AutotaxError::InvalidRate(_))
        ));
        assert!(matches!(
            compute_breakdown(dec!(-100), dec!(0.2), dec!(0)),
            Err(AutotaxError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_schedule_dispatch() {
        let flat = RateSchedule::Flat { tax_rate: dec!(0.2) };
        assert_eq!(flat.surtax_rate(), dec!(0));
        assert_eq!(
            flat.compute(dec!(1000)).unwrap(),
            compute_breakdown(dec!(1000), dec!(0.2), dec!(0)).unwrap()
        );

        let with_surtax = RateSchedule::WithSurtax {
            tax_rate: dec!(0.2),
            surtax_rate: dec!(0.1),
        };
        assert_eq!(with_surtax.tax_rate(), dec!(0.2));
        assert_eq!(with_surtax.compute(dec!(1000)).unwrap().surtax, dec!(25.64));
    }

    #[test]
    fn test_total_levy() {
        let b = compute_breakdown(dec!(1000.00), dec!(0.20), dec!(0.10)).unwrap();
        assert_eq!(b.total_levy(), dec!(282.05));
    }
}
