//! Exact monetary rounding
//!
//! All amounts are `Decimal`. Products that fit in 96 bits are exact; inputs
//! that could overflow go through [`mul_exact`], which refuses to round
//! instead of dropping digits. Quotients usually do not terminate; those
//! go through [`div_round2`], which rounds the exact rational quotient using
//! integer arithmetic on the mantissas instead of a 28-digit approximation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half away from zero to two decimal places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute `round2(numerator / denominator)` exactly.
///
/// Returns `None` for a zero denominator or when the scaled mantissas do not
/// fit in 128 bits.
pub fn div_round2(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    let numerator = numerator.normalize();
    let denominator = denominator.normalize();

    // n / 10^sn  ÷  d / 10^sd  × 100  =  n · 10^(sd+2)  ÷  d · 10^sn
    let p = numerator
        .mantissa()
        .checked_mul(pow10(denominator.scale() + 2)?)?;
    let q = denominator.mantissa().checked_mul(pow10(numerator.scale())?)?;

    let (p, q) = if q < 0 { (p.checked_neg()?, -q) } else { (p, q) };
    let mut cents = p / q;
    let remainder = (p % q).abs();
    if remainder.checked_mul(2)? >= q {
        cents += p.signum();
    }

    Decimal::try_from_i128_with_scale(cents, 2).ok()
}

/// Exact product of two decimals, or `None` when it cannot be represented
/// without dropping digits.
pub fn mul_exact(a: Decimal, b: Decimal) -> Option<Decimal> {
    let mut mantissa = a.mantissa().checked_mul(b.mantissa())?;
    let mut scale = a.scale() + b.scale();
    loop {
        if let Ok(product) = Decimal::try_from_i128_with_scale(mantissa, scale) {
            return Some(product);
        }
        // Trailing zeros can be shed without losing anything
        if scale == 0 || mantissa % 10 != 0 {
            return None;
        }
        mantissa /= 10;
        scale -= 1;
    }
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// Convert a whole-number percentage ("18") into a fraction (0.18).
pub fn percent(value: Decimal) -> Decimal {
    value / Decimal::ONE_HUNDRED
}
