// Rates module - EUR/USD conversion rate acquisition

pub mod hnb;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::error::AutotaxError;
use crate::money::div_round2;

pub use hnb::HnbRateSource;

/// Currency pair a rate is quoted for: units of `quote` per one unit of `base`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyPair {
    pub base: &'static str,
    pub quote: &'static str,
}

/// The only pair the filing needs: how many USD one EUR buys
pub const EUR_USD: CurrencyPair = CurrencyPair {
    base: "EUR",
    quote: "USD",
};

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// External source of daily exchange rates.
///
/// Implementations return the rate exactly as published, as a decimal string
/// (commas are accepted as the fractional separator).
pub trait RateSource {
    fn rate_for_date(&self, date: NaiveDate, pair: CurrencyPair) -> Result<String, AutotaxError>;
}

/// A conversion rate fixed for one filing computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRate {
    pub date: NaiveDate,
    pub pair: CurrencyPair,
    pub rate: Decimal,
}

impl ConversionRate {
    /// Build a rate from an operator-supplied value instead of a rate source
    pub fn manual(date: NaiveDate, raw: &str) -> Result<Self, AutotaxError> {
        Ok(Self {
            date,
            pair: EUR_USD,
            rate: parse_rate(raw)?,
        })
    }
}

/// Parse a published rate such as `"1,0854"` into an exact decimal.
pub fn parse_rate(raw: &str) -> Result<Decimal, AutotaxError> {
    let normalized = raw.trim().replace(',', ".");
    let rate = Decimal::from_str_exact(&normalized)
        .map_err(|e| AutotaxError::RateUnavailable(format!("malformed rate '{}': {}", raw, e)))?;

    if rate <= Decimal::ZERO {
        return Err(AutotaxError::RateUnavailable(format!(
            "non-positive rate '{}'",
            raw
        )));
    }
    Ok(rate)
}

/// Resolve the EUR/USD rate that applies on `date`.
pub fn fetch_conversion_rate(
    source: &dyn RateSource,
    date: NaiveDate,
) -> Result<ConversionRate, AutotaxError> {
    info!("Fetching {} conversion rate for {}", EUR_USD, date);
    let raw = source.rate_for_date(date, EUR_USD)?;
    debug!("Rate source returned '{}'", raw);

    Ok(ConversionRate {
        date,
        pair: EUR_USD,
        rate: parse_rate(&raw)?,
    })
}

/// Convert a USD amount to EUR, rounded to cents.
pub fn convert_to_eur(usd: Decimal, rate: &ConversionRate) -> Result<Decimal, AutotaxError> {
    div_round2(usd, rate.rate).ok_or_else(|| {
        AutotaxError::InvalidAmount(format!("cannot convert {} USD at rate {}", usd, rate.rate))
    })
}
