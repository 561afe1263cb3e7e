use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::{CurrencyPair, RateSource};
use crate::error::AutotaxError;

pub const HNB_BASE_URL: &str = "https://api.hnb.hr/tecajn-eur/v3";

/// One row of the HNB exchange-rate list
#[derive(Debug, Deserialize)]
struct HnbRate {
    #[serde(rename = "datum_primjene")]
    application_date: Option<String>,
    #[serde(rename = "valuta")]
    currency: Option<String>,
    #[serde(rename = "srednji_tecaj")]
    middle_rate: Option<String>,
}

/// Croatian National Bank (HNB) exchange-rate API
pub struct HnbRateSource {
    client: Client,
    base_url: String,
}

impl HnbRateSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AutotaxError> {
        let client = Client::builder()
            .user_agent(concat!("autotax/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AutotaxError::RateUnavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn request_url(&self, date: NaiveDate, currency: &str) -> String {
        format!(
            "{}?datum-primjene={}&valuta={}",
            self.base_url.trim_end_matches('/'),
            date.format("%Y-%m-%d"),
            currency
        )
    }
}

impl RateSource for HnbRateSource {
    fn rate_for_date(&self, date: NaiveDate, pair: CurrencyPair) -> Result<String, AutotaxError> {
        // HNB lists every currency against EUR; anything else is out of scope
        if pair.base != "EUR" {
            return Err(AutotaxError::RateUnavailable(format!(
                "HNB only publishes EUR-based rates, not {}",
                pair
            )));
        }

        let url = self.request_url(date, pair.quote);
        info!("Fetching {} middle rate from HNB for {}", pair.quote, date);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AutotaxError::RateUnavailable(format!("failed to reach HNB: {}", e)))?
            .error_for_status()
            .map_err(|e| AutotaxError::RateUnavailable(format!("HNB returned error status: {}", e)))?;

        let rows: Vec<HnbRate> = response
            .json()
            .map_err(|e| AutotaxError::RateUnavailable(format!("failed to parse HNB response: {}", e)))?;

        middle_rate_from_rows(rows, date, pair)
    }
}

fn middle_rate_from_rows(
    rows: Vec<HnbRate>,
    date: NaiveDate,
    pair: CurrencyPair,
) -> Result<String, AutotaxError> {
    let row = rows.into_iter().next().ok_or_else(|| {
        AutotaxError::RateUnavailable(format!("HNB returned no {} rate for {}", pair.quote, date))
    })?;

    if let Some(currency) = row.currency.as_deref() {
        if !currency.eq_ignore_ascii_case(pair.quote) {
            return Err(AutotaxError::RateUnavailable(format!(
                "HNB returned a {} rate, expected {}",
                currency, pair.quote
            )));
        }
    }

    let expected = date.format("%Y-%m-%d").to_string();
    if let Some(applied) = row.application_date.as_deref() {
        if applied != expected {
            warn!("HNB rate applies to {}, requested {}", applied, expected);
        }
    }

    row.middle_rate.ok_or_else(|| {
        AutotaxError::RateUnavailable(format!("HNB response for {} has no middle rate", date))
    })
}
