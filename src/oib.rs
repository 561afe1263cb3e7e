//! OIB (osobni identifikacijski broj) validation
//!
//! The Croatian personal identification number is 11 digits long; the last
//! digit is an ISO 7064 MOD 11-10 check digit over the first ten.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AutotaxError;

const OIB_LENGTH: usize = 11;

/// Compute the MOD 11-10 check digit for the first ten digits of `digits`.
///
/// Returns `None` when fewer than ten leading characters are ASCII digits.
pub fn check_digit(digits: &str) -> Option<u8> {
    let bytes = digits.as_bytes();
    if bytes.len() < OIB_LENGTH - 1 {
        return None;
    }

    let mut acc: u32 = 10;
    for &b in &bytes[..OIB_LENGTH - 1] {
        if !b.is_ascii_digit() {
            return None;
        }
        acc = (acc + u32::from(b - b'0')) % 10;
        if acc == 0 {
            acc = 10;
        }
        acc = (acc * 2) % 11;
    }

    let check = 11 - acc;
    Some(if check == 10 { 0 } else { check as u8 })
}

/// Returns true when `oib` is exactly 11 ASCII digits with a correct check digit.
///
/// Never panics; any malformed input is simply invalid.
pub fn is_valid_oib(oib: &str) -> bool {
    if oib.len() != OIB_LENGTH || !oib.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match check_digit(oib) {
        Some(check) => check == oib.as_bytes()[OIB_LENGTH - 1] - b'0',
        None => false,
    }
}

/// A validated OIB
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Oib(String);

impl Oib {
    pub fn parse(input: &str) -> Result<Self, AutotaxError> {
        let trimmed = input.trim();
        if is_valid_oib(trimmed) {
            Ok(Oib(trimmed.to_string()))
        } else {
            Err(AutotaxError::InvalidOib(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Oib {
    type Err = AutotaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Oib::parse(s)
    }
}

impl fmt::Display for Oib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
