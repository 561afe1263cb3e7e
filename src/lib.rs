//! Autotax - Croatian capital income tax for vested stock units
//!
//! This library converts the USD value of vested GSUs to EUR at the HNB
//! middle rate, computes capital income tax and municipal surtax, and
//! assembles the JOPPD XML report.

pub mod config;
pub mod error;
pub mod joppd;
pub mod money;
pub mod oib;
pub mod rates;
pub mod reference;
pub mod tax;
pub mod utils;
