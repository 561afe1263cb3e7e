//! Error handling for autotax
//!
//! Library operations return the typed [`AutotaxError`]; the binary and the
//! dispatcher wrap it in `anyhow` for context chaining.

use thiserror::Error;

/// Core error types for a filing run
#[derive(Error, Debug)]
pub enum AutotaxError {
    #[error("invalid OIB: {0}")]
    InvalidOib(String),

    #[error("unknown town '{town}'{}", format_suggestions(.suggestions))]
    UnknownTown {
        town: String,
        suggestions: Vec<String>,
    },

    #[error("missing reference data: {0}")]
    MissingReferenceData(String),

    #[error("conversion rate unavailable: {0}")]
    RateUnavailable(String),

    #[error("invalid rate: {0}")]
    InvalidRate(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Result type alias for the CLI layer
pub type Result<T> = anyhow::Result<T>;
