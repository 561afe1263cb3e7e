//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of computing a filing from presenting it.

use autotax::joppd::FilingRequest;
use autotax::rates::ConversionRate;
use autotax::reference::TownInfo;
use autotax::utils::{format_eur, format_percent, format_usd};
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Result of checking an OIB
#[derive(Debug, Serialize)]
pub struct OibReport<'a> {
    pub oib: &'a str,
    pub valid: bool,
    pub expected_check_digit: Option<u8>,
}

pub fn format_oib_json(report: &OibReport) -> String {
    to_json(report)
}

pub fn format_oib_text(report: &OibReport) -> String {
    let check = report
        .expected_check_digit
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    if report.valid {
        format!("{} {} is a valid OIB", "✓".green().bold(), report.oib)
    } else {
        format!(
            "{} {} is not a valid OIB (expected check digit: {})",
            "✗".red().bold(),
            report.oib,
            check
        )
    }
}

pub fn format_code_json(date: &str, code: &str) -> String {
    #[derive(Serialize)]
    struct JsonCode<'a> {
        date: &'a str,
        code: &'a str,
    }
    to_json(&JsonCode { date, code })
}

pub fn format_rate_json(rate: &ConversionRate) -> String {
    to_json(rate)
}

pub fn format_rate_text(rate: &ConversionRate) -> String {
    format!(
        "{} HNB middle rate on {}: 1 {} = {} {}",
        "💱".cyan(),
        rate.date.format("%d.%m.%Y."),
        rate.pair.base,
        rate.rate.to_string().bold(),
        rate.pair.quote
    )
}

pub fn format_towns_json(towns: &[&TownInfo]) -> String {
    to_json(&towns)
}

pub fn format_towns_table(towns: &[&TownInfo]) -> String {
    if towns.is_empty() {
        return format!("{} No matching towns", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct TownRow {
        #[tabled(rename = "Town")]
        name: String,
        #[tabled(rename = "City code")]
        city_code: String,
        #[tabled(rename = "Surtax")]
        surtax: String,
    }

    let rows: Vec<TownRow> = towns
        .iter()
        .map(|t| TownRow {
            name: t.name.clone(),
            city_code: t.city_code.clone(),
            surtax: format!("{}%", t.surtax_percent.normalize()),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    table.to_string()
}

/// Everything shown after computing a filing
#[derive(Debug, Serialize)]
pub struct FilingSummary<'a> {
    #[serde(flatten)]
    pub request: &'a FilingRequest,
    pub town: &'a TownInfo,
    pub period_code: &'a str,
    pub net_drift: Decimal,
    pub written_to: Option<&'a Path>,
}

pub fn format_filing_json(summary: &FilingSummary) -> String {
    to_json(summary)
}

pub fn format_filing_table(summary: &FilingSummary) -> String {
    let request = summary.request;
    let breakdown = &request.breakdown;
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} JOPPD {} for {} ({})\n",
        "🧾".cyan().bold(),
        summary.period_code,
        request.person.full_name(),
        request.person.oib
    ));
    output.push_str(&format!(
        "{:<20} {} (city code {})\n",
        "Town:".bold(),
        summary.town.name,
        summary.town.city_code
    ));
    output.push_str(&format!(
        "{:<20} {}\n\n",
        "Vesting date:".bold(),
        request.date.format("%d.%m.%Y.")
    ));

    #[derive(Tabled)]
    struct AmountRow {
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let rows = vec![
        AmountRow {
            item: format!("{} GSU × {}", request.gsu_amount, format_usd(request.gsu_price)),
            amount: format_usd(request.usd_total),
        },
        AmountRow {
            item: format!("Converted at {} ({})", request.rate.rate, request.rate.date),
            amount: format_eur(request.eur_total),
        },
        AmountRow {
            item: "Gross (bruto)".to_string(),
            amount: format_eur(breakdown.gross),
        },
        AmountRow {
            item: format!("Tax {}", format_percent(request.schedule.tax_rate())),
            amount: format_eur(breakdown.tax),
        },
        AmountRow {
            item: format!(
                "Surtax {} ({})",
                format_percent(request.schedule.surtax_rate()),
                summary.town.name
            ),
            amount: format_eur(breakdown.surtax),
        },
        AmountRow {
            item: "Net (neto)".to_string(),
            amount: format_eur(breakdown.net),
        },
    ];

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!(
        "\n\n{:<20} {}",
        "To pay:".bold(),
        format_eur(breakdown.total_levy()).yellow().bold()
    ));

    if !summary.net_drift.is_zero() {
        output.push_str(&format!(
            "\n{} Net differs from the converted amount by {}",
            "⚠".yellow().bold(),
            format_eur(summary.net_drift)
        ));
    }

    match summary.written_to {
        Some(path) => output.push_str(&format!(
            "\n{} Report written to {}\n",
            "✓".green().bold(),
            path.display()
        )),
        None => output.push_str(&format!(
            "\n{} Dry run - no report written\n",
            "ℹ".blue().bold()
        )),
    }

    output
}
