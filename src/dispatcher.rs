//! Command dispatcher that routes parsed clap `Commands` to their handlers.

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn};

use autotax::config::AppConfig;
use autotax::error::AutotaxError;
use autotax::joppd::{
    assemble_filing, load_template, write_filing, Address, FilingContext, FilingRequest, Person,
    PlaceholderRenderer,
};
use autotax::money::mul_exact;
use autotax::oib::{check_digit, is_valid_oib, Oib};
use autotax::rates::{convert_to_eur, fetch_conversion_rate, ConversionRate, HnbRateSource};
use autotax::reference::ReferenceTables;
use autotax::tax::derive_period_code;
use autotax::utils::parse_filing_date;

use crate::cli::formatters::{self, FilingSummary, OibReport};
use crate::cli::{Cli, Commands, JoppdArgs};

/// Route a parsed command line to its handler
pub fn dispatch(cli: Cli) -> Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Oib { oib } => dispatch_oib(&oib, json),
        Commands::Code { date } => dispatch_code(&date, json),
        Commands::Rate { date } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            dispatch_rate(&config, &date, json)
        }
        Commands::Towns { query } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            dispatch_towns(&config, query.as_deref(), json)
        }
        Commands::Joppd(args) => {
            let config = AppConfig::load(cli.config.as_deref())?;
            dispatch_joppd(&config, args, json)
        }
    }
}

fn dispatch_oib(input: &str, json: bool) -> Result<()> {
    let oib = input.trim();
    let report = OibReport {
        oib,
        valid: is_valid_oib(oib),
        expected_check_digit: check_digit(oib),
    };

    if json {
        println!("{}", formatters::format_oib_json(&report));
    } else {
        println!("{}", formatters::format_oib_text(&report));
    }

    if report.valid {
        Ok(())
    } else {
        Err(AutotaxError::InvalidOib(oib.to_string()).into())
    }
}

fn dispatch_code(date: &str, json: bool) -> Result<()> {
    let date = parse_filing_date(date).map_err(anyhow::Error::msg)?;
    let code = derive_period_code(date);

    if json {
        println!(
            "{}",
            formatters::format_code_json(&date.format("%Y-%m-%d").to_string(), &code)
        );
    } else {
        println!("{}", code);
    }
    Ok(())
}

fn dispatch_rate(config: &AppConfig, date: &str, json: bool) -> Result<()> {
    let date = parse_filing_date(date).map_err(anyhow::Error::msg)?;
    let source = HnbRateSource::new(config.rates.base_url.clone(), config.rates.timeout())?;
    let rate = fetch_conversion_rate(&source, date)?;

    if json {
        println!("{}", formatters::format_rate_json(&rate));
    } else {
        println!("{}", formatters::format_rate_text(&rate));
    }
    Ok(())
}

fn load_tables(config: &AppConfig) -> Result<ReferenceTables> {
    let tables = ReferenceTables::load(
        config.reference.codes.as_deref(),
        config.reference.surtax.as_deref(),
    )
    .context("Failed to load town reference data")?;
    Ok(tables)
}

fn dispatch_towns(config: &AppConfig, query: Option<&str>, json: bool) -> Result<()> {
    let tables = load_tables(config)?;
    let towns = tables.search(query.unwrap_or(""));

    if json {
        println!("{}", formatters::format_towns_json(&towns));
    } else {
        println!("{}", formatters::format_towns_table(&towns));
    }
    Ok(())
}

fn dispatch_joppd(config: &AppConfig, args: JoppdArgs, json: bool) -> Result<()> {
    // Everything that can be checked locally is checked before touching the network
    let oib = Oib::parse(&args.oib)?;
    let date = parse_filing_date(&args.date).map_err(anyhow::Error::msg)?;
    let gsu_price = parse_price(&args.gsu_price)?;
    if args.gsu_amount == 0 {
        return Err(AutotaxError::InvalidAmount("GSU amount must be positive".to_string()).into());
    }

    let tables = load_tables(config)?;
    let town = tables.lookup(&args.town)?.clone();
    let template = load_template(config.output.template.as_deref())?;

    let rate = match args.rate.as_deref() {
        Some(raw) => {
            let rate = ConversionRate::manual(date, raw)?;
            warn!("Using manual {} rate {} instead of HNB", rate.pair, rate.rate);
            rate
        }
        None => {
            let source =
                HnbRateSource::new(config.rates.base_url.clone(), config.rates.timeout())?;
            fetch_conversion_rate(&source, date)
                .with_context(|| format!("Failed to get the HNB rate for {}", date))?
        }
    };

    let usd_total = gsu_value(gsu_price, args.gsu_amount)?;
    let eur_total = convert_to_eur(usd_total, &rate)?;
    info!("{} USD at {} = {} EUR", usd_total, rate.rate, eur_total);

    let schedule = config.schedule_for(date.year(), town.surtax_percent, args.regime.into());
    let breakdown = schedule.compute(eur_total)?;

    let request = FilingRequest {
        person: Person {
            first_name: args.first_name,
            last_name: args.last_name,
            oib,
            email: args.email,
            address: Address {
                street_name: args.street_name,
                street_number: args.street_number,
                town: args.town,
            },
        },
        date,
        gsu_price,
        gsu_amount: args.gsu_amount,
        usd_total,
        eur_total,
        rate,
        schedule,
        breakdown,
    };

    let filing = assemble_filing(
        &request,
        &tables,
        &template,
        &PlaceholderRenderer,
        &FilingContext::new(),
    )?;

    let written_to: Option<PathBuf> = if args.dry_run {
        info!("Dry run, skipping {}", filing.filename);
        None
    } else {
        let dir = args
            .output_dir
            .unwrap_or_else(|| config.output.directory.clone());
        Some(
            write_filing(&dir, &filing)
                .with_context(|| format!("Failed to write report into {}", dir.display()))?,
        )
    };

    let summary = FilingSummary {
        request: &request,
        town: &town,
        period_code: &filing.period_code,
        net_drift: breakdown.net_drift(eur_total),
        written_to: written_to.as_deref(),
    };

    if json {
        println!("{}", formatters::format_filing_json(&summary));
    } else {
        println!("{}", formatters::format_filing_table(&summary));
    }
    Ok(())
}

/// Price times amount, refused rather than rounded when it does not fit
fn gsu_value(price: Decimal, amount: u32) -> Result<Decimal, AutotaxError> {
    mul_exact(price, Decimal::from(amount)).ok_or_else(|| {
        AutotaxError::InvalidAmount(format!(
            "{} GSU at {} USD cannot be represented exactly",
            amount, price
        ))
    })
}

/// Parse a USD price, accepting a comma as the decimal separator
fn parse_price(raw: &str) -> Result<Decimal, AutotaxError> {
    let price = Decimal::from_str_exact(&raw.trim().replace(',', "."))
        .map_err(|e| AutotaxError::InvalidAmount(format!("invalid GSU price '{}': {}", raw, e)))?;
    if price <= Decimal::ZERO {
        return Err(AutotaxError::InvalidAmount(format!(
            "GSU price must be positive, got {}",
            raw
        )));
    }
    Ok(price)
}
