//! JOPPD filing document assembly
//!
//! Combines the validated person data, the computed breakdown and the town
//! reference data into the field set the JOPPD template expects, renders it
//! and writes `ObrazacJOPPD_{oib}_{ddmmyyyy}_{code}_8.xml`.

pub mod template;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AutotaxError;
use crate::oib::Oib;
use crate::rates::ConversionRate;
use crate::reference::{ReferenceTables, TownInfo};
use crate::tax::{derive_period_code, RateSchedule, TaxBreakdown};
pub use template::{load_template, PlaceholderRenderer, TemplateFields, TemplateRenderer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Postal address of the person filing
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub street_name: String,
    pub street_number: u32,
    pub town: String,
}

/// Person filing the report (also the income recipient)
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub oib: Oib,
    pub email: String,
    pub address: Address,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", title_case(&self.first_name), title_case(&self.last_name))
    }
}

/// Everything needed to produce one JOPPD document
#[derive(Debug, Clone, Serialize)]
pub struct FilingRequest {
    pub person: Person,
    pub date: NaiveDate,
    pub gsu_price: Decimal,
    pub gsu_amount: u32,
    pub usd_total: Decimal,
    pub eur_total: Decimal,
    pub rate: ConversionRate,
    pub schedule: RateSchedule,
    pub breakdown: TaxBreakdown,
}

/// Per-document identity: a fresh id and the generation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilingContext {
    pub document_id: Uuid,
    pub generated_at: NaiveDateTime,
}

impl FilingContext {
    pub fn new() -> Self {
        Self {
            document_id: Uuid::new_v4(),
            generated_at: Local::now().naive_local(),
        }
    }
}

impl Default for FilingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A rendered document and the file name it belongs under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFiling {
    pub filename: String,
    pub period_code: String,
    pub content: String,
}

/// `ObrazacJOPPD_{oib}_{dd}{mm}{yyyy}_{period_code}_8.xml`
pub fn filing_filename(oib: &Oib, date: NaiveDate, period_code: &str) -> String {
    format!(
        "ObrazacJOPPD_{}_{}_{}_8.xml",
        oib,
        date.format("%d%m%Y"),
        period_code
    )
}

/// Template field set for a filing
pub fn filing_fields(
    request: &FilingRequest,
    town: &TownInfo,
    period_code: &str,
    context: &FilingContext,
) -> TemplateFields {
    let person = &request.person;
    let breakdown = &request.breakdown;
    let (year_first_day, year_last_day) = year_bounds(request.date.year());

    let mut fields = TemplateFields::new();
    fields.insert("first_name", title_case(&person.first_name));
    fields.insert("last_name", title_case(&person.last_name));
    fields.insert("email", person.email.trim().to_string());
    fields.insert("oib", person.oib.to_string());
    fields.insert("street_name", title_case(&person.address.street_name));
    fields.insert("street_number", person.address.street_number.to_string());
    fields.insert("town", title_case(&town.name));
    fields.insert("city_code", town.city_code.clone());
    fields.insert("date_string", request.date.format("%Y-%m-%d").to_string());
    fields.insert("joppd_code", period_code.to_string());
    fields.insert("now", context.generated_at.format(TIMESTAMP_FORMAT).to_string());
    fields.insert("document_id", context.document_id.to_string());
    fields.insert("year_first_day", year_first_day.format(TIMESTAMP_FORMAT).to_string());
    fields.insert("year_last_day", year_last_day.format(TIMESTAMP_FORMAT).to_string());
    fields.insert("bruto", xml_amount(breakdown.gross));
    fields.insert("tax", xml_amount(breakdown.tax));
    fields.insert("surtax", xml_amount(breakdown.surtax));
    fields.insert("tax_total", xml_amount(breakdown.total_levy()));
    fields.insert("neto", xml_amount(breakdown.net));
    fields
}

/// Resolve reference data and render the document. Writes nothing.
pub fn assemble_filing(
    request: &FilingRequest,
    tables: &ReferenceTables,
    template: &str,
    renderer: &dyn TemplateRenderer,
    context: &FilingContext,
) -> Result<AssembledFiling, AutotaxError> {
    let town = tables.lookup(&request.person.address.town)?;
    let period_code = derive_period_code(request.date);
    let fields = filing_fields(request, town, &period_code, context);
    debug!("Rendering JOPPD {} with {} fields", period_code, fields.len());

    let content = renderer.render(template, &fields)?;
    Ok(AssembledFiling {
        filename: filing_filename(&request.person.oib, request.date, &period_code),
        period_code,
        content,
    })
}

/// Write the document into `dir`, replacing any previous file of the same name
pub fn write_filing(dir: &Path, filing: &AssembledFiling) -> Result<PathBuf, AutotaxError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&filing.filename);
    let tmp_path = dir.join(format!("{}.tmp", filing.filename));

    if let Err(e) = fs::write(&tmp_path, filing.content.as_bytes())
        .and_then(|_| fs::rename(&tmp_path, &path))
    {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!("Wrote JOPPD to {}", path.display());
    Ok(path)
}

/// Assemble and write in one step
pub fn generate_filing(
    request: &FilingRequest,
    tables: &ReferenceTables,
    template: &str,
    renderer: &dyn TemplateRenderer,
    dir: &Path,
) -> Result<PathBuf, AutotaxError> {
    let filing = assemble_filing(request, tables, template, renderer, &FilingContext::new())?;
    write_filing(dir, &filing)
}

fn year_bounds(year: i32) -> (NaiveDateTime, NaiveDateTime) {
    let first = NaiveDate::from_yo_opt(year, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let last = NaiveDate::from_ymd_opt(year, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or_default();
    (first, last)
}

fn xml_amount(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// "velika gorica" -> "Velika Gorica"
pub(crate) fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
