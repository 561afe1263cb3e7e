use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::AutotaxError;

/// JOPPD template shipped with the crate
pub const BUNDLED_TEMPLATE: &str = include_str!("../../templates/joppd.xml");

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Named values handed to a template
pub type TemplateFields = BTreeMap<&'static str, String>;

/// Renders a template source with a flat set of named values
pub trait TemplateRenderer {
    fn render(&self, template: &str, fields: &TemplateFields) -> Result<String, AutotaxError>;
}

/// `{{ name }}` substitution with XML escaping of every value.
///
/// A placeholder without a value is an error; nothing is rendered partially.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, fields: &TemplateFields) -> Result<String, AutotaxError> {
        let mut missing: Vec<&str> = PLACEHOLDER
            .captures_iter(template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .filter(|name| !fields.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(AutotaxError::MissingReferenceData(format!(
                "template fields without a value: {}",
                missing.join(", ")
            )));
        }

        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            fields
                .get(&caps[1])
                .map(|value| escape(value.as_str()).into_owned())
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}

/// Read a user template, or use the bundled one
pub fn load_template(path: Option<&Path>) -> Result<String, AutotaxError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            AutotaxError::MissingReferenceData(format!(
                "cannot read template {}: {}",
                path.display(),
                e
            ))
        }),
        None => Ok(BUNDLED_TEMPLATE.to_string()),
    }
}
