//! Town reference tables
//!
//! Two plain mappings keyed by town name: the JOPPD city code (šifra
//! općine/grada) and the municipal surtax percentage. Every town with a surtax
//! must have a city code; towns without a surtax entry pay no surtax.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::error::AutotaxError;

const BUNDLED_CODES: &str = include_str!("../data/codes.json");
const BUNDLED_SURTAX: &str = include_str!("../data/surtax.json");

const MAX_SUGGESTIONS: usize = 3;

/// Reference data for a single town
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TownInfo {
    pub name: String,
    pub city_code: String,
    pub surtax_percent: Decimal,
}

/// Immutable town → city code / surtax tables
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    towns: BTreeMap<String, TownInfo>,
}

impl ReferenceTables {
    pub fn from_maps(
        codes: BTreeMap<String, String>,
        surtax: BTreeMap<String, Decimal>,
    ) -> Result<Self, AutotaxError> {
        let mut towns = BTreeMap::new();
        for (name, city_code) in codes {
            let code = city_code.trim();
            if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AutotaxError::MissingReferenceData(format!(
                    "city code '{}' for '{}' is not numeric",
                    city_code, name
                )));
            }
            let key = normalize_name(&name);
            let previous = towns.insert(
                key,
                TownInfo {
                    name: name.trim().to_lowercase(),
                    city_code: code.to_string(),
                    surtax_percent: Decimal::ZERO,
                },
            );
            if previous.is_some() {
                return Err(AutotaxError::MissingReferenceData(format!(
                    "town '{}' appears twice in the city code table",
                    name
                )));
            }
        }

        for (name, percent) in surtax {
            if percent < Decimal::ZERO || percent >= Decimal::ONE_HUNDRED {
                return Err(AutotaxError::InvalidRate(format!(
                    "surtax {}% for '{}' is out of range",
                    percent, name
                )));
            }
            let town = towns.get_mut(&normalize_name(&name)).ok_or_else(|| {
                AutotaxError::MissingReferenceData(format!(
                    "town '{}' has a surtax but no city code",
                    name
                ))
            })?;
            town.surtax_percent = percent;
        }

        debug!("Loaded reference data for {} towns", towns.len());
        Ok(Self { towns })
    }

    pub fn from_json(codes_json: &str, surtax_json: &str) -> Result<Self, AutotaxError> {
        let codes: BTreeMap<String, String> = serde_json::from_str(codes_json).map_err(|e| {
            AutotaxError::MissingReferenceData(format!("invalid city code table: {}", e))
        })?;
        let surtax: BTreeMap<String, Decimal> = serde_json::from_str(surtax_json).map_err(|e| {
            AutotaxError::MissingReferenceData(format!("invalid surtax table: {}", e))
        })?;
        Self::from_maps(codes, surtax)
    }

    /// Tables shipped with the crate
    pub fn bundled() -> Result<Self, AutotaxError> {
        Self::from_json(BUNDLED_CODES, BUNDLED_SURTAX)
    }

    /// Load tables from files, falling back to the bundled copy for any path not given
    pub fn load(codes: Option<&Path>, surtax: Option<&Path>) -> Result<Self, AutotaxError> {
        let codes_json = match codes {
            Some(path) => read_table(path)?,
            None => BUNDLED_CODES.to_string(),
        };
        let surtax_json = match surtax {
            Some(path) => read_table(path)?,
            None => BUNDLED_SURTAX.to_string(),
        };
        Self::from_json(&codes_json, &surtax_json)
    }

    /// Find a town, or fail with the closest known names
    pub fn lookup(&self, town: &str) -> Result<&TownInfo, AutotaxError> {
        self.towns
            .get(&normalize_name(town))
            .ok_or_else(|| AutotaxError::UnknownTown {
                town: town.trim().to_string(),
                suggestions: self.suggestions(town),
            })
    }

    /// Known town names closest to `town`, best match first
    pub fn suggestions(&self, town: &str) -> Vec<String> {
        let needle = normalize_name(town);
        if needle.is_empty() {
            return Vec::new();
        }
        let max_distance = (needle.chars().count() / 3).max(2);

        let mut ranked: Vec<(usize, &TownInfo)> = self
            .towns
            .iter()
            .filter_map(|(key, info)| {
                let distance = edit_distance(&needle, key);
                if distance <= max_distance || key.starts_with(&needle) {
                    Some((distance, info))
                } else {
                    None
                }
            })
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        ranked
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, info)| info.name.clone())
            .collect()
    }

    /// Towns whose name contains `query` (all towns when empty)
    pub fn search(&self, query: &str) -> Vec<&TownInfo> {
        let needle = normalize_name(query);
        self.towns
            .iter()
            .filter(|(key, _)| key.contains(&needle))
            .map(|(_, info)| info)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.towns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.towns.is_empty()
    }
}

fn read_table(path: &Path) -> Result<String, AutotaxError> {
    fs::read_to_string(path).map_err(|e| {
        AutotaxError::MissingReferenceData(format!("cannot read {}: {}", path.display(), e))
    })
}

/// Lowercase, strip diacritics and collapse whitespace ("Čakovec " -> "cakovec")
pub(crate) fn normalize_name(input: &str) -> String {
    let lower = input.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    for ch in lower.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        match ch {
            'đ' => out.push_str("dj"),
            '-' => out.push(' '),
            c if c.is_alphanumeric() || c == ' ' => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tables() -> ReferenceTables {
        let codes = BTreeMap::from([
            ("zagreb".to_string(), "01333".to_string()),
            ("split".to_string(), "04090".to_string()),
            ("čakovec".to_string(), "00647".to_string()),
            ("sveta nedelja".to_string(), "04162".to_string()),
        ]);
        let surtax = BTreeMap::from([
            ("zagreb".to_string(), dec!(18)),
            ("split".to_string(), dec!(15)),
            ("čakovec".to_string(), dec!(10)),
        ]);
        ReferenceTables::from_maps(codes, surtax).unwrap()
    }

    #[test]
    fn test_lookup_is_case_and_diacritic_insensitive() {
        let t = tables();
        assert_eq!(t.lookup("Zagreb").unwrap().city_code, "01333");
        assert_eq!(t.lookup("  ZAGREB ").unwrap().surtax_percent, dec!(18));
        assert_eq!(t.lookup("Čakovec").unwrap().city_code, "00647");
        assert_eq!(t.lookup("cakovec").unwrap().name, "čakovec");
        assert_eq!(t.lookup("Sveta  Nedelja").unwrap().city_code, "04162");
    }

    #[test]
    fn test_town_without_surtax_pays_none() {
        let t = tables();
        assert_eq!(t.lookup("sveta nedelja").unwrap().surtax_percent, dec!(0));
    }

    #[test]
    fn test_unknown_town_has_suggestions() {
        let t = tables();
        match t.lookup("zagrb") {
            Err(AutotaxError::UnknownTown { town, suggestions }) => {
                assert_eq!(town, "zagrb");
                assert_eq!(suggestions.first().map(String::as_str), Some("zagreb"));
            }
            other => panic!("expected UnknownTown, got {:?}", other),
        }
        match t.lookup("sveta") {
            Err(AutotaxError::UnknownTown { suggestions, .. }) => {
                assert_eq!(suggestions, vec!["sveta nedelja".to_string()]);
            }
            other => panic!("expected UnknownTown, got {:?}", other),
        }
        match t.lookup("dubrovnik") {
            Err(AutotaxError::UnknownTown { suggestions, .. }) => assert!(suggestions.is_empty()),
            other => panic!("expected UnknownTown, got {:?}", other),
        }
    }

    #[test]
    fn test_surtax_without_code_is_rejected() {
        let codes = BTreeMap::from([("zagreb".to_string(), "01333".to_string())]);
        let surtax = BTreeMap::from([("split".to_string(), dec!(15))]);
        assert!(matches!(
            ReferenceTables::from_maps(codes, surtax),
            Err(AutotaxError::MissingReferenceData(_))
        ));
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        let codes = BTreeMap::from([("zagreb".to_string(), "ZG".to_string())]);
        assert!(matches!(
            ReferenceTables::from_maps(codes, BTreeMap::new()),
            Err(AutotaxError::MissingReferenceData(_))
        ));

        let codes = BTreeMap::from([("zagreb".to_string(), "01333".to_string())]);
        let surtax = BTreeMap::from([("zagreb".to_string(), dec!(100))]);
        assert!(matches!(
            ReferenceTables::from_maps(codes, surtax),
            Err(AutotaxError::InvalidRate(_))
        ));

        assert!(matches!(
            ReferenceTables::from_json("not json", "{}"),
            Err(AutotaxError::MissingReferenceData(_))
        ));
    }

    #[test]
    fn test_bundled_tables_load() {
        let t = ReferenceTables::bundled().unwrap();
        assert!(!t.is_empty());
        assert_eq!(t.lookup("zagreb").unwrap().city_code, "01333");
        assert_eq!(t.lookup("varazdin").unwrap().name, "varaždin");
    }

    #[test]
    fn test_search() {
        let t = tables();
        assert_eq!(t.search("").len(), 4);
        let names: Vec<_> = t.search("ve").iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["čakovec".to_string(), "sveta nedelja".to_string()]);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Čakovec"), "cakovec");
        assert_eq!(normalize_name("  Velika   Gorica "), "velika gorica");
        assert_eq!(normalize_name("Đakovo"), "djakovo");
        assert_eq!(normalize_name("Pula-Pola"), "pula pola");
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("zagreb", "zagreb"), 0);
        assert_eq!(edit_distance("zagrb", "zagreb"), 1);
        assert_eq!(edit_distance("split", "splat"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }
}
