use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::utils::write_json_file;

pub const PRICE_SUMMARY_FILE: &str = "price_summary.json";
pub const PRICE_FORMATS_FILE: &str = "type_of_price.json";

/// Result of normalizing one raw `price` field.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceOutcome {
    Valid(f64),
    Missing,
    /// Unparseable value whose raw text is worth recording.
    Unknown(String),
}

impl PriceOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            PriceOutcome::Valid(p) => Some(*p),
            _ => None,
        }
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

pub fn parse_price(raw: Option<&Value>) -> PriceOutcome {
    match raw {
        None | Some(Value::Null) => PriceOutcome::Missing,
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|p| p.is_finite())
            .map_or(PriceOutcome::Missing, PriceOutcome::Valid),
        Some(Value::String(s)) => match s.strip_prefix("from ") {
            // "from 12.99" ranges are not tracked as unknown formats; only
            // the text up to a second "from " counts
            Some(rest) => rest
                .split("from ")
                .next()
                .and_then(parse_float)
                .map_or(PriceOutcome::Missing, PriceOutcome::Valid),
            None => parse_float(s).map_or_else(
                || PriceOutcome::Unknown(s.clone()),
                PriceOutcome::Valid,
            ),
        },
        Some(other) => PriceOutcome::Unknown(other.to_string()),
    }
}

/// Running mean of the valid prices of one category.
#[derive(Debug, Clone, Default)]
pub struct PriceStats {
    sum: f64,
    count: usize,
}

impl PriceStats {
    pub fn add(&mut self, price: f64) {
        self.sum += price;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Writes the imputed price into `record` when its price is missing.
/// Returns whether the record was touched.
pub fn impute_price(record: &mut Value, average: f64) -> bool {
    let Some(obj) = record.as_object_mut() else {
        return false;
    };
    let missing = obj.get("price").is_none_or(Value::is_null);
    if missing {
        obj.insert("price".into(), Value::from(average));
    }
    missing
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    #[serde(default)]
    pub categories_with_no_price: Vec<String>,
    #[serde(default)]
    pub category_avg_prices: BTreeMap<String, f64>,
    #[serde(default)]
    pub avg_prices_all_category: f64,
}

impl PriceSummary {
    /// Loads the summary of earlier runs, or an empty one.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed price summary {}", path.display()))
    }

    pub fn record_category(&mut self, category: &str, average: f64) {
        if average == 0.0 && !self.categories_with_no_price.iter().any(|c| c == category) {
            self.categories_with_no_price.push(category.to_owned());
        }
        self.category_avg_prices
            .insert(category.to_owned(), average);
    }

    /// Mean over the categories that have a positive average.
    pub fn finalize(&mut self) {
        let (sum, count) = self
            .category_avg_prices
            .values()
            .filter(|p| **p > 0.0)
            .fold((0.0, 0usize), |(s, c), p| (s + p, c + 1));
        self.avg_prices_all_category = if count == 0 { 0.0 } else { sum / count as f64 };
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, self, 4)
    }
}

/// Raw price strings that could not be parsed, accumulated across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceFormats(BTreeSet<String>);

impl PriceFormats {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let formats: Vec<String> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed price format list {}", path.display()))?;
        Ok(Self(formats.into_iter().collect()))
    }

    pub fn insert(&mut self, raw: String) {
        if !self.0.contains(&raw) {
            debug!("new price format: {raw:?}");
            self.0.insert(raw);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.0.contains(raw)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, &self.0, 4)
    }
}
