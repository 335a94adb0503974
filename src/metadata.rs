use ahash::AHashSet;
use anyhow::{Context, Result, anyhow};
use indicatif::ProgressBar;
use log::info;
use num_format::{Locale, ToFormattedString};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;

use crate::layout::CategoryLayout;
use crate::price::{
    PRICE_FORMATS_FILE, PRICE_SUMMARY_FILE, PriceFormats, PriceOutcome, PriceStats, PriceSummary,
    impute_price, parse_price,
};
use crate::review::{ReviewReport, filter_reviews};
use crate::train::TrainSplit;
use crate::utils::{is_truthy, open_jsonl, spinner_style, write_json_file};

const PARSE_BATCH: usize = 16 * 1024;

/// Users and items seen so far in one run, across categories.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    users: BTreeSet<String>,
    items: BTreeSet<String>,
}

impl IdRegistry {
    pub fn extend(
        &mut self,
        users: impl IntoIterator<Item = String>,
        items: impl IntoIterator<Item = String>,
    ) {
        self.users.extend(users);
        self.items.extend(items);
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn save(&self, users_path: &Path, items_path: &Path) -> Result<()> {
        write_json_file(users_path, &self.users, 0)?;
        write_json_file(items_path, &self.items, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryReport {
    pub meta_read: usize,
    pub meta_kept: usize,
    pub filtered: usize,
    pub imputed: usize,
    pub average_price: f64,
    pub reviews: Option<ReviewReport>,
}

/// Product metadata kept for one category, prices already normalized.
struct KeptMetadata {
    meta: Vec<Value>,
    filtered: Vec<Value>,
    prices: PriceStats,
    read: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataProcessor {
    with_reviews: bool,
}

impl MetadataProcessor {
    pub fn new(with_reviews: bool) -> Self {
        Self { with_reviews }
    }

    /// Runs every category, loading and updating the price files that live
    /// directly in `output_dir`.
    pub fn process_all(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        categories: &[String],
    ) -> Result<IdRegistry> {
        let summary_path = output_dir.join(PRICE_SUMMARY_FILE);
        let formats_path = output_dir.join(PRICE_FORMATS_FILE);
        let mut summary = PriceSummary::load_or_default(&summary_path)?;
        let mut formats = PriceFormats::load_or_default(&formats_path)?;
        let mut registry = IdRegistry::default();

        for category in categories {
            let layout = CategoryLayout::new(input_dir, output_dir, category.as_str());
            self.process_category(&layout, &mut registry, &mut summary, &mut formats)?;
        }

        summary.finalize();
        summary.save(&summary_path)?;
        formats.save(&formats_path)?;

        info!(
            "Saved {} unique user IDs.",
            registry.user_count().to_formatted_string(&Locale::en)
        );
        info!(
            "Saved {} unique item IDs.",
            registry.item_count().to_formatted_string(&Locale::en)
        );
        info!("Price summary saved to {}", summary_path.display());
        info!("Type of price values saved to {}", formats_path.display());
        Ok(registry)
    }

    pub fn process_category(
        &self,
        layout: &CategoryLayout,
        registry: &mut IdRegistry,
        summary: &mut PriceSummary,
        formats: &mut PriceFormats,
    ) -> Result<CategoryReport> {
        layout.prepare_output_dirs()?;
        let category = layout.category();

        let train = TrainSplit::load(&layout.train_input())?;
        let train_asins = train.item_ids();
        registry.extend(train.user_ids(), train_asins.iter().cloned());
        registry.save(&layout.user_output(), &layout.item_output())?;

        let mut kept = collect_metadata(&layout.meta_input(), &train_asins, formats)?;
        let average_price = kept.prices.average();
        summary.record_category(category, average_price);

        let imputed = kept
            .filtered
            .iter_mut()
            .map(|record| impute_price(record, average_price))
            .filter(|imputed| *imputed)
            .count();

        write_json_file(&layout.meta_output(), &kept.meta, 4)?;
        write_json_file(&layout.filtered_output(), &kept.filtered, 4)?;
        train.write_filtered(&layout.train_output(), &train_asins)?;

        let reviews = if self.with_reviews {
            Some(filter_reviews(
                &layout.review_input(),
                &layout.review_output(),
                &train_asins,
            )?)
        } else {
            None
        };

        let report = CategoryReport {
            meta_read: kept.read,
            meta_kept: kept.meta.len(),
            filtered: kept.filtered.len(),
            imputed,
            average_price,
            reviews,
        };
        info!(
            "Category {category} processed: {} of {} metadata records kept, {} with title and images, {} prices imputed with {average_price:.2}",
            report.meta_kept.to_formatted_string(&Locale::en),
            report.meta_read.to_formatted_string(&Locale::en),
            report.filtered.to_formatted_string(&Locale::en),
            report.imputed.to_formatted_string(&Locale::en),
        );
        Ok(report)
    }
}

fn collect_metadata(
    path: &Path,
    asins: &AHashSet<String>,
    formats: &mut PriceFormats,
) -> Result<KeptMetadata> {
    let mut reader = open_jsonl(path)?;
    let mut kept = KeptMetadata {
        meta: Vec::new(),
        filtered: Vec::new(),
        prices: PriceStats::default(),
        read: 0,
    };

    let bar = ProgressBar::new_spinner().with_style(spinner_style()?);
    bar.set_message(format!("meta {}", path.display()));

    let mut first_line = 1;
    let mut batch: Vec<String> = Vec::with_capacity(PARSE_BATCH);
    loop {
        batch.clear();
        for _ in 0..PARSE_BATCH {
            let mut line = String::new();
            if reader
                .read_line(&mut line)
                .with_context(|| format!("cannot read {}", path.display()))?
                == 0
            {
                break;
            }
            batch.push(line);
        }
        if batch.is_empty() {
            break;
        }

        let parsed = batch
            .par_iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(offset, line)| {
                serde_json::from_str::<Value>(line).map_err(|e| {
                    anyhow!("{}:{}: invalid JSON: {e}", path.display(), first_line + offset)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for record in parsed {
            kept.read += 1;
            let in_split = record
                .get("parent_asin")
                .and_then(Value::as_str)
                .is_some_and(|asin| asins.contains(asin));
            if in_split {
                keep_record(record, &mut kept, formats);
            }
        }

        bar.inc(batch.len() as u64);
        first_line += batch.len();
    }
    bar.finish_and_clear();
    Ok(kept)
}

fn keep_record(mut record: Value, kept: &mut KeptMetadata, formats: &mut PriceFormats) {
    let outcome = parse_price(record.get("price"));
    if let PriceOutcome::Unknown(raw) = &outcome {
        formats.insert(raw.clone());
    }
    if let Some(price) = outcome.value() {
        kept.prices.add(price);
    }
    if let Some(obj) = record.as_object_mut() {
        let normalized = outcome.value().map_or(Value::Null, Value::from);
        obj.insert("price".into(), normalized);
    }

    let displayable = record.get("title").is_some_and(is_truthy)
        && record.get("images").is_some_and(is_truthy);
    if displayable {
        kept.filtered.push(record.clone());
    }
    kept.meta.push(record);
}
