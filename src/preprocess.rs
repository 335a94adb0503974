use anyhow::{Context, Result};
use log::info;
use num_format::{Locale, ToFormattedString};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::leave_one_out::split_train_test;
use crate::negative::{DEFAULT_NUM_NEGATIVES, generate_negative_samples};
use crate::remap::IdMaps;
use crate::structs::{Interaction, PreprocessReport, TestNegative};
use crate::train::TrainSplit;
use crate::utils::{create_buffered, push_id};

/// Turns per-category interaction CSVs into the rating files used for
/// leave-one-out ranking evaluation.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    input_dir: PathBuf,
    output_dir: PathBuf,
    shuffle_seed: Option<u64>,
    num_negatives: usize,
    negative_seed: Option<u64>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("../data/input"),
            output_dir: PathBuf::from("../data/output"),
            shuffle_seed: None,
            num_negatives: DEFAULT_NUM_NEGATIVES,
            negative_seed: None,
        }
    }
}

impl Preprocessor {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    pub fn num_negatives(mut self, num_negatives: usize) -> Self {
        self.num_negatives = num_negatives;
        self
    }

    pub fn negative_seed(mut self, seed: Option<u64>) -> Self {
        self.negative_seed = seed;
        self
    }

    pub fn run(&self, categories: &[String]) -> Result<Vec<PreprocessReport>> {
        categories
            .iter()
            .map(|category| self.preprocess_category(category))
            .collect()
    }

    pub fn preprocess_category(&self, category: &str) -> Result<PreprocessReport> {
        let start = Instant::now();
        info!("Processing category: {category}");

        let csv_path = self
            .input_dir
            .join(category)
            .join(format!("{category}.csv"));
        let rows = TrainSplit::load(&csv_path)?.interactions();

        let maps = IdMaps::build(&[rows.as_slice()]);
        let interactions = maps.convert(&rows);
        let split = split_train_test(&interactions, self.shuffle_seed);

        let seed = self
            .negative_seed
            .unwrap_or_else(|| ChaCha20Rng::from_os_rng().random());
        let negatives = generate_negative_samples(
            &split.train,
            &split.test,
            maps.num_items(),
            self.num_negatives,
            seed,
        )?;

        let out_dir = self.output_dir.join(category);
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("cannot create {}", out_dir.display()))?;
        write_ratings(
            &out_dir.join(format!("{category}.train.rating")),
            &split.train,
        )?;
        write_ratings(
            &out_dir.join(format!("{category}.test.rating")),
            &split.test,
        )?;
        write_negatives(
            &out_dir.join(format!("{category}.test.negative")),
            &negatives,
        )?;
        maps.save(&out_dir, category)?;

        let report = PreprocessReport {
            category: category.to_owned(),
            users: maps.num_users(),
            items: maps.num_items(),
            train_pairs: split.train.len(),
            test_pairs: split.test.len(),
            dropped_users: split.dropped_users,
        };
        info!(
            "Done with category {category} in {:.2}s: {} users, {} items, {} train / {} test pairs, {} users with a single interaction dropped",
            start.elapsed().as_secs_f32(),
            report.users.to_formatted_string(&Locale::en),
            report.items.to_formatted_string(&Locale::en),
            report.train_pairs.to_formatted_string(&Locale::en),
            report.test_pairs.to_formatted_string(&Locale::en),
            report.dropped_users.to_formatted_string(&Locale::en),
        );
        Ok(report)
    }
}

/// `user\titem` per line.
pub fn write_ratings(path: &Path, pairs: &[Interaction]) -> Result<()> {
    let mut out = create_buffered(path)?;
    let mut line = String::with_capacity(24);
    for &(user, item) in pairs {
        line.clear();
        push_id(&mut line, user);
        line.push('\t');
        push_id(&mut line, item);
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// `user\tpositive\tneg_1\t...\tneg_k` per line.
pub fn write_negatives(path: &Path, samples: &[TestNegative]) -> Result<()> {
    let mut out = create_buffered(path)?;
    let mut line = String::new();
    for sample in samples {
        line.clear();
        push_id(&mut line, sample.user);
        line.push('\t');
        push_id(&mut line, sample.positive);
        for &negative in &sample.negatives {
            line.push('\t');
            push_id(&mut line, negative);
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}
