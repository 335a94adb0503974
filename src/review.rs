use ahash::AHashSet;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressIterator};
use log::info;
use num_format::{Locale, ToFormattedString};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::layout::CategoryLayout;
use crate::train::load_train_asins;
use crate::utils::{create_buffered, open_jsonl, spinner_style, to_writer_indented};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewReport {
    pub read: usize,
    pub kept: usize,
}

/// Streams `input` and writes the reviews of items in `asins` to `output`
/// as a JSON array, one record at a time.
pub fn filter_reviews(input: &Path, output: &Path, asins: &AHashSet<String>) -> Result<ReviewReport> {
    let reader = open_jsonl(input)?;
    let mut out = create_buffered(output)?;
    let mut report = ReviewReport::default();

    let bar = ProgressBar::new_spinner().with_style(spinner_style()?);
    bar.set_message(format!("reviews {}", input.display()));

    out.write_all(b"[")?;
    for (line_no, line) in reader.lines().progress_with(bar).enumerate() {
        let line = line.with_context(|| format!("cannot read {}", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        report.read += 1;
        let record: Value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON", input.display(), line_no + 1))?;
        let keep = record
            .get("parent_asin")
            .and_then(Value::as_str)
            .is_some_and(|asin| asins.contains(asin));
        if keep {
            if report.kept > 0 {
                out.write_all(b",\n")?;
            }
            to_writer_indented(&mut out, &record, 4)?;
            report.kept += 1;
        }
    }
    out.write_all(b"\n]")?;
    out.flush()?;
    Ok(report)
}

/// Filters the reviews of one category (or one part of it) against the
/// category's training split.
pub fn process_reviews(layout: &CategoryLayout) -> Result<ReviewReport> {
    layout.prepare_output_dirs()?;
    let asins = load_train_asins(&layout.train_input())?;
    let report = filter_reviews(&layout.review_input(), &layout.review_output(), &asins)?;
    info!(
        "Reviews for category {} processed: kept {} of {}",
        layout.category(),
        report.kept.to_formatted_string(&Locale::en),
        report.read.to_formatted_string(&Locale::en)
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn asins(ids: &[&str]) -> AHashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn kept_reviews_form_a_json_array() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reviews.jsonl");
        fs::write(
            &input,
            "{\"parent_asin\":\"B1\",\"rating\":5}\n\
             {\"parent_asin\":\"B9\",\"rating\":1}\n\
             \n\
             {\"parent_asin\":\"B2\",\"rating\":3}\n",
        )
        .unwrap();
        let output = dir.path().join("reviews.json");

        let report = filter_reviews(&input, &output, &asins(&["B1", "B2"])).unwrap();
        assert_eq!(report, ReviewReport { read: 3, kept: 2 });

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("[{\n    \"parent_asin\": \"B1\""));
        assert!(text.contains("},\n{"));
        let parsed: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["rating"], 3);
    }

    #[test]
    fn nothing_kept_is_an_empty_array() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reviews.jsonl");
        fs::write(&input, "{\"parent_asin\":\"B1\"}\n").unwrap();
        let output = dir.path().join("reviews.json");

        filter_reviews(&input, &output, &AHashSet::new()).unwrap();
        let parsed: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn invalid_line_reports_its_position() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reviews.jsonl");
        fs::write(&input, "{\"parent_asin\":\"B1\"}\n{oops\n").unwrap();

        let err = filter_reviews(&input, &dir.path().join("o.json"), &asins(&["B1"])).unwrap_err();
        assert!(err.to_string().ends_with(":2: invalid JSON"));
    }

    #[test]
    fn part_files_are_filtered_against_the_split() {
        let dir = tempdir().unwrap();
        let input_dir = dir.path().join("input");
        fs::create_dir_all(input_dir.join("train")).unwrap();
        fs::create_dir_all(input_dir.join("review")).unwrap();
        fs::write(
            input_dir.join("train/Toys.csv"),
            "user_id,parent_asin\nU1,B1\n",
        )
        .unwrap();
        fs::write(
            input_dir.join("review/Toys_part2.jsonl"),
            "{\"parent_asin\":\"B1\"}\n{\"parent_asin\":\"B2\"}\n",
        )
        .unwrap();

        let layout =
            CategoryLayout::new(&input_dir, dir.path().join("output"), "Toys").with_part(Some(2));
        let report = process_reviews(&layout).unwrap();
        assert_eq!(report.kept, 1);
        assert!(dir.path().join("output/review/Toys_part2.json").exists());
    }
}
