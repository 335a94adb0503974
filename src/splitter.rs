use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressIterator};
use log::info;
use num_format::{Locale, ToFormattedString};
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::utils::{bar_style, open_jsonl};

const WRITE_BUFFER: usize = 8 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub total_lines: usize,
    pub lines_per_part: Vec<usize>,
    pub paths: Vec<PathBuf>,
}

/// Part `i` (0-based) of a file cut into `num_parts` pieces of
/// `split_size` lines; the last part takes the remainder.
fn part_index(line: usize, split_size: usize, num_parts: usize) -> usize {
    if split_size == 0 {
        return line.min(num_parts - 1);
    }
    (line / split_size).min(num_parts - 1)
}

pub fn part_paths(input: &Path, output_dir: &Path, num_parts: usize) -> Result<Vec<PathBuf>> {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid input file name {}", input.display()))?;
    let stem = name
        .strip_suffix(".jsonl.gz")
        .or_else(|| name.strip_suffix(".jsonl"))
        .unwrap_or(name);
    Ok((1..=num_parts)
        .map(|k| output_dir.join(format!("{stem}_part{k}.jsonl")))
        .collect())
}

fn count_lines(input: &Path) -> Result<usize> {
    let mut reader = open_jsonl(input)?;
    let mut buf = Vec::new();
    let mut total = 0;
    while reader.read_until(b'\n', &mut buf)? > 0 {
        total += 1;
        buf.clear();
    }
    Ok(total)
}

/// Splits `input` into `num_parts` files of roughly equal line count,
/// written to `output_dir` as `{stem}_part{k}.jsonl`. A `.jsonl.gz` input
/// is decompressed; the parts are always plain text.
pub fn split_file(input: &Path, output_dir: &Path, num_parts: usize) -> Result<SplitReport> {
    if num_parts == 0 {
        bail!("number of parts must be at least 1");
    }

    info!("Counting lines in {}...", input.display());
    let total_lines = count_lines(input)?;
    let split_size = total_lines / num_parts;
    info!(
        "Total lines: {}, about {} per part",
        total_lines.to_formatted_string(&Locale::en),
        split_size.to_formatted_string(&Locale::en)
    );

    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;
    let paths = part_paths(input, output_dir, num_parts)?;
    let mut outputs = paths
        .iter()
        .map(|path| {
            File::create(path)
                .map(|f| BufWriter::with_capacity(WRITE_BUFFER, f))
                .with_context(|| format!("cannot create {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let bar = ProgressBar::new(total_lines as u64).with_style(bar_style()?);
    let mut reader = open_jsonl(input)?;
    let mut lines_per_part = vec![0; num_parts];
    let mut buf = Vec::new();
    for i in (0..total_lines).progress_with(bar) {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            bail!("{} shrank while being split", input.display());
        }
        let part = part_index(i, split_size, num_parts);
        outputs[part].write_all(&buf)?;
        lines_per_part[part] += 1;
    }
    for out in &mut outputs {
        out.flush()?;
    }

    for path in &paths {
        info!("created {}", path.display());
    }
    Ok(SplitReport {
        total_lines,
        lines_per_part,
        paths,
    })
}
