use anyhow::Result;
use clap::Parser;
use log::info;
use recsys_prep::{CategoryLayout, process_reviews};
use std::path::PathBuf;

/// Streams review files and keeps the reviews of items in the training
/// split. Works on the part files written by `split-large-file`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, env = "INPUT_DIR", default_value = "input")]
    input_dir: PathBuf,

    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, env = "CATEGORIES", num_args = 1.., value_delimiter = ',', required = true)]
    categories: Vec<String>,

    /// Read `{category}_part{N}.jsonl` instead of `{category}.jsonl`
    #[arg(long, env = "PART")]
    part: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    for category in &args.categories {
        let layout = CategoryLayout::new(&args.input_dir, &args.output_dir, category.as_str())
            .with_part(args.part);
        process_reviews(&layout)?;
    }
    info!("Review processing completed.");
    Ok(())
}
