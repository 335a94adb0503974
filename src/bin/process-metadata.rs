use anyhow::Result;
use clap::Parser;
use log::info;
use recsys_prep::MetadataProcessor;
use std::path::PathBuf;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Keeps the product metadata referenced by each category's training split,
/// normalizes prices and records per-category price averages.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, env = "INPUT_DIR", default_value = "input")]
    input_dir: PathBuf,

    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, env = "CATEGORIES", num_args = 1.., value_delimiter = ',', required = true)]
    categories: Vec<String>,

    /// Also filter `review/{category}.jsonl` in the same pass
    #[arg(long)]
    with_reviews: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!("input_dir: {}", args.input_dir.display());
    info!("output_dir: {}", args.output_dir.display());

    MetadataProcessor::new(args.with_reviews).process_all(
        &args.input_dir,
        &args.output_dir,
        &args.categories,
    )?;
    info!("Metadata processing completed.");
    Ok(())
}
