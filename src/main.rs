use anyhow::Result;
use clap::Parser;
use log::info;
use recsys_prep::{DEFAULT_NUM_NEGATIVES, DEFAULT_SHUFFLE_SEED, Preprocessor};
use std::path::PathBuf;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Remaps raw ids to dense integers and writes leave-one-out train/test
/// files with sampled negatives, one folder per category.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Folder holding `{category}/{category}.csv`
    #[arg(long, env = "INPUT_DIR", default_value = "../data/input")]
    input_dir: PathBuf,

    /// Folder receiving `{category}/` outputs
    #[arg(long, env = "OUTPUT_DIR", default_value = "../data/output")]
    output_dir: PathBuf,

    /// Categories to process
    #[arg(long, env = "CATEGORIES", num_args = 1.., value_delimiter = ',', required = true)]
    categories: Vec<String>,

    /// Shuffle interactions before holding out the last one per user
    #[arg(long)]
    shuffle: bool,

    /// Seed of the shuffle
    #[arg(long, env = "SHUFFLE_SEED", default_value_t = DEFAULT_SHUFFLE_SEED)]
    shuffle_seed: u64,

    /// Negatives sampled per held-out interaction
    #[arg(long, env = "NUM_NEGATIVES", default_value_t = DEFAULT_NUM_NEGATIVES)]
    num_negatives: usize,

    /// Seed of the negative sampler (random when absent)
    #[arg(long, env = "NEGATIVE_SEED")]
    negative_seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!("input_dir: {}", args.input_dir.display());
    info!("output_dir: {}", args.output_dir.display());

    let preprocessor = Preprocessor::new(&args.input_dir, &args.output_dir)
        .shuffle_seed(args.shuffle.then_some(args.shuffle_seed))
        .num_negatives(args.num_negatives)
        .negative_seed(args.negative_seed);
    let reports = preprocessor.run(&args.categories)?;

    info!("{} categories processed", reports.len());
    Ok(())
}
