use anyhow::Result;
use clap::Parser;
use recsys_prep::split_file;
use std::path::PathBuf;

/// Cuts a JSONL file into parts of roughly equal line count.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// e.g. input/review/Home_and_Kitchen.jsonl
    #[arg(long, env = "INPUT_FILE")]
    input_file: PathBuf,

    /// Defaults to the folder of the input file
    #[arg(long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    #[arg(long, env = "NUM_PARTS", default_value_t = 3)]
    num_parts: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let output_dir = args.output_dir.unwrap_or_else(|| {
        args.input_file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default()
    });

    let report = split_file(&args.input_file, &output_dir, args.num_parts)?;
    println!("Split complete, created:");
    for (path, lines) in report.paths.iter().zip(&report.lines_per_part) {
        println!("   {} ({lines} lines)", path.display());
    }
    Ok(())
}
