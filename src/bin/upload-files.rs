use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use recsys_prep::{DEFAULT_ENDPOINT, HubClient, upload_folder};
use std::path::PathBuf;

/// Uploads every file of a folder to a dataset repository on the hub.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// e.g. someone/Amazon-Reviews-2023-Recommendation
    #[arg(long, env = "DATASET_REPO")]
    repo_id: String,

    #[arg(long, env = "UPLOAD_DIR", default_value = "output/review")]
    folder: PathBuf,

    /// Folder inside the repository
    #[arg(long, env = "PATH_IN_REPO", default_value = "review")]
    prefix: String,

    #[arg(long, env = "HF_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long, default_value = "main")]
    revision: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let token = std::env::var("HF_TOKEN").context("HF_TOKEN is not set")?;

    let client = HubClient::new(&args.repo_id, token)
        .endpoint(&args.endpoint)
        .revision(&args.revision);
    let uploaded = upload_folder(&client, &args.folder, &args.prefix)?;
    info!("{} files uploaded to {}", uploaded.len(), args.repo_id);
    Ok(())
}
