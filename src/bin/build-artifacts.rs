use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use movie_recs_api::{models::DuplicateTitles, services::artifacts};

/// Converts exported catalog and similarity data into the files the server loads
#[derive(Parser, Debug)]
#[command(name = "build-artifacts")]
#[command(about = "Builds movie_dict.json and similarity.bin from JSON exports", long_about = None)]
struct Args {
    /// Catalog JSON, either a list of {movie_id, title} rows or a column dict
    #[arg(long)]
    catalog: PathBuf,

    /// Similarity matrix as a JSON array of rows
    #[arg(long)]
    similarity: PathBuf,

    /// Directory the artifacts are written to
    #[arg(short, long, default_value = "./data")]
    out_dir: PathBuf,

    /// Fail instead of warning when two entries share a title
    #[arg(long)]
    reject_duplicate_titles: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("movie_recs_api=info")),
        )
        .init();

    let args = Args::parse();
    let duplicates = if args.reject_duplicate_titles {
        DuplicateTitles::Reject
    } else {
        DuplicateTitles::FirstWins
    };

    artifacts::convert(&args.catalog, &args.similarity, &args.out_dir, duplicates).await?;
    Ok(())
}
