use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use youtube_faces_db::data::synthetic::{generate, SyntheticConfig};
use youtube_faces_db::data::writer::{write_catalog, CatalogFormat};

/// Write a synthetic catalog with the layout of the real benchmark.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", version)]
struct Args {
    /// JSON file, or table directory for csv / parquet.
    output: PathBuf,
    #[arg(long, default_value = "json")]
    format: CatalogFormat,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 60)]
    people_per_fold: usize,
    #[arg(long, default_value_t = 60)]
    pairs_per_fold: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = SyntheticConfig {
        people_per_fold: args.people_per_fold,
        pairs_per_fold: args.pairs_per_fold,
        seed: args.seed,
        ..SyntheticConfig::default()
    };
    let catalog = generate(&config);
    write_catalog(&catalog, &args.output, args.format)?;

    println!(
        "Wrote {} files, {} pairs and {} annotation rows to {}",
        catalog.files.len(),
        catalog.pairs.len(),
        catalog.annotations.len(),
        args.output.display()
    );
    Ok(())
}
