mod harvest_cmd;
mod rank_cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "skillet")]
#[command(about = "Recipe harvesting pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a harvest over a candidates file
    Harvest {
        /// JSON file containing an array of raw candidates
        #[arg(long, default_value = "data/candidates.json")]
        candidates: String,
        /// Platforms to include (default: all present in the file)
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<String>,
        /// Candidates per platform
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Minimum quality score to store a recipe
        #[arg(long)]
        min_quality: Option<f64>,
        /// Use the LLM extractor (requires ANTHROPIC_API_KEY) instead of
        /// the local heuristic extractor
        #[arg(long)]
        ai: bool,
    },
    /// Score and rank a recipe dump, best first
    Rank {
        /// JSON file containing an array of recipes
        file: String,
    },
    /// Run the validation gate and quality scorer over a recipe dump
    Check {
        /// JSON file containing an array of recipes
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            candidates,
            platforms,
            limit,
            min_quality,
            ai,
        } => {
            harvest_cmd::run(&candidates, &platforms, limit, min_quality, ai).await?;
        }
        Commands::Rank { file } => {
            rank_cmd::rank(&file)?;
        }
        Commands::Check { file } => {
            rank_cmd::check(&file)?;
        }
    }

    Ok(())
}
