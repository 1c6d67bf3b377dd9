mod ingest;
mod run;
mod seed;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "adpulse-cli")]
#[command(about = "adpulse command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest raw metric records from a JSON file
    Ingest {
        /// Path to a JSON file containing an array of raw records
        #[arg(long)]
        file: std::path::PathBuf,

        /// Source identifier (e.g. meta_ads, ga4, google_ads)
        #[arg(long)]
        source: String,
    },
    /// Execute the weekly analysis pipeline once
    Run {
        /// Days of history captured in the run parameters
        #[arg(long, default_value_t = 30)]
        days_back: i64,

        /// Length of each comparison window in days
        #[arg(long, default_value_t = 7)]
        comparison_days: i64,
    },
    /// List recent agent runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Generate and ingest sample multi-source data for local testing
    Seed {
        /// Number of days of sample history to generate
        #[arg(long, default_value_t = 7)]
        days: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let pool = adpulse_db::connect_pool_from_env().await?;
    adpulse_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Ingest { file, source } => ingest::ingest_file(&pool, &file, &source).await,
        Commands::Run {
            days_back,
            comparison_days,
        } => run::run_analysis(&pool, days_back, comparison_days).await,
        Commands::Runs { limit } => run::list_runs(&pool, limit).await,
        Commands::Seed { days } => seed::seed_sample_data(&pool, days).await,
    }
}
