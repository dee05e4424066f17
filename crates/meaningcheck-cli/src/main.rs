//! meaningcheck CLI: verify free-text answers against reference meanings.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "meaningcheck",
    version,
    about = "Free-text answer verification against multi-sense meanings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one answer and print the verdict as JSON
    Check {
        /// The learner's answer
        #[arg(long)]
        answer: String,

        /// The reference meaning (senses separated by ; ， , or ；)
        #[arg(long)]
        meaning: String,

        /// Pass threshold on the 0-100 scale (overrides config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Cache file (overrides config)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Verify a JSON file of {answer, meaning} items
    Batch {
        /// JSON array of {"answer": ..., "meaning": ...}
        #[arg(long)]
        input: PathBuf,

        /// Max concurrent verifications
        #[arg(long, default_value = "4")]
        parallelism: usize,

        /// Write per-item verdicts to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pass threshold on the 0-100 scale (overrides config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Cache file (overrides config)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show how a reference meaning splits into senses
    Split {
        /// The reference meaning
        #[arg(long)]
        meaning: String,
    },

    /// Inspect the result cache
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheAction,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("meaningcheck=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            answer,
            meaning,
            threshold,
            cache,
            config,
        } => commands::check::execute(answer, meaning, threshold, cache, config).await,
        Commands::Batch {
            input,
            parallelism,
            output,
            threshold,
            cache,
            config,
        } => {
            commands::batch::execute(input, parallelism, output, threshold, cache, config).await
        }
        Commands::Split { meaning } => commands::split::execute(&meaning),
        Commands::Cache { action } => commands::cache::execute(action).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
