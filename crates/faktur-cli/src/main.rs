//! CLI application for LLM-assisted document extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, flatten, normalize, process};

/// faktur - Turn OCR text of invoices, receipts and CVs into spreadsheets
#[derive(Parser)]
#[command(name = "faktur")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a single document through the language model
    Process(process::ProcessArgs),

    /// Extract multiple documents, one after another
    Batch(batch::BatchArgs),

    /// Normalize a saved model response without calling the model
    Normalize(normalize::NormalizeArgs),

    /// Flatten a JSON document into key/value rows
    Flatten(flatten::FlattenArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // OPENAI_API_KEY may live in a .env file
    dotenvy::dotenv().ok();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path),
        Commands::Batch(args) => batch::run(args, config_path),
        Commands::Normalize(args) => normalize::run(args, config_path),
        Commands::Flatten(args) => flatten::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
