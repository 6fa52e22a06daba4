use clap::{Parser, Subcommand};
use fee_analysis_core::config_loader::DEFAULT_CONFIG_PATH;
use fee_analysis_core::ConfigLoader;

mod commands;
mod io;

use commands::{AnalyzeArgs, DetectArgs};

#[derive(Parser)]
#[command(name = "fee-analysis")]
#[command(about = "Fee experiment analysis: periods, elasticity, optimal fee, revenue attribution", long_about = None)]
struct Cli {
    /// Config file path (FEE_ANALYSIS_* environment variables override it)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect fee periods and validate them against the intended schedule
    Detect(DetectArgs),
    /// Run the full analysis and emit a JSON report
    Analyze(AnalyzeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load_from(&cli.config)?;

    match cli.command {
        Commands::Detect(args) => commands::detect::run(&args, config)?,
        Commands::Analyze(args) => commands::analyze::run(&args, config)?,
    }

    Ok(())
}
