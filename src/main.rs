use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use banks_etl::{EtlConfig, FileProgressLog, HttpSource, Pipeline};

#[derive(Parser)]
#[command(name = "banks-etl", version, about = "Largest banks by market cap: scrape, convert, load")]
struct Cli {
    /// TOML file overriding the default URLs and paths
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Full pipeline: extract, transform, load, verify (default)
    Run,
    /// Only the verification queries against the existing store
    Query,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EtlConfig::load(cli.config.as_deref())?;

    let log = FileProgressLog::new(&config.log_path);
    let source = HttpSource::new(Duration::from_secs(config.http_timeout_secs))?;
    let pipeline = Pipeline::new(&config, &source, &log);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let summary = pipeline.run()?;
            println!(
                "\n✓ Loaded {} banks into {} ({}) and {}",
                summary.rows_loaded,
                config.db_path.display(),
                config.table_name,
                config.csv_path.display()
            );
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
                );
            }
        }
        Command::Query => {
            let results = pipeline.run_queries()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&results).context("Failed to serialize query results")?
                );
            }
        }
    }

    Ok(())
}
