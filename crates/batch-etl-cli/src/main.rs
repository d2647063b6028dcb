//! batch-etl CLI - chunked PostgreSQL import job.

use std::path::PathBuf;
use std::process::ExitCode;

use batch_etl::{Config, EtlError, EtlJob};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "batch-etl")]
#[command(about = "Chunk-oriented import job between PostgreSQL tables")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the import job once
    Run {
        /// Run id to record; allocated from the job history when omitted
        #[arg(long)]
        run_id: Option<i64>,

        /// Override the number of records per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Validate row counts between source and destination
    Validate,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), EtlError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run { run_id, chunk_size } => {
            let mut job = EtlJob::new(config).await?;
            if let Some(size) = chunk_size {
                job = job.with_chunk_size(size)?;
            }

            let execution = job.run(run_id).await?;

            if cli.output_json {
                println!("{}", execution.to_json()?);
            } else {
                let step = &execution.step;
                println!("\nJob {}!", execution.status.as_str());
                println!("  Job: {} (run {})", execution.job_name, execution.run_id);
                println!("  Duration: {:.2}s", execution.duration_seconds());
                println!("  Read: {}", step.read_count);
                println!("  Written: {}", step.write_count);
                println!("  Chunks committed: {}", step.commit_count);
                if step.rollback_count > 0 {
                    println!("  Chunks rolled back: {}", step.rollback_count);
                }
                if let Some(ref reason) = execution.exit_description {
                    println!("  Error: {}", reason);
                }
            }

            execution.into_result()?;
        }

        Commands::Validate => {
            let job = EtlJob::new(config).await?;
            let result = job.validate().await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Validation Results:");
                println!("  Source {}: {} rows", result.source_table, result.source_rows);
                println!("  Target {}: {} rows", result.target_table, result.target_rows);
                println!(
                    "\n  Overall: {}",
                    if result.matches { "MATCH" } else { "MISMATCH" }
                );
            }
        }

        Commands::HealthCheck => {
            let job = EtlJob::new(config).await?;
            let result = job.health_check().await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source: {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target: {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(EtlError::pool("Health check failed", "connecting to databases"));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json keeps stdout parseable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
