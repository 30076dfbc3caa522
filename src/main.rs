//! Carbon Footprint Calculator
//!
//! Command-line front end for the emissions calculator.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{info, warn};

use carbon_calculator::config::{Config, ProviderKind};
use carbon_calculator::logging::{self, LogFormat};
use carbon_calculator::provider::{ClimatiqProvider, EmissionFactorProvider, LocalFactorProvider};
use carbon_calculator::{ApiResponse, InputRecord, ProviderError, calculate_report, db, import, sample};

#[derive(Parser)]
#[command(name = "carbon-calculator")]
#[command(about = "Monthly household carbon footprint calculator")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "carbon.toml")]
    config: PathBuf,

    /// Path to the SQLite emission factor database (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Emission factor source (overrides config)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderKind>,

    /// Climatiq API key (overrides config)
    #[arg(long, env = "CLIMATIQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a footprint report from survey JSON
    Calc {
        /// Input JSON file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Print the JSON response envelope instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Run sample estimates against the configured provider
    CheckProvider,

    /// Import emission factors from a directory of CSV files
    Import {
        /// Directory to scan for *.csv files
        source_dir: PathBuf,

        /// Clear existing factors before importing
        #[arg(long)]
        clear: bool,
    },

    /// List all stored emission factors
    ListFactors,

    /// Initialize empty database with schema
    Init,

    /// Load sample factors for offline use
    LoadSample,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let mut config = Config::load(&cli.config)?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if let Some(api_key) = cli.api_key {
        config.climatiq.api_key = Some(api_key);
    }

    match cli.command {
        Commands::Calc { input, json } => {
            for warning in config.preflight() {
                warn!("{}", warning);
            }

            let record = read_input(input.as_deref())?;
            let provider = build_provider(&config)?;
            info!(provider = provider.name(), "Calculating emissions");

            let report = calculate_report(provider.as_ref(), &record);
            if json {
                println!("{}", serde_json::to_string_pretty(&ApiResponse::ok(report))?);
            } else {
                println!("{}", report);
            }
        }

        Commands::CheckProvider => {
            for warning in config.preflight() {
                warn!("{}", warning);
            }
            let provider = build_provider(&config)?;
            if !check_provider(provider.as_ref()) {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Import { source_dir, clear } => {
            let conn = open_store(&config.database)?;
            if clear {
                info!("Clearing existing factors");
                db::clear_factors(&conn)?;
            }

            let stats = import::import_factors(&conn, &source_dir)?;
            println!("{}", stats);
        }

        Commands::ListFactors => {
            let conn = open_store(&config.database)?;
            let factors = db::list_factors(&conn)?;
            if factors.is_empty() {
                println!("No factors in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<100} {:>5} {:>12}  {}", "Activity", "Unit", "kg CO2e/unit", "Source");
                println!("{}", "-".repeat(130));
                for f in factors {
                    println!(
                        "{:<100} {:>5} {:>12.4}  {}",
                        f.activity_id,
                        f.unit,
                        f.kg_co2e_per_unit,
                        f.source.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Init => {
            open_store(&config.database)?;
            println!("Database initialized at: {}", config.database.display());
        }

        Commands::LoadSample => {
            let conn = open_store(&config.database)?;
            let count = sample::load_sample_data(&conn)?;
            println!("Loaded {} sample factors", count);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_store(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn build_provider(config: &Config) -> Result<Box<dyn EmissionFactorProvider>> {
    let provider: Box<dyn EmissionFactorProvider> = match config.provider {
        ProviderKind::Climatiq => Box::new(ClimatiqProvider::new(&config.climatiq)),
        ProviderKind::Local => Box::new(LocalFactorProvider::new(open_store(&config.database)?)),
    };
    Ok(provider)
}

fn read_input(path: Option<&Path>) -> Result<InputRecord> {
    let text = match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("Input is not a JSON object")
}

/// Run the probe estimates and print each outcome. Returns false if any failed.
fn check_provider(provider: &dyn EmissionFactorProvider) -> bool {
    println!("Testing {} provider...\n", provider.name());

    let mut all_ok = true;
    for (label, query) in sample::provider_probes() {
        match provider.estimate(&query) {
            Ok(Some(co2e)) => println!("  ok    {}: {:.3} kg CO2e", label, co2e),
            Ok(None) => {
                println!("  FAIL  {}: no figure returned", label);
                all_ok = false;
            }
            Err(e) => {
                println!("  FAIL  {}: {}", label, e);
                if matches!(e, ProviderError::Unauthorized(_)) {
                    println!("        The API key is invalid or expired; get a new one at https://www.climatiq.io/");
                }
                all_ok = false;
            }
        }
    }

    println!();
    if all_ok {
        println!("All probes succeeded.");
    } else {
        println!("Some probes failed.");
    }
    all_ok
}
