// Venue Simulator - CLI
// Single entry point for configuring, validating and running simulations

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use venue_sim::{ConfigError, SimulationConfig};

// Load command modules from cli directory
#[path = "../cli/run_commands.rs"]
mod run_commands;

#[derive(Parser)]
#[command(name = "venue-sim")]
#[command(version = "0.1.0")]
#[command(about = "Multi-venue paper trading simulator", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "sim.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Batch,
    Continuous,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PresetArg {
    /// Threshold-only entries
    Batch,
    /// Lower threshold with occasional injected entries
    Continuous,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run pre-flight checks against the configuration
    Validate,

    /// Run a simulation
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Termination mode (overrides config)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Closed trades per venue in batch mode
    #[arg(short, long)]
    pub trades: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Milliseconds between ticks in continuous mode
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Log a status snapshot every N ticks in continuous mode
    #[arg(long)]
    pub status_every: Option<u64>,

    /// Safety bound on the number of ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Replace the signal settings with a preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Starting balance for every venue
    #[arg(long)]
    pub balance: Option<f64>,

    /// Position size as a fraction of balance, for every venue
    #[arg(long)]
    pub position_size: Option<f64>,

    /// Stop-loss distance as a fraction of entry, for every venue
    #[arg(long)]
    pub stop_loss: Option<f64>,

    /// Take-profit distance as a fraction of entry, for every venue
    #[arg(long)]
    pub take_profit: Option<f64>,

    /// Concurrent open positions per venue
    #[arg(long)]
    pub max_positions: Option<usize>,

    /// Write the final report as JSON
    #[arg(short, long)]
    pub output: Option<String>,

    /// Disable the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging first (before config load so we can see config errors)
    let log_level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("🚀 Venue Simulator v0.1.0");
    info!("📁 Config: {}", cli.config);

    match cli.command {
        // Init doesn't require config (it creates it)
        Commands::Init { force } => {
            init_config(&cli.config, force)?;
        }

        Commands::Validate => {
            let config = load_config_or_exit(&cli.config)?;
            if !run_commands::validate(&config) {
                error!("❌ Pre-flight validation failed");
                std::process::exit(1);
            }
        }

        Commands::Run(args) => {
            let config = load_config_or_exit(&cli.config)?;
            if let Err(e) = run_commands::run_simulation(config, &args).await {
                error!("❌ {}", e.user_message());
                if e.is_fatal() {
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Load config or exit with helpful error message
fn load_config_or_exit(path: &str) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    match load_unvalidated(path) {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("❌ Configuration Error");
            error!("{}", e);

            if matches!(e, ConfigError::FileNotFound(_)) {
                error!("");
                error!("💡 Quick fix:");
                error!("   1. Run: venue-sim init");
                error!("   2. Edit {} to describe your venues", path);
                error!("   3. Try again");
            }

            std::process::exit(1);
        }
    }
}

// Validation happens later so `validate` can show every finding, not just the first
fn load_unvalidated(path: &str) -> Result<SimulationConfig, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Err(ConfigError::FileNotFound(path.to_string()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(e.to_string()))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn init_config(config_path: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!("🔧 Initializing configuration...");

    if std::path::Path::new(config_path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", config_path);
        return Ok(());
    }

    SimulationConfig::default().to_file(config_path)?;
    info!("📝 Created {}", config_path);

    info!("✅ Configuration initialized successfully!");
    info!("💡 Next steps:");
    info!("   1. Edit {} (venues, instruments, signal settings)", config_path);
    info!("   2. Run: venue-sim validate");
    info!("   3. Run: venue-sim run --seed 42");

    Ok(())
}
