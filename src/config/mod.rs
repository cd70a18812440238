pub mod toml_config;

pub use toml_config::DispenserConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "capsule-dispenser")]
#[command(about = "Unattended order-fulfillment controller for a capsule dispenser")]
pub struct CliConfig {
    #[arg(short, long, default_value = "dispenser.toml")]
    pub config: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Load and validate the configuration, then exit")]
    pub validate_only: bool,
}
