use anyhow::Context;
use capsule_dispenser::utils::{logger, validation::Validate};
use capsule_dispenser::{
    CliConfig, DispenserConfig, FulfillmentLoop, ShutdownSignal, SimulatedActuator, SystemClock,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting capsule-dispenser");

    let config = DispenserConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e).context("invalid configuration");
    }

    if cli.validate_only {
        println!("✅ Configuration is valid");
        println!("  Orders: {}", config.server.orders_url);
        println!("  Capsules: {:?}", config.actuators.capsules);
        println!("  Cup channel: {}", config.actuators.cup_channel);
        return Ok(());
    }

    let driver = Arc::new(SimulatedActuator::new(&config.actuators));
    let mut fulfillment = FulfillmentLoop::from_config(&config, driver, Arc::new(SystemClock));

    let signal = Arc::new(ShutdownSignal::new());
    let shutdown = signal.subscribe();
    {
        let signal = Arc::clone(&signal);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("🛑 Interrupt received, finishing current step");
                    signal.trigger();
                }
                Err(e) => tracing::error!("❌ Unable to listen for shutdown signal: {}", e),
            }
        });
    }

    fulfillment.run(&shutdown).await?;

    Ok(())
}
