//! lego-hub demo
//!
//! Connects to a LEGO hub, waits for its built-in devices and runs one of
//! the product demos (lights, motors, LED colors, voltage readings).

mod config;
mod connection;
mod demos;

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use config::{DemoConfig, Product};
use connection::ConnectionUrl;
use demos::{Demo, DemoError, Pacer};
use hub::{CancellationToken, DemoHub, ExpressPassengerTrain, HubOptions, PorscheGt4};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "hub-demo")]
#[command(author, version, about = "Demonstrate LEGO hub communications")]
#[command(long_about = "
Connects to a LEGO Powered Up hub, binds its peripherals to named roles and
runs a demo on top of them.

EXAMPLES:
    # Run every demo on the Express Passenger Train
    hub-demo

    # Run the motor demo on the Porsche GT4
    hub-demo --model porsche-gt4 --demo motors

    # Simulated hub with slow device enumeration
    hub-demo --connection 'sim://?delay_ms=400'

CONFIGURATION:
    The demo looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/lego-hub/demo.toml
    3. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Product to drive
    #[arg(short, long, value_enum)]
    model: Option<Product>,

    /// Demo to run
    #[arg(short, long, value_enum, default_value_t = Demo::All)]
    demo: Demo,

    /// Connection URL (auto:// or sim://[address][?delay_ms=N])
    #[arg(long, value_name = "URL")]
    connection: Option<String>,

    /// Advertised hub name to connect to
    #[arg(long, value_name = "NAME")]
    hub_name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Length of one demo pause step in milliseconds
    #[arg(long, value_name = "MS")]
    pace_ms: Option<u64>,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration
    fn apply(&self, config: &mut DemoConfig) {
        if let Some(model) = self.model {
            config.demo.model = model;
        }
        if let Some(connection) = &self.connection {
            config.demo.connection = connection.clone();
        }
        if let Some(name) = &self.hub_name {
            config.demo.hub_name = Some(name.clone());
        }
        if let Some(level) = &self.log_level {
            config.demo.log_level = level.clone();
        }
        if let Some(pace_ms) = self.pace_ms {
            config.demo.pace_ms = pace_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = DemoConfig::default();
        let path = DemoConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(ref path) = args.config {
        DemoConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        DemoConfig::load_or_default()
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    setup_logging(&config.demo.log_level).context("Failed to setup logging")?;

    info!("lego-hub demo v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", config.demo.log_level);

    let url: ConnectionUrl = config.demo.connection.parse()?;
    let cancel = CancellationToken::new();
    let options = config.hub_options(cancel.clone());
    let pacer = Pacer::new(Duration::from_millis(config.demo.pace_ms), cancel.clone());
    let product = config.demo.model;
    let hub_name = config.demo.hub_name.clone();
    let demo = args.demo;

    // Ctrl+C interrupts the device wait and the demo pauses
    let interrupt = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, stopping demo...");
                cancel.cancel();
            }
            Err(e) => error!("Error waiting for Ctrl+C: {}", e),
        }
    });

    let result = tokio::task::spawn_blocking(move || {
        run_demo(product, &url, hub_name, options, demo, &pacer)
    })
    .await
    .context("Demo task panicked")?;

    interrupt.abort();
    result
}

/// Connect, run `demo` and always disconnect
fn run_demo(
    product: Product,
    url: &ConnectionUrl,
    hub_name: Option<String>,
    options: HubOptions,
    demo: Demo,
    pacer: &Pacer,
) -> Result<()> {
    let connection = Box::new(url.open(product.hub_model())?);

    let hub: Box<dyn DemoHub> = match product {
        Product::ExpressTrain => {
            let mut profile = ExpressPassengerTrain::profile();
            if let Some(name) = hub_name {
                profile = profile.with_name(name);
            }
            Box::new(
                ExpressPassengerTrain::connect_with(connection, profile, options)
                    .context("Failed to connect to Express Passenger Train")?,
            )
        }
        Product::PorscheGt4 => {
            let mut profile = PorscheGt4::profile();
            if let Some(name) = hub_name {
                profile = profile.with_name(name);
            }
            Box::new(
                PorscheGt4::connect_with(connection, profile, options)
                    .context("Failed to connect to Porsche GT4")?,
            )
        }
    };

    if !hub.hub().readiness().is_ready() {
        warn!(
            "{}: not every built-in device appeared ({:?})",
            hub.product(),
            hub.hub().readiness()
        );
    }

    info!("Running {:?} demo on {}", demo, hub.product());
    let result = match demo.run(hub.as_ref(), pacer) {
        Ok(()) => Ok(()),
        Err(DemoError::Interrupted) => {
            info!("Demo interrupted");
            Ok(())
        }
        Err(DemoError::Hub(e)) => Err(anyhow::Error::new(e).context("Demo failed")),
    };

    if let Err(e) = hub.disconnect_boxed() {
        error!("Error disconnecting hub: {}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "hub-demo",
            "--model",
            "porsche-gt4",
            "--demo",
            "led-colors",
            "--connection",
            "sim://car",
            "--pace-ms",
            "0",
        ]);
        let mut config = DemoConfig::default();
        args.apply(&mut config);

        assert_eq!(args.demo, Demo::LedColors);
        assert_eq!(config.demo.model, Product::PorscheGt4);
        assert_eq!(config.demo.connection, "sim://car");
        assert_eq!(config.demo.pace_ms, 0);
        assert_eq!(config.demo.log_level, "info");
    }

    #[test]
    fn test_run_demo_simulated() {
        let url: ConnectionUrl = "sim://?delay_ms=1".parse().unwrap();
        let mut config = DemoConfig::default();
        config.readiness.interval_ms = 5;
        config.readiness.max_attempts = 200;
        let options = config.hub_options(CancellationToken::new());
        let pacer = Pacer::new(Duration::ZERO, CancellationToken::new());

        run_demo(
            Product::PorscheGt4,
            &url,
            Some("Technic Move  ".to_string()),
            options,
            Demo::All,
            &pacer,
        )
        .unwrap();
    }
}
