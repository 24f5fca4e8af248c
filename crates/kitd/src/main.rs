//! Kit daemon entry point.
//!
//! Loads the daemon configuration, initializes logging, boots the starter
//! kit component and then feeds it arrivals and commands from stdin until
//! EOF, `quit`, or a termination signal.

mod cli;
mod config;
mod console;
mod logging;
mod signals;

use anyhow::Context;
use cli::CliArgs;
use config::AppConfig;
use console::ConsoleHost;
use starter_kits::StarterKits;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .with_context(|| format!("Failed to load config {}", args.config_path.display()))?;
    config.apply_cli(&args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    logging::setup_logging(&config.logging)?;

    info!("🚀 Starting kitd {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config_path.display());

    let mut kits = match StarterKits::init(config.data_directory(), config.item_catalog()) {
        Ok(kits) => kits,
        Err(e) => {
            error!("❌ Exception starting up: {}", e);
            return Err(e).context("Starter kits failed to start");
        }
    };
    let mut host = ConsoleHost::new(&config.permissions);

    let shutdown = async {
        if let Err(e) = signals::shutdown_signal().await {
            error!("Failed to install signal handlers: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let lines = console::spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
        .context("Failed to start console reader")?;
    console::run(&mut kits, &mut host, lines, shutdown).await?;

    kits.shutdown();
    info!(
        "✅ kitd stopped after delivering {} item stack(s)",
        host.delivered_stacks()
    );
    Ok(())
}
