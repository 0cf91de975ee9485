//! Kernel Lab CLI Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use kernel_lab::cli::{execute, Cli};
use kernel_lab::LabConfig;

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kernel_lab=info"));
    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = LabConfig::from_env();
    debug!("Configuration: {:?}", config);

    execute(cli.command, &config)
}
