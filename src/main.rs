//! UniEXP admin command line
//!
//! Main application entry point

use clap::Parser;
use tracing::{error, info};

mod cli;

use cli::Cli;
use uniexp_admin::{config::Settings, utils::logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::from_file(&cli.config)?;
    settings.validate()?;

    // Initialize logging
    let _guard = logging::init_logging(&settings.logging)?;
    info!("Starting {}", uniexp_admin::info());

    if let Err(e) = cli.execute(settings).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
