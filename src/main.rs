use anyhow::Result;
use tracing::{info, error};

mod cli;
mod crawler;
mod browser;
mod storage;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // Initialize logging
    let log_file = if args.log {
        Some(utils::default_log_file())
    } else {
        args.log_file.clone()
    };
    utils::init_logging(args.verbose, log_file)?;

    info!("Starting PDF Harvester v{}", env!("CARGO_PKG_VERSION"));

    // Process commands
    match cli::process_command(args).await {
        Ok(_) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
