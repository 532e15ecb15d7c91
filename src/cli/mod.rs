pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to the default log file
    #[arg(long, global = true, conflicts_with = "log_file")]
    pub log: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where to load the configuration from
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSource {
    /// Configuration file to use instead of a profile
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Named configuration profile
    #[arg(short, long)]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the listing pages, extract document links and download them
    Run {
        #[command(flatten)]
        source: ConfigSource,

        /// First listing page (inclusive)
        #[arg(long)]
        start: Option<u32>,

        /// Last listing page (exclusive)
        #[arg(long)]
        end: Option<u32>,

        /// Number of concurrent download workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Directory the documents are saved into
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print the document links found in the markup store
    Extract {
        #[command(flatten)]
        source: ConfigSource,

        /// Print a JSON array instead of one line per link
        #[arg(long)]
        json: bool,
    },

    /// Download a single document URL
    Fetch {
        /// Document URL
        #[arg(required = true)]
        url: String,

        #[command(flatten)]
        source: ConfigSource,

        /// Directory the document is saved into
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Manage configuration profiles
    Config {
        /// Profile name to manage
        #[arg(required = false, value_name = "NAME")]
        name: Option<String>,

        #[command(flatten)]
        source: ConfigSource,

        /// List all available profiles
        #[arg(short, long)]
        list: bool,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { source, start, end, workers, output } => {
            info!("Starting harvest");
            commands::run(source, commands::RunOverrides { start, end, workers, output }).await
        },
        Commands::Extract { source, json } => {
            info!("Extracting document links");
            commands::extract(source, json).await
        },
        Commands::Fetch { url, source, output } => {
            info!("Fetching {}", url);
            commands::fetch(url, source, output).await
        },
        Commands::Config { name, source, list } => {
            if list {
                info!("Listing all configuration profiles");
                commands::list_profiles()
            } else if let Some(profile_name) = name {
                info!("Managing configuration profile: {}", profile_name);
                commands::manage_profile(profile_name)
            } else {
                info!("Showing current configuration");
                commands::show_config(source)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "harvester", "--verbose", "run", "--profile", "biorad", "--start", "2", "--end", "5", "-w", "4", "-o", "out",
        ]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Run { source, start, end, workers, output } => {
                assert_eq!(source.profile.as_deref(), Some("biorad"));
                assert_eq!((start, end, workers), (Some(2), Some(5), Some(4)));
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_config_accepts_config_file() {
        let cli = Cli::try_parse_from(["harvester", "config", "--config", "harvest.yaml"]).unwrap();

        match cli.command {
            Commands::Config { name, source, list } => {
                assert!(name.is_none() && !list);
                assert_eq!(source.config, Some(PathBuf::from("harvest.yaml")));
            }
            _ => panic!("expected config command"),
        }
    }

    #[test]
    fn test_log_flags_conflict() {
        assert!(Cli::try_parse_from(["harvester", "--log", "--log-file", "x.log", "extract"]).is_err());
    }
}
