pub mod commands;

use clap::{Parser, Subcommand};
use clientele_core::config::{ConfigOverrides, LoadOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "clientele",
    about = "Clientele operator CLI",
    long_about = "Operate the Clientele customer registry: migrations, config inspection, readiness checks, and offline tier evaluation.",
    after_help = "Examples:\n  clientele doctor --json\n  clientele config\n  clientele --config deploy/clientele.toml migrate\n  clientele tier --spend 1500 --last-purchase 2026-08-01T00:00:00Z"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read this config file; fail if it does not exist")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the database URL after env and file layers")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides { database_url: self.database_url.clone() },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Classify a spend and last purchase date into a loyalty tier")]
    Tier {
        #[arg(long, help = "Annual spend as a decimal amount")]
        spend: String,
        #[arg(long, help = "Last purchase timestamp (ISO-8601, UTC when no offset is given)")]
        last_purchase: Option<String>,
        #[arg(long, help = "Evaluate as of this timestamp instead of the current time")]
        now: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(options, json) }
        }
        Command::Tier { spend, last_purchase, now } => {
            commands::tier::run(&spend, last_purchase.as_deref(), now.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
