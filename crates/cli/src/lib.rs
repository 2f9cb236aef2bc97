pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shopmind",
    about = "Shopmind operator CLI",
    long_about = "Operate Shopmind migrations, demo fixtures, config inspection, readiness checks, and ad-hoc chat replies.",
    after_help = "Examples:\n  shopmind doctor --json\n  shopmind config\n  shopmind ask --store store-demo-001 \"Do you sell headphones?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo store and its catalog (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, generation key readiness, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one customer message through the response pipeline and print the result")]
    Ask {
        #[arg(long, help = "Store whose catalog grounds the reply")]
        store: String,
        #[arg(long, help = "Customer identifier used to scope recorded history")]
        customer: Option<String>,
        #[arg(long, help = "Persist the exchange to conversation history")]
        record: bool,
        #[arg(help = "Customer message text")]
        message: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { store, customer, record, message } => {
            commands::ask::run(commands::ask::AskArgs { store, customer, record, message })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
