pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use signoff_core::config::{ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "signoff",
    about = "Signoff operator CLI",
    long_about = "Operate signoff migrations, demo data, and approval actions from the command line.",
    after_help = "Examples:\n  signoff migrate\n  signoff seed --steps 3\n  signoff approve --approval-id <id> --step-id <id> --approver-id <id> --idempotency-key req-1"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Override the configured database URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Seed one started demo approval and print its identifiers")]
    Seed {
        #[arg(long, default_value_t = 3, help = "Number of sequential steps to create")]
        steps: u32,
    },
    #[command(about = "Apply one approval action, idempotent under the given key")]
    Approve {
        #[arg(long)]
        approval_id: Uuid,
        #[arg(long)]
        step_id: Uuid,
        #[arg(long)]
        approver_id: Uuid,
        #[arg(long)]
        idempotency_key: String,
    },
    #[command(about = "Show the current state of an approval and its steps")]
    Show {
        #[arg(long)]
        approval_id: Uuid,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        overrides: ConfigOverrides {
            database_url: cli.database_url.clone(),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed { steps } => commands::seed::run(options, steps),
        Command::Approve { approval_id, step_id, approver_id, idempotency_key } => {
            commands::approve::run(options, approval_id, step_id, approver_id, idempotency_key)
        }
        Command::Show { approval_id } => commands::show::run(options, approval_id),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
