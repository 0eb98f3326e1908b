pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cleardesk",
    about = "Cleardesk review-engine operator CLI",
    long_about = "Inspect customs-declaration pipeline payloads, preview detected issues, and run deterministic smoke review sessions against the review engine.",
    after_help = "Examples:\n  cleardesk inspect payload.json\n  cleardesk catalog --file hints.toml\n  cleardesk smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Parse a pipeline payload file and preview the issues a review would open with")]
    Inspect {
        #[arg(help = "Path to a JSON file holding extraction and compliance payloads")]
        path: String,
        #[arg(long, help = "Path to a TOML catalog override for labels and hints")]
        catalog: Option<String>,
    },
    #[command(about = "Run a deterministic end-to-end review session and report per-step results")]
    Smoke,
    #[command(about = "Show effective field labels, hints, and check names with override attribution")]
    Catalog {
        #[arg(long, help = "Path to a TOML catalog override file")]
        file: Option<String>,
    },
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Inspect { path, catalog } => commands::inspect::run(&path, catalog.as_deref()),
        Command::Smoke => commands::smoke::run(),
        Command::Catalog { file } => commands::catalog::run(file.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
