// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! credvault - local encrypted API credential vault.
//!
//! Binary entry point. Every subcommand opens the vault, runs one operation
//! and closes it again.

mod commands;
mod output;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use credvault_config::CredvaultConfig;
use credvault_core::VaultError;

/// Local encrypted API credential vault with audited rotation.
#[derive(Parser, Debug)]
#[command(name = "credvault", version, about, long_about = None)]
struct Cli {
    /// Configuration file (replaces the default search path).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Vault file (overrides `vault.path`).
    #[arg(long, global = true, value_name = "FILE")]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new vault.
    Init,
    /// Store a new credential.
    Add(AddArgs),
    /// Print a credential value.
    Get {
        name: String,
        /// Which value to print.
        #[arg(long, value_enum, default_value_t = output::Field::Secret)]
        field: output::Field,
    },
    /// List credentials without their values.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a credential and its rotation history.
    Delete {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Change credential metadata.
    Update(UpdateArgs),
    /// Replace credential values by hand (recorded as a manual rotation).
    Set(SetArgs),
    /// Rotate a credential through its provider plugin.
    Rotate {
        name: String,
        /// Plugin time limit in seconds (default: `rotation.timeout_secs`).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Actor tag recorded in the audit trail.
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Show rotation history, newest first.
    History {
        name: String,
        /// Number of records (default: `rotation.history_limit`).
        #[arg(short = 'n', long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// List available rotation plugins.
    Plugins,
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,
    /// Provider type; selects the rotation plugin.
    #[arg(long = "type", short = 't', default_value = "generic")]
    provider_type: String,
    /// Secret value (prefer --secret-stdin or the prompt).
    #[arg(long, conflicts_with = "secret_stdin")]
    secret: Option<String>,
    /// Read the secret value from the first line of stdin.
    #[arg(long)]
    secret_stdin: bool,
    /// Public (non-secret) value, such as a publishable key.
    #[arg(long)]
    public: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long = "env")]
    environment: Option<String>,
    /// Plugin configuration, repeatable.
    #[arg(long = "config-value", short = 'c', value_name = "KEY=VALUE", value_parser = output::parse_pair)]
    config_values: Vec<(String, String)>,
    /// Provider-side id of the current key.
    #[arg(long)]
    key_id: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    name: String,
    #[arg(long = "type", short = 't')]
    provider_type: Option<String>,
    /// New environment tag; an empty value clears it.
    #[arg(long = "env")]
    environment: Option<String>,
    /// Replace the whole plugin configuration, repeatable.
    #[arg(long = "config-value", short = 'c', value_name = "KEY=VALUE", value_parser = output::parse_pair)]
    config_values: Vec<(String, String)>,
    /// Remove all plugin configuration.
    #[arg(long, conflicts_with = "config_values")]
    clear_config: bool,
    /// New notes; an empty value clears them.
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct SetArgs {
    name: String,
    #[arg(long, conflicts_with = "secret_stdin")]
    secret: Option<String>,
    #[arg(long)]
    secret_stdin: bool,
    #[arg(long)]
    public: Option<String>,
    #[arg(long)]
    url: Option<String>,
    /// Provider-side id of the new key.
    #[arg(long)]
    key_id: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<CredvaultConfig, ()> {
    let loaded = match &cli.config {
        Some(path) => credvault_config::load_and_validate_path(path),
        None => credvault_config::load_and_validate(),
    };
    let mut config = loaded.map_err(|errors| credvault_config::render_errors(&errors))?;
    if let Some(path) = &cli.vault {
        config.vault.path = path.display().to_string();
    }
    Ok(config)
}

/// Initializes the tracing subscriber on stderr so stdout only carries values.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("credvault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli, config: CredvaultConfig) -> Result<(), VaultError> {
    use commands::{credentials, rotation};

    match cli.command {
        Commands::Init => credentials::init(&config).await,
        Commands::Add(args) => credentials::add(&config, args).await,
        Commands::Get { name, field } => credentials::get(&config, &name, field).await,
        Commands::List { json } => credentials::list(&config, json).await,
        Commands::Delete { name, yes } => credentials::delete(&config, &name, yes).await,
        Commands::Update(args) => credentials::update(&config, args).await,
        Commands::Set(args) => credentials::set(&config, args).await,
        Commands::Rotate {
            name,
            timeout,
            actor,
        } => rotation::rotate(&config, &name, timeout, &actor).await,
        Commands::History { name, limit, json } => {
            rotation::history(&config, &name, limit, json).await
        }
        Commands::Plugins => {
            rotation::plugins();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    colored::control::set_override(std::io::stderr().is_terminal());

    let Ok(config) = resolve_config(&cli) else {
        return ExitCode::FAILURE;
    };
    init_tracing(&config.logging.level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
