//! Apibot CLI: entry point.
//!
//! # Commands
//!
//! - `apibot chat [-m MESSAGE] [-u USERNAME]`: chat (single-shot or REPL)
//! - `apibot apis list`: show registered API tools
//! - `apibot apis add <JSON|@FILE>`: validate and store an API definition
//! - `apibot init`: write the default config and data directories

mod apis_cmd;
mod helpers;
mod init;
mod repl;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use apibot_agent::{ChatRuntime, ChatSession};
use apibot_core::config::{load_config, Config};
use apibot_providers::http_provider::create_provider;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Apibot: chat assistant that routes to agents backed by any JSON API
#[derive(Parser)]
#[command(name = "apibot", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.apibot/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Name the assistant uses for you (overrides chat.username)
        #[arg(short, long)]
        username: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Manage API tool definitions
    Apis {
        #[command(subcommand)]
        action: apis_cmd::ApisCommands,
    },

    /// Initialize configuration and data directories
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Chat {
            message,
            username,
            logs,
        } => {
            init_logging(logs);
            let config = load_config(config_path.as_deref());
            run_chat(config, message, username).await
        }
        Commands::Apis { action } => {
            init_logging(false);
            let config = load_config(config_path.as_deref());
            apis_cmd::dispatch(action, &config)
        }
        Commands::Init => init::run(config_path),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(config: Config, message: Option<String>, username: Option<String>) -> Result<()> {
    let runtime = Arc::new(build_runtime(&config)?);
    let username = username.unwrap_or_else(|| config.chat.username.clone());
    let mut session = ChatSession::new(runtime, "cli", username);

    match message {
        Some(msg) => {
            info!("processing single message");
            let response = session.handle(&msg).await;
            helpers::print_response(&response);
        }
        None => repl::run(session).await?,
    }

    Ok(())
}

/// Build the shared chat runtime from the loaded configuration.
fn build_runtime(config: &Config) -> Result<ChatRuntime> {
    let model = &config.agents.defaults.model;
    let providers_map = config.providers.to_map();
    let provider = create_provider(model, &providers_map).map_err(|e| anyhow::anyhow!(e))?;
    Ok(ChatRuntime::from_config(config, Arc::new(provider)))
}

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins when set; otherwise `--logs` turns on debug output.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("apibot_cli=debug,apibot_agent=debug,apibot_providers=debug,apibot_core=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
