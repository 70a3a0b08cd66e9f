//! `apibot apis`: manage API tool definitions from the CLI.
//!
//! - `apibot apis list`: show every API tool chat sessions will load
//! - `apibot apis add <JSON|@FILE>`: validate a definition and store it

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use apibot_agent::tools::api::{builtin_apis, ApiConfig, ApiStore};
use apibot_agent::Toolbox;
use apibot_core::config::Config;
use apibot_core::utils::expand_home;

// ─────────────────────────────────────────────
// Subcommand enum
// ─────────────────────────────────────────────

#[derive(Subcommand)]
pub enum ApisCommands {
    /// List built-in and stored API tools
    List,

    /// Validate and store an API definition (inline JSON or @path/to/file.json)
    Add {
        definition: String,
    },
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

pub fn dispatch(cmd: ApisCommands, config: &Config) -> Result<()> {
    let store = ApiStore::new(expand_home(&config.tools.apis_file));
    match cmd {
        ApisCommands::List => list(config, &store),
        ApisCommands::Add { definition } => add(&definition, &store),
    }
}

/// `apibot apis list`
fn list(config: &Config, store: &ApiStore) -> Result<()> {
    let mut rows: Vec<(ApiConfig, &'static str)> = Vec::new();
    if config.tools.builtin_apis {
        rows.extend(
            builtin_apis()
                .context("built-in API definitions are malformed")?
                .into_iter()
                .map(|c| (c, "built-in")),
        );
    }
    for stored in store.load()? {
        rows.retain(|(c, _)| c.name != stored.name);
        rows.push((stored, "stored"));
    }

    println!();
    println!("{}", "API tools".cyan().bold());
    println!("{}", format!("  store: {}", store.path().display()).dimmed());
    println!();

    if rows.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (api, origin) in &rows {
        println!(
            "  {} {:<22} {:<6} {}",
            "•".green(),
            api.name.bold(),
            api.method.as_str(),
            api.url.dimmed()
        );
        if !api.description.is_empty() {
            println!("      {} {}", api.description, format!("[{origin}]").dimmed());
        }
    }
    println!();
    Ok(())
}

/// `apibot apis add`
fn add(definition: &str, store: &ApiStore) -> Result<()> {
    let raw = read_definition(definition)?;

    // Validate the same way a chat session would, natives reserved.
    let toolbox = Toolbox::with_natives();
    let (_, config) = toolbox.apis().register_json(&raw)?;

    store.upsert(&config)?;
    println!(
        "  {} stored API tool '{}' in {}",
        "✓".green(),
        config.name,
        store.path().display()
    );
    Ok(())
}

/// Inline JSON, or the contents of `@path`.
fn read_definition(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let path = expand_home(path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))
        }
        None => Ok(arg.to_string()),
    }
}
