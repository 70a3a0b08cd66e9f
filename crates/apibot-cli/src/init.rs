//! `apibot init`: write the default configuration and data directories.
//!
//! - Creates `~/.apibot/config.json` with defaults (or the `--config` path)
//! - Creates an empty API definitions file and the REPL history directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use apibot_core::config::{get_config_path, load_config, save_config};
use apibot_core::utils::{expand_home, get_data_path};

/// Run the init command.
pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("{}", "Apibot — Setup".cyan().bold());
    println!();

    let config_path = config_path.unwrap_or_else(get_config_path);

    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        let config = load_config(Some(&config_path));
        save_config(&config, Some(&config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let config = load_config(Some(&config_path));
    let apis_file = expand_home(&config.tools.apis_file);
    create_if_missing(&apis_file, "[]\n")?;

    let history_dir = get_data_path().join("history");
    std::fs::create_dir_all(&history_dir)
        .with_context(|| format!("failed to create {}", history_dir.display()))?;
    println!("  {} history dir at {}", "✓".green(), history_dir.display());

    println!();
    println!(
        "{}",
        "  Setup complete! Add a provider API key to the config, then run `apibot chat`.".green()
    );
    println!();

    Ok(())
}

/// Write `content` to `path` unless it already exists.
fn create_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("  {} {} already exists", "✓".green(), path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("  {} created {}", "✓".green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_if_missing_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("apis.json");

        create_if_missing(&path, "[]\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");

        std::fs::write(&path, "[{\"name\":\"kept\"}]").unwrap();
        create_if_missing(&path, "[]\n").unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("kept"));
    }
}
