//! Shared CLI helpers: path expansion, response printing, banner.

use std::path::PathBuf;

use colored::Colorize;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print an assistant reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "Apibot".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(username: &str, api_count: usize) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Apibot".cyan().bold(), version.dimmed());
    println!(
        "{}",
        format!("Hi {username}! {api_count} API tools loaded.").dimmed()
    );
    println!(
        "{}",
        "Type a message, \"!apis\" to list tools, \"!add_api {json}\" to add one, or \"exit\" to quit."
            .dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while a turn runs.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/.apibot/config.json");
        assert!(result.ends_with(".apibot/config.json"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/etc/apibot.json");
        assert_eq!(result, PathBuf::from("/etc/apibot.json"));
    }

    #[test]
    fn expand_tilde_bare() {
        let result = expand_tilde("~");
        assert!(!result.to_string_lossy().contains('~'));
    }
}
