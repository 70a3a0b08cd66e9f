//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use apibot_agent::session::is_exit_command;
use apibot_agent::ChatSession;

use crate::helpers;

/// Run the interactive REPL loop until an exit command, Ctrl-C, or Ctrl-D.
pub async fn run(mut session: ChatSession) -> Result<()> {
    helpers::print_banner(session.context().username(), api_count(&session));

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        debug!(input = trimmed, "processing input");
        helpers::print_thinking();
        let response = session.handle(trimmed).await;
        helpers::clear_thinking();
        helpers::print_response(&response);
    }

    save_history(&mut editor);

    Ok(())
}

fn api_count(session: &ChatSession) -> usize {
    session.runtime().toolbox().apis().len()
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// `~/.apibot/history/cli_history`
fn history_path() -> std::path::PathBuf {
    apibot_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".apibot"));
        assert!(path.ends_with("history/cli_history"));
    }
}
