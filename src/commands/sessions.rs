use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::{MockprepError, Result};
use crate::storage::{HistoryItem, SessionStore, SessionSummary};
use anyhow::Context;
use colored::Colorize;
use prettytable::{format, Table};
use std::path::Path;

/// Handle session commands
pub async fn handle_session(config: &Config, command: SessionCommand) -> Result<()> {
    let store = SessionStore::connect(&config.store);

    match command {
        SessionCommand::Show { id, json } => {
            let Some(state) = store.get_session(&id).await else {
                println!("{}", format!("Session {} not found.", id).yellow());
                return Ok(());
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&state).map_err(MockprepError::Serialization)?
                );
                return Ok(());
            }

            println!("{} {}", "Session:".bold(), id.cyan());
            println!("{} {}", "Difficulty:".bold(), state.difficulty);
            for (index, item) in state.exchanges().into_iter().enumerate() {
                let line = serde_json::to_string(item).map_err(MockprepError::Serialization)?;
                println!("  {}. {}", index + 1, line);
            }
        }
        SessionCommand::List { user, json } => {
            let sessions = store.get_user_sessions(&user).await;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&sessions)
                        .map_err(MockprepError::Serialization)?
                );
                return Ok(());
            }

            if sessions.is_empty() {
                println!("{}", "No sessions found.".yellow());
                return Ok(());
            }

            print_sessions_table(&sessions);
        }
        SessionCommand::Save {
            id,
            difficulty,
            items,
            user,
        } => {
            let items = read_items(&items)?;
            store
                .update_session(&id, &difficulty, items, user.as_deref())
                .await?;
            println!("{}", format!("Saved session {}", id).green());
        }
        SessionCommand::SetDifficulty { id, difficulty } => {
            let Some(state) = store.load_session(&id).await? else {
                return Err(MockprepError::Storage(format!("Session {} not found", id)).into());
            };
            store
                .update_session(&id, &difficulty, state.items, None)
                .await?;
            println!(
                "{}",
                format!("Session {} difficulty set to {}", id, difficulty).green()
            );
        }
    }

    Ok(())
}

/// Read a JSON array of history items from a file
fn read_items(path: &Path) -> Result<Vec<HistoryItem>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file {}", path.display()))?;
    let items: Vec<HistoryItem> = serde_json::from_str(&contents)
        .with_context(|| format!("Items file {} must hold a JSON array", path.display()))?;
    Ok(items)
}

fn print_sessions_table(sessions: &[SessionSummary]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Topic".bold(),
        "Difficulty".bold(),
        "Questions".bold(),
        "Created".bold()
    ]);

    for session in sessions {
        let created = session
            .created_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            session.session_id.cyan(),
            session.topic,
            session.difficulty,
            session.questions_count,
            created
        ]);
    }

    println!("\nPractice Sessions:");
    table.printstd();
    println!();
}
