//! History command handler.

use super::print_json;
use clap::Args;
use serde::Serialize;
use storyloom_core::{config::AppConfig, AppResult};
use storyloom_story::{JsonFileSessionStore, SessionStore, StorySession};

/// List recorded story sessions
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Only show sessions for this user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Show at most this many of the most recent sessions
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HistoryEntry<'a> {
    session_id: &'a str,
    #[serde(flatten)]
    session: &'a StorySession,
}

impl HistoryCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing history command");

        let store = JsonFileSessionStore::for_workspace(&config.workspace);
        tracing::debug!("Reading sessions from {:?}", store.path());
        let mut sessions: Vec<(String, StorySession)> = store
            .list()?
            .into_iter()
            .filter(|(_, s)| self.user.as_ref().map_or(true, |u| &s.user == u))
            .collect();

        if let Some(limit) = self.limit {
            let skip = sessions.len().saturating_sub(limit);
            sessions.drain(..skip);
        }

        if self.json {
            let entries: Vec<HistoryEntry<'_>> = sessions
                .iter()
                .map(|(id, session)| HistoryEntry {
                    session_id: id,
                    session,
                })
                .collect();
            return print_json(&entries);
        }

        if sessions.is_empty() {
            println!("No sessions recorded.");
            return Ok(());
        }

        for (id, session) in &sessions {
            println!(
                "{}  {}  {}  [{}]",
                session.timestamp.format("%Y-%m-%d %H:%M:%S"),
                id,
                session.user,
                session.category.as_deref().unwrap_or("-")
            );
            println!("  {}", session.prompt);
        }

        Ok(())
    }
}
