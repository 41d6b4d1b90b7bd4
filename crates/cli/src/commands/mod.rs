//! Command handlers for the storyloom CLI.

pub mod history;
pub mod ingest;
pub mod retrieve;
pub mod stats;
pub mod story;

pub use history::HistoryCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;
pub use stats::StatsCommand;
pub use story::StoryCommand;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> storyloom_core::AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
