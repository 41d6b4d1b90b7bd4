//! Stats command handler.

use super::print_json;
use clap::Args;
use storyloom_core::{config::AppConfig, AppResult};

/// Show corpus snapshot statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = storyloom_retrieval::stats(&config.workspace)?;

        if self.json {
            return print_json(&stats);
        }

        println!("Chunks:     {}", stats.chunks);
        println!(
            "Dimension:  {}",
            stats.dimension.map_or_else(|| "-".to_string(), |d| d.to_string())
        );
        println!("Chunk size: {} words", stats.chunk_size);
        println!("Embedder:   {}", stats.embedder);
        println!("File size:  {} bytes", stats.file_size_bytes);
        println!("Categories:");
        for (name, count) in &stats.categories {
            println!("  {:<20} {}", name, count);
        }

        Ok(())
    }
}
