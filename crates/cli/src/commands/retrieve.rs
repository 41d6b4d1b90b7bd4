//! Retrieve command handler.

use super::print_json;
use clap::Args;
use storyloom_core::{config::AppConfig, AppResult};
use storyloom_retrieval::config::load_config;

/// Find the chunks nearest to a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub query: String,

    /// Restrict the search to one category (unknown categories search everything)
    #[arg(long)]
    pub category: Option<String>,

    /// Number of chunks to return (default: `top_k` from retrieval.yaml)
    #[arg(short = 'k', long = "top-k")]
    pub top_k: Option<usize>,

    /// Output hits with positions and distances as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");
        tracing::debug!("Retrieve options: {:?}", self);

        let k = match self.top_k {
            Some(k) => k,
            None => load_config(&config.workspace)?.top_k,
        };

        let context = storyloom_retrieval::open(&config.workspace).await?;
        let hits = context
            .retrieve_scored(&self.query, self.category.as_deref(), k)
            .await;

        if self.json {
            return print_json(&hits);
        }

        if hits.is_empty() {
            println!("No matching chunks.");
            return Ok(());
        }

        for (rank, hit) in hits.iter().enumerate() {
            println!("[{}] chunk {} (distance {:.4})", rank + 1, hit.position, hit.distance);
            println!("{}", hit.text);
            println!();
        }

        Ok(())
    }
}
