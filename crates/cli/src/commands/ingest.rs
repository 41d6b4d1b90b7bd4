//! Ingest command handler.

use super::print_json;
use clap::Args;
use std::path::PathBuf;
use storyloom_core::{config::AppConfig, AppResult};

/// Build the corpus index from the document directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Corpus root (default: `corpus_dir` from retrieval.yaml, i.e. books/)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Output the build report as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");
        tracing::debug!("Ingest options: {:?}", self);

        let report = storyloom_retrieval::ingest(&config.workspace, self.corpus.as_deref()).await?;

        if self.json {
            return print_json(&report);
        }

        println!(
            "Indexed {} chunks from {} documents in {} categories ({} skipped) in {:.2}s",
            report.chunks_indexed,
            report.documents_indexed,
            report.categories.len(),
            report.documents_skipped,
            report.duration_secs
        );

        if !report.categories.is_empty() {
            let names: Vec<&str> = report.categories.iter().map(String::as_str).collect();
            println!("Categories: {}", names.join(", "));
        }

        for warning in &report.warnings {
            println!("warning: {}", warning);
        }

        Ok(())
    }
}
