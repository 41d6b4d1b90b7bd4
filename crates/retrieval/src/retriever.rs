//! Query-time retrieval over a [`RetrievalContext`].

use crate::context::RetrievalContext;
use crate::index::FlatIndex;
use crate::types::RetrievedChunk;
use std::borrow::Cow;
use storyloom_core::{AppError, AppResult};

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 5;

impl RetrievalContext {
    /// The `k` chunk texts nearest to `query`, nearest first.
    ///
    /// A known category restricts the search to its chunks; an unknown one
    /// falls back to the whole corpus. Failures are logged and yield an
    /// empty result.
    pub async fn retrieve(&self, query: &str, category: Option<&str>, k: usize) -> Vec<String> {
        self.retrieve_scored(query, category, k)
            .await
            .into_iter()
            .map(|hit| hit.text)
            .collect()
    }

    /// Like [`retrieve`](Self::retrieve), with positions and distances.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        category: Option<&str>,
        k: usize,
    ) -> Vec<RetrievedChunk> {
        match self.try_retrieve(query, category, k).await {
            Ok(hits) => hits,
            Err(AppError::IndexUnavailable(reason)) => {
                tracing::warn!("Retrieval returned nothing: {}", reason);
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Retrieval failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Retrieval with errors surfaced instead of degraded to empty.
    pub async fn try_retrieve(
        &self,
        query: &str,
        category: Option<&str>,
        k: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let index = self.index.as_ref().ok_or_else(|| {
            AppError::IndexUnavailable("the corpus has no indexed chunks".to_string())
        })?;

        // Global positions searched, in index order; `None` means the full index.
        let positions = match category {
            Some(name) => match self.store.category_positions(name) {
                Some(positions) => Some(positions),
                None => {
                    tracing::debug!("Unknown category '{}', searching all chunks", name);
                    None
                }
            },
            None => None,
        };

        if positions.is_some_and(<[usize]>::is_empty) {
            tracing::debug!("Category {:?} has no chunks", category);
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query).await?;

        let searched: Cow<'_, FlatIndex> = match positions {
            Some(positions) => match index.subset(positions)? {
                Some(transient) => Cow::Owned(transient),
                None => return Ok(Vec::new()),
            },
            None => Cow::Borrowed(index),
        };

        let hits = searched.search(&query_vector, k)?;

        let results = hits
            .into_iter()
            .map(|hit| {
                let position = positions.map_or(hit.position, |p| p[hit.position]);
                let text = self
                    .store
                    .chunk(position)
                    .map(|c| c.text().to_string())
                    .ok_or_else(|| {
                        AppError::Index(format!("Index position {} has no chunk", position))
                    })?;
                Ok(RetrievedChunk {
                    position,
                    distance: hit.distance,
                    text,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(
            category = category.unwrap_or("*"),
            k,
            hits = results.len(),
            "Retrieved chunks"
        );

        Ok(results)
    }
}
