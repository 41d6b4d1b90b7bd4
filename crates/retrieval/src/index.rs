//! Exact nearest-neighbour index under squared Euclidean distance.
//!
//! Vectors are stored contiguously; position `i` in the index is position
//! `i` in whatever chunk sequence the index was built from.

use std::cmp::Ordering;
use storyloom_core::{AppError, AppResult};

/// One search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position within the index
    pub position: usize,

    /// Squared L2 distance to the query
    pub distance: f32,
}

/// Brute-force L2 index over row-major `f32` vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Build an index. Input must be non-empty and share one non-zero dimension.
    pub fn build(vectors: &[Vec<f32>]) -> AppResult<Self> {
        let dimension = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| AppError::Index("Cannot build an index from zero vectors".to_string()))?;

        if dimension == 0 {
            return Err(AppError::Index("Vectors must have at least one dimension".to_string()));
        }

        let mut flat = Vec::with_capacity(vectors.len() * dimension);
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(AppError::Index(format!(
                    "Vector {} has dimension {}, expected {}",
                    i,
                    vector.len(),
                    dimension
                )));
            }
            flat.extend_from_slice(vector);
        }

        Ok(Self {
            dimension,
            vectors: flat,
        })
    }

    /// Rebuild from contiguous storage, as persisted in a snapshot.
    pub fn from_flat(dimension: usize, vectors: Vec<f32>) -> AppResult<Self> {
        if dimension == 0 || vectors.is_empty() || vectors.len() % dimension != 0 {
            return Err(AppError::Index(format!(
                "{} values do not form vectors of dimension {}",
                vectors.len(),
                dimension
            )));
        }
        Ok(Self { dimension, vectors })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors.
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.vectors.get(start..start + self.dimension)
    }

    /// Contiguous row-major storage.
    pub fn as_flat(&self) -> &[f32] {
        &self.vectors
    }

    /// A new index over the given positions, in the order given.
    ///
    /// Local position `j` of the result is `positions[j]` of this index.
    /// Returns `None` when `positions` is empty.
    pub fn subset(&self, positions: &[usize]) -> AppResult<Option<Self>> {
        if positions.is_empty() {
            return Ok(None);
        }

        let mut vectors = Vec::with_capacity(positions.len() * self.dimension);
        for &position in positions {
            let vector = self.vector(position).ok_or_else(|| {
                AppError::Index(format!(
                    "Position {} out of range for index of {} vectors",
                    position,
                    self.len()
                ))
            })?;
            vectors.extend_from_slice(vector);
        }

        Ok(Some(Self {
            dimension: self.dimension,
            vectors,
        }))
    }

    /// The `k` nearest vectors, ascending by distance, ties by position.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(AppError::Index(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| SearchHit {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, compare_hits);
            hits.truncate(k);
        }
        hits.sort_by(compare_hits);

        Ok(hits)
    }
}

fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
