//! Semantic ranking of a category's products.
//!
//! The category label itself is the query: it is embedded once, every
//! candidate name is embedded in a single batch, and candidates are ordered
//! by cosine similarity to the query.
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, Product};
use crate::embedder::EmbedderError;
use crate::embedder::provider::EmbeddingProvider;

/// Which embedding call failed during a ranking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingStage {
    Query,
    Candidates,
}

impl std::fmt::Display for RankingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => f.write_str("query embedding"),
            Self::Candidates => f.write_str("candidate embedding"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("{stage} failed: {source}")]
    Embedding {
        stage: RankingStage,
        #[source]
        source: EmbedderError,
    },

    #[error("vector dimension mismatch: query has {query}, candidate {index} has {candidate}")]
    DimensionMismatch {
        query: usize,
        candidate: usize,
        index: usize,
    },
}

impl RankingError {
    /// The stage that failed, when the failure came from the embedder.
    #[must_use]
    pub fn stage(&self) -> Option<RankingStage> {
        match self {
            Self::Embedding { stage, .. } => Some(*stage),
            Self::DimensionMismatch { .. } => None,
        }
    }
}

/// A product with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: Product,
    pub score: f32,
}

/// Cosine similarity of two equal-length vectors.
///
/// Returns 0 when either vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Scores and orders catalog products for a category.
pub struct RankingEngine {
    embeddings: Arc<EmbeddingProvider>,
}

impl RankingEngine {
    pub fn new(embeddings: Arc<EmbeddingProvider>) -> Self {
        Self { embeddings }
    }

    /// Rank every product of `category` by similarity to the category label.
    ///
    /// An unknown category yields an empty result. Any embedding failure
    /// fails the whole request; no partial ranking is returned.
    pub fn rank(
        &self,
        category: &str,
        catalog: &Catalog,
    ) -> Result<Vec<ScoredProduct>, RankingError> {
        let candidates = catalog.filter_by_category(category);
        if candidates.is_empty() {
            info!("No products in category {category:?}");
            return Ok(Vec::new());
        }

        let query = self
            .embeddings
            .embed_one(category)
            .map_err(|source| RankingError::Embedding {
                stage: RankingStage::Query,
                source,
            })?;

        let names: Vec<&str> = candidates.iter().map(|p| p.name.as_str()).collect();
        let vectors =
            self.embeddings
                .embed_many(&names)
                .map_err(|source| RankingError::Embedding {
                    stage: RankingStage::Candidates,
                    source,
                })?;

        let mut ranked = Vec::with_capacity(candidates.len());
        for (index, (product, vector)) in candidates.into_iter().zip(&vectors).enumerate() {
            if vector.len() != query.len() {
                return Err(RankingError::DimensionMismatch {
                    query: query.len(),
                    candidate: vector.len(),
                    index,
                });
            }
            ranked.push(ScoredProduct {
                product: product.clone(),
                score: cosine_similarity(&query, vector),
            });
        }

        sort_by_score(&mut ranked);
        debug!("Ranked {} products for {category:?}", ranked.len());
        Ok(ranked)
    }
}

/// Descending by score; `sort_by` is stable so ties keep catalog order.
fn sort_by_score(ranked: &mut [ScoredProduct]) {
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
}
