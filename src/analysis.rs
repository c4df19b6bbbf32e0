//! Caller-facing surface: category listing and the three-agent analysis.
//!
//! An analysis runs the user-profile agent (category filter), the product
//! ranking agent (semantic ranking) and the trending predictor (random
//! sample), in that order. Each agent leaves a short thought that is both
//! logged and returned so a UI shell can show it.
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogStore, DataLoadError, Product};
use crate::config::Config;
use crate::embedder::EmbedderError;
use crate::embedder::provider::EmbeddingProvider;
use crate::ranking::{RankingEngine, RankingError, ScoredProduct};
use crate::trending::{TrendingError, sample_trending};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    #[error(transparent)]
    ModelLoad(#[from] EmbedderError),

    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error(transparent)]
    Trending(#[from] TrendingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    UserProfile,
    ProductRanking,
    TrendingPredictor,
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UserProfile => "User Profile Agent",
            Self::ProductRanking => "Product Ranking Agent",
            Self::TrendingPredictor => "Trending Predictor",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentThought {
    pub agent: Agent,
    pub message: String,
}

impl AgentThought {
    fn new(agent: Agent, message: impl Into<String>) -> Self {
        let thought = Self {
            agent,
            message: message.into(),
        };
        info!("{thought}");
        thought
    }
}

impl fmt::Display for AgentThought {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.agent, self.message)
    }
}

/// Output of one `run_analysis` call.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub category: String,
    pub thoughts: Vec<AgentThought>,
    pub ranking: Vec<ScoredProduct>,
    pub trending: Vec<Product>,
}

/// Ties the catalog, the embedding model and the ranking engine together.
pub struct Recommender {
    catalog: CatalogStore,
    embeddings: Arc<EmbeddingProvider>,
    engine: RankingEngine,
    trending_count: usize,
}

impl Recommender {
    pub fn new(
        catalog: CatalogStore,
        embeddings: Arc<EmbeddingProvider>,
        trending_count: usize,
    ) -> Self {
        let engine = RankingEngine::new(Arc::clone(&embeddings));
        Self {
            catalog,
            embeddings,
            engine,
            trending_count,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CatalogStore::new(&config.catalog_path),
            Arc::new(EmbeddingProvider::from_config(config)),
            config.trending_count,
        )
    }

    /// Load the catalog and the model up front so startup failures surface
    /// before the first request.
    pub fn warm_up(&self) -> Result<(), AnalysisError> {
        self.catalog.load()?;
        self.embeddings.model()?;
        Ok(())
    }

    /// Selectable categories, in first-appearance order.
    pub fn get_categories(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(self.catalog.categories()?)
    }

    /// Random trending picks from the full catalog.
    pub fn trending<R: Rng + ?Sized>(
        &self,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<Product>, AnalysisError> {
        Ok(sample_trending(self.catalog.load()?, k, rng)?)
    }

    pub fn run_analysis(&self, category: &str) -> Result<Analysis, AnalysisError> {
        self.run_analysis_with_rng(category, &mut rand::rng())
    }

    /// Full analysis with an explicit random source for the trending sample.
    pub fn run_analysis_with_rng<R: Rng + ?Sized>(
        &self,
        category: &str,
        rng: &mut R,
    ) -> Result<Analysis, AnalysisError> {
        let catalog = self.catalog.load()?;
        let mut thoughts = Vec::with_capacity(3);

        thoughts.push(AgentThought::new(
            Agent::UserProfile,
            format!("Detected interest in category: {category}"),
        ));

        thoughts.push(AgentThought::new(
            Agent::ProductRanking,
            "Ranking products using semantic similarity...",
        ));
        let ranking = self.engine.rank(category, catalog)?;

        thoughts.push(AgentThought::new(
            Agent::TrendingPredictor,
            "Estimating top trending products...",
        ));
        let trending = sample_trending(catalog, self.trending_count, rng)?;

        Ok(Analysis {
            category: category.to_string(),
            thoughts,
            ranking,
            trending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::embedder::mock::MockEmbedder;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn recommender(csv: &str, trending_count: usize) -> Recommender {
        Recommender::new(
            CatalogStore::with_catalog(Catalog::from_reader(csv.as_bytes()).unwrap()),
            Arc::new(EmbeddingProvider::with_embedder(Arc::new(
                MockEmbedder::default(),
            ))),
            trending_count,
        )
    }

    const CSV: &str = "name,category,price\n\
        Running Shoes,Footwear,50\n\
        Lightweight Trainers,Footwear,60\n\
        Winter Coat,Apparel,120\n";

    #[test]
    fn test_thoughts_in_agent_order() {
        let rec = recommender(CSV, 3);
        let analysis = rec
            .run_analysis_with_rng("Footwear", &mut StdRng::seed_from_u64(1))
            .unwrap();

        let agents: Vec<Agent> = analysis.thoughts.iter().map(|t| t.agent).collect();
        assert_eq!(
            agents,
            vec![
                Agent::UserProfile,
                Agent::ProductRanking,
                Agent::TrendingPredictor
            ]
        );
        assert_eq!(
            analysis.thoughts[0].to_string(),
            "[User Profile Agent] Detected interest in category: Footwear"
        );
    }

    #[test]
    fn test_analysis_contents() {
        let rec = recommender(CSV, 2);
        let analysis = rec
            .run_analysis_with_rng("Apparel", &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(analysis.category, "Apparel");
        assert_eq!(analysis.ranking.len(), 1);
        assert_eq!(analysis.trending.len(), 2);
    }

    #[test]
    fn test_trending_shortfall_fails_analysis() {
        let rec = recommender(CSV, 4);
        let err = rec.run_analysis("Footwear").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Trending(TrendingError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_missing_catalog_surfaces_data_load_error() {
        let rec = Recommender::new(
            CatalogStore::new("/nonexistent/products.csv"),
            Arc::new(EmbeddingProvider::with_embedder(Arc::new(
                MockEmbedder::default(),
            ))),
            3,
        );
        assert!(matches!(
            rec.get_categories(),
            Err(AnalysisError::DataLoad(DataLoadError::NotFound(_)))
        ));
    }

    #[test]
    fn test_analysis_serializes_flat_products() {
        let rec = recommender(CSV, 1);
        let analysis = rec
            .run_analysis_with_rng("Footwear", &mut StdRng::seed_from_u64(5))
            .unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["thoughts"][1]["agent"], "product_ranking");
        assert!(json["ranking"][0]["name"].is_string());
        assert!(json["ranking"][0]["score"].is_number());
    }
}
