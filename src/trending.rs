//! "Trending" picks: a uniform random sample of the whole catalog.
//!
//! There is no popularity signal behind this; every product is equally
//! likely to be drawn.
use rand::Rng;
use rand::seq::index;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, Product};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrendingError {
    #[error("cannot sample {requested} trending products from a catalog of {available}")]
    InsufficientData { requested: usize, available: usize },
}

/// Draw `k` distinct products without replacement, using `rng`.
pub fn sample_trending<R: Rng + ?Sized>(
    catalog: &Catalog,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Product>, TrendingError> {
    let available = catalog.len();
    if available < k {
        return Err(TrendingError::InsufficientData {
            requested: k,
            available,
        });
    }

    let products = catalog.products();
    let picked: Vec<Product> = index::sample(rng, available, k)
        .into_iter()
        .map(|i| products[i].clone())
        .collect();

    debug!("Sampled {} of {available} products", picked.len());
    Ok(picked)
}
