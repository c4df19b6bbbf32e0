//! # semrank — category-driven semantic product ranking
//!
//! Ranks the products of a chosen category by sentence-embedding similarity
//! to the category label, and draws a random "trending" sample from the
//! whole catalog.
//!
//! ## Architecture
//!
//! - **[`config`]** — JSON configuration loading and validation
//! - **[`catalog`]** — Schema-checked CSV catalog with a memoized store
//! - **[`embedder`]** — Text embedding via ONNX Runtime (all-MiniLM-L6-v2)
//! - **[`ranking`]** — Cosine-similarity ranking of a category's products
//! - **[`trending`]** — Uniform random sampling without replacement
//! - **[`analysis`]** — `get_categories` / `run_analysis` surface for UI shells

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod embedder;
pub mod ranking;
pub mod trending;
