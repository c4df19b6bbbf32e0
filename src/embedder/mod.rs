/// Embedder trait and shared types for text embedding.
pub mod download;
pub mod mock;
pub mod onnx;
pub mod provider;
pub mod tokenizer;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

impl EmbedderError {
    /// Whether this error came from initializing the model rather than from
    /// embedding a particular input.
    #[must_use]
    pub fn is_model_load(&self) -> bool {
        matches!(self, Self::ModelLoadFailed(_))
    }
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`. Output must be a pure function of the input text: the
/// i-th vector of `embed_batch` equals `embed` of the i-th text.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors, preserving order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
