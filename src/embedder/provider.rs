//! Process-wide embedding model handle.
//!
//! The model is constructed on first use and reused for every later call.
//! Initialization runs at most once even under concurrent first access; a
//! failed initialization is not cached, so a later call may retry.
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info};

use super::mock::MockEmbedder;
use super::onnx::OnnxEmbedder;
use super::{Embedder, EmbedderError, download};
use crate::config::{Config, ProviderKind};

type Loader = Box<dyn Fn() -> Result<Arc<dyn Embedder>, EmbedderError> + Send + Sync>;

/// Lazily initialized, shareable embedding model.
pub struct EmbeddingProvider {
    loader: Loader,
    model: OnceLock<Arc<dyn Embedder>>,
    init_lock: Mutex<()>,
}

impl EmbeddingProvider {
    /// Build a provider that calls `loader` the first time a model is needed.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Embedder>, EmbedderError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            model: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Provider around an already constructed embedder.
    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            loader: Box::new(|| -> Result<Arc<dyn Embedder>, EmbedderError> {
                Err(EmbedderError::ModelLoadFailed(
                    "provider was built pre-initialized".to_string(),
                ))
            }),
            model: OnceLock::from(embedder),
            init_lock: Mutex::new(()),
        }
    }

    /// Provider for the backend selected in `config`.
    pub fn from_config(config: &Config) -> Self {
        let model = config.model.clone();
        let compute = config.compute.clone();

        Self::new(move || -> Result<Arc<dyn Embedder>, EmbedderError> {
            match model.provider {
                ProviderKind::Mock => {
                    info!("Using mock embedder ({} dims)", model.dimensions);
                    Ok(Arc::new(MockEmbedder::new(model.dimensions)))
                }
                ProviderKind::Onnx => {
                    let dir = Path::new(&model.dir);
                    if model.auto_download && !download::all_files_present(dir) {
                        download::download_model_files(dir).map_err(|e| {
                            EmbedderError::ModelLoadFailed(format!("model download: {e:#}"))
                        })?;
                    }
                    Ok(Arc::new(OnnxEmbedder::new(dir, model.dimensions, &compute)?))
                }
            }
        })
    }

    /// Return the model, loading it on first call.
    pub fn model(&self) -> Result<&Arc<dyn Embedder>, EmbedderError> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        let _guard = self
            .init_lock
            .lock()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("lock poisoned: {e}")))?;

        // Another caller may have finished while we waited.
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        let model = (self.loader)()?;
        info!("Embedding model ready ({} dims)", model.dimensions());
        Ok(self.model.get_or_init(|| model))
    }

    /// Whether the model has been loaded yet.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.model()?.embed(text)
    }

    /// Embed `texts` in one batch. The i-th vector belongs to the i-th text.
    pub fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let model = self.model()?;
        let vectors = model.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(EmbedderError::InferenceFailed(format!(
                "batch returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        debug!("Embedded {} texts", vectors.len());
        Ok(vectors)
    }

    pub fn dimensions(&self) -> Result<usize, EmbedderError> {
        Ok(self.model()?.dimensions())
    }
}
