/// ONNX Runtime embedder using the `ort` crate.
///
/// Loads the all-MiniLM-L6-v2 ONNX export, runs inference over padded
/// batches, applies mean pooling with the attention mask, and L2-normalizes
/// each row.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use super::tokenizer::{SentenceTokenizer, TokenizerOutput};
use super::{Embedder, EmbedderError};
use crate::config::ComputeConfig;

/// ONNX-backed embedder implementing the `Embedder` trait.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: SentenceTokenizer,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Create a new `OnnxEmbedder` by loading a model from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in `model_dir`.
    pub fn new(
        model_dir: &Path,
        dimensions: usize,
        compute: &ComputeConfig,
    ) -> Result<Self, EmbedderError> {
        let model_path = model_dir.join("model.onnx");

        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!("Initializing ONNX Runtime...");

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(compute.intra_threads)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .with_inter_threads(compute.inter_threads)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        info!("ONNX model loaded successfully");

        let tokenizer = SentenceTokenizer::from_model_dir(model_dir)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("tokenizer error: {e}")))?;

        info!(
            "Tokenizer loaded (vocab size: {}, max length: {})",
            tokenizer.vocab_size(),
            tokenizer.max_length()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
        })
    }

    /// Run one forward pass over equally padded rows.
    fn run(&self, rows: &[TokenizerOutput]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let Some(first) = rows.first() else {
            return Ok(vec![]);
        };
        let batch = rows.len();
        let seq_len = first.input_ids.len();
        if rows.iter().any(|r| r.input_ids.len() != seq_len) {
            return Err(EmbedderError::TokenizerError(
                "batch rows have unequal lengths".to_string(),
            ));
        }

        let input_ids = flatten(rows, |r| r.input_ids.as_slice());
        let attention_mask = flatten(rows, |r| r.attention_mask.as_slice());
        let token_type_ids = flatten(rows, |r| r.token_type_ids.as_slice());

        let input_ids_val = Tensor::from_array(([batch, seq_len], input_ids))
            .map_err(|e| EmbedderError::InferenceFailed(format!("input_ids error: {e}")))?;
        let attention_mask_val = Tensor::from_array(([batch, seq_len], attention_mask.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("attention_mask error: {e}")))?;
        let token_type_ids_val = Tensor::from_array(([batch, seq_len], token_type_ids))
            .map_err(|e| EmbedderError::InferenceFailed(format!("token_type_ids error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_val,
                "attention_mask" => attention_mask_val,
                "token_type_ids" => token_type_ids_val,
            ])
            .map_err(|e| EmbedderError::InferenceFailed(format!("inference failed: {e}")))?;

        // last_hidden_state: [batch, seq_len, hidden]
        let (_shape, hidden_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        let expected = batch * seq_len * self.dimensions;
        if hidden_data.len() != expected {
            return Err(EmbedderError::InferenceFailed(format!(
                "unexpected output size {} (expected {expected})",
                hidden_data.len()
            )));
        }

        let row_stride = seq_len * self.dimensions;
        Ok((0..batch)
            .map(|b| {
                let hidden = &hidden_data[b * row_stride..(b + 1) * row_stride];
                let mask = &attention_mask[b * seq_len..(b + 1) * seq_len];
                l2_normalize(&mean_pooling(hidden, mask, seq_len, self.dimensions))
            })
            .collect())
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| EmbedderError::TokenizerError(format!("tokenization failed: {e}")))?;

        self.run(std::slice::from_ref(&tokens))?
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("no embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let rows = self
            .tokenizer
            .tokenize_batch(texts)
            .map_err(|e| EmbedderError::TokenizerError(format!("tokenization failed: {e}")))?;

        debug!("Embedding batch of {} texts", rows.len());
        self.run(&rows)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Concatenate one column of every row into a row-major buffer.
fn flatten(rows: &[TokenizerOutput], pick: impl Fn(&TokenizerOutput) -> &[i64]) -> Vec<i64> {
    rows.iter().flat_map(|r| pick(r).iter().copied()).collect()
}

/// Mean pooling over hidden states weighted by attention mask.
///
/// `hidden_data` is a flat array with shape `[seq_len, hidden_size]`.
fn mean_pooling(
    hidden_data: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut result = vec![0.0f32; hidden_size];
    let mut mask_sum: f32 = 0.0;

    for t in 0..seq_len {
        let mask = attention_mask[t] as f32;
        mask_sum += mask;

        for h in 0..hidden_size {
            result[h] += hidden_data[t * hidden_size + h] * mask;
        }
    }

    if mask_sum > 0.0 {
        for v in &mut result {
            *v /= mask_sum;
        }
    }

    result
}

/// L2-normalize a vector, returning the normalized copy.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return vec.to_vec();
    }

    let inv_norm = 1.0 / norm_sq.sqrt();
    vec.iter().map(|v| v * inv_norm).collect()
}
