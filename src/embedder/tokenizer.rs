/// WordPiece tokenizer wrapper around HuggingFace `tokenizers` crate.
///
/// Produces padded id/mask/type rows for the ONNX embedder.
use std::path::Path;

use anyhow::Result;
use tokenizers::{Encoding, Tokenizer};

/// all-MiniLM-L6-v2 was trained with sequences truncated to 256 tokens.
const MAX_SEQ_LENGTH: usize = 256;

/// Wrapper around the HuggingFace tokenizer for BERT-style models.
pub struct SentenceTokenizer {
    inner: Tokenizer,
    max_length: usize,
}

/// Output of a tokenization operation.
#[derive(Debug, Clone)]
pub struct TokenizerOutput {
    /// Token IDs (input_ids for the model).
    pub input_ids: Vec<i64>,
    /// Attention mask (1 for real tokens, 0 for padding).
    pub attention_mask: Vec<i64>,
    /// Segment ids; always zero for single-sentence input.
    pub token_type_ids: Vec<i64>,
}

impl From<&Encoding> for TokenizerOutput {
    fn from(enc: &Encoding) -> Self {
        let widen = |xs: &[u32]| xs.iter().map(|&x| i64::from(x)).collect::<Vec<_>>();
        Self {
            input_ids: widen(enc.get_ids()),
            attention_mask: widen(enc.get_attention_mask()),
            token_type_ids: widen(enc.get_type_ids()),
        }
    }
}

impl SentenceTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file in the model directory.
    pub fn from_model_dir(model_dir: &Path) -> Result<Self> {
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {}",
            model_dir.display()
        );

        let mut inner = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        inner
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to configure truncation: {e}"))?;

        // Pad each batch to its longest member
        inner.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        Ok(Self {
            inner,
            max_length: MAX_SEQ_LENGTH,
        })
    }

    /// Tokenize a single text.
    pub fn tokenize(&self, text: &str) -> Result<TokenizerOutput> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("failed to encode text: {e}"))?;

        Ok(TokenizerOutput::from(&encoding))
    }

    /// Tokenize multiple texts; every row is padded to the same length.
    pub fn tokenize_batch(&self, texts: &[&str]) -> Result<Vec<TokenizerOutput>> {
        let encodings = self
            .inner
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("failed to encode batch: {e}"))?;

        Ok(encodings.iter().map(TokenizerOutput::from).collect())
    }

    /// Get the vocabulary size.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }

    /// Get the configured maximum sequence length.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}
