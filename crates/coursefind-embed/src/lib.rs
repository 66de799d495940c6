//! Embedding backends for coursefind.
//!
//! [`BertEmbedder`] runs a sentence-transformers BERT model (default
//! `paraphrase-MiniLM-L6-v2`) locally on candle. [`FakeEmbedder`] is a
//! deterministic token-hash embedder for tests and offline development,
//! selected by `APP_USE_FAKE_EMBEDDINGS=1`.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use coursefind_core::config::EmbeddingSettings;
use coursefind_core::traits::Embedder;

pub mod bert;
pub mod device;
pub mod model_dir;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use pool::masked_mean;

/// MiniLM width, so fake and real artifacts have the same shape.
pub const FAKE_DIM: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub max_len: usize,
    pub normalize: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self { Self { max_len: 256, normalize: false } }
}

impl From<&EmbeddingSettings> for EmbedOptions {
    fn from(s: &EmbeddingSettings) -> Self { Self { max_len: s.max_len, normalize: s.normalize } }
}

pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake-xxhash:d{dim}") } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim; let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; } v
    }
}

impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_one(t)).collect()) }
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Load the configured model once; share the handle between build and query.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() { info!("Using FakeEmbedder"); return Ok(Arc::new(FakeEmbedder::new(FAKE_DIM))); }
    Ok(Arc::new(BertEmbedder::load(&settings.model, &EmbedOptions::from(settings))?))
}
