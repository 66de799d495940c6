//! Sentence-transformers style BERT encoder (MiniLM and friends) on candle.

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use coursefind_core::traits::Embedder;

use crate::device::select_device;
use crate::model_dir::resolve_model_dir;
use crate::pool::masked_mean;
use crate::tokenize::{configure, tokenize_batch};
use crate::EmbedOptions;

// The candle config keeps these private.
#[derive(Deserialize)]
struct ModelShape {
    hidden_size: usize,
    max_position_embeddings: usize,
}

#[derive(Deserialize)]
struct SentenceBertConfig {
    max_seq_length: Option<usize>,
}

/// Token limit actually used: the requested one, capped by the position
/// table and by `max_seq_length` from `sentence_bert_config.json` when the
/// model ships one.
fn effective_max_len(model_dir: &Path, requested: usize, max_position: usize) -> Result<usize> {
    let mut max_len = requested.min(max_position);
    let st_path = model_dir.join("sentence_bert_config.json");
    if st_path.exists() {
        let raw = std::fs::read_to_string(&st_path)
            .with_context(|| format!("Failed to read {}", st_path.display()))?;
        let st: SentenceBertConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", st_path.display()))?;
        if let Some(limit) = st.max_seq_length {
            max_len = max_len.min(limit);
        }
    }
    Ok(max_len)
}

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dim: usize,
    max_len: usize,
    normalize: bool,
}

impl BertEmbedder {
    pub fn load(model: &str, options: &EmbedOptions) -> Result<Self> {
        let device = select_device();
        info!("Initializing embedding model: {model}");
        let model_dir = resolve_model_dir(model)?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let shape: ModelShape = serde_json::from_str(&raw_config)?;
        let max_len = effective_max_len(&model_dir, options.max_len, shape.max_position_embeddings)?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        configure(&mut tokenizer, max_len)?;

        let weights = load_weights(&model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let bert = BertModel::load(vb, &config)?;

        let model_id = format!("{model}:len{max_len}{}", if options.normalize { ":l2" } else { "" });
        info!(dim = shape.hidden_size, max_len, "{model} loaded");
        Ok(Self { model: bert, tokenizer, device, model_id, dim: shape.hidden_size, max_len, normalize: options.normalize })
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!("Loading weights from {}", safetensors.display());
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        debug!("Loading weights from {}", pickle.display());
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    bail!("No model.safetensors or pytorch_model.bin in {}", model_dir.display())
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str { &self.model_id }

    fn dim(&self) -> usize { self.dim }

    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean(&hidden.to_dtype(DType::F32)?, &attention_mask, self.normalize)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        debug!(batch = texts.len(), elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX), "embedded batch");
        Ok(rows)
    }
}
