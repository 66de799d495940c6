/// A loaded embedding model.
///
/// Construct one per process and share it (`Arc<dyn Embedder>`) between the
/// build pipeline and the query engine so both see the same weights and
/// tokenizer settings.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model and its output-affecting settings.
    /// Persisted alongside the index and compared at query time.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// Embed `texts` in one model call; row `i` is the embedding of `texts[i]`.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
