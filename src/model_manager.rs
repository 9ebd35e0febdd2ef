use std::sync::Mutex;

use candle_core::{Device, Tensor};
use pylate_rs::ColBERT;

use crate::{
    embedding::{Embedder, EmbeddingMatrix},
    error::{Error, Result},
};

pub const DEFAULT_MODEL_ID: &str = "lightonai/GTE-ModernColBERT-v1";
pub const MODEL_ENV_VAR: &str = "DOCSTYLE_MODEL";

fn embedding_err(e: impl std::fmt::Display) -> Error {
    Error::Embedding(e.to_string())
}

/// Select the best available compute device.
///
/// Uses CUDA when compiled with the `cuda` feature, Metal when compiled with
/// the `metal` feature, and falls back to CPU otherwise.
fn default_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return device;
        }
    }

    Device::Cpu
}

/// Manages the ColBERT model lifecycle, supporting lazy loading on first use.
pub struct ModelManager {
    model: Option<ColBERT>,
    model_id: String,
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelManager {
    /// Model id from `DOCSTYLE_MODEL`, else [`DEFAULT_MODEL_ID`].
    ///
    /// The model is not loaded until the first encode call.
    pub fn new() -> Self {
        let model_id = std::env::var(MODEL_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string());
        Self::with_model_id(model_id)
    }

    pub fn with_model_id(model_id: String) -> Self {
        Self {
            model: None,
            model_id,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Ensures the model is loaded, downloading from HuggingFace Hub if needed.
    fn ensure_loaded(&mut self) -> Result<&mut ColBERT> {
        if self.model.is_none() {
            tracing::info!(model = %self.model_id, "loading ColBERT model");
            let colbert: ColBERT = ColBERT::from(&self.model_id)
                .with_device(default_device())
                .try_into()
                .map_err(embedding_err)?;
            self.model = Some(colbert);
        }

        self.model
            .as_mut()
            .ok_or_else(|| Error::Embedding("model failed to load".to_string()))
    }

    /// Encodes document texts into a `[batch, tokens, dim]` tensor.
    pub fn encode_documents(&mut self, texts: &[String]) -> Result<Tensor> {
        let model = self.ensure_loaded()?;
        model.encode(texts, false).map_err(embedding_err)
    }

    /// Encodes a query string into a `[tokens, dim]` tensor.
    pub fn encode_query(&mut self, query: &str) -> Result<Tensor> {
        let model = self.ensure_loaded()?;
        let embeddings = model
            .encode(&[query.to_string()], true)
            .map_err(embedding_err)?;
        embeddings.squeeze(0).map_err(embedding_err)
    }
}

/// Convert a 2D tensor `[tokens, dim]` into a matrix.
fn tensor_to_matrix(tensor: &Tensor) -> Result<EmbeddingMatrix> {
    let (num_tokens, dimension) = tensor.dims2().map_err(embedding_err)?;
    let data = tensor
        .flatten_all()
        .and_then(|t| t.to_vec1::<f32>())
        .map_err(embedding_err)?;
    EmbeddingMatrix::new(num_tokens as u32, dimension as u32, data)
}

/// [`Embedder`] backed by a ColBERT model.
///
/// The model is not thread-safe; calls serialize on an internal mutex.
pub struct ColbertEmbedder {
    manager: Mutex<ModelManager>,
    model_id: String,
}

impl ColbertEmbedder {
    pub fn new(manager: ModelManager) -> Self {
        let model_id = manager.model_id().to_string();
        Self {
            manager: Mutex::new(manager),
            model_id,
        }
    }
}

impl Embedder for ColbertEmbedder {
    fn name(&self) -> String {
        format!("colbert:{}", self.model_id)
    }

    fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<EmbeddingMatrix>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = {
            let mut manager =
                self.manager.lock().unwrap_or_else(|e| e.into_inner());
            manager.encode_documents(texts)?
        };

        let (batch_size, _, _) = embeddings.dims3().map_err(embedding_err)?;
        (0..batch_size)
            .map(|i| {
                let doc = embeddings.get(i).map_err(embedding_err)?;
                tensor_to_matrix(&doc)
            })
            .collect()
    }

    fn embed_query(&self, text: &str) -> Result<EmbeddingMatrix> {
        let tensor = {
            let mut manager =
                self.manager.lock().unwrap_or_else(|e| e.into_inner());
            manager.encode_query(text)?
        };
        tensor_to_matrix(&tensor)
    }
}
