//! Late-interaction embeddings: one vector per token, scored with MaxSim.

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Header size: 4 bytes token count + 4 bytes dimension.
const HEADER_SIZE: usize = 8;

/// Maps text to per-token embedding matrices.
///
/// Implementations must be deterministic for a given [`name`](Self::name):
/// stored matrices are only comparable with queries embedded by the same
/// embedder.
pub trait Embedder: Send + Sync {
    /// Stable identifier recorded with every collection.
    fn name(&self) -> String;

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<EmbeddingMatrix>>;

    fn embed_query(&self, text: &str) -> Result<EmbeddingMatrix>;
}

/// A per-token embedding matrix.
///
/// Binary format:
/// - 4 bytes: token count T (u32 LE)
/// - 4 bytes: embedding dimension D (u32 LE)
/// - T * D * 4 bytes: f32 LE values in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    pub num_tokens: u32,
    pub dimension: u32,
    /// Row-major f32 values: `data[token_idx * dimension + dim_idx]`.
    pub data: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn new(
        num_tokens: u32,
        dimension: u32,
        data: Vec<f32>,
    ) -> Result<Self> {
        if data.len() != (num_tokens as usize) * (dimension as usize) {
            return Err(Error::Embedding(format!(
                "matrix data has {} values, \
                 expected {num_tokens} x {dimension}",
                data.len()
            )));
        }
        Ok(Self {
            num_tokens,
            dimension,
            data,
        })
    }

    /// Get the embedding vector for a specific token.
    pub fn token_embedding(&self, token_idx: u32) -> &[f32] {
        let start = (token_idx * self.dimension) as usize;
        let end = start + self.dimension as usize;
        &self.data[start..end]
    }

    pub fn tokens(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1) as usize)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = std::mem::size_of_val(self.data.as_slice());
        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload);
        bytes.extend_from_slice(&self.num_tokens.to_le_bytes());
        bytes.extend_from_slice(&self.dimension.to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.data));
        bytes
    }

    /// Decode a stored matrix. Returns `None` for truncated or
    /// inconsistent data.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }

        let num_tokens = u32::from_le_bytes(bytes[0..4].try_into().ok()?);
        let dimension = u32::from_le_bytes(bytes[4..8].try_into().ok()?);

        let expected_len =
            HEADER_SIZE + (num_tokens as usize) * (dimension as usize) * 4;
        if bytes.len() != expected_len {
            return None;
        }

        // Stored values are not guaranteed to be 4-byte aligned.
        let data = bytes[HEADER_SIZE..]
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect();

        Some(Self {
            num_tokens,
            dimension,
            data,
        })
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// MaxSim: for each query token, the best dot product against any document
/// token, summed. A document without tokens scores 0.
pub fn maxsim(query: &EmbeddingMatrix, document: &EmbeddingMatrix) -> f32 {
    if document.num_tokens == 0 {
        return 0.0;
    }

    query
        .tokens()
        .map(|q| {
            document
                .tokens()
                .map(|d| dot(q, d))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .sum()
}

/// Score every candidate against the query in parallel, best first.
///
/// Candidates are `(key, matrix)` in storage order; equal scores keep that
/// order.
pub fn rank<K: Send + Sync + Copy>(
    query: &EmbeddingMatrix,
    candidates: &[(K, EmbeddingMatrix)],
    top_k: usize,
) -> Vec<(K, f32)> {
    let mut scored: Vec<(usize, K, f32)> = candidates
        .par_iter()
        .enumerate()
        .map(|(pos, (key, matrix))| (pos, *key, maxsim(query, matrix)))
        .collect();

    scored.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));
    scored.truncate(top_k);
    scored.into_iter().map(|(_, key, score)| (key, score)).collect()
}

/// Default dimension of [`HashingEmbedder`] vectors.
pub const DEFAULT_HASHING_DIM: u32 = 1024;

/// A model-free embedder: every word becomes a one-hot vector at a hashed
/// position, so MaxSim counts the query words a paragraph shares.
///
/// Deterministic across runs and platforms. Used for tests and for
/// machines without the ColBERT model.
///
/// # Examples
///
/// ```
/// use docstyle::embedding::{Embedder, HashingEmbedder, maxsim};
///
/// let embedder = HashingEmbedder::default();
/// let query = embedder.embed_query("chapter one").unwrap();
/// let docs = embedder
///     .embed_documents(&["Chapter One".into(), "Appendix".into()])
///     .unwrap();
///
/// assert!(maxsim(&query, &docs[0]) > maxsim(&query, &docs[1]));
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: u32,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: u32) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    fn embed(&self, text: &str) -> EmbeddingMatrix {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        let dim = self.dimension as usize;
        let mut data = vec![0.0; tokens.len() * dim];
        for (i, token) in tokens.iter().enumerate() {
            let slot = (fnv1a(token.as_bytes()) % dim as u64) as usize;
            data[i * dim + slot] = 1.0;
        }

        EmbeddingMatrix {
            num_tokens: tokens.len() as u32,
            dimension: self.dimension,
            data,
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> String {
        format!("hashing-{}", self.dimension)
    }

    fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<EmbeddingMatrix>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<EmbeddingMatrix> {
        Ok(self.embed(text))
    }
}
