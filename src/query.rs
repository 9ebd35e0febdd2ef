//! Similarity search and style-palette assembly.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    chunking::{EntryMetadata, IndexEntry},
    error::Result,
    profile::Limits,
    store::ChunkStore,
    text_util::char_prefix,
};

/// Characters of rich content that, with the style name, identify a
/// palette entry for deduplication.
pub const SIGNATURE_PREFIX_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub rich_content: String,
    pub metadata: EntryMetadata,
    pub score: f32,
}

/// Representative, de-duplicated paragraphs from one reference document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePalette {
    pub source_document: String,
    /// Accepted rich content, headers first.
    pub blocks: Vec<String>,
}

impl StylePalette {
    pub fn header(&self) -> String {
        format!("REFERENCE DOCUMENT: {}\n", self.source_document)
    }

    /// Header line followed by every block, separated by blank lines.
    pub fn full_context(&self) -> String {
        std::iter::once(self.header())
            .chain(self.blocks.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn to_reference(&self) -> StyleReference {
        StyleReference {
            full_context: self.full_context(),
            source_id: self.source_document.clone(),
        }
    }
}

/// Serializable palette handed to downstream generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleReference {
    pub full_context: String,
    pub source_id: String,
}

/// Read-only query front end over a [`ChunkStore`].
///
/// The limits are fixed at construction; build a new engine to apply a
/// recalibrated profile.
pub struct StyleQueryEngine<'a> {
    store: &'a ChunkStore,
    limits: Limits,
}

impl<'a> StyleQueryEngine<'a> {
    pub fn new(store: &'a ChunkStore, limits: Limits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Plain similarity search returning rich content.
    pub fn search(&self, query: &str, n: usize) -> Result<Vec<SearchHit>> {
        Ok(self
            .store
            .query(query, n)?
            .into_iter()
            .map(|hit| SearchHit {
                rich_content: hit.entry.rich_content,
                metadata: hit.entry.metadata,
                score: hit.score,
            })
            .collect())
    }

    /// Find the best-matching document and assemble its style palette.
    ///
    /// Returns `Ok(None)` when nothing in the collection matches.
    #[instrument(skip(self), fields(collection = %self.store.collection()))]
    pub fn search_style_reference(
        &self,
        query: &str,
    ) -> Result<Option<StylePalette>> {
        let Some(best) = self.store.query(query, 1)?.into_iter().next() else {
            debug!("no reference document found");
            return Ok(None);
        };
        let source = best.entry.metadata.source_document;

        let candidates = self
            .store
            .entries_for_source(&source, self.limits.retrieval_limit)?;
        let blocks = select_blocks(candidates, self.limits.max_examples);
        debug!(%source, blocks = blocks.len(), "palette assembled");

        Ok(Some(StylePalette {
            source_document: source,
            blocks,
        }))
    }
}

/// Headers first (stable), one entry per `(style, content prefix)`
/// signature, at most `max_examples`.
fn select_blocks(
    mut candidates: Vec<IndexEntry>,
    max_examples: usize,
) -> Vec<String> {
    candidates.sort_by_key(|e| !e.metadata.is_header);

    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for entry in candidates {
        if blocks.len() >= max_examples {
            break;
        }
        let prefix = char_prefix(&entry.rich_content, SIGNATURE_PREFIX_CHARS);
        let signature =
            (entry.metadata.style_name.clone(), prefix.to_string());
        if seen.insert(signature) {
            blocks.push(entry.rich_content);
        }
    }
    blocks
}
