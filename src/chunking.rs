//! Turn paragraph records into indexable entries.
//!
//! Every record becomes exactly one entry; paragraphs are never merged or
//! split. The embedded text is kept separate from the content returned to
//! callers: search runs over plain text, while results carry the full
//! style descriptor.

use serde::{Deserialize, Serialize};

use crate::{
    doc_id::EntryId,
    ingest::{ParagraphRecord, SectionType},
};

/// How many times a header's text is repeated in its search text.
pub const HEADER_BOOST: usize = 3;

/// Metadata stored alongside each entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub source_document: String,
    pub is_header: bool,
    pub section_type: SectionType,
    pub style_name: String,
    pub source_index: usize,
    pub has_image: bool,
}

/// One stored paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    /// Text the embedding is computed from.
    pub search_text: String,
    /// `{style_descriptor}\nCONTENT: {text}`
    pub rich_content: String,
    pub metadata: EntryMetadata,
}

/// Search text for a record. Headers are repeated to weigh them up.
///
/// # Examples
///
/// ```
/// use docstyle::chunking::search_text;
///
/// assert_eq!(search_text("Scope", true), "Scope Scope Scope");
/// assert_eq!(search_text("Body.", false), "Body.");
/// ```
pub fn search_text(text: &str, is_header: bool) -> String {
    if is_header {
        vec![text; HEADER_BOOST].join(" ")
    } else {
        text.to_string()
    }
}

pub fn rich_content(descriptor: &str, text: &str) -> String {
    format!("{descriptor}\nCONTENT: {text}")
}

impl IndexEntry {
    pub fn from_record(
        record: &ParagraphRecord,
        source_document: &str,
    ) -> Self {
        Self {
            id: EntryId::new(source_document, record.source_index).to_string(),
            search_text: search_text(&record.text, record.is_header),
            rich_content: rich_content(&record.style_descriptor, &record.text),
            metadata: EntryMetadata {
                source_document: source_document.to_string(),
                is_header: record.is_header,
                section_type: record.section_type,
                style_name: record.style_name.clone(),
                source_index: record.source_index,
                has_image: !record.media_tokens.is_empty(),
            },
        }
    }
}

/// Build one entry per record, in record order.
pub fn build_entries(
    records: &[ParagraphRecord],
    source_document: &str,
) -> Vec<IndexEntry> {
    records
        .iter()
        .map(|r| IndexEntry::from_record(r, source_document))
        .collect()
}
