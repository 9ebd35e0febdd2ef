//! Turn a document into style-tagged paragraph records.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    docx::{Document, Paragraph},
    error::Result,
    media::MediaStore,
    resolver::{ResolvedAttributes, StyleResolver},
    schema::{AttrValue, Attribute, MEDIA_TAG, STYLE_TAG},
    text_util,
};

/// Record text for paragraphs holding only images.
pub const IMAGE_PLACEHOLDER: &str = "<IMAGE_PLACEHOLDER>";

/// Record text for paragraphs holding only a page break.
pub const PAGE_BREAK_PLACEHOLDER: &str = "<PAGE_BREAK>";

/// Font size (points) at which a paragraph counts as a header.
pub const HEADER_MIN_SIZE: f64 = 14.0;

/// Bold lines shorter than this many words may be headers.
pub const SHORT_LINE_WORDS: usize = 10;

/// Upper-case text longer than this is treated as set in capitals.
const CAPS_MIN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Header,
    Body,
}

impl SectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

/// One paragraph of a source document with its resolved formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphRecord {
    /// Trimmed text, or a placeholder for image-only and break-only
    /// paragraphs.
    pub text: String,
    pub style_name: String,
    pub resolved_attributes: ResolvedAttributes,
    /// File names of extracted images in the media store.
    pub media_tokens: Vec<String>,
    /// `[S: ...] [MEDIA: ...] [TAG: value] ...`
    pub style_descriptor: String,
    pub is_header: bool,
    pub section_type: SectionType,
    /// Position of the paragraph in the source document.
    pub source_index: usize,
}

/// Whether a style name denotes a heading category.
pub fn is_heading_style(style_name: &str) -> bool {
    let lower = style_name.to_lowercase();
    lower.contains("heading") || lower == "title" || lower == "subtitle"
}

/// Build the descriptor string for a paragraph.
///
/// # Examples
///
/// ```
/// use docstyle::ingest::style_descriptor;
/// use docstyle::resolver::ResolvedAttributes;
/// use docstyle::schema::{AttrValue, Attribute};
///
/// let mut attrs = ResolvedAttributes::default();
/// attrs.set(Attribute::Size, AttrValue::Number(14.0));
/// attrs.set(Attribute::Bold, AttrValue::Flag(true));
///
/// assert_eq!(
///     style_descriptor("Heading 1", &["ab12.png".to_string()], &attrs),
///     "[S: Heading 1] [MEDIA: ab12.png] [P: 14.0] [B: True]"
/// );
/// ```
pub fn style_descriptor(
    style_name: &str,
    media_tokens: &[String],
    attrs: &ResolvedAttributes,
) -> String {
    let mut parts = Vec::with_capacity(1 + media_tokens.len() + attrs.len());
    parts.push(format!("[{STYLE_TAG}: {style_name}]"));
    for token in media_tokens {
        parts.push(format!("[{MEDIA_TAG}: {token}]"));
    }
    for (attr, value) in attrs.iter() {
        parts.push(format!("[{}: {value}]", attr.tag()));
    }
    parts.join(" ")
}

fn classify(style_name: &str, text: &str, attrs: &ResolvedAttributes) -> bool {
    if is_heading_style(style_name) {
        return true;
    }
    if attrs
        .number(Attribute::Size)
        .is_some_and(|size| size >= HEADER_MIN_SIZE)
    {
        return true;
    }

    // Capitals carry the same visual weight as bold here.
    let heavy = attrs.flag(Attribute::Bold) || attrs.flag(Attribute::AllCaps);
    heavy
        && !text.is_empty()
        && text_util::word_count(text) < SHORT_LINE_WORDS
        && !text_util::ends_sentence(text)
}

/// Extracts paragraph records, persisting embedded images as it goes.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    media: MediaStore,
}

impl DocumentIngestor {
    pub fn new(media: MediaStore) -> Self {
        Self { media }
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Open a `.docx` file and extract its records.
    ///
    /// Fails only when the package cannot be opened; individual bad
    /// paragraphs are skipped.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path) -> Result<Vec<ParagraphRecord>> {
        let doc = Document::open(path)?;
        let records = self.parse(&doc);
        info!(
            paragraphs = doc.paragraphs.len(),
            records = records.len(),
            "document parsed"
        );
        Ok(records)
    }

    /// Extract records from every paragraph, in document order.
    pub fn parse(&self, doc: &Document) -> Vec<ParagraphRecord> {
        let resolver = StyleResolver::new(&doc.styles);

        doc.paragraphs
            .iter()
            .enumerate()
            .filter_map(|(index, paragraph)| {
                match self.parse_paragraph(doc, &resolver, index, paragraph) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(index, error = %e, "skipping paragraph");
                        None
                    }
                }
            })
            .collect()
    }

    fn parse_paragraph(
        &self,
        doc: &Document,
        resolver: &StyleResolver<'_>,
        index: usize,
        paragraph: &Paragraph,
    ) -> Result<Option<ParagraphRecord>> {
        let text = paragraph.text().trim().to_string();
        let media_tokens = self.extract_media(doc, index, paragraph)?;
        let page_break = paragraph.has_page_break();

        if text.is_empty() && media_tokens.is_empty() && !page_break {
            return Ok(None);
        }

        let style_name = resolver.style_name(paragraph);
        let mut attrs = resolver.resolve_all(paragraph);
        let long_enough = text.chars().count() > CAPS_MIN_CHARS;
        if text_util::is_upper_case(&text) && long_enough {
            attrs.set(Attribute::AllCaps, AttrValue::Flag(true));
        }

        // Classified before placeholders are substituted, so an image or
        // break paragraph is a header only by style name or size.
        let is_header = classify(&style_name, &text, &attrs);
        let style_descriptor =
            style_descriptor(&style_name, &media_tokens, &attrs);

        let text = if !text.is_empty() {
            text
        } else if !media_tokens.is_empty() {
            IMAGE_PLACEHOLDER.to_string()
        } else {
            PAGE_BREAK_PLACEHOLDER.to_string()
        };

        Ok(Some(ParagraphRecord {
            text,
            style_name,
            resolved_attributes: attrs,
            media_tokens,
            style_descriptor,
            is_header,
            section_type: if is_header {
                SectionType::Header
            } else {
                SectionType::Body
            },
            source_index: index,
        }))
    }

    fn extract_media(
        &self,
        doc: &Document,
        index: usize,
        paragraph: &Paragraph,
    ) -> Result<Vec<String>> {
        let mut tokens = Vec::with_capacity(paragraph.images.len());
        for rel_id in &paragraph.images {
            let Some(part) = doc.media.get(rel_id) else {
                warn!(index, %rel_id, "image relationship not found");
                continue;
            };
            tokens.push(self.media.persist(&part.data, &part.extension())?);
        }
        Ok(tokens)
    }
}
