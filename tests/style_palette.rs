use std::{
    collections::HashSet,
    io::{Cursor, Write},
    path::Path,
    sync::Arc,
};

use docstyle::{
    ChunkStore,
    DocumentIngestor,
    HashingEmbedder,
    Limits,
    StyleQueryEngine,
    docx::{Document, Paragraph, Run},
    ingest::IMAGE_PLACEHOLDER,
    media::MediaStore,
    query::SIGNATURE_PREFIX_CHARS,
    text_util::char_prefix,
};
use zip::{ZipWriter, write::FileOptions};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="title"/>
    <w:basedOn w:val="Normal"/>
    <w:rPr><w:sz w:val="56"/></w:rPr>
  </w:style>
</w:styles>"#;

const IMAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/logo.png"/>
</Relationships>"#;

fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn body(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><w:body>{inner}</w:body></w:document>"#
    )
}

fn paragraph_xml(text: &str, style: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
    )
}

/// Write a `.docx` with `(text, style id)` paragraphs.
fn write_docx(path: &Path, paragraphs: &[(&str, &str)]) {
    let inner: String = paragraphs
        .iter()
        .map(|(text, style)| paragraph_xml(text, style))
        .collect();
    let document = body(&inner);
    std::fs::write(
        path,
        package(&[
            ("word/document.xml", document.as_bytes()),
            ("word/styles.xml", STYLES.as_bytes()),
        ]),
    )
    .unwrap();
}

struct Fixture {
    dir: tempfile::TempDir,
    ingestor: DocumentIngestor,
    store: ChunkStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::open(&dir.path().join("media")).unwrap();
        let ingestor = DocumentIngestor::new(media);
        let store = ChunkStore::open(
            &dir.path().join("store.redb"),
            "styled_templates",
            Arc::new(HashingEmbedder::default()),
        )
        .unwrap();
        Self {
            dir,
            ingestor,
            store,
        }
    }

    fn ingest(&self, name: &str, paragraphs: &[(&str, &str)]) -> usize {
        let path = self.dir.path().join(name);
        write_docx(&path, paragraphs);
        let records = self.ingestor.parse_file(&path).unwrap();
        self.store.insert(&records, name).into_result().unwrap()
    }
}

#[test]
fn chapter_one_scenario() {
    let fx = Fixture::new();
    fx.ingest(
        "A.docx",
        &[
            ("Chapter One", "Heading1"),
            ("Lorem ipsum dolor sit amet.", "Normal"),
        ],
    );
    fx.ingest("B.docx", &[("Chapter One", "Title")]);

    let best = fx.store.query("Chapter One details", 1).unwrap();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].entry.metadata.source_document, "A.docx");

    let engine = StyleQueryEngine::new(&fx.store, Limits::LOW_POWER);
    let palette = engine
        .search_style_reference("Chapter One details")
        .unwrap()
        .unwrap();
    assert_eq!(palette.source_document, "A.docx");
    assert_eq!(palette.blocks.len(), 2);
    assert!(palette.blocks[0].starts_with("[S: Heading 1] "));
    assert!(palette.blocks[0].ends_with("\nCONTENT: Chapter One"));
    assert!(palette.blocks[1].starts_with("[S: Normal] "));

    // Same store, same query, same answer.
    let again = engine
        .search_style_reference("Chapter One details")
        .unwrap()
        .unwrap();
    assert_eq!(again, palette);

    let reference = palette.to_reference();
    assert_eq!(reference.source_id, "A.docx");
    assert!(
        reference
            .full_context
            .starts_with("REFERENCE DOCUMENT: A.docx\n\n\n[S: Heading 1]")
    );
}

#[test]
fn palette_leads_with_headers_regardless_of_storage_order() {
    let fx = Fixture::new();
    fx.ingest(
        "late-heading.docx",
        &[
            ("Lorem ipsum dolor sit amet.", "Normal"),
            ("Chapter One", "Heading1"),
        ],
    );

    let stored = fx.store.entries_for_source("late-heading.docx", 10).unwrap();
    assert!(!stored[0].metadata.is_header);

    let palette = StyleQueryEngine::new(&fx.store, Limits::HIGH_POWER)
        .search_style_reference("lorem ipsum")
        .unwrap()
        .unwrap();
    assert!(palette.blocks[0].ends_with("CONTENT: Chapter One"));
}

#[test]
fn self_retrieval() {
    let fx = Fixture::new();
    fx.ingest(
        "invoices.docx",
        &[
            ("Payment Terms", "Heading1"),
            ("Invoices are due net thirty days.", "Normal"),
        ],
    );
    fx.ingest(
        "shipping.docx",
        &[
            ("Delivery Schedule", "Heading1"),
            ("Freight carrier collects pallets from the warehouse.", "Normal"),
        ],
    );
    fx.ingest(
        "budget.docx",
        &[("Budget", "Title"), ("Alpha beta gamma delta epsilon.", "Normal")],
    );

    for (text, expected) in [
        (
            "Freight carrier collects pallets from the warehouse.",
            "shipping.docx",
        ),
        ("Invoices are due net thirty days.", "invoices.docx"),
        ("Alpha beta gamma delta epsilon.", "budget.docx"),
    ] {
        let palette = StyleQueryEngine::new(&fx.store, Limits::LOW_POWER)
            .search_style_reference(text)
            .unwrap()
            .unwrap();
        assert_eq!(palette.source_document, expected, "query: {text}");
    }
}

#[test]
fn palette_is_deduplicated_and_bounded() {
    let fx = Fixture::new();
    let mut paragraphs =
        vec![("Overview", "Heading1"), ("Annual Report", "Title")];
    let bodies: Vec<String> = (0..6)
        .map(|i| format!("Body paragraph number {i}."))
        .collect();
    paragraphs.extend(bodies.iter().map(|b| (b.as_str(), "Normal")));
    fx.ingest("report.docx", &paragraphs);

    for limits in [
        Limits::LOW_POWER,
        Limits::HIGH_POWER,
        Limits {
            max_examples: 2,
            ..Limits::HIGH_POWER
        },
    ] {
        let palette = StyleQueryEngine::new(&fx.store, limits)
            .search_style_reference("overview")
            .unwrap()
            .unwrap();

        assert!(!palette.blocks.is_empty());
        assert!(palette.blocks.len() <= limits.max_examples);

        let signatures: HashSet<_> = palette
            .blocks
            .iter()
            .map(|b| char_prefix(b, SIGNATURE_PREFIX_CHARS))
            .collect();
        assert_eq!(signatures.len(), palette.blocks.len());
    }

    // Two headers plus one representative body paragraph.
    let wide = StyleQueryEngine::new(&fx.store, Limits::HIGH_POWER)
        .search_style_reference("overview")
        .unwrap()
        .unwrap();
    assert_eq!(wide.blocks.len(), 3);
    assert!(wide.blocks[2].starts_with("[S: Normal]"));
}

#[test]
fn image_only_paragraph_end_to_end() {
    let fx = Fixture::new();
    let inner = format!(
        "{}<w:p><w:r><w:drawing><a:blip r:embed=\"rId4\"/></w:drawing></w:r></w:p>",
        paragraph_xml("Company Logo", "Heading1")
    );
    let document = body(&inner);
    let path = fx.dir.path().join("branded.docx");
    std::fs::write(
        &path,
        package(&[
            ("word/document.xml", document.as_bytes()),
            ("word/styles.xml", STYLES.as_bytes()),
            ("word/_rels/document.xml.rels", IMAGE_RELS.as_bytes()),
            ("word/media/logo.png", b"\x89PNG logo bytes"),
        ]),
    )
    .unwrap();

    let records = fx.ingestor.parse_file(&path).unwrap();
    assert_eq!(records.len(), 2);
    let image = &records[1];
    assert_eq!(image.text, IMAGE_PLACEHOLDER);
    assert_eq!(image.media_tokens.len(), 1);
    assert!(image.media_tokens[0].ends_with(".png"));
    assert!(fx.ingestor.media().path_of(&image.media_tokens[0]).is_file());

    fx.store.insert(&records, "branded.docx").into_result().unwrap();
    let stored = fx.store.entries_for_source("branded.docx", 10).unwrap();
    assert!(stored[1].metadata.has_image);
    assert!(stored[1].rich_content.contains("[MEDIA: "));
}

#[test]
fn concurrent_inserts_and_queries() {
    let fx = Fixture::new();
    let ingestor = &fx.ingestor;
    let store = &fx.store;

    std::thread::scope(|s| {
        for t in 0..4 {
            s.spawn(move || {
                let mut doc = Document::default();
                doc.paragraphs = (0..40)
                    .map(|i| {
                        let text = format!("thread {t} paragraph {i} text.");
                        Paragraph::new().with_run(Run::new(text))
                    })
                    .collect();
                let records = ingestor.parse(&doc);
                let report = store.insert(&records, &format!("doc-{t}"));
                assert_eq!(report.into_result().unwrap(), 40);
            });
        }
        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..10 {
                    let hits = store.query("paragraph text", 3).unwrap();
                    assert!(hits.len() <= 3);
                }
            });
        }
    });

    assert_eq!(store.len().unwrap(), 160);
    let docs = store.list_documents().unwrap();
    assert_eq!(docs.len(), 4);
    assert!(docs.iter().all(|d| d.paragraphs == 40));
}
