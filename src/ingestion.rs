use rayon::prelude::*;
use tracing::{error, info};

use crate::{
    error::{Error, Result},
    ingest::{DocumentIngestor, ParagraphRecord},
    store::ChunkStore,
    walker::DiscoveredFile,
};

/// Result of ingesting one file.
#[derive(Debug)]
pub struct IngestOutcome {
    pub document: String,
    /// Entries stored, or why the document was not (fully) stored.
    pub result: Result<usize>,
}

/// Parse and store a batch of discovered files.
///
/// Files are parsed in parallel; inserts then run one document at a time
/// in discovery order. A failing document never stops the batch. With
/// `replace`, existing entries for each document are removed first.
pub fn ingest_files(
    ingestor: &DocumentIngestor,
    store: &ChunkStore,
    files: &[DiscoveredFile],
    replace: bool,
) -> Vec<IngestOutcome> {
    let parsed: Vec<(String, Result<Vec<ParagraphRecord>>)> = files
        .par_iter()
        .map(|file| {
            (
                file.document_name(),
                ingestor.parse_file(&file.absolute_path),
            )
        })
        .collect();

    parsed
        .into_iter()
        .map(|(document, records)| {
            let result = records.and_then(|records| {
                store_document(store, &document, &records, replace)
            });
            if let Err(e) = &result {
                error!(%document, error = %e, "document not ingested");
            }
            IngestOutcome { document, result }
        })
        .collect()
}

fn store_document(
    store: &ChunkStore,
    document: &str,
    records: &[ParagraphRecord],
    replace: bool,
) -> Result<usize> {
    if replace {
        let removed = store.remove_document(document)?;
        if removed > 0 {
            info!(%document, removed, "replacing existing entries");
        }
    }
    store.insert(records, document).into_result()
}

/// Count of documents that failed in a batch.
pub fn failures(outcomes: &[IngestOutcome]) -> usize {
    outcomes.iter().filter(|o| o.result.is_err()).count()
}

/// Number of stored documents, or [`Error::IngestFailed`] when any
/// document in the batch failed.
pub fn batch_result(outcomes: &[IngestOutcome]) -> Result<usize> {
    let failed = failures(outcomes);
    if failed > 0 {
        return Err(Error::IngestFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(outcomes.len())
}

/// Whether a failure only means the document was already present.
pub fn is_duplicate(outcome: &IngestOutcome) -> bool {
    matches!(outcome.result, Err(Error::DuplicateDocument(_)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        docx::tests::{body_xml, package},
        embedding::HashingEmbedder,
        media::MediaStore,
        walker::discover_files,
    };

    fn write_docx(path: &std::path::Path, paragraphs: &[&str]) {
        let inner: String = paragraphs
            .iter()
            .map(|t| format!("<w:p><w:r><w:t>{t}</w:t></w:r></w:p>"))
            .collect();
        let body = body_xml(&inner);
        std::fs::write(path, package(&[("word/document.xml", body.as_bytes())]))
            .unwrap();
    }

    fn setup(tmp: &std::path::Path) -> (DocumentIngestor, ChunkStore) {
        let media = MediaStore::open(&tmp.join("media")).unwrap();
        let ingestor = DocumentIngestor::new(media);
        let store = ChunkStore::open(
            &tmp.join("store.redb"),
            "test",
            Arc::new(HashingEmbedder::default()),
        )
        .unwrap();
        (ingestor, store)
    }

    #[test]
    fn batch_continues_past_bad_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        write_docx(&docs.join("a.docx"), &["First paragraph.", "Second."]);
        std::fs::write(docs.join("b.docx"), b"not a zip").unwrap();
        write_docx(&docs.join("c.docx"), &["Only one."]);

        let (ingestor, store) = setup(tmp.path());
        let files = discover_files(&docs).unwrap();
        let outcomes = ingest_files(&ingestor, &store, &files, false);

        let summary: Vec<_> = outcomes
            .iter()
            .map(|o| (o.document.as_str(), o.result.as_ref().ok().copied()))
            .collect();
        assert_eq!(
            summary,
            vec![("a.docx", Some(2)), ("b.docx", None), ("c.docx", Some(1))]
        );
        assert_eq!(failures(&outcomes), 1);
        assert!(matches!(outcomes[1].result, Err(Error::DocumentParse(_))));
        assert!(matches!(
            batch_result(&outcomes),
            Err(Error::IngestFailed {
                failed: 1,
                total: 3
            })
        ));
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn clean_batch_reports_document_count() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        write_docx(&docs.join("a.docx"), &["One."]);
        write_docx(&docs.join("b.docx"), &["Two."]);

        let (ingestor, store) = setup(tmp.path());
        let files = discover_files(&docs).unwrap();
        let outcomes = ingest_files(&ingestor, &store, &files, false);
        assert_eq!(batch_result(&outcomes).unwrap(), 2);
        assert_eq!(batch_result(&[]).unwrap(), 0);
    }

    #[test]
    fn reingest_is_rejected_unless_replacing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("memo.docx");
        write_docx(&path, &["Original text."]);

        let (ingestor, store) = setup(tmp.path());
        let files = discover_files(&path).unwrap();
        ingest_files(&ingestor, &store, &files, false);

        let again = ingest_files(&ingestor, &store, &files, false);
        assert!(is_duplicate(&again[0]));

        write_docx(&path, &["Rewritten text.", "With more."]);
        let replaced = ingest_files(&ingestor, &store, &files, true);
        assert_eq!(replaced[0].result.as_ref().ok(), Some(&2));
        assert_eq!(store.len().unwrap(), 2);

        let hits = store.query("rewritten", 1).unwrap();
        let content = &hits[0].entry.rich_content;
        assert!(content.ends_with("CONTENT: Rewritten text."));
    }
}
