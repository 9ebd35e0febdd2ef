//! Persistent paragraph index backed by redb.
//!
//! One database file holds any number of collections. Each collection owns
//! three tables:
//!
//! - `{collection}.entries`: sequence number → entry JSON
//! - `{collection}.ids`: entry id → sequence number
//! - `{collection}.embeddings`: sequence number → embedding matrix bytes
//!
//! Sequence numbers only grow, so iterating a table yields entries in the
//! order they were stored. A shared `meta` table records which embedder
//! built each collection.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use redb::{
    Database,
    ReadableDatabase,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    chunking::{IndexEntry, build_entries},
    embedding::{self, Embedder, EmbeddingMatrix},
    error::{Error, Result},
    ingest::ParagraphRecord,
};

const META: TableDefinition<&str, &str> = TableDefinition::new("meta");

/// Entries embedded and committed per write transaction.
pub const INSERT_BATCH_SIZE: usize = 32;

/// Outcome of one [`ChunkStore::insert`] call.
///
/// Batches committed before a failure stay committed, so `inserted` can be
/// non-zero alongside an error.
#[derive(Debug)]
pub struct InsertReport {
    pub source_document: String,
    pub inserted: usize,
    pub error: Option<Error>,
}

impl InsertReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<usize> {
        match self.error {
            None => Ok(self.inserted),
            Some(e) => Err(e),
        }
    }
}

/// A stored entry with its query score.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: IndexEntry,
    pub score: f32,
}

/// Per-document counts for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub paragraphs: usize,
    pub headers: usize,
}

/// Collection names become table-name prefixes: non-empty, no whitespace.
pub fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(Error::Config(format!("invalid collection name '{name}'")));
    }
    Ok(())
}

/// Thread-safe paragraph store for one collection.
///
/// Inserts serialize on an instance lock; queries use redb read
/// transactions and never block on it, seeing each batch once committed.
pub struct ChunkStore {
    db: Database,
    collection: String,
    entries_table: String,
    ids_table: String,
    embeddings_table: String,
    embedder: Arc<dyn Embedder>,
    write_lock: Mutex<()>,
}

impl ChunkStore {
    /// Open or create the store at `path` and bind it to `collection`.
    ///
    /// Fails with [`Error::Config`] when the collection was built with a
    /// different embedder.
    ///
    /// # Examples
    ///
    /// ```
    /// # let tmp = tempfile::tempdir().unwrap();
    /// use std::sync::Arc;
    /// use docstyle::{ChunkStore, HashingEmbedder};
    ///
    /// let store = ChunkStore::open(
    ///     &tmp.path().join("store.redb"),
    ///     "styled_templates",
    ///     Arc::new(HashingEmbedder::default()),
    /// )
    /// .unwrap();
    /// assert_eq!(store.len().unwrap(), 0);
    /// ```
    pub fn open(
        path: &Path,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        validate_collection_name(collection)?;

        let db = Database::create(path)?;
        let store = Self {
            db,
            collection: collection.to_string(),
            entries_table: format!("{collection}.entries"),
            ids_table: format!("{collection}.ids"),
            embeddings_table: format!("{collection}.embeddings"),
            embedder,
            write_lock: Mutex::new(()),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        let embedder_name = self.embedder.name();
        let meta_key = format!("{}.embedder", self.collection);

        let txn = self.db.begin_write()?;
        {
            let mut meta = txn.open_table(META)?;
            let existing =
                meta.get(meta_key.as_str())?.map(|v| v.value().to_string());
            match existing {
                Some(name) if name != embedder_name => {
                    return Err(Error::Config(format!(
                        "collection '{}' was built with embedder '{name}', \
                         not '{embedder_name}'",
                        self.collection
                    )));
                }
                Some(_) => {}
                None => {
                    meta.insert(meta_key.as_str(), embedder_name.as_str())?;
                }
            }
            txn.open_table(self.entries_def())?;
            txn.open_table(self.ids_def())?;
            txn.open_table(self.embeddings_def())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn entries_def(&self) -> TableDefinition<'_, u64, &'static str> {
        TableDefinition::new(&self.entries_table)
    }

    fn ids_def(&self) -> TableDefinition<'_, &'static str, u64> {
        TableDefinition::new(&self.ids_table)
    }

    fn embeddings_def(&self) -> TableDefinition<'_, u64, &'static [u8]> {
        TableDefinition::new(&self.embeddings_table)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder_name(&self) -> String {
        self.embedder.name()
    }

    /// Store one entry per record under `source_document`.
    ///
    /// Never panics or returns early with `Err`: failures are logged and
    /// carried in the report. A document already present in the collection
    /// is rejected with [`Error::DuplicateDocument`] and nothing is written;
    /// call [`remove_document`](Self::remove_document) first to replace it.
    #[instrument(
        skip(self, records),
        fields(collection = %self.collection, records = records.len())
    )]
    pub fn insert(
        &self,
        records: &[ParagraphRecord],
        source_document: &str,
    ) -> InsertReport {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut inserted = 0;
        let result =
            self.insert_locked(records, source_document, &mut inserted);

        let error = match result {
            Ok(()) => {
                info!(inserted, "document stored");
                None
            }
            Err(e @ Error::DuplicateDocument(_)) => {
                warn!("document already indexed, nothing written");
                Some(e)
            }
            Err(e) => {
                error!(error = %e, inserted, "insert failed");
                Some(Error::StorageWrite {
                    document: source_document.to_string(),
                    source: Box::new(e),
                })
            }
        };

        InsertReport {
            source_document: source_document.to_string(),
            inserted,
            error,
        }
    }

    fn insert_locked(
        &self,
        records: &[ParagraphRecord],
        source_document: &str,
        inserted: &mut usize,
    ) -> Result<()> {
        if self.contains_document(source_document)? {
            return Err(Error::DuplicateDocument(source_document.to_string()));
        }
        let entries = build_entries(records, source_document);

        for batch in entries.chunks(INSERT_BATCH_SIZE) {
            let texts: Vec<String> =
                batch.iter().map(|e| e.search_text.clone()).collect();
            let matrices = self.embedder.embed_documents(&texts)?;
            if matrices.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "embedder returned {} matrices for {} texts",
                    matrices.len(),
                    batch.len()
                )));
            }

            self.write_batch(batch, &matrices)?;
            *inserted += batch.len();
            debug!(batch = batch.len(), total = *inserted, "batch committed");
        }

        Ok(())
    }

    /// Whether any stored entry belongs to `source_document`, whatever
    /// its paragraph positions.
    pub fn contains_document(&self, source_document: &str) -> Result<bool> {
        Ok(!self.entries_for_source(source_document, 1)?.is_empty())
    }

    fn write_batch(
        &self,
        batch: &[IndexEntry],
        matrices: &[EmbeddingMatrix],
    ) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut entries = txn.open_table(self.entries_def())?;
            let mut ids = txn.open_table(self.ids_def())?;
            let mut embeddings = txn.open_table(self.embeddings_def())?;

            let mut seq = entries.last()?.map_or(0, |(k, _)| k.value() + 1);
            for (entry, matrix) in batch.iter().zip(matrices) {
                let json = serde_json::to_string(entry)?;
                entries.insert(seq, json.as_str())?;
                ids.insert(entry.id.as_str(), seq)?;
                embeddings.insert(seq, matrix.to_bytes().as_slice())?;
                seq += 1;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// The `n` entries most similar to `text`, best first. Equal scores
    /// keep storage order.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub fn query(&self, text: &str, n: usize) -> Result<Vec<ScoredEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_query(text)?;

        let txn = self.db.begin_read()?;
        let embeddings = txn.open_table(self.embeddings_def())?;
        let mut candidates = Vec::new();
        for row in embeddings.iter()? {
            let (seq, bytes) = row?;
            let seq = seq.value();
            match EmbeddingMatrix::from_bytes(bytes.value()) {
                Some(matrix) => candidates.push((seq, matrix)),
                None => warn!(seq, "skipping unreadable embedding"),
            }
        }

        let ranked = embedding::rank(&query, &candidates, n);
        debug!(
            candidates = candidates.len(),
            hits = ranked.len(),
            "query ranked"
        );

        let entries = txn.open_table(self.entries_def())?;
        let mut results = Vec::with_capacity(ranked.len());
        for (seq, score) in ranked {
            let Some(raw) = entries.get(seq)? else {
                continue;
            };
            let entry: IndexEntry = serde_json::from_str(raw.value())?;
            results.push(ScoredEntry { entry, score });
        }
        Ok(results)
    }

    /// Up to `limit` entries of one source document, in storage order.
    pub fn entries_for_source(
        &self,
        source_document: &str,
        limit: usize,
    ) -> Result<Vec<IndexEntry>> {
        let txn = self.db.begin_read()?;
        let entries = txn.open_table(self.entries_def())?;

        let mut result = Vec::new();
        for row in entries.iter()? {
            if result.len() >= limit {
                break;
            }
            let (_, raw) = row?;
            let entry: IndexEntry = serde_json::from_str(raw.value())?;
            if entry.metadata.source_document == source_document {
                result.push(entry);
            }
        }
        Ok(result)
    }

    /// Delete every entry of a document. Returns how many were removed.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub fn remove_document(&self, source_document: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let txn = self.db.begin_write()?;
        let removed = {
            let mut entries = txn.open_table(self.entries_def())?;
            let mut ids = txn.open_table(self.ids_def())?;
            let mut embeddings = txn.open_table(self.embeddings_def())?;

            let mut doomed = Vec::new();
            for row in entries.iter()? {
                let (seq, raw) = row?;
                let entry: IndexEntry = serde_json::from_str(raw.value())?;
                if entry.metadata.source_document == source_document {
                    doomed.push((seq.value(), entry.id));
                }
            }

            for (seq, id) in &doomed {
                entries.remove(*seq)?;
                ids.remove(id.as_str())?;
                embeddings.remove(*seq)?;
            }
            doomed.len()
        };
        txn.commit()?;

        info!(removed, "document removed");
        Ok(removed)
    }

    /// Documents in the collection, in the order they were first stored.
    pub fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let txn = self.db.begin_read()?;
        let entries = txn.open_table(self.entries_def())?;

        let mut summaries: Vec<DocumentSummary> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for row in entries.iter()? {
            let (_, raw) = row?;
            let entry: IndexEntry = serde_json::from_str(raw.value())?;
            let name = entry.metadata.source_document;
            let pos = *positions.entry(name.clone()).or_insert_with(|| {
                summaries.push(DocumentSummary {
                    name,
                    paragraphs: 0,
                    headers: 0,
                });
                summaries.len() - 1
            });
            summaries[pos].paragraphs += 1;
            if entry.metadata.is_header {
                summaries[pos].headers += 1;
            }
        }
        Ok(summaries)
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let entries = txn.open_table(self.entries_def())?;
        Ok(entries.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{chunking::tests::record, embedding::HashingEmbedder};

    fn open(dir: &Path) -> ChunkStore {
        ChunkStore::open(
            &dir.join("store.redb"),
            "test",
            Arc::new(HashingEmbedder::default()),
        )
        .unwrap()
    }

    fn sample() -> Vec<ParagraphRecord> {
        vec![
            record(0, "Heading 1", "Quarterly Results", true),
            record(1, "Normal", "Revenue increased in every region.", false),
            record(3, "Normal", "Costs were flat.", false),
        ]
    }

    /// Fails on the nth call to `embed_documents` (0-based).
    struct FailingEmbedder {
        fail_on: usize,
        calls: AtomicUsize,
        inner: HashingEmbedder,
    }

    impl Embedder for FailingEmbedder {
        fn name(&self) -> String {
            "failing".into()
        }

        fn embed_documents(
            &self,
            texts: &[String],
        ) -> Result<Vec<EmbeddingMatrix>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
                return Err(Error::Embedding("service unavailable".into()));
            }
            self.inner.embed_documents(texts)
        }

        fn embed_query(&self, text: &str) -> Result<EmbeddingMatrix> {
            self.inner.embed_query(text)
        }
    }

    #[test]
    fn insert_and_query() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());

        let report = store.insert(&sample(), "report.docx");
        assert!(report.is_ok(), "{:?}", report.error);
        assert_eq!(report.inserted, 3);
        assert_eq!(store.len().unwrap(), 3);

        let hits = store.query("costs flat", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.id, "report.docx_3");
        assert_eq!(hits[0].score, 2.0);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn query_empty_store_and_zero_n() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        assert!(store.query("anything", 5).unwrap().is_empty());

        store.insert(&sample(), "a").into_result().unwrap();
        assert!(store.query("anything", 0).unwrap().is_empty());
    }

    #[test]
    fn ties_keep_storage_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        store
            .insert(&[record(0, "Normal", "shared words", false)], "first")
            .into_result()
            .unwrap();
        store
            .insert(&[record(0, "Normal", "shared words", false)], "second")
            .into_result()
            .unwrap();

        let hits = store.query("shared words", 2).unwrap();
        assert_eq!(hits[0].score, hits[1].score);
        assert_eq!(hits[0].entry.metadata.source_document, "first");
        assert_eq!(hits[1].entry.metadata.source_document, "second");
    }

    #[test]
    fn duplicate_document_is_rejected_without_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        store.insert(&sample(), "report.docx").into_result().unwrap();

        let report = store.insert(&sample(), "report.docx");
        assert_eq!(report.inserted, 0);
        assert!(matches!(
            report.error,
            Some(Error::DuplicateDocument(ref d)) if d == "report.docx"
        ));
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn edited_document_with_new_positions_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        let first = [
            record(0, "Heading 1", "Memo", true),
            record(1, "Normal", "Old wording.", false),
        ];
        store.insert(&first, "memo.docx").into_result().unwrap();
        assert!(store.contains_document("memo.docx").unwrap());
        assert!(!store.contains_document("memo").unwrap());

        let edited = [record(2, "Normal", "New wording.", false)];
        let report = store.insert(&edited, "memo.docx");
        assert_eq!(report.inserted, 0);
        assert!(matches!(report.error, Some(Error::DuplicateDocument(_))));

        let ids: Vec<_> = store
            .entries_for_source("memo.docx", 30)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["memo.docx_0", "memo.docx_1"]);
    }

    #[test]
    fn remove_then_reinsert() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        store.insert(&sample(), "a.docx").into_result().unwrap();
        store.insert(&sample(), "b.docx").into_result().unwrap();

        assert_eq!(store.remove_document("a.docx").unwrap(), 3);
        assert_eq!(store.remove_document("a.docx").unwrap(), 0);
        assert_eq!(store.len().unwrap(), 3);
        assert!(store.entries_for_source("a.docx", 10).unwrap().is_empty());

        store.insert(&sample(), "a.docx").into_result().unwrap();
        assert_eq!(store.len().unwrap(), 6);
    }

    #[test]
    fn entries_for_source_in_storage_order_with_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        store.insert(&sample(), "a").into_result().unwrap();
        store
            .insert(&[record(0, "Normal", "other", false)], "b")
            .into_result()
            .unwrap();

        let all = store.entries_for_source("a", 10).unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a_0", "a_1", "a_3"]);

        assert_eq!(store.entries_for_source("a", 2).unwrap().len(), 2);
        assert!(store.entries_for_source("missing", 10).unwrap().is_empty());
    }

    #[test]
    fn large_documents_span_batches() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        let records: Vec<_> = (0..70)
            .map(|i| {
                record(i, "Normal", &format!("paragraph number {i}"), false)
            })
            .collect();

        let report = store.insert(&records, "long");
        assert_eq!(report.inserted, 70);
        assert!(report.is_ok());

        let stored = store.entries_for_source("long", 100).unwrap();
        let indexes: Vec<_> =
            stored.iter().map(|e| e.metadata.source_index).collect();
        assert_eq!(indexes, (0..70).collect::<Vec<_>>());
    }

    #[test]
    fn failed_batch_keeps_earlier_batches() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(
            &tmp.path().join("store.redb"),
            "test",
            Arc::new(FailingEmbedder {
                fail_on: 1,
                calls: AtomicUsize::new(0),
                inner: HashingEmbedder::default(),
            }),
        )
        .unwrap();
        let records: Vec<_> = (0..40)
            .map(|i| record(i, "Normal", "text", false))
            .collect();

        let report = store.insert(&records, "doc");
        assert_eq!(report.inserted, INSERT_BATCH_SIZE);
        match report.error {
            Some(Error::StorageWrite { ref document, ref source }) => {
                assert_eq!(document, "doc");
                assert!(matches!(**source, Error::Embedding(_)));
            }
            ref other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(store.len().unwrap(), INSERT_BATCH_SIZE as u64);
    }

    #[test]
    fn list_documents_counts_headers() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open(tmp.path());
        store.insert(&sample(), "b").into_result().unwrap();
        store
            .insert(&[record(0, "Title", "Cover", true)], "a")
            .into_result()
            .unwrap();

        let docs = store.list_documents().unwrap();
        assert_eq!(
            docs,
            vec![
                DocumentSummary {
                    name: "b".into(),
                    paragraphs: 3,
                    headers: 1
                },
                DocumentSummary {
                    name: "a".into(),
                    paragraphs: 1,
                    headers: 1
                },
            ]
        );
    }

    #[test]
    fn reopen_preserves_entries() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = open(tmp.path());
            store.insert(&sample(), "a").into_result().unwrap();
        }
        let store = open(tmp.path());
        assert_eq!(store.len().unwrap(), 3);
        let hits = store.query("quarterly results", 1).unwrap();
        assert_eq!(hits[0].entry.id, "a_0");
    }

    #[test]
    fn embedder_mismatch_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.redb");
        let small = Arc::new(HashingEmbedder::new(64));
        drop(ChunkStore::open(&path, "c", small).unwrap());

        let large: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(128));
        let err = ChunkStore::open(&path, "c", large.clone()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        // Other collections in the same file are independent.
        ChunkStore::open(&path, "d", large).unwrap();
    }

    #[test]
    fn collections_are_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.redb");
        {
            let embedder = Arc::new(HashingEmbedder::default());
            let store = ChunkStore::open(&path, "one", embedder).unwrap();
            store.insert(&sample(), "a").into_result().unwrap();
        }
        let embedder = Arc::new(HashingEmbedder::default());
        let other = ChunkStore::open(&path, "two", embedder).unwrap();
        assert_eq!(other.len().unwrap(), 0);
    }

    #[test]
    fn invalid_collection_names() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.redb");
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        assert!(matches!(
            ChunkStore::open(&path, "", embedder.clone()),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ChunkStore::open(&path, "has space", embedder),
            Err(Error::Config(_))
        ));
    }
}
