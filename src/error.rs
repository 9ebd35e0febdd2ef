use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("database storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("database transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("database table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("database commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),

    /// The document package could not be opened at all.
    #[error("cannot open document: {0}")]
    DocumentParse(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("failed to store '{document}': {source}")]
    StorageWrite {
        document: String,
        #[source]
        source: Box<Error>,
    },

    #[error("document '{0}' is already indexed")]
    DuplicateDocument(String),

    #[error("{failed} of {total} documents could not be ingested")]
    IngestFailed { failed: usize, total: usize },
}
