//! docstyle - style palettes from word-processing documents.
//!
//! docstyle reads `.docx` files, resolves the effective formatting of every
//! paragraph through the style inheritance chain, and stores each paragraph
//! with a compact descriptor such as `[S: Heading 1] [P: 16.0] [B: True]`.
//! Given a description of new content, it finds the most similar stored
//! document and assembles a de-duplicated sample of its formatting (a
//! *style palette*) for downstream generation.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use docstyle::{
//!     ChunkStore, DataDir, DocumentIngestor, HardwareProfile, HashingEmbedder,
//!     StyleQueryEngine, media::MediaStore,
//! };
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let media = MediaStore::open(&data_dir.media_dir().unwrap()).unwrap();
//! let ingestor = DocumentIngestor::new(media);
//! let store = ChunkStore::open(
//!     &data_dir.store_db(),
//!     "styled_templates",
//!     Arc::new(HashingEmbedder::default()),
//! )
//! .unwrap();
//!
//! let records = ingestor.parse_file("report.docx".as_ref()).unwrap();
//! store.insert(&records, "report.docx").into_result().unwrap();
//!
//! let limits = HardwareProfile::detect().limits();
//! let engine = StyleQueryEngine::new(&store, limits);
//! if let Some(palette) =
//!     engine.search_style_reference("quarterly summary").unwrap()
//! {
//!     println!("{}", palette.full_context());
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config_db;
pub mod data_dir;
pub mod doc_id;
pub mod docx;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod ingestion;
pub mod media;
pub mod model_manager;
pub mod profile;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod text_util;
pub mod walker;

pub use chunking::IndexEntry;
pub use config_db::ConfigDb;
pub use data_dir::DataDir;
pub use doc_id::EntryId;
pub use embedding::{Embedder, HashingEmbedder};
pub use error::{Error, Result};
pub use ingest::{DocumentIngestor, ParagraphRecord};
pub use model_manager::{ColbertEmbedder, ModelManager};
pub use profile::{HardwareProfile, Limits};
pub use query::{StylePalette, StyleQueryEngine, StyleReference};
pub use resolver::StyleResolver;
pub use store::{ChunkStore, InsertReport};
