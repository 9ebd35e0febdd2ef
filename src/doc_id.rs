use std::fmt;

/// Identifier of one stored paragraph entry, `{source}_{index}`.
///
/// The source document name plus the paragraph's position is unique within
/// a collection, so re-ingesting a document produces the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId {
    pub source: String,
    pub index: usize,
}

impl EntryId {
    pub fn new(source: impl Into<String>, index: usize) -> Self {
        Self {
            source: source.into(),
            index,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.source, self.index)
    }
}
