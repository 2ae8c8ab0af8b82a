//! Open-document text store.

use std::collections::HashMap;
use std::sync::RwLock;
use tower_lsp::lsp_types::Url;

/// Text content of every open document, keyed by URI.
///
/// The protocol is configured for full-document synchronization, so every
/// mutation is a whole-document replacement; no patching ever happens here.
/// Reads tolerate concurrent mutation from other handlers.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<Url, Vec<String>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the content of a newly opened document.
    pub fn open(&self, uri: Url, text: &str) {
        self.documents
            .write()
            .expect("document store lock poisoned")
            .insert(uri, split_lines(text));
    }

    /// Replace a document's content wholesale.
    pub fn replace(&self, uri: Url, text: &str) {
        self.documents
            .write()
            .expect("document store lock poisoned")
            .insert(uri, split_lines(text));
    }

    /// Drop a closed document.
    pub fn close(&self, uri: &Url) {
        self.documents
            .write()
            .expect("document store lock poisoned")
            .remove(uri);
    }

    /// Look up one line of an open document.
    ///
    /// Returns `None` for an unknown document or an out-of-range line; a
    /// late request racing a close is expected and must not fail the
    /// session, so callers treat `None` as "no suggestion".
    pub fn line_at(&self, uri: &Url, line: u32) -> Option<String> {
        self.documents
            .read()
            .expect("document store lock poisoned")
            .get(uri)?
            .get(line as usize)
            .cloned()
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}
