//! Capability ports for the session's two I/O boundaries.
//!
//! Clipboard and persistence are injected interfaces so the session can be
//! driven deterministically in tests. Both are fire-and-forget from the
//! document's point of view: a failed write is reported and the in-memory
//! state stays intact.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::{PersistedDocument, SCHEMA_VERSION};

#[derive(Error, Debug)]
pub enum PortError {
    #[error("clipboard rejected the write: {0}")]
    Clipboard(String),

    #[error("store unavailable: {0}")]
    Store(String),

    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait ClipboardPort {
    fn write_text(&mut self, text: &str) -> Result<(), PortError>;
}

pub trait PersistencePort {
    /// Load the stored document. Malformed or old-schema payloads load as
    /// `None`, never as errors.
    fn load(&self) -> Option<PersistedDocument>;

    fn save(&mut self, doc: &PersistedDocument) -> Result<(), PortError>;
}

/// Decode a raw payload, discarding anything that does not parse or does
/// not carry the current schema version.
fn decode_payload(raw: &str) -> Option<PersistedDocument> {
    let doc: PersistedDocument = serde_json::from_str(raw).ok()?;
    (doc.version == SCHEMA_VERSION).then_some(doc)
}

/// In-memory clipboard for tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    writes: Vec<String>,
    fail_next: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write fail, like a browser denying clipboard access.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    pub fn last(&self) -> Option<&str> {
        self.writes.last().map(String::as_str)
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl ClipboardPort for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), PortError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(PortError::Clipboard("write refused".to_string()));
        }
        self.writes.push(text.to_string());
        Ok(())
    }
}

/// In-memory store for tests. Holds the raw JSON payload so schema-version
/// gating is exercised the same way it is against a real store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Option<String>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an arbitrary raw payload, e.g. one written by
    /// an older schema.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            fail_saves: false,
        }
    }

    pub fn fail_saves(&mut self) {
        self.fail_saves = true;
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl PersistencePort for MemoryStore {
    fn load(&self) -> Option<PersistedDocument> {
        self.raw.as_deref().and_then(decode_payload)
    }

    fn save(&mut self, doc: &PersistedDocument) -> Result<(), PortError> {
        if self.fail_saves {
            return Err(PortError::Store("store rejected the save".to_string()));
        }
        self.raw = Some(serde_json::to_string(doc)?);
        Ok(())
    }
}

/// File-backed store: one JSON document per store path, the local-storage
/// analog for running outside a browser.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl PersistencePort for JsonFileStore {
    fn load(&self) -> Option<PersistedDocument> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        decode_payload(&raw)
    }

    fn save(&mut self, doc: &PersistedDocument) -> Result<(), PortError> {
        let raw = serde_json::to_string(doc)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_current_schema() {
        let mut store = MemoryStore::new();
        let doc = PersistedDocument {
            version: SCHEMA_VERSION,
            input_html: "<p>x</p>".to_string(),
            blocks: Vec::new(),
        };

        store.save(&doc).unwrap();
        assert_eq!(store.load(), Some(doc));
    }

    #[test]
    fn old_schema_payloads_are_discarded() {
        let store = MemoryStore::with_raw(r#"{"version":0,"input_html":"","blocks":[]}"#);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn malformed_payloads_are_discarded() {
        let store = MemoryStore::with_raw("{not json");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn clipboard_failure_is_one_shot() {
        let mut clipboard = MemoryClipboard::new();
        clipboard.fail_next();

        assert!(clipboard.write_text("a").is_err());
        assert!(clipboard.write_text("b").is_ok());
        assert_eq!(clipboard.last(), Some("b"));
    }
}
