//! The persisted editing unit.
//!
//! A `Document` is the raw input text plus the parsed working tree. It is
//! replaced wholesale (never patched) by every editor action, and the
//! session persists it after each replacement.

use blockedit_parser::ast::BlockNode;
use serde::{Deserialize, Serialize};

/// Stored payload schema version. Payloads carrying any other version are
/// discarded on load instead of crashing the session.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The last raw HTML text the user supplied. Editing surface,
    /// independent of the parsed tree.
    pub input_html: String,
    /// Root-level block nodes of the working document.
    pub blocks: Vec<BlockNode>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.input_html.clear();
        self.blocks.clear();
    }

    pub fn to_persisted(&self) -> PersistedDocument {
        PersistedDocument {
            version: SCHEMA_VERSION,
            input_html: self.input_html.clone(),
            blocks: self.blocks.clone(),
        }
    }

    pub fn from_persisted(persisted: PersistedDocument) -> Self {
        Self {
            input_html: persisted.input_html,
            blocks: persisted.blocks,
        }
    }
}

/// The shape written to the persistence port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub version: u32,
    pub input_html: String,
    pub blocks: Vec<BlockNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_round_trip_keeps_fields() {
        let doc = Document {
            input_html: "<p>x</p>".to_string(),
            blocks: Vec::new(),
        };

        let restored = Document::from_persisted(doc.to_persisted());
        assert_eq!(restored, doc);
    }

    #[test]
    fn clear_empties_both_fields() {
        let mut doc = Document {
            input_html: "<p>x</p>".to_string(),
            blocks: Vec::new(),
        };
        doc.clear();
        assert!(doc.input_html.is_empty());
        assert!(doc.is_empty());
    }
}
