//! # Blockedit Editor
//!
//! Structural editing engine for HTML block documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: HTML text → block tree              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session + mutations + grouping      │
//! │  - Pure, total tree mutations               │
//! │  - Selection and drag gestures              │
//! │  - Manual + automatic (heading) groups      │
//! │  - Persist + reconcile after every change   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ports: clipboard + persistence boundaries   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the document**: every action replaces it wholesale;
//!    nothing patches in place.
//! 2. **Total mutations**: stale targets and empty parses are no-ops, not
//!    errors; the input is user-pasted HTML.
//! 3. **Identity survives edits**: node ids are never recomputed from
//!    content, so selections and groups outlive content changes.
//! 4. **Reconcile after every change**: selection and group membership are
//!    pruned against the new tree before anything else observes it.

mod document;
mod errors;
mod grouping;
mod mutations;
mod ports;
mod selection;
mod session;

pub use document::{Document, PersistedDocument, SCHEMA_VERSION};
pub use errors::EditorError;
pub use grouping::{
    auto_group_by_heading, build_manual_group, build_meta_map, BlockMeta, Group, GroupEdit,
    GroupError, GroupKind, GroupSet, DEFAULT_HEADING_TAG,
};
pub use mutations::{
    delete_by_id, insert_at_position, replace_range, split_and_close_ancestors, update_html,
    InsertMode, Mutation,
};
pub use ports::{
    ClipboardPort, JsonFileStore, MemoryClipboard, MemoryStore, PersistencePort, PortError,
};
pub use selection::{DragGesture, DragMode, SelectionSet};
pub use session::EditSession;

// Re-export the tree model for convenience
pub use blockedit_parser::ast::{BlockNode, NodeOrigin};
pub use blockedit_parser::IdGenerator;
