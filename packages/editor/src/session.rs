//! # Edit Session
//!
//! Orchestrates the codec, mutation engine, and grouping engine against one
//! persisted document.
//!
//! Every tree-changing operation replaces the document wholesale, reconciles
//! selection and groups against the new tree, and persists the result before
//! returning. Clipboard and persistence failures surface as `EditorError`
//! values; the in-memory document is never left partially mutated.

use blockedit_parser::ast::{collect_ids, find_block, BlockNode};
use blockedit_parser::{format_html, parse_blocks, serialize_blocks, IdGenerator};

use crate::document::Document;
use crate::errors::EditorError;
use crate::grouping::{Group, GroupEdit, GroupSet};
use crate::mutations::{InsertMode, Mutation};
use crate::ports::{ClipboardPort, PersistencePort};
use crate::selection::{DragGesture, SelectionSet};

pub struct EditSession<C: ClipboardPort, P: PersistencePort> {
    document: Document,
    selection: SelectionSet,
    groups: GroupSet,
    ids: IdGenerator,
    drag: Option<DragGesture>,
    clipboard: C,
    store: P,
}

impl<C: ClipboardPort, P: PersistencePort> EditSession<C, P> {
    /// Create an empty session. `store_name` seeds the id generator, so
    /// sessions over the same store mint ids under the same seed.
    pub fn new(store_name: &str, clipboard: C, store: P) -> Self {
        Self {
            document: Document::new(),
            selection: SelectionSet::new(),
            groups: GroupSet::default(),
            ids: IdGenerator::new(store_name),
            drag: None,
            clipboard,
            store,
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Rehydrate from the persistence port. Only applies when the current
    /// tree is empty, so a restore never clobbers in-progress edits.
    /// Returns whether a stored document was loaded.
    pub fn restore(&mut self) -> bool {
        if !self.document.is_empty() {
            return false;
        }
        let Some(persisted) = self.store.load() else {
            return false;
        };

        self.document = Document::from_persisted(persisted);
        let existing = collect_ids(&self.document.blocks);
        self.ids.resume_after(existing.iter().map(String::as_str));
        self.reconcile();
        tracing::debug!(blocks = self.document.blocks.len(), "restored session");
        true
    }

    /// Seed the session from raw HTML, only when the current tree is empty:
    /// rehydration must not clobber in-progress edits. Returns whether
    /// the text was adopted.
    pub fn load_from_text(&mut self, text: &str) -> Result<bool, EditorError> {
        if !self.document.is_empty() {
            return Ok(false);
        }
        self.import_html(text)?;
        Ok(true)
    }

    /// Update the raw editing surface without touching the parsed tree.
    pub fn set_input_html(&mut self, text: &str) -> Result<(), EditorError> {
        self.document.input_html = text.to_string();
        self.persist()
    }

    /// Explicitly re-parse the input text and replace the tree. Input that
    /// yields no elements leaves the session untouched and reports
    /// `NothingParsed` for the UI to surface.
    pub fn parse_now(&mut self) -> Result<usize, EditorError> {
        let parsed = parse_blocks(&self.document.input_html, &mut self.ids);
        if parsed.is_empty() {
            return Err(EditorError::NothingParsed);
        }

        let count = parsed.len();
        self.document.blocks = parsed;
        self.reconcile();
        self.persist()?;
        Ok(count)
    }

    /// Replace input text and tree in one step (file import, paste-all).
    pub fn import_html(&mut self, text: &str) -> Result<usize, EditorError> {
        let parsed = parse_blocks(text, &mut self.ids);
        if parsed.is_empty() {
            return Err(EditorError::NothingParsed);
        }

        let count = parsed.len();
        self.document.input_html = text.to_string();
        self.document.blocks = parsed;
        self.reconcile();
        self.persist()?;
        Ok(count)
    }

    /// Empty the document and all derived selection/group state.
    pub fn clear(&mut self) -> Result<(), EditorError> {
        self.document.clear();
        self.selection.clear();
        self.groups.clear();
        self.drag = None;
        self.persist()
    }

    // ---- mutations -------------------------------------------------------

    /// Apply a mutation, then reconcile and persist. The engine itself is
    /// total, so a stale target simply leaves the tree as it was.
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), EditorError> {
        tracing::debug!(?mutation, "applying mutation");
        self.document.blocks = mutation.apply(&self.document.blocks, &mut self.ids);
        self.reconcile();
        self.persist()
    }

    pub fn insert_html(
        &mut self,
        target_id: &str,
        html: &str,
        mode: InsertMode,
    ) -> Result<(), EditorError> {
        self.apply(Mutation::Insert {
            target_id: target_id.to_string(),
            html: html.to_string(),
            mode,
        })
    }

    pub fn delete_block(&mut self, target_id: &str) -> Result<(), EditorError> {
        self.apply(Mutation::Delete {
            target_id: target_id.to_string(),
        })
    }

    pub fn update_block_html(&mut self, target_id: &str, html: &str) -> Result<(), EditorError> {
        self.apply(Mutation::UpdateHtml {
            target_id: target_id.to_string(),
            html: html.to_string(),
        })
    }

    pub fn split_at(&mut self, target_id: &str) -> Result<(), EditorError> {
        self.apply(Mutation::Split {
            target_id: target_id.to_string(),
        })
    }

    // ---- selection -------------------------------------------------------

    pub fn toggle_selection(&mut self, id: &str) -> bool {
        self.selection.toggle(id)
    }

    pub fn begin_drag(&mut self, id: &str) {
        self.drag = Some(DragGesture::begin(&mut self.selection, id));
    }

    pub fn drag_enter(&mut self, id: &str) {
        if let Some(gesture) = self.drag.as_mut() {
            gesture.enter(&mut self.selection, id);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    // ---- groups ----------------------------------------------------------

    /// Form a manual group from the current selection.
    pub fn group_selected(&mut self) -> Result<Group, EditorError> {
        let selected = self.selection.ids();
        let group = self.groups.add_manual(&self.document.blocks, &selected)?;
        Ok(group)
    }

    pub fn ungroup(&mut self, index: usize) -> Result<(), EditorError> {
        self.groups.ungroup(index)?;
        Ok(())
    }

    pub fn open_group_for_edit(&self, index: usize) -> Result<GroupEdit, EditorError> {
        Ok(self.groups.open_group_for_edit(&self.document.blocks, index)?)
    }

    /// Commit an edited group back into the tree via replace-range.
    pub fn commit_group_edit(&mut self, edit: &GroupEdit, html: &str) -> Result<(), EditorError> {
        self.apply(Mutation::ReplaceRange {
            parent_id: edit.parent_id.clone(),
            start_index: edit.start_index,
            delete_count: edit.delete_count,
            html: html.to_string(),
        })
    }

    // ---- clipboard -------------------------------------------------------

    pub fn copy_block(&mut self, id: &str) -> Result<(), EditorError> {
        let block = find_block(&self.document.blocks, id)
            .ok_or_else(|| EditorError::UnknownBlock(id.to_string()))?;
        let html = block.outer_html.clone();
        self.clipboard
            .write_text(&html)
            .map_err(EditorError::Clipboard)
    }

    pub fn copy_all(&mut self) -> Result<(), EditorError> {
        let html = serialize_blocks(&self.document.blocks);
        self.clipboard
            .write_text(&html)
            .map_err(EditorError::Clipboard)
    }

    pub fn copy_group(&mut self, index: usize) -> Result<(), EditorError> {
        let html = self
            .groups
            .copy_group_html(&self.document.blocks, index)
            .ok_or(EditorError::UnknownGroup(index))?;
        self.clipboard
            .write_text(&html)
            .map_err(EditorError::Clipboard)
    }

    // ---- views -----------------------------------------------------------

    /// Pretty-printed markup for seeding a single block's edit dialog.
    pub fn formatted_block_html(&self, id: &str) -> Option<String> {
        find_block(&self.document.blocks, id).map(|block| format_html(&block.outer_html))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn blocks(&self) -> &[BlockNode] {
        &self.document.blocks
    }

    pub fn input_html(&self) -> &str {
        &self.document.input_html
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn groups(&self) -> &GroupSet {
        &self.groups
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    // ---- internal --------------------------------------------------------

    fn reconcile(&mut self) {
        self.selection.prune(&self.document.blocks);
        self.groups.reconcile(&self.document.blocks);
    }

    fn persist(&mut self) -> Result<(), EditorError> {
        self.store
            .save(&self.document.to_persisted())
            .map_err(EditorError::Persistence)
    }
}
