//! # Grouping
//!
//! Groups of contiguous same-parent blocks.
//!
//! Two kinds exist: `Manual` groups are user-formed from the selection and
//! editable; `Automatic` groups are derived from root-level headings and
//! rebuilt from scratch on every tree change. Validation failures are
//! distinct, user-facing reasons; a candidate is never silently coerced
//! into a best-effort group.

use std::collections::{HashMap, HashSet};

use blockedit_parser::ast::{find_block, BlockNode};
use blockedit_parser::serialize_blocks;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HEADING_TAG: &str = "h2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    /// User-formed via selection; editable and removable.
    Manual,
    /// Heading-anchored, recomputed on every tree change; immutable.
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Member ids sorted by sibling index at formation time.
    pub member_ids: Vec<String>,
    pub kind: GroupKind,
}

impl Group {
    pub fn is_mutable(&self) -> bool {
        self.kind == GroupKind::Manual
    }

    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupError {
    #[error("a group needs at least two members")]
    NotEnoughMembers,

    #[error("node no longer exists: {0}")]
    MissingNode(String),

    #[error("selected nodes do not share a parent")]
    MixedParents,

    #[error("selected nodes are not contiguous siblings")]
    NonContiguous,

    #[error("automatic groups cannot be changed")]
    Immutable,
}

/// Position of a node relative to its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMeta {
    pub parent_id: Option<String>,
    pub index: usize,
}

/// Derived index over the tree: id → parent and sibling index. Rebuilt per
/// operation; the tree is a user-pasted document, one synchronous pass.
pub fn build_meta_map(tree: &[BlockNode]) -> HashMap<String, BlockMeta> {
    fn walk(nodes: &[BlockNode], parent: Option<&str>, map: &mut HashMap<String, BlockMeta>) {
        for (index, node) in nodes.iter().enumerate() {
            map.insert(
                node.id.clone(),
                BlockMeta {
                    parent_id: parent.map(str::to_string),
                    index,
                },
            );
            walk(&node.children, Some(&node.id), map);
        }
    }

    let mut map = HashMap::new();
    walk(tree, None, &mut map);
    map
}

/// Validate a selection as a manual group candidate.
///
/// Members must all exist, share one parent (or all be root-level), and be
/// index-contiguous among their siblings. On success the members are
/// sorted by sibling index.
pub fn build_manual_group(
    tree: &[BlockNode],
    selected_ids: &[String],
) -> Result<Group, GroupError> {
    if selected_ids.len() < 2 {
        return Err(GroupError::NotEnoughMembers);
    }

    let meta = build_meta_map(tree);
    let mut resolved: Vec<(String, BlockMeta)> = Vec::with_capacity(selected_ids.len());
    for id in selected_ids {
        let m = meta
            .get(id)
            .ok_or_else(|| GroupError::MissingNode(id.clone()))?;
        resolved.push((id.clone(), m.clone()));
    }

    let parent = resolved[0].1.parent_id.clone();
    if resolved.iter().any(|(_, m)| m.parent_id != parent) {
        return Err(GroupError::MixedParents);
    }

    resolved.sort_by_key(|(_, m)| m.index);
    for pair in resolved.windows(2) {
        if pair[1].1.index != pair[0].1.index + 1 {
            return Err(GroupError::NonContiguous);
        }
    }

    Ok(Group {
        member_ids: resolved.into_iter().map(|(id, _)| id).collect(),
        kind: GroupKind::Manual,
    })
}

/// Scan root-level siblings: every node with `heading_tag` starts a group
/// that absorbs following roots up to the next such heading. Pure and
/// recomputed from scratch; nodes before the first heading belong to no
/// group.
pub fn auto_group_by_heading(tree: &[BlockNode], heading_tag: &str) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for node in tree {
        if node.tag == heading_tag {
            if let Some(member_ids) = current.take() {
                groups.push(Group {
                    member_ids,
                    kind: GroupKind::Automatic,
                });
            }
            current = Some(vec![node.id.clone()]);
        } else if let Some(members) = current.as_mut() {
            members.push(node.id.clone());
        }
    }

    if let Some(member_ids) = current.take() {
        groups.push(Group {
            member_ids,
            kind: GroupKind::Automatic,
        });
    }

    groups
}

/// Everything `replace_range` needs to commit a group's "edit as HTML"
/// action once the user is done with the concatenated markup.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEdit {
    pub parent_id: Option<String>,
    pub start_index: usize,
    pub delete_count: usize,
    pub initial_html: String,
}

/// Manual and automatic groups over one document.
#[derive(Debug, Clone)]
pub struct GroupSet {
    manual: Vec<Group>,
    automatic: Vec<Group>,
    heading_tag: String,
}

impl Default for GroupSet {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_TAG)
    }
}

impl GroupSet {
    pub fn new(heading_tag: impl Into<String>) -> Self {
        Self {
            manual: Vec::new(),
            automatic: Vec::new(),
            heading_tag: heading_tag.into(),
        }
    }

    pub fn manual(&self) -> &[Group] {
        &self.manual
    }

    pub fn automatic(&self) -> &[Group] {
        &self.automatic
    }

    /// All groups as the UI lists them: automatic first, then manual.
    /// Indices passed to `ungroup`/`copy_group_html`/`open_group_for_edit`
    /// address this combined list.
    pub fn all(&self) -> Vec<&Group> {
        self.automatic.iter().chain(self.manual.iter()).collect()
    }

    pub fn len(&self) -> usize {
        self.automatic.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.automatic.is_empty() && self.manual.is_empty()
    }

    fn get(&self, index: usize) -> Option<&Group> {
        if index < self.automatic.len() {
            self.automatic.get(index)
        } else {
            self.manual.get(index - self.automatic.len())
        }
    }

    /// Form a manual group from the current selection. Pre-existing manual
    /// groups lose any member taken over by the new group and are dropped
    /// entirely when fewer than two members remain.
    pub fn add_manual(
        &mut self,
        tree: &[BlockNode],
        selected_ids: &[String],
    ) -> Result<Group, GroupError> {
        let group = build_manual_group(tree, selected_ids)?;

        let taken: HashSet<&str> = group.member_ids.iter().map(String::as_str).collect();
        for existing in &mut self.manual {
            existing.member_ids.retain(|id| !taken.contains(id.as_str()));
        }
        self.manual.retain(|g| g.len() >= 2);

        self.manual.push(group.clone());
        Ok(group)
    }

    /// Remove the group at `index`. Automatic groups reject this; the
    /// caller surfaces that as a notice, not a failure.
    pub fn ungroup(&mut self, index: usize) -> Result<Group, GroupError> {
        if index < self.automatic.len() {
            return Err(GroupError::Immutable);
        }
        let manual_index = index - self.automatic.len();
        if manual_index >= self.manual.len() {
            return Err(GroupError::MissingNode(format!("group #{index}")));
        }
        Ok(self.manual.remove(manual_index))
    }

    /// Serialized outer HTML of the group's members, in member order.
    pub fn copy_group_html(&self, tree: &[BlockNode], index: usize) -> Option<String> {
        let group = self.get(index)?;
        let members: Vec<BlockNode> = group
            .member_ids
            .iter()
            .filter_map(|id| find_block(tree, id).cloned())
            .collect();
        if members.is_empty() {
            return None;
        }
        Some(serialize_blocks(&members))
    }

    /// Prepare a group's "edit as HTML" action. Automatic groups reject
    /// this; manual groups yield the splice coordinates and the
    /// concatenated member markup to seed the dialog with.
    pub fn open_group_for_edit(
        &self,
        tree: &[BlockNode],
        index: usize,
    ) -> Result<GroupEdit, GroupError> {
        let group = self
            .get(index)
            .ok_or_else(|| GroupError::MissingNode(format!("group #{index}")))?;
        if !group.is_mutable() {
            return Err(GroupError::Immutable);
        }

        let meta = build_meta_map(tree);
        let first = group
            .member_ids
            .first()
            .ok_or(GroupError::NotEnoughMembers)?;
        let first_meta = meta
            .get(first)
            .ok_or_else(|| GroupError::MissingNode(first.clone()))?;

        let initial_html = self
            .copy_group_html(tree, index)
            .ok_or_else(|| GroupError::MissingNode(first.clone()))?;

        Ok(GroupEdit {
            parent_id: first_meta.parent_id.clone(),
            start_index: first_meta.index,
            delete_count: group.len(),
            initial_html,
        })
    }

    /// Bring groups back in line with a mutated tree: drop member ids that
    /// no longer exist, drop manual groups that fall below two survivors
    /// or lose contiguity, and rebuild the automatic set wholesale.
    pub fn reconcile(&mut self, tree: &[BlockNode]) {
        let meta = build_meta_map(tree);

        for group in &mut self.manual {
            group.member_ids.retain(|id| meta.contains_key(id));
            group
                .member_ids
                .sort_by_key(|id| meta.get(id).map(|m| m.index).unwrap_or(usize::MAX));
        }
        self.manual
            .retain(|group| group.len() >= 2 && is_contiguous(group, &meta));

        self.automatic = auto_group_by_heading(tree, &self.heading_tag);
    }

    pub fn clear(&mut self) {
        self.manual.clear();
        self.automatic.clear();
    }
}

fn is_contiguous(group: &Group, meta: &HashMap<String, BlockMeta>) -> bool {
    let mut positions = Vec::with_capacity(group.len());
    for id in &group.member_ids {
        match meta.get(id) {
            Some(m) => positions.push(m),
            None => return false,
        }
    }
    let parent = &positions[0].parent_id;
    if positions.iter().any(|m| &m.parent_id != parent) {
        return false;
    }
    positions
        .windows(2)
        .all(|pair| pair[1].index == pair[0].index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockedit_parser::{parse_blocks, IdGenerator};

    fn parse(html: &str) -> Vec<BlockNode> {
        let mut ids = IdGenerator::new("grouping-tests");
        parse_blocks(html, &mut ids)
    }

    #[test]
    fn meta_map_tracks_parent_and_index() {
        let tree = parse("<div><p>a</p><p>b</p></div><p>c</p>");
        let meta = build_meta_map(&tree);

        let root_meta = &meta[&tree[1].id];
        assert_eq!(root_meta.parent_id, None);
        assert_eq!(root_meta.index, 1);

        let child_meta = &meta[&tree[0].children[1].id];
        assert_eq!(child_meta.parent_id.as_deref(), Some(tree[0].id.as_str()));
        assert_eq!(child_meta.index, 1);
    }

    #[test]
    fn manual_group_requires_two_members() {
        let tree = parse("<p>a</p><p>b</p>");
        let result = build_manual_group(&tree, &[tree[0].id.clone()]);
        assert_eq!(result, Err(GroupError::NotEnoughMembers));
    }

    #[test]
    fn manual_group_rejects_mixed_parents() {
        let tree = parse("<p>root</p><div><p>nested</p></div>");
        let selected = vec![tree[0].id.clone(), tree[1].children[0].id.clone()];
        assert_eq!(
            build_manual_group(&tree, &selected),
            Err(GroupError::MixedParents)
        );
    }

    #[test]
    fn manual_group_rejects_gaps() {
        let tree = parse("<p>a</p><p>b</p><p>c</p>");
        let selected = vec![tree[0].id.clone(), tree[2].id.clone()];
        assert_eq!(
            build_manual_group(&tree, &selected),
            Err(GroupError::NonContiguous)
        );
    }

    #[test]
    fn manual_group_rejects_missing_nodes() {
        let tree = parse("<p>a</p><p>b</p>");
        let selected = vec![tree[0].id.clone(), "gone".to_string()];
        assert_eq!(
            build_manual_group(&tree, &selected),
            Err(GroupError::MissingNode("gone".to_string()))
        );
    }

    #[test]
    fn manual_group_sorts_members_by_index() {
        let tree = parse("<p>a</p><p>b</p><p>c</p>");
        // Selection order is arbitrary; the group is document-ordered.
        let selected = vec![tree[2].id.clone(), tree[1].id.clone()];
        let group = build_manual_group(&tree, &selected).unwrap();
        assert_eq!(group.member_ids, vec![tree[1].id.clone(), tree[2].id.clone()]);
        assert!(group.is_mutable());
    }

    #[test]
    fn auto_groups_anchor_on_headings() {
        let tree = parse("<h2>A</h2><p>1</p><p>2</p><h2>B</h2><div>3</div>");
        let groups = auto_group_by_heading(&tree, "h2");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].member_ids.len(), 3);
        assert_eq!(groups[1].member_ids.len(), 2);
        assert!(!groups[0].is_mutable());
    }

    #[test]
    fn auto_groups_ignore_leading_nodes_and_nested_headings() {
        let tree = parse("<p>preamble</p><div><h2>nested</h2></div><h2>A</h2><p>1</p>");
        let groups = auto_group_by_heading(&tree, "h2");

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_ids[0], tree[2].id);
    }

    #[test]
    fn new_manual_group_steals_overlapping_members() {
        let tree = parse("<p>a</p><p>b</p><p>c</p><p>d</p>");
        let mut groups = GroupSet::default();

        groups
            .add_manual(&tree, &[tree[0].id.clone(), tree[1].id.clone()])
            .unwrap();
        // Overlaps the first group on "b"; the old group drops below two
        // members and disappears.
        groups
            .add_manual(&tree, &[tree[1].id.clone(), tree[2].id.clone()])
            .unwrap();

        assert_eq!(groups.manual().len(), 1);
        assert_eq!(
            groups.manual()[0].member_ids,
            vec![tree[1].id.clone(), tree[2].id.clone()]
        );
    }

    #[test]
    fn ungroup_rejects_automatic_groups() {
        let tree = parse("<h2>A</h2><p>1</p>");
        let mut groups = GroupSet::default();
        groups.reconcile(&tree);

        assert_eq!(groups.automatic().len(), 1);
        assert_eq!(groups.ungroup(0), Err(GroupError::Immutable));
    }

    #[test]
    fn open_for_edit_yields_replace_range_args() {
        let tree = parse("<p>a</p><p>b</p><p>c</p>");
        let mut groups = GroupSet::default();
        groups
            .add_manual(&tree, &[tree[1].id.clone(), tree[2].id.clone()])
            .unwrap();

        let edit = groups.open_group_for_edit(&tree, 0).unwrap();
        assert_eq!(edit.parent_id, None);
        assert_eq!(edit.start_index, 1);
        assert_eq!(edit.delete_count, 2);
        assert_eq!(edit.initial_html, "<p>b</p>\n<p>c</p>");
    }

    #[test]
    fn open_for_edit_rejects_automatic_groups() {
        let tree = parse("<h2>A</h2><p>1</p>");
        let mut groups = GroupSet::default();
        groups.reconcile(&tree);

        assert_eq!(
            groups.open_group_for_edit(&tree, 0),
            Err(GroupError::Immutable)
        );
    }

    #[test]
    fn reconcile_drops_dead_and_broken_groups() {
        let tree = parse("<p>a</p><p>b</p><p>c</p>");
        let mut groups = GroupSet::default();
        groups
            .add_manual(&tree, &[tree[0].id.clone(), tree[1].id.clone()])
            .unwrap();

        // "b" disappears; the group falls below two members.
        let smaller = parse("<p>a</p>");
        let mut renamed = smaller;
        renamed[0].id = tree[0].id.clone();
        groups.reconcile(&renamed);

        assert!(groups.manual().is_empty());
    }
}
