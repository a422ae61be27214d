//! # Tree Mutations
//!
//! Path/id-addressed operations on the block tree.
//!
//! ## Design
//!
//! 1. **Pure**: every operation is `(tree, ...) -> new tree`; inputs are
//!    never mutated.
//! 2. **Total**: a missing target or an input that parses to nothing is a
//!    no-op returning the tree unchanged, never an error. The UI surfaces
//!    these as notices; the document is user-pasted and frequently
//!    malformed.
//! 3. **Atomic**: either the full new tree is produced or the old tree is
//!    kept; no partially mutated state escapes.
//!
//! Internally the recursive walkers report hit/miss through `Option`, so a
//! miss is explicit rather than a silent pass-through.
//!
//! Containers on the mutation path are rebuilt from their opening tag plus
//! their children's outer HTML, keeping `outer_html` consistent with
//! `children` at every depth. Loose text directly inside a rebuilt
//! container is not preserved.

use blockedit_parser::ast::{find_block, set_depth, BlockNode, NodeOrigin};
use blockedit_parser::{parse_blocks, rebuild_outer, serialize_blocks, IdGenerator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertMode {
    /// Prepend the new nodes to the target's children.
    Inside,
    /// Splice the new nodes immediately after the target among its siblings.
    After,
}

/// One editor action on the tree, serializable so the session can log it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    Insert {
        target_id: String,
        html: String,
        mode: InsertMode,
    },
    Delete {
        target_id: String,
    },
    UpdateHtml {
        target_id: String,
        html: String,
    },
    ReplaceRange {
        parent_id: Option<String>,
        start_index: usize,
        delete_count: usize,
        html: String,
    },
    Split {
        target_id: String,
    },
}

impl Mutation {
    /// Apply this mutation, returning the new tree. Total: misses and
    /// empty parses return the input tree unchanged.
    pub fn apply(&self, tree: &[BlockNode], ids: &mut IdGenerator) -> Vec<BlockNode> {
        match self {
            Mutation::Insert {
                target_id,
                html,
                mode,
            } => insert_at_position(tree, target_id, html, *mode, ids),

            Mutation::Delete { target_id } => delete_by_id(tree, target_id),

            Mutation::UpdateHtml { target_id, html } => update_html(tree, target_id, html, ids),

            Mutation::ReplaceRange {
                parent_id,
                start_index,
                delete_count,
                html,
            } => {
                let new_nodes = parse_blocks(html, ids);
                replace_range(
                    tree,
                    parent_id.as_deref(),
                    *start_index,
                    *delete_count,
                    &new_nodes,
                )
            }

            Mutation::Split { target_id } => split_and_close_ancestors(tree, target_id, ids),
        }
    }
}

/// Parse `new_html` and insert the resulting nodes at the target.
///
/// `Inside` prepends to the target's children; `After` splices right after
/// the target among its siblings. Zero parsed nodes or a missing target is
/// a no-op.
pub fn insert_at_position(
    tree: &[BlockNode],
    target_id: &str,
    new_html: &str,
    mode: InsertMode,
    ids: &mut IdGenerator,
) -> Vec<BlockNode> {
    let parsed = parse_blocks(new_html, ids);
    if parsed.is_empty() {
        return tree.to_vec();
    }

    let result = match mode {
        InsertMode::Inside => insert_inside(tree, target_id, &parsed, 0),
        InsertMode::After => insert_after(tree, target_id, &parsed, 0),
    };
    result.unwrap_or_else(|| tree.to_vec())
}

fn insert_inside(
    nodes: &[BlockNode],
    target_id: &str,
    new_blocks: &[BlockNode],
    depth: usize,
) -> Option<Vec<BlockNode>> {
    let mut hit = false;
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        if hit {
            out.push(node.clone());
            continue;
        }
        if node.id == target_id {
            let mut children = new_blocks.to_vec();
            set_depth(&mut children, depth + 1);
            children.extend(node.children.iter().cloned());
            out.push(rebuild_container(node, children));
            hit = true;
        } else if let Some(children) = insert_inside(&node.children, target_id, new_blocks, depth + 1)
        {
            out.push(rebuild_container(node, children));
            hit = true;
        } else {
            out.push(node.clone());
        }
    }

    hit.then_some(out)
}

fn insert_after(
    nodes: &[BlockNode],
    target_id: &str,
    new_blocks: &[BlockNode],
    depth: usize,
) -> Option<Vec<BlockNode>> {
    let mut hit = false;
    let mut out = Vec::with_capacity(nodes.len() + new_blocks.len());

    for node in nodes {
        if hit {
            out.push(node.clone());
            continue;
        }
        if node.id == target_id {
            out.push(node.clone());
            let mut inserted = new_blocks.to_vec();
            set_depth(&mut inserted, depth);
            out.extend(inserted);
            hit = true;
        } else if let Some(children) = insert_after(&node.children, target_id, new_blocks, depth + 1)
        {
            out.push(rebuild_container(node, children));
            hit = true;
        } else {
            out.push(node.clone());
        }
    }

    hit.then_some(out)
}

/// Remove the node with `target_id` and its whole subtree. Children are
/// deleted with it; there is no unwrap semantics.
pub fn delete_by_id(tree: &[BlockNode], target_id: &str) -> Vec<BlockNode> {
    delete_recursive(tree, target_id).unwrap_or_else(|| tree.to_vec())
}

fn delete_recursive(nodes: &[BlockNode], target_id: &str) -> Option<Vec<BlockNode>> {
    let mut hit = false;
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        if hit {
            out.push(node.clone());
            continue;
        }
        if node.id == target_id {
            hit = true;
        } else if let Some(children) = delete_recursive(&node.children, target_id) {
            out.push(rebuild_container(node, children));
            hit = true;
        } else {
            out.push(node.clone());
        }
    }

    hit.then_some(out)
}

/// Re-parse `new_html` into one node and replace the target's content with
/// it, preserving the target's id and depth so selections and groups
/// survive the edit.
///
/// When the target is a `section`, the supplied HTML is treated as inner
/// content and rewrapped in the original section's opening tag first, so
/// editing a section never touches its own attributes.
pub fn update_html(
    tree: &[BlockNode],
    target_id: &str,
    new_html: &str,
    ids: &mut IdGenerator,
) -> Vec<BlockNode> {
    let Some(target) = find_block(tree, target_id) else {
        return tree.to_vec();
    };

    let source = if target.tag == "section" {
        match rebuild_outer(&target.outer_html, new_html.trim()) {
            Some(wrapped) => wrapped,
            None => new_html.to_string(),
        }
    } else {
        new_html.to_string()
    };

    let Some(replacement) = parse_blocks(&source, ids).into_iter().next() else {
        return tree.to_vec();
    };

    update_recursive(tree, target_id, &replacement).unwrap_or_else(|| tree.to_vec())
}

fn update_recursive(
    nodes: &[BlockNode],
    target_id: &str,
    replacement: &BlockNode,
) -> Option<Vec<BlockNode>> {
    let mut hit = false;
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        if hit {
            out.push(node.clone());
            continue;
        }
        if node.id == target_id {
            let mut updated = replacement.clone();
            updated.id = node.id.clone();
            set_depth(std::slice::from_mut(&mut updated), node.depth);
            out.push(updated);
            hit = true;
        } else if let Some(children) = update_recursive(&node.children, target_id, replacement) {
            out.push(rebuild_container(node, children));
            hit = true;
        } else {
            out.push(node.clone());
        }
    }

    hit.then_some(out)
}

/// Generalized splice: under `parent_id` (or the root list when `None`),
/// remove `delete_count` nodes starting at `start_index` and insert
/// `new_nodes` in their place. Out-of-range indices clamp to the sibling
/// list; an unknown parent is a no-op.
pub fn replace_range(
    tree: &[BlockNode],
    parent_id: Option<&str>,
    start_index: usize,
    delete_count: usize,
    new_nodes: &[BlockNode],
) -> Vec<BlockNode> {
    match parent_id {
        None => splice(tree, start_index, delete_count, new_nodes, 0),
        Some(pid) => {
            replace_in_parent(tree, pid, start_index, delete_count, new_nodes)
                .unwrap_or_else(|| tree.to_vec())
        }
    }
}

fn splice(
    siblings: &[BlockNode],
    start_index: usize,
    delete_count: usize,
    new_nodes: &[BlockNode],
    depth: usize,
) -> Vec<BlockNode> {
    let start = start_index.min(siblings.len());
    let end = start_index.saturating_add(delete_count).min(siblings.len());

    let mut out = Vec::with_capacity(siblings.len() - (end - start) + new_nodes.len());
    out.extend(siblings[..start].iter().cloned());
    let mut inserted = new_nodes.to_vec();
    set_depth(&mut inserted, depth);
    out.extend(inserted);
    out.extend(siblings[end..].iter().cloned());
    out
}

fn replace_in_parent(
    nodes: &[BlockNode],
    parent_id: &str,
    start_index: usize,
    delete_count: usize,
    new_nodes: &[BlockNode],
) -> Option<Vec<BlockNode>> {
    let mut hit = false;
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        if hit {
            out.push(node.clone());
            continue;
        }
        if node.id == parent_id {
            let children = splice(
                &node.children,
                start_index,
                delete_count,
                new_nodes,
                node.depth + 1,
            );
            out.push(rebuild_container(node, children));
            hit = true;
        } else if let Some(children) =
            replace_in_parent(&node.children, parent_id, start_index, delete_count, new_nodes)
        {
            out.push(rebuild_container(node, children));
            hit = true;
        } else {
            out.push(node.clone());
        }
    }

    hit.then_some(out)
}

/// Cut the document at the target node: every ancestor on the path is
/// truncated to the nodes kept before/including the target at its level,
/// and everything after the cut (later siblings at every level, collected
/// innermost-first) moves into a new root-level
/// `<section class="split-section">` appended after the topmost ancestor.
///
/// If nothing remains after the cut at any level, the tree is returned
/// unchanged (documented behavior for a target that is already last
/// everywhere on its path).
pub fn split_and_close_ancestors(
    tree: &[BlockNode],
    target_id: &str,
    ids: &mut IdGenerator,
) -> Vec<BlockNode> {
    let Some(path) = find_path(tree, target_id) else {
        return tree.to_vec();
    };

    // Sibling lists along the path, outermost first.
    let mut levels: Vec<&[BlockNode]> = Vec::with_capacity(path.len());
    let mut current: &[BlockNode] = tree;
    for (level, &index) in path.iter().enumerate() {
        levels.push(current);
        if level + 1 < path.len() {
            current = &current[index].children;
        }
    }

    let innermost = path.len() - 1;
    let mut remaining: Vec<BlockNode> = Vec::new();
    for level in (0..=innermost).rev() {
        remaining.extend(levels[level][path[level] + 1..].iter().cloned());
    }
    if remaining.is_empty() {
        return tree.to_vec();
    }

    set_depth(&mut remaining, 1);
    let inner = serialize_blocks(&remaining);
    let section = BlockNode {
        id: ids.new_id(),
        tag: "section".to_string(),
        depth: 0,
        outer_html: format!("<section class=\"split-section\">{inner}</section>"),
        inner_html: inner,
        children: remaining,
        origin: NodeOrigin::AutoSplit,
    };

    // Rewrite ancestors bottom-up around the kept prefix at each level.
    let mut kept: Vec<BlockNode> = levels[innermost][..=path[innermost]].to_vec();
    for level in (0..innermost).rev() {
        let index = path[level];
        let rebuilt = rebuild_container(&levels[level][index], kept);
        let mut level_nodes: Vec<BlockNode> = levels[level][..index].to_vec();
        level_nodes.push(rebuilt);
        kept = level_nodes;
    }

    kept.push(section);
    kept
}

/// Sibling index at every level from root to the target, depth-first.
fn find_path(nodes: &[BlockNode], target_id: &str) -> Option<Vec<usize>> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id == target_id {
            return Some(vec![index]);
        }
        if let Some(mut rest) = find_path(&node.children, target_id) {
            let mut path = Vec::with_capacity(rest.len() + 1);
            path.push(index);
            path.append(&mut rest);
            return Some(path);
        }
    }
    None
}

/// A container whose children changed: re-derive inner/outer HTML from the
/// new children so the tree-shape invariant holds. Falls back to the stale
/// outer HTML if the stored markup no longer reparses to an element.
fn rebuild_container(node: &BlockNode, children: Vec<BlockNode>) -> BlockNode {
    let inner = serialize_blocks(&children);
    let outer =
        rebuild_outer(&node.outer_html, &inner).unwrap_or_else(|| node.outer_html.clone());
    BlockNode {
        id: node.id.clone(),
        tag: node.tag.clone(),
        depth: node.depth,
        outer_html: outer,
        inner_html: inner,
        children,
        origin: node.origin,
    }
}
