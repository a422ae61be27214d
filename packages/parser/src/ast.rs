use serde::{Deserialize, Serialize};

/// How a node entered the tree.
///
/// `AutoSplit` marks the synthetic wrapper section created by the split
/// operation; everything parsed from user-supplied HTML is `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeOrigin {
    #[default]
    User,
    AutoSplit,
}

/// One element-rooted subtree of the edited document.
///
/// `outer_html` is the source of truth for what the node renders as and is
/// kept consistent with `children` after every mutation. Text and comment
/// nodes are not represented; their content lives inside the HTML strings
/// of the nearest element ancestor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    /// Stable identifier, assigned at parse/creation time, never reused.
    pub id: String,
    /// Lower-cased element tag name.
    pub tag: String,
    /// Nesting depth from the document root (root-level nodes are 0).
    pub depth: usize,
    /// Serialized form of this node and its entire subtree.
    pub outer_html: String,
    /// Serialized content without the node's own opening/closing tag.
    pub inner_html: String,
    /// Element children in document order; empty for leaves.
    pub children: Vec<BlockNode>,
    #[serde(default)]
    pub origin: NodeOrigin,
}

impl BlockNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Depth-first search for a node by id. Ids are unique per document, so the
/// first match is the only match.
pub fn find_block<'a>(nodes: &'a [BlockNode], target_id: &str) -> Option<&'a BlockNode> {
    for node in nodes {
        if node.id == target_id {
            return Some(node);
        }
        if let Some(found) = find_block(&node.children, target_id) {
            return Some(found);
        }
    }
    None
}

/// Every id in the tree, in depth-first document order.
pub fn collect_ids(nodes: &[BlockNode]) -> Vec<String> {
    fn walk(nodes: &[BlockNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.id.clone());
            walk(&node.children, out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

pub fn contains_id(nodes: &[BlockNode], target_id: &str) -> bool {
    find_block(nodes, target_id).is_some()
}

/// Total number of nodes in the tree.
pub fn block_count(nodes: &[BlockNode]) -> usize {
    nodes.iter().map(|n| 1 + block_count(&n.children)).sum()
}

/// Rebase a subtree list onto a new depth, recursively. Used whenever nodes
/// are repositioned so the `child.depth == parent.depth + 1` invariant holds.
pub fn set_depth(nodes: &mut [BlockNode], depth: usize) {
    for node in nodes {
        node.depth = depth;
        set_depth(&mut node.children, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, tag: &str, depth: usize) -> BlockNode {
        BlockNode {
            id: id.to_string(),
            tag: tag.to_string(),
            depth,
            outer_html: format!("<{tag}></{tag}>"),
            inner_html: String::new(),
            children: Vec::new(),
            origin: NodeOrigin::User,
        }
    }

    #[test]
    fn find_block_searches_depth_first() {
        let mut parent = leaf("a", "div", 0);
        parent.children = vec![leaf("b", "p", 1), leaf("c", "p", 1)];
        let tree = vec![parent, leaf("d", "section", 0)];

        assert_eq!(find_block(&tree, "c").map(|n| n.tag.as_str()), Some("p"));
        assert_eq!(find_block(&tree, "d").map(|n| n.depth), Some(0));
        assert!(find_block(&tree, "nope").is_none());
    }

    #[test]
    fn collect_ids_is_document_order() {
        let mut parent = leaf("a", "div", 0);
        parent.children = vec![leaf("b", "p", 1)];
        let tree = vec![parent, leaf("c", "p", 0)];

        assert_eq!(collect_ids(&tree), vec!["a", "b", "c"]);
        assert_eq!(block_count(&tree), 3);
    }

    #[test]
    fn set_depth_rebases_recursively() {
        let mut parent = leaf("a", "div", 7);
        parent.children = vec![leaf("b", "p", 9)];
        let mut tree = vec![parent];

        set_depth(&mut tree, 2);

        assert_eq!(tree[0].depth, 2);
        assert_eq!(tree[0].children[0].depth, 3);
    }

    #[test]
    fn origin_defaults_to_user_in_old_payloads() {
        // Payload written before the origin field existed.
        let raw = r#"{
            "id": "x-1",
            "tag": "div",
            "depth": 0,
            "outer_html": "<div></div>",
            "inner_html": "",
            "children": []
        }"#;

        let node: BlockNode = serde_json::from_str(raw).unwrap();
        assert_eq!(node.origin, NodeOrigin::User);
    }
}
