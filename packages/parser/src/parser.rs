//! HTML text → block tree.
//!
//! Parsing is deliberately lenient: anything html5ever recovers is accepted
//! as recovered. The only fail-soft conditions are empty/whitespace input
//! and input that yields no element nodes at all; both produce an empty
//! tree rather than an error, because the document is user-pasted and
//! frequently malformed.

use scraper::{ElementRef, Html};

use crate::ast::{BlockNode, NodeOrigin};
use crate::id_generator::IdGenerator;

/// Parse an HTML fragment into root-level block nodes.
///
/// Walks the fragment's element children depth-first, assigning a fresh id
/// to every element and capturing its outer/inner HTML at parse time. Text
/// and comment nodes are skipped as tree nodes; their content is retained
/// inside the captured HTML strings of the nearest element ancestor.
pub fn parse_blocks(html: &str, ids: &mut IdGenerator) -> Vec<BlockNode> {
    let trimmed = html.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(trimmed);
    let blocks = walk_elements(fragment.root_element(), 0, ids);
    tracing::debug!(roots = blocks.len(), "parsed html fragment");
    blocks
}

fn walk_elements(parent: ElementRef<'_>, depth: usize, ids: &mut IdGenerator) -> Vec<BlockNode> {
    let mut blocks = Vec::new();
    for child in parent.children() {
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };
        blocks.push(BlockNode {
            id: ids.new_id(),
            tag: element.value().name().to_ascii_lowercase(),
            depth,
            outer_html: element.html(),
            inner_html: element.inner_html(),
            children: walk_elements(element, depth + 1, ids),
            origin: NodeOrigin::User,
        });
    }
    blocks
}

/// Extract the opening tag (tag name plus attributes as parsed) of the root
/// element of a serialized node, e.g. `<section class="intro">`.
pub fn opening_tag(outer_html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(outer_html);
    let element = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)?;
    Some(open_tag_text(element, false))
}

/// Rewrap new inner content in the opening tag of `outer_html`'s root
/// element, preserving that element's attributes.
///
/// This backs the rule that editing a `section` edits only its content, and
/// the ancestor rewrite performed by container mutations.
pub fn rebuild_outer(outer_html: &str, new_inner: &str) -> Option<String> {
    let fragment = Html::parse_fragment(outer_html);
    let element = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)?;
    let name = element.value().name().to_ascii_lowercase();
    Some(format!(
        "{}{}</{}>",
        open_tag_text(element, false),
        new_inner,
        name
    ))
}

/// Render an element's opening tag. With `self_closing`, emits the
/// `<tag attr="v" />` form used by the formatter for empty leaves.
pub(crate) fn open_tag_text(element: ElementRef<'_>, self_closing: bool) -> String {
    let mut tag = String::new();
    tag.push('<');
    tag.push_str(&element.value().name().to_ascii_lowercase());
    for (name, value) in element.value().attrs() {
        tag.push(' ');
        tag.push_str(name);
        tag.push_str("=\"");
        tag.push_str(&escape_attr(value));
        tag.push('"');
    }
    if self_closing {
        tag.push_str(" />");
    } else {
        tag.push('>');
    }
    tag
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{block_count, collect_ids};

    fn gen() -> IdGenerator {
        IdGenerator::new("parser-tests")
    }

    #[test]
    fn parses_nested_elements_into_a_tree() {
        let mut ids = gen();
        let blocks = parse_blocks("<div><p>Hello</p></div>", &mut ids);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tag, "div");
        assert_eq!(blocks[0].depth, 0);
        assert_eq!(blocks[0].children.len(), 1);
        assert_eq!(blocks[0].children[0].tag, "p");
        assert_eq!(blocks[0].children[0].depth, 1);
        assert_eq!(blocks[0].children[0].inner_html, "Hello");
    }

    #[test]
    fn empty_and_whitespace_input_fails_soft() {
        let mut ids = gen();
        assert!(parse_blocks("", &mut ids).is_empty());
        assert!(parse_blocks("   \n\t  ", &mut ids).is_empty());
    }

    #[test]
    fn text_only_input_yields_no_blocks() {
        let mut ids = gen();
        assert!(parse_blocks("just loose text", &mut ids).is_empty());
    }

    #[test]
    fn text_and_comment_nodes_are_not_blocks() {
        let mut ids = gen();
        let blocks = parse_blocks(
            "<div>intro<!-- note --><p>body</p>trailer</div>",
            &mut ids,
        );

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].children.len(), 1);
        // The loose text still lives in the parent's captured HTML.
        assert!(blocks[0].outer_html.contains("intro"));
        assert!(blocks[0].outer_html.contains("trailer"));
    }

    #[test]
    fn every_element_gets_a_unique_id() {
        let mut ids = gen();
        let blocks = parse_blocks(
            "<section><h2>A</h2><p>one</p></section><section><p>two</p></section>",
            &mut ids,
        );

        let all = collect_ids(&blocks);
        assert_eq!(all.len(), block_count(&blocks));
        let mut deduped = all.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), all.len());
    }

    #[test]
    fn malformed_html_is_recovered_not_rejected() {
        let mut ids = gen();
        // Unclosed tags are recovered the way a browser would recover them.
        let blocks = parse_blocks("<div><p>unclosed</div>", &mut ids);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].children[0].tag, "p");
    }

    #[test]
    fn opening_tag_preserves_attributes() {
        let tag = opening_tag(r#"<section class="intro" data-x="1"><p>a</p></section>"#).unwrap();
        assert!(tag.starts_with("<section"));
        assert!(tag.contains(r#"class="intro""#));
        assert!(tag.contains(r#"data-x="1""#));
        assert!(tag.ends_with('>'));
    }

    #[test]
    fn rebuild_outer_swaps_inner_content_only() {
        let rebuilt =
            rebuild_outer(r#"<section class="intro"><p>old</p></section>"#, "<p>new</p>").unwrap();
        assert_eq!(rebuilt, r#"<section class="intro"><p>new</p></section>"#);
    }

    #[test]
    fn rebuild_outer_on_unparsable_input_is_none() {
        assert!(rebuild_outer("plain text", "<p>x</p>").is_none());
    }
}
