//! Block tree → HTML text.
//!
//! `serialize_blocks` is the copy/export path: it emits stored `outer_html`
//! verbatim, so whatever the parser captured round-trips untouched.
//! `Formatter` is the edit-dialog pretty printer; it re-parses and re-emits
//! and never feeds back into the stored tree.

use scraper::{ElementRef, Html};

use crate::ast::BlockNode;
use crate::parser::open_tag_text;

/// Concatenate each node's outer HTML in order, newline-separated.
///
/// Used for "copy one block" (single-element slice) and "copy all" /
/// "export group" (multi-element slice) alike. An empty slice yields an
/// empty string.
pub fn serialize_blocks(blocks: &[BlockNode]) -> String {
    blocks
        .iter()
        .map(|block| block.outer_html.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty printer for the edit dialog.
pub struct Formatter {
    indent_string: String,
}

impl Formatter {
    pub fn new() -> Self {
        Self {
            indent_string: "  ".to_string(), // 2 spaces
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_string: indent.to_string(),
        }
    }

    /// Re-parse `html` and emit it indented one level per depth.
    ///
    /// A childless element containing only whitespace collapses to a
    /// self-closed line; a childless element with non-whitespace text is
    /// inlined onto one line.
    pub fn format(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html.trim());
        let mut output = String::new();
        for child in fragment.root_element().children() {
            if let Some(element) = ElementRef::wrap(child) {
                self.format_element(element, 0, &mut output);
            }
        }
        output.truncate(output.trim_end().len());
        output
    }

    fn format_element(&self, element: ElementRef<'_>, level: usize, output: &mut String) {
        let indent = self.indent_string.repeat(level);
        let has_element_children = element.children().any(|c| c.value().is_element());
        let name = element.value().name().to_ascii_lowercase();

        if !has_element_children {
            let inner = element.inner_html();
            let text = inner.trim();
            output.push_str(&indent);
            if text.is_empty() {
                output.push_str(&open_tag_text(element, true));
            } else {
                output.push_str(&open_tag_text(element, false));
                output.push_str(text);
                output.push_str(&format!("</{}>", name));
            }
            output.push('\n');
            return;
        }

        output.push_str(&indent);
        output.push_str(&open_tag_text(element, false));
        output.push('\n');

        let child_indent = self.indent_string.repeat(level + 1);
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.format_element(child_element, level + 1, output);
            } else if let Some(text) = child.value().as_text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    output.push_str(&child_indent);
                    output.push_str(trimmed);
                    output.push('\n');
                }
            }
        }

        output.push_str(&indent);
        output.push_str(&format!("</{}>", name));
        output.push('\n');
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format with the default two-space indentation.
pub fn format_html(html: &str) -> String {
    Formatter::new().format(html)
}
