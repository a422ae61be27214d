//! # Blockedit Parser
//!
//! Block tree model and HTML↔tree codec for the block editor.
//!
//! - `ast`: the `BlockNode` tree with stable ids, captured outer/inner HTML,
//!   element children only.
//! - `parser`: lenient HTML5 fragment parsing into block trees (fails soft
//!   to an empty tree, never errors on malformed input).
//! - `serializer`: copy/export serialization and the edit-dialog formatter.
//! - `id_generator`: seeded sequential ids, resumable across session
//!   restores.

pub mod ast;
pub mod id_generator;
pub mod parser;
pub mod serializer;

pub use ast::{BlockNode, NodeOrigin};
pub use id_generator::IdGenerator;
pub use parser::{opening_tag, parse_blocks, rebuild_outer};
pub use serializer::{format_html, serialize_blocks, Formatter};
