//! Error types for the editor

use thiserror::Error;

use crate::grouping::GroupError;
use crate::ports::PortError;

#[derive(Error, Debug)]
pub enum EditorError {
    /// The user asked for a parse and the input yielded no elements.
    #[error("input did not contain any html elements")]
    NothingParsed,

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("clipboard error: {0}")]
    Clipboard(PortError),

    #[error("persistence error: {0}")]
    Persistence(PortError),

    #[error("no group at index {0}")]
    UnknownGroup(usize),

    #[error("no block with id {0}")]
    UnknownBlock(String),
}
