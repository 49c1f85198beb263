//! Error types for linknode

use std::fmt;

use crate::NodeId;

/// Result type alias for linknode operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for node operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Handle refers to a slot that was reclaimed (or never existed)
    StaleHandle(NodeId),

    /// Node already has a neighbour and cannot be spliced in again
    Linked(NodeId),

    /// Anchor and node are the same handle
    SelfLink(NodeId),

    /// Walk starting at this node exceeded the arena size
    Cycle(NodeId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StaleHandle(id) => write!(f, "Stale node handle: {}", id),
            Error::Linked(id) => write!(f, "Node {} is already linked", id),
            Error::SelfLink(id) => write!(f, "Cannot link node {} to itself", id),
            Error::Cycle(id) => write!(f, "Circular chain detected walking from {}", id),
        }
    }
}

impl std::error::Error for Error {}
