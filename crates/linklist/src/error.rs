//! Error types for linklist

use std::fmt;

use linknode::NodeId;

/// Result type alias for linklist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for list operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Node primitive rejected the operation (stale handle, ring, ...)
    Node(linknode::Error),

    /// Insertion into a non-empty list without an anchor
    MissingAnchor,

    /// Node is already part of a chain
    AlreadyLinked(NodeId),

    /// Node is not part of the list's chain
    Detached(NodeId),
}

impl Error {
    /// Check if the chain was found to be circular
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::Node(linknode::Error::Cycle(_)))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Node(e) => write!(f, "Node error: {}", e),
            Error::MissingAnchor => write!(f, "Anchor required for a non-empty list"),
            Error::AlreadyLinked(id) => write!(f, "Node {} is already in a chain", id),
            Error::Detached(id) => write!(f, "Node {} is not in the list", id),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Node(e) => Some(e),
            _ => None,
        }
    }
}

impl From<linknode::Error> for Error {
    fn from(err: linknode::Error) -> Self {
        Error::Node(err)
    }
}
