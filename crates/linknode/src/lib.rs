//! # linknode
//!
//! Minimal doubly-linked node primitive.
//!
//! ## Architecture
//! - **Arena**: nodes stored in a `Vec` of slots, reused through a free list
//! - **Handles**: `NodeId` = slot index + generation, stale after removal
//! - **Links**: O(1) splice/unlink given a handle; boundaries found by walking
//!
//! The arena has no notion of a head or tail. Callers that need O(1)
//! endpoints or lookups by value keep that bookkeeping themselves.

#![warn(missing_docs)]

mod error;
mod iter;
mod nodes;

pub use error::{Error, Result};
pub use iter::{Direction, Iter};
pub use nodes::{NodeId, Nodes};
