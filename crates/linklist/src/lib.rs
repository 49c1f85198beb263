//! # linklist
//!
//! Ordered doubly-linked list with O(1) endpoints and lookup by value.
//!
//! ## Architecture
//! - **Chain**: nodes in a [`linknode::Nodes`] arena, linked by handle
//! - **Endpoints**: cached head/tail, updated by every mutation
//! - **Index**: AHash map from value to the nodes currently holding it
//! - **Repair**: `fix_head`, `fix_tail`, `fix_counts` resynchronise the
//!   cached views after the chain was changed through the arena directly
//!
//! ## Costs
//! - head/tail, append/prepend, move to front/back: O(1)
//! - find_nodes: O(1) expected + O(m) to copy m handles
//! - delete/set_value: O(k) for k nodes sharing the value
//! - repair operations: O(n)
//!
//! Nothing here locks. Share a list across threads behind one lock that
//! covers every call, traversals included.
//!
//! ```
//! use linklist::IndexedList;
//!
//! let mut list = IndexedList::new();
//! for word in ["the", "quick", "brown", "fox"] {
//!     let node = list.nodes_mut().insert(word);
//!     list.append(list.tail(), node).unwrap();
//! }
//!
//! let fox = list.find_nodes("fox")[0];
//! list.move_to_front(fox).unwrap();
//! assert_eq!(list.get(list.head().unwrap()), Some(&"fox"));
//! assert_eq!(list.values().copied().collect::<Vec<_>>(), ["fox", "the", "quick", "brown"]);
//! ```

#![warn(missing_docs)]

mod error;
mod index;
mod list;
mod repair;

pub use error::{Error, Result};
pub use list::IndexedList;
pub use repair::SyncReport;

pub use linknode::{Direction, NodeId, Nodes};
