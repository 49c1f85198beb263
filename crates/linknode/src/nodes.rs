//! Arena of doubly-linked nodes
//!
//! Nodes live in a flat `Vec` of slots and link to each other by slot index.
//! Handles carry a generation so a handle to a reclaimed slot never aliases
//! the node that later reuses the slot.

use std::fmt;

use crate::error::{Error, Result};
use crate::iter::{Direction, Iter};

/// Stable handle to a node in a [`Nodes`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index of the node
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

struct Node<V> {
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Slot<V> {
    generation: u32,
    node: Option<Node<V>>,
}

/// Arena holding nodes and their prev/next links
///
/// The arena knows nothing about where a chain starts or ends: finding either
/// boundary is a walk. Every chain operation is O(1) given a handle.
pub struct Nodes<V> {
    slots: Vec<Slot<V>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<V> Default for Nodes<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Nodes<V> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty arena with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the arena holds no live nodes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes the arena can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Construct a new, unlinked node holding `value`
    pub fn insert(&mut self, value: V) -> NodeId {
        let node = Node {
            value,
            prev: None,
            next: None,
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx].node = Some(node);
            idx
        } else {
            assert!(self.slots.len() < u32::MAX as usize, "Node arena is full");
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            self.slots.len() - 1
        };

        self.len += 1;
        self.id_at(idx)
    }

    /// Unlink a node and reclaim its slot, returning its value
    ///
    /// Any copy of `id` is stale afterwards.
    pub fn remove(&mut self, id: NodeId) -> Option<V> {
        if !self.contains(id) {
            return None;
        }
        self.unlink(id);

        let slot = &mut self.slots[id.index()];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index());
        self.len -= 1;
        Some(node.value)
    }

    /// Check if `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Value held by a node
    pub fn get(&self, id: NodeId) -> Option<&V> {
        self.node(id).map(|node| &node.value)
    }

    /// Mutable access to the value held by a node
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.node_mut(id).map(|node| &mut node.value)
    }

    /// Overwrite a node's value, returning the previous one
    pub fn replace(&mut self, id: NodeId, value: V) -> Option<V> {
        self.get_mut(id).map(|slot| std::mem::replace(slot, value))
    }

    /// Successor of a node
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.next.map(|idx| self.id_at(idx))
    }

    /// Predecessor of a node
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.prev.map(|idx| self.id_at(idx))
    }

    /// Check if a live node has no neighbours
    pub fn is_detached(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| node.prev.is_none() && node.next.is_none())
    }

    /// Splice a detached `node` in right after `anchor`
    pub fn link_after(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let after = self.check_splice(anchor, node)?.next;
        let (a, n) = (anchor.index(), node.index());

        self.set_links(n, Some(a), after);
        self.set_next(a, Some(n));
        if let Some(after) = after {
            self.set_prev(after, Some(n));
        }
        Ok(())
    }

    /// Splice a detached `node` in right before `anchor`
    pub fn link_before(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let before = self.check_splice(anchor, node)?.prev;
        let (a, n) = (anchor.index(), node.index());

        self.set_links(n, before, Some(a));
        self.set_prev(a, Some(n));
        if let Some(before) = before {
            self.set_next(before, Some(n));
        }
        Ok(())
    }

    /// Join the end of one chain to the start of another
    ///
    /// `left` must have no successor and `right` no predecessor. Joining the
    /// tail of a chain to its own head closes it into a ring, which walks and
    /// traversals tolerate but cannot give a meaningful boundary for.
    pub fn join(&mut self, left: NodeId, right: NodeId) -> Result<()> {
        if left == right {
            return Err(Error::SelfLink(left));
        }
        let l = self.node(left).ok_or(Error::StaleHandle(left))?;
        if l.next.is_some() {
            return Err(Error::Linked(left));
        }
        let r = self.node(right).ok_or(Error::StaleHandle(right))?;
        if r.prev.is_some() {
            return Err(Error::Linked(right));
        }

        self.set_next(left.index(), Some(right.index()));
        self.set_prev(right.index(), Some(left.index()));
        Ok(())
    }

    /// Remove a node from its chain, relinking its neighbours to each other
    ///
    /// Returns `false` if the node is stale or had no neighbours.
    pub fn unlink(&mut self, id: NodeId) -> bool {
        let (prev, next) = match self.node(id) {
            Some(node) => (node.prev, node.next),
            None => return false,
        };
        if prev.is_none() && next.is_none() {
            return false;
        }

        if let Some(prev) = prev {
            self.set_next(prev, next);
        }
        if let Some(next) = next {
            self.set_prev(next, prev);
        }
        self.set_links(id.index(), None, None);
        true
    }

    /// Walk backwards to the first node of the chain containing `id`
    pub fn walk_to_head(&self, id: NodeId) -> Result<NodeId> {
        self.walk(id, Direction::Prev)
    }

    /// Walk forwards to the last node of the chain containing `id`
    pub fn walk_to_tail(&self, id: NodeId) -> Result<NodeId> {
        self.walk(id, Direction::Next)
    }

    /// Lazy traversal from `start` in the given direction
    pub fn iter(&self, start: NodeId, direction: Direction) -> Iter<'_, V> {
        Iter::new(self, self.node(start).map(|_| start.index()), direction)
    }

    /// Lazy traversal from `start` following successors
    pub fn iter_next(&self, start: NodeId) -> Iter<'_, V> {
        self.iter(start, Direction::Next)
    }

    /// Lazy traversal from `start` following predecessors
    pub fn iter_prev(&self, start: NodeId) -> Iter<'_, V> {
        self.iter(start, Direction::Prev)
    }

    /// Visit nodes from `start` forwards until `visit` returns `false`
    ///
    /// Returns the number of nodes visited.
    pub fn visit_next<F>(&self, start: NodeId, visit: F) -> usize
    where
        F: FnMut(NodeId, &V) -> bool,
    {
        Self::visit(self.iter_next(start), visit)
    }

    /// Visit nodes from `start` backwards until `visit` returns `false`
    ///
    /// Returns the number of nodes visited.
    pub fn visit_prev<F>(&self, start: NodeId, visit: F) -> usize
    where
        F: FnMut(NodeId, &V) -> bool,
    {
        Self::visit(self.iter_prev(start), visit)
    }

    fn visit<F>(iter: Iter<'_, V>, mut visit: F) -> usize
    where
        F: FnMut(NodeId, &V) -> bool,
    {
        let mut visited = 0;
        for (id, value) in iter {
            visited += 1;
            if !visit(id, value) {
                break;
            }
        }
        visited
    }

    fn walk(&self, id: NodeId, direction: Direction) -> Result<NodeId> {
        if !self.contains(id) {
            return Err(Error::StaleHandle(id));
        }

        // An acyclic chain has at most len - 1 links to follow.
        let mut cur = id.index();
        let mut steps = 0;
        while let Some(step) = self.link(cur, direction) {
            steps += 1;
            if steps >= self.len {
                return Err(Error::Cycle(id));
            }
            cur = step;
        }
        Ok(self.id_at(cur))
    }

    fn check_splice(&self, anchor: NodeId, node: NodeId) -> Result<&Node<V>> {
        if anchor == node {
            return Err(Error::SelfLink(node));
        }
        let a = self.node(anchor).ok_or(Error::StaleHandle(anchor))?;
        let n = self.node(node).ok_or(Error::StaleHandle(node))?;
        if n.prev.is_some() || n.next.is_some() {
            return Err(Error::Linked(node));
        }
        Ok(a)
    }

    pub(crate) fn link(&self, idx: usize, direction: Direction) -> Option<usize> {
        let node = self.slots.get(idx)?.node.as_ref()?;
        match direction {
            Direction::Next => node.next,
            Direction::Prev => node.prev,
        }
    }

    pub(crate) fn value_at(&self, idx: usize) -> Option<&V> {
        self.slots.get(idx)?.node.as_ref().map(|node| &node.value)
    }

    pub(crate) fn id_at(&self, idx: usize) -> NodeId {
        NodeId {
            index: idx as u32,
            generation: self.slots[idx].generation,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node<V>> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<V>> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(node) = &mut self.slots[idx].node {
            node.next = next;
        }
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(node) = &mut self.slots[idx].node {
            node.prev = prev;
        }
    }

    fn set_links(&mut self, idx: usize, prev: Option<usize>, next: Option<usize>) {
        if let Some(node) = &mut self.slots[idx].node {
            node.prev = prev;
            node.next = next;
        }
    }
}
