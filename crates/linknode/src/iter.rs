//! Directional traversal over a chain

use crate::nodes::{NodeId, Nodes};

/// Which neighbour a traversal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow successors
    Next,
    /// Follow predecessors
    Prev,
}

/// Lazy traversal yielding `(NodeId, &V)` pairs
///
/// Never yields more items than the arena holds, so it terminates even on a
/// circular chain. Clone it to restart from the same position.
pub struct Iter<'a, V> {
    nodes: &'a Nodes<V>,
    cursor: Option<usize>,
    remaining: usize,
    direction: Direction,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(nodes: &'a Nodes<V>, start: Option<usize>, direction: Direction) -> Self {
        Self {
            nodes,
            cursor: start,
            remaining: nodes.len(),
            direction,
        }
    }

    /// Direction this traversal follows
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            cursor: self.cursor,
            remaining: self.remaining,
            direction: self.direction,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (NodeId, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        if self.remaining == 0 {
            self.cursor = None;
            return None;
        }
        self.remaining -= 1;

        let value = self.nodes.value_at(idx)?;
        self.cursor = self.nodes.link(idx, self.direction);
        Some((self.nodes.id_at(idx), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.cursor {
            Some(_) => (self.remaining.min(1), Some(self.remaining)),
            None => (0, Some(0)),
        }
    }
}

impl<V> std::iter::FusedIterator for Iter<'_, V> {}
