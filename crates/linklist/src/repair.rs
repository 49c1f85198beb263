//! Desync detection and repair after bypass mutation
//!
//! Linking nodes through [`IndexedList::nodes_mut`] leaves the cached
//! endpoints and the value index behind. Nothing records what changed, so
//! every operation here is O(n). Walks are bounded by the arena size: a
//! circular chain yields an error instead of looping, and the cached state is
//! left as it was.

use std::collections::HashSet;
use std::hash::Hash;

use ahash::RandomState;
use linknode::{Error as NodeError, NodeId};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::index::ValueIndex;
use crate::list::IndexedList;

/// Which cached views disagree with the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Cached head is not the first node of the chain
    pub head_stale: bool,
    /// Cached tail is not the last node of the chain
    pub tail_stale: bool,
    /// Index does not hold exactly the chain's nodes under their values
    pub index_stale: bool,
}

impl SyncReport {
    /// Check if every cached view matches the chain
    pub fn is_synced(&self) -> bool {
        !(self.head_stale || self.tail_stale || self.index_stale)
    }
}

impl<V> IndexedList<V>
where
    V: Hash + Eq + Clone,
{
    /// Recompute the cached head by walking from it to the true first node
    pub fn fix_head(&mut self) -> Result<()> {
        let Some(start) = self.live_endpoint(self.head, self.tail)? else {
            return Ok(());
        };
        let head = self.nodes.walk_to_head(start).map_err(Self::log_walk)?;

        if self.head != Some(head) {
            debug!(old = ?self.head, new = %head, "repaired cached head");
            self.head = Some(head);
        }
        Ok(())
    }

    /// Recompute the cached tail by walking from it to the true last node
    pub fn fix_tail(&mut self) -> Result<()> {
        let Some(start) = self.live_endpoint(self.tail, self.head)? else {
            return Ok(());
        };
        let tail = self.nodes.walk_to_tail(start).map_err(Self::log_walk)?;

        if self.tail != Some(tail) {
            debug!(old = ?self.tail, new = %tail, "repaired cached tail");
            self.tail = Some(tail);
        }
        Ok(())
    }

    /// Rebuild the value index from the chain, starting at the cached head
    ///
    /// Nodes that were already registered correctly keep their bucket
    /// position; nodes found only in the chain are appended in chain order.
    /// Registrations for nodes no longer in the chain, or registered under a
    /// value they no longer hold, are dropped. If the cached head was
    /// reclaimed, the chain start is found by walking back from the tail.
    pub fn fix_counts(&mut self) -> Result<()> {
        let head = match self.head.filter(|head| self.nodes.contains(*head)) {
            Some(head) => head,
            None => match self.live_endpoint(self.head, self.tail)? {
                Some(start) => self.nodes.walk_to_head(start).map_err(Self::log_walk)?,
                None => return Ok(()),
            },
        };
        // Detect rings before trusting a traversal.
        self.nodes.walk_to_tail(head).map_err(Self::log_walk)?;

        let mut pending: HashSet<NodeId, RandomState> = self
            .nodes
            .iter_next(head)
            .map(|(id, _)| id)
            .collect();
        let mut index = ValueIndex::with_capacity(self.index.bucket_count());

        for (value, bucket) in self.index.buckets() {
            for &id in bucket {
                if self.nodes.get(id) == Some(value) && pending.remove(&id) {
                    index.register(value, id);
                }
            }
        }
        for (id, value) in self.nodes.iter_next(head) {
            if pending.remove(&id) {
                index.register(value, id);
            }
        }

        if index.len() != self.index.len() {
            debug!(
                before = self.index.len(),
                after = index.len(),
                "rebuilt value index"
            );
        }
        self.index = index;
        Ok(())
    }

    /// Compare the cached views against the chain without changing anything
    ///
    /// The true boundaries are found by walking from the cached head (or the
    /// tail if the head is gone). O(n) walks plus O(k) per node for the index
    /// comparison.
    pub fn check(&self) -> Result<SyncReport> {
        let Some(start) = self.live_endpoint(self.head, self.tail)? else {
            return Ok(SyncReport {
                index_stale: self.index.len() != 0,
                ..SyncReport::default()
            });
        };
        let head = self.nodes.walk_to_head(start).map_err(Self::log_walk)?;
        let tail = self.nodes.walk_to_tail(head).map_err(Self::log_walk)?;

        let mut chain_len = 0;
        let mut index_stale = false;
        for (id, value) in self.nodes.iter_next(head) {
            chain_len += 1;
            if !self.index.contains(value, id) {
                index_stale = true;
                break;
            }
        }

        Ok(SyncReport {
            head_stale: self.head != Some(head),
            tail_stale: self.tail != Some(tail),
            index_stale: index_stale || chain_len != self.index.len(),
        })
    }

    /// Bring head, tail and index back in line with the chain
    ///
    /// Returns what was stale before the repair.
    pub fn repair(&mut self) -> Result<SyncReport> {
        let report = self.check()?;
        if report.head_stale {
            self.fix_head()?;
        }
        if report.tail_stale {
            self.fix_tail()?;
        }
        if report.index_stale {
            self.fix_counts()?;
        }
        Ok(report)
    }

    /// First live handle among the cached endpoints
    fn live_endpoint(
        &self,
        primary: Option<NodeId>,
        fallback: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        for candidate in [primary, fallback].into_iter().flatten() {
            if self.nodes.contains(candidate) {
                return Ok(Some(candidate));
            }
        }
        match primary.or(fallback) {
            Some(id) => Err(Error::Node(NodeError::StaleHandle(id))),
            None => Ok(None),
        }
    }

    fn log_walk(err: NodeError) -> Error {
        if let NodeError::Cycle(id) = err {
            warn!(start = %id, "circular chain, cached state left unchanged");
        }
        Error::Node(err)
    }
}
