//! Ordered list with O(1) endpoints and lookup by value
//!
//! Every mutation goes to the node arena first, then to the cached
//! head/tail, then to the value index, before returning.

use std::borrow::Borrow;
use std::hash::Hash;

use linknode::{Error as NodeError, NodeId, Nodes};
use tracing::trace;

use crate::error::{Error, Result};
use crate::index::ValueIndex;

/// Doubly-linked list with cached endpoints and a value -> nodes index
///
/// Nodes are created by the caller through [`nodes_mut`](Self::nodes_mut)
/// (or [`push_back`](Self::push_back) / [`push_front`](Self::push_front)) and
/// registered with [`append`](Self::append) / [`prepend`](Self::prepend).
/// Mutating the chain through `nodes_mut` bypasses the bookkeeping; see
/// [`check`](Self::check) and the `fix_*` repair operations.
pub struct IndexedList<V> {
    pub(crate) nodes: Nodes<V>,
    pub(crate) head: Option<NodeId>,
    pub(crate) tail: Option<NodeId>,
    pub(crate) index: ValueIndex<V>,
}

impl<V> Default for IndexedList<V>
where
    V: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IndexedList<V>
where
    V: Hash + Eq + Clone,
{
    /// Create an empty list
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Nodes::with_capacity(capacity),
            head: None,
            tail: None,
            index: ValueIndex::with_capacity(capacity),
        }
    }

    /// First node of the chain, O(1)
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Last node of the chain, O(1)
    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    /// Node arena backing the list
    pub fn nodes(&self) -> &Nodes<V> {
        &self.nodes
    }

    /// Mutable node arena
    ///
    /// Linking, unlinking or rewriting values here is not seen by the list.
    /// Use [`repair`](Self::repair) afterwards.
    pub fn nodes_mut(&mut self) -> &mut Nodes<V> {
        &mut self.nodes
    }

    /// Value held by a node
    pub fn get(&self, node: NodeId) -> Option<&V> {
        self.nodes.get(node)
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the list has no head
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Insert `node` right after `anchor`
    ///
    /// On an empty list the anchor is ignored and `node` becomes both head
    /// and tail, so `list.append(list.tail(), node)` builds a list front to
    /// back. Otherwise the anchor must be in the chain (`Error::Detached`).
    pub fn append(&mut self, anchor: Option<NodeId>, node: NodeId) -> Result<()> {
        self.check_insertable(node)?;

        if self.head.is_none() && self.tail.is_none() {
            self.head = Some(node);
            self.tail = Some(node);
        } else {
            let anchor = anchor.ok_or(Error::MissingAnchor)?;
            self.check_member(anchor)?;
            self.nodes.link_after(anchor, node)?;
            if self.tail == Some(anchor) {
                self.tail = Some(node);
            }
        }

        self.register(node);
        Ok(())
    }

    /// Insert `node` right before `anchor`
    ///
    /// Mirror of [`append`](Self::append): `list.prepend(list.head(), node)`
    /// builds a list back to front.
    pub fn prepend(&mut self, anchor: Option<NodeId>, node: NodeId) -> Result<()> {
        self.check_insertable(node)?;

        if self.head.is_none() && self.tail.is_none() {
            self.head = Some(node);
            self.tail = Some(node);
        } else {
            let anchor = anchor.ok_or(Error::MissingAnchor)?;
            self.check_member(anchor)?;
            self.nodes.link_before(anchor, node)?;
            if self.head == Some(anchor) {
                self.head = Some(node);
            }
        }

        self.register(node);
        Ok(())
    }

    /// Construct a node holding `value` and append it at the tail
    pub fn push_back(&mut self, value: V) -> Result<NodeId> {
        let node = self.nodes.insert(value);
        if let Err(e) = self.append(self.tail, node) {
            self.nodes.remove(node);
            return Err(e);
        }
        Ok(node)
    }

    /// Construct a node holding `value` and prepend it at the head
    pub fn push_front(&mut self, value: V) -> Result<NodeId> {
        let node = self.nodes.insert(value);
        if let Err(e) = self.prepend(self.head, node) {
            self.nodes.remove(node);
            return Err(e);
        }
        Ok(node)
    }

    /// Unlink and deregister a node
    ///
    /// Head and tail step past the node when it sits at either end. The node
    /// itself stays alive in the arena, detached; reclaiming it is up to the
    /// caller (or use [`remove`](Self::remove)).
    ///
    /// Deregistration scans the bucket of the node's value: O(k) for k nodes
    /// sharing that value. Returns `false` without touching anything when the
    /// node is not registered under its current value.
    pub fn delete(&mut self, node: NodeId) -> bool {
        let registered = match self.nodes.get(node) {
            Some(value) => self.index.deregister(value, node),
            None => false,
        };
        if !registered {
            trace!(%node, "delete of unregistered node ignored");
            return false;
        }

        if self.head == Some(node) {
            self.head = self.nodes.next(node);
        }
        if self.tail == Some(node) {
            self.tail = self.nodes.prev(node);
        }
        self.nodes.unlink(node);
        true
    }

    /// Delete a node and reclaim its slot, returning its value
    pub fn remove(&mut self, node: NodeId) -> Option<V> {
        if !self.delete(node) {
            return None;
        }
        self.nodes.remove(node)
    }

    /// Change a node's value in place, returning the old value
    ///
    /// The node moves from the old value's bucket (O(k)) to the end of the
    /// new value's bucket. Its chain position does not change. A node that
    /// is not registered just gets the new value. Setting the value a node
    /// already holds leaves its bucket position alone.
    pub fn set_value(&mut self, node: NodeId, value: V) -> Result<V> {
        let current = self
            .nodes
            .get(node)
            .ok_or(Error::Node(NodeError::StaleHandle(node)))?;
        if *current == value {
            return Ok(value);
        }
        let registered = self.index.deregister(current, node);

        let old = self
            .nodes
            .replace(node, value)
            .ok_or(Error::Node(NodeError::StaleHandle(node)))?;
        if registered {
            self.register(node);
        }
        Ok(old)
    }

    /// All nodes currently holding `value`, in registration order
    ///
    /// The result is a copy; it does not follow later mutations. Registration
    /// order can differ from chain order once nodes have been deleted or
    /// changed value.
    pub fn find_nodes<Q>(&self, value: &Q) -> Vec<NodeId>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.bucket(value).to_vec()
    }

    /// Earliest registered node holding `value`, without copying the bucket
    pub fn find_first<Q>(&self, value: &Q) -> Option<NodeId>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.bucket(value).first().copied()
    }

    /// Number of nodes holding `value`
    pub fn count<Q>(&self, value: &Q) -> usize
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.bucket(value).len()
    }

    /// Check if any node holds `value`
    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        !self.index.bucket(value).is_empty()
    }

    /// Move a node to the head, O(1)
    pub fn move_to_front(&mut self, node: NodeId) -> Result<()> {
        self.check_member(node)?;
        let head = match self.head {
            Some(head) if head == node => return Ok(()),
            Some(head) => head,
            None => return Err(Error::Detached(node)),
        };

        if self.tail == Some(node) {
            self.tail = self.nodes.prev(node);
        }
        self.nodes.unlink(node);
        self.nodes.link_before(head, node)?;
        self.head = Some(node);
        Ok(())
    }

    /// Move a node to the tail, O(1)
    pub fn move_to_back(&mut self, node: NodeId) -> Result<()> {
        self.check_member(node)?;
        let tail = match self.tail {
            Some(tail) if tail == node => return Ok(()),
            Some(tail) => tail,
            None => return Err(Error::Detached(node)),
        };

        if self.head == Some(node) {
            self.head = self.nodes.next(node);
        }
        self.nodes.unlink(node);
        self.nodes.link_after(tail, node)?;
        self.tail = Some(node);
        Ok(())
    }

    /// Traverse from the cached head forwards
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &V)> + '_ {
        self.head
            .into_iter()
            .flat_map(move |head| self.nodes.iter_next(head))
    }

    /// Traverse from the cached tail backwards
    pub fn iter_rev(&self) -> impl Iterator<Item = (NodeId, &V)> + '_ {
        self.tail
            .into_iter()
            .flat_map(move |tail| self.nodes.iter_prev(tail))
    }

    /// Values from head to tail
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Forget the chain and reclaim every registered node
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.index.ids().collect();
        for id in ids {
            self.nodes.remove(id);
        }
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn register(&mut self, node: NodeId) {
        if let Some(value) = self.nodes.get(node) {
            self.index.register(value, node);
        }
    }

    fn check_insertable(&self, node: NodeId) -> Result<()> {
        if !self.nodes.contains(node) {
            return Err(Error::Node(NodeError::StaleHandle(node)));
        }
        if !self.nodes.is_detached(node) || self.head == Some(node) || self.tail == Some(node) {
            return Err(Error::AlreadyLinked(node));
        }
        Ok(())
    }

    fn check_member(&self, node: NodeId) -> Result<()> {
        if !self.nodes.contains(node) {
            return Err(Error::Node(NodeError::StaleHandle(node)));
        }
        if self.nodes.is_detached(node) && self.head != Some(node) {
            return Err(Error::Detached(node));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(words: &[&'static str]) -> IndexedList<&'static str> {
        let mut list = IndexedList::new();
        for w in words {
            let node = list.nodes_mut().insert(*w);
            list.append(list.tail(), node).unwrap();
        }
        list
    }

    fn words(list: &IndexedList<&'static str>) -> Vec<&'static str> {
        list.values().copied().collect()
    }

    fn value(list: &IndexedList<&'static str>, node: Option<NodeId>) -> Option<&'static str> {
        node.and_then(|n| list.get(n)).copied()
    }

    /// Head/tail agree with walking the chain, and every value's bucket holds
    /// exactly the chain nodes with that value.
    fn assert_synced(list: &IndexedList<&'static str>) {
        match list.head() {
            None => {
                assert_eq!(list.tail(), None);
                assert_eq!(list.len(), 0);
            }
            Some(head) => {
                let tail = list.tail().unwrap();
                assert_eq!(list.nodes().walk_to_head(tail).unwrap(), head);
                assert_eq!(list.nodes().walk_to_tail(head).unwrap(), tail);

                let chain: Vec<_> = list.iter().collect();
                assert_eq!(chain.len(), list.len());
                for (id, v) in &chain {
                    let found = list.find_nodes(*v);
                    assert_eq!(found.iter().filter(|n| *n == id).count(), 1);
                    for n in found {
                        assert_eq!(list.get(n), Some(*v));
                    }
                }
            }
        }
        assert!(list.check().unwrap().is_synced());
    }

    #[test]
    fn test_empty() {
        let list: IndexedList<&str> = IndexedList::new();

        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
        assert!(list.is_empty());
        assert!(list.find_nodes("a").is_empty());
    }

    #[test]
    fn test_seed_append() {
        // Scenario A
        let mut list = IndexedList::new();
        let a = list.nodes_mut().insert("a");
        list.append(list.tail(), a).unwrap();

        assert_eq!(list.head(), Some(a));
        assert_eq!(list.tail(), Some(a));
        assert_eq!(value(&list, list.head()), Some("a"));
    }

    #[test]
    fn test_seed_ignores_anchor() {
        let mut list = IndexedList::new();
        let stray = list.nodes_mut().insert("stray");
        let a = list.nodes_mut().insert("a");
        list.prepend(Some(stray), a).unwrap();

        assert_eq!(list.head(), Some(a));
        assert_eq!(list.tail(), Some(a));
        assert!(list.nodes().is_detached(stray));
    }

    #[test]
    fn test_append_builds_in_order() {
        // Scenario B
        let list = build(&["a", "b", "c", "d"]);

        assert_eq!(value(&list, list.head()), Some("a"));
        assert_eq!(value(&list, list.tail()), Some("d"));
        let c = list.find_nodes("c");
        assert_eq!(c.len(), 1);
        assert_eq!(list.get(c[0]), Some(&"c"));
        assert_eq!(list.len(), 4);
        assert_synced(&list);
    }

    #[test]
    fn test_prepend_builds_reversed() {
        let mut list = IndexedList::new();
        for i in 0..10 {
            let node = list.nodes_mut().insert(i);
            list.prepend(list.head(), node).unwrap();
        }

        let values: Vec<_> = list.values().copied().collect();
        assert_eq!(values, (0..10).rev().collect::<Vec<_>>());
        let back: Vec<_> = list.iter_rev().map(|(_, v)| *v).collect();
        assert_eq!(back, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_append_middle_keeps_endpoints() {
        let mut list = build(&["a", "c"]);
        let (head, tail) = (list.head(), list.tail());
        let b = list.nodes_mut().insert("b");

        list.append(head, b).unwrap();

        assert_eq!(list.head(), head);
        assert_eq!(list.tail(), tail);
        assert_eq!(words(&list), vec!["a", "b", "c"]);
        assert_synced(&list);
    }

    #[test]
    fn test_prepend_middle_keeps_endpoints() {
        let mut list = build(&["a", "c"]);
        let (head, tail) = (list.head(), list.tail());
        let b = list.nodes_mut().insert("b");

        list.prepend(tail, b).unwrap();

        assert_eq!(list.head(), head);
        assert_eq!(list.tail(), tail);
        assert_eq!(words(&list), vec!["a", "b", "c"]);
        assert_synced(&list);
    }

    #[test]
    fn test_insert_rejections_change_nothing() {
        let mut list = build(&["a", "b"]);
        let head = list.head().unwrap();
        let fresh = list.nodes_mut().insert("x");

        assert_eq!(list.append(None, fresh), Err(Error::MissingAnchor));
        assert_eq!(list.append(Some(head), head), Err(Error::AlreadyLinked(head)));
        list.nodes_mut().remove(fresh);
        assert_eq!(
            list.prepend(Some(head), fresh),
            Err(Error::Node(NodeError::StaleHandle(fresh)))
        );

        assert_eq!(words(&list), vec!["a", "b"]);
        assert!(list.find_nodes("x").is_empty());
        assert_synced(&list);
    }

    #[test]
    fn test_stale_anchor_rejected() {
        let mut list = build(&["a"]);
        let ghost = list.nodes_mut().insert("ghost");
        list.nodes_mut().remove(ghost);
        let b = list.nodes_mut().insert("b");

        assert_eq!(
            list.append(Some(ghost), b),
            Err(Error::Node(NodeError::StaleHandle(ghost)))
        );
        assert_eq!(list.count("b"), 0);
        assert!(list.nodes().is_detached(b));
    }

    #[test]
    fn test_deleted_anchor_rejected() {
        let mut list = build(&["a", "b"]);
        let a = list.head().unwrap();
        assert!(list.delete(a));

        let x = list.nodes_mut().insert("x");
        assert_eq!(list.append(Some(a), x), Err(Error::Detached(a)));
        assert_eq!(list.prepend(Some(a), x), Err(Error::Detached(a)));

        assert!(list.find_nodes("x").is_empty());
        assert!(list.nodes().is_detached(x));
        assert!(list.nodes().is_detached(a));
        assert_eq!(list.len(), 1);
        assert_eq!(words(&list), vec!["b"]);
        assert_synced(&list);
    }

    #[test]
    fn test_duplicates_and_delete() {
        // Scenario C
        let mut list = build(&["a", "b", "c"]);
        let tail = list.tail();
        let second = list.nodes_mut().insert("b");
        list.append(tail, second).unwrap();

        let found = list.find_nodes("b");
        assert_eq!(found.len(), 2);
        assert_eq!(list.find_first("b"), Some(found[0]));

        assert!(list.delete(found[0]));
        let left = list.find_nodes("b");
        assert_eq!(left, vec![found[1]]);
        assert_eq!(list.get(left[0]), Some(&"b"));
        assert_eq!(words(&list), vec!["a", "c", "b"]);
        assert_synced(&list);
    }

    #[test]
    fn test_delete_endpoints() {
        let mut list = build(&["a", "b", "c"]);
        let (a, c) = (list.head().unwrap(), list.tail().unwrap());

        assert!(list.delete(a));
        assert_eq!(value(&list, list.head()), Some("b"));
        assert!(list.delete(c));
        assert_eq!(value(&list, list.tail()), Some("b"));
        assert_synced(&list);

        let b = list.head().unwrap();
        assert!(list.delete(b));
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
        assert!(list.is_empty());
        assert_synced(&list);

        // Deleted nodes stay alive, detached
        assert_eq!(list.get(a), Some(&"a"));
        assert!(list.nodes().is_detached(a));
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let mut list = build(&["the", "quick", "brown", "fox"]);
        let brown = list.find_nodes("brown")[0];
        let head = list.head();
        let h = list.head().unwrap();
        let extra = list.nodes_mut().insert("brown");
        list.append(Some(h), extra).unwrap();
        let tail = list.tail();
        let extra = list.nodes_mut().insert("brown");
        list.append(tail, extra).unwrap();
        let extra = list.nodes_mut().insert("brown");
        list.prepend(Some(brown), extra).unwrap();
        assert_eq!(list.count("brown"), 4);

        let mut want = 4;
        for node in list.find_nodes("brown") {
            assert!(list.delete(node));
            want -= 1;
            assert_eq!(list.count("brown"), want);
        }

        for _ in 0..10 {
            assert!(!list.delete(brown));
            assert_eq!(list.count("brown"), 0);
        }
        assert_eq!(list.head(), head);
        assert_eq!(words(&list), vec!["the", "quick", "fox"]);
        assert_synced(&list);
    }

    #[test]
    fn test_delete_never_inserted() {
        let mut list = build(&["a", "b"]);
        let stray = list.nodes_mut().insert("a");

        assert!(!list.delete(stray));
        assert_eq!(list.count("a"), 1);
        assert_synced(&list);
    }

    #[test]
    fn test_append_delete_round_trip() {
        let mut list = build(&["a", "b", "c"]);
        let (head, tail) = (list.head(), list.tail());
        let before: Vec<_> = ["a", "b", "c"].iter().map(|w| list.find_nodes(*w)).collect();

        for anchor in [head, list.find_nodes("b").first().copied(), tail] {
            let node = list.nodes_mut().insert("b");
            list.append(anchor, node).unwrap();
            assert!(list.delete(node));

            assert_eq!(list.head(), head);
            assert_eq!(list.tail(), tail);
            let after: Vec<_> = ["a", "b", "c"].iter().map(|w| list.find_nodes(*w)).collect();
            assert_eq!(after, before);
            assert_eq!(list.len(), 3);
        }
    }

    #[test]
    fn test_set_value_on_head() {
        // Scenario E
        let mut list = build(&["lazy", "dog"]);
        let head = list.head().unwrap();

        assert_eq!(list.set_value(head, "quick"), Ok("lazy"));

        assert!(list.find_nodes("lazy").is_empty());
        assert_eq!(list.find_nodes("quick"), vec![head]);
        assert_eq!(list.head(), Some(head));
        assert_eq!(words(&list), vec!["quick", "dog"]);
        assert_synced(&list);
    }

    #[test]
    fn test_set_same_value_keeps_bucket_order() {
        let mut list = build(&["a", "a", "b"]);
        let before = list.find_nodes("a");

        assert_eq!(list.set_value(before[0], "a"), Ok("a"));

        assert_eq!(list.find_nodes("a"), before);
        assert_synced(&list);
    }

    #[test]
    fn test_set_value_unregistered() {
        let mut list = build(&["a"]);
        let stray = list.nodes_mut().insert("x");

        assert_eq!(list.set_value(stray, "a"), Ok("x"));
        assert_eq!(list.count("a"), 1);
        assert_eq!(list.get(stray), Some(&"a"));
    }

    #[test]
    fn test_push_and_remove() {
        let mut list = IndexedList::new();
        let b = list.push_back("b").unwrap();
        let a = list.push_front("a").unwrap();
        let c = list.push_back("c").unwrap();

        assert_eq!(words(&list), vec!["a", "b", "c"]);
        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(list.remove(b), None);
        assert!(!list.nodes().contains(b));
        assert_eq!(list.head(), Some(a));
        assert_eq!(list.tail(), Some(c));
        assert_eq!(list.nodes().len(), 2);
        assert_synced(&list);
    }

    #[test]
    fn test_move_to_front_and_back() {
        let mut list = build(&["a", "b", "c", "d"]);
        let c = list.find_nodes("c")[0];
        let a = list.head().unwrap();
        let d = list.tail().unwrap();

        list.move_to_front(c).unwrap();
        assert_eq!(words(&list), vec!["c", "a", "b", "d"]);
        assert_synced(&list);

        list.move_to_back(a).unwrap();
        assert_eq!(words(&list), vec!["c", "b", "d", "a"]);
        assert_synced(&list);

        list.move_to_front(d).unwrap();
        list.move_to_front(d).unwrap();
        assert_eq!(words(&list), vec!["d", "c", "b", "a"]);
        list.move_to_back(d).unwrap();
        assert_eq!(words(&list), vec!["c", "b", "a", "d"]);
        assert_synced(&list);

        let stray = list.nodes_mut().insert("z");
        assert_eq!(list.move_to_front(stray), Err(Error::Detached(stray)));
    }

    #[test]
    fn test_move_single_node() {
        let mut list = build(&["only"]);
        let only = list.head().unwrap();

        list.move_to_back(only).unwrap();
        list.move_to_front(only).unwrap();
        assert_eq!(list.head(), Some(only));
        assert_eq!(list.tail(), Some(only));
    }

    #[test]
    fn test_index_invariant_after_mixed_ops() {
        let mut list = build(&["x", "y", "x", "z"]);
        let y = list.find_nodes("y")[0];
        let xs = list.find_nodes("x");

        list.set_value(xs[0], "z").unwrap();
        list.delete(y);
        let w = list.push_front("x").unwrap();
        list.set_value(w, "y").unwrap();
        let tail = list.tail();
        let extra = list.nodes_mut().insert("x");
        list.prepend(tail, extra).unwrap();
        list.move_to_front(xs[1]).unwrap();
        list.delete(list.tail().unwrap());

        assert_synced(&list);
        for v in ["x", "y", "z"] {
            let expected = list.values().filter(|w| **w == v).count();
            assert_eq!(list.count(v), expected);
        }
    }

    #[test]
    fn test_clear() {
        let mut list = build(&["a", "b", "a"]);
        let a = list.head().unwrap();

        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.find_nodes("a").is_empty());
        assert!(!list.nodes().contains(a));
        assert!(list.nodes().is_empty());

        list.push_back("c").unwrap();
        assert_synced(&list);
    }
}
