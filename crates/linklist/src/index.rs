//! Value index: value -> nodes currently holding it
//!
//! Buckets keep registration order. Removal scans and shifts the bucket, so
//! it costs O(k) for a bucket of k nodes; every other operation is O(1)
//! expected.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use linknode::NodeId;

pub(crate) struct ValueIndex<V> {
    buckets: HashMap<V, Vec<NodeId>, RandomState>,
    len: usize,
}

impl<V> ValueIndex<V>
where
    V: Hash + Eq + Clone,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            len: 0,
        }
    }

    /// Total number of registrations across all buckets
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn register(&mut self, value: &V, id: NodeId) {
        if let Some(bucket) = self.buckets.get_mut(value) {
            bucket.push(id);
        } else {
            self.buckets.insert(value.clone(), vec![id]);
        }
        self.len += 1;
    }

    /// Drop `id` from the bucket for `value`; empty buckets are removed
    pub(crate) fn deregister(&mut self, value: &V, id: NodeId) -> bool {
        let Some(bucket) = self.buckets.get_mut(value) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|&n| n == id) else {
            return false;
        };

        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(value);
        }
        self.len -= 1;
        true
    }

    pub(crate) fn contains(&self, value: &V, id: NodeId) -> bool {
        self.bucket(value).contains(&id)
    }

    pub(crate) fn bucket<Q>(&self, value: &Q) -> &[NodeId]
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn buckets(&self) -> impl Iterator<Item = (&V, &[NodeId])> {
        self.buckets.iter().map(|(v, ids)| (v, ids.as_slice()))
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.buckets.values().flatten().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}
