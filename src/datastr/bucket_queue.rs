//! An integer-keyed bucket queue for the contraction order.
//!
//! Keys are edge differences and may be negative. All ids with the same key
//! share one bucket; the order inside a bucket is unspecified.

use crate::datastr::graph::NodeId;
use crate::util::InRangeOption;
use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdKeyPair {
    pub id: NodeId,
    pub key: i32,
}

#[derive(Debug)]
pub struct BucketQueue {
    buckets: BTreeMap<i32, Vec<NodeId>>,
    // per id: position inside its bucket, absent when not queued
    positions: Vec<InRangeOption<u32>>,
    keys: Vec<i32>,
}

impl BucketQueue {
    pub fn new(size: usize) -> BucketQueue {
        BucketQueue {
            buckets: BTreeMap::new(),
            positions: vec![InRangeOption::new(None); size],
            keys: vec![0; size],
        }
    }

    pub fn push(&mut self, element: IdKeyPair) {
        debug_assert!(!self.contains_id(element.id));
        let bucket = self.buckets.entry(element.key).or_default();
        self.positions[element.id as usize] = InRangeOption::new(Some(bucket.len() as u32));
        self.keys[element.id as usize] = element.key;
        bucket.push(element.id);
    }

    /// Some element with the smallest key, or None when empty.
    pub fn peek(&self) -> Option<IdKeyPair> {
        self.buckets.iter().next().map(|(&key, bucket)| IdKeyPair {
            id: *bucket.last().unwrap(),
            key,
        })
    }

    pub fn pop(&mut self) -> Option<IdKeyPair> {
        let (&key, bucket) = self.buckets.iter_mut().next()?;
        let id = bucket.pop().unwrap();
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.positions[id as usize] = InRangeOption::new(None);
        Some(IdKeyPair { id, key })
    }

    pub fn contains_id(&self, id: NodeId) -> bool {
        self.positions[id as usize].value().is_some()
    }

    /// Key of a queued id. Must be queued.
    pub fn key(&self, id: NodeId) -> i32 {
        debug_assert!(self.contains_id(id));
        self.keys[id as usize]
    }

    /// Move a queued id into a different bucket.
    pub fn change_key(&mut self, element: IdKeyPair) {
        self.remove_id(element.id);
        self.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn remove_id(&mut self, id: NodeId) {
        let key = self.keys[id as usize];
        let position = self.positions[id as usize].value().expect("id not queued") as usize;
        let bucket = self.buckets.get_mut(&key).unwrap();
        let moved = *bucket.last().unwrap();
        bucket.swap_remove(position);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        } else if moved != id {
            self.positions[moved as usize] = InRangeOption::new(Some(position as u32));
        }
        self.positions[id as usize] = InRangeOption::new(None);
    }
}
