//! Bounded, importance-ranked short-term memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// One working-memory entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingMemoryItem {
    pub content: String,
    pub importance: f32,
    pub timestamp: DateTime<Utc>,
    /// Insertion order, breaks timestamp ties.
    #[serde(skip)]
    seq: u64,
}

impl WorkingMemoryItem {
    /// Rank used for eviction: lowest goes first.
    fn rank(&self, other: &Self) -> Ordering {
        self.importance
            .total_cmp(&other.importance)
            .then(self.timestamp.cmp(&other.timestamp))
            .then(self.seq.cmp(&other.seq))
    }
}

/// Working memory that never holds more than `capacity` items.
///
/// Inserting into a full memory evicts exactly one item: the least important,
/// and among equals the oldest.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    capacity: usize,
    items: Vec<WorkingMemoryItem>,
    next_seq: u64,
}

impl WorkingMemory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: Vec::with_capacity(capacity + 1),
            next_seq: 0,
        }
    }

    /// Insert an item stamped with the current time.
    pub fn insert(&mut self, content: impl Into<String>, importance: f32) {
        self.insert_at(content, importance, Utc::now());
    }

    /// Insert an item with an explicit timestamp.
    pub fn insert_at(
        &mut self,
        content: impl Into<String>,
        importance: f32,
        timestamp: DateTime<Utc>,
    ) {
        self.items.push(WorkingMemoryItem {
            content: content.into(),
            importance,
            timestamp,
            seq: self.next_seq,
        });
        self.next_seq += 1;

        if self.items.len() > self.capacity
            && let Some(evict) = self
                .items
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.rank(b))
                .map(|(index, _)| index)
        {
            let evicted = self.items.remove(evict);
            tracing::trace!(target: "memory", "evicted working item: {}", evicted.content);
        }
    }

    /// Items, most important first, newest first among equals.
    pub fn items(&self) -> Vec<&WorkingMemoryItem> {
        let mut sorted: Vec<&WorkingMemoryItem> = self.items.iter().collect();
        sorted.sort_by(|a, b| b.rank(a));
        sorted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, second).unwrap()
    }

    fn contents(memory: &WorkingMemory) -> Vec<&str> {
        memory.items().iter().map(|i| i.content.as_str()).collect()
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut memory = WorkingMemory::new(3);
        for i in 0..10 {
            memory.insert(format!("item {i}"), 1.0);
            assert!(memory.len() <= 3);
        }
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn test_evicts_least_important() {
        let mut memory = WorkingMemory::new(2);
        memory.insert_at("User: hi", 1.0, at(0));
        memory.insert_at("Agent: hello", 0.9, at(1));
        memory.insert_at("User: again", 1.0, at(2));

        assert_eq!(contents(&memory), vec!["User: again", "User: hi"]);
    }

    #[test]
    fn test_evicts_oldest_among_equal_importance() {
        let mut memory = WorkingMemory::new(2);
        memory.insert_at("first", 1.0, at(0));
        memory.insert_at("second", 1.0, at(1));
        memory.insert_at("third", 1.0, at(2));

        assert_eq!(contents(&memory), vec!["third", "second"]);
    }

    #[test]
    fn test_identical_timestamps_evict_earlier_insert() {
        let mut memory = WorkingMemory::new(2);
        memory.insert_at("a", 0.5, at(0));
        memory.insert_at("b", 0.5, at(0));
        memory.insert_at("c", 0.5, at(0));

        assert_eq!(contents(&memory), vec!["c", "b"]);
    }

    #[test]
    fn test_new_low_importance_item_can_evict_itself() {
        let mut memory = WorkingMemory::new(1);
        memory.insert_at("keep", 1.0, at(0));
        memory.insert_at("drop", 0.1, at(1));

        assert_eq!(contents(&memory), vec!["keep"]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let memory = WorkingMemory::new(0);
        assert_eq!(memory.capacity(), 1);
        assert!(memory.is_empty());
    }
}
