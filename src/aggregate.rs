// 📊 Aggregation primitives - grouped counts and rankings
//
// GroupedCounts keeps keys in first-seen order. Every ranking below is a
// stable sort over that order, so on equal counts the key inserted first wins.

use crate::size::{size_value, UNKNOWN_SIZE};
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use std::collections::HashMap;

// ============================================================================
// COUNT ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct CountEntry {
    pub key: String,
    pub count: u64,
}

impl CountEntry {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        CountEntry {
            key: key.into(),
            count,
        }
    }
}

// ============================================================================
// GROUPED COUNTS
// ============================================================================

/// Insertion-ordered key → count map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedCounts {
    entries: Vec<CountEntry>,
    index: HashMap<String, usize>,
}

impl GroupedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `key`, creating it at the end if unseen
    pub fn add(&mut self, key: &str, amount: u64) {
        match self.index.get(key) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.count = entry.count.saturating_add(amount);
            }
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(CountEntry::new(key, amount));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&i| self.entries[i].count)
    }

    /// Entries in first-seen order
    pub fn entries(&self) -> &[CountEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().fold(0, |acc, e| acc.saturating_add(e.count))
    }

    /// Entries by count, highest first; ties keep first-seen order
    pub fn sorted_desc(&self) -> Vec<CountEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted
    }

    /// The entry with the highest count; the earliest key wins ties
    pub fn most_common(&self) -> Option<CountEntry> {
        self.sorted_desc().into_iter().next()
    }

    /// First `n` entries of `sorted_desc`
    pub fn top_n(&self, n: usize) -> Vec<CountEntry> {
        self.sorted_desc().into_iter().take(n).collect()
    }
}

impl<'a> FromIterator<(&'a str, u64)> for GroupedCounts {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        let mut counts = GroupedCounts::new();
        for (key, amount) in iter {
            counts.add(key, amount);
        }
        counts
    }
}

impl Serialize for GroupedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

// ============================================================================
// GROUPING HELPERS
// ============================================================================

/// One per item
pub fn count_by<T, F>(items: &[T], key: F) -> GroupedCounts
where
    F: Fn(&T) -> &str,
{
    items.iter().map(|item| (key(item), 1)).collect()
}

/// Sum of `amount` per item
pub fn sum_by<T, K, A>(items: &[T], key: K, amount: A) -> GroupedCounts
where
    K: Fn(&T) -> &str,
    A: Fn(&T) -> u64,
{
    items.iter().map(|item| (key(item), amount(item))).collect()
}

/// Largest size label among line-size groups, ignoring "Unknown".
///
/// Labels compare by numeric prefix (non-numeric reads as 0); equal sizes
/// keep first-seen order.
pub fn largest_size(sizes: &GroupedCounts) -> Option<CountEntry> {
    let mut candidates: Vec<CountEntry> = sizes
        .entries()
        .iter()
        .filter(|e| e.key != UNKNOWN_SIZE)
        .cloned()
        .collect();

    candidates.sort_by(|a, b| {
        size_value(&b.key)
            .partial_cmp(&size_value(&a.key))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates.into_iter().next()
}

// ============================================================================
// TESTS
// ============================================================================
