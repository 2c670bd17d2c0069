// RecentItems - bounded most-recently-used list (command palette history)

use crate::config::DEFAULT_RECENT_CAPACITY;
use std::collections::VecDeque;

/// Most-recently-used list without duplicates
#[derive(Debug, Clone)]
pub struct RecentItems<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: PartialEq> RecentItems<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Move `item` to the front, dropping the least recent entry when full
    pub fn touch(&mut self, item: T) {
        if let Some(index) = self.items.iter().position(|existing| *existing == item) {
            self.items.remove(index);
        }
        self.items.push_front(item);
        self.items.truncate(self.capacity);
    }

    /// Most recent first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn most_recent(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: PartialEq> Default for RecentItems<T> {
    fn default() -> Self {
        Self::new()
    }
}
