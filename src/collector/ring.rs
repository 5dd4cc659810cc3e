// src/collector/ring.rs
//! Fixed-capacity FIFO used by both the log store and the pending batch

use std::collections::VecDeque;

/// Ordered container that drops its oldest element on overflow.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Storage grows on demand, so a huge configured capacity costs nothing up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Append an item, evicting from the front while over capacity.
    /// Returns the number of evicted items.
    pub fn push(&mut self, item: T) -> usize {
        self.items.push_back(item);
        let mut evicted = 0;
        while self.items.len() > self.capacity {
            self.items.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Remove every item at once, preserving order.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
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

    #[test]
    fn test_evicts_oldest_first() {
        let mut ring = RingBuffer::new(3);
        let evicted: usize = (0..5).map(|i| ring.push(i)).sum();
        assert_eq!(evicted, 2);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.push("x"), 1);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_huge_capacity_does_not_allocate_up_front() {
        let mut ring = RingBuffer::new(usize::MAX);
        ring.push(1u8);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.capacity(), usize::MAX);
    }

    #[test]
    fn test_drain_empties_in_order() {
        let mut ring = RingBuffer::new(4);
        ring.push('a');
        ring.push('b');
        assert_eq!(ring.drain(), vec!['a', 'b']);
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 4);
    }
}
