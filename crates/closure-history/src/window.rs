//! Fixed-capacity FIFO window

use std::collections::VecDeque;

/// Sliding window that evicts its oldest element on overflow
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    /// Create a window; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, returning the evicted one if the window was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.data.len() >= self.capacity {
            self.data.pop_front()
        } else {
            None
        };
        self.data.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn back(&self) -> Option<&T> {
        self.data.back()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + Clone {
        self.data.iter()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_evicts_oldest() {
        let mut window = SlidingWindow::new(3);
        assert_eq!(window.push(1), None);
        assert_eq!(window.push(2), None);
        assert_eq!(window.push(3), None);
        assert_eq!(window.push(4), Some(1));
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(window.back(), Some(&4));
    }

    #[test]
    fn test_zero_capacity() {
        let mut window = SlidingWindow::new(0);
        window.push('a');
        window.push('b');
        assert_eq!(window.len(), 1);
        assert_eq!(window.back(), Some(&'b'));
    }

    proptest! {
        #[test]
        fn prop_bounded_fifo(capacity in 1usize..64, items in prop::collection::vec(any::<u32>(), 0..256)) {
            let mut window = SlidingWindow::new(capacity);
            for &item in &items {
                window.push(item);
                prop_assert!(window.len() <= capacity);
            }
            let start = items.len().saturating_sub(capacity);
            let kept: Vec<u32> = window.iter().copied().collect();
            prop_assert_eq!(kept, items[start..].to_vec());
        }
    }
}
