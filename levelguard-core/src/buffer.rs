//! Fixed-Storage Ring Buffer
//!
//! ## Overview
//!
//! Storage for data that has to survive deep sleep. The array is sized at
//! compile time through a const generic `N`, but the *usable* capacity is
//! chosen at runtime (`1..=N`), so one firmware image serves every buffer
//! size the configuration allows.
//!
//! ## Design Rationale
//!
//! ### Why a Ring?
//!
//! - O(1) insertion, overwriting the oldest entry when full
//! - O(1) removal from the front once an entry has been delivered
//! - Zero heap allocations, fits in RTC memory as a plain value
//!
//! ### Why Not `heapless::Deque`?
//!
//! `heapless::Deque` refuses to push when full. Here a full buffer is
//! expected (the uplink has been down for a while) and the right answer is
//! to drop the oldest reading and tell the caller which one went.
//!
//! ### Memory Layout
//!
//! ```text
//! CircularBuffer<T, 8> with capacity 5, after 7 pushes:
//! ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//! │  F  │  G  │  C  │  D  │  E  │  -  │  -  │  -  │
//! └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!          ↑     ↑                  (unused beyond capacity)
//!          │     └── head = 2 (oldest)
//!          └── last write
//! ```
//!
//! Logical index `i` maps to physical `(head + i) % capacity`.

/// Ring buffer over an `N`-slot array with a runtime capacity `<= N`
///
/// ## Internal Invariants
///
/// - `1 <= capacity <= N`
/// - `head < capacity`
/// - `len <= capacity`
/// - slots `head .. head + len` (mod capacity) are `Some`
#[derive(Clone)]
pub struct CircularBuffer<T: Copy, const N: usize> {
    data: [Option<T>; N],
    head: usize,
    len: usize,
    capacity: usize,
}

impl<T: Copy, const N: usize> CircularBuffer<T, N> {
    /// Buffer using all `N` slots
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            head: 0,
            len: 0,
            capacity: N,
        }
    }

    /// Buffer limited to `capacity` slots. `None` if `capacity` is zero or
    /// larger than `N`.
    pub const fn with_capacity(capacity: usize) -> Option<Self> {
        if capacity == 0 || capacity > N {
            return None;
        }
        Some(Self {
            data: [None; N],
            head: 0,
            len: 0,
            capacity,
        })
    }

    /// Append an item. When full, the oldest item is overwritten and
    /// returned.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.len == self.capacity {
            let evicted = self.data[self.head].replace(item);
            self.head = (self.head + 1) % self.capacity;
            evicted
        } else {
            let idx = (self.head + self.len) % self.capacity;
            self.data[idx] = Some(item);
            self.len += 1;
            None
        }
    }

    /// Remove and return the oldest item
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.data[self.head].take();
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        item
    }

    /// Oldest item without removing it
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Most recent item
    pub fn last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    /// Usable slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> CircularBufferIter<'_, T, N> {
        CircularBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Drop every item, keeping the capacity
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.head = 0;
        self.len = 0;
    }

    /// Item by logical index (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.data[(self.head + index) % self.capacity].as_ref()
    }
}

/// Iterator over circular buffer contents, oldest first
pub struct CircularBufferIter<'a, T: Copy, const N: usize> {
    buffer: &'a CircularBuffer<T, N>,
    index: usize,
}

impl<'a, T: Copy, const N: usize> Iterator for CircularBufferIter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T: Copy, const N: usize> Default for CircularBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + core::fmt::Debug, const N: usize> core::fmt::Debug for CircularBuffer<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer: CircularBuffer<u32, 5> = CircularBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 5);
        assert!(buffer.last().is_none());
        assert!(buffer.front().is_none());
    }

    #[test]
    fn capacity_bounds() {
        assert!(CircularBuffer::<u8, 4>::with_capacity(0).is_none());
        assert!(CircularBuffer::<u8, 4>::with_capacity(5).is_none());
        assert_eq!(CircularBuffer::<u8, 4>::with_capacity(4).map(|b| b.capacity()), Some(4));
    }

    #[test]
    fn circular_overwrite() {
        let mut buffer = CircularBuffer::<u32, 8>::with_capacity(3).unwrap();

        assert_eq!(buffer.push(0), None);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), Some(0));
        assert_eq!(buffer.push(4), Some(1));

        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());

        let values: Vec<u32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![2, 3, 4]);
        assert_eq!(buffer.last(), Some(&4));
    }

    #[test]
    fn pop_front_then_push_keeps_order() {
        let mut buffer = CircularBuffer::<u32, 4>::new();
        for i in 0..6 {
            buffer.push(i);
        }
        assert_eq!(buffer.pop_front(), Some(2));
        assert_eq!(buffer.pop_front(), Some(3));
        buffer.push(6);

        let values: Vec<u32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![4, 5, 6]);
        assert_eq!(buffer.iter().size_hint(), (3, Some(3)));
    }

    #[test]
    fn clear_resets() {
        let mut buffer = CircularBuffer::<u32, 4>::new();
        buffer.push(1);
        buffer.push(2);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop_front(), None);
        assert_eq!(buffer.capacity(), 4);
    }
}
