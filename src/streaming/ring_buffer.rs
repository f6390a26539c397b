//! Bounded Ring Buffer for Streaming Substitution
//!
//! Memory grows on demand but never past a hard ceiling.
//! This ring buffer:
//! - Starts small and at least doubles when full
//! - Fails with `CapacityExceeded` instead of growing past `max_capacity`
//! - Keeps one physical slot free so head == tail always means empty
//!
//! Invariant: `0 <= len <= capacity - 1 <= max_capacity`.

use crate::error::BufferError;

/// Growable FIFO of code units over one contiguous array
#[derive(Debug, Clone)]
pub struct BoundedRingBuffer<T> {
    /// Physical storage; its length is the current capacity
    buffer: Vec<T>,
    /// Index of the oldest unit
    head: usize,
    /// Index one past the newest unit (wraps around)
    tail: usize,
    /// Hard ceiling on logical length, fixed at construction
    max_capacity: usize,
}

impl<T: Copy + Default> BoundedRingBuffer<T> {
    /// Create with room for `initial` units, growable up to `max` units
    pub fn new(initial: usize, max: usize) -> Self {
        Self {
            buffer: vec![T::default(); initial.min(max) + 1],
            head: 0,
            tail: 0,
            max_capacity: max,
        }
    }

    /// Number of units currently held
    #[inline]
    pub fn len(&self) -> usize {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.buffer.len() - self.head + self.tail
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Physical array length (one more than the units it can hold right now)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Append one unit, growing if needed - amortized O(1)
    pub fn put(&mut self, unit: T) -> Result<(), BufferError> {
        if self.len() + 1 >= self.buffer.len() {
            self.grow()?;
        }
        self.buffer[self.tail] = unit;
        self.tail = (self.tail + 1) % self.buffer.len();
        Ok(())
    }

    /// Append many units.
    ///
    /// Units are put one at a time; if the ceiling is hit midway, the units
    /// already appended stay in the buffer.
    pub fn put_all(&mut self, units: &[T]) -> Result<(), BufferError> {
        for &unit in units {
            self.put(unit)?;
        }
        Ok(())
    }

    /// Remove and return the oldest unit
    pub fn take(&mut self) -> Result<T, BufferError> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }
        let unit = self.buffer[self.head];
        self.head = (self.head + 1) % self.buffer.len();
        Ok(unit)
    }

    /// Move up to `dest.len()` of the oldest units into `dest`.
    /// Returns how many were moved.
    pub fn take_into(&mut self, dest: &mut [T]) -> usize {
        let count = self.len().min(dest.len());
        let (front, back) = self.as_slices();
        let from_front = count.min(front.len());
        dest[..from_front].copy_from_slice(&front[..from_front]);
        dest[from_front..count].copy_from_slice(&back[..count - from_front]);
        self.head = (self.head + count) % self.buffer.len();
        count
    }

    /// Drop the `count` oldest units
    pub fn skip(&mut self, count: usize) -> Result<(), BufferError> {
        let len = self.len();
        if count > len {
            return Err(BufferError::OutOfRange { offset: count, len });
        }
        self.head = (self.head + count) % self.buffer.len();
        Ok(())
    }

    /// Unit `ahead` positions from the head, without removing it
    pub fn peek(&self, ahead: usize) -> Result<T, BufferError> {
        let len = self.len();
        if ahead >= len {
            return Err(BufferError::OutOfRange { offset: ahead, len });
        }
        Ok(self.at(ahead))
    }

    /// Reset to empty; storage is kept
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Copy the `length` oldest units into `dest[offset..offset + length]`.
    /// The buffer is left untouched.
    pub fn copy_into(&self, dest: &mut [T], offset: usize, length: usize) -> Result<(), BufferError> {
        let len = self.len();
        if length > len {
            return Err(BufferError::OutOfRange { offset: length, len });
        }
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= dest.len())
            .ok_or(BufferError::OutOfRange {
                offset: offset.saturating_add(length),
                len: dest.len(),
            })?;

        let (front, back) = self.as_slices();
        let from_front = length.min(front.len());
        dest[offset..offset + from_front].copy_from_slice(&front[..from_front]);
        dest[offset + from_front..end].copy_from_slice(&back[..length - from_front]);
        Ok(())
    }

    /// New buffer (same ceiling) holding a copy of `[start, end)`
    pub fn subrange(&self, start: usize, end: usize) -> Result<Self, BufferError> {
        let len = self.len();
        if end > len {
            return Err(BufferError::OutOfRange { offset: end, len });
        }
        if start > end {
            return Err(BufferError::OutOfRange { offset: start, len: end });
        }
        let mut out = Self::new(end - start, self.max_capacity);
        for i in start..end {
            out.put(self.at(i))?;
        }
        Ok(out)
    }

    /// Logical content as two slices, oldest first
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.tail >= self.head {
            (&self.buffer[self.head..self.tail], &[])
        } else {
            (&self.buffer[self.head..], &self.buffer[..self.tail])
        }
    }

    /// Iterate over the logical content, oldest first
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (front, back) = self.as_slices();
        front.iter().chain(back.iter()).copied()
    }

    #[inline]
    fn at(&self, logical: usize) -> T {
        self.buffer[(self.head + logical) % self.buffer.len()]
    }

    /// Copy-and-replace growth; logical order is preserved across wraparound
    fn grow(&mut self) -> Result<(), BufferError> {
        let old_size = self.buffer.len();
        let ceiling = self.max_capacity + 1;
        if old_size >= ceiling {
            return Err(BufferError::CapacityExceeded {
                max_capacity: self.max_capacity,
            });
        }
        let new_size = ceiling.min((old_size + 1).max(old_size * 2));

        let len = self.len();
        let mut grown = vec![T::default(); new_size];
        let (front, back) = self.as_slices();
        grown[..front.len()].copy_from_slice(front);
        grown[front.len()..len].copy_from_slice(back);

        self.buffer = grown;
        self.head = 0;
        self.tail = len;
        Ok(())
    }
}

impl<T: Copy + Default + PartialEq> BoundedRingBuffer<T> {
    /// First offset `>= from` where `needle` occurs in the logical content
    pub fn index_of(&self, needle: &[T], from: usize) -> Option<usize> {
        let len = self.len();
        if from > len || needle.len() > len - from {
            return None;
        }
        (from..=len - needle.len())
            .find(|&start| needle.iter().enumerate().all(|(i, &u)| self.at(start + i) == u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn content(buf: &BoundedRingBuffer<u16>) -> String {
        String::from_utf16_lossy(&buf.iter().collect::<Vec<_>>())
    }

    #[test]
    fn test_exact_max_puts_succeed() {
        let mut buf: BoundedRingBuffer<u16> = BoundedRingBuffer::new(2, 10);
        for i in 0..10 {
            buf.put(i).unwrap();
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(
            buf.put(99),
            Err(BufferError::CapacityExceeded { max_capacity: 10 })
        );
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn test_zero_max_rejects_first_put() {
        let mut buf: BoundedRingBuffer<u16> = BoundedRingBuffer::new(0, 0);
        assert!(matches!(buf.put(1), Err(BufferError::CapacityExceeded { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_initial_larger_than_max_is_clamped() {
        let mut buf: BoundedRingBuffer<u16> = BoundedRingBuffer::new(100, 3);
        assert_eq!(buf.capacity(), 4);
        buf.put_all(&[1, 2, 3]).unwrap();
        assert!(buf.put(4).is_err());
    }

    #[test]
    fn test_growth_doubles_until_ceiling() {
        let mut buf: BoundedRingBuffer<u16> = BoundedRingBuffer::new(1, 5);
        assert_eq!(buf.capacity(), 2);
        buf.put(1).unwrap();
        buf.put(2).unwrap();
        assert_eq!(buf.capacity(), 4);
        buf.put(3).unwrap();
        buf.put(4).unwrap();
        assert_eq!(buf.capacity(), 6);
    }

    #[test]
    fn test_fifo_order_across_wraparound_and_growth() {
        let mut buf = BoundedRingBuffer::new(4, 64);
        buf.put_all(&units("abc")).unwrap();
        assert_eq!(buf.take().unwrap(), 'a' as u16);
        assert_eq!(buf.take().unwrap(), 'b' as u16);
        // Wraps, then grows while wrapped
        buf.put_all(&units("defghij")).unwrap();
        assert_eq!(content(&buf), "cdefghij");
        assert_eq!(buf.peek(0).unwrap(), 'c' as u16);
        assert_eq!(buf.peek(7).unwrap(), 'j' as u16);
    }

    #[test]
    fn test_take_on_empty() {
        let mut buf: BoundedRingBuffer<u16> = BoundedRingBuffer::new(4, 4);
        assert_eq!(buf.take(), Err(BufferError::Empty));
    }

    #[test]
    fn test_peek_out_of_range() {
        let mut buf = BoundedRingBuffer::new(4, 4);
        buf.put_all(&units("ab")).unwrap();
        assert_eq!(
            buf.peek(2),
            Err(BufferError::OutOfRange { offset: 2, len: 2 })
        );
    }

    #[test]
    fn test_put_all_keeps_partial_append() {
        let mut buf = BoundedRingBuffer::new(1, 3);
        let result = buf.put_all(&units("abcde"));
        assert!(matches!(result, Err(BufferError::CapacityExceeded { .. })));
        assert_eq!(content(&buf), "abc");
    }

    #[test]
    fn test_clear_keeps_storage() {
        let mut buf = BoundedRingBuffer::new(2, 32);
        buf.put_all(&units("hello world")).unwrap();
        let cap = buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), cap);
    }

    #[test]
    fn test_copy_into_with_wraparound() {
        let mut buf = BoundedRingBuffer::new(5, 5);
        buf.put_all(&units("xxxab")).unwrap();
        buf.skip(3).unwrap();
        buf.put_all(&units("cd")).unwrap();

        let mut dest = [0u16; 6];
        buf.copy_into(&mut dest, 1, 4).unwrap();
        assert_eq!(String::from_utf16_lossy(&dest[1..5]), "abcd");
        // Source untouched
        assert_eq!(buf.len(), 4);

        assert!(buf.copy_into(&mut dest, 3, 4).is_err());
        assert!(buf.copy_into(&mut dest, 0, 5).is_err());
    }

    #[test]
    fn test_take_into_drains_oldest() {
        let mut buf = BoundedRingBuffer::new(4, 16);
        buf.put_all(&units("abcdef")).unwrap();
        let mut dest = [0u16; 4];
        assert_eq!(buf.take_into(&mut dest), 4);
        assert_eq!(String::from_utf16_lossy(&dest), "abcd");
        assert_eq!(buf.take_into(&mut dest), 2);
        assert_eq!(String::from_utf16_lossy(&dest[..2]), "ef");
        assert_eq!(buf.take_into(&mut dest), 0);
    }

    #[test]
    fn test_index_of() {
        let mut buf = BoundedRingBuffer::new(4, 32);
        buf.put_all(&units("zzabcabc")).unwrap();
        buf.skip(2).unwrap();
        assert_eq!(buf.index_of(&units("bc"), 0), Some(1));
        assert_eq!(buf.index_of(&units("bc"), 2), Some(4));
        assert_eq!(buf.index_of(&units("bc"), 5), None);
        assert_eq!(buf.index_of(&units("abcabcd"), 0), None);
        assert_eq!(buf.index_of(&[], 3), Some(3));
        assert_eq!(buf.index_of(&units("a"), 7), None);
    }

    #[test]
    fn test_subrange_copies() {
        let mut buf = BoundedRingBuffer::new(4, 32);
        buf.put_all(&units("manyafal")).unwrap();
        let sub = buf.subrange(2, 5).unwrap();
        assert_eq!(content(&sub), "nya");
        assert_eq!(sub.max_capacity(), 32);
        assert_eq!(content(&buf), "manyafal");

        assert!(buf.subrange(3, 9).is_err());
        assert!(buf.subrange(4, 2).is_err());
        assert!(buf.subrange(8, 8).unwrap().is_empty());
    }
}
