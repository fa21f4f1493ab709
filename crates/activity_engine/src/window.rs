//! Rolling windows backing the history store.
//!
//! - `SizedWindow`: fixed capacity ring buffer, oldest entry overwritten on push
//! - `AgedWindow`: time-boxed sequence, entries older than `max_age_ms` are evicted on push

use std::collections::VecDeque;
use std::fmt;

use ringbuf::{traits::*, HeapRb};

/// Fixed capacity FIFO window
pub struct SizedWindow<T> {
    buf: HeapRb<T>,
    capacity: usize,
}

impl<T> fmt::Debug for SizedWindow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizedWindow")
            .field("len", &self.buf.occupied_len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T> SizedWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: HeapRb::new(capacity),
            capacity,
        }
    }

    /// Push an item, returning the evicted oldest item when full
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        self.buf.push_overwrite(item)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// The newest `n` items, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.len().saturating_sub(n);
        self.buf.iter().skip(skip)
    }

    pub fn latest(&self) -> Option<&T> {
        self.buf.iter().last()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Entry of an `AgedWindow`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped<T> {
    pub timestamp_ms: u64,
    pub value: T,
}

/// Time-boxed FIFO window
///
/// An entry survives while `now - entry.timestamp_ms <= max_age_ms`, where `now`
/// is the timestamp of the latest push.
#[derive(Debug, Clone)]
pub struct AgedWindow<T> {
    entries: VecDeque<Stamped<T>>,
    max_age_ms: u64,
}

impl<T> AgedWindow<T> {
    pub fn new(max_age_ms: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            max_age_ms,
        }
    }

    /// Append an entry and evict everything that aged out relative to it
    ///
    /// Returns the number of evicted entries.
    pub fn push(&mut self, timestamp_ms: u64, value: T) -> usize {
        self.entries.push_back(Stamped {
            timestamp_ms,
            value,
        });
        let before = self.entries.len();
        let max_age = self.max_age_ms;
        // retain instead of popping the front: replayed input may arrive out of order
        self.entries
            .retain(|e| timestamp_ms.saturating_sub(e.timestamp_ms) <= max_age);
        before - self.entries.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn max_age_ms(&self) -> u64 {
        self.max_age_ms
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stamped<T>> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
