//! # Identifier Management
//!
//! Identifiers are lightweight handles used for both entities and
//! component kinds. Each consists of:
//! - A data field (dense index)
//! - A generation counter for safe reuse
//!
//! The [`IdAllocator`] issues identifiers from a configurable window and
//! recycles disposed ones with a bumped generation, so a stale handle is an
//! O(1) detectable condition instead of silent aliasing.

use std::collections::HashMap;
use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Generation-checked identifier.
///
/// Layout:
/// - Bits 0..32: data (dense index)
/// - Bits 32..48: generation
/// - Bits 48..56: unused
/// - Bits 56..64: flags (reserved, always zero)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Id(u64);

impl Id {
    /// Null/invalid identifier, returned when allocation fails.
    pub const NULL: Self = Self(u64::MAX);

    /// Composes an identifier from its data and generation fields.
    #[inline]
    #[must_use]
    pub const fn new(data: u32, generation: u16) -> Self {
        Self(((generation as u64) << 32) | (data as u64))
    }

    /// Returns the data (dense index) portion.
    #[inline]
    #[must_use]
    pub const fn data(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u16 {
        (self.0 >> 32) as u16
    }

    /// Returns the raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Reinterprets a raw 64-bit value as an identifier.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Checks if this is the null identifier.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.data(), self.generation())
        }
    }
}

/// Issues and recycles generation-checked identifiers.
///
/// The allocation window is `[lower, upper]` (inclusive). Without an upper
/// bound the allocator only fails once the `u32` data space runs out.
///
/// # Example
///
/// ```rust
/// use tabula_core::IdAllocator;
///
/// let mut ids = IdAllocator::new();
/// let a = ids.allocate();
/// assert!(ids.is_valid(a));
///
/// ids.dispose(a);
/// assert!(!ids.is_valid(a));
///
/// let b = ids.allocate();
/// assert_eq!(b.data(), a.data());
/// assert!(b.generation() > a.generation());
/// ```
#[derive(Debug, Default)]
pub struct IdAllocator {
    /// Liveness record: data field -> current generation.
    generations: HashMap<u32, u16>,
    /// Disposed identifiers ready for reissue (generation already bumped).
    free_ids: Vec<Id>,
    /// Lower bound of the window.
    lower: u32,
    /// Inclusive upper bound, `None` when unbounded.
    upper: Option<u32>,
    /// Offset of the next fresh data value from `lower`.
    cursor: u32,
    /// Set once the cursor walked past `u32::MAX`.
    overflowed: bool,
}

impl IdAllocator {
    /// Creates an unbounded allocator starting at data value 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current window as `(lower, upper)`.
    #[inline]
    #[must_use]
    pub fn range(&self) -> (u32, Option<u32>) {
        (self.lower, self.upper)
    }

    /// Returns the number of data fields with a liveness record.
    #[inline]
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.generations.len()
    }

    /// Returns the number of identifiers waiting to be recycled.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_ids.len()
    }

    /// Redefines the allocation window and resets the cursor to `lower`.
    ///
    /// Every tracked data field inside the new window has its generation
    /// bumped, even if it was never disposed: fresh identifiers may now be
    /// issued there, so the previous identity can no longer be trusted.
    /// The free list is emptied; slots inside the window are reissued by
    /// the cursor and slots outside it are out of range.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRange`] if `lower > upper`. The
    /// allocator is left untouched in that case.
    pub fn set_range(&mut self, lower: u32, upper: u32) -> StoreResult<()> {
        if lower > upper {
            tracing::error!("lower bound {} can't be bigger than upper bound {}", lower, upper);
            return Err(StoreError::InvalidRange { lower, upper });
        }

        self.lower = lower;
        self.upper = Some(upper);
        self.reset_window();
        Ok(())
    }

    /// Removes the upper bound and restarts the cursor at data value 0.
    ///
    /// Like [`IdAllocator::set_range`], every tracked identifier is
    /// invalidated because the whole data space is the new window.
    pub fn clear_range(&mut self) {
        self.lower = 0;
        self.upper = None;
        self.reset_window();
    }

    fn reset_window(&mut self) {
        self.cursor = 0;
        self.overflowed = false;
        self.free_ids.clear();

        let (lower, upper) = (self.lower, self.upper.unwrap_or(u32::MAX));
        for (data, generation) in &mut self.generations {
            if (lower..=upper).contains(data) {
                *generation = generation.wrapping_add(1);
            }
        }
    }

    #[inline]
    fn in_window(&self, data: u32) -> bool {
        data >= self.lower && self.upper.map_or(true, |upper| data <= upper)
    }

    /// Returns a new live identifier.
    ///
    /// Recycled identifiers are handed out first. Otherwise the next data
    /// value in the window is issued with its recorded generation (0 for a
    /// slot never seen before).
    ///
    /// Returns [`Id::NULL`] and logs a warning if the window is exhausted.
    pub fn allocate(&mut self) -> Id {
        if let Some(id) = self.free_ids.pop() {
            return id;
        }

        let data = if self.overflowed {
            None
        } else {
            self.lower.checked_add(self.cursor)
        };
        let data = match (data, self.upper) {
            (Some(data), Some(upper)) if data <= upper => data,
            (Some(data), None) => data,
            _ => {
                tracing::warn!(
                    "all ids within range [{}, {}] have been used up",
                    self.lower,
                    self.upper.unwrap_or(u32::MAX)
                );
                return Id::NULL;
            }
        };

        match self.cursor.checked_add(1) {
            Some(next) => self.cursor = next,
            None => self.overflowed = true,
        }
        if data == u32::MAX {
            self.overflowed = true;
        }

        let generation = *self.generations.entry(data).or_insert(0);
        Id::new(data, generation)
    }

    /// Disposes of a live identifier.
    ///
    /// The stored generation is bumped and the successor identifier is
    /// queued for reuse, unless the data field is outside the current
    /// window, in which case its liveness record is dropped entirely.
    ///
    /// Returns `false` if `id` was not live.
    pub fn dispose(&mut self, id: Id) -> bool {
        if !self.is_valid(id) {
            return false;
        }

        let data = id.data();
        if !self.in_window(data) {
            self.generations.remove(&data);
            return true;
        }

        let generation = id.generation().wrapping_add(1);
        self.generations.insert(data, generation);
        self.free_ids.push(Id::new(data, generation));
        true
    }

    /// Checks identifier liveness.
    ///
    /// No window check: identifiers issued before a range change stay valid
    /// until disposed or invalidated by the range change itself.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, id: Id) -> bool {
        if id.is_null() {
            return false;
        }
        self.generations
            .get(&id.data())
            .is_some_and(|&generation| generation == id.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = Id::new(12345, 678);
        assert_eq!(id.data(), 12345);
        assert_eq!(id.generation(), 678);
        assert_eq!(Id::from_bits(id.to_bits()), id);
        assert!(Id::NULL.is_null());
        assert!(!id.is_null());
    }

    #[test]
    fn test_sequential_allocation() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_eq!((a.data(), a.generation()), (0, 0));
        assert_eq!((b.data(), b.generation()), (1, 0));
    }

    #[test]
    fn test_dispose_invalidates_and_recycles() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        assert!(ids.dispose(a));
        assert!(!ids.is_valid(a));
        assert!(!ids.dispose(a));

        let b = ids.allocate();
        assert_eq!(b.data(), a.data());
        assert!(b.generation() > a.generation());
        assert!(ids.is_valid(b));
        assert!(!ids.is_valid(a));
    }

    #[test]
    fn test_bounded_range_exhaustion() {
        let mut ids = IdAllocator::new();
        ids.set_range(5, 6).unwrap();

        assert_eq!(ids.allocate().data(), 5);
        assert_eq!(ids.allocate().data(), 6);
        assert!(ids.allocate().is_null());
    }

    #[test]
    fn test_range_reset_invalidates_window() {
        let mut ids = IdAllocator::new();
        ids.set_range(0, 10).unwrap();
        let issued: Vec<Id> = (0..10).map(|_| ids.allocate()).collect();

        ids.set_range(0, 10).unwrap();
        for id in &issued {
            assert!(!ids.is_valid(*id));
        }

        // Reissued slots never bring the old handles back.
        let fresh = ids.allocate();
        assert_eq!(fresh.data(), 0);
        assert!(ids.is_valid(fresh));
        assert!(!ids.is_valid(issued[0]));
    }

    #[test]
    fn test_range_reset_keeps_outside_ids() {
        let mut ids = IdAllocator::new();
        let outside = ids.allocate();
        ids.set_range(100, 200).unwrap();
        assert!(ids.is_valid(outside));
        assert_eq!(ids.allocate().data(), 100);

        // Out-of-window disposal drops the record instead of recycling.
        assert!(ids.dispose(outside));
        assert!(!ids.is_valid(outside));
        assert_eq!(ids.free_count(), 0);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        assert_eq!(
            ids.set_range(10, 5),
            Err(StoreError::InvalidRange { lower: 10, upper: 5 })
        );
        assert!(ids.is_valid(a));
        assert_eq!(ids.range(), (0, None));
    }

    #[test]
    fn test_null_is_never_valid() {
        let ids = IdAllocator::new();
        assert!(!ids.is_valid(Id::NULL));
    }
}
