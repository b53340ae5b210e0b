//! # Column Storage
//!
//! Dense, type-erased storage for a single component id inside one
//! archetype. A column only knows its element byte size; typed views are
//! layered on top with `bytemuck`.
//!
//! The storage uses a packed array strategy:
//! - Slot `k` belongs to row `k` of the owning archetype
//! - Slots are contiguous, so a whole column is one byte slice
//! - Removal is swap-remove, keeping the array dense

use bytemuck::Pod;

/// Backing word. Keeps the column base 8-byte aligned so that typed views
/// of components with alignment up to 8 succeed.
type Word = u64;

const WORD_SIZE: usize = std::mem::size_of::<Word>();

#[inline]
const fn words_for(bytes: usize) -> usize {
    (bytes + WORD_SIZE - 1) / WORD_SIZE
}

/// Type-erased packed column of fixed-size slots.
///
/// # Example
///
/// ```rust
/// use tabula_core::Column;
///
/// let mut column = Column::new(4);
/// let row = column.push_zeroed();
/// column.get_mut(row).unwrap().copy_from_slice(&7u32.to_ne_bytes());
/// assert_eq!(column.as_slice::<u32>(), Some(&[7u32][..]));
/// ```
#[derive(Clone, Debug)]
pub struct Column {
    /// Size of one slot in bytes.
    item_size: usize,
    /// Number of slots in use.
    len: usize,
    /// Raw storage, at least `len * item_size` bytes.
    words: Vec<Word>,
}

impl Column {
    /// Creates an empty column for elements of `item_size` bytes.
    #[must_use]
    pub fn new(item_size: usize) -> Self {
        Self::with_capacity(item_size, 0)
    }

    /// Creates an empty column with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(item_size: usize, capacity: usize) -> Self {
        Self {
            item_size,
            len: 0,
            words: Vec::with_capacity(words_for(item_size * capacity)),
        }
    }

    /// Returns the slot size in bytes.
    #[inline]
    #[must_use]
    pub const fn item_size(&self) -> usize {
        self.item_size
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if the column has no slots.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn slot_range(&self, row: usize) -> std::ops::Range<usize> {
        let start = row * self.item_size;
        start..start + self.item_size
    }

    /// Appends one zero-filled slot and returns its row.
    pub fn push_zeroed(&mut self) -> usize {
        let row = self.len;
        self.len += 1;
        self.words.resize(words_for(self.len * self.item_size), 0);

        // Trailing bytes of a shrunk word may still hold an old row.
        let range = self.slot_range(row);
        self.as_bytes_mut()[range].fill(0);
        row
    }

    /// Gets the bytes of one slot.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&[u8]> {
        if row >= self.len {
            return None;
        }
        let range = self.slot_range(row);
        Some(&self.as_bytes()[range])
    }

    /// Gets the mutable bytes of one slot.
    #[inline]
    pub fn get_mut(&mut self, row: usize) -> Option<&mut [u8]> {
        if row >= self.len {
            return None;
        }
        let range = self.slot_range(row);
        Some(&mut self.as_bytes_mut()[range])
    }

    /// Copies one slot from `src` into `dst_row` of this column.
    ///
    /// Both columns must have the same slot size.
    pub fn copy_slot_from(&mut self, dst_row: usize, src: &Self, src_row: usize) {
        debug_assert_eq!(self.item_size, src.item_size, "column slot size mismatch");
        if let (Some(from), Some(to)) = (src.get(src_row), self.get_mut(dst_row)) {
            to.copy_from_slice(from);
        }
    }

    /// Moves the last slot into `row` and shrinks by one.
    ///
    /// If `row` is the last slot this is a plain shrink.
    pub fn swap_remove(&mut self, row: usize) {
        debug_assert!(row < self.len, "swap_remove out of bounds");
        if row >= self.len {
            return;
        }

        let last = self.len - 1;
        if row != last {
            let from = self.slot_range(last);
            let to = self.slot_range(row).start;
            self.as_bytes_mut().copy_within(from, to);
        }
        self.len = last;
        self.words.truncate(words_for(self.len * self.item_size));
    }

    /// Returns all slots as one contiguous byte slice.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Word, u8>(&self.words)[..self.len * self.item_size]
    }

    /// Returns all slots as one contiguous mutable byte slice.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let used = self.len * self.item_size;
        &mut bytemuck::cast_slice_mut::<Word, u8>(&mut self.words)[..used]
    }

    /// Views the column as a typed slice.
    ///
    /// Returns `None` if `size_of::<T>()` differs from the slot size or the
    /// alignment of `T` exceeds the column's.
    #[must_use]
    pub fn as_slice<T: Pod>(&self) -> Option<&[T]> {
        if std::mem::size_of::<T>() != self.item_size {
            return None;
        }
        bytemuck::try_cast_slice(self.as_bytes()).ok()
    }

    /// Views the column as a mutable typed slice.
    pub fn as_mut_slice<T: Pod>(&mut self) -> Option<&mut [T]> {
        if std::mem::size_of::<T>() != self.item_size {
            return None;
        }
        bytemuck::try_cast_slice_mut(self.as_bytes_mut()).ok()
    }
}
