//! # Archetype Signatures
//!
//! A signature is the canonical set of identifiers an entity carries: sorted
//! ascending by data field, with no two elements sharing a data field.
//! Equality and hashing cover the full sequence, so a signature can key the
//! archetype lookup directly. The empty signature is the root archetype.

use std::cmp::Ordering;

use super::entity::Id;

#[inline]
fn by_data(a: &Id, b: &Id) -> Ordering {
    a.data().cmp(&b.data())
}

/// Canonical sorted set of identifiers describing a component set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Sorted by data field, deduplicated by data field.
    ids: Vec<Id>,
}

impl Signature {
    /// Creates the empty (root) signature.
    #[must_use]
    pub const fn empty() -> Self {
        Self { ids: Vec::new() }
    }

    /// Creates a signature from arbitrary identifiers.
    ///
    /// Sorts by data field and keeps the first identifier seen for each
    /// data field.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = Id>) -> Self {
        let mut signature = Self::empty();
        for id in ids {
            signature.insert(id);
        }
        signature
    }

    #[inline]
    fn position(&self, id: Id) -> Result<usize, usize> {
        self.ids.binary_search_by(|probe| by_data(probe, &id))
    }

    /// Adds an identifier, keeping the sequence sorted.
    ///
    /// No-op if an identifier with the same data field is already present,
    /// whatever its generation. Returns `true` if the signature changed.
    pub fn insert(&mut self, id: Id) -> bool {
        match self.position(id) {
            Ok(_) => false,
            Err(index) => {
                self.ids.insert(index, id);
                true
            }
        }
    }

    /// Removes an identifier. Returns `true` if it was present.
    pub fn remove(&mut self, id: Id) -> bool {
        match self.position(id) {
            Ok(index) => {
                self.ids.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Checks membership by data field.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.position(id).is_ok()
    }

    /// Returns the identifier held for `id`'s data field, whatever its
    /// generation.
    #[inline]
    #[must_use]
    pub fn get(&self, id: Id) -> Option<Id> {
        self.position(id).ok().map(|index| self.ids[index])
    }

    /// Returns the index of `id` within the sorted sequence.
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: Id) -> Option<usize> {
        self.position(id).ok()
    }

    /// Returns `true` if `self` equals `sub` or strictly contains every
    /// element of `sub`.
    ///
    /// Despite the name this is a superset-or-equal test on `self`; the
    /// archetype graph relies on both meanings.
    #[must_use]
    pub fn is_subtype(&self, sub: &Self) -> bool {
        if self == sub {
            return true;
        }
        if self.len() <= sub.len() {
            return false;
        }
        sub.ids.iter().all(|&id| self.contains(id))
    }

    /// Returns the single identifier in `self` that `smaller` lacks.
    ///
    /// The caller guarantees that `self` is `smaller` plus exactly one
    /// element; anything else is an invariant violation.
    #[must_use]
    pub fn single_difference(&self, smaller: &Self) -> Id {
        debug_assert_eq!(self.len(), smaller.len() + 1, "signatures must differ by one id");
        debug_assert!(self.is_subtype(smaller), "signature is not a superset");

        self.ids
            .iter()
            .copied()
            .find(|&id| !smaller.contains(id))
            .unwrap_or(Id::NULL)
    }

    /// Returns the number of identifiers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Checks if this is the root signature.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the identifiers in canonical order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Id] {
        &self.ids
    }

    /// Iterates in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<Id> for Signature {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(data: &[u32]) -> Signature {
        data.iter().map(|&d| Id::new(d, 0)).collect()
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut s = Signature::empty();
        for d in [5, 1, 9, 3] {
            assert!(s.insert(Id::new(d, 0)));
        }
        let data: Vec<u32> = s.iter().map(Id::data).collect();
        assert_eq!(data, vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_insert_ignores_generation_duplicates() {
        let mut s = sig(&[2]);
        assert!(!s.insert(Id::new(2, 0)));
        assert!(!s.insert(Id::new(2, 7)));
        assert_eq!(s.len(), 1);
        assert!(s.contains(Id::new(2, 3)));
    }

    #[test]
    fn test_add_remove_restores_original() {
        let original = sig(&[1, 4, 8]);
        for d in [0, 2, 6, 10] {
            let mut s = original.clone();
            s.insert(Id::new(d, 0));
            s.remove(Id::new(d, 0));
            assert_eq!(s, original);
        }
    }

    #[test]
    fn test_get_returns_held_generation() {
        let s: Signature = [Id::new(4, 2)].into_iter().collect();
        assert_eq!(s.get(Id::new(4, 9)), Some(Id::new(4, 2)));
        assert_eq!(s.get(Id::new(5, 2)), None);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut s = sig(&[1, 2]);
        assert!(!s.remove(Id::new(3, 0)));
        assert_eq!(s, sig(&[1, 2]));
    }

    #[test]
    fn test_is_subtype() {
        let base = sig(&[1, 2, 3]);
        assert!(base.is_subtype(&base));
        assert!(Signature::empty().is_subtype(&Signature::empty()));
        assert!(base.is_subtype(&sig(&[1, 3])));
        assert!(base.is_subtype(&Signature::empty()));
        assert!(!base.is_subtype(&sig(&[1, 4])));
        assert!(!sig(&[1, 3]).is_subtype(&base));
    }

    #[test]
    fn test_equality_and_hash_over_sequence() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(sig(&[3, 1]));
        assert!(set.contains(&sig(&[1, 3])));
        assert!(!set.contains(&sig(&[1])));
        assert_ne!(sig(&[1]), Signature::empty());
    }

    #[test]
    fn test_single_difference() {
        assert_eq!(sig(&[1, 2, 5]).single_difference(&sig(&[1, 5])), Id::new(2, 0));
        assert_eq!(sig(&[7]).single_difference(&Signature::empty()), Id::new(7, 0));
    }
}
