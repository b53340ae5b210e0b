//! # Archetype Views & Matching
//!
//! The boundary used by batch processors: find every archetype whose
//! signature contains a requested set, then borrow the columns of each one
//! for the duration of a single pass.
//!
//! Views borrow the graph, so no structural mutation can happen while a
//! column slice is alive.

use bytemuck::Pod;
use fixedbitset::FixedBitSet;

use super::archetype::{Archetype, ArchetypeId};
use super::entity::Id;
use super::graph::ArchetypeGraph;
use super::signature::Signature;
use super::storage::Column;

/// Read-only view of one archetype.
#[derive(Clone, Copy, Debug)]
pub struct ArchetypeView<'a> {
    archetype: &'a Archetype,
}

impl<'a> ArchetypeView<'a> {
    /// Returns the archetype index.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ArchetypeId {
        self.archetype.id()
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetype.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetype.is_empty()
    }

    /// Returns the signature.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &'a Signature {
        self.archetype.signature()
    }

    /// Returns the resident entities, in row order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &'a [Id] {
        self.archetype.entities()
    }

    /// Returns the whole column of `id` as `len() * size` bytes.
    #[must_use]
    pub fn column(&self, id: Id) -> Option<&'a [u8]> {
        self.archetype.column(id).map(Column::as_bytes)
    }

    /// Returns the columns of `ids`, in the order requested.
    ///
    /// `None` if any identifier has no column here.
    #[must_use]
    pub fn columns(&self, ids: &[Id]) -> Option<Vec<&'a [u8]>> {
        ids.iter().map(|&id| self.column(id)).collect()
    }

    /// Returns the column of `id` as a typed slice.
    #[must_use]
    pub fn column_as<T: Pod>(&self, id: Id) -> Option<&'a [T]> {
        self.archetype.column(id)?.as_slice()
    }
}

/// Mutable view of one archetype.
///
/// Columns can be written but the row set cannot change.
#[derive(Debug)]
pub struct ArchetypeViewMut<'a> {
    archetype: &'a mut Archetype,
}

impl ArchetypeViewMut<'_> {
    /// Returns the archetype index.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ArchetypeId {
        self.archetype.id()
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetype.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetype.is_empty()
    }

    /// Returns the resident entities, in row order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Id] {
        self.archetype.entities()
    }

    /// Borrows several columns mutably at once, in the order requested.
    ///
    /// `None` if any identifier has no column here or appears twice.
    pub fn columns_mut(&mut self, ids: &[Id]) -> Option<Vec<&mut [u8]>> {
        let indices: Vec<usize> = ids
            .iter()
            .map(|&id| self.archetype.column_index(id))
            .collect::<Option<_>>()?;

        let mut slots: Vec<Option<&mut Column>> =
            self.archetype.columns_mut().iter_mut().map(Some).collect();

        // A repeated index finds its slot already taken.
        indices
            .into_iter()
            .map(|index| slots[index].take().map(Column::as_bytes_mut))
            .collect()
    }

    /// Returns the column of `id` as a mutable typed slice.
    pub fn column_as_mut<T: Pod>(&mut self, id: Id) -> Option<&mut [T]> {
        self.archetype.column_mut(id)?.as_mut_slice()
    }
}

impl ArchetypeGraph {
    /// Returns a read-only view of an archetype.
    #[must_use]
    pub fn view(&self, id: ArchetypeId) -> Option<ArchetypeView<'_>> {
        self.archetype(id).map(|archetype| ArchetypeView { archetype })
    }

    /// Returns a mutable view of an archetype.
    pub fn view_mut(&mut self, id: ArchetypeId) -> Option<ArchetypeViewMut<'_>> {
        self.archetype_mut(id).map(|archetype| ArchetypeViewMut { archetype })
    }

    /// Finds archetypes whose signature contains `signature` by walking
    /// `add` edges from the archetype with exactly that signature.
    ///
    /// Each archetype is visited once even when several paths reach it.
    /// Only archetypes connected through `add` edges are found; see
    /// [`ArchetypeGraph::supersets_of`] for an exhaustive scan. The result
    /// is sorted by archetype index.
    #[must_use]
    pub fn matching(&self, signature: &Signature) -> Vec<ArchetypeId> {
        let Some(start) = self.lookup(signature) else {
            return Vec::new();
        };

        let mut visited = FixedBitSet::with_capacity(self.archetype_count());
        let mut stack = vec![start];
        let mut found = Vec::new();

        while let Some(current) = stack.pop() {
            if visited.put(current.index()) {
                continue;
            }
            found.push(current);

            let Some(archetype) = self.archetype(current) else {
                continue;
            };
            for edge in archetype.edges() {
                if edge.add != current && !visited.contains(edge.add.index()) {
                    stack.push(edge.add);
                }
            }
        }

        found.sort_unstable();
        found
    }

    /// Finds every archetype whose signature contains `signature` by
    /// scanning the whole arena.
    #[must_use]
    pub fn supersets_of(&self, signature: &Signature) -> Vec<ArchetypeId> {
        self.archetypes()
            .filter(|archetype| archetype.signature().is_subtype(signature))
            .map(Archetype::id)
            .collect()
    }
}
