//! # Archetype Tables
//!
//! An archetype stores every entity that carries exactly one signature.
//!
//! ```text
//! Archetype {Pos, Vel, Tag}:
//! entities: [E0, E1, E2]
//! Pos[]:    [P0, P1, P2]
//! Vel[]:    [V0, V1, V2]
//! (Tag has no registered size, so no column)
//! ```
//!
//! Row `k` of every column belongs to `entities[k]`. Rows are removed by
//! swap-remove so columns stay dense; the caller fixes up the record of the
//! entity that was moved into the hole.

use std::collections::HashMap;

use super::entity::Id;
use super::signature::Signature;
use super::storage::Column;

/// Stable index of an archetype inside the graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// The root archetype with the empty signature.
    pub const ROOT: Self = Self(0);

    /// `None` once the arena index no longer fits in 32 bits.
    #[inline]
    pub(crate) fn new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Returns the arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Link between two archetypes whose signatures differ by one identifier.
///
/// `add`'s signature is always `remove`'s signature plus that identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Archetype reached by adding the identifier.
    pub add: ArchetypeId,
    /// Archetype reached by removing the identifier.
    pub remove: ArchetypeId,
}

/// A single archetype table.
#[derive(Debug)]
pub struct Archetype {
    /// Arena index.
    id: ArchetypeId,
    /// Exact component set of every resident entity.
    signature: Signature,
    /// Resident entities, one per row.
    entities: Vec<Id>,
    /// Identifiers that own a column, in canonical order.
    column_ids: Vec<Id>,
    /// One column per entry of `column_ids`.
    columns: Vec<Column>,
    /// Neighbors keyed by the data field of the distinguishing identifier.
    edges: HashMap<u32, Edge>,
}

impl Archetype {
    /// Creates an empty table for `signature`.
    ///
    /// Every identifier for which `size_of` returns a size gets a column.
    pub(crate) fn new(
        id: ArchetypeId,
        signature: Signature,
        capacity: usize,
        size_of: impl Fn(Id) -> Option<usize>,
    ) -> Self {
        let (column_ids, columns) = signature
            .iter()
            .filter_map(|component| {
                size_of(component).map(|size| (component, Column::with_capacity(size, capacity)))
            })
            .unzip();

        Self {
            id,
            signature,
            entities: Vec::with_capacity(capacity),
            column_ids,
            columns,
            edges: HashMap::new(),
        }
    }

    /// Returns the arena index of this archetype.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Returns the signature of this archetype.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns a slice of all resident entity ids, in row order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Id] {
        &self.entities
    }

    /// Gets the entity id at a row.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, row: usize) -> Option<Id> {
        self.entities.get(row).copied()
    }

    /// Returns the identifiers that own a column, in canonical order.
    #[inline]
    #[must_use]
    pub fn column_ids(&self) -> &[Id] {
        &self.column_ids
    }

    /// Returns the position of `id`'s column.
    #[inline]
    #[must_use]
    pub fn column_index(&self, id: Id) -> Option<usize> {
        let index = self
            .column_ids
            .binary_search_by(|probe| probe.data().cmp(&id.data()))
            .ok()?;
        // A column owned by another generation of the same slot is not ours.
        (self.column_ids[index] == id).then_some(index)
    }

    /// Gets the column for an identifier.
    #[inline]
    #[must_use]
    pub fn column(&self, id: Id) -> Option<&Column> {
        self.column_index(id).map(|index| &self.columns[index])
    }

    /// Gets the mutable column for an identifier.
    #[inline]
    pub fn column_mut(&mut self, id: Id) -> Option<&mut Column> {
        let index = self.column_index(id)?;
        Some(&mut self.columns[index])
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Gets the slot of `id` at `row`.
    #[inline]
    #[must_use]
    pub fn storage(&self, row: usize, id: Id) -> Option<&[u8]> {
        self.column(id)?.get(row)
    }

    /// Gets the mutable slot of `id` at `row`.
    #[inline]
    pub fn storage_mut(&mut self, row: usize, id: Id) -> Option<&mut [u8]> {
        self.column_mut(id)?.get_mut(row)
    }

    /// Returns the edge keyed by `id`, if one was built.
    ///
    /// Edges are matched by data field, like signature membership.
    #[inline]
    #[must_use]
    pub fn edge(&self, id: Id) -> Option<Edge> {
        self.edges.get(&id.data()).copied()
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.values().copied()
    }

    pub(crate) fn set_edge(&mut self, id: Id, edge: Edge) {
        self.edges.insert(id.data(), edge);
    }

    /// Appends a row with zero-filled slots and returns its index.
    pub(crate) fn push_row(&mut self, entity: Id) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in &mut self.columns {
            let slot = column.push_zeroed();
            debug_assert_eq!(slot, row, "column out of alignment with entity list");
        }
        row
    }

    /// Copies every slot shared with `src` from `src_row` into `dst_row`.
    ///
    /// Identifiers only present in `src` are skipped; identifiers only
    /// present here keep whatever the slot already holds.
    pub(crate) fn copy_row_from(&mut self, dst_row: usize, src: &Self, src_row: usize) {
        for (id, column) in self.column_ids.iter().zip(&mut self.columns) {
            if let Some(from) = src.column(*id) {
                column.copy_slot_from(dst_row, from, src_row);
            }
        }
    }

    /// Swap-removes a row.
    ///
    /// Returns the entity that was moved from the last row into `row`, if
    /// any.
    pub(crate) fn swap_remove_row(&mut self, row: usize) -> Option<Id> {
        debug_assert!(row < self.entities.len(), "row out of bounds");
        if row >= self.entities.len() {
            return None;
        }

        for column in &mut self.columns {
            column.swap_remove(row);
        }
        self.entities.swap_remove(row);
        debug_assert!(self.columns.iter().all(|c| c.len() == self.entities.len()));

        self.entities.get(row).copied()
    }
}
