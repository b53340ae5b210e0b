//! # Archetype Graph
//!
//! Owns every archetype, the signature lookup, the entity record map and
//! the storage size registry, and implements structural migration.
//!
//! ## Migration
//!
//! ```text
//! add(e, C) with e in {A, B} at row 1:
//!
//! {A, B}    rows: [e0, e, e2]      {A, B, C}  rows: [f0]
//!                      |
//!            copy A, B bytes  ---------------->  [f0, e]   (C slot zeroed)
//!            swap-remove row 1: e2 moves to row 1, its record is patched
//! ```
//!
//! Archetypes live in an index-addressed arena and edges store indices, so
//! growing the arena never invalidates an edge.

use std::collections::HashMap;

use super::archetype::{Archetype, ArchetypeId, Edge};
use super::entity::Id;
use super::signature::Signature;
use crate::error::{StoreError, StoreResult};

/// Location of a resident entity's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// The entity.
    pub entity: Id,
    /// Archetype holding the entity's row.
    pub archetype: ArchetypeId,
    /// Row index inside that archetype.
    pub row: usize,
}

/// Returns the identifier `larger` adds to `smaller` if they are one step
/// apart. Shared members must match generation too.
fn one_step(larger: &Signature, smaller: &Signature) -> Option<Id> {
    let linked = larger.len() == smaller.len() + 1
        && smaller.iter().all(|id| larger.get(id) == Some(id));
    linked.then(|| larger.single_difference(smaller))
}

/// Graph of archetypes connected by single-identifier edges.
///
/// # Example
///
/// ```rust
/// use tabula_core::{ArchetypeGraph, Id, Signature};
///
/// let mut graph = ArchetypeGraph::new();
/// let pos = Id::new(100, 0);
/// graph.register_storage(pos, 8).unwrap();
///
/// let entity = Id::new(0, 0);
/// graph.record_add(entity, pos).unwrap();
///
/// let record = graph.record(entity).unwrap();
/// assert_eq!(graph.archetype(record.archetype).unwrap().signature(), &Signature::from_ids([pos]));
/// assert_eq!(graph.storage(record, pos).map(<[u8]>::len), Some(8));
/// ```
#[derive(Debug)]
pub struct ArchetypeGraph {
    /// Arena of archetypes; index 0 is the root.
    archetypes: Vec<Archetype>,
    /// Signature -> archetype.
    lookup: HashMap<Signature, ArchetypeId>,
    /// Entity -> current location.
    records: HashMap<Id, Record>,
    /// Identifier -> slot byte size. Append-only.
    storage_sizes: HashMap<Id, usize>,
    /// Initial slot reservation for new archetypes.
    column_capacity: usize,
}

impl Default for ArchetypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchetypeGraph {
    /// Creates a graph holding only the root archetype.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates a graph with arena room for `archetypes` tables, each new
    /// table reserving `column_capacity` rows.
    #[must_use]
    pub fn with_capacity(archetypes: usize, column_capacity: usize) -> Self {
        let mut arena = Vec::with_capacity(archetypes.max(1));
        arena.push(Archetype::new(ArchetypeId::ROOT, Signature::empty(), column_capacity, |_| None));

        let mut lookup = HashMap::with_capacity(archetypes.max(1));
        lookup.insert(Signature::empty(), ArchetypeId::ROOT);

        Self {
            archetypes: arena,
            lookup,
            records: HashMap::new(),
            storage_sizes: HashMap::new(),
            column_capacity,
        }
    }

    // ========================================================================
    // ARCHETYPES
    // ========================================================================

    /// Returns the number of archetypes, root included.
    #[inline]
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Gets an archetype by index.
    #[inline]
    #[must_use]
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index())
    }

    #[inline]
    pub(crate) fn archetype_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id.index())
    }

    /// Iterates over all archetypes in creation order.
    pub fn archetypes(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Finds the archetype for an exact signature without creating it.
    #[inline]
    #[must_use]
    pub fn lookup(&self, signature: &Signature) -> Option<ArchetypeId> {
        self.lookup.get(signature).copied()
    }

    /// Returns the edge of `archetype` keyed by `id`.
    #[must_use]
    pub fn edge(&self, archetype: ArchetypeId, id: Id) -> Option<Edge> {
        self.archetype(archetype)?.edge(id)
    }

    /// Returns the archetype for `signature`, creating it on first use.
    ///
    /// A new archetype gets one column per identifier with a registered
    /// size and is linked to every existing archetype whose signature
    /// differs from it by exactly one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArchetypeLimit`] if the arena index no longer
    /// fits in an [`ArchetypeId`].
    pub fn get_or_create(&mut self, signature: &Signature) -> StoreResult<ArchetypeId> {
        if let Some(id) = self.lookup(signature) {
            return Ok(id);
        }

        let Some(id) = ArchetypeId::new(self.archetypes.len()) else {
            tracing::error!("archetype arena full at {} tables", self.archetypes.len());
            return Err(StoreError::ArchetypeLimit(self.archetypes.len()));
        };
        let sizes = &self.storage_sizes;
        let archetype = Archetype::new(id, signature.clone(), self.column_capacity, |component| {
            sizes.get(&component).copied()
        });
        self.archetypes.push(archetype);
        self.lookup.insert(signature.clone(), id);

        tracing::debug!(
            "created archetype {} with {} ids ({} columns)",
            id.index(),
            signature.len(),
            self.archetypes[id.index()].column_ids().len()
        );

        self.build_edges(id);
        Ok(id)
    }

    /// Links a freshly created archetype to its one-step neighbors.
    fn build_edges(&mut self, new: ArchetypeId) {
        let mut links = Vec::new();
        {
            let created = self.archetypes[new.index()].signature();
            for other in &self.archetypes[..new.index()] {
                let existing = other.signature();
                if let Some(change) = one_step(created, existing) {
                    links.push((change, Edge { add: new, remove: other.id() }));
                } else if let Some(change) = one_step(existing, created) {
                    links.push((change, Edge { add: other.id(), remove: new }));
                }
            }
        }

        for (change, edge) in links {
            self.archetypes[edge.add.index()].set_edge(change, edge);
            self.archetypes[edge.remove.index()].set_edge(change, edge);
        }
    }

    /// Returns two distinct archetypes mutably.
    fn pair_mut(&mut self, a: ArchetypeId, b: ArchetypeId) -> (&mut Archetype, &mut Archetype) {
        debug_assert_ne!(a, b, "pair_mut needs distinct archetypes");
        let (a, b) = (a.index(), b.index());
        if a < b {
            let (left, right) = self.archetypes.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.archetypes.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    // ========================================================================
    // RECORDS & MIGRATION
    // ========================================================================

    /// Returns the record of a resident entity.
    #[inline]
    #[must_use]
    pub fn record(&self, entity: Id) -> Option<Record> {
        self.records.get(&entity).copied()
    }

    /// Returns the archetype an entity currently belongs to.
    ///
    /// Entities without a record implicitly belong to the root.
    #[inline]
    #[must_use]
    pub fn archetype_of(&self, entity: Id) -> ArchetypeId {
        self.record(entity).map_or(ArchetypeId::ROOT, |record| record.archetype)
    }

    /// Returns the number of resident entities.
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Adds `id` to the entity's signature and migrates its row.
    ///
    /// No-op if the entity already carries `id`. An older generation of
    /// the same slot is replaced in the same move and its bytes dropped.
    /// Returns the new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArchetypeLimit`] if a new archetype is needed
    /// and the arena is full.
    pub fn record_add(&mut self, entity: Id, id: Id) -> StoreResult<Option<Record>> {
        let current = self.archetype_of(entity);
        let mut signature = self.archetypes[current.index()].signature().clone();
        match signature.get(id) {
            Some(held) if held == id => return Ok(self.record(entity)),
            Some(stale) => {
                tracing::debug!("{} replaces stale {} on {}", id, stale, entity);
                signature.remove(stale);
            }
            None => {}
        }
        signature.insert(id);
        self.migrate(entity, &signature).map(Some)
    }

    /// Removes `id` from the entity's signature and migrates its row.
    ///
    /// No-op if the entity does not carry exactly `id`. Returns the new
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArchetypeLimit`] if a new archetype is needed
    /// and the arena is full.
    pub fn record_remove(&mut self, entity: Id, id: Id) -> StoreResult<Option<Record>> {
        let current = self.archetype_of(entity);
        let mut signature = self.archetypes[current.index()].signature().clone();
        if signature.get(id) != Some(id) {
            return Ok(self.record(entity));
        }
        signature.remove(id);
        self.migrate(entity, &signature).map(Some)
    }

    /// Moves an entity's row into the archetype for `signature`.
    fn migrate(&mut self, entity: Id, signature: &Signature) -> StoreResult<Record> {
        let destination = self.get_or_create(signature)?;
        let source = self.record(entity);

        let new_row = match source {
            Some(old) => {
                let (from, to) = self.pair_mut(old.archetype, destination);
                let new_row = to.push_row(entity);
                to.copy_row_from(new_row, from, old.row);
                let displaced = from.swap_remove_row(old.row);

                if let Some(moved) = displaced {
                    if let Some(record) = self.records.get_mut(&moved) {
                        record.row = old.row;
                    }
                }
                new_row
            }
            None => self.archetypes[destination.index()].push_row(entity),
        };

        let record = Record {
            entity,
            archetype: destination,
            row: new_row,
        };
        self.records.insert(entity, record);

        tracing::trace!(
            "moved {} from archetype {} to {} (row {})",
            entity,
            source.map_or(ArchetypeId::ROOT, |old| old.archetype).index(),
            destination.index(),
            new_row
        );
        Ok(record)
    }

    /// Drops an entity's record and swap-removes its row.
    ///
    /// Returns the removed record, or `None` if the entity had none.
    pub fn remove_record(&mut self, entity: Id) -> Option<Record> {
        let record = self.records.remove(&entity)?;
        let displaced = self.archetypes[record.archetype.index()].swap_remove_row(record.row);
        if let Some(moved) = displaced {
            if let Some(moved_record) = self.records.get_mut(&moved) {
                moved_record.row = record.row;
            }
        }
        Some(record)
    }

    // ========================================================================
    // STORAGE
    // ========================================================================

    /// Associates a slot byte size with an identifier.
    ///
    /// Only archetypes created afterwards allocate a column for it.
    /// Registering the same size twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageAlreadyRegistered`] if `id` already has
    /// a different size.
    pub fn register_storage(&mut self, id: Id, size: usize) -> StoreResult<()> {
        match self.storage_sizes.get(&id) {
            Some(&existing) if existing == size => Ok(()),
            Some(&existing) => {
                tracing::error!("storage for {} already registered with {} bytes", id, existing);
                Err(StoreError::StorageAlreadyRegistered { id, size: existing })
            }
            None => {
                self.storage_sizes.insert(id, size);
                Ok(())
            }
        }
    }

    /// Returns the registered slot size of an identifier.
    #[inline]
    #[must_use]
    pub fn storage_size(&self, id: Id) -> Option<usize> {
        self.storage_sizes.get(&id).copied()
    }

    fn check_storage(&self, record: Record, id: Id) -> bool {
        if self.storage_sizes.contains_key(&id) {
            return true;
        }
        tracing::error!("no storage registered for {} (entity {})", id, record.entity);
        false
    }

    /// Gets the slot of `id` in the record's row.
    ///
    /// Returns `None` if `id` never registered a size (reported as an
    /// error) or is not part of the record's archetype.
    #[must_use]
    pub fn storage(&self, record: Record, id: Id) -> Option<&[u8]> {
        if !self.check_storage(record, id) {
            return None;
        }
        self.archetype(record.archetype)?.storage(record.row, id)
    }

    /// Gets the mutable slot of `id` in the record's row.
    ///
    /// The borrow ends before the next structural mutation can run.
    pub fn storage_mut(&mut self, record: Record, id: Id) -> Option<&mut [u8]> {
        if !self.check_storage(record, id) {
            return None;
        }
        self.archetype_mut(record.archetype)?.storage_mut(record.row, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Id = Id::new(100, 0);
    const B: Id = Id::new(101, 0);
    const C: Id = Id::new(102, 0);

    fn graph() -> ArchetypeGraph {
        let mut graph = ArchetypeGraph::new();
        graph.register_storage(A, 4).unwrap();
        graph.register_storage(C, 4).unwrap();
        graph
    }

    fn write(graph: &mut ArchetypeGraph, entity: Id, id: Id, value: u32) {
        let record = graph.record(entity).unwrap();
        graph
            .storage_mut(record, id)
            .unwrap()
            .copy_from_slice(&value.to_ne_bytes());
    }

    fn read(graph: &ArchetypeGraph, entity: Id, id: Id) -> u32 {
        let record = graph.record(entity).unwrap();
        bytemuck::pod_read_unaligned(graph.storage(record, id).unwrap())
    }

    #[test]
    fn test_root_exists() {
        let graph = ArchetypeGraph::new();
        assert_eq!(graph.archetype_count(), 1);
        assert_eq!(graph.lookup(&Signature::empty()), Some(ArchetypeId::ROOT));
        assert_eq!(graph.archetype_of(Id::new(0, 0)), ArchetypeId::ROOT);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut graph = graph();
        let signature = Signature::from_ids([A, B]);
        let first = graph.get_or_create(&signature).unwrap();
        let second = graph.get_or_create(&signature).unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.archetype_count(), 2);
    }

    #[test]
    fn test_edge_symmetry() {
        let mut graph = graph();
        let x = graph.get_or_create(&Signature::from_ids([A])).unwrap();
        let xy = graph.get_or_create(&Signature::from_ids([A, B])).unwrap();

        let expected = Edge { add: xy, remove: x };
        assert_eq!(graph.edge(xy, B), Some(expected));
        assert_eq!(graph.edge(x, B), Some(expected));

        // Root links to {A} through A.
        assert_eq!(graph.edge(ArchetypeId::ROOT, A), Some(Edge { add: x, remove: ArchetypeId::ROOT }));
    }

    #[test]
    fn test_edges_built_from_larger_side() {
        let mut graph = graph();
        let big = graph.get_or_create(&Signature::from_ids([A, B, C])).unwrap();
        let small = graph.get_or_create(&Signature::from_ids([A, C])).unwrap();
        assert_eq!(graph.edge(small, B), Some(Edge { add: big, remove: small }));
        assert_eq!(graph.edge(big, B), Some(Edge { add: big, remove: small }));
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        let mut graph = graph();
        let e = Id::new(0, 0);
        graph.record_add(e, A).unwrap();
        graph.record_add(e, B).unwrap();
        write(&mut graph, e, A, 0xDEAD);

        graph.record_add(e, C).unwrap();
        graph.record_remove(e, C).unwrap();

        let record = graph.record(e).unwrap();
        let archetype = graph.archetype(record.archetype).unwrap();
        assert_eq!(archetype.signature(), &Signature::from_ids([A, B]));
        assert_eq!(read(&graph, e, A), 0xDEAD);
    }

    #[test]
    fn test_swap_remove_patches_displaced_record() {
        let mut graph = graph();
        let entities = [Id::new(0, 0), Id::new(1, 0), Id::new(2, 0)];
        for (i, &e) in entities.iter().enumerate() {
            graph.record_add(e, A).unwrap();
            graph.record_add(e, C).unwrap();
            write(&mut graph, e, A, i as u32 + 1);
        }
        let table = graph.record(entities[0]).unwrap().archetype;
        assert_eq!(graph.archetype(table).unwrap().len(), 3);

        graph.record_remove(entities[0], C).unwrap();

        assert_eq!(graph.archetype(table).unwrap().len(), 2);
        assert_eq!(graph.record(entities[2]).unwrap().row, 0);
        assert_eq!(read(&graph, entities[2], A), 3);
        assert_eq!(read(&graph, entities[1], A), 2);
        assert_eq!(read(&graph, entities[0], A), 1);
    }

    #[test]
    fn test_noop_migrations() {
        let mut graph = graph();
        let e = Id::new(0, 0);
        assert_eq!(graph.record_remove(e, A).unwrap(), None);

        let first = graph.record_add(e, A).unwrap();
        assert_eq!(graph.record_add(e, A).unwrap(), first);
        assert_eq!(graph.archetype(first.unwrap().archetype).unwrap().len(), 1);
    }

    #[test]
    fn test_new_slot_is_zeroed() {
        let mut graph = graph();
        let e = Id::new(0, 0);
        graph.record_add(e, A).unwrap();
        graph.record_add(e, C).unwrap();
        assert_eq!(read(&graph, e, C), 0);
    }

    #[test]
    fn test_reissued_id_replaces_stale_generation() {
        let mut graph = graph();
        let e = Id::new(0, 0);
        graph.record_add(e, A).unwrap();
        graph.record_add(e, B).unwrap();
        write(&mut graph, e, A, 7);

        let reissued = Id::new(A.data(), 1);
        graph.register_storage(reissued, 8).unwrap();

        // Removing by the new generation leaves the old one alone.
        graph.record_remove(e, reissued).unwrap();
        assert!(graph.storage(graph.record(e).unwrap(), A).is_some());

        graph.record_add(e, reissued).unwrap();
        let record = graph.record(e).unwrap();
        let signature = graph.archetype(record.archetype).unwrap().signature();
        assert_eq!(signature.as_slice(), &[reissued, B]);
        assert!(graph.storage(record, A).is_none());
        assert_eq!(graph.storage(record, reissued), Some(&[0u8; 8][..]));

        // {A} links to {A, B} through B, never to the reissued table.
        let only_a = graph.lookup(&Signature::from_ids([A])).unwrap();
        assert_ne!(graph.edge(only_a, B).map(|edge| edge.add), Some(record.archetype));
    }

    #[test]
    fn test_edge_lookup_ignores_generation() {
        let mut graph = graph();
        let x = graph.get_or_create(&Signature::from_ids([A])).unwrap();
        let xy = graph.get_or_create(&Signature::from_ids([A, B])).unwrap();
        let other_generation = Id::new(B.data(), 5);
        assert_eq!(graph.edge(x, other_generation), Some(Edge { add: xy, remove: x }));
    }

    #[test]
    fn test_late_registration_has_no_column() {
        let mut graph = ArchetypeGraph::new();
        let e = Id::new(0, 0);
        graph.record_add(e, B).unwrap();
        graph.register_storage(B, 4).unwrap();

        let record = graph.record(e).unwrap();
        assert!(graph.storage(record, B).is_none());

        // A fresh archetype picks the size up.
        graph.record_add(e, A).unwrap();
        let record = graph.record(e).unwrap();
        assert!(graph.storage(record, B).is_some());
    }

    #[test]
    fn test_storage_registry_is_append_only() {
        let mut graph = graph();
        assert!(graph.register_storage(A, 4).is_ok());
        assert_eq!(
            graph.register_storage(A, 8),
            Err(StoreError::StorageAlreadyRegistered { id: A, size: 4 })
        );
        assert_eq!(graph.storage_size(A), Some(4));
    }

    #[test]
    fn test_unregistered_storage_is_none() {
        let mut graph = graph();
        let e = Id::new(0, 0);
        graph.record_add(e, B).unwrap();
        let record = graph.record(e).unwrap();
        assert!(graph.storage(record, B).is_none());
        assert!(graph.storage(record, A).is_none());
    }

    #[test]
    fn test_remove_record() {
        let mut graph = graph();
        let (e0, e1) = (Id::new(0, 0), Id::new(1, 0));
        graph.record_add(e0, A).unwrap();
        graph.record_add(e1, A).unwrap();
        write(&mut graph, e1, A, 5);

        let removed = graph.remove_record(e0).unwrap();
        assert_eq!(removed.row, 0);
        assert!(graph.record(e0).is_none());
        assert_eq!(graph.record(e1).unwrap().row, 0);
        assert_eq!(read(&graph, e1, A), 5);
        assert!(graph.remove_record(e0).is_none());
    }
}
