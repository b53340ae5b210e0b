//! # World
//!
//! The caller-facing entity facade. Composes the identifier allocator and
//! the archetype graph, checks liveness, and owns the name registry that
//! maps component names to their identifiers.
//!
//! Component kinds are identifiers too: registering a component allocates
//! an id from the same allocator as entities, names it, and gives it a slot
//! size.

use std::collections::HashMap;

use super::archetype::ArchetypeId;
use super::component::Component;
use super::entity::{Id, IdAllocator};
use super::graph::{ArchetypeGraph, Record};
use super::query::{ArchetypeView, ArchetypeViewMut};
use super::signature::Signature;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// The table store.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use tabula_core::{Component, World};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
/// #[repr(C)]
/// struct Pos {
///     x: f32,
///     y: f32,
/// }
/// impl Component for Pos {}
///
/// let mut world = World::new();
/// world.register::<Pos>().unwrap();
///
/// let e = world.spawn().unwrap();
/// world.insert(e, Pos { x: 1.0, y: 2.0 }).unwrap();
/// assert_eq!(world.get::<Pos>(e).unwrap(), &Pos { x: 1.0, y: 2.0 });
/// ```
#[derive(Debug, Default)]
pub struct World {
    /// Issues entity and component ids.
    ids: IdAllocator,
    /// Tables, records and storage sizes.
    graph: ArchetypeGraph,
    /// Id -> name.
    names: HashMap<Id, String>,
    /// Name -> id, kept in sync with `names`.
    named: HashMap<String, Id>,
}

impl World {
    /// Creates an empty world with an unbounded identifier space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn with_config(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let mut ids = IdAllocator::new();
        if let Some(upper) = config.id_upper {
            ids.set_range(config.id_lower, upper)?;
        } else if config.id_lower != 0 {
            ids.set_range(config.id_lower, u32::MAX)?;
        }

        Ok(Self {
            ids,
            graph: ArchetypeGraph::with_capacity(config.archetype_capacity, config.column_capacity),
            names: HashMap::new(),
            named: HashMap::new(),
        })
    }

    /// Returns the identifier allocator.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Returns the archetype graph.
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &ArchetypeGraph {
        &self.graph
    }

    fn ensure_alive(&self, id: Id) -> StoreResult<()> {
        if self.ids.is_valid(id) {
            Ok(())
        } else {
            tracing::warn!("operation on dead id {}", id);
            Err(StoreError::DeadEntity(id))
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Allocates a new entity. It belongs to the root archetype and has no
    /// record until a component is added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IdsExhausted`] if the identifier window is used up.
    pub fn spawn(&mut self) -> StoreResult<Id> {
        let id = self.ids.allocate();
        if id.is_null() {
            let (lower, upper) = self.ids.range();
            return Err(StoreError::IdsExhausted {
                lower,
                upper: upper.unwrap_or(u32::MAX),
            });
        }
        Ok(id)
    }

    /// Destroys an entity: drops its name and row, and returns its id to
    /// the allocator.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if `entity` is not alive.
    pub fn destroy(&mut self, entity: Id) -> StoreResult<()> {
        self.ensure_alive(entity)?;

        if let Some(name) = self.names.remove(&entity) {
            self.named.remove(&name);
        }
        self.graph.remove_record(entity);
        self.ids.dispose(entity);
        Ok(())
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Id) -> bool {
        self.ids.is_valid(entity)
    }

    /// Redefines the identifier window.
    ///
    /// Ids inside the window are invalidated; entities that died this way
    /// lose their rows and names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRange`] if `lower > upper`.
    pub fn set_id_range(&mut self, lower: u32, upper: u32) -> StoreResult<()> {
        self.ids.set_range(lower, upper)?;
        self.purge_dead();
        Ok(())
    }

    fn purge_dead(&mut self) {
        let dead: Vec<Id> = self
            .names
            .keys()
            .copied()
            .chain(self.graph.archetypes().flat_map(|a| a.entities().iter().copied()))
            .filter(|&id| !self.ids.is_valid(id))
            .collect();

        for id in dead {
            if let Some(name) = self.names.remove(&id) {
                self.named.remove(&name);
            }
            self.graph.remove_record(id);
        }
    }

    // ========================================================================
    // NAMES
    // ========================================================================

    /// Names an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if `entity` is not alive and
    /// [`StoreError::DuplicateName`] if another id already uses `name`.
    pub fn set_name(&mut self, entity: Id, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        if !self.ids.is_valid(entity) {
            tracing::error!("can't set the name of dead entity {}", entity);
            return Err(StoreError::DeadEntity(entity));
        }

        match self.named.get(&name) {
            Some(&owner) if owner == entity => return Ok(()),
            Some(_) => {
                tracing::error!("name '{}' already registered", name);
                return Err(StoreError::DuplicateName(name));
            }
            None => {}
        }

        if let Some(previous) = self.names.insert(entity, name.clone()) {
            self.named.remove(&previous);
        }
        self.named.insert(name, entity);
        Ok(())
    }

    /// Gets the name of an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if `entity` is not alive.
    pub fn name(&self, entity: Id) -> StoreResult<Option<&str>> {
        if !self.ids.is_valid(entity) {
            tracing::error!("can't get the name of dead entity {}", entity);
            return Err(StoreError::DeadEntity(entity));
        }
        Ok(self.names.get(&entity).map(String::as_str))
    }

    /// Finds the id registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Id> {
        self.named.get(name).copied()
    }

    // ========================================================================
    // COMPONENT REGISTRATION
    // ========================================================================

    /// Registers a component kind with a slot size and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateName`] if `name` is taken (no state
    /// changes) and [`StoreError::IdsExhausted`] if no id is left.
    pub fn register_component(&mut self, name: &str, size: usize) -> StoreResult<Id> {
        if self.named.contains_key(name) {
            tracing::error!("component '{}' already registered", name);
            return Err(StoreError::DuplicateName(name.to_owned()));
        }

        let id = self.spawn()?;
        self.set_name(id, name)?;
        self.graph.register_storage(id, size)?;
        tracing::debug!("registered component '{}' as {} ({} bytes)", name, id, size);
        Ok(id)
    }

    /// Registers a typed component under [`Component::name`].
    ///
    /// # Errors
    ///
    /// See [`World::register_component`].
    pub fn register<T: Component>(&mut self) -> StoreResult<Id> {
        self.register_component(T::name(), T::size())
    }

    /// Returns the id of a registered component name.
    ///
    /// Plain named entities without storage are not components.
    #[must_use]
    pub fn component_id(&self, name: &str) -> Option<Id> {
        self.lookup(name)
            .filter(|&id| self.graph.storage_size(id).is_some())
    }

    /// Returns the id of a registered typed component.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownComponent`] if `T` was never registered.
    pub fn component<T: Component>(&self) -> StoreResult<Id> {
        self.component_id(T::name())
            .ok_or_else(|| StoreError::UnknownComponent(T::name().to_owned()))
    }

    /// Gives an existing id a slot size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if `id` is not alive and
    /// [`StoreError::StorageAlreadyRegistered`] on a conflicting size.
    pub fn register_storage(&mut self, id: Id, size: usize) -> StoreResult<()> {
        self.ensure_alive(id)?;
        self.graph.register_storage(id, size)
    }

    /// Returns the slot size registered for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnregisteredStorage`] if `id` has no size.
    pub fn storage_size(&self, id: Id) -> StoreResult<usize> {
        self.graph
            .storage_size(id)
            .ok_or(StoreError::UnregisteredStorage(id))
    }

    // ========================================================================
    // STRUCTURE
    // ========================================================================

    /// Attaches `component` to `entity`, migrating its row.
    ///
    /// The new slot is zero-filled; write it before relying on it. A
    /// destroyed component whose slot was reissued as `component` is
    /// replaced, not kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if either id is not alive and
    /// [`StoreError::ArchetypeLimit`] if no new archetype can be created.
    pub fn add(&mut self, entity: Id, component: Id) -> StoreResult<()> {
        self.ensure_alive(entity)?;
        self.ensure_alive(component)?;
        self.graph.record_add(entity, component)?;
        Ok(())
    }

    /// Detaches `component` from `entity`, migrating its row. Its bytes are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] if `entity` is not alive and
    /// [`StoreError::ArchetypeLimit`] if no new archetype can be created.
    pub fn remove(&mut self, entity: Id, component: Id) -> StoreResult<()> {
        self.ensure_alive(entity)?;
        self.graph.record_remove(entity, component)?;
        Ok(())
    }

    /// Checks whether a live entity carries exactly `component`, generation
    /// included.
    #[must_use]
    pub fn has(&self, entity: Id, component: Id) -> bool {
        self.signature_of(entity)
            .is_some_and(|signature| signature.get(component) == Some(component))
    }

    /// Returns the signature of a live entity.
    #[must_use]
    pub fn signature_of(&self, entity: Id) -> Option<&Signature> {
        let archetype = self.archetype_of(entity)?;
        self.graph.archetype(archetype).map(|a| a.signature())
    }

    /// Returns the archetype of a live entity.
    #[must_use]
    pub fn archetype_of(&self, entity: Id) -> Option<ArchetypeId> {
        self.ids
            .is_valid(entity)
            .then(|| self.graph.archetype_of(entity))
    }

    /// Returns the record of a live entity that has a row.
    #[must_use]
    pub fn record(&self, entity: Id) -> Option<Record> {
        if !self.ids.is_valid(entity) {
            return None;
        }
        self.graph.record(entity)
    }

    // ========================================================================
    // STORAGE
    // ========================================================================

    fn has_storage(&self, entity: Id, component: Id) -> bool {
        if self.graph.storage_size(component).is_some() {
            return true;
        }
        tracing::error!("no storage registered for {} (entity {})", component, entity);
        false
    }

    /// Gets the raw slot of `component` for `entity`.
    ///
    /// `None` if `component` never registered a size (reported as an
    /// error) or the entity doesn't carry it.
    #[must_use]
    pub fn storage(&self, entity: Id, component: Id) -> Option<&[u8]> {
        if !self.has_storage(entity, component) {
            return None;
        }
        let record = self.record(entity)?;
        self.graph.storage(record, component)
    }

    /// Gets the mutable raw slot of `component` for `entity`.
    ///
    /// The borrow pins the world: no structural change can happen while it
    /// is held.
    pub fn storage_mut(&mut self, entity: Id, component: Id) -> Option<&mut [u8]> {
        if !self.has_storage(entity, component) {
            return None;
        }
        let record = self.record(entity)?;
        self.graph.storage_mut(record, component)
    }

    /// Resolves a typed component and checks its registered size.
    fn typed<T: Component>(&self, entity: Id) -> StoreResult<(Id, Record)> {
        self.ensure_alive(entity)?;
        let component = self.component::<T>()?;

        let expected = self.graph.storage_size(component).unwrap_or_default();
        if expected != T::size() {
            return Err(StoreError::SizeMismatch {
                id: component,
                expected,
                actual: T::size(),
            });
        }

        let missing = StoreError::ComponentMissing { entity, component };
        let record = self.graph.record(entity).ok_or_else(|| missing.clone())?;
        let has_column = self
            .graph
            .archetype(record.archetype)
            .is_some_and(|a| a.column(component).is_some());
        if has_column {
            Ok((component, record))
        } else {
            Err(missing)
        }
    }

    /// Gets a typed component.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`], [`StoreError::UnknownComponent`],
    /// [`StoreError::SizeMismatch`] or [`StoreError::ComponentMissing`].
    pub fn get<T: Component>(&self, entity: Id) -> StoreResult<&T> {
        let (component, record) = self.typed::<T>(entity)?;
        let bytes = self
            .graph
            .storage(record, component)
            .ok_or(StoreError::ComponentMissing { entity, component })?;
        bytemuck::try_from_bytes(bytes).map_err(|_| StoreError::SizeMismatch {
            id: component,
            expected: bytes.len(),
            actual: T::size(),
        })
    }

    /// Gets a typed component mutably.
    ///
    /// # Errors
    ///
    /// Same as [`World::get`].
    pub fn get_mut<T: Component>(&mut self, entity: Id) -> StoreResult<&mut T> {
        let (component, record) = self.typed::<T>(entity)?;
        let bytes = self
            .graph
            .storage_mut(record, component)
            .ok_or(StoreError::ComponentMissing { entity, component })?;
        let len = bytes.len();
        bytemuck::try_from_bytes_mut(bytes).map_err(|_| StoreError::SizeMismatch {
            id: component,
            expected: len,
            actual: T::size(),
        })
    }

    /// Overwrites a typed component the entity already carries.
    ///
    /// # Errors
    ///
    /// Same as [`World::get`].
    pub fn set<T: Component>(&mut self, entity: Id, value: T) -> StoreResult<()> {
        let (component, record) = self.typed::<T>(entity)?;
        let slot = self
            .graph
            .storage_mut(record, component)
            .ok_or(StoreError::ComponentMissing { entity, component })?;
        if slot.len() != T::size() {
            return Err(StoreError::SizeMismatch {
                id: component,
                expected: slot.len(),
                actual: T::size(),
            });
        }
        slot.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Attaches a typed component and writes its value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] or [`StoreError::UnknownComponent`],
    /// or any error of [`World::set`].
    pub fn insert<T: Component>(&mut self, entity: Id, value: T) -> StoreResult<()> {
        let component = self.component::<T>()?;
        self.add(entity, component)?;
        self.set(entity, value)
    }

    /// Detaches a typed component.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeadEntity`] or [`StoreError::UnknownComponent`].
    pub fn take<T: Component>(&mut self, entity: Id) -> StoreResult<()> {
        let component = self.component::<T>()?;
        self.remove(entity, component)
    }

    // ========================================================================
    // ITERATION BOUNDARY
    // ========================================================================

    /// Finds archetypes whose signature contains all of `components`.
    #[must_use]
    pub fn matching(&self, components: &[Id]) -> Vec<ArchetypeId> {
        self.graph
            .matching(&Signature::from_ids(components.iter().copied()))
    }

    /// Returns a read-only view of an archetype.
    #[must_use]
    pub fn view(&self, archetype: ArchetypeId) -> Option<ArchetypeView<'_>> {
        self.graph.view(archetype)
    }

    /// Returns a mutable view of an archetype.
    pub fn view_mut(&mut self, archetype: ArchetypeId) -> Option<ArchetypeViewMut<'_>> {
        self.graph.view_mut(archetype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Pos {
        x: f32,
        y: f32,
    }
    impl Component for Pos {}

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Vel {
        x: f32,
        y: f32,
    }
    impl Component for Vel {}

    fn world() -> (World, Id, Id) {
        let mut world = World::new();
        let pos = world.register::<Pos>().unwrap();
        let vel = world.register::<Vel>().unwrap();
        (world, pos, vel)
    }

    #[test]
    fn test_spawn_is_recordless() {
        let (mut world, _, _) = world();
        let e = world.spawn().unwrap();
        assert!(world.is_alive(e));
        assert!(world.record(e).is_none());
        assert_eq!(world.archetype_of(e), Some(ArchetypeId::ROOT));
        assert_eq!(world.signature_of(e), Some(&Signature::empty()));
    }

    #[test]
    fn test_pos_survives_vel_add() {
        let (mut world, pos, vel) = world();
        let e = world.spawn().unwrap();

        world.add(e, pos).unwrap();
        world.set(e, Pos { x: 3.0, y: 4.0 }).unwrap();
        world.add(e, vel).unwrap();

        assert_eq!(world.get::<Pos>(e).unwrap(), &Pos { x: 3.0, y: 4.0 });
        assert_eq!(world.signature_of(e).unwrap(), &Signature::from_ids([vel, pos]));
        assert_eq!(world.get::<Vel>(e).unwrap(), &Vel::default());
    }

    #[test]
    fn test_destroy_recycles_and_frees_row() {
        let (mut world, pos, _) = world();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        world.insert(a, Pos { x: 1.0, y: 0.0 }).unwrap();
        world.insert(b, Pos { x: 2.0, y: 0.0 }).unwrap();
        world.set_name(a, "a").unwrap();

        world.destroy(a).unwrap();
        assert!(!world.is_alive(a));
        assert_eq!(world.destroy(a), Err(StoreError::DeadEntity(a)));
        assert!(world.lookup("a").is_none());

        let table = world.archetype_of(b).unwrap();
        assert_eq!(world.view(table).unwrap().len(), 1);
        assert_eq!(world.get::<Pos>(b).unwrap().x, 2.0);
        assert!(world.storage(a, pos).is_none());

        let c = world.spawn().unwrap();
        assert_eq!(c.data(), a.data());
        assert!(c.generation() > a.generation());
    }

    #[test]
    fn test_names() {
        let (mut world, _, _) = world();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();

        world.set_name(a, "player").unwrap();
        assert_eq!(world.name(a).unwrap(), Some("player"));
        assert_eq!(world.set_name(b, "player"), Err(StoreError::DuplicateName("player".into())));
        assert_eq!(world.name(b).unwrap(), None);

        world.set_name(a, "hero").unwrap();
        assert!(world.lookup("player").is_none());
        assert_eq!(world.lookup("hero"), Some(a));

        world.destroy(b).unwrap();
        assert_eq!(world.set_name(b, "ghost"), Err(StoreError::DeadEntity(b)));
        assert_eq!(world.name(b), Err(StoreError::DeadEntity(b)));
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let (mut world, pos, _) = world();
        let before = world.ids().tracked_count();
        assert_eq!(
            world.register::<Pos>(),
            Err(StoreError::DuplicateName(Pos::name().to_owned()))
        );
        assert_eq!(world.ids().tracked_count(), before);
        assert_eq!(world.component::<Pos>(), Ok(pos));
    }

    #[test]
    fn test_typed_errors() {
        let (mut world, _, _) = world();
        let e = world.spawn().unwrap();
        assert!(matches!(world.get::<Pos>(e), Err(StoreError::ComponentMissing { .. })));

        #[derive(Clone, Copy, Pod, Zeroable)]
        #[repr(C)]
        struct Unregistered(u8);
        impl Component for Unregistered {}
        assert!(matches!(
            world.get::<Unregistered>(e),
            Err(StoreError::UnknownComponent(_))
        ));

        world.destroy(e).unwrap();
        assert_eq!(world.get::<Pos>(e), Err(StoreError::DeadEntity(e)));
    }

    #[test]
    fn test_dead_entity_structural_ops() {
        let (mut world, pos, _) = world();
        let e = world.spawn().unwrap();
        world.destroy(e).unwrap();
        assert_eq!(world.add(e, pos), Err(StoreError::DeadEntity(e)));
        assert_eq!(world.remove(e, pos), Err(StoreError::DeadEntity(e)));
        assert!(!world.has(e, pos));
    }

    #[test]
    fn test_tag_without_storage() {
        let (mut world, pos, _) = world();
        let tag = world.spawn().unwrap();
        let e = world.spawn().unwrap();
        world.insert(e, Pos { x: 1.0, y: 1.0 }).unwrap();
        world.add(e, tag).unwrap();

        assert!(world.has(e, tag));
        assert!(world.storage(e, tag).is_none());
        assert_eq!(world.storage_size(tag), Err(StoreError::UnregisteredStorage(tag)));
        assert_eq!(world.storage_size(pos), Ok(8));
        assert_eq!(world.storage(e, pos).map(<[u8]>::len), Some(8));
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Wide([u64; 2]);
    impl Component for Wide {}

    #[test]
    fn test_reissued_component_slot_does_not_alias() {
        let mut world = World::new();
        let pos = world.register_component("Pos", 8).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, pos).unwrap();

        world.destroy(pos).unwrap();
        let wide = world.register::<Wide>().unwrap();
        assert_eq!(wide.data(), pos.data());
        assert_ne!(wide, pos);
        assert!(!world.has(e, wide));
        assert!(world.storage(e, wide).is_none());
        assert!(matches!(world.get::<Wide>(e), Err(StoreError::ComponentMissing { .. })));

        world.add(e, wide).unwrap();
        assert!(world.has(e, wide));
        assert!(!world.has(e, pos));
        assert_eq!(world.storage(e, wide).map(<[u8]>::len), Some(16));

        world.set(e, Wide([1, 2])).unwrap();
        assert_eq!(world.get::<Wide>(e).unwrap(), &Wide([1, 2]));
    }

    #[test]
    fn test_unregistered_storage_on_recordless_entity() {
        let (mut world, pos, _) = world();
        let tag = world.spawn().unwrap();
        let e = world.spawn().unwrap();
        assert!(world.storage(e, tag).is_none());
        assert!(world.storage_mut(e, tag).is_none());
        assert!(world.storage(e, pos).is_none());
    }

    #[test]
    fn test_exhaustion() {
        let config = StoreConfig {
            id_lower: 0,
            id_upper: Some(1),
            ..StoreConfig::default()
        };
        let mut world = World::with_config(&config).unwrap();
        world.spawn().unwrap();
        world.spawn().unwrap();
        assert_eq!(
            world.spawn(),
            Err(StoreError::IdsExhausted { lower: 0, upper: 1 })
        );
    }

    #[test]
    fn test_set_id_range_purges_dead_rows() {
        let (mut world, _, _) = world();
        let e = world.spawn().unwrap();
        world.insert(e, Pos::default()).unwrap();
        world.set_name(e, "doomed").unwrap();
        let table = world.archetype_of(e).unwrap();

        world.set_id_range(0, 100).unwrap();
        assert!(!world.is_alive(e));
        assert!(world.lookup("doomed").is_none());
        assert!(world.view(table).unwrap().is_empty());
    }

    #[test]
    fn test_matching_and_views() {
        let (mut world, pos, vel) = world();
        for i in 0..3 {
            let e = world.spawn().unwrap();
            world.insert(e, Pos { x: i as f32, y: 0.0 }).unwrap();
            if i > 0 {
                world.insert(e, Vel { x: 1.0, y: 1.0 }).unwrap();
            }
        }

        let moving = world.matching(&[vel, pos]);
        assert_eq!(moving.len(), 1);
        for archetype in moving {
            let mut view = world.view_mut(archetype).unwrap();
            let mut columns = view.columns_mut(&[pos, vel]).unwrap();
            let (p, v) = columns.split_at_mut(1);
            let p: &mut [Pos] = bytemuck::cast_slice_mut(&mut *p[0]);
            let v: &[Vel] = bytemuck::cast_slice(&*v[0]);
            for (p, v) in p.iter_mut().zip(v) {
                p.x += v.x;
            }
        }

        assert_eq!(world.matching(&[pos]).len(), 2);
        let total: f32 = world
            .matching(&[pos])
            .into_iter()
            .filter_map(|a| world.view(a)?.column_as::<Pos>(pos))
            .flat_map(|c| c.iter().map(|p| p.x))
            .sum();
        assert_eq!(total, 0.0 + 2.0 + 3.0);
    }
}
