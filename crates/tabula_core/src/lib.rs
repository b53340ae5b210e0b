//! # Tabula Core
//!
//! Archetype-based entity/component storage designed for:
//! - Dense, column-wise component data
//! - O(1) structural changes along cached archetype edges
//! - Generation-checked identifiers that detect stale handles
//!
//! ## Architecture Rules
//!
//! 1. **Byte-size driven** - Columns only know slot sizes, typed access is a layer on top
//! 2. **Data-oriented design** - One table per component set, rows kept dense by swap-remove
//! 3. **Borrow-pinned access** - Slot and column borrows block structural changes
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::World;
//!
//! let mut world = World::new();
//! let position = world.register_component("Position", 12).unwrap();
//!
//! let entity = world.spawn().unwrap();
//! world.add(entity, position).unwrap();
//! assert_eq!(world.storage(entity, position).map(<[u8]>::len), Some(12));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::StoreConfig;
pub use ecs::{
    Archetype, ArchetypeGraph, ArchetypeId, ArchetypeView, ArchetypeViewMut, Column, Component,
    Edge, Id, IdAllocator, Record, Signature, World,
};
pub use error::{StoreError, StoreResult};
