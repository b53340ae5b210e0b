//! # Entity Component Storage
//!
//! Archetype-based table storage.
//!
//! ## Design Philosophy
//!
//! - Entities with the same component set share one table
//! - Columns are dense byte arrays, one slot per row
//! - Identifiers are indices with generation counters
//! - Structural changes move a row between tables along cached edges

pub mod archetype;
mod component;
mod entity;
pub mod graph;
pub mod query;
mod signature;
mod storage;
mod world;

pub use archetype::{Archetype, ArchetypeId, Edge};
pub use component::Component;
pub use entity::{Id, IdAllocator};
pub use graph::{ArchetypeGraph, Record};
pub use query::{ArchetypeView, ArchetypeViewMut};
pub use signature::Signature;
pub use storage::Column;
pub use world::World;
