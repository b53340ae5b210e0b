//! # Store Error Types
//!
//! All errors that can surface from the table store.
//!
//! Internal invariant violations (row misalignment, a signature difference
//! that is not exactly one id) are programmer errors and are caught with
//! `debug_assert!` where they are detected instead of being represented here.

use thiserror::Error;

use crate::ecs::Id;

/// Errors that can occur in the table store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The bounded identifier window has been fully allocated.
    #[error("identifier range exhausted: [{lower}, {upper}] fully allocated")]
    IdsExhausted {
        /// Lower bound of the window.
        lower: u32,
        /// Inclusive upper bound of the window (`u32::MAX` when unbounded).
        upper: u32,
    },

    /// The archetype arena can't index another table.
    #[error("archetype limit reached: {0} archetypes")]
    ArchetypeLimit(usize),

    /// An identifier window with `lower > upper` was requested.
    #[error("invalid identifier range: lower bound {lower} exceeds upper bound {upper}")]
    InvalidRange {
        /// Requested lower bound.
        lower: u32,
        /// Requested upper bound.
        upper: u32,
    },

    /// The operation targets an identifier that is not live.
    #[error("identifier {0} is not alive")]
    DeadEntity(Id),

    /// No component is registered under this name.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// Storage was requested for an identifier that never registered a byte size.
    #[error("no storage registered for identifier {0}")]
    UnregisteredStorage(Id),

    /// The identifier already has a different registered byte size.
    #[error("identifier {id} already has {size} bytes of storage registered")]
    StorageAlreadyRegistered {
        /// The identifier.
        id: Id,
        /// The size that was registered first.
        size: usize,
    },

    /// The name is already in use by another identifier.
    #[error("name already registered: {0}")]
    DuplicateName(String),

    /// The entity does not carry the component.
    #[error("entity {entity} has no component {component}")]
    ComponentMissing {
        /// The entity that was queried.
        entity: Id,
        /// The component that is not attached.
        component: Id,
    },

    /// A typed access used a type whose size differs from the registered one.
    #[error("size mismatch for {id}: registered {expected} bytes, accessed as {actual} bytes")]
    SizeMismatch {
        /// The component identifier.
        id: Id,
        /// Registered byte size.
        expected: usize,
        /// Byte size of the accessing type.
        actual: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
