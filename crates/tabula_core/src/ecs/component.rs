//! # Component Trait
//!
//! Components are pure data containers with no behavior. The store itself
//! is byte-size driven; this trait is the typed boundary on top of it.

use bytemuck::Pod;

/// Marker trait for typed components.
///
/// Components must be:
/// - `Pod`: Plain old data, bitwise copyable to and from column bytes
/// - `'static`: Registered once and looked up by name
///
/// The default name is the Rust type name, mirroring registration by type.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use tabula_core::Component;
///
/// #[derive(Clone, Copy, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: u32,
///     max: u32,
/// }
///
/// impl Component for Health {}
///
/// assert_eq!(Health::size(), 8);
/// ```
pub trait Component: Pod + 'static {
    /// Name the component is registered under.
    #[must_use]
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Byte size of one slot.
    #[must_use]
    fn size() -> usize {
        std::mem::size_of::<Self>()
    }
}
