//! Host-owned graphics resources addressed by integer handles
//!
//! The module never sees native objects, only the `u32` index returned at
//! creation. Each resource type has its own [`HandleTable`].
//!
//! Deleting tombstones the slot instead of removing it, so every other
//! handle keeps its meaning and a deleted index is never handed out again.


use std::fmt;

use thiserror::Error;

use crate::graphics::GraphicsContext;

/// Resource type of a handle table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Shader,
    Program,
    Texture,
    Framebuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shader => f.write_str("shader"),
            Self::Program => f.write_str("program"),
            Self::Texture => f.write_str("texture"),
            Self::Framebuffer => f.write_str("framebuffer"),
        }
    }
}

/// Handle lookup failures. Both indicate a host/module contract violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} handle {handle} was never created")]
    Unknown { kind: ResourceKind, handle: u32 },

    #[error("{kind} handle {handle} has been deleted")]
    Deleted { kind: ResourceKind, handle: u32 },

    #[error("{kind} table is full")]
    Exhausted { kind: ResourceKind },
}

#[derive(Debug, Clone, Copy)]
enum Slot<T> {
    Live(T),
    Deleted,
}

/// Append-only table of slots indexed by handle
#[derive(Debug, Clone)]
pub struct HandleTable<T> {
    kind: ResourceKind,
    slots: Vec<Slot<T>>,
}

impl<T: Copy> HandleTable<T> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Store `value` and return its handle (the slot index)
    pub fn insert(&mut self, value: T) -> Result<u32, RegistryError> {
        let handle =
            u32::try_from(self.slots.len()).map_err(|_| RegistryError::Exhausted { kind: self.kind })?;
        self.slots.push(Slot::Live(value));
        Ok(handle)
    }

    pub fn get(&self, handle: u32) -> Result<T, RegistryError> {
        match self.slots.get(handle as usize) {
            Some(Slot::Live(value)) => Ok(*value),
            Some(Slot::Deleted) => Err(RegistryError::Deleted {
                kind: self.kind,
                handle,
            }),
            None => Err(RegistryError::Unknown {
                kind: self.kind,
                handle,
            }),
        }
    }

    /// Tombstone `handle` and return the object it held
    pub fn remove(&mut self, handle: u32) -> Result<T, RegistryError> {
        let value = self.get(handle)?;
        self.slots[handle as usize] = Slot::Deleted;
        Ok(value)
    }

    pub fn contains(&self, handle: u32) -> bool {
        self.get(handle).is_ok()
    }

    /// Number of handles ever issued, deleted ones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }
}

/// All handle tables of one rendering context
pub struct ResourceRegistry<G: GraphicsContext> {
    pub shaders: HandleTable<G::Shader>,
    pub programs: HandleTable<G::Program>,
    pub textures: HandleTable<G::Texture>,
    pub framebuffers: HandleTable<G::Framebuffer>,
}

impl<G: GraphicsContext> ResourceRegistry<G> {
    pub fn new() -> Self {
        Self {
            shaders: HandleTable::new(ResourceKind::Shader),
            programs: HandleTable::new(ResourceKind::Program),
            textures: HandleTable::new(ResourceKind::Texture),
            framebuffers: HandleTable::new(ResourceKind::Framebuffer),
        }
    }
}

impl<G: GraphicsContext> Default for ResourceRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}
