//! Memory block entity
//!
//! A block is a contiguous extent of the simulated address space, either
//! free or allocated to exactly one owner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous extent of the address space
///
/// `owner` is `Some` exactly when the block is allocated; free blocks carry
/// no owner. Blocks never have zero size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    /// Starting address (KB offset within the address space)
    pub start: u64,

    /// Extent size in KB (always > 0)
    pub size: u64,

    /// Owning process id, present iff allocated
    pub owner: Option<String>,
}

impl MemoryBlock {
    /// Create a free block
    pub fn free(start: u64, size: u64) -> Self {
        MemoryBlock {
            start,
            size,
            owner: None,
        }
    }

    /// Create an allocated block owned by `owner`
    pub fn allocated(start: u64, size: u64, owner: impl Into<String>) -> Self {
        MemoryBlock {
            start,
            size,
            owner: Some(owner.into()),
        }
    }

    /// First address past the end of this block
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn is_allocated(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// Check whether this block is allocated to the given owner
    pub fn owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }

    /// Check if this block immediately precedes another
    pub fn is_adjacent_to(&self, other: &MemoryBlock) -> bool {
        self.end() == other.start
    }
}

impl fmt::Display for MemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(
                f,
                "Block(addr={}, size={}KB, allocated to {})",
                self.start, self.size, owner
            ),
            None => write!(f, "Block(addr={}, size={}KB, free)", self.start, self.size),
        }
    }
}

/// Read-only snapshot of a block, shaped for display layers
///
/// Exposes the occupancy flag and owner id as separate fields so table and
/// JSON consumers do not need to understand the `Option` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub start_address: u64,
    pub size: u64,
    pub allocated: bool,
    pub owner_id: String,
}

impl From<&MemoryBlock> for BlockSnapshot {
    fn from(block: &MemoryBlock) -> Self {
        BlockSnapshot {
            start_address: block.start,
            size: block.size,
            allocated: block.is_allocated(),
            owner_id: block.owner.clone().unwrap_or_default(),
        }
    }
}
