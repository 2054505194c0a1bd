//! Contiguous-Memory Allocation Simulator
//!
//! Simulates contiguous allocation over a single fixed-size address space,
//! the way early multiprogramming systems placed whole processes in memory.
//!
//! ## Features
//!
//! - **Four placement policies**: first-fit, best-fit, worst-fit, next-fit
//! - **Block splitting** on partial allocation
//! - **Automatic coalescing** of adjacent free blocks on release
//! - **External-fragmentation metric** over the free block set
//! - **TOML seed layouts** for custom initial memory maps
//!
//! ## Example Usage
//!
//! ```rust
//! use memsim::{MemoryManager, PlacementPolicy};
//!
//! // Boot the fixed 1135 KB layout
//! let mut memory = MemoryManager::new();
//!
//! // First-fit allocation splits the first suitable free block
//! memory.allocate(10, "Process-E").unwrap();
//! assert_eq!(memory.used_memory(), 994);
//!
//! // Switch algorithms without disturbing the ledger
//! memory.set_policy(PlacementPolicy::BestFit);
//!
//! // Release merges adjacent free blocks back together
//! memory.deallocate("Process-E").unwrap();
//! assert_eq!(memory.used_memory(), 984);
//!
//! let stats = memory.stats();
//! assert_eq!(stats.total, stats.used + stats.free);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ MemoryManager (engine)                      │
//! │  - active PlacementPolicy + next-fit cursor │
//! │  - used/total counters                      │
//! ├─────────────────────────────────────────────┤
//! │ BlockLedger                                 │
//! │  - ordered, gap-free block sequence         │
//! │  - split_at / release_owner / merge_free    │
//! ├─────────────────────────────────────────────┤
//! │ SeedLayout                                  │
//! │  - fixed boot layout or TOML file           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Display layers (the `memsim` binary, or any GUI) consume read-only
//! snapshots via [`MemoryManager::blocks`] and [`MemoryManager::stats`] and
//! own no allocation state.

pub mod block;
pub mod engine;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod policy;

// Re-export commonly used types
pub use block::{BlockSnapshot, MemoryBlock};
pub use engine::{MemoryManager, MemoryStats};
pub use error::{MemSimError, Result};
pub use layout::{SeedLayout, SeedRegion};
pub use ledger::BlockLedger;
pub use policy::PlacementPolicy;

/// Simulator version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
