//! Ordered block ledger covering the simulated address space
//!
//! The ledger is the sole source of truth for occupancy: an ordered sequence
//! of blocks with no gaps and no overlaps whose extents sum to the fixed
//! total size. Allocation splits a free block in place; release marks blocks
//! free and a full coalescing pass merges adjacent free neighbors.

use crate::block::MemoryBlock;
use crate::error::{MemSimError, Result};
use crate::layout::SeedLayout;
use tracing::debug;

/// Ordered, gap-free sequence of memory blocks
///
/// Mutated only through [`split_at`](BlockLedger::split_at) and
/// [`merge_free`](BlockLedger::merge_free); everything else is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLedger {
    blocks: Vec<MemoryBlock>,
    total_size: u64,
}

impl BlockLedger {
    /// Build a ledger from a validated seed layout
    ///
    /// Regions are laid out back to back against a running address starting
    /// at 0, so contiguity holds by construction.
    pub fn from_layout(layout: &SeedLayout) -> Result<Self> {
        layout.validate()?;

        let mut blocks = Vec::with_capacity(layout.regions.len());
        let mut address = 0u64;
        for region in &layout.regions {
            blocks.push(MemoryBlock {
                start: address,
                size: region.size,
                owner: region.owner.clone(),
            });
            address += region.size;
        }

        Ok(BlockLedger {
            blocks,
            total_size: address,
        })
    }

    /// Fixed size of the whole address space
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Ordered view of the blocks
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&MemoryBlock> {
        self.blocks.get(index)
    }

    /// Size of the largest free block, or 0 if none is free
    pub fn largest_free(&self) -> u64 {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    /// Whether any allocated block carries the given owner id
    pub fn owner_exists(&self, owner: &str) -> bool {
        self.blocks.iter().any(|b| b.owned_by(owner))
    }

    /// Allocate `requested` KB out of the free block at `index`
    ///
    /// Exact fit marks the block allocated in place. A larger block is
    /// shrunk to `requested` and a free remainder is inserted immediately
    /// after it. The block must be free and at least `requested` KB; policy
    /// contracts guarantee this, so a violation means the ledger and the
    /// policy disagree and is reported as corruption without mutating
    /// anything.
    pub fn split_at(&mut self, index: usize, requested: u64, owner: &str) -> Result<()> {
        let block = self
            .blocks
            .get(index)
            .ok_or_else(|| MemSimError::LedgerCorrupt(format!("split index {} out of range", index)))?;

        if block.is_allocated() {
            return Err(MemSimError::LedgerCorrupt(format!(
                "split target at address {} is already allocated",
                block.start
            )));
        }
        if block.size < requested {
            return Err(MemSimError::LedgerCorrupt(format!(
                "split target at address {} holds {} KB, {} KB requested",
                block.start, block.size, requested
            )));
        }

        let original_size = self.blocks[index].size;
        self.blocks[index].size = requested;
        self.blocks[index].owner = Some(owner.to_string());

        let remainder = original_size - requested;
        if remainder > 0 {
            let remainder_start = self.blocks[index].start + requested;
            self.blocks
                .insert(index + 1, MemoryBlock::free(remainder_start, remainder));
            debug!(
                "Split block at index {}: {} KB to '{}', {} KB remainder free at {}",
                index, requested, owner, remainder, remainder_start
            );
        } else {
            debug!(
                "Allocated exact-fit block at index {} ({} KB) to '{}'",
                index, requested, owner
            );
        }

        Ok(())
    }

    /// Mark every block owned by `owner` as free
    ///
    /// Returns the total KB released, or 0 if the owner held nothing. Does
    /// not coalesce; callers follow up with [`merge_free`](Self::merge_free).
    pub fn release_owner(&mut self, owner: &str) -> u64 {
        let mut released = 0u64;
        for block in &mut self.blocks {
            if block.owned_by(owner) {
                debug!(
                    "Releasing block at address {} ({} KB) from '{}'",
                    block.start, block.size, owner
                );
                released += block.size;
                block.owner = None;
            }
        }
        released
    }

    /// Merge every run of adjacent free blocks into one
    ///
    /// Single forward scan; after a merge the same position is re-checked
    /// since the widened block may now touch another free neighbor.
    pub fn merge_free(&mut self) {
        let mut i = 0;
        while i + 1 < self.blocks.len() {
            if self.blocks[i].is_free() && self.blocks[i + 1].is_free() {
                let absorbed = self.blocks[i + 1].size;
                self.blocks[i].size += absorbed;
                self.blocks.remove(i + 1);
                debug!(
                    "Merged free block at address {} (+{} KB, now {} KB)",
                    self.blocks[i].start, absorbed, self.blocks[i].size
                );
                // The widened block may be adjacent to another free one
                continue;
            }
            i += 1;
        }
    }

    /// Verify the ledger invariants
    ///
    /// Checks ordering, contiguity, full coverage, positive sizes, owner
    /// uniqueness, and (post-coalescing) that no two neighbors are both
    /// free. Used by tests and debug assertions in the engine.
    pub fn check_invariants(&self) -> Result<()> {
        if self.blocks.is_empty() {
            return Err(MemSimError::LedgerCorrupt("ledger is empty".into()));
        }
        if self.blocks[0].start != 0 {
            return Err(MemSimError::LedgerCorrupt(format!(
                "first block starts at {}, not 0",
                self.blocks[0].start
            )));
        }

        let mut owners = std::collections::HashSet::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if block.size == 0 {
                return Err(MemSimError::LedgerCorrupt(format!(
                    "block {} has zero size",
                    i
                )));
            }
            if let Some(owner) = &block.owner {
                if !owners.insert(owner.as_str()) {
                    return Err(MemSimError::LedgerCorrupt(format!(
                        "owner '{}' holds more than one block",
                        owner
                    )));
                }
            }
            if let Some(next) = self.blocks.get(i + 1) {
                if block.end() != next.start {
                    return Err(MemSimError::LedgerCorrupt(format!(
                        "gap or overlap between blocks {} and {}",
                        i,
                        i + 1
                    )));
                }
            }
        }

        let last = self.blocks.last().expect("checked non-empty above");
        if last.end() != self.total_size {
            return Err(MemSimError::LedgerCorrupt(format!(
                "ledger ends at {}, expected {}",
                last.end(),
                self.total_size
            )));
        }

        Ok(())
    }

    /// Post-coalescing check: no two consecutive free blocks
    pub fn check_coalesced(&self) -> Result<()> {
        for window in self.blocks.windows(2) {
            if window[0].is_free() && window[1].is_free() {
                return Err(MemSimError::LedgerCorrupt(format!(
                    "adjacent free blocks at addresses {} and {}",
                    window[0].start, window[1].start
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SeedRegion;

    fn ledger(regions: Vec<SeedRegion>) -> BlockLedger {
        BlockLedger::from_layout(&SeedLayout { regions }).unwrap()
    }

    #[test]
    fn test_from_default_layout() {
        let ledger = BlockLedger::from_layout(&SeedLayout::default()).unwrap();
        assert_eq!(ledger.len(), 9);
        assert_eq!(ledger.total_size(), 1135);
        ledger.check_invariants().unwrap();

        // Addresses accumulate in order
        assert_eq!(ledger.get(0).unwrap().start, 0);
        assert_eq!(ledger.get(1).unwrap().start, 2);
        assert_eq!(ledger.get(2).unwrap().start, 122);
        assert_eq!(ledger.get(8).unwrap().start, 1011);
    }

    #[test]
    fn test_split_exact_fit() {
        let mut ledger = ledger(vec![SeedRegion::free(100)]);
        ledger.split_at(0, 100, "P1").unwrap();

        assert_eq!(ledger.len(), 1);
        assert!(ledger.get(0).unwrap().owned_by("P1"));
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_split_with_remainder() {
        let mut ledger = ledger(vec![SeedRegion::free(100)]);
        ledger.split_at(0, 30, "P1").unwrap();

        assert_eq!(ledger.len(), 2);
        let first = ledger.get(0).unwrap();
        let second = ledger.get(1).unwrap();
        assert_eq!((first.start, first.size), (0, 30));
        assert!(first.owned_by("P1"));
        assert_eq!((second.start, second.size), (30, 70));
        assert!(second.is_free());
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_split_rejects_allocated_target() {
        let mut ledger = ledger(vec![SeedRegion::allocated(100, "P1")]);
        let before = ledger.clone();

        let result = ledger.split_at(0, 10, "P2");
        assert!(matches!(result, Err(MemSimError::LedgerCorrupt(_))));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_split_rejects_undersized_target() {
        let mut ledger = ledger(vec![SeedRegion::free(10)]);
        let before = ledger.clone();

        let result = ledger.split_at(0, 11, "P1");
        assert!(matches!(result, Err(MemSimError::LedgerCorrupt(_))));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_release_owner_totals() {
        let mut ledger = ledger(vec![
            SeedRegion::allocated(40, "P1"),
            SeedRegion::free(10),
            SeedRegion::allocated(20, "P2"),
        ]);

        assert_eq!(ledger.release_owner("P1"), 40);
        assert_eq!(ledger.release_owner("missing"), 0);
        assert!(ledger.get(0).unwrap().is_free());
        assert!(ledger.get(2).unwrap().owned_by("P2"));
    }

    #[test]
    fn test_merge_free_cascades() {
        let mut ledger = ledger(vec![
            SeedRegion::allocated(10, "P1"),
            SeedRegion::allocated(20, "P2"),
            SeedRegion::allocated(30, "P3"),
            SeedRegion::free(40),
        ]);

        // Free the middle two; the merge of P2+P3 must cascade into the
        // trailing free block as well
        ledger.release_owner("P2");
        ledger.release_owner("P3");
        ledger.merge_free();

        assert_eq!(ledger.len(), 2);
        let merged = ledger.get(1).unwrap();
        assert_eq!((merged.start, merged.size), (10, 90));
        ledger.check_coalesced().unwrap();
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_merge_free_noop_when_coalesced() {
        let mut ledger = ledger(vec![
            SeedRegion::free(10),
            SeedRegion::allocated(20, "P1"),
            SeedRegion::free(30),
        ]);
        let before = ledger.clone();
        ledger.merge_free();
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_largest_free() {
        let ledger = ledger(vec![
            SeedRegion::free(2),
            SeedRegion::allocated(120, "P1"),
            SeedRegion::free(20),
        ]);
        assert_eq!(ledger.largest_free(), 20);

        let full = self::ledger(vec![SeedRegion::allocated(10, "P1")]);
        assert_eq!(full.largest_free(), 0);
    }

    #[test]
    fn test_owner_exists() {
        let ledger = ledger(vec![SeedRegion::allocated(10, "P1"), SeedRegion::free(5)]);
        assert!(ledger.owner_exists("P1"));
        assert!(!ledger.owner_exists("P2"));
    }
}
