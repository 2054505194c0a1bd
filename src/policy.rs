//! Placement policies for selecting a free block
//!
//! Each policy is a pure selection function over the ordered block ledger,
//! returning the index of a block the engine may allocate from. Best-fit and
//! worst-fit use strict comparisons, so the first block encountered with the
//! minimal (or maximal) slack wins ties.

use crate::block::MemoryBlock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block selection algorithm
///
/// All four policies share the ledger, splitting, merging, and statistics
/// machinery; they differ only in which free block they pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// First free block from the bottom of the address space
    FirstFit,
    /// Free block with the least leftover space
    BestFit,
    /// Free block with the most leftover space
    WorstFit,
    /// First free block at or after the previous allocation point
    NextFit,
}

impl PlacementPolicy {
    pub const ALL: [PlacementPolicy; 4] = [
        PlacementPolicy::FirstFit,
        PlacementPolicy::BestFit,
        PlacementPolicy::WorstFit,
        PlacementPolicy::NextFit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PlacementPolicy::FirstFit => "first-fit",
            PlacementPolicy::BestFit => "best-fit",
            PlacementPolicy::WorstFit => "worst-fit",
            PlacementPolicy::NextFit => "next-fit",
        }
    }
}

impl fmt::Display for PlacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-fit" | "first_fit" | "firstfit" | "first" => Ok(PlacementPolicy::FirstFit),
            "best-fit" | "best_fit" | "bestfit" | "best" => Ok(PlacementPolicy::BestFit),
            "worst-fit" | "worst_fit" | "worstfit" | "worst" => Ok(PlacementPolicy::WorstFit),
            "next-fit" | "next_fit" | "nextfit" | "next" => Ok(PlacementPolicy::NextFit),
            _ => Err(format!(
                "Invalid policy '{}'. Valid options: first-fit, best-fit, worst-fit, next-fit",
                s
            )),
        }
    }
}

/// First free block with sufficient size, scanning from index 0
pub fn first_fit(blocks: &[MemoryBlock], requested: u64) -> Option<usize> {
    blocks
        .iter()
        .position(|b| b.is_free() && b.size >= requested)
}

/// Free block with the minimal slack; first encountered wins ties
pub fn best_fit(blocks: &[MemoryBlock], requested: u64) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, block) in blocks.iter().enumerate() {
        if block.is_free() && block.size >= requested {
            let slack = block.size - requested;
            // Strict comparison keeps the earlier block on equal slack
            if best.map_or(true, |(_, s)| slack < s) {
                best = Some((i, slack));
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Free block with the maximal slack; first encountered wins ties
pub fn worst_fit(blocks: &[MemoryBlock], requested: u64) -> Option<usize> {
    let mut worst: Option<(usize, u64)> = None;
    for (i, block) in blocks.iter().enumerate() {
        if block.is_free() && block.size >= requested {
            let slack = block.size - requested;
            if worst.map_or(true, |(_, s)| slack > s) {
                worst = Some((i, slack));
            }
        }
    }
    worst.map(|(i, _)| i)
}

/// First suitable free block scanning circularly from `cursor`
///
/// Wraps through the ledger exactly once; returns `None` after a full loop
/// with no match. The caller owns the cursor and advances it on success.
pub fn next_fit(blocks: &[MemoryBlock], requested: u64, cursor: usize) -> Option<usize> {
    if blocks.is_empty() {
        return None;
    }
    let len = blocks.len();
    let start = cursor % len;
    for offset in 0..len {
        let i = (start + offset) % len;
        if blocks[i].is_free() && blocks[i].size >= requested {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemoryBlock;

    /// Free blocks of the given sizes separated by 1 KB allocated spacers,
    /// so no two free blocks are adjacent
    fn fenced_free(sizes: &[u64]) -> Vec<MemoryBlock> {
        let mut blocks = Vec::new();
        let mut address = 0;
        for (i, &size) in sizes.iter().enumerate() {
            blocks.push(MemoryBlock::free(address, size));
            address += size;
            blocks.push(MemoryBlock::allocated(address, 1, format!("spacer-{}", i)));
            address += 1;
        }
        blocks
    }

    #[test]
    fn test_first_fit_takes_earliest() {
        // Free sizes: 2, 20, 1, 4, 124 (the boot layout's free set)
        let blocks = fenced_free(&[2, 20, 1, 4, 124]);

        // 10 KB skips the 2 KB block and lands in the 20 KB one
        let idx = first_fit(&blocks, 10).unwrap();
        assert_eq!(blocks[idx].size, 20);

        // 1 KB fits the very first free block
        let idx = first_fit(&blocks, 1).unwrap();
        assert_eq!(blocks[idx].size, 2);
    }

    #[test]
    fn test_first_fit_none_when_too_large() {
        let blocks = fenced_free(&[2, 20, 1, 4, 124]);
        assert_eq!(first_fit(&blocks, 125), None);
    }

    #[test]
    fn test_best_fit_minimal_slack() {
        let blocks = fenced_free(&[2, 20, 1, 4, 124]);

        // Requesting 3: candidates are 20 (slack 17), 4 (slack 1), 124
        // (slack 121); best-fit picks the 4 KB block
        let idx = best_fit(&blocks, 3).unwrap();
        assert_eq!(blocks[idx].size, 4);
    }

    #[test]
    fn test_worst_fit_maximal_slack() {
        let blocks = fenced_free(&[2, 20, 1, 4, 124]);
        let idx = worst_fit(&blocks, 3).unwrap();
        assert_eq!(blocks[idx].size, 124);
    }

    #[test]
    fn test_best_fit_tie_break_keeps_first() {
        let blocks = fenced_free(&[8, 8, 8]);
        let idx = best_fit(&blocks, 8).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_worst_fit_tie_break_keeps_first() {
        let blocks = fenced_free(&[3, 9, 9]);
        // Free blocks sit at indices 0, 2, 4; the first 9 KB block wins
        let idx = worst_fit(&blocks, 1).unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn test_next_fit_starts_at_cursor() {
        let blocks = fenced_free(&[10, 10, 10]);
        // Free blocks sit at indices 0, 2, 4

        assert_eq!(next_fit(&blocks, 5, 0), Some(0));
        assert_eq!(next_fit(&blocks, 5, 1), Some(2));
        assert_eq!(next_fit(&blocks, 5, 3), Some(4));
    }

    #[test]
    fn test_next_fit_wraps_once() {
        let blocks = fenced_free(&[10, 4, 4]);
        // Only the block at index 0 can hold 8 KB; from cursor 1 the scan
        // must wrap around to find it
        assert_eq!(next_fit(&blocks, 8, 1), Some(0));
        assert_eq!(next_fit(&blocks, 11, 1), None);
    }

    #[test]
    fn test_next_fit_empty_ledger() {
        assert_eq!(next_fit(&[], 1, 0), None);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "first-fit".parse::<PlacementPolicy>().unwrap(),
            PlacementPolicy::FirstFit
        );
        assert_eq!(
            "BestFit".parse::<PlacementPolicy>().unwrap(),
            PlacementPolicy::BestFit
        );
        assert_eq!(
            "worst".parse::<PlacementPolicy>().unwrap(),
            PlacementPolicy::WorstFit
        );
        assert_eq!(
            "next_fit".parse::<PlacementPolicy>().unwrap(),
            PlacementPolicy::NextFit
        );
        assert!("random-fit".parse::<PlacementPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_round_trip() {
        for policy in PlacementPolicy::ALL {
            assert_eq!(policy.name().parse::<PlacementPolicy>().unwrap(), policy);
        }
    }
}
