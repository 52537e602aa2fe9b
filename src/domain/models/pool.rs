//! Address Pool
//!
//! The configured universe of allocatable space and the lowest-address-first
//! free-block search over it.

use super::cidr::CidrBlock;
use crate::shared::errors::DomainError;

/// Allocatable address space: one or more disjoint top-level ranges plus
/// bounds on the prefix length a caller may request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPool {
    ranges: Vec<CidrBlock>,
    min_prefix_len: u8,
    max_prefix_len: u8,
}

impl AddressPool {
    /// Create a pool, sorting the ranges by address
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPool` if there are no ranges, the ranges
    /// overlap, or the prefix bounds are not `1 <= min <= max <= 32`.
    pub fn new(
        mut ranges: Vec<CidrBlock>,
        min_prefix_len: u8,
        max_prefix_len: u8,
    ) -> Result<Self, DomainError> {
        if ranges.is_empty() {
            return Err(DomainError::InvalidPool("at least one range is required".to_string()));
        }

        if min_prefix_len == 0 || min_prefix_len > max_prefix_len || max_prefix_len > 32 {
            return Err(DomainError::InvalidPool(format!(
                "prefix bounds /{min_prefix_len} to /{max_prefix_len} must satisfy 1 <= min <= max <= 32"
            )));
        }

        ranges.sort_by_key(CidrBlock::start);
        if let Some(pair) = ranges.windows(2).find(|pair| pair[0].overlaps(&pair[1])) {
            return Err(DomainError::InvalidPool(format!(
                "ranges {} and {} overlap",
                pair[0], pair[1]
            )));
        }

        Ok(Self {
            ranges,
            min_prefix_len,
            max_prefix_len,
        })
    }

    #[must_use]
    pub fn ranges(&self) -> &[CidrBlock] {
        &self.ranges
    }

    #[must_use]
    pub fn min_prefix_len(&self) -> u8 {
        self.min_prefix_len
    }

    #[must_use]
    pub fn max_prefix_len(&self) -> u8 {
        self.max_prefix_len
    }

    /// Check that a requested prefix length is within the pool bounds
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PrefixOutOfBounds` otherwise.
    pub fn validate_prefix_len(&self, prefix_len: u8) -> Result<(), DomainError> {
        if (self.min_prefix_len..=self.max_prefix_len).contains(&prefix_len) {
            Ok(())
        } else {
            Err(DomainError::PrefixOutOfBounds {
                requested: prefix_len,
                min: self.min_prefix_len,
                max: self.max_prefix_len,
            })
        }
    }

    /// Find the lowest-addressed block of the given size that overlaps none
    /// of `taken`.
    ///
    /// Candidates are aligned to their own size and visited in address order.
    /// A candidate hitting a taken interval jumps straight to the first aligned
    /// candidate past it, so the walk is bounded by the number of taken blocks
    /// rather than by pool size.
    #[must_use]
    pub fn find_free_block(&self, prefix_len: u8, taken: &[CidrBlock]) -> Option<CidrBlock> {
        if prefix_len > 32 {
            return None;
        }

        let size = 1u64 << (32 - u32::from(prefix_len));
        let taken = merge_intervals(taken);
        let mut next_taken = 0usize;

        for range in &self.ranges {
            if prefix_len < range.prefix_len() {
                continue;
            }

            let mut candidate = range.start();
            while candidate + size <= range.end() {
                while next_taken < taken.len() && taken[next_taken].1 <= candidate {
                    next_taken += 1;
                }

                match taken.get(next_taken) {
                    Some(&(start, end)) if start < candidate + size => {
                        candidate = align_up(end, size);
                    }
                    _ => return CidrBlock::from_start(candidate, prefix_len),
                }
            }
        }

        None
    }
}

/// Sort and coalesce blocks into disjoint `[start, end)` intervals
fn merge_intervals(blocks: &[CidrBlock]) -> Vec<(u64, u64)> {
    let mut intervals: Vec<(u64, u64)> = blocks.iter().map(|b| (b.start(), b.end())).collect();
    intervals.sort_unstable();

    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn align_up(addr: u64, size: u64) -> u64 {
    addr.div_ceil(size) * size
}
