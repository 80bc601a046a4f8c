// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use itertools::Itertools;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use crate::error::OutOfMemory;

/// smallest allocation made when growing
const MIN_GROWTH: usize = 64;

/// Flat, growable Intcode memory
///
/// Reads past the end of the allocation yield `0`. Writes past the end grow the allocation to the
/// next power of two (at least [`MIN_GROWTH`] cells) first. Growth that can't be allocated fails
/// with [`OutOfMemory`] rather than aborting.
#[derive(Clone, Default)]
pub(super) struct IntcodeMem {
    cells: Vec<i64>,
}

impl IntcodeMem {
    pub(super) fn get(&self, address: usize) -> i64 {
        self.cells.get(address).copied().unwrap_or(0)
    }

    pub(super) fn set(&mut self, address: usize, value: i64) -> Result<(), OutOfMemory> {
        self.grow_to(address)?;
        self.cells[address] = value;
        Ok(())
    }

    /// mutable access to a cell, growing memory to contain it
    fn get_mut(&mut self, address: usize) -> Result<&mut i64, OutOfMemory> {
        self.grow_to(address)?;
        Ok(&mut self.cells[address])
    }

    fn grow_to(&mut self, address: usize) -> Result<(), OutOfMemory> {
        if address < self.cells.len() {
            return Ok(());
        }
        let new_len = address
            .checked_add(1)
            .and_then(usize::checked_next_power_of_two)
            .ok_or(OutOfMemory(address))?
            .max(MIN_GROWTH);
        log::debug!("growing memory from {} to {new_len} cells", self.cells.len());
        self.cells
            .try_reserve_exact(new_len - self.cells.len())
            .map_err(|e| {
                log::debug!("failed to grow memory to {new_len} cells: {e}");
                OutOfMemory(address)
            })?;
        self.cells.resize(new_len, 0);
        Ok(())
    }

    /// number of allocated cells
    #[cfg(test)]
    fn len(&self) -> usize {
        self.cells.len()
    }

    /// allocated cells up to and including the last non-zero one
    fn significant(&self) -> &[i64] {
        let end = self
            .cells
            .iter()
            .rposition(|&i| i != 0)
            .map_or(0, |last| last + 1);
        &self.cells[..end]
    }

    pub(super) fn get_range(&self, range: Range<usize>) -> Cow<'_, [i64]> {
        if range.end <= self.cells.len() {
            Cow::Borrowed(&self.cells[range])
        } else {
            Cow::Owned(range.map(|i| self.get(i)).collect())
        }
    }
}

impl std::ops::Index<usize> for IntcodeMem {
    type Output = i64;
    fn index(&self, i: usize) -> &i64 {
        self.cells.get(i).unwrap_or(&0)
    }
}

impl std::ops::IndexMut<usize> for IntcodeMem {
    fn index_mut(&mut self, i: usize) -> &mut i64 {
        match self.get_mut(i) {
            Ok(cell) => cell,
            Err(e) => panic!("{e}"),
        }
    }
}

impl PartialEq for IntcodeMem {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl FromIterator<i64> for IntcodeMem {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for IntcodeMem {
    type Item = i64;
    type IntoIter = std::vec::IntoIter<i64>;
    fn into_iter(mut self) -> Self::IntoIter {
        let end = self.significant().len();
        self.cells.truncate(end);
        self.cells.into_iter()
    }
}

impl fmt::Debug for IntcodeMem {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "[{}] ({} cells allocated)",
            self.significant().iter().format(", "),
            self.cells.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_past_end_are_zero() {
        let mem: IntcodeMem = [1, 2, 3].into_iter().collect();
        assert_eq!(mem.get(2), 3);
        assert_eq!(mem.get(3), 0);
        assert_eq!(mem.get(1 << 40), 0);
        assert_eq!(mem.len(), 3, "reads must not grow memory");
    }

    #[test]
    fn writes_grow_by_doubling() {
        let mut mem: IntcodeMem = [1, 2, 3].into_iter().collect();
        mem.set(3, 4).unwrap();
        assert_eq!(mem.len(), 64);
        mem.set(64, 5).unwrap();
        assert_eq!(mem.len(), 128);
        mem.set(1000, 6).unwrap();
        assert_eq!(mem.len(), 1024);
        assert_eq!(mem.get_range(0..5).as_ref(), &[1, 2, 3, 4, 0]);
        assert_eq!(mem.get(64), 5);
        assert_eq!(mem.get(1000), 6);
    }

    #[test]
    fn equality_ignores_allocation() {
        let a: IntcodeMem = [1, 0, 2].into_iter().collect();
        let mut b: IntcodeMem = [1].into_iter().collect();
        b.set(2, 2).unwrap();
        b.set(500, 0).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.into_iter().collect::<Vec<_>>(), vec![1, 0, 2]);
    }

    #[test]
    fn unallocatable_growth_fails() {
        let mut mem: IntcodeMem = [1, 2, 3].into_iter().collect();
        assert_eq!(mem.set(1 << 60, 1), Err(OutOfMemory(1 << 60)));
        assert_eq!(mem.set(usize::MAX, 1), Err(OutOfMemory(usize::MAX)));
        assert_eq!(mem.len(), 3);
        mem.set(3, 4).unwrap();
        assert_eq!(mem.get_range(0..4).as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn range_past_end_is_padded() {
        let mem: IntcodeMem = [7, 8].into_iter().collect();
        assert!(matches!(mem.get_range(0..2), Cow::Borrowed(&[7, 8])));
        assert_eq!(mem.get_range(1..4).as_ref(), &[8, 0, 0]);
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn written_values_read_back(
                initial in prop::collection::vec(any::<i64>(), 0..64),
                writes in prop::collection::vec((0usize..100_000, any::<i64>()), 1..32),
            ) {
                let mut mem: IntcodeMem = initial.iter().copied().collect();
                let mut expected: std::collections::HashMap<usize, i64> =
                    initial.iter().copied().enumerate().collect();
                for &(address, value) in &writes {
                    mem.set(address, value).unwrap();
                    expected.insert(address, value);
                }
                for (&address, &value) in &expected {
                    prop_assert_eq!(mem.get(address), value);
                }
                prop_assert_eq!(mem.get(100_000), 0);
            }
        }
    }
}
