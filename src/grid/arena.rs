//! Fixed-size double buffer backing a map.

use super::GridCell;

/// Counts from one [`CellArena::reindex`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReindexStats {
    pub moved: usize,
    pub merged: usize,
    pub dropped: usize,
}

/// Active cells plus an equally sized scratch buffer.
///
/// Both buffers are allocated once; re-indexing writes the scratch buffer
/// and then swaps it in, so the active buffer is never partially rewritten.
#[derive(Debug, Clone)]
pub struct CellArena {
    active: Vec<GridCell>,
    scratch: Vec<GridCell>,
}

impl CellArena {
    pub fn new(len: usize) -> Self {
        Self {
            active: vec![GridCell::EMPTY; len],
            scratch: vec![GridCell::EMPTY; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.active
    }

    pub fn cells_mut(&mut self) -> &mut [GridCell] {
        &mut self.active
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&GridCell> {
        self.active.get(idx)
    }

    pub fn reset(&mut self) {
        self.active.fill(GridCell::EMPTY);
    }

    /// Rebuild the active buffer, moving every populated cell to `new_index(old_index, cell)`.
    ///
    /// Cells whose new index is `None` or out of range are dropped. Cells that
    /// collide are merged with [`GridCell::merge`].
    pub fn reindex<F>(&mut self, mut new_index: F) -> ReindexStats
    where
        F: FnMut(usize, &GridCell) -> Option<usize>,
    {
        let mut stats = ReindexStats::default();
        self.scratch.fill(GridCell::EMPTY);

        for (idx, cell) in self.active.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let Some(dst) = new_index(idx, cell).and_then(|i| self.scratch.get_mut(i)) else {
                stats.dropped += 1;
                continue;
            };
            if dst.is_empty() {
                *dst = *cell;
                stats.moved += 1;
            } else {
                dst.merge(cell);
                stats.merged += 1;
            }
        }

        std::mem::swap(&mut self.active, &mut self.scratch);
        stats
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;

    fn populated(len: usize, at: &[usize]) -> CellArena {
        let mut arena = CellArena::new(len);
        for &i in at {
            arena.cells_mut()[i].observe(IVec2::new(i as i32 * 10, 0));
            arena.cells_mut()[i].add_vacancy(4);
        }
        arena
    }

    #[test]
    fn reindex_moves_merges_and_drops() {
        let mut arena = populated(4, &[0, 1, 3]);
        // x=0 -> 2, x=10 -> 2 (collision), x=30 -> out of range
        let stats = arena.reindex(|_, cell| Some(if cell.position.x == 30 { 9 } else { 2 }));

        assert_eq!(
            stats,
            ReindexStats {
                moved: 1,
                merged: 1,
                dropped: 1
            }
        );
        assert!(arena.cells()[0].is_empty());
        assert_eq!(arena.cells()[2].position, IVec2::new(5, 0));
        assert_eq!(arena.cells().iter().filter(|c| !c.is_empty()).count(), 1);
    }

    #[test]
    fn identity_reindex_is_lossless() {
        let mut arena = populated(6, &[1, 4]);
        let before = arena.cells().to_vec();
        arena.reindex(|_, cell| Some(cell.position.x as usize / 10));
        assert_eq!(arena.cells(), before.as_slice());
    }

    #[test]
    fn reindex_by_old_index_shifts_content() {
        let mut arena = populated(6, &[1, 4, 5]);
        let before = arena.cells().to_vec();
        let stats = arena.reindex(|idx, _| idx.checked_sub(1));

        assert_eq!(stats.merged, 0);
        assert_eq!(stats.moved, 3);
        assert_eq!(arena.cells()[0], before[1]);
        assert_eq!(arena.cells()[3], before[4]);
        assert_eq!(arena.cells()[4], before[5]);
        assert!(arena.cells()[5].is_empty());
    }

    #[test]
    fn reset_clears_cells() {
        let mut arena = populated(3, &[0, 2]);
        arena.reset();
        assert!(arena.cells().iter().all(GridCell::is_empty));
    }
}
