use crate::error::{Error, Result};
use crate::utils::{calculate_set_index, calculate_sets_count};

/// Matrix shape plus the direct-mapped cache it is laid out against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixGeometry {
    pub rows: usize,
    pub cols: usize,
    pub int_size: u64,
    pub cache_size: u64,
    pub block_size: u64,
}

impl MatrixGeometry {
    pub const DEFAULT_INT_SIZE: u64 = 4;
    pub const DEFAULT_CACHE_SIZE: u64 = 1024;
    pub const DEFAULT_BLOCK_SIZE: u64 = 32;

    pub fn new(rows: usize, cols: usize, int_size: u64, cache_size: u64, block_size: u64) -> Result<Self> {
        let geometry = MatrixGeometry { rows, cols, int_size, cache_size, block_size };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks the cache divides into whole blocks and that every element's
    /// byte offset fits in a `u64`. Returns the number of sets.
    pub fn validate(&self) -> Result<u64> {
        let sets_count = self.sets_count()?;
        let (rows, cols) = (self.rows, self.cols);
        if rows == 0 || cols == 0 {
            return Err(Error::geometry(format!("matrix must be non-empty, got {rows}x{cols}")));
        }
        (rows as u64)
            .checked_mul(cols as u64)
            .and_then(|cells| cells.checked_mul(self.int_size))
            .ok_or_else(|| {
                Error::geometry(format!(
                    "{rows}x{cols} elements of {} bytes overflow the address space",
                    self.int_size
                ))
            })?;
        Ok(sets_count)
    }

    pub fn sets_count(&self) -> Result<u64> {
        calculate_sets_count(self.cache_size, self.block_size)
    }

    pub fn default_title(&self, sets_count: u64) -> String {
        format!(
            "N={}, M={}, int={}B, cache={}B, block={}B ({} sets)",
            self.rows, self.cols, self.int_size, self.cache_size, self.block_size, sets_count
        )
    }
}

/// Row-major N x M grid of set indices, each in `0..sets_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetIndexGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u64>,
}

impl SetIndexGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    pub fn row(&self, row: usize) -> &[u64] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Cells in row-major order as `(row, col, set)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, &set)| (idx / cols, idx % cols, set))
    }
}

/// Computes the set touched by every element of the matrix.
pub fn compute(geometry: &MatrixGeometry) -> Result<(SetIndexGrid, u64)> {
    let sets_count = geometry.validate()?;
    let total = geometry.rows as u64 * geometry.cols as u64;

    let cells = (0..total)
        .map(|linear_idx| calculate_set_index(linear_idx, geometry.int_size, geometry.block_size, sets_count))
        .collect();

    tracing::debug!(
        rows = geometry.rows,
        cols = geometry.cols,
        sets_count,
        "Computed set-index grid"
    );

    Ok((SetIndexGrid { rows: geometry.rows, cols: geometry.cols, cells }, sets_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_layout() {
        let geometry = MatrixGeometry::new(8, 16, 4, 1024, 32).unwrap();
        let (grid, sets_count) = compute(&geometry).unwrap();
        assert_eq!(sets_count, 32);
        assert_eq!(grid.rows(), 8);
        assert_eq!(grid.cols(), 16);
        assert_eq!(grid.get(0, 0), Some(0));
        assert_eq!(grid.get(7, 15), Some(15));
        // eight 4-byte ints per 32-byte block
        assert_eq!(grid.row(0), &[0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(grid.get(8, 0), None);
    }

    #[test]
    fn rejects_ragged_cache() {
        let err = MatrixGeometry::new(4, 4, 4, 1000, 32).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
    }

    #[test]
    fn rejects_offsets_past_u64() {
        let err = MatrixGeometry::new(1, 3, u64::MAX / 2 + 1, 1024, 32).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));

        let literal = MatrixGeometry { rows: 1, cols: 3, int_size: u64::MAX / 2 + 1, cache_size: 1024, block_size: 32 };
        assert!(compute(&literal).is_err());
    }

    #[test]
    fn rejects_empty_matrix() {
        assert!(MatrixGeometry::new(0, 4, 4, 1024, 32).is_err());
    }

    #[test]
    fn default_title_mentions_sets() {
        let geometry = MatrixGeometry::new(8, 16, 4, 1024, 32).unwrap();
        assert_eq!(
            geometry.default_title(32),
            "N=8, M=16, int=4B, cache=1024B, block=32B (32 sets)"
        );
    }
}
