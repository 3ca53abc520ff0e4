//! Board geometry as data: each geometry is a precomputed neighbor-offset
//! table over a flat cell vector, built once per process and served by
//! reference. Positions are parameterized by a `&'static Geometry` instead
//! of a board class hierarchy, so cloning a position never clones geometry
//! and the hot neighbor lookups are plain array reads.

use once_cell::sync::Lazy;

use super::cell::CellId;
use super::Variant;

/// Upper bound on per-cell neighbor links across all geometries.
pub const MAX_NEIGHBORS: usize = 8;

/// Compass directions for square geometry. Rows grow to the north.
pub mod dir {
    pub const N: usize = 0;
    pub const NE: usize = 1;
    pub const E: usize = 2;
    pub const SE: usize = 3;
    pub const S: usize = 4;
    pub const SW: usize = 5;
    pub const W: usize = 6;
    pub const NW: usize = 7;

    pub const SQUARE_DIAGONALS: [usize; 4] = [NE, SE, SW, NW];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Square,
    Hex,
}

#[derive(Debug)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub cols: u8,
    pub rows: u8,
    dir_count: usize,
    neighbors: Vec<[Option<CellId>; MAX_NEIGHBORS]>,
}

impl Geometry {
    /// A square grid with all eight compass links populated.
    pub fn square(cols: u8, rows: u8) -> Self {
        let offsets: [(i16, i16); 8] = [
            (0, 1),   // N
            (1, 1),   // NE
            (1, 0),   // E
            (1, -1),  // SE
            (0, -1),  // S
            (-1, -1), // SW
            (-1, 0),  // W
            (-1, 1),  // NW
        ];
        Self::build(GeometryKind::Square, cols, rows, &offsets)
    }

    /// A hex rhombus in axial coordinates: six links per cell.
    pub fn hex(cols: u8, rows: u8) -> Self {
        let offsets: [(i16, i16); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];
        Self::build(GeometryKind::Hex, cols, rows, &offsets)
    }

    fn build(kind: GeometryKind, cols: u8, rows: u8, offsets: &[(i16, i16)]) -> Self {
        let mut neighbors = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows as i16 {
            for col in 0..cols as i16 {
                let mut links = [None; MAX_NEIGHBORS];
                for (dir, &(dc, dr)) in offsets.iter().enumerate() {
                    let (nc, nr) = (col + dc, row + dr);
                    if nc >= 0 && nc < cols as i16 && nr >= 0 && nr < rows as i16 {
                        links[dir] = Some(CellId((nr * cols as i16 + nc) as u16));
                    }
                }
                neighbors.push(links);
            }
        }
        Self {
            kind,
            cols,
            rows,
            dir_count: offsets.len(),
            neighbors,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn dir_count(&self) -> usize {
        self.dir_count
    }

    pub fn cell_at(&self, col: u8, row: u8) -> Option<CellId> {
        if col < self.cols && row < self.rows {
            Some(CellId(row as u16 * self.cols as u16 + col as u16))
        } else {
            None
        }
    }

    pub fn col_row(&self, cell: CellId) -> (u8, u8) {
        let cols = self.cols as u16;
        ((cell.0 % cols) as u8, (cell.0 / cols) as u8)
    }

    pub fn neighbor(&self, cell: CellId, dir: usize) -> Option<CellId> {
        self.neighbors[cell.index()][dir]
    }

    pub fn neighbors(&self, cell: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.neighbors[cell.index()][..self.dir_count]
            .iter()
            .flatten()
            .copied()
    }

    /// Human-readable name for a cell, e.g. "C3". Also the wire form.
    pub fn cell_name(&self, cell: CellId) -> String {
        let (col, row) = self.col_row(cell);
        format!("{}{}", (b'A' + col) as char, row + 1)
    }
}

static SQUARE_8: Lazy<Geometry> = Lazy::new(|| Geometry::square(8, 8));
static HEX_11: Lazy<Geometry> = Lazy::new(|| Geometry::hex(11, 11));

/// Geometry registry: constructed on first use, immutable afterwards.
pub fn for_variant(variant: Variant) -> &'static Geometry {
    match variant {
        Variant::Checkers => &SQUARE_8,
        Variant::Hex => &HEX_11,
    }
}
