//! Quad assembly over an evaluated grid, with exact-coincidence edge collapsing.
//!
//! Each cell `(i, j)` gets one face. Corner 0 is top-left, 1 top-right, 2
//! bottom-right and 3 bottom-left. Only corner 2 is always a fresh grid vertex;
//! the other corners are taken from the cell above or to the left whenever one
//! exists, so an index rewritten by a collapse flows into every later cell that
//! shares the corner.

use super::core::Point3;
use super::mesh::{CancelFlag, Face, MeshBuildError};

/// Which corner pair of a cell was found coincident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapse {
    /// Corners 0 and 1, tested on the first grid row only.
    Top,
    /// Corners 0 and 3, tested on the first grid column only.
    Left,
    /// Corners 1 and 2.
    Right,
    /// Corners 3 and 2.
    Bottom,
}

impl Collapse {
    pub const ALL: [Self; 4] = [Self::Top, Self::Left, Self::Right, Self::Bottom];

    /// `(kept, rewritten)` corner slots.
    #[must_use]
    pub const fn corners(self) -> (usize, usize) {
        match self {
            Self::Top => (0, 1),
            Self::Left => (0, 3),
            Self::Right => (1, 2),
            Self::Bottom => (3, 2),
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Top => 1,
            Self::Left => 2,
            Self::Right => 4,
            Self::Bottom => 8,
        }
    }
}

/// Collapses applied to one cell, at most one per rewritten slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseSet(u8);

impl CollapseSet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, collapse: Collapse) {
        self.0 |= collapse.bit();
    }

    #[must_use]
    pub const fn contains(self, collapse: Collapse) -> bool {
        self.0 & collapse.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Collapse> {
        Collapse::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl<const N: usize> From<[Collapse; N]> for CollapseSet {
    fn from(collapses: [Collapse; N]) -> Self {
        let mut set = Self::EMPTY;
        for c in collapses {
            set.insert(c);
        }
        set
    }
}

/// Result of assembling every cell of a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadGrid {
    pub rows: usize,
    pub cols: usize,
    pub faces: Vec<Face>,
    /// Cells demoted to triangles during assembly.
    pub collapsed_cells: usize,
    /// Corner indices actually rewritten by a collapse.
    pub welded_vertices: usize,
}

impl QuadGrid {
    /// Face of cell `(i, j)`.
    #[must_use]
    pub fn face(&self, i: usize, j: usize) -> &Face {
        &self.faces[i * self.cols + j]
    }

    #[must_use]
    pub fn raw_corners(&self, i: usize, j: usize) -> [u32; 4] {
        raw_corners(i, j, self.cols)
    }
}

/// Grid vertex indices of cell `(i, j)` before any reuse or collapse.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn raw_corners(i: usize, j: usize, cols: usize) -> [u32; 4] {
    let stride = cols + 1;
    let top = (i * stride + j) as u32;
    let bottom = top + stride as u32;
    [top, top + 1, bottom + 1, bottom]
}

/// Tests the cell's corner pairs and collapses every coincident one that rewrites a
/// fresh corner.
///
/// Top (first row) and Left (first column) are each checked on their own. Then
/// Right is tested, and Bottom only when Right did not match; both rewrite corner 2.
/// Each rewritten slot receives the kept slot's current index.
pub fn collapse_cell(
    corners: &mut [u32; 4],
    vertices: &[Point3],
    first_row: bool,
    first_col: bool,
) -> CollapseSet {
    let same = |a: u32, b: u32| vertices[a as usize].coincident(vertices[b as usize]);
    let mut applied = CollapseSet::EMPTY;
    let mut apply = |corners: &mut [u32; 4], hit: Collapse| {
        let (keep, drop) = hit.corners();
        corners[drop] = corners[keep];
        applied.insert(hit);
    };

    if first_row && same(corners[0], corners[1]) {
        apply(corners, Collapse::Top);
    }
    if first_col && same(corners[0], corners[3]) {
        apply(corners, Collapse::Left);
    }
    if same(corners[1], corners[2]) {
        apply(corners, Collapse::Right);
    } else if same(corners[3], corners[2]) {
        apply(corners, Collapse::Bottom);
    }
    applied
}

/// Allocates and wires one face per cell of a `rows x cols` grid whose vertices are
/// already evaluated into `vertices` (row-major, `(rows + 1) * (cols + 1)` entries).
///
/// `faces` is a preallocated, empty buffer; it is filled in cell order `i * cols + j`
/// and handed back inside the returned [`QuadGrid`].
#[allow(clippy::cast_possible_truncation)]
pub fn assemble_quads(
    vertices: &[Point3],
    rows: usize,
    cols: usize,
    cancel: &CancelFlag,
    mut faces: Vec<Face>,
) -> Result<QuadGrid, MeshBuildError> {
    let stride = cols + 1;
    debug_assert_eq!(vertices.len(), (rows + 1) * stride);
    debug_assert!(faces.is_empty());

    let mut collapsed_cells = 0;
    let mut welded_vertices = 0;

    for i in 0..rows {
        if cancel.is_cancelled() {
            return Err(MeshBuildError::BuildAborted { stage: "assembly" });
        }
        for j in 0..cols {
            let ix = i * cols + j;

            let c0 = match (i, j) {
                (0, 0) => 0,
                (0, _) => faces[ix - 1].indices[1],
                _ => faces[ix - cols].indices[3],
            };
            let c1 = if i == 0 {
                (j + 1) as u32
            } else {
                faces[ix - cols].indices[2]
            };
            let c3 = if j == 0 {
                ((i + 1) * stride) as u32
            } else {
                faces[ix - 1].indices[2]
            };
            let c2 = ((i + 1) * stride + j + 1) as u32;

            let fresh = [c0, c1, c2, c3];
            let mut corners = fresh;
            let applied = collapse_cell(&mut corners, vertices, i == 0, j == 0);
            let face = if applied.is_empty() {
                Face::quad(fresh)
            } else {
                welded_vertices += (0..4).filter(|&k| fresh[k] != corners[k]).count();
                log::trace!("cell ({i}, {j}) collapsed {applied:?}");
                collapsed_cells += 1;
                Face {
                    n: 3,
                    indices: corners,
                }
            };
            faces.push(face);
        }
    }

    Ok(QuadGrid {
        rows,
        cols,
        faces,
        collapsed_cells,
        welded_vertices,
    })
}

/// Reduces a corner ring to its distinct indices in cyclic order.
///
/// Consecutive repeats are dropped, then a closing repeat of the first index. The
/// result is a quad, a triangle stored as `[a, b, c, c]`, or `None` when fewer than
/// three distinct indices remain or a non-adjacent pair still repeats.
#[must_use]
pub fn normalize_ring(corners: [u32; 4]) -> Option<Face> {
    let mut ring: Vec<u32> = Vec::with_capacity(4);
    for idx in corners {
        if ring.last() != Some(&idx) {
            ring.push(idx);
        }
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    match *ring.as_slice() {
        [a, b, c, d] if a != c && b != d => Some(Face::quad([a, b, c, d])),
        [a, b, c] => Some(Face::triangle([a, b, c])),
        _ => None,
    }
}
