//! Seam detection across the four grid boundaries.
//!
//! A grid is enclosed when its first and last rows glue (or both pinch to points)
//! and likewise its first and last columns. Glued boundary vertices are recorded in
//! an [`AliasTable`] rather than rewritten in place; the table is resolved once when
//! faces are finalized.

use super::core::Point3;
use super::triangulation::QuadGrid;

/// Index redirection table built while gluing seams.
///
/// Every entry starts as its own root. Chains are followed on lookup, so a corner
/// glued by both seams ends up at a single representative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    parent: Vec<u32>,
}

impl AliasTable {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn identity(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Final representative of `index`.
    #[must_use]
    pub fn resolve(&self, mut index: u32) -> u32 {
        while let Some(&next) = self.parent.get(index as usize) {
            if next == index {
                break;
            }
            index = next;
        }
        index
    }

    /// Redirects `from` onto `to`. Returns `false` when both already resolve to the
    /// same vertex.
    pub fn alias(&mut self, from: u32, to: u32) -> bool {
        let from_root = self.resolve(from);
        let to_root = self.resolve(to);
        if from_root == to_root {
            return false;
        }
        self.parent[from_root as usize] = to_root;
        true
    }

    /// `true` when no index has been redirected.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.parent
            .iter()
            .enumerate()
            .all(|(i, &p)| p as usize == i)
    }
}

/// Outcome of seam detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureReport {
    pub enclosed: bool,
    /// Vertices redirected onto their seam partner.
    pub glued_vertices: usize,
    /// Columns whose first-row/last-row boundary neither glued nor pinched.
    pub open_columns: usize,
    /// Rows whose first-column/last-column boundary neither glued nor pinched.
    pub open_rows: usize,
}

/// Compares the first and last row of faces column by column, then the first and
/// last column row by row, gluing coincident boundary vertices into `aliases`.
pub fn detect_closure(grid: &QuadGrid, vertices: &[Point3], aliases: &mut AliasTable) -> ClosureReport {
    let mut report = ClosureReport {
        enclosed: true,
        ..ClosureReport::default()
    };
    if grid.rows == 0 || grid.cols == 0 {
        report.enclosed = false;
        return report;
    }

    let last_row = grid.rows - 1;
    for j in 0..grid.cols {
        let first = grid.face(0, j).indices;
        let last = grid.face(last_row, j).indices;
        if !glue_boundary(vertices, aliases, &mut report, [first[0], first[1]], [last[3], last[2]]) {
            report.open_columns += 1;
        }
    }

    let last_col = grid.cols - 1;
    for i in 0..grid.rows {
        let first = grid.face(i, 0).indices;
        let last = grid.face(i, last_col).indices;
        if !glue_boundary(vertices, aliases, &mut report, [first[0], first[3]], [last[1], last[2]]) {
            report.open_rows += 1;
        }
    }

    if !report.enclosed {
        log::debug!(
            "surface open: {} columns and {} rows failed to glue",
            report.open_columns,
            report.open_rows
        );
    }
    report
}

/// Glues one boundary edge of the leading side to the matching edge of the trailing
/// side. Returns `false` (and clears `enclosed`) when the edges neither coincide nor
/// are both pinched to a point.
///
/// Pinching is tested on point coordinates, not on indices. A collapsed pole edge
/// shares one index, but a boundary cell whose corner 2 collapsed onto corner 1 keeps
/// two indices on the same point along its bottom edge, and that still counts.
fn glue_boundary(
    vertices: &[Point3],
    aliases: &mut AliasTable,
    report: &mut ClosureReport,
    lead: [u32; 2],
    trail: [u32; 2],
) -> bool {
    let same = |a: u32, b: u32| vertices[a as usize].coincident(vertices[b as usize]);

    let mut glued = true;
    for (from, to) in [(trail[0], lead[0]), (trail[1], lead[1])] {
        if same(from, to) {
            if aliases.alias(from, to) {
                report.glued_vertices += 1;
            }
        } else {
            glued = false;
        }
    }

    if glued || (same(lead[0], lead[1]) && same(trail[0], trail[1])) {
        return true;
    }
    report.enclosed = false;
    false
}
