use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use super::closure::AliasTable;
use super::core::Point3;
use super::metrics::GeomMetrics;
use super::triangulation::{QuadGrid, normalize_ring, raw_corners};

/// Errors that abort a mesh build. The surface is left empty whenever one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshBuildError {
    #[error("no evaluation function configured")]
    NoEvaluator,
    #[error("no grid policy configured")]
    NoGridPolicy,
    #[error("invalid result at (u={u}, v={v}): {reason}")]
    InvalidResult { u: f64, v: f64, reason: String },
    #[error("evaluation failed at (u={u}, v={v}): {message}")]
    EvaluationFailed { u: f64, v: f64, message: String },
    #[error("build aborted during {stage}")]
    BuildAborted { stage: &'static str },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("invalid resolution ds={ds}")]
    InvalidResolution { ds: f64 },
}

/// Cooperative cancellation signal shared between a build and its caller.
///
/// Clones observe the same flag, so one clone can be handed to another thread while
/// the build polls the other.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-build collaborators: the cancellation signal and timing hooks.
#[derive(Debug, Default)]
pub struct GeomContext {
    pub cancel: CancelFlag,
    pub metrics: GeomMetrics,
}

impl GeomContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancel(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            metrics: GeomMetrics::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Faces and committed meshes
// ─────────────────────────────────────────────────────────────────────────────

/// A polygon over the vertex buffer: `n` is 3 or 4 and `indices` always has four
/// slots. Triangles repeat their third index in slot 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Face {
    pub n: u8,
    pub indices: [u32; 4],
}

impl Face {
    #[must_use]
    pub const fn quad(indices: [u32; 4]) -> Self {
        Self { n: 4, indices }
    }

    #[must_use]
    pub const fn triangle([a, b, c]: [u32; 3]) -> Self {
        Self {
            n: 3,
            indices: [a, b, c, c],
        }
    }

    #[must_use]
    pub const fn is_triangle(&self) -> bool {
        self.n == 3
    }

    /// The meaningful slots (`n` of them).
    #[must_use]
    pub fn corners(&self) -> &[u32] {
        &self.indices[..usize::from(self.n)]
    }
}

/// Vertices, faces and the enclosed flag of one successful build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Face>,
    pub enclosed: bool,
}

impl SurfaceMesh {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Stride-4 index count (`4 * face_count`).
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.faces.len() * 4
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().filter(|f| f.is_triangle()).count()
    }

    /// Checks the structural invariants of a committed mesh: every face has 3 or 4
    /// slots, those slots are distinct, in range, and a triangle repeats slot 2.
    pub fn validate(&self) -> Result<(), String> {
        let vcount = self.vertices.len();
        for (ix, face) in self.faces.iter().enumerate() {
            if face.n != 3 && face.n != 4 {
                return Err(format!("face {ix} has {} sides", face.n));
            }
            let corners = face.corners();
            if let Some(bad) = face.indices.iter().find(|&&v| v as usize >= vcount) {
                return Err(format!("face {ix} references vertex {bad} of {vcount}"));
            }
            for (a, &ia) in corners.iter().enumerate() {
                if corners[a + 1..].contains(&ia) {
                    return Err(format!("face {ix} repeats vertex {ia}"));
                }
            }
            if face.is_triangle() && face.indices[3] != face.indices[2] {
                return Err(format!("triangle {ix} does not repeat slot 2"));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn to_output(&self) -> MeshOutput {
        MeshOutput {
            vertices: self.vertices.iter().map(|p| p.to_array()).collect(),
            faces: self.faces.clone(),
            enclosed: self.enclosed,
        }
    }
}

/// Serializable snapshot of a mesh for hosts outside the crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshOutput {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Face>,
    pub enclosed: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Post-pass and compaction
// ─────────────────────────────────────────────────────────────────────────────

/// Face shape totals after the post-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceStats {
    pub quads: usize,
    pub triangles: usize,
    /// Faces left with fewer than three distinct indices that had grid corners
    /// restored.
    pub fallback_faces: usize,
}

/// Resolves seam aliases on every face and reorders corners so that the distinct
/// indices occupy the leading slots in the cell's cyclic order.
pub fn finalize_faces(grid: QuadGrid, aliases: &AliasTable) -> (Vec<Face>, FaceStats) {
    let mut stats = FaceStats::default();
    let QuadGrid { cols, mut faces, .. } = grid;

    for (ix, face) in faces.iter_mut().enumerate() {
        let resolved = face.indices.map(|v| aliases.resolve(v));
        *face = if let Some(normalized) = normalize_ring(resolved) {
            normalized
        } else {
            let (i, j) = (ix / cols, ix % cols);
            let raw = raw_corners(i, j, cols);
            stats.fallback_faces += 1;
            if let Some(restored) = restore_one_corner(resolved, raw, aliases) {
                log::warn!("cell ({i}, {j}) collapsed below three distinct vertices; restored one grid corner");
                restored
            } else {
                log::warn!("cell ({i}, {j}) collapsed below three distinct vertices; keeping raw grid quad");
                Face::quad(raw)
            }
        };
        if face.is_triangle() {
            stats.triangles += 1;
        } else {
            stats.quads += 1;
        }
    }

    (faces, stats)
}

/// Puts back the grid vertex of a single rewritten slot, preferring its seam
/// representative, so a zero-area cell keeps as few duplicate points as possible.
fn restore_one_corner(resolved: [u32; 4], raw: [u32; 4], aliases: &AliasTable) -> Option<Face> {
    (0..4)
        .filter(|&slot| resolved[slot] != raw[slot])
        .flat_map(|slot| [(slot, aliases.resolve(raw[slot])), (slot, raw[slot])])
        .find_map(|(slot, index)| {
            let mut corners = resolved;
            corners[slot] = index;
            normalize_ring(corners)
        })
}

/// Drops vertices no face references and renumbers the rest densely, keeping their
/// relative order. Returns the number of vertices removed.
pub fn compact_vertices(vertices: &mut Vec<Point3>, faces: &mut [Face]) -> usize {
    const UNUSED: u32 = u32::MAX;

    let mut remap = vec![UNUSED; vertices.len()];
    for face in faces.iter() {
        for &v in &face.indices {
            remap[v as usize] = 0;
        }
    }

    let mut next = 0_u32;
    let mut write = 0;
    for read in 0..vertices.len() {
        if remap[read] == UNUSED {
            continue;
        }
        remap[read] = next;
        vertices[write] = vertices[read];
        next += 1;
        write += 1;
    }

    let removed = vertices.len() - write;
    vertices.truncate(write);
    vertices.shrink_to_fit();

    for face in faces.iter_mut() {
        for v in &mut face.indices {
            *v = remap[*v as usize];
        }
    }
    removed
}
