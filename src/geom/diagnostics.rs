//! Per-build diagnostics.
//!
//! Every successful build of a [`MeshedSurface`](super::MeshedSurface) records what
//! the pipeline did: how many cells degraded to triangles, how many vertices were
//! welded or glued across seams, how many were compacted away, and whether any face
//! needed grid corners restored.
//!
//! ```ignore
//! surface.ensure_triangulated(None)?;
//! if let Some(diag) = surface.diagnostics() {
//!     log::debug!("{}", diag.summary());
//! }
//! ```

use std::fmt;

use super::metrics::GeomTimingReport;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshBuildDiagnostics {
    /// Grid cell rows (`n`).
    pub rows: usize,
    /// Grid cell columns (`m`).
    pub cols: usize,

    /// Vertices left after compaction.
    pub vertex_count: usize,
    pub quad_count: usize,
    pub triangle_count: usize,

    /// Corner indices rewritten by per-cell edge collapses.
    pub welded_vertex_count: usize,

    /// Boundary vertices redirected onto their partner across a seam.
    pub glued_vertex_count: usize,

    /// Vertices dropped by compaction.
    pub removed_vertex_count: usize,

    /// Faces that kept fewer than three distinct vertices and had grid corners
    /// restored. Non-zero values point at a surface that folds onto itself
    /// inside a single cell.
    pub fallback_face_count: usize,

    pub enclosed: bool,

    /// Only populated with `mesh_engine_metrics` on a non-WASM target.
    pub timing: Option<GeomTimingReport>,

    pub warnings: Vec<String>,
}

impl MeshBuildDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.quad_count + self.triangle_count
    }

    /// `true` when no fallback was needed and nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fallback_face_count == 0 && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// One-line summary for logs, e.g. `"grid:8x16 V:128 Q:112 T:16 welded:16 enclosed"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "grid:{}x{} V:{} Q:{} T:{}",
            self.rows, self.cols, self.vertex_count, self.quad_count, self.triangle_count
        )];

        if self.welded_vertex_count > 0 {
            parts.push(format!("welded:{}", self.welded_vertex_count));
        }
        if self.glued_vertex_count > 0 {
            parts.push(format!("glued:{}", self.glued_vertex_count));
        }
        if self.removed_vertex_count > 0 {
            parts.push(format!("removed:{}", self.removed_vertex_count));
        }
        if self.fallback_face_count > 0 {
            parts.push(format!("fallback:{}", self.fallback_face_count));
        }
        parts.push(if self.enclosed { "enclosed" } else { "open" }.to_string());

        parts.join(" ")
    }
}

impl fmt::Display for MeshBuildDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Grid: {} x {} cells", self.rows, self.cols)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {} quads, {} triangles", self.quad_count, self.triangle_count)?;
        writeln!(f, "  Enclosed: {}", self.enclosed)?;

        if self.welded_vertex_count > 0 || self.glued_vertex_count > 0 || self.removed_vertex_count > 0 {
            writeln!(f, "  Welding:")?;
            if self.welded_vertex_count > 0 {
                writeln!(f, "    - Collapsed corners: {}", self.welded_vertex_count)?;
            }
            if self.glued_vertex_count > 0 {
                writeln!(f, "    - Seam vertices glued: {}", self.glued_vertex_count)?;
            }
            if self.removed_vertex_count > 0 {
                writeln!(f, "    - Vertices compacted away: {}", self.removed_vertex_count)?;
            }
        }

        if self.fallback_face_count > 0 {
            writeln!(f, "  Fallback faces: {}", self.fallback_face_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(timing) = &self.timing {
            writeln!(f, "  Timing: {:.3} ms", timing.total_ms())?;
        }

        Ok(())
    }
}
