//! Parameter grids and grid evaluation.
//!
//! A [`ParamGrid`] is the pair of ordered parameter sequences a mesh is sampled on:
//! `urange` selects grid rows and `vrange` selects grid columns. Evaluating a grid
//! fills a vertex buffer in row-major order, so grid vertex `(i, j)` lands at index
//! `i * (cols + 1) + j`.
//!
//! # Example
//!
//! ```ignore
//! use ghx_surface_mesh::geom::{ParamGrid, segments_for_length};
//!
//! let u_segments = segments_for_length(2.0, 0.25, 2, 64); // 8
//! let grid = ParamGrid::uniform((0.0, 1.0), u_segments, (0.0, 1.0), 4);
//! assert_eq!((grid.rows(), grid.cols()), (8, 4));
//! ```

use super::core::Point3;
use super::mesh::{CancelFlag, MeshBuildError};
use super::surface::SurfaceEvaluator;

/// Per-axis sample count bounds used by the built-in grid policies.
///
/// Counts are segment counts (cells per axis), not sample counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    /// Lower bound on cells along `u`.
    pub min_u_count: usize,
    /// Upper bound on cells along `u`.
    pub max_u_count: usize,
    /// Lower bound on cells along `v`.
    pub min_v_count: usize,
    /// Upper bound on cells along `v`.
    pub max_v_count: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            min_u_count: 2,
            max_u_count: 256,
            min_v_count: 2,
            max_v_count: 256,
        }
    }
}

impl GridOptions {
    #[must_use]
    pub const fn new(min_count: usize, max_count: usize) -> Self {
        Self {
            min_u_count: min_count,
            max_u_count: max_count,
            min_v_count: min_count,
            max_v_count: max_count,
        }
    }
}

/// Number of segments needed so that `length / segments <= ds`, clamped to
/// `[min_count, max_count]` with at least one segment.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn segments_for_length(length: f64, ds: f64, min_count: usize, max_count: usize) -> usize {
    let min_count = min_count.max(1);
    let max_count = max_count.max(min_count);
    if !length.is_finite() || length <= 0.0 || !ds.is_finite() || ds <= 0.0 {
        return min_count;
    }
    let wanted = (length / ds).ceil();
    if wanted >= max_count as f64 {
        return max_count;
    }
    (wanted as usize).clamp(min_count, max_count)
}

/// `segments + 1` evenly spaced values; the last one is `end` exactly.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn uniform_params(start: f64, end: f64, segments: usize) -> Vec<f64> {
    let segments = segments.max(1);
    let span = end - start;
    let mut values: Vec<f64> = (0..segments)
        .map(|k| start + span * (k as f64 / segments as f64))
        .collect();
    values.push(end);
    values
}

/// The `(u, v)` samples a mesh is built on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    urange: Vec<f64>,
    vrange: Vec<f64>,
}

/// Bit-exact identity of a [`ParamGrid`], used to decide whether a committed mesh
/// still matches a requested grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridKey {
    u_bits: Vec<u64>,
    v_bits: Vec<u64>,
}

impl ParamGrid {
    /// Builds a grid from any numeric sequences; values are converted to `f64`.
    pub fn new<U, V>(urange: U, vrange: V) -> Self
    where
        U: IntoIterator,
        U::Item: Into<f64>,
        V: IntoIterator,
        V::Item: Into<f64>,
    {
        Self {
            urange: urange.into_iter().map(Into::into).collect(),
            vrange: vrange.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn uniform(u_domain: (f64, f64), u_segments: usize, v_domain: (f64, f64), v_segments: usize) -> Self {
        Self {
            urange: uniform_params(u_domain.0, u_domain.1, u_segments),
            vrange: uniform_params(v_domain.0, v_domain.1, v_segments),
        }
    }

    #[must_use]
    pub fn urange(&self) -> &[f64] {
        &self.urange
    }

    #[must_use]
    pub fn vrange(&self) -> &[f64] {
        &self.vrange
    }

    /// Cell rows (`n`).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.urange.len().saturating_sub(1)
    }

    /// Cell columns (`m`).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.vrange.len().saturating_sub(1)
    }

    /// `(n + 1) * (m + 1)`.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.urange.len() * self.vrange.len()
    }

    /// `n * m`.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    #[must_use]
    pub fn key(&self) -> GridKey {
        GridKey {
            u_bits: self.urange.iter().map(|v| v.to_bits()).collect(),
            v_bits: self.vrange.iter().map(|v| v.to_bits()).collect(),
        }
    }

    /// Checks that the grid has at least one cell per axis, only finite values, and
    /// few enough vertices to be addressed with `u32` indices.
    pub fn validate(&self) -> Result<(), MeshBuildError> {
        if self.urange.len() < 2 {
            return Err(MeshBuildError::InvalidGrid(format!(
                "urange needs at least 2 values, got {}",
                self.urange.len()
            )));
        }
        if self.vrange.len() < 2 {
            return Err(MeshBuildError::InvalidGrid(format!(
                "vrange needs at least 2 values, got {}",
                self.vrange.len()
            )));
        }
        if let Some(bad) = self.urange.iter().find(|v| !v.is_finite()) {
            return Err(MeshBuildError::InvalidGrid(format!("non-finite u value {bad}")));
        }
        if let Some(bad) = self.vrange.iter().find(|v| !v.is_finite()) {
            return Err(MeshBuildError::InvalidGrid(format!("non-finite v value {bad}")));
        }
        if u32::try_from(self.vertex_count()).is_err() {
            return Err(MeshBuildError::InvalidGrid(format!(
                "{} vertices exceed the u32 index range",
                self.vertex_count()
            )));
        }
        Ok(())
    }
}

/// Evaluates every `(u, v)` pair of `grid`, outer over `urange`, inner over `vrange`,
/// appending to `vertices`. The cancel flag is polled before each row.
pub fn evaluate_grid(
    evaluator: &dyn SurfaceEvaluator,
    grid: &ParamGrid,
    cancel: &CancelFlag,
    vertices: &mut Vec<Point3>,
) -> Result<(), MeshBuildError> {
    for &u in grid.urange() {
        if cancel.is_cancelled() {
            return Err(MeshBuildError::BuildAborted { stage: "evaluation" });
        }
        for &v in grid.vrange() {
            let point = match evaluator.evaluate(u, v) {
                Ok(point) => point,
                Err(err) if err.is_invalid_result() => {
                    return Err(MeshBuildError::InvalidResult {
                        u,
                        v,
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    return Err(MeshBuildError::EvaluationFailed {
                        u,
                        v,
                        message: err.to_string(),
                    });
                }
            };
            if !point.is_finite() {
                return Err(MeshBuildError::InvalidResult {
                    u,
                    v,
                    reason: format!("non-finite coordinate in ({}, {}, {})", point.x, point.y, point.z),
                });
            }
            vertices.push(point);
        }
    }
    Ok(())
}
