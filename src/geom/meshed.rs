//! The meshed surface: capabilities, committed mesh and the transactional build.
//!
//! A build runs the whole pipeline into scratch buffers:
//!
//! 1. evaluate the grid into a row-major vertex buffer,
//! 2. assemble one face per cell, collapsing coincident corners,
//! 3. glue seams and decide whether the surface is enclosed,
//! 4. resolve aliases and reorder degenerate faces,
//! 5. compact unreferenced vertices.
//!
//! Only a build that finishes every stage replaces the committed mesh. Any error
//! leaves the surface empty with no committed grid.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use super::cache::{GridCache, MeshCacheStats};
use super::closure::{AliasTable, detect_closure};
use super::core::{Point3, Transform};
use super::diagnostics::MeshBuildDiagnostics;
use super::mesh::{
    CancelFlag, Face, GeomContext, MeshBuildError, MeshOutput, SurfaceMesh, compact_vertices,
    finalize_faces,
};
use super::metrics::TimingBucket;
use super::surface::{GridPolicy, SurfaceEvaluator};
use super::tessellation::{ParamGrid, evaluate_grid};
use super::triangulation::assemble_quads;

/// Defaults used when a build is requested without an explicit grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshSettings {
    /// Target maximum edge length handed to the grid policy.
    pub ds: f64,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self { ds: 0.1 }
    }
}

impl MeshSettings {
    #[must_use]
    pub const fn new(ds: f64) -> Self {
        Self { ds }
    }
}

fn check_cancel(cancel: &CancelFlag, stage: &'static str) -> Result<(), MeshBuildError> {
    if cancel.is_cancelled() {
        log::debug!("mesh build cancelled before {stage}");
        return Err(MeshBuildError::BuildAborted { stage });
    }
    Ok(())
}

fn check_resolution(ds: f64) -> Result<f64, MeshBuildError> {
    if ds.is_finite() && ds > 0.0 {
        Ok(ds)
    } else {
        Err(MeshBuildError::InvalidResolution { ds })
    }
}

/// Runs the full pipeline for `grid` and returns the finished mesh.
///
/// Nothing outside the returned value is modified; callers decide whether to
/// commit it.
pub fn build_surface_mesh(
    evaluator: &dyn SurfaceEvaluator,
    grid: &ParamGrid,
    ctx: &mut GeomContext,
) -> Result<(SurfaceMesh, MeshBuildDiagnostics), MeshBuildError> {
    grid.validate()?;
    let (rows, cols) = (grid.rows(), grid.cols());
    let cancel = ctx.cancel.clone();
    ctx.metrics.begin();
    check_cancel(&cancel, "evaluation")?;

    let mut vertices: Vec<Point3> = Vec::with_capacity(grid.vertex_count());
    let faces: Vec<Face> = Vec::with_capacity(grid.cell_count());

    ctx.metrics
        .time(TimingBucket::Evaluation, || evaluate_grid(evaluator, grid, &cancel, &mut vertices))?;

    let quads = ctx
        .metrics
        .time(TimingBucket::Assembly, || assemble_quads(&vertices, rows, cols, &cancel, faces))?;
    let welded_vertex_count = quads.welded_vertices;
    check_cancel(&cancel, "closure")?;

    let mut aliases = AliasTable::identity(vertices.len());
    let (closure, (mut faces, face_stats)) = ctx.metrics.time(TimingBucket::Closure, || {
        let closure = detect_closure(&quads, &vertices, &mut aliases);
        (closure, finalize_faces(quads, &aliases))
    });
    check_cancel(&cancel, "compaction")?;

    let removed = ctx
        .metrics
        .time(TimingBucket::Compaction, || compact_vertices(&mut vertices, &mut faces));

    let mut diagnostics = MeshBuildDiagnostics {
        rows,
        cols,
        vertex_count: vertices.len(),
        quad_count: face_stats.quads,
        triangle_count: face_stats.triangles,
        welded_vertex_count,
        glued_vertex_count: closure.glued_vertices,
        removed_vertex_count: removed,
        fallback_face_count: face_stats.fallback_faces,
        enclosed: closure.enclosed,
        timing: ctx.metrics.end(),
        warnings: Vec::new(),
    };
    if face_stats.fallback_faces > 0 {
        diagnostics.add_warning(format!(
            "{} faces had grid corners restored after collapsing below three vertices",
            face_stats.fallback_faces
        ));
    }
    log::debug!("mesh build: {}", diagnostics.summary());

    let mesh = SurfaceMesh {
        vertices,
        faces,
        enclosed: closure.enclosed,
    };
    Ok((mesh, diagnostics))
}

/// A parametric surface together with its lazily built polygon mesh.
///
/// The evaluation and grid capabilities are independent; [`from_surface`](Self::from_surface)
/// takes one value providing both.
pub struct MeshedSurface {
    evaluator: Option<Rc<dyn SurfaceEvaluator>>,
    grid_policy: Option<Rc<dyn GridPolicy>>,
    settings: MeshSettings,
    mesh: SurfaceMesh,
    cache: GridCache,
    diagnostics: Option<MeshBuildDiagnostics>,
}

impl fmt::Debug for MeshedSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshedSurface")
            .field("has_evaluator", &self.evaluator.is_some())
            .field("has_grid_policy", &self.grid_policy.is_some())
            .field("settings", &self.settings)
            .field("vcount", &self.vertex_count())
            .field("fcount", &self.face_count())
            .field("enclosed", &self.mesh.enclosed)
            .finish_non_exhaustive()
    }
}

impl Default for MeshedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshedSurface {
    /// A surface with no capabilities; every build fails until they are set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluator: None,
            grid_policy: None,
            settings: MeshSettings::default(),
            mesh: SurfaceMesh::default(),
            cache: GridCache::new(),
            diagnostics: None,
        }
    }

    #[must_use]
    pub fn from_surface<S>(surface: S) -> Self
    where
        S: SurfaceEvaluator + GridPolicy + 'static,
    {
        let shared = Rc::new(surface);
        let mut out = Self::new();
        out.evaluator = Some(Rc::clone(&shared) as Rc<dyn SurfaceEvaluator>);
        out.grid_policy = Some(shared as Rc<dyn GridPolicy>);
        out
    }

    /// A surface with an evaluator only; builds need an explicit grid.
    #[must_use]
    pub fn with_evaluator<E>(evaluator: E) -> Self
    where
        E: SurfaceEvaluator + 'static,
    {
        let mut out = Self::new();
        out.evaluator = Some(Rc::new(evaluator));
        out
    }

    #[must_use]
    pub fn with_grid_policy<P>(mut self, policy: P) -> Self
    where
        P: GridPolicy + 'static,
    {
        self.set_grid_policy(policy);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: MeshSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn set_evaluator<E>(&mut self, evaluator: E)
    where
        E: SurfaceEvaluator + 'static,
    {
        self.evaluator = Some(Rc::new(evaluator));
        self.clear();
    }

    pub fn set_grid_policy<P>(&mut self, policy: P)
    where
        P: GridPolicy + 'static,
    {
        self.grid_policy = Some(Rc::new(policy));
        self.cache.clear_grids();
        self.clear();
    }

    #[must_use]
    pub fn settings(&self) -> MeshSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: MeshSettings) {
        self.settings = settings;
    }

    /// Grid the policy picks for edge length `ds`, cached per `ds`.
    pub fn grid_for(&mut self, ds: f64) -> Result<Arc<ParamGrid>, MeshBuildError> {
        let ds = check_resolution(ds)?;
        let policy = self.grid_policy.clone().ok_or(MeshBuildError::NoGridPolicy)?;
        Ok(self.cache.get_or_insert_grid(ds, || policy.grid(ds)))
    }

    /// Builds the mesh for `grid` unless it is already committed. `None` asks the
    /// grid policy for the grid at the configured default `ds`.
    pub fn ensure_triangulated(&mut self, grid: Option<&ParamGrid>) -> Result<(), MeshBuildError> {
        let mut ctx = GeomContext::new();
        self.ensure_triangulated_with_context(grid, &mut ctx)
    }

    /// Builds the mesh for a world-space edge length. With a transform, `ds` is
    /// divided by the transform's largest axis scale first.
    pub fn ensure_triangulated_for(
        &mut self,
        ds: f64,
        transform: Option<&Transform>,
    ) -> Result<(), MeshBuildError> {
        let mut ctx = GeomContext::new();
        self.ensure_triangulated_for_with_context(ds, transform, &mut ctx)
    }

    pub fn ensure_triangulated_for_with_context(
        &mut self,
        ds: f64,
        transform: Option<&Transform>,
        ctx: &mut GeomContext,
    ) -> Result<(), MeshBuildError> {
        let local_ds = transform.map_or(ds, |t| ds / t.max_scale());
        let grid = match self.grid_for(local_ds) {
            Ok(grid) => grid,
            Err(err) => {
                self.rollback();
                return Err(err);
            }
        };
        self.ensure_triangulated_with_context(Some(&grid), ctx)
    }

    pub fn ensure_triangulated_with_context(
        &mut self,
        grid: Option<&ParamGrid>,
        ctx: &mut GeomContext,
    ) -> Result<(), MeshBuildError> {
        let result = self.try_build(grid, ctx);
        if let Err(err) = &result {
            log::warn!("surface mesh build failed: {err}");
            self.rollback();
        }
        result
    }

    fn try_build(&mut self, grid: Option<&ParamGrid>, ctx: &mut GeomContext) -> Result<(), MeshBuildError> {
        let default_grid;
        let grid = match grid {
            Some(grid) => grid,
            None => {
                default_grid = self.grid_for(self.settings.ds)?;
                &*default_grid
            }
        };

        let key = grid.key();
        if !self.mesh.is_empty() && self.cache.matches(&key) {
            log::trace!("mesh cache hit for {}x{} grid", grid.rows(), grid.cols());
            return Ok(());
        }

        let evaluator = self.evaluator.clone().ok_or(MeshBuildError::NoEvaluator)?;
        let (mesh, diagnostics) = build_surface_mesh(evaluator.as_ref(), grid, ctx)?;

        self.mesh = mesh;
        self.diagnostics = Some(diagnostics);
        self.cache.commit(key);
        Ok(())
    }

    fn rollback(&mut self) {
        self.mesh = SurfaceMesh::default();
        self.diagnostics = None;
        self.cache.record_failure();
    }

    /// Whether the sampled patch glues (or pinches) along both boundary pairs.
    /// Builds the mesh first if none is committed.
    pub fn is_enclosed(&mut self) -> Result<bool, MeshBuildError> {
        if self.mesh.is_empty() {
            self.ensure_triangulated(None)?;
        }
        Ok(self.mesh.enclosed)
    }

    /// Drops the committed mesh and grid key.
    pub fn clear(&mut self) {
        self.mesh = SurfaceMesh::default();
        self.diagnostics = None;
        self.cache.invalidate();
    }

    #[must_use]
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.mesh.vertices
    }

    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.mesh.faces
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    #[must_use]
    pub fn index_count(&self) -> usize {
        self.mesh.index_count()
    }

    /// Diagnostics of the committed build.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&MeshBuildDiagnostics> {
        self.diagnostics.as_ref()
    }

    #[must_use]
    pub fn cache_stats(&self) -> MeshCacheStats {
        self.cache.stats()
    }

    /// `true` when a mesh is committed for exactly this grid.
    #[must_use]
    pub fn is_built_for(&self, grid: &ParamGrid) -> bool {
        !self.mesh.is_empty() && self.cache.committed() == Some(&grid.key())
    }

    #[must_use]
    pub fn output(&self) -> MeshOutput {
        self.mesh.to_output()
    }
}
