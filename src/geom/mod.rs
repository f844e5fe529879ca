mod cache;
mod closure;
mod core;
mod diagnostics;
mod mesh;
mod meshed;
mod metrics;
mod surface;
mod tessellation;
mod triangulation;

pub use cache::{GridCache, MeshCacheStats};
pub use closure::{AliasTable, ClosureReport, detect_closure};
pub use core::{Point3, Transform, Vec3};
pub use diagnostics::MeshBuildDiagnostics;
pub use mesh::{
    CancelFlag, Face, FaceStats, GeomContext, MeshBuildError, MeshOutput, SurfaceMesh,
    compact_vertices, finalize_faces,
};
pub use meshed::{MeshSettings, MeshedSurface, build_surface_mesh};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use surface::{
    CoordinateFn, EvaluationError, FixedGrid, FnEvaluator, GridPolicy, PlaneSurface,
    SphereSurface, SurfaceEvaluator, TorusSurface, TwistedRibbon,
};
pub use tessellation::{
    GridKey, GridOptions, ParamGrid, evaluate_grid, segments_for_length, uniform_params,
};
pub use triangulation::{
    Collapse, CollapseSet, QuadGrid, assemble_quads, collapse_cell, normalize_ring,
};

#[cfg(test)]
mod tests;
