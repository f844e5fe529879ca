use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::geom::{
    CancelFlag, CoordinateFn, EvaluationError, FixedGrid, GeomContext, MeshBuildError,
    MeshedSurface, ParamGrid, Point3, SurfaceEvaluator,
};

/// Saddle evaluator that counts its calls and can fail or cancel on demand.
#[derive(Clone, Default)]
struct CountingSampler {
    calls: Arc<AtomicUsize>,
    fail_above_u: Option<f64>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl CountingSampler {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SurfaceEvaluator for CountingSampler {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, flag)) = &self.cancel_after {
            if n >= *limit {
                flag.cancel();
            }
        }
        if self.fail_above_u.is_some_and(|limit| u > limit) {
            return Err(EvaluationError::Failed(format!("u={u} outside patch")));
        }
        Ok(Point3::new(u, v, u * u - v * v))
    }
}

fn grid(rows: usize, cols: usize) -> ParamGrid {
    ParamGrid::uniform((0.0, 1.0), rows, (0.0, 1.0), cols)
}

#[test]
fn second_build_with_same_grid_is_a_noop() {
    let sampler = CountingSampler::default();
    let mut surface = MeshedSurface::with_evaluator(sampler.clone());
    let g = grid(4, 5);

    surface.ensure_triangulated(Some(&g)).unwrap();
    assert_eq!(sampler.calls(), 5 * 6);
    let first = surface.mesh().clone();

    surface.ensure_triangulated(Some(&g)).unwrap();
    assert_eq!(sampler.calls(), 5 * 6);
    assert_eq!(surface.mesh(), &first);

    let stats = surface.cache_stats();
    assert_eq!(stats.mesh_builds, 1);
    assert_eq!(stats.mesh_hits, 1);
}

#[test]
fn grid_with_equal_values_from_other_types_hits_the_cache() {
    let sampler = CountingSampler::default();
    let mut surface = MeshedSurface::with_evaluator(sampler.clone());
    surface
        .ensure_triangulated(Some(&ParamGrid::new([0.0, 1.0, 2.0], [0.0, 1.0])))
        .unwrap();
    surface
        .ensure_triangulated(Some(&ParamGrid::new([0_i32, 1, 2], [0_u8, 1])))
        .unwrap();
    assert_eq!(sampler.calls(), 6);
}

#[test]
fn changing_the_grid_rebuilds() {
    let sampler = CountingSampler::default();
    let mut surface = MeshedSurface::with_evaluator(sampler.clone());

    surface.ensure_triangulated(Some(&grid(2, 2))).unwrap();
    assert_eq!(surface.face_count(), 4);

    surface.ensure_triangulated(Some(&grid(3, 2))).unwrap();
    assert_eq!(surface.face_count(), 6);
    assert_eq!(sampler.calls(), 9 + 12);
    assert!(surface.is_built_for(&grid(3, 2)));
    assert!(!surface.is_built_for(&grid(2, 2)));
}

#[test]
fn default_build_uses_grid_policy() {
    let sampler = CountingSampler::default();
    let mut surface =
        MeshedSurface::with_evaluator(sampler.clone()).with_grid_policy(FixedGrid(grid(2, 3)));
    assert!(!surface.is_enclosed().unwrap());
    assert_eq!(surface.face_count(), 6);

    // ensure_triangulated(None) resolves to the same grid: no re-evaluation.
    surface.ensure_triangulated(None).unwrap();
    assert_eq!(sampler.calls(), 12);
}

#[test]
fn evaluation_failure_rolls_back() {
    let sampler = CountingSampler {
        fail_above_u: Some(0.5),
        ..CountingSampler::default()
    };
    let mut surface = MeshedSurface::with_evaluator(sampler);

    surface
        .ensure_triangulated(Some(&ParamGrid::new([0.0, 0.25, 0.5], [0.0, 1.0])))
        .unwrap();
    assert_eq!(surface.face_count(), 2);

    let err = surface.ensure_triangulated(Some(&grid(2, 2))).unwrap_err();
    assert!(matches!(err, MeshBuildError::EvaluationFailed { u, .. } if u == 1.0));
    assert_eq!(surface.vertex_count(), 0);
    assert_eq!(surface.face_count(), 0);
    assert_eq!(surface.index_count(), 0);
    assert!(surface.diagnostics().is_none());
    assert_eq!(surface.cache_stats().failed_builds, 1);
}

#[test]
fn malformed_coordinates_roll_back() {
    let mut surface = MeshedSurface::with_evaluator(CoordinateFn(|u: f64, v: f64| {
        if u > 0.5 { vec![u, v] } else { vec![u, v, 0.0] }
    }));
    let err = surface.ensure_triangulated(Some(&grid(2, 2))).unwrap_err();
    assert!(matches!(err, MeshBuildError::InvalidResult { .. }));
    assert_eq!(surface.face_count(), 0);

    let mut nan = MeshedSurface::with_evaluator(CoordinateFn(|_: f64, _: f64| [f64::NAN, 0.0, 0.0]));
    assert!(matches!(
        nan.ensure_triangulated(Some(&grid(1, 1))),
        Err(MeshBuildError::InvalidResult { .. })
    ));
}

#[test]
fn invalid_grid_rolls_back() {
    let mut surface = MeshedSurface::with_evaluator(CountingSampler::default());
    surface.ensure_triangulated(Some(&grid(1, 1))).unwrap();
    let err = surface
        .ensure_triangulated(Some(&ParamGrid::new([0.0], [0.0, 1.0])))
        .unwrap_err();
    assert!(matches!(err, MeshBuildError::InvalidGrid(_)));
    assert_eq!(surface.vertex_count(), 0);
}

#[test]
fn raised_flag_aborts_before_evaluation() {
    let sampler = CountingSampler::default();
    let mut surface = MeshedSurface::with_evaluator(sampler.clone());
    let mut ctx = GeomContext::new();
    ctx.cancel.cancel();

    let err = surface
        .ensure_triangulated_with_context(Some(&grid(3, 3)), &mut ctx)
        .unwrap_err();
    assert!(matches!(err, MeshBuildError::BuildAborted { .. }));
    assert_eq!(sampler.calls(), 0);
    assert_eq!(surface.face_count(), 0);

    ctx.cancel.reset();
    surface
        .ensure_triangulated_with_context(Some(&grid(3, 3)), &mut ctx)
        .unwrap();
    assert_eq!(surface.face_count(), 9);
}

#[test]
fn cancellation_mid_build_discards_committed_mesh() {
    let cancel = CancelFlag::new();
    let sampler = CountingSampler {
        cancel_after: Some((5, cancel.clone())),
        ..CountingSampler::default()
    };
    let mut surface = MeshedSurface::with_evaluator(sampler.clone());

    let mut ctx = GeomContext::with_cancel(cancel);
    let err = surface
        .ensure_triangulated_with_context(Some(&grid(4, 4)), &mut ctx)
        .unwrap_err();
    assert_eq!(err, MeshBuildError::BuildAborted { stage: "evaluation" });
    // The flag is seen before the second row starts.
    assert_eq!(sampler.calls(), 5);
    assert_eq!(surface.vertex_count(), 0);
    assert_eq!(surface.face_count(), 0);
}

#[test]
fn clear_forces_rebuild() {
    let sampler = CountingSampler::default();
    let mut surface = MeshedSurface::with_evaluator(sampler.clone());
    let g = grid(1, 1);
    surface.ensure_triangulated(Some(&g)).unwrap();
    surface.clear();
    assert_eq!(surface.face_count(), 0);
    surface.ensure_triangulated(Some(&g)).unwrap();
    assert_eq!(sampler.calls(), 8);
}
