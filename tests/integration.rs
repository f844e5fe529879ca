use ghx_surface_mesh::geom::{
    CancelFlag, CoordinateFn, GeomContext, GridPolicy, MeshBuildError, MeshedSurface, ParamGrid,
    PlaneSurface, Point3, SphereSurface, SurfaceEvaluator, TorusSurface, Transform, TwistedRibbon, Vec3,
    build_surface_mesh,
};

fn assert_well_formed(surface: &MeshedSurface) {
    let mesh = surface.mesh();
    mesh.validate().expect("mesh should validate");
    assert_eq!(mesh.index_count(), 4 * mesh.face_count());
    assert!(mesh.vertices.iter().all(|p| p.is_finite()));

    let diag = surface.diagnostics().expect("diagnostics after a build");
    assert_eq!(diag.vertex_count, mesh.vertex_count());
    assert_eq!(diag.face_count(), mesh.face_count());
    assert_eq!(diag.enclosed, mesh.enclosed);
}

#[test]
fn twisted_ribbon_is_an_open_quad_strip() {
    let ribbon = TwistedRibbon::new(1.0, 0.2, 1.0).expect("valid ribbon");
    let mut surface = MeshedSurface::from_surface(ribbon);
    surface.ensure_triangulated_for(0.25, None).expect("ribbon build");

    assert_well_formed(&surface);
    assert!(!surface.is_enclosed().unwrap());
    assert!(surface.face_count() > 0);
    assert_eq!(surface.mesh().triangle_count(), 0);
}

#[test]
fn sphere_closes_with_triangle_fans_at_the_poles() {
    let sphere = SphereSurface::new(Point3::new(1.0, 2.0, 3.0), 2.0).expect("valid sphere");
    let mut surface = MeshedSurface::from_surface(sphere);
    surface.ensure_triangulated_for(0.5, None).expect("sphere build");

    assert_well_formed(&surface);
    assert!(surface.is_enclosed().unwrap());
    assert!(surface.mesh().triangle_count() > 0);
    assert!(surface.faces().iter().all(|f| f.n == 3 || f.n == 4));
}

#[test]
fn torus_closes_without_triangles() {
    let torus = TorusSurface::new(Point3::ORIGIN, 2.0, 0.5).expect("valid torus");
    let grid = torus.grid(0.5);
    let mut surface = MeshedSurface::from_surface(torus);
    surface.ensure_triangulated(Some(&grid)).expect("torus build");

    assert_well_formed(&surface);
    assert!(surface.is_enclosed().unwrap());
    assert_eq!(surface.mesh().triangle_count(), 0);
    assert_eq!(surface.face_count(), grid.cell_count());
    // Both seams glue: the last sample row and column disappear.
    assert_eq!(surface.vertex_count(), grid.rows() * grid.cols());
}

#[test]
fn transform_scale_refines_the_grid() {
    let plane = PlaneSurface::new(Point3::ORIGIN, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
    let mut surface = MeshedSurface::from_surface(plane);

    surface.ensure_triangulated_for(0.25, None).unwrap();
    let local = surface.face_count();

    let scaled = Transform::uniform_scale(2.0);
    surface.ensure_triangulated_for(0.25, Some(&scaled)).unwrap();
    assert_eq!(surface.face_count(), 4 * local);
    assert_well_formed(&surface);
}

#[test]
fn output_mirrors_the_committed_mesh() {
    let ribbon = TwistedRibbon::new(1.0, 0.5, 0.5).unwrap();
    let mut surface = MeshedSurface::from_surface(ribbon);
    surface.ensure_triangulated_for(0.5, None).unwrap();

    let output = surface.output();
    assert_eq!(output.vertices.len(), surface.vertex_count());
    assert_eq!(output.faces, surface.faces());
    assert_eq!(output.enclosed, surface.mesh().enclosed);
    for (arr, p) in output.vertices.iter().zip(surface.vertices()) {
        assert_eq!(*arr, p.to_array());
    }
}

#[test]
fn failed_rebuild_leaves_nothing_behind() {
    let mut surface = MeshedSurface::with_evaluator(CoordinateFn(|u: f64, v: f64| {
        if u > 1.5 { vec![u] } else { vec![u, v, 0.0] }
    }));
    let ok = ParamGrid::uniform((0.0, 1.0), 2, (0.0, 1.0), 2);
    surface.ensure_triangulated(Some(&ok)).unwrap();
    assert_eq!(surface.face_count(), 4);

    let bad = ParamGrid::uniform((0.0, 2.0), 2, (0.0, 1.0), 2);
    let err = surface.ensure_triangulated(Some(&bad)).unwrap_err();
    assert!(matches!(err, MeshBuildError::InvalidResult { u, .. } if u == 2.0));
    assert_eq!(surface.vertex_count(), 0);
    assert_eq!(surface.face_count(), 0);
    assert!(surface.diagnostics().is_none());
}

#[test]
fn rejects_non_positive_resolution() {
    let mut surface = MeshedSurface::from_surface(SphereSurface::new(Point3::ORIGIN, 1.0).unwrap());
    for ds in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            surface.ensure_triangulated_for(ds, None),
            Err(MeshBuildError::InvalidResolution { .. })
        ));
    }
}

#[test]
fn pipeline_honours_a_raised_cancel_flag() {
    let sphere = SphereSurface::new(Point3::ORIGIN, 1.0).unwrap();
    let grid = sphere.grid(0.5);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let mut ctx = GeomContext::with_cancel(cancel.clone());
    let err = build_surface_mesh(&sphere as &dyn SurfaceEvaluator, &grid, &mut ctx).unwrap_err();
    assert_eq!(err, MeshBuildError::BuildAborted { stage: "evaluation" });

    cancel.reset();
    let (mesh, diag) = build_surface_mesh(&sphere, &grid, &mut ctx).expect("build after reset");
    assert!(mesh.enclosed);
    assert!(diag.is_clean());
    assert!(diag.summary().ends_with("enclosed"));
}
