use std::f64::consts::TAU;

use crate::geom::{
    GridOptions, GridPolicy, MeshedSurface, ParamGrid, PlaneSurface, Point3, SphereSurface,
    TorusSurface, Transform, TwistedRibbon, Vec3,
};

#[test]
fn sphere_is_enclosed_with_pole_triangles() {
    let sphere = SphereSurface::new(Point3::ORIGIN, 1.0).unwrap();
    let grid = sphere.grid(0.25);
    assert_eq!((grid.rows(), grid.cols()), (13, 26));

    let mut surface = MeshedSurface::from_surface(sphere);
    surface.ensure_triangulated(Some(&grid)).unwrap();
    surface.mesh().validate().unwrap();

    assert!(surface.is_enclosed().unwrap());
    assert_eq!(surface.face_count(), 13 * 26);
    assert_eq!(surface.mesh().triangle_count(), 2 * 26);
    // two poles plus 12 latitude rings of 26 vertices
    assert_eq!(surface.vertex_count(), 2 + 12 * 26);

    let diag = surface.diagnostics().unwrap();
    assert!(diag.enclosed);
    assert!(diag.is_clean());
    assert_eq!(diag.welded_vertex_count, 2 * 26);
}

#[test]
fn sphere_is_enclosed_at_default_resolution() {
    let mut surface = MeshedSurface::from_surface(SphereSurface::new(Point3::new(1.0, -2.0, 0.5), 3.0).unwrap());
    assert!(surface.is_enclosed().unwrap());
    assert!(surface.face_count() > 0);
}

#[test]
fn torus_is_enclosed_without_triangles() {
    let torus = TorusSurface::new(Point3::ORIGIN, 2.0, 0.5).unwrap();
    let grid = torus.grid(0.5);
    let (n, m) = (grid.rows(), grid.cols());
    assert_eq!((n, m), (32, 7));

    let mut surface = MeshedSurface::from_surface(torus);
    surface.ensure_triangulated(Some(&grid)).unwrap();
    assert!(surface.is_enclosed().unwrap());
    assert_eq!(surface.mesh().triangle_count(), 0);
    assert_eq!(surface.vertex_count(), n * m);
    assert_eq!(surface.diagnostics().unwrap().glued_vertex_count, n + m + 1);
}

#[test]
fn twisted_ribbon_single_strip_is_open() {
    let ribbon = TwistedRibbon::new(1.0, 0.2, 1.0).unwrap();
    let vrange: Vec<f64> = (0..=50).map(|k| TAU * f64::from(k) / 50.0).collect();
    let grid = ParamGrid::new([-1.0, 1.0], vrange);

    let mut surface = MeshedSurface::from_surface(ribbon);
    surface.ensure_triangulated(Some(&grid)).unwrap();
    assert_eq!(surface.face_count(), 50);
    assert_eq!(surface.index_count(), 200);
    assert!(!surface.is_enclosed().unwrap());
    assert_eq!(surface.mesh().triangle_count(), 0);
}

#[test]
fn plane_grid_follows_resolution_and_transform() {
    let plane = PlaneSurface::new(Point3::ORIGIN, Vec3::X, Vec3::Y);
    let mut surface = MeshedSurface::from_surface(plane);

    surface.ensure_triangulated_for(0.25, None).unwrap();
    assert_eq!(surface.face_count(), 16);

    surface
        .ensure_triangulated_for(0.25, Some(&Transform::uniform_scale(2.0)))
        .unwrap();
    assert_eq!(surface.face_count(), 64);
    assert!(!surface.is_enclosed().unwrap());
}

#[test]
fn grid_options_clamp_counts() {
    let mut plane = PlaneSurface::new(Point3::ORIGIN, Vec3::X * 10.0, Vec3::Y);
    plane.grid_options = GridOptions::new(3, 5);
    let grid = plane.grid(0.01);
    assert_eq!((grid.rows(), grid.cols()), (5, 5));
    let grid = plane.grid(100.0);
    assert_eq!((grid.rows(), grid.cols()), (3, 3));
}

#[test]
fn invalid_builtin_parameters_are_rejected() {
    assert!(TwistedRibbon::new(0.0, 0.2, 1.0).is_err());
    assert!(TwistedRibbon::new(1.0, f64::NAN, 1.0).is_err());
    assert!(SphereSurface::new(Point3::ORIGIN, -1.0).is_err());
    assert!(TorusSurface::new(Point3::ORIGIN, 1.0, 0.0).is_err());
}
