use crate::geom::{
    CancelFlag, Collapse, CollapseSet, FnEvaluator, MeshedSurface, ParamGrid, Point3,
    assemble_quads, collapse_cell,
};

/// Rows of a surface of revolution around Z; `radius(u) == 0` pinches a row.
fn revolved(radius: fn(f64) -> f64) -> MeshedSurface {
    MeshedSurface::with_evaluator(FnEvaluator(move |u: f64, v: f64| {
        let r = radius(u);
        if r == 0.0 {
            return Point3::new(0.0, 0.0, u);
        }
        Point3::new(r * v.cos(), r * v.sin(), u)
    }))
}

#[test]
fn boundary_collapses_apply_independently() {
    let p = Point3::new(1.0, 1.0, 1.0);
    let q = Point3::new(2.0, 0.0, 0.0);
    let vertices = vec![p, p, q, p];

    let mut corners = [0, 1, 2, 3];
    let applied = collapse_cell(&mut corners, &vertices, true, true);
    assert_eq!(applied, CollapseSet::from([Collapse::Top, Collapse::Left]));
    assert_eq!(applied.len(), 2);
    assert_eq!(corners, [0, 0, 2, 0]);

    let mut corners = [0, 1, 2, 3];
    assert_eq!(
        collapse_cell(&mut corners, &vertices, false, true),
        CollapseSet::from([Collapse::Left])
    );
    assert_eq!(corners, [0, 1, 2, 0]);

    let mut corners = [0, 1, 2, 3];
    assert!(collapse_cell(&mut corners, &vertices, false, false).is_empty());
    assert_eq!(corners, [0, 1, 2, 3]);
}

#[test]
fn corner_two_collapses_at_most_once() {
    let p = Point3::new(0.0, 0.0, 1.0);
    let q = Point3::new(5.0, 5.0, 5.0);
    // Corners 1, 2 and 3 coincide: Right wins and Bottom is not applied.
    let vertices = vec![p, q, q, q];
    let mut corners = [0, 1, 2, 3];
    let applied = collapse_cell(&mut corners, &vertices, false, false);
    assert_eq!(applied.iter().collect::<Vec<_>>(), vec![Collapse::Right]);
    assert_eq!(corners, [0, 1, 1, 3]);
}

#[test]
fn first_row_and_first_column_on_one_point_weld_to_a_single_vertex() {
    let mut surface = MeshedSurface::with_evaluator(FnEvaluator(|u: f64, v: f64| {
        if u == 0.0 || v == 0.0 {
            Point3::ORIGIN
        } else {
            Point3::new(u, v, 1.0)
        }
    }));
    let grid = ParamGrid::new([0.0, 1.0, 2.0], [0.0, 1.0, 2.0]);
    surface.ensure_triangulated(Some(&grid)).unwrap();
    surface.mesh().validate().unwrap();

    let diag = surface.diagnostics().unwrap();
    // Top and Left on cell (0, 0), Top on (0, 1), Left on (1, 0).
    assert_eq!(diag.welded_vertex_count, 4);
    // Cell (0, 0) has three corners on the origin; it keeps one extra copy.
    assert_eq!(diag.fallback_face_count, 1);

    let origin_copies: Vec<usize> = surface
        .vertices()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.coincident(Point3::ORIGIN))
        .map(|(ix, _)| ix)
        .collect();
    assert_eq!(origin_copies, vec![0, 1]);
    assert_eq!(surface.vertex_count(), 6);

    let faces: Vec<[u32; 4]> = surface.faces().iter().map(|f| f.indices).collect();
    assert_eq!(faces, vec![[0, 1, 2, 2], [0, 3, 2, 2], [0, 2, 4, 4], [2, 3, 5, 4]]);
    // Only the zero-area cell references the second copy.
    assert!(surface.faces()[1..].iter().all(|f| !f.corners().contains(&1)));
}

#[test]
fn pole_row_degrades_to_triangles() {
    let grid = ParamGrid::new([0.0, 0.5, 1.0], [0.0, 1.0, 2.0, 3.0]);
    let mut surface = revolved(|u| u);
    surface.ensure_triangulated(Some(&grid)).unwrap();
    surface.mesh().validate().unwrap();

    for (ix, face) in surface.faces().iter().enumerate() {
        if ix < 3 {
            assert_eq!(face.n, 3, "cell {ix} touches the pole");
            assert_eq!(face.indices[0], 0);
            assert_eq!(face.indices[2], face.indices[3]);
        } else {
            assert_eq!(face.n, 4, "cell {ix} is away from the pole");
        }
    }
    // apex + 4 + 4
    assert_eq!(surface.vertex_count(), 9);
    assert_eq!(surface.diagnostics().unwrap().welded_vertex_count, 3);
}

#[test]
fn pole_triangles_keep_cell_winding() {
    let grid = ParamGrid::new([0.0, 1.0], [0.0, 1.0, 2.0]);
    let mut surface = revolved(|u| u);
    surface.ensure_triangulated(Some(&grid)).unwrap();
    // Cell corners were [0, 0, 4, 3] and [0, 0, 5, 4] before compaction, so the
    // bottom-right corner takes slot 1 and the bottom-left slot 2.
    assert_eq!(surface.faces()[0].indices, [0, 2, 1, 1]);
    assert_eq!(surface.faces()[1].indices, [0, 3, 2, 2]);
}

#[test]
fn interior_pinch_propagates_to_both_neighbouring_rows() {
    let grid = ParamGrid::new([0.0, 0.5, 1.0], [0.0, 1.0, 2.0, 3.0]);
    let mut surface = revolved(|u| (u - 0.5).abs());
    surface.ensure_triangulated(Some(&grid)).unwrap();
    surface.mesh().validate().unwrap();

    assert_eq!(surface.face_count(), 6);
    assert!(surface.faces().iter().all(|f| f.n == 3));
    // 4 upper-ring vertices, the pinch point, 4 lower-ring vertices
    assert_eq!(surface.vertex_count(), 9);
    let pinch = surface.vertices()[4];
    assert_eq!(pinch, Point3::new(0.0, 0.0, 0.5));
    assert!(surface.faces().iter().all(|f| f.corners().contains(&4)));
}

#[test]
fn assembly_counts_only_rewritten_indices() {
    let mut vertices = Vec::new();
    for i in 0..=1 {
        for j in 0..=2 {
            vertices.push(Point3::new(f64::from(j), f64::from(i), 0.0));
        }
    }
    // Bottom row pinched: each cell rewrites its own fresh corner 2 onto the
    // index its corner 3 already carries.
    vertices[4] = vertices[3];
    vertices[5] = vertices[3];
    let grid = assemble_quads(&vertices, 1, 2, &CancelFlag::new(), Vec::new()).unwrap();
    assert_eq!(grid.collapsed_cells, 2);
    assert_eq!(grid.welded_vertices, 2);
    assert_eq!(grid.face(0, 0).indices, [0, 1, 3, 3]);
    assert_eq!(grid.face(0, 1).indices, [1, 2, 3, 3]);
}
