use crate::geom::{
    GeomMesh, MeshError, Point3, PreparedMesh, Ray3, RayTarget, Tolerance, Vec3,
    mesh_ray_brute_force,
};

/// `n x n` quads on the plane `z = height`, spanning `[0, n]` in x and y.
fn plane_grid(n: u32, height: f64) -> GeomMesh {
    let mut positions = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            positions.push([f64::from(i), f64::from(j), height]);
        }
    }
    let row = n + 1;
    let mut indices = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            indices.extend_from_slice(&[a, a + 1, a + row + 1, a, a + row + 1, a + row]);
        }
    }
    GeomMesh::from_triangle_indices(positions, &indices)
}

fn two_planes() -> GeomMesh {
    let mut positions = plane_grid(1, 1.0).positions;
    positions.extend(plane_grid(1, 3.0).positions);
    GeomMesh::from_triangle_indices(positions, &[0, 1, 3, 0, 3, 2, 4, 5, 7, 4, 7, 6])
}

#[test]
fn nearest_of_several_hits_is_returned() {
    let mesh = two_planes();
    let ray = Ray3::new(Point3::new(0.25, 0.6, 0.0), Vec3::new(0.0, 0.0, 1.0));
    let tol = Tolerance::default_geom();

    let brute = mesh_ray_brute_force(&mesh, &ray, tol).expect("hit");
    assert!((brute - 1.0).abs() < 1e-12);

    let prepared = PreparedMesh::new(&mesh, tol).expect("prepare");
    let (_, t) = prepared.closest_hit(&ray).expect("hit");
    assert!((t - 1.0).abs() < 1e-12);
}

#[test]
fn starting_between_planes_finds_the_far_one() {
    let mesh = two_planes();
    let ray = Ray3::through(Point3::new(0.25, 0.6, 2.0), Point3::new(0.25, 0.6, 2.5));
    let t = mesh.ray_hit(&ray).expect("hit");
    // Direction length is 0.5, so the plane at z = 3 is two direction units away.
    assert!((t - 2.0).abs() < 1e-12);
    let hit = ray.point_at(t);
    assert!((hit.z - 3.0).abs() < 1e-12);
}

#[test]
fn surfaces_behind_the_origin_are_ignored() {
    let mesh = plane_grid(2, 0.0);
    let ray = Ray3::through(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 2.0));
    assert!(mesh.ray_hit(&ray).is_none());

    let prepared = PreparedMesh::new(&mesh, Tolerance::default_geom()).expect("prepare");
    assert!(prepared.ray_hit(&ray).is_none());
}

#[test]
fn degenerate_ray_never_hits() {
    let mesh = plane_grid(2, 0.0);
    let p = Point3::new(1.0, 1.0, 1.0);
    let ray = Ray3::through(p, p);
    assert!(mesh.ray_hit(&ray).is_none());

    let prepared = PreparedMesh::new(&mesh, Tolerance::default_geom()).expect("prepare");
    assert!(prepared.ray_hit(&ray).is_none());
}

#[test]
fn prepared_mesh_agrees_with_brute_force() {
    let mesh = plane_grid(16, 0.0);
    let tol = Tolerance::default_geom();
    let prepared = PreparedMesh::new(&mesh, tol).expect("prepare");
    assert_eq!(prepared.triangle_count(), 16 * 16 * 2);

    let light = Point3::new(8.0, 8.0, 10.0);
    for j in 0..24 {
        for i in 0..24 {
            let target = Point3::new(f64::from(i) - 4.0 + 0.37, f64::from(j) - 4.0 + 0.61, 2.0);
            let ray = Ray3::through(light, target);
            let brute = mesh_ray_brute_force(&mesh, &ray, tol);
            let fast = prepared.ray_hit(&ray);
            match (brute, fast) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9, "{a} vs {b} at ({i}, {j})"),
                (None, None) => {}
                other => panic!("disagreement at ({i}, {j}): {other:?}"),
            }
        }
    }
}

#[test]
fn prepare_rejects_invalid_meshes() {
    let tol = Tolerance::default_geom();
    assert_eq!(
        PreparedMesh::new(&GeomMesh::default(), tol).unwrap_err(),
        MeshError::Empty
    );

    let broken = GeomMesh::from_triangle_indices(vec![[0.0; 3], [1.0, 0.0, 0.0]], &[0, 1, 2]);
    assert!(matches!(
        PreparedMesh::new(&broken, tol).unwrap_err(),
        MeshError::IndexOutOfBounds { index: 2, .. }
    ));

    let nan = GeomMesh::from_triangle_indices(
        vec![[0.0; 3], [1.0, 0.0, 0.0], [f64::NAN, 1.0, 0.0]],
        &[0, 1, 2],
    );
    assert_eq!(PreparedMesh::new(&nan, tol).unwrap_err(), MeshError::NonFiniteVertex);
}

#[test]
fn lenient_prepare_drops_broken_faces() {
    let mut mesh = plane_grid(1, 0.0);
    mesh.positions.push([f64::NAN, 0.0, 0.0]);
    mesh.faces.push(crate::geom::MeshFace::Tri([0, 1, 4]));
    mesh.faces.push(crate::geom::MeshFace::Tri([0, 1, 9]));
    mesh.faces.push(crate::geom::MeshFace::Quad([0, 1, 1, 2]));

    let tol = Tolerance::default_geom();
    assert!(PreparedMesh::new(&mesh, tol).is_err());

    let (prepared, dropped) = PreparedMesh::new_lenient(&mesh, tol).expect("prepare");
    assert_eq!(dropped, 3);
    assert_eq!(prepared.triangle_count(), 2);
    assert!(prepared.bbox().min.is_finite() && prepared.bbox().max.is_finite());

    let ray = Ray3::through(Point3::new(0.3, 0.6, 1.0), Point3::new(0.3, 0.6, 0.5));
    let t = prepared.ray_hit(&ray).expect("hit");
    assert!((t - 2.0).abs() < 1e-12);
}
