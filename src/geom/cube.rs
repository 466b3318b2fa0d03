use super::mesh::{GeomMesh, MeshFace};
use super::{Point3, Vec3};

/// Corner sign pattern of a grid cube, in vertex order.
const CUBE_CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
];

/// Quad faces of a grid cube. Normals point outward for positive half-extents.
const CUBE_FACES: [[u32; 4]; 6] = [
    [0, 1, 2, 3],
    [1, 6, 5, 2],
    [6, 7, 4, 5],
    [7, 0, 3, 4],
    [2, 5, 4, 3],
    [0, 7, 6, 1],
];

/// Axis-aligned box of 8 vertices and 6 quads centered at `center`.
///
/// Half-extents are used as given; negative values mirror the box and flip its
/// winding.
#[must_use]
pub fn grid_cube(center: Point3, half_extents: Vec3) -> GeomMesh {
    let positions = CUBE_CORNERS
        .iter()
        .map(|[sx, sy, sz]| {
            [
                sx * half_extents.x + center.x,
                sy * half_extents.y + center.y,
                sz * half_extents.z + center.z,
            ]
        })
        .collect();
    let faces = CUBE_FACES.iter().copied().map(MeshFace::Quad).collect();
    GeomMesh::new(positions, faces)
}
