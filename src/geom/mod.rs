mod core;
mod ray;
mod mesh;
pub(crate) mod bvh;
mod intersect;
mod triangulation;
mod patch;
mod grid;
mod cube;
mod diagnostics;
mod metrics;

pub use core::{BBox, Point3, Tolerance, Vec3};
pub use cube::grid_cube;
pub use diagnostics::GeomMeshDiagnostics;
pub use grid::{GridAxis, GridCounts, GridError, GridSpec, MAX_GRID_POINTS, grid_points};
pub use intersect::{PreparedMesh, RayTarget, mesh_ray_brute_force};
pub use mesh::{GeomMesh, MeshError, MeshFace};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use patch::{
    EarClipFill, PatchError, PolylineFill, fill_closed_polyline,
    fill_closed_polyline_with_tolerance,
};
pub use ray::{Ray3, RayHit, Triangle3, ray_triangle_intersection};
pub use triangulation::{UvPoint, triangulate_loop};

#[cfg(test)]
mod tests;
