//! Ray/mesh nearest-hit queries.
//!
//! Everything the occlusion filter needs from a surface is the [`RayTarget`]
//! capability: "where along this ray do you first get hit, if at all". The
//! returned parameter is in units of the ray direction (see [`Ray3`]), is
//! always `> tol.eps`, and is the smallest such parameter over all faces.

use super::bvh::Bvh;
use super::mesh::{GeomMesh, MeshError};
use super::ray::{Ray3, Triangle3, ray_triangle_intersection};
use super::{BBox, Point3, Tolerance};

pub trait RayTarget: Send + Sync {
    /// Smallest forward ray parameter at which the ray hits this target.
    fn ray_hit(&self, ray: &Ray3) -> Option<f64>;
}

impl<T: RayTarget + ?Sized> RayTarget for &T {
    fn ray_hit(&self, ray: &Ray3) -> Option<f64> {
        (**self).ray_hit(ray)
    }
}

/// Brute-force test against every face, using the default tolerance.
impl RayTarget for GeomMesh {
    fn ray_hit(&self, ray: &Ray3) -> Option<f64> {
        mesh_ray_brute_force(self, ray, Tolerance::default_geom())
    }
}

#[must_use]
pub fn mesh_ray_brute_force(mesh: &GeomMesh, ray: &Ray3, tol: Tolerance) -> Option<f64> {
    if ray.is_degenerate(tol) {
        return None;
    }
    mesh.triangles()
        .filter_map(|tri| ray_triangle_intersection(*ray, tri, tol))
        .map(|hit| hit.t)
        .min_by(f64::total_cmp)
}

/// A mesh flattened to triangles with a BVH over their boxes.
#[derive(Debug, Clone)]
pub struct PreparedMesh {
    points: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
    bvh: Bvh,
    bbox: BBox,
    tol: Tolerance,
}

impl PreparedMesh {
    pub fn new(mesh: &GeomMesh, tol: Tolerance) -> Result<Self, MeshError> {
        mesh.validate()?;
        let triangles: Vec<[u32; 3]> = mesh.faces.iter().flat_map(|face| face.triangles()).collect();
        Self::build(mesh, triangles, tol)
    }

    /// Like [`PreparedMesh::new`], but faces that reference missing or non-finite
    /// vertices (or repeat a vertex) are dropped instead of failing the mesh.
    ///
    /// Returns the prepared mesh and the number of dropped faces.
    pub fn new_lenient(mesh: &GeomMesh, tol: Tolerance) -> Result<(Self, usize), MeshError> {
        let usable = |index: u32| mesh.point(index).is_some_and(Point3::is_finite);
        let mut dropped = 0;
        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        for face in &mesh.faces {
            let indices = face.indices();
            let repeated = indices
                .iter()
                .enumerate()
                .any(|(i, a)| indices[i + 1..].contains(a));
            if repeated || !indices.iter().all(|&i| usable(i)) {
                dropped += 1;
                continue;
            }
            triangles.extend(face.triangles());
        }
        if dropped > 0 {
            log::warn!("dropped {dropped} invalid faces of {}", mesh.face_count());
        }
        Ok((Self::build(mesh, triangles, tol)?, dropped))
    }

    fn build(mesh: &GeomMesh, triangles: Vec<[u32; 3]>, tol: Tolerance) -> Result<Self, MeshError> {
        let points: Vec<Point3> = mesh.positions.iter().copied().map(Point3::from).collect();
        let used: Vec<Point3> = triangles
            .iter()
            .flat_map(|tri| tri.iter().map(|&i| points[i as usize]))
            .collect();
        let bbox = BBox::from_points(&used).ok_or(MeshError::Empty)?;

        let tri_bboxes: Vec<BBox> = triangles
            .iter()
            .map(|tri| triangle_at(&points, *tri).bbox().expand_tolerance(tol))
            .collect();

        let bvh = Bvh::build(&tri_bboxes).ok_or(MeshError::Empty)?;
        log::debug!(
            "prepared mesh: {} vertices, {} triangles",
            points.len(),
            triangles.len()
        );

        Ok(Self {
            points,
            triangles,
            bvh,
            bbox,
            tol,
        })
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Nearest hit as `(triangle index, t)`.
    #[must_use]
    pub fn closest_hit(&self, ray: &Ray3) -> Option<(usize, f64)> {
        if ray.is_degenerate(self.tol) {
            return None;
        }
        self.bvh.closest_hit(*ray, self.tol.eps, |tri_idx| {
            let tri = triangle_at(&self.points, self.triangles[tri_idx]);
            ray_triangle_intersection(*ray, tri, self.tol).map(|hit| hit.t)
        })
    }
}

impl RayTarget for PreparedMesh {
    fn ray_hit(&self, ray: &Ray3) -> Option<f64> {
        self.closest_hit(ray).map(|(_, t)| t)
    }
}

fn triangle_at(points: &[Point3], tri: [u32; 3]) -> Triangle3 {
    Triangle3::new(
        points[tri[0] as usize],
        points[tri[1] as usize],
        points[tri[2] as usize],
    )
}
