use super::mesh::GeomMesh;
use super::triangulation::{UvPoint, triangulate_loop};
use super::{Point3, Tolerance, Vec3};

/// Planar fill of closed polyline boundaries.
///
/// Boundaries must be (approximately) planar simple loops without holes. The
/// output is an open triangle mesh patch whose triangles follow the loop's
/// own winding, so the patch normal matches the polyline's orientation.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("boundary points must be finite")]
    NonFinitePoint,
    #[error("boundary requires at least {min} unique points")]
    NotEnoughPoints { min: usize },
    #[error("boundary is degenerate (zero area)")]
    BoundaryDegenerate,
    #[error("boundary is not planar enough (max distance {max_distance})")]
    BoundaryNotPlanar { max_distance: f64 },
    #[error("failed to triangulate boundary: {0}")]
    Triangulation(String),
}

/// Turns a closed polyline into a mesh that rays can be tested against.
pub trait PolylineFill {
    fn fill(&self, polyline: &[Point3]) -> Result<GeomMesh, PatchError>;
}

/// Default [`PolylineFill`]: planarity check, projection to the polygon plane
/// and ear clipping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EarClipFill {
    pub tolerance: Tolerance,
}

impl EarClipFill {
    #[must_use]
    pub const fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }
}

impl PolylineFill for EarClipFill {
    fn fill(&self, polyline: &[Point3]) -> Result<GeomMesh, PatchError> {
        fill_closed_polyline_with_tolerance(polyline, self.tolerance)
    }
}

pub fn fill_closed_polyline(boundary: &[Point3]) -> Result<GeomMesh, PatchError> {
    fill_closed_polyline_with_tolerance(boundary, Tolerance::default_geom())
}

/// Fill a closed planar polyline. The closing point may be repeated or left implicit.
pub fn fill_closed_polyline_with_tolerance(
    boundary: &[Point3],
    tol: Tolerance,
) -> Result<GeomMesh, PatchError> {
    let outer = clean_closed_polyline(boundary, tol)?;

    let normal = polygon_normal(&outer);
    if !normal.length_squared().is_finite() || normal.length_squared() <= tol.eps_squared() {
        return Err(PatchError::BoundaryDegenerate);
    }
    let normal = normal.normalized().ok_or(PatchError::BoundaryDegenerate)?;

    // Planarity check: patch filling via 2D triangulation requires a stable plane.
    let planar_eps = (tol.eps * 1e3).max(tol.eps);
    let origin = outer[0];
    let max_distance = outer
        .iter()
        .map(|p| p.sub_point(origin).dot(normal).abs())
        .fold(0.0_f64, f64::max);
    if max_distance > planar_eps {
        return Err(PatchError::BoundaryNotPlanar { max_distance });
    }

    // (u, v, normal) is right-handed, so a loop that is counter-clockwise around
    // `normal` stays counter-clockwise in uv.
    let (u_axis, v_axis) = plane_basis(normal)?;
    let uv_points: Vec<UvPoint> = outer
        .iter()
        .map(|p| {
            let d = p.sub_point(origin);
            UvPoint::new(d.dot(u_axis), d.dot(v_axis))
        })
        .collect();

    let indices = triangulate_loop(&uv_points, tol).map_err(PatchError::Triangulation)?;
    log::debug!(
        "filled boundary: {} points -> {} triangles",
        outer.len(),
        indices.len() / 3
    );

    let positions = outer.iter().map(|p| p.to_array()).collect();
    Ok(GeomMesh::from_triangle_indices(positions, &indices))
}

fn plane_basis(normal: Vec3) -> Result<(Vec3, Vec3), PatchError> {
    let n = normal.normalized().ok_or(PatchError::BoundaryDegenerate)?;
    let axis = if n.x.abs() < 0.9 {
        Vec3::new(1.0, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 1.0, 0.0)
    };

    let v_axis = n.cross(axis).normalized().ok_or(PatchError::BoundaryDegenerate)?;
    let u_axis = v_axis.cross(n);
    Ok((u_axis, v_axis))
}

/// Newell normal; its length is twice the polygon area.
fn polygon_normal(points: &[Point3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

fn clean_closed_polyline(points: &[Point3], tol: Tolerance) -> Result<Vec<Point3>, PatchError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(PatchError::NonFinitePoint);
    }

    let mut cleaned: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points.iter().copied() {
        if cleaned
            .last()
            .copied()
            .is_some_and(|prev| tol.approx_eq_point3(prev, p))
        {
            continue;
        }
        cleaned.push(p);
    }

    if cleaned.len() > 2 {
        if let (Some(first), Some(last)) = (cleaned.first().copied(), cleaned.last().copied()) {
            if tol.approx_eq_point3(first, last) {
                cleaned.pop();
            }
        }
    }

    if cleaned.len() < 3 {
        return Err(PatchError::NotEnoughPoints { min: 3 });
    }

    Ok(cleaned)
}
