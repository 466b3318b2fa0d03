use super::{BBox, Point3, Tolerance, Vec3};

/// Half-line `origin + t * direction`, `t >= 0`.
///
/// The direction is kept as given (not normalized), so `t` is measured in
/// multiples of the direction length. A ray built with [`Ray3::through`]
/// reaches its target at `t == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3 {
    pub origin: Point3,
    pub direction: Vec3,
}

impl Ray3 {
    #[must_use]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray starting at `origin` and passing through `target`.
    #[must_use]
    pub fn through(origin: Point3, target: Point3) -> Self {
        Self::new(origin, target.sub_point(origin))
    }

    #[must_use]
    pub fn point_at(self, t: f64) -> Point3 {
        self.origin.add_vec(self.direction.mul_scalar(t))
    }

    /// A ray with a zero or non-finite direction cannot hit anything.
    #[must_use]
    pub fn is_degenerate(self, tol: Tolerance) -> bool {
        !self.origin.is_finite() || !self.direction.is_finite() || tol.is_zero_vec3(self.direction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle3 {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

impl Triangle3 {
    #[must_use]
    pub const fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    #[must_use]
    pub fn normal(self) -> Vec3 {
        self.b.sub_point(self.a).cross(self.c.sub_point(self.a))
    }

    #[must_use]
    pub fn bbox(self) -> BBox {
        BBox::new(self.a, self.a).expand_point(self.b).expand_point(self.c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

/// Möller–Trumbore ray/triangle test.
///
/// Returns hits strictly in front of the origin (`t > tol.eps`). Hits on edges
/// and vertices are accepted within `tol.eps` of barycentric slack; rays parallel
/// to the triangle plane never hit.
#[must_use]
pub fn ray_triangle_intersection(ray: Ray3, tri: Triangle3, tol: Tolerance) -> Option<RayHit> {
    let dir = ray.direction;
    let edge1 = tri.b.sub_point(tri.a);
    let edge2 = tri.c.sub_point(tri.a);
    let h = dir.cross(edge2);
    let det = edge1.dot(h);
    let det_eps = tol.eps * edge1.length() * h.length();
    if !det.is_finite() || det.abs() <= det_eps {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin.sub_point(tri.a);
    let u = inv_det * s.dot(h);
    let uv_eps = tol.eps;
    if u < -uv_eps || u > 1.0 + uv_eps {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * dir.dot(q);
    if v < -uv_eps || u + v > 1.0 + uv_eps {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    if !t.is_finite() || t <= tol.eps {
        return None;
    }

    Some(RayHit { t, u, v })
}

/// Slab test of a ray against an axis-aligned box over `[t_min, t_max]`.
pub(crate) fn ray_intersects_bbox(ray: Ray3, bbox: BBox, t_min: f64, t_max: f64) -> bool {
    let origin = ray.origin.to_array();
    let dir = ray.direction.to_array();
    let min = bbox.min.to_array();
    let max = bbox.max.to_array();

    let mut lo = t_min;
    let mut hi = t_max;
    for axis in 0..3 {
        if dir[axis].abs() <= f64::EPSILON {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / dir[axis];
        let mut t0 = (min[axis] - origin[axis]) * inv;
        let mut t1 = (max[axis] - origin[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        lo = lo.max(t0);
        hi = hi.min(t1);
        if lo > hi {
            return false;
        }
    }
    true
}
