use super::Tolerance;

/// A point in a planar (u, v) parameter frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvPoint {
    pub u: f64,
    pub v: f64,
}

impl UvPoint {
    #[must_use]
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    idx: u32,
    point: UvPoint,
    prev: usize,
    next: usize,
}

/// Ear-clip a simple polygon given as a single closed loop (no repeated closing vertex).
///
/// Returns triangle indices into `loop_points`, wound counter-clockwise in uv.
/// Collinear and duplicate vertices are filtered out before clipping.
pub fn triangulate_loop(loop_points: &[UvPoint], tol: Tolerance) -> Result<Vec<u32>, String> {
    if loop_points.iter().any(|p| !p.u.is_finite() || !p.v.is_finite()) {
        return Err("triangulation vertices must be finite".to_string());
    }
    if loop_points.len() < 3 {
        return Err("polygon loop must have at least 3 points".to_string());
    }

    let mut nodes = build_ring_nodes(loop_points);
    let start = filter_ring_points(0, &mut nodes, tol)
        .ok_or_else(|| "polygon degenerates after filtering".to_string())?;

    let triangles = earclip_polygon(start, &mut nodes, tol)?;
    if triangles.is_empty() {
        return Err("triangulation produced no triangles".to_string());
    }

    Ok(triangles.into_iter().flatten().collect())
}

fn build_ring_nodes(points: &[UvPoint]) -> Vec<Node> {
    let len = points.len();
    points
        .iter()
        .enumerate()
        .map(|(i, &point)| Node {
            idx: i as u32,
            point,
            prev: (i + len - 1) % len,
            next: (i + 1) % len,
        })
        .collect()
}

fn ring_len(start: usize, nodes: &[Node]) -> usize {
    let mut count = 0usize;
    let mut cur = start;
    loop {
        count += 1;
        cur = nodes[cur].next;
        if cur == start || count > nodes.len() {
            break;
        }
    }
    count
}

fn filter_ring_points(start: usize, nodes: &mut [Node], tol: Tolerance) -> Option<usize> {
    if ring_len(start, nodes) < 3 {
        return None;
    }

    let mut start = start;
    let mut cur = start;
    let mut guard = 0usize;

    loop {
        guard += 1;
        if guard > nodes.len().saturating_mul(4).max(16) {
            break;
        }

        let prev = nodes[cur].prev;
        let next = nodes[cur].next;
        if cur == next || prev == next {
            return None;
        }

        let p = nodes[prev].point;
        let c = nodes[cur].point;
        let n = nodes[next].point;

        let dup = approx_eq_uv(p, c, tol) || approx_eq_uv(c, n, tol);
        let collinear = distance_point_to_line_2d(p, c, n) <= tol.eps;

        if dup || collinear {
            if cur == start {
                start = next;
            }
            remove_node(cur, nodes);
            if ring_len(start, nodes) < 3 {
                return None;
            }
            cur = prev;
            continue;
        }

        cur = next;
        if cur == start {
            break;
        }
    }

    Some(start)
}

fn earclip_polygon(start: usize, nodes: &mut [Node], tol: Tolerance) -> Result<Vec<[u32; 3]>, String> {
    let mut start = start;
    let is_ccw = signed_area_ring(start, nodes) > 0.0;
    let mut remaining = ring_len(start, nodes);

    let mut ear = start;
    let mut stop = start;
    let mut triangles = Vec::with_capacity(remaining.saturating_sub(2));
    let mut passes_without_clip = 0usize;

    while remaining > 2 {
        let prev = nodes[ear].prev;
        let next = nodes[ear].next;
        if is_ear(prev, ear, next, nodes, is_ccw, tol) {
            if is_ccw {
                triangles.push([nodes[prev].idx, nodes[ear].idx, nodes[next].idx]);
            } else {
                triangles.push([nodes[prev].idx, nodes[next].idx, nodes[ear].idx]);
            }

            if ear == start {
                start = next;
            }
            remove_node(ear, nodes);
            remaining -= 1;
            ear = next;
            stop = next;
            passes_without_clip = 0;
            continue;
        }

        ear = next;
        if ear == stop {
            passes_without_clip += 1;
            if passes_without_clip > 2 {
                return Err("failed to triangulate polygon (no ears found)".to_string());
            }
            start = match filter_ring_points(start, nodes, tol) {
                Some(start) => start,
                None => break,
            };
            remaining = ring_len(start, nodes);
            ear = start;
            stop = start;
        }
    }

    Ok(triangles)
}

fn is_ear(prev: usize, ear: usize, next: usize, nodes: &[Node], is_ccw: bool, tol: Tolerance) -> bool {
    let a = nodes[prev].point;
    let b = nodes[ear].point;
    let c = nodes[next].point;

    if distance_point_to_line_2d(a, b, c) <= tol.eps {
        return false;
    }

    let cross = orient2d(a, b, c);
    if (is_ccw && cross <= 0.0) || (!is_ccw && cross >= 0.0) {
        return false;
    }

    let mut p = nodes[next].next;
    let mut guard = 0usize;
    while p != prev {
        guard += 1;
        if guard > nodes.len() {
            break;
        }
        let pt = nodes[p].point;
        let shares_corner = approx_eq_uv(pt, a, tol) || approx_eq_uv(pt, b, tol) || approx_eq_uv(pt, c, tol);
        if !shares_corner && point_in_triangle(a, b, c, pt, is_ccw, tol) {
            return false;
        }
        p = nodes[p].next;
    }

    true
}

fn signed_area_ring(start: usize, nodes: &[Node]) -> f64 {
    let mut area = 0.0;
    let mut p = start;
    loop {
        let q = nodes[p].next;
        let a = nodes[p].point;
        let b = nodes[q].point;
        area += a.u * b.v - b.u * a.v;
        p = q;
        if p == start {
            break;
        }
    }
    0.5 * area
}

fn remove_node(node: usize, nodes: &mut [Node]) {
    let prev = nodes[node].prev;
    let next = nodes[node].next;
    nodes[prev].next = next;
    nodes[next].prev = prev;
}

fn approx_eq_uv(a: UvPoint, b: UvPoint, tol: Tolerance) -> bool {
    (a.u - b.u).abs() <= tol.eps && (a.v - b.v).abs() <= tol.eps
}

fn orient2d(a: UvPoint, b: UvPoint, c: UvPoint) -> f64 {
    (b.u - a.u) * (c.v - a.v) - (b.v - a.v) * (c.u - a.u)
}

fn point_in_triangle(a: UvPoint, b: UvPoint, c: UvPoint, p: UvPoint, is_ccw: bool, tol: Tolerance) -> bool {
    let ab = orient2d(a, b, p);
    let bc = orient2d(b, c, p);
    let ca = orient2d(c, a, p);

    if is_ccw {
        ab >= -tol.eps && bc >= -tol.eps && ca >= -tol.eps
    } else {
        ab <= tol.eps && bc <= tol.eps && ca <= tol.eps
    }
}

/// Distance from `p` to the line through `a` and `b`.
fn distance_point_to_line_2d(a: UvPoint, p: UvPoint, b: UvPoint) -> f64 {
    let du = b.u - a.u;
    let dv = b.v - a.v;
    let len = (du * du + dv * dv).sqrt();
    if len <= f64::EPSILON {
        let eu = p.u - a.u;
        let ev = p.v - a.v;
        return (eu * eu + ev * ev).sqrt();
    }
    orient2d(a, b, p).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(points: &[UvPoint], indices: &[u32]) -> f64 {
        indices
            .chunks_exact(3)
            .map(|t| {
                0.5 * orient2d(points[t[0] as usize], points[t[1] as usize], points[t[2] as usize])
            })
            .sum()
    }

    #[test]
    fn square_yields_two_ccw_triangles() {
        let square = [
            UvPoint::new(0.0, 0.0),
            UvPoint::new(1.0, 0.0),
            UvPoint::new(1.0, 1.0),
            UvPoint::new(0.0, 1.0),
        ];
        let indices = triangulate_loop(&square, Tolerance::default_geom()).expect("triangulate");
        assert_eq!(indices.len(), 6);
        assert!((area_of(&square, &indices) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clockwise_loop_is_emitted_ccw() {
        let square = [
            UvPoint::new(0.0, 0.0),
            UvPoint::new(0.0, 2.0),
            UvPoint::new(2.0, 2.0),
            UvPoint::new(2.0, 0.0),
        ];
        let indices = triangulate_loop(&square, Tolerance::default_geom()).expect("triangulate");
        assert!((area_of(&square, &indices) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn concave_l_shape_covers_its_area() {
        let l_shape = [
            UvPoint::new(0.0, 0.0),
            UvPoint::new(2.0, 0.0),
            UvPoint::new(2.0, 1.0),
            UvPoint::new(1.0, 1.0),
            UvPoint::new(1.0, 2.0),
            UvPoint::new(0.0, 2.0),
        ];
        let indices = triangulate_loop(&l_shape, Tolerance::default_geom()).expect("triangulate");
        assert_eq!(indices.len() / 3, 4);
        assert!((area_of(&l_shape, &indices) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_vertices_are_dropped() {
        let with_midpoint = [
            UvPoint::new(0.0, 0.0),
            UvPoint::new(0.5, 0.0),
            UvPoint::new(1.0, 0.0),
            UvPoint::new(1.0, 1.0),
            UvPoint::new(0.0, 1.0),
        ];
        let indices = triangulate_loop(&with_midpoint, Tolerance::default_geom()).expect("triangulate");
        assert_eq!(indices.len() / 3, 2);
        assert!(!indices.contains(&1));
    }

    #[test]
    fn degenerate_loops_are_rejected() {
        let tol = Tolerance::default_geom();
        let line = [UvPoint::new(0.0, 0.0), UvPoint::new(1.0, 0.0), UvPoint::new(2.0, 0.0)];
        assert!(triangulate_loop(&line, tol).is_err());
        assert!(triangulate_loop(&line[..2], tol).is_err());
        let nan = [UvPoint::new(0.0, 0.0), UvPoint::new(f64::NAN, 0.0), UvPoint::new(0.0, 1.0)];
        assert!(triangulate_loop(&nan, tol).is_err());
    }
}
