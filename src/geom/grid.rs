use serde::{Deserialize, Serialize};

use super::{Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridAxis {
    X,
    Y,
    Z,
}

impl std::fmt::Display for GridAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("invalid grid dimension: {axis} count is {count}, at least 2 required")]
    InvalidGridDimension { axis: GridAxis, count: usize },
    #[error("grid corners must be finite")]
    NonFiniteCorner,
    #[error("grid of {x} x {y} x {z} points is too large")]
    TooManyPoints { x: usize, y: usize, z: usize },
}

/// Number of samples per axis, corner to corner inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCounts {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridCounts {
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    pub fn validate(self) -> Result<(), GridError> {
        for (axis, count) in [(GridAxis::X, self.x), (GridAxis::Y, self.y), (GridAxis::Z, self.z)] {
            if count < 2 {
                return Err(GridError::InvalidGridDimension { axis, count });
            }
        }
        Ok(())
    }

    /// `x * y * z`, or `None` on overflow.
    #[must_use]
    pub fn total(self) -> Option<usize> {
        self.x.checked_mul(self.y)?.checked_mul(self.z)
    }
}

/// Largest sample count whose `Vec<Point3>` stays under the `isize::MAX` byte limit.
pub const MAX_GRID_POINTS: usize = isize::MAX as usize / std::mem::size_of::<Point3>();

/// A regular lattice between two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    corner_a: Point3,
    corner_b: Point3,
    counts: GridCounts,
}

impl GridSpec {
    pub fn new(corner_a: Point3, corner_b: Point3, counts: GridCounts) -> Result<Self, GridError> {
        counts.validate()?;
        if !corner_a.is_finite() || !corner_b.is_finite() {
            return Err(GridError::NonFiniteCorner);
        }
        if counts.total().is_none_or(|total| total > MAX_GRID_POINTS) {
            return Err(GridError::TooManyPoints {
                x: counts.x,
                y: counts.y,
                z: counts.z,
            });
        }

        let span = corner_b.sub_point(corner_a);
        if span.x == 0.0 || span.y == 0.0 || span.z == 0.0 {
            log::warn!("grid has zero span on at least one axis: {span:?}");
        }

        Ok(Self {
            corner_a,
            corner_b,
            counts,
        })
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.counts.x * self.counts.y * self.counts.z
    }

    /// Signed spacing between neighbouring samples, `(B - A) / (count - 1)` per axis.
    #[must_use]
    pub fn step(&self) -> Vec3 {
        let span = self.corner_b.sub_point(self.corner_a);
        Vec3::new(
            span.x / (self.counts.x - 1) as f64,
            span.y / (self.counts.y - 1) as f64,
            span.z / (self.counts.z - 1) as f64,
        )
    }

    /// Half of the step on each axis, as a non-negative extent.
    #[must_use]
    pub fn cell_half_extents(&self) -> Vec3 {
        self.step().mul_scalar(0.5).abs()
    }

    /// All lattice points, x fastest, then y, then z.
    #[must_use]
    pub fn points(&self) -> Vec<Point3> {
        let xs = axis_samples(self.corner_a.x, self.corner_b.x, self.counts.x);
        let ys = axis_samples(self.corner_a.y, self.corner_b.y, self.counts.y);
        let zs = axis_samples(self.corner_a.z, self.corner_b.z, self.counts.z);

        let mut points = Vec::with_capacity(self.point_count());
        for &z in &zs {
            for &y in &ys {
                for &x in &xs {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }
}

/// Grid of `counts.x * counts.y * counts.z` points spanning `corner_a` to `corner_b`.
pub fn grid_points(corner_a: Point3, corner_b: Point3, counts: GridCounts) -> Result<Vec<Point3>, GridError> {
    Ok(GridSpec::new(corner_a, corner_b, counts)?.points())
}

/// `count` samples from `start` to `end`; the last sample is `end` exactly.
fn axis_samples(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / (count - 1) as f64;
    (0..count)
        .map(|i| if i + 1 == count { end } else { start + i as f64 * step })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_samples_end_exactly_on_corner() {
        let samples = axis_samples(0.1, 0.7, 4);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.1);
        assert_eq!(samples[3], 0.7);
        assert!((samples[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn descending_corners_keep_positive_half_extents() {
        let spec = GridSpec::new(
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, -6.0),
            GridCounts::new(3, 2, 4),
        )
        .expect("grid");
        assert_eq!(spec.step(), Vec3::new(-2.0, 2.0, -2.0));
        assert_eq!(spec.cell_half_extents(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let err = GridSpec::new(
            Point3::ORIGIN,
            Point3::new(1.0, 1.0, 1.0),
            GridCounts::new(usize::MAX, 2, 2),
        )
        .unwrap_err();
        assert!(matches!(err, GridError::TooManyPoints { .. }));
    }

    #[test]
    fn counts_beyond_allocation_limit_are_rejected() {
        // 2^59 points fit in a 64-bit usize, but not in memory.
        let err = GridSpec::new(
            Point3::ORIGIN,
            Point3::new(1.0, 1.0, 1.0),
            GridCounts::new(1 << 20, 1 << 20, 1 << 19),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GridError::TooManyPoints {
                x: 1 << 20,
                y: 1 << 20,
                z: 1 << 19
            }
        );

        let largest = GridCounts::new(MAX_GRID_POINTS / 4, 2, 2);
        assert!(GridSpec::new(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0), largest).is_ok());
    }

    #[test]
    fn non_finite_corner_is_rejected() {
        let err = grid_points(
            Point3::new(f64::NAN, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            GridCounts::new(2, 2, 2),
        )
        .unwrap_err();
        assert_eq!(err, GridError::NonFiniteCorner);
    }
}
