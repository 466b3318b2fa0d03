use serde::{Deserialize, Serialize};

use crate::geom::{GeomMesh, GridCounts, Point3, Tolerance};

use super::ShadowError;

/// Exclusive upper bound for `tolerance.eps`.
///
/// The same value is the ray hit threshold `t > eps`, and a sample sits at
/// `t = 1` on its light ray, so a large `eps` would discard real boundary hits.
pub const MAX_TOLERANCE: f64 = 1e-3;

/// Everything the shadow-volume query consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowVolumeInput {
    pub light1: Point3,
    /// Closed planar polyline; the closing point may be repeated or implicit.
    pub boundary1: Vec<Point3>,
    pub light2: Point3,
    pub boundary2: Vec<Point3>,
    pub corner_a: Point3,
    pub corner_b: Point3,
    pub wall: GeomMesh,
    pub x_count: usize,
    pub y_count: usize,
    pub z_count: usize,
}

impl ShadowVolumeInput {
    #[must_use]
    pub const fn counts(&self) -> GridCounts {
        GridCounts::new(self.x_count, self.y_count, self.z_count)
    }
}

/// What to do with a sample that passes both boundaries but whose ray misses the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingWallHitPolicy {
    /// Drop the sample from all outputs and count it.
    #[default]
    Disqualify,
    /// Abort with [`super::ShadowError::MissingWallHit`].
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowVolumeOptions {
    /// Ray hits need `t > tolerance.eps`; also used for boundary filling.
    /// Must be finite and in `(0, MAX_TOLERANCE)`.
    pub tolerance: Tolerance,
    pub missing_wall_hit: MissingWallHitPolicy,
    /// Reject an invalid wall mesh. When off, broken wall faces are skipped.
    pub validate_wall: bool,
}

impl Default for ShadowVolumeOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default_geom(),
            missing_wall_hit: MissingWallHitPolicy::default(),
            validate_wall: true,
        }
    }
}

impl ShadowVolumeOptions {
    pub fn validate(&self) -> Result<(), ShadowError> {
        let eps = self.tolerance.eps;
        if eps.is_finite() && eps > 0.0 && eps < MAX_TOLERANCE {
            Ok(())
        } else {
            Err(ShadowError::InvalidTolerance {
                eps,
                max: MAX_TOLERANCE,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fields_default_when_missing() {
        let options: ShadowVolumeOptions =
            serde_json::from_str(r#"{ "missing_wall_hit": "fail" }"#).expect("options");
        assert_eq!(options.missing_wall_hit, MissingWallHitPolicy::Fail);
        assert_eq!(options.tolerance, Tolerance::default_geom());
        assert!(options.validate_wall);

        let empty: ShadowVolumeOptions = serde_json::from_str("{}").expect("options");
        assert_eq!(empty, ShadowVolumeOptions::default());
    }

    #[test]
    fn tolerance_outside_usable_range_is_rejected() {
        assert!(ShadowVolumeOptions::default().validate().is_ok());
        for eps in [0.0, -1.0, 1.0, MAX_TOLERANCE, f64::NAN, f64::INFINITY] {
            let options = ShadowVolumeOptions {
                tolerance: Tolerance::new(eps),
                ..ShadowVolumeOptions::default()
            };
            assert!(
                matches!(options.validate(), Err(ShadowError::InvalidTolerance { .. })),
                "eps {eps} accepted"
            );
        }
    }

    #[test]
    fn input_reads_snake_case_fields() {
        let json = r#"{
            "light1": [0, 0, 10],
            "boundary1": [[-1, -1, 5], [1, -1, 5], [1, 1, 5], [-1, 1, 5]],
            "light2": [1, 0, 10],
            "boundary2": [[-1, -1, 5], [1, -1, 5], [1, 1, 5], [-1, 1, 5]],
            "corner_a": [0, 0, 0],
            "corner_b": [1, 1, 1],
            "wall": { "positions": [[0, 0, -1], [1, 0, -1], [1, 1, -1]], "faces": [[0, 1, 2]] },
            "x_count": 2,
            "y_count": 3,
            "z_count": 4
        }"#;
        let input: ShadowVolumeInput = serde_json::from_str(json).expect("input");
        assert_eq!(input.light2, Point3::new(1.0, 0.0, 10.0));
        assert_eq!(input.boundary1.len(), 4);
        assert_eq!(input.wall.face_count(), 1);
        assert_eq!(input.counts(), GridCounts::new(2, 3, 4));
    }
}
