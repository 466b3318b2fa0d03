//! The two-light shadow volume query.
//!
//! ```ignore
//! let volume = compute_shadow_volume(&input, &ShadowVolumeOptions::default())?;
//! assert_eq!(volume.wall_points.len(), 2 * volume.points.len());
//! ```

mod filter;
mod input;
mod volume;

use std::fmt;

use thiserror::Error;

use crate::geom::{GridError, MeshError, PatchError};

pub use filter::{FilterCounters, FilterOutput, OcclusionScene, filter_points};
pub use input::{MAX_TOLERANCE, MissingWallHitPolicy, ShadowVolumeInput, ShadowVolumeOptions};
pub use volume::{
    ShadowVolume, ShadowVolumeDiagnostics, compute_shadow_volume, compute_shadow_volume_with,
};

/// Which of the two lights (and its boundary) something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSlot {
    First,
    Second,
}

impl fmt::Display for LightSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "1",
            Self::Second => "2",
        })
    }
}

#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("tolerance must be finite and in (0, {max}), got {eps}")]
    InvalidTolerance { eps: f64, max: f64 },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("light {light} position must be finite")]
    NonFiniteLight { light: LightSlot },
    #[error("boundary {which} cannot be filled: {source}")]
    DegenerateBoundary {
        which: LightSlot,
        #[source]
        source: PatchError,
    },
    #[error("boundary {which} fill produced an invalid mesh: {source}")]
    InvalidBoundaryMesh {
        which: LightSlot,
        #[source]
        source: MeshError,
    },
    #[error("invalid wall mesh: {0}")]
    InvalidWall(#[source] MeshError),
    #[error("sample {index}: light {light} ray does not hit the wall")]
    MissingWallHit { index: usize, light: LightSlot },
}
