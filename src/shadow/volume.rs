use serde::Serialize;

use crate::geom::{
    EarClipFill, GeomMesh, GeomMetrics, GeomTimingReport, GridSpec, Point3, PolylineFill,
    PreparedMesh, TimingBucket, Tolerance,
};

use super::filter::filter_points_with_metrics;
use super::{
    LightSlot, OcclusionScene, ShadowError, ShadowVolumeInput, ShadowVolumeOptions,
};

/// Survivors (`points`), one cube per survivor and two wall points per survivor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShadowVolume {
    pub points: Vec<Point3>,
    pub cubes: Vec<GeomMesh>,
    pub wall_points: Vec<Point3>,
    pub diagnostics: ShadowVolumeDiagnostics,
}

/// Where the samples went.
///
/// `sample_count` is the sum of the three rejection counters and `survivor_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShadowVolumeDiagnostics {
    pub sample_count: usize,
    pub rejected_by_boundary1: usize,
    pub rejected_by_boundary2: usize,
    pub missing_wall_hits: usize,
    pub survivor_count: usize,
    /// Wall faces skipped because `validate_wall` was off; always 0 otherwise.
    pub wall_faces_dropped: usize,
    /// Present only when built with the `metrics` feature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<GeomTimingReport>,
}

/// Grid, boundary fill, mesh preparation and filtering in one call.
pub fn compute_shadow_volume(
    input: &ShadowVolumeInput,
    options: &ShadowVolumeOptions,
) -> Result<ShadowVolume, ShadowError> {
    compute_shadow_volume_with(input, options, &EarClipFill::new(options.tolerance))
}

/// [`compute_shadow_volume`] with a caller-supplied boundary fill.
pub fn compute_shadow_volume_with(
    input: &ShadowVolumeInput,
    options: &ShadowVolumeOptions,
    fill: &impl PolylineFill,
) -> Result<ShadowVolume, ShadowError> {
    options.validate()?;
    let mut metrics = GeomMetrics::default();
    metrics.begin();

    for (light, position) in [(LightSlot::First, input.light1), (LightSlot::Second, input.light2)] {
        if !position.is_finite() {
            return Err(ShadowError::NonFiniteLight { light });
        }
    }

    let grid = GridSpec::new(input.corner_a, input.corner_b, input.counts())?;
    let points = metrics.time(TimingBucket::Grid, || grid.points());
    let half_extents = grid.cell_half_extents();

    let boundary1 = metrics.time(TimingBucket::BoundaryFill, || {
        fill_boundary(fill, &input.boundary1, LightSlot::First)
    })?;
    let boundary2 = metrics.time(TimingBucket::BoundaryFill, || {
        fill_boundary(fill, &input.boundary2, LightSlot::Second)
    })?;

    let tol = options.tolerance;
    let (boundary1, boundary2, (wall, wall_faces_dropped)) =
        metrics.time(TimingBucket::Prepare, || {
            Ok::<_, ShadowError>((
                prepare_boundary(&boundary1, tol, LightSlot::First)?,
                prepare_boundary(&boundary2, tol, LightSlot::Second)?,
                prepare_wall(&input.wall, options)?,
            ))
        })?;

    let scene = OcclusionScene {
        light1: input.light1,
        boundary1: &boundary1,
        light2: input.light2,
        boundary2: &boundary2,
        wall: &wall,
    };
    let output = filter_points_with_metrics(&points, &scene, half_extents, options, &mut metrics)?;

    let counters = output.counters;
    let diagnostics = ShadowVolumeDiagnostics {
        sample_count: counters.sample_count,
        rejected_by_boundary1: counters.rejected_by_boundary1,
        rejected_by_boundary2: counters.rejected_by_boundary2,
        missing_wall_hits: counters.missing_wall_hits,
        survivor_count: output.points.len(),
        wall_faces_dropped,
        timing: metrics.end(),
    };
    if let Some(timing) = &diagnostics.timing {
        log::debug!("shadow volume computed in {:.3} ms", timing.total_ms());
    }

    Ok(ShadowVolume {
        points: output.points,
        cubes: output.cubes,
        wall_points: output.wall_points,
        diagnostics,
    })
}

fn fill_boundary(
    fill: &impl PolylineFill,
    polyline: &[Point3],
    which: LightSlot,
) -> Result<GeomMesh, ShadowError> {
    fill.fill(polyline)
        .map_err(|source| ShadowError::DegenerateBoundary { which, source })
}

fn prepare_boundary(
    mesh: &GeomMesh,
    tol: Tolerance,
    which: LightSlot,
) -> Result<PreparedMesh, ShadowError> {
    PreparedMesh::new(mesh, tol)
        .map_err(|source| ShadowError::InvalidBoundaryMesh { which, source })
}

/// The prepared wall and the number of faces dropped from it.
fn prepare_wall(
    wall: &GeomMesh,
    options: &ShadowVolumeOptions,
) -> Result<(PreparedMesh, usize), ShadowError> {
    if options.validate_wall {
        PreparedMesh::new(wall, options.tolerance)
            .map(|prepared| (prepared, 0))
            .map_err(ShadowError::InvalidWall)
    } else {
        PreparedMesh::new_lenient(wall, options.tolerance).map_err(ShadowError::InvalidWall)
    }
}
