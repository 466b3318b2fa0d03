//! Per-sample occlusion and wall projection.
//!
//! A sample `P` survives when the ray from each light toward `P` crosses that
//! light's boundary. Boundary 2 is only tested once boundary 1 passed. For every
//! survivor both rays are continued to the wall; the two wall points are
//! reported in light order.
//!
//! Samples are evaluated independently (on rayon with the `parallel` feature)
//! and folded in input order, so the outputs never depend on scheduling.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geom::{
    GeomMesh, GeomMetrics, Point3, Ray3, RayTarget, TimingBucket, Vec3, grid_cube,
};

use super::{LightSlot, MissingWallHitPolicy, ShadowError, ShadowVolumeOptions};

/// The two lights, their boundaries and the wall, as ray targets.
#[derive(Clone, Copy)]
pub struct OcclusionScene<'a> {
    pub light1: Point3,
    pub boundary1: &'a dyn RayTarget,
    pub light2: Point3,
    pub boundary2: &'a dyn RayTarget,
    pub wall: &'a dyn RayTarget,
}

impl std::fmt::Debug for OcclusionScene<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcclusionScene")
            .field("light1", &self.light1)
            .field("light2", &self.light2)
            .finish_non_exhaustive()
    }
}

/// Survivors in input order, with their cubes and wall points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutput {
    pub points: Vec<Point3>,
    pub cubes: Vec<GeomMesh>,
    /// Two per survivor: the light1 wall hit, then the light2 wall hit.
    pub wall_points: Vec<Point3>,
    pub counters: FilterCounters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounters {
    pub sample_count: usize,
    pub rejected_by_boundary1: usize,
    pub rejected_by_boundary2: usize,
    pub missing_wall_hits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Occlusion {
    Admitted,
    RejectedBy(LightSlot),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Projection {
    Hit(Point3, Point3),
    Missing(LightSlot),
}

/// Runs the occlusion test, wall projection and cube building over `points`.
pub fn filter_points(
    points: &[Point3],
    scene: &OcclusionScene<'_>,
    half_extents: Vec3,
    options: &ShadowVolumeOptions,
) -> Result<FilterOutput, ShadowError> {
    filter_points_with_metrics(points, scene, half_extents, options, &mut GeomMetrics::default())
}

pub(crate) fn filter_points_with_metrics(
    points: &[Point3],
    scene: &OcclusionScene<'_>,
    half_extents: Vec3,
    options: &ShadowVolumeOptions,
    metrics: &mut GeomMetrics,
) -> Result<FilterOutput, ShadowError> {
    let mut counters = FilterCounters {
        sample_count: points.len(),
        ..FilterCounters::default()
    };

    let occlusion = metrics.time(TimingBucket::Occlusion, || occlude_all(points, scene));
    let mut admitted = Vec::with_capacity(points.len());
    for (index, outcome) in occlusion.into_iter().enumerate() {
        match outcome {
            Occlusion::Admitted => admitted.push(index),
            Occlusion::RejectedBy(LightSlot::First) => counters.rejected_by_boundary1 += 1,
            Occlusion::RejectedBy(LightSlot::Second) => counters.rejected_by_boundary2 += 1,
        }
    }

    let projections =
        metrics.time(TimingBucket::Projection, || project_all(points, &admitted, scene));

    let mut survivors = Vec::with_capacity(admitted.len());
    let mut wall_points = Vec::with_capacity(admitted.len() * 2);
    for (&index, projection) in admitted.iter().zip(projections) {
        match projection {
            Projection::Hit(hit1, hit2) => {
                survivors.push(points[index]);
                wall_points.push(hit1);
                wall_points.push(hit2);
            }
            Projection::Missing(light) => match options.missing_wall_hit {
                MissingWallHitPolicy::Fail => {
                    return Err(ShadowError::MissingWallHit { index, light });
                }
                MissingWallHitPolicy::Disqualify => {
                    log::debug!("sample {index}: light {light} ray misses the wall, dropped");
                    counters.missing_wall_hits += 1;
                }
            },
        }
    }

    let cubes: Vec<GeomMesh> = metrics.time(TimingBucket::Cubes, || {
        survivors.iter().map(|&p| grid_cube(p, half_extents)).collect()
    });

    log::debug!(
        "filtered {} samples: {} survivors, rejected {} by boundary 1, {} by boundary 2, {} missing wall hits",
        counters.sample_count,
        survivors.len(),
        counters.rejected_by_boundary1,
        counters.rejected_by_boundary2,
        counters.missing_wall_hits
    );

    Ok(FilterOutput {
        points: survivors,
        cubes,
        wall_points,
        counters,
    })
}

fn occlude(point: Point3, scene: &OcclusionScene<'_>) -> Occlusion {
    if scene.boundary1.ray_hit(&Ray3::through(scene.light1, point)).is_none() {
        return Occlusion::RejectedBy(LightSlot::First);
    }
    if scene.boundary2.ray_hit(&Ray3::through(scene.light2, point)).is_none() {
        return Occlusion::RejectedBy(LightSlot::Second);
    }
    Occlusion::Admitted
}

fn project(point: Point3, scene: &OcclusionScene<'_>) -> Projection {
    let ray1 = Ray3::through(scene.light1, point);
    let Some(t1) = scene.wall.ray_hit(&ray1) else {
        return Projection::Missing(LightSlot::First);
    };
    let ray2 = Ray3::through(scene.light2, point);
    let Some(t2) = scene.wall.ray_hit(&ray2) else {
        return Projection::Missing(LightSlot::Second);
    };
    Projection::Hit(ray1.point_at(t1), ray2.point_at(t2))
}

#[cfg(feature = "parallel")]
fn occlude_all(points: &[Point3], scene: &OcclusionScene<'_>) -> Vec<Occlusion> {
    points.par_iter().map(|&p| occlude(p, scene)).collect()
}

#[cfg(not(feature = "parallel"))]
fn occlude_all(points: &[Point3], scene: &OcclusionScene<'_>) -> Vec<Occlusion> {
    points.iter().map(|&p| occlude(p, scene)).collect()
}

#[cfg(feature = "parallel")]
fn project_all(points: &[Point3], admitted: &[usize], scene: &OcclusionScene<'_>) -> Vec<Projection> {
    admitted.par_iter().map(|&i| project(points[i], scene)).collect()
}

#[cfg(not(feature = "parallel"))]
fn project_all(points: &[Point3], admitted: &[usize], scene: &OcclusionScene<'_>) -> Vec<Projection> {
    admitted.iter().map(|&i| project(points[i], scene)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hits everything at a fixed parameter.
    struct Always(f64);

    impl RayTarget for Always {
        fn ray_hit(&self, _ray: &Ray3) -> Option<f64> {
            Some(self.0)
        }
    }

    /// Hits only rays whose target (t = 1) has `x < limit`.
    struct LeftOf(f64);

    impl RayTarget for LeftOf {
        fn ray_hit(&self, ray: &Ray3) -> Option<f64> {
            (ray.point_at(1.0).x < self.0).then_some(0.5)
        }
    }

    struct Never;

    impl RayTarget for Never {
        fn ray_hit(&self, _ray: &Ray3) -> Option<f64> {
            None
        }
    }

    fn samples() -> Vec<Point3> {
        (0..4).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect()
    }

    #[test]
    fn boundary_rejections_are_counted_per_light() {
        let scene = OcclusionScene {
            light1: Point3::new(0.0, 0.0, 10.0),
            boundary1: &LeftOf(2.5),
            light2: Point3::new(0.0, 0.0, 10.0),
            boundary2: &LeftOf(1.5),
            wall: &Always(2.0),
        };
        let out = filter_points(&samples(), &scene, Vec3::new(0.5, 0.5, 0.5), &ShadowVolumeOptions::default())
            .expect("filter");

        assert_eq!(out.points, vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]);
        assert_eq!(out.cubes.len(), 2);
        assert_eq!(out.wall_points.len(), 4);
        assert_eq!(
            out.counters,
            FilterCounters {
                sample_count: 4,
                rejected_by_boundary1: 1,
                rejected_by_boundary2: 1,
                missing_wall_hits: 0,
            }
        );
        // t = 2 from a light at z = 10 toward z = 0 lands on z = -10.
        assert!(out.wall_points.iter().all(|p| (p.z + 10.0).abs() < 1e-12));
    }

    #[test]
    fn missing_wall_hit_disqualifies_by_default() {
        let scene = OcclusionScene {
            light1: Point3::new(0.0, 0.0, 10.0),
            boundary1: &Always(0.5),
            light2: Point3::new(0.0, 0.0, 10.0),
            boundary2: &Always(0.5),
            wall: &LeftOf(1.5),
        };
        let out = filter_points(&samples(), &scene, Vec3::new(0.5, 0.5, 0.5), &ShadowVolumeOptions::default())
            .expect("filter");
        assert_eq!(out.points.len(), 2);
        assert_eq!(out.wall_points.len(), 4);
        assert_eq!(out.counters.missing_wall_hits, 2);
    }

    #[test]
    fn missing_wall_hit_fails_at_first_sample_when_asked() {
        let scene = OcclusionScene {
            light1: Point3::new(0.0, 0.0, 10.0),
            boundary1: &Always(0.5),
            light2: Point3::new(0.0, 0.0, 10.0),
            boundary2: &Always(0.5),
            wall: &LeftOf(1.5),
        };
        let options = ShadowVolumeOptions {
            missing_wall_hit: MissingWallHitPolicy::Fail,
            ..ShadowVolumeOptions::default()
        };
        let err = filter_points(&samples(), &scene, Vec3::new(0.5, 0.5, 0.5), &options).unwrap_err();
        assert!(matches!(
            err,
            ShadowError::MissingWallHit { index: 2, light: LightSlot::First }
        ));
    }

    #[test]
    fn boundary2_is_not_tested_after_boundary1_rejects() {
        let scene = OcclusionScene {
            light1: Point3::new(0.0, 0.0, 10.0),
            boundary1: &Never,
            light2: Point3::new(0.0, 0.0, 10.0),
            boundary2: &Never,
            wall: &Never,
        };
        let out = filter_points(&samples(), &scene, Vec3::new(0.5, 0.5, 0.5), &ShadowVolumeOptions::default())
            .expect("filter");
        assert!(out.points.is_empty());
        assert_eq!(out.counters.rejected_by_boundary1, 4);
        assert_eq!(out.counters.rejected_by_boundary2, 0);
    }

    #[cfg(feature = "parallel")]
    mod parallel {
        use super::*;
        use crate::geom::{
            GridCounts, GridSpec, MeshFace, PreparedMesh, Tolerance, fill_closed_polyline,
        };

        fn rectangle(min: [f64; 2], max: [f64; 2], z: f64) -> Vec<Point3> {
            vec![
                Point3::new(min[0], min[1], z),
                Point3::new(max[0], min[1], z),
                Point3::new(max[0], max[1], z),
                Point3::new(min[0], max[1], z),
            ]
        }

        fn prepare(mesh: &GeomMesh) -> PreparedMesh {
            PreparedMesh::new(mesh, Tolerance::default_geom()).expect("prepare")
        }

        struct Meshes {
            boundary1: PreparedMesh,
            boundary2: PreparedMesh,
            wall: PreparedMesh,
        }

        impl Meshes {
            fn new() -> Self {
                let boundary1 = fill_closed_polyline(&rectangle([-1.0, -1.0], [1.1, 3.0], 5.0))
                    .expect("fill");
                let boundary2 = fill_closed_polyline(&rectangle([1.0, -1.0], [2.9, 1.1], 5.0))
                    .expect("fill");
                let wall = GeomMesh::new(
                    rectangle([-50.0, -50.0], [50.0, 50.0], -2.0)
                        .into_iter()
                        .map(Point3::to_array)
                        .collect(),
                    vec![MeshFace::Quad([0, 1, 2, 3])],
                );
                Self {
                    boundary1: prepare(&boundary1),
                    boundary2: prepare(&boundary2),
                    wall: prepare(&wall),
                }
            }

            fn scene(&self) -> OcclusionScene<'_> {
                OcclusionScene {
                    light1: Point3::new(0.0, 0.0, 10.0),
                    boundary1: &self.boundary1,
                    light2: Point3::new(4.0, 0.0, 10.0),
                    boundary2: &self.boundary2,
                    wall: &self.wall,
                }
            }
        }

        fn grid(count: usize) -> GridSpec {
            GridSpec::new(
                Point3::ORIGIN,
                Point3::new(2.0, 2.0, 2.0),
                GridCounts::new(count, count, count),
            )
            .expect("grid")
        }

        #[test]
        fn rayon_filter_keeps_hand_computed_survivors() {
            let meshes = Meshes::new();
            let grid = grid(2);
            let out = filter_points(
                &grid.points(),
                &meshes.scene(),
                grid.cell_half_extents(),
                &ShadowVolumeOptions::default(),
            )
            .expect("filter");

            assert_eq!(
                out.points,
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(0.0, 2.0, 0.0),
                    Point3::new(0.0, 0.0, 2.0),
                ]
            );
            assert_eq!(out.counters.rejected_by_boundary1, 2);
            assert_eq!(out.counters.rejected_by_boundary2, 3);
            assert_eq!(out.wall_points.len(), 6);
        }

        #[test]
        fn rayon_phases_match_sequential_evaluation() {
            let meshes = Meshes::new();
            let scene = meshes.scene();
            let points = grid(9).points();

            let occlusion = occlude_all(&points, &scene);
            let sequential: Vec<Occlusion> = points.iter().map(|&p| occlude(p, &scene)).collect();
            assert_eq!(occlusion, sequential);

            let admitted: Vec<usize> = (0..points.len())
                .filter(|&i| occlusion[i] == Occlusion::Admitted)
                .collect();
            assert!(!admitted.is_empty());
            let projections = project_all(&points, &admitted, &scene);
            let sequential: Vec<Projection> =
                admitted.iter().map(|&i| project(points[i], &scene)).collect();
            assert_eq!(projections, sequential);
        }
    }
}
