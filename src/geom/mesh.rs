use serde::{Deserialize, Serialize};

use super::Point3;
use super::ray::Triangle3;

/// A single mesh face: a triangle or a quad, as vertex indices.
///
/// Quads keep their corner order; for ray tests they are split into
/// `(a, b, c)` and `(a, c, d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeshFace {
    Tri([u32; 3]),
    Quad([u32; 4]),
}

impl MeshFace {
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        match self {
            Self::Tri(idx) => idx,
            Self::Quad(idx) => idx,
        }
    }

    #[must_use]
    pub fn triangles(self) -> impl Iterator<Item = [u32; 3]> {
        let (first, second) = match self {
            Self::Tri([a, b, c]) => ([a, b, c], None),
            Self::Quad([a, b, c, d]) => ([a, b, c], Some([a, c, d])),
        };
        std::iter::once(first).chain(second)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no vertices or no faces")]
    Empty,
    #[error("mesh has invalid vertex coordinates (NaN/Inf)")]
    NonFiniteVertex,
    #[error("face {face} references vertex {index} but mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("face {face} repeats a vertex index")]
    DegenerateFace { face: usize },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub faces: Vec<MeshFace>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, faces: Vec<MeshFace>) -> Self {
        Self { positions, faces }
    }

    /// Build a mesh from a flat triangle index list (`len % 3 == 0`).
    /// A trailing partial triangle is dropped.
    #[must_use]
    pub fn from_triangle_indices(positions: Vec<[f64; 3]>, indices: &[u32]) -> Self {
        let faces = indices
            .chunks_exact(3)
            .map(|tri| MeshFace::Tri([tri[0], tri[1], tri[2]]))
            .collect();
        Self { positions, faces }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of triangles after splitting quads.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|face| match face {
                MeshFace::Tri(_) => 1,
                MeshFace::Quad(_) => 2,
            })
            .sum()
    }

    #[must_use]
    pub fn point(&self, index: u32) -> Option<Point3> {
        self.positions.get(index as usize).copied().map(Point3::from)
    }

    /// Triangles of the mesh, skipping any that reference missing vertices.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle3> + '_ {
        self.faces.iter().flat_map(|face| face.triangles()).filter_map(move |[a, b, c]| {
            Some(Triangle3::new(self.point(a)?, self.point(b)?, self.point(c)?))
        })
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions.iter().any(|p| !Point3::from(*p).is_finite())
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if self.positions.is_empty() || self.faces.is_empty() {
            return Err(MeshError::Empty);
        }
        if self.has_invalid_vertices() {
            return Err(MeshError::NonFiniteVertex);
        }

        let vertex_count = self.positions.len();
        for (face_idx, face) in self.faces.iter().enumerate() {
            let indices = face.indices();
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfBounds {
                    face: face_idx,
                    index,
                    vertex_count,
                });
            }
            let repeated = indices
                .iter()
                .enumerate()
                .any(|(i, a)| indices[i + 1..].contains(a));
            if repeated {
                return Err(MeshError::DegenerateFace { face: face_idx });
            }
        }
        Ok(())
    }
}
