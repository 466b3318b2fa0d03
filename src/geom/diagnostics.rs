//! Edge topology diagnostics for meshes.
//!
//! Edges are taken from the polygon faces as stored (a quad contributes its
//! four boundary edges, not the diagonal used for ray tests). Each undirected
//! edge is classified by how many faces use it and in which direction:
//!
//! - used once: open (boundary) edge
//! - used more than twice: non-manifold edge
//! - used twice in the same direction: inconsistently wound edge
//!
//! A closed, consistently wound solid has none of these.

use std::collections::HashMap;
use std::fmt;

use super::mesh::GeomMesh;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the mesh.
    pub vertex_count: usize,

    /// Total number of faces (triangles and quads) in the mesh.
    pub face_count: usize,

    /// Number of distinct undirected edges.
    pub edge_count: usize,

    /// Edges with only one adjacent face.
    pub open_edge_count: usize,

    /// Edges with more than two adjacent faces.
    pub non_manifold_edge_count: usize,

    /// Two-face edges traversed in the same direction by both faces.
    pub inconsistent_winding_edge_count: usize,

    /// Human-readable notes about detected issues.
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn from_mesh(mesh: &GeomMesh) -> Self {
        // (lo, hi) -> (uses in lo->hi direction, uses in hi->lo direction)
        let mut edges: HashMap<(u32, u32), (usize, usize)> = HashMap::new();
        for face in &mesh.faces {
            let indices = face.indices();
            for (i, &a) in indices.iter().enumerate() {
                let b = indices[(i + 1) % indices.len()];
                let entry = edges.entry((a.min(b), a.max(b))).or_default();
                if a < b {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }

        let mut diag = Self {
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            edge_count: edges.len(),
            ..Self::default()
        };

        for &(forward, backward) in edges.values() {
            match forward + backward {
                1 => diag.open_edge_count += 1,
                2 if forward != 1 => diag.inconsistent_winding_edge_count += 1,
                2 => {}
                _ => diag.non_manifold_edge_count += 1,
            }
        }

        if diag.open_edge_count > 0 {
            diag.add_warning("mesh has open edges");
        }
        if diag.non_manifold_edge_count > 0 {
            diag.add_warning("mesh has non-manifold edges");
        }
        if diag.inconsistent_winding_edge_count > 0 {
            diag.add_warning("mesh has inconsistent face winding");
        }
        diag
    }

    /// Returns `true` if the mesh is watertight (no open edges).
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    #[must_use]
    pub fn is_consistently_wound(&self) -> bool {
        self.inconsistent_winding_edge_count == 0
    }

    /// Watertight, manifold and consistently wound.
    #[must_use]
    pub fn is_valid_solid(&self) -> bool {
        self.is_watertight() && self.is_manifold() && self.is_consistently_wound()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} F:{faces} E:{edges} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "V:{} F:{} E:{}",
            self.vertex_count, self.face_count, self.edge_count
        )];

        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }
        if self.inconsistent_winding_edge_count > 0 {
            parts.push(format!("misoriented:{}", self.inconsistent_winding_edge_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
