//! Loop subdivision.
//!
//! Loop subdivision (Loop, 1987) is an approximating scheme for triangle
//! meshes. Each iteration:
//!
//! 1. Inserts a new vertex on every edge (weighted by the two opposite vertices)
//! 2. Repositions every original vertex from its one-ring
//! 3. Splits each triangle into four
//!
//! Boundaries are kept sharp: boundary edges split at their midpoint and
//! boundary vertices only see their two boundary neighbors.
//!
//! # Example
//!
//! ```
//! use chisel::algo::subdivide::Subdivide;
//! use chisel::algo::TopologyOp;
//! use chisel::mesh::build_from_triangles;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let refined = Subdivide::new(2).unwrap().apply(&mesh).unwrap();
//! assert_eq!(refined.num_faces(), 16);
//! ```
//!
//! # References
//!
//! - Loop, C. (1987). "Smooth Subdivision Surfaces Based on Triangles."
//!   Master's thesis, University of Utah.

mod loop_subdivision;

pub use loop_subdivision::loop_subdivide;

use crate::error::{Result, SculptError};
use crate::mesh::{build_from_triangles, HalfEdgeMesh};

use super::TopologyOp;

/// Largest supported iteration count.
pub const MAX_ITERATIONS: usize = 3;

/// Loop subdivision as a topology operation.
#[derive(Debug, Clone)]
pub struct Subdivide {
    /// Number of subdivision iterations (1 to 3).
    pub iterations: usize,

    /// Refuse to produce a mesh with more vertices than this.
    pub max_vertices: usize,
}

impl Subdivide {
    /// Create an operator for the given number of iterations.
    pub fn new(iterations: usize) -> Result<Self> {
        if !(1..=MAX_ITERATIONS).contains(&iterations) {
            return Err(SculptError::invalid_param(
                "iterations",
                iterations,
                "must be between 1 and 3",
            ));
        }
        Ok(Self {
            iterations,
            max_vertices: usize::MAX,
        })
    }

    /// Set the vertex ceiling.
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }
}

impl TopologyOp for Subdivide {
    fn name(&self) -> &'static str {
        "subdivide"
    }

    fn apply(&self, mesh: &HalfEdgeMesh) -> Result<HalfEdgeMesh> {
        let mut vertices = mesh.positions().to_vec();
        let mut faces = mesh.triangles();

        for iter in 0..self.iterations {
            let (next_vertices, next_faces) = loop_subdivide(&vertices, &faces);
            if next_vertices.len() > self.max_vertices {
                return Err(SculptError::topology(
                    "subdivide",
                    format!(
                        "iteration {} would produce {} vertices (limit {})",
                        iter + 1,
                        next_vertices.len(),
                        self.max_vertices
                    ),
                ));
            }
            vertices = next_vertices;
            faces = next_faces;
        }

        build_from_triangles(&vertices, &faces)
            .map_err(|e| SculptError::topology("subdivide", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn create_tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_iteration_range() {
        assert!(Subdivide::new(0).is_err());
        assert!(Subdivide::new(4).is_err());
        for i in 1..=3 {
            assert_eq!(Subdivide::new(i).unwrap().iterations, i);
        }
    }

    #[test]
    fn test_face_count_quadruples() {
        let mesh = create_tetrahedron();
        for i in 1..=3 {
            let out = Subdivide::new(i).unwrap().apply(&mesh).unwrap();
            assert_eq!(out.num_faces(), mesh.num_faces() * 4usize.pow(i as u32));
            assert!(out.is_valid());
        }
    }

    #[test]
    fn test_euler_characteristic_preserved() {
        let mesh = create_tetrahedron();
        let euler = |m: &HalfEdgeMesh| {
            m.num_vertices() as i64 - (m.num_halfedges() / 2) as i64 + m.num_faces() as i64
        };

        let out = Subdivide::new(2).unwrap().apply(&mesh).unwrap();
        assert_eq!(euler(&out), euler(&mesh));
    }

    #[test]
    fn test_vertex_ceiling() {
        let mesh = create_tetrahedron();
        // 4 -> 10 -> 34 vertices
        let op = Subdivide::new(2).unwrap().with_max_vertices(20);
        let err = op.apply(&mesh).unwrap_err();
        assert!(matches!(err, SculptError::TopologyFailed { operation: "subdivide", .. }));

        let op = Subdivide::new(2).unwrap().with_max_vertices(34);
        assert_eq!(op.apply(&mesh).unwrap().num_vertices(), 34);
    }

    #[test]
    fn test_input_untouched() {
        let mesh = create_tetrahedron();
        let before = mesh.positions().to_vec();
        let _ = Subdivide::new(1).unwrap().apply(&mesh).unwrap();
        assert_eq!(mesh.positions(), &before[..]);
    }
}
