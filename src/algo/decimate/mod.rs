//! Mesh decimation by quadric error metrics.
//!
//! The QEM algorithm (Garland & Heckbert, 1997) collapses edges in order of
//! increasing geometric error. Each vertex carries a quadric, the sum of
//! squared distances to the planes of its original faces, and each collapse
//! places the surviving vertex where the combined quadric is smallest.
//!
//! Boundary edges are never collapsed and boundary vertices never move, so an
//! open surface keeps its outline.
//!
//! # Example
//!
//! ```
//! use chisel::algo::decimate::Decimate;
//! use chisel::algo::TopologyOp;
//! use chisel::mesh::build_from_triangles;
//! use nalgebra::Point3;
//!
//! // Octahedron
//! let vertices = vec![
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, -1.0),
//! ];
//! let faces = vec![
//!     [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
//!     [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
//! ];
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let coarse = Decimate::new(0.5).unwrap().apply(&mesh).unwrap();
//! assert!(coarse.num_faces() < 8);
//! ```
//!
//! # References
//!
//! - Garland, M. & Heckbert, P. (1997). "Surface Simplification Using Quadric
//!   Error Metrics." SIGGRAPH '97.

mod qem;

pub use qem::qem_decimate;

use crate::error::{Result, SculptError};
use crate::mesh::{build_from_triangles, HalfEdgeMesh};

use super::TopologyOp;

/// Smallest accepted reduction fraction.
pub const MIN_REDUCTION: f64 = 0.05;

/// Largest accepted reduction fraction.
pub const MAX_REDUCTION: f64 = 0.90;

/// QEM decimation as a topology operation.
#[derive(Debug, Clone)]
pub struct Decimate {
    /// Fraction of triangles to remove (0.05 to 0.90).
    pub reduction: f64,
}

impl Decimate {
    /// Create an operator removing the given fraction of triangles.
    pub fn new(reduction: f64) -> Result<Self> {
        if !(MIN_REDUCTION..=MAX_REDUCTION).contains(&reduction) {
            return Err(SculptError::invalid_param(
                "reduction",
                reduction,
                "must be between 0.05 and 0.90",
            ));
        }
        Ok(Self { reduction })
    }

    /// Number of faces to aim for, given the current count.
    pub fn target_faces(&self, faces: usize) -> usize {
        ((faces as f64) * (1.0 - self.reduction)).round() as usize
    }
}

impl TopologyOp for Decimate {
    fn name(&self) -> &'static str {
        "decimate"
    }

    fn apply(&self, mesh: &HalfEdgeMesh) -> Result<HalfEdgeMesh> {
        let faces = mesh.triangles();
        let target = self.target_faces(faces.len());

        let (new_vertices, new_faces) = qem_decimate(mesh.positions(), &faces, target);

        if new_faces.len() >= faces.len() {
            return Err(SculptError::topology("decimate", "no edge could be collapsed"));
        }
        if new_faces.is_empty() {
            return Err(SculptError::topology("decimate", "result has no faces"));
        }

        let result = build_from_triangles(&new_vertices, &new_faces)
            .map_err(|e| SculptError::topology("decimate", e.to_string()))?;

        log::debug!(
            "decimate: {} -> {} faces (target {})",
            faces.len(),
            result.num_faces(),
            target
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn create_grid_mesh(nx: usize, ny: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for j in 0..ny {
            for i in 0..nx {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..ny - 1 {
            for i in 0..nx - 1 {
                let v00 = j * nx + i;
                let v10 = v00 + 1;
                let v01 = v00 + nx;
                let v11 = v01 + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

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
    fn test_reduction_range() {
        assert!(Decimate::new(0.0).is_err());
        assert!(Decimate::new(0.95).is_err());
        assert!(Decimate::new(f64::NAN).is_err());
        assert!(Decimate::new(0.05).is_ok());
        assert!(Decimate::new(0.90).is_ok());
    }

    #[test]
    fn test_target_faces() {
        let op = Decimate::new(0.5).unwrap();
        assert_eq!(op.target_faces(100), 50);
        let op = Decimate::new(0.25).unwrap();
        assert_eq!(op.target_faces(8), 6);
    }

    #[test]
    fn test_grid_reduces_and_keeps_outline() {
        let mesh = create_grid_mesh(25, 40);
        assert_eq!(mesh.num_vertices(), 1000);

        let out = Decimate::new(0.5).unwrap().apply(&mesh).unwrap();
        assert!(out.num_vertices() < 1000);
        assert!(out.num_faces() < mesh.num_faces());
        assert!(out.is_valid());

        // Planar input stays planar and the bounding box is unchanged
        assert!(out.positions().iter().all(|p| p.z.abs() < 1e-9));
        assert_eq!(out.bounding_box(), mesh.bounding_box());
    }

    #[test]
    fn test_tetrahedron_cannot_collapse() {
        let mesh = create_tetrahedron();
        let err = Decimate::new(0.5).unwrap().apply(&mesh).unwrap_err();
        assert!(matches!(err, SculptError::TopologyFailed { operation: "decimate", .. }));
    }
}
