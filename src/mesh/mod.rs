//! Core mesh data structures.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], a manifold triangle mesh stored as a
//! half-edge (doubly-connected edge list) structure plus an index-aligned
//! position buffer. Brushes deform the buffer in place; subdivision and
//! decimation produce a brand-new mesh.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe `u32` index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! ```
//! use chisel::mesh::{build_from_triangles, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.positions().len(), 3);
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_from_triangles, remove_unreferenced, to_face_vertex};
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, VertexId};
