//! # Chisel
//!
//! An interactive mesh-sculpting engine.
//!
//! Chisel holds a triangle mesh in a half-edge structure and deforms it around
//! an anchor point with falloff-weighted brushes. A [`session::SculptSession`]
//! turns pointer input into bounded per-tick edits, records one undo step per
//! gesture, and keeps cached normals and history coherent across subdivision
//! and decimation.
//!
//! ## Features
//!
//! - **Brushes**: Grab (free or axis-constrained), Inflate, Deflate, Smooth
//! - **Drag protocol**: click-to-anchor, rate-limited ticks, scale-aware step clamps
//! - **History**: bounded undo/redo of position snapshots, tagged by topology generation
//! - **Topology**: Loop subdivision and QEM decimation with rollback on failure
//! - **File I/O**: STL (binary and ASCII)
//!
//! ## Quick Start
//!
//! ```no_run
//! use chisel::prelude::*;
//! use nalgebra::Point3;
//! use std::time::Instant;
//!
//! let mut session = SculptSession::new(SculptConfig::default());
//! session.load_mesh(chisel::io::load("model.stl").unwrap());
//!
//! session.set_brush(BrushKind::Inflate);
//! session.set_anchor(Some(Point3::new(0.0, 0.0, 1.0)));
//! session.begin_drag(Some(Point3::new(0.0, 0.0, 1.0)));
//! session.drag_tick(Some(Point3::new(0.2, 0.0, 1.0)), Instant::now()).unwrap();
//! session.end_drag();
//!
//! let mesh = session.mesh().unwrap();
//! chisel::io::save(mesh, "sculpted.stl").unwrap();
//! ```
//!
//! ## Brushes Without a Session
//!
//! ```
//! use chisel::prelude::*;
//! use nalgebra::{Point3, Vector3};
//!
//! let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.5, 0.0, 0.0)];
//! let stroke = Stroke::new(Point3::origin(), 1.0).with_delta(Vector3::new(0.0, 0.0, 1.0));
//!
//! let moved = BrushKind::Grab.deform(&points, &stroke);
//! assert_eq!(moved[0].z, 1.0);
//! assert!(moved[1].z > 0.0 && moved[1].z < 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod session;

/// Prelude module for convenient imports.
///
/// ```
/// use chisel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::brush::{BrushKind, BrushParams, Stroke};
    pub use crate::algo::falloff::falloff;
    pub use crate::algo::TopologyOp;
    pub use crate::config::SculptConfig;
    pub use crate::error::{Result, SculptError};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, FaceId, HalfEdgeId, HalfEdgeMesh, VertexId,
    };
    pub use crate::session::{
        AxisConstraint, GestureState, Notice, Notifier, Outcome, PointerEvent, SculptSession,
        TickOutcome,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;
    use std::time::{Duration, Instant};

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
        }
    }

    #[test]
    fn test_sculpt_subdivide_sculpt() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mut session = SculptSession::default();
        session.load_triangles(&vertices, &faces).unwrap();
        session.set_radius(2.0).unwrap();
        let t0 = Instant::now();

        session.set_anchor(Some(Point3::new(0.5, 0.5, 1.0)));
        session.begin_drag(Some(Point3::new(0.5, 0.5, 1.0)));
        session
            .drag_tick(Some(Point3::new(0.5, 0.5, 1.1)), t0)
            .unwrap();
        session.end_drag();

        session.subdivide(2).unwrap();
        assert_eq!(session.mesh().unwrap().num_faces(), 64);

        session.set_brush(BrushKind::Smooth);
        session.begin_drag(Some(Point3::new(0.5, 0.5, 1.0)));
        session
            .drag_tick(Some(Point3::new(0.6, 0.5, 1.0)), t0 + Duration::from_millis(50))
            .unwrap();
        session.end_drag();

        assert!(session.mesh().unwrap().is_valid());
        assert!(session.undo().unwrap());
        assert_eq!(session.mesh().unwrap().num_vertices(), 34);
    }
}
