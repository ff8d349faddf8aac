//! Topology-changing operations.
//!
//! A [`TopologyOp`] takes the current mesh and produces a brand-new one with a
//! different vertex and face count. Operators never modify their input: the
//! editing session keeps the old mesh until the new one has been fully built
//! and validated, which is what makes rollback on failure trivial.

use crate::error::Result;
use crate::mesh::HalfEdgeMesh;

/// An operation that replaces a mesh wholesale.
pub trait TopologyOp {
    /// Short lowercase name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Build the replacement mesh.
    fn apply(&self, mesh: &HalfEdgeMesh) -> Result<HalfEdgeMesh>;
}

impl<T: TopologyOp + ?Sized> TopologyOp for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&self, mesh: &HalfEdgeMesh) -> Result<HalfEdgeMesh> {
        (**self).apply(mesh)
    }
}
