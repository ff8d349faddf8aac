//! Error types for chisel.
//!
//! Every fallible operation in the crate returns [`Result`]. Gesture-level
//! problems that the editor merely reports (a pick that misses the surface,
//! a deform gesture without an anchor, undo on an empty stack) are not errors;
//! they surface as session outcomes instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SculptError`].
pub type Result<T> = std::result::Result<T, SculptError>;

/// Everything that can go wrong in mesh construction, sculpting and topology edits.
#[derive(Error, Debug)]
pub enum SculptError {
    /// Zero triangles were supplied.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A triangle points past the end of the vertex list.
    #[error("triangle {face} uses out-of-range vertex {vertex}")]
    InvalidVertexIndex {
        /// Triangle offset in the input.
        face: usize,
        /// Offending vertex offset.
        vertex: usize,
    },

    /// A triangle repeats one of its corners.
    #[error("triangle {face} repeats a corner")]
    DegenerateFace {
        /// Triangle offset in the input.
        face: usize,
    },

    /// An edge is shared by three or more triangles, or walked twice in one direction.
    #[error("edge {v0}-{v1} is not manifold")]
    NonManifoldEdge {
        /// Tail vertex.
        v0: usize,
        /// Head vertex.
        v1: usize,
    },

    /// A vertex joins two or more separate boundary fans.
    #[error("vertex {vertex} pinches separate fans")]
    NonManifoldVertex {
        /// The offending vertex.
        vertex: usize,
    },

    /// A position buffer does not match the mesh it is applied to.
    #[error("position buffer has {found} entries, mesh has {expected} vertices")]
    VertexCountMismatch {
        /// Vertex count of the mesh.
        expected: usize,
        /// Length of the supplied buffer.
        found: usize,
    },

    /// The session has no mesh loaded.
    #[error("no mesh loaded")]
    NoMesh,

    /// A deform gesture was attempted before an anchor was placed.
    #[error("no anchor set")]
    NoAnchor,

    /// A subdivision or decimation could not produce a usable mesh.
    #[error("{operation} failed: {reason}")]
    TopologyFailed {
        /// Name of the operation.
        operation: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// An undo or redo snapshot belongs to a mesh with different topology.
    #[error("snapshot from topology generation {snapshot} cannot be applied to generation {current}")]
    TopologyChanged {
        /// Generation the snapshot was recorded in.
        snapshot: u64,
        /// Generation of the current mesh.
        current: u64,
    },

    /// Raw I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A mesh or script file could not be read.
    #[error("cannot read {}: {message}", path.display())]
    LoadError {
        /// File that was read.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },

    /// A mesh could not be written.
    #[error("cannot write {}: {message}", path.display())]
    SaveError {
        /// Destination file.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },

    /// No reader or writer exists for this extension.
    #[error("no mesh format for extension {extension:?}")]
    UnsupportedFormat {
        /// Extension as found on the path.
        extension: String,
    },

    /// Malformed configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A tool setting or operation argument is out of range.
    #[error("{name} = {value}: {reason}")]
    InvalidParameter {
        /// Setting name.
        name: &'static str,
        /// Rejected value, formatted.
        value: String,
        /// Accepted range.
        reason: &'static str,
    },
}

impl SculptError {
    /// Shorthand for [`SculptError::InvalidParameter`].
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SculptError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a topology failure for the named operation.
    pub fn topology(operation: &'static str, reason: impl Into<String>) -> Self {
        SculptError::TopologyFailed {
            operation,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SculptError::invalid_param("radius", -1.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "radius = -1: must be positive"
        );

        let err = SculptError::topology("decimate", "no edge could be collapsed");
        assert_eq!(err.to_string(), "decimate failed: no edge could be collapsed");
    }
}
