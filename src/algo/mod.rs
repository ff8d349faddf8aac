//! Sculpting and topology algorithms.
//!
//! - **Falloff**: the radial weight every brush is built on
//! - **Brushes**: Grab, Inflate/Deflate and Smooth deformation kernels
//! - **Normals**: per-vertex normal cache with a staleness budget
//! - **Spatial**: uniform-grid neighbor queries for the smoothing brush
//! - **Topology**: Loop subdivision and quadric-error decimation
//!
//! Kernels are pure functions over position buffers. State lives in
//! [`crate::session`].

pub mod brush;
pub mod decimate;
pub mod falloff;
pub mod normals;
pub mod spatial;
pub mod subdivide;
pub mod topology;

pub use topology::TopologyOp;
