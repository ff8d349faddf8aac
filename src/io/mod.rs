//! Mesh file I/O.
//!
//! The sculpting core has no opinion on file formats; this module is the
//! collaborator the command-line tool uses to get meshes in and out.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII in, binary out |
//!
//! # Usage
//!
//! ```no_run
//! use chisel::io::{load, save};
//!
//! let mesh = load("model.stl").unwrap();
//! save(&mesh, "copy.stl").unwrap();
//! ```

pub mod stl;

use std::path::Path;

use crate::error::{Result, SculptError};
use crate::mesh::HalfEdgeMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| SculptError::UnsupportedFormat {
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            })
    }
}

/// Load a mesh, choosing the format by extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Stl => stl::load(path),
    }
}

/// Save a mesh, choosing the format by extension.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Stl => stl::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/part.STL").unwrap(), Format::Stl);
        assert!(matches!(
            Format::from_path("part.obj"),
            Err(SculptError::UnsupportedFormat { extension }) if extension == "obj"
        ));
        assert!(matches!(
            Format::from_path("part"),
            Err(SculptError::UnsupportedFormat { extension }) if extension == "(none)"
        ));
    }

    #[test]
    fn test_save_rejects_unknown_extension() {
        let mesh = HalfEdgeMesh::new();
        assert!(matches!(
            save(&mesh, "out.ply"),
            Err(SculptError::UnsupportedFormat { .. })
        ));
    }
}
