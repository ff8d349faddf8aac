//! STL (stereolithography) support.
//!
//! STL stores every triangle with its own three corners, so loading welds
//! corners with identical coordinates back into shared vertices. Triangles that
//! collapse to a line or a point after welding are dropped. Saving always
//! writes binary STL.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Result, SculptError};
use crate::mesh::{build_from_triangles, remove_unreferenced, to_face_vertex, HalfEdgeMesh};

/// Load a mesh from an STL file (binary or ASCII).
///
/// # Example
///
/// ```no_run
/// use chisel::io::stl;
///
/// let mesh = stl::load("part.stl").unwrap();
/// println!("{} vertices", mesh.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let (vertices, faces) = read_triangles(&mut file).map_err(|e| SculptError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if faces.is_empty() {
        return Err(SculptError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    let (vertices, faces) = remove_unreferenced(&vertices, &faces);
    let mesh = build_from_triangles(&vertices, &faces)?;
    log::info!(
        "read {} ({} vertices, {} faces)",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Read welded face-vertex lists from an STL stream.
pub fn read_triangles<R: Read + Seek>(
    reader: &mut R,
) -> std::io::Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let stl = stl_io::read_stl(reader)?;

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut lookup: HashMap<[u64; 3], usize> = HashMap::new();
    let mut weld = |v: &stl_io::Vertex| {
        let p = Point3::new(v[0] as f64, v[1] as f64, v[2] as f64);
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        *lookup.entry(key).or_insert_with(|| {
            vertices.push(p);
            vertices.len() - 1
        })
    };

    let mut faces = Vec::with_capacity(stl.faces.len());
    let mut skipped = 0usize;
    for tri in &stl.faces {
        let i0 = weld(&stl.vertices[tri.vertices[0]]);
        let i1 = weld(&stl.vertices[tri.vertices[1]]);
        let i2 = weld(&stl.vertices[tri.vertices[2]]);

        if i0 != i1 && i1 != i2 && i0 != i2 {
            faces.push([i0, i1, i2]);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        log::debug!("stl: skipped {} degenerate triangles", skipped);
    }
    Ok((vertices, faces))
}

/// Save a mesh to a binary STL file.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_mesh(mesh, &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| SculptError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    log::info!("wrote {} ({} faces)", path.display(), mesh.num_faces());
    Ok(())
}

/// Write a mesh as binary STL.
pub fn write_mesh<W: Write>(mesh: &HalfEdgeMesh, writer: &mut W) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|f| {
            let [p0, p1, p2] = f.map(|i| vertices[i]);
            let n = (p1 - p0).cross(&(p2 - p0));
            let n = if n.norm() > 1e-12 { n.normalize() } else { n };

            let corner = |p: Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [corner(p0), corner(p1), corner(p2)],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}
