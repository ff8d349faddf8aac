//! Mesh construction utilities.
//!
//! Meshes enter the crate as face-vertex lists (from STL files, from the
//! topology operators, from tests) and are converted to half-edge form here.
//! Construction rejects anything the half-edge structure cannot represent:
//! out-of-range indices, degenerate faces, edges shared by more than two
//! faces and vertices whose fans do not form a single disk or half-disk.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{Result, SculptError};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Example
/// ```
/// use chisel::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh> {
    if faces.is_empty() {
        return Err(SculptError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(SculptError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(SculptError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    mesh.positions.extend_from_slice(vertices);
    mesh.vertices.resize(vertices.len(), Vertex::default());

    // Directed edge (v0, v1) -> half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId> =
        HashMap::with_capacity(faces.len() * 3);
    let mut corner_count = vec![0usize; vertices.len()];

    // First pass: interior half-edges and faces
    for face in faces {
        let base = mesh.num_halfedges();
        let face_id = FaceId::new(mesh.num_faces());
        mesh.faces.push(Face {
            halfedge: HalfEdgeId::new(base),
        });

        for k in 0..3 {
            let from = face[k];
            let to = face[(k + 1) % 3];
            let id = HalfEdgeId::new(base + k);

            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(from),
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(base + (k + 1) % 3),
                prev: HalfEdgeId::new(base + (k + 2) % 3),
                face: face_id,
            });
            mesh.vertices[from].halfedge = id;
            corner_count[from] += 1;

            if edge_map.insert((from, to), id).is_some() {
                return Err(SculptError::NonManifoldEdge { v0: from, v1: to });
            }
        }
    }

    // Second pass: link twins, creating boundary half-edges where needed
    let interior = mesh.num_halfedges();
    for i in 0..interior {
        let he = HalfEdgeId::new(i);
        if mesh.twin(he).is_valid() {
            continue;
        }
        let from = mesh.origin(he).index();
        let to = mesh.origin(mesh.next(he)).index();

        if let Some(&twin) = edge_map.get(&(to, from)) {
            mesh.halfedge_mut(he).twin = twin;
            mesh.halfedge_mut(twin).twin = he;
        } else {
            let boundary = HalfEdgeId::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(to),
                twin: he,
                next: HalfEdgeId::invalid(),
                prev: HalfEdgeId::invalid(),
                face: FaceId::invalid(),
            });
            mesh.halfedge_mut(he).twin = boundary;
        }
    }

    // Third pass: link boundary half-edges into loops
    link_boundary_loops(&mut mesh, interior)?;

    // Fourth pass: boundary vertices point at their boundary half-edge
    for i in interior..mesh.num_halfedges() {
        let he = HalfEdgeId::new(i);
        let origin = mesh.origin(he);
        mesh.vertices[origin.index()].halfedge = he;
    }

    check_vertex_fans(&mesh, &corner_count)?;

    Ok(mesh)
}

/// Link boundary half-edges into closed loops.
///
/// A vertex with more than one outgoing boundary half-edge joins two
/// boundary fans (a "bowtie") and is rejected.
fn link_boundary_loops(mesh: &mut HalfEdgeMesh, first_boundary: usize) -> Result<()> {
    let mut outgoing: HashMap<usize, HalfEdgeId> = HashMap::new();
    for i in first_boundary..mesh.num_halfedges() {
        let he = HalfEdgeId::new(i);
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            return Err(SculptError::NonManifoldVertex { vertex: origin });
        }
    }

    for i in first_boundary..mesh.num_halfedges() {
        let he = HalfEdgeId::new(i);
        let dest = mesh.dest(he).index();
        let next = outgoing
            .get(&dest)
            .copied()
            .ok_or(SculptError::NonManifoldVertex { vertex: dest })?;
        mesh.halfedge_mut(he).next = next;
        mesh.halfedge_mut(next).prev = he;
    }

    Ok(())
}

/// Every vertex fan must reach all faces that use the vertex.
///
/// Two closed fans glued at a single vertex pass the edge and boundary
/// checks but leave some faces unreachable from the vertex's half-edge.
fn check_vertex_fans(mesh: &HalfEdgeMesh, corner_count: &[usize]) -> Result<()> {
    let limit = mesh.num_halfedges();
    for v in mesh.vertex_ids() {
        let expected = corner_count[v.index()];
        if expected == 0 {
            continue;
        }

        let mut faces = 0;
        for (steps, he) in mesh.vertex_halfedges(v).enumerate() {
            if steps > limit {
                return Err(SculptError::NonManifoldVertex { vertex: v.index() });
            }
            if !mesh.is_boundary_halfedge(he) {
                faces += 1;
            }
        }

        if faces != expected {
            return Err(SculptError::NonManifoldVertex { vertex: v.index() });
        }
    }
    Ok(())
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns (vertices, faces) tuple.
pub fn to_face_vertex(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    (mesh.positions().to_vec(), mesh.triangles())
}

/// Drop vertices that no face references and renumber the faces to match.
///
/// Vertex order is otherwise preserved.
pub fn remove_unreferenced(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut remap = vec![usize::MAX; vertices.len()];
    for face in faces {
        for &v in face {
            remap[v] = 0;
        }
    }

    let mut kept = Vec::with_capacity(vertices.len());
    for (old, slot) in remap.iter_mut().enumerate() {
        if *slot != usize::MAX {
            *slot = kept.len();
            kept.push(vertices[old]);
        }
    }

    let faces = faces
        .iter()
        .map(|f| [remap[f[0]], remap[f[1]], remap[f[2]]])
        .collect();

    (kept, faces)
}
