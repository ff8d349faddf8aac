//! Half-edge mesh data structure.
//!
//! Connectivity is stored as a doubly-connected edge list, while vertex
//! positions live in a separate, index-aligned buffer. Sculpting only ever
//! touches that buffer (its length is fixed for the lifetime of a mesh), so
//! brushes and undo snapshots can work on plain `&[Point3<f64>]` slices without
//! going near the topology.
//!
//! # Boundary Handling
//!
//! Boundary half-edges have an invalid face ID and are linked into loops via
//! `next`/`prev`, so walking around a boundary vertex terminates the same way
//! as walking around an interior one.

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{Result, SculptError};

/// Connectivity of a single vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    /// One outgoing half-edge. For boundary vertices this is a boundary half-edge.
    pub halfedge: HalfEdgeId,
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,
    /// The opposite half-edge.
    pub twin: HalfEdgeId,
    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId,
    /// The previous half-edge around the face.
    pub prev: HalfEdgeId,
    /// The face this half-edge belongs to. Invalid on the boundary.
    pub face: FaceId,
}

impl HalfEdge {
    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy, Default)]
pub struct Face {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId,
}

/// A triangle mesh with half-edge connectivity and a mutable position buffer.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) halfedges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
}

impl HalfEdgeMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            positions: Vec::with_capacity(num_vertices),
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_faces * 3 + num_faces / 2),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of half-edges (boundary half-edges included).
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// The vertex position buffer.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Mutable access to the position buffer. The slice cannot change length,
    /// so sculpting can never alter the vertex count.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    /// Install a whole new position buffer.
    ///
    /// Fails if the buffer length does not match the vertex count.
    pub fn set_positions(&mut self, positions: Vec<Point3<f64>>) -> Result<()> {
        if positions.len() != self.positions.len() {
            return Err(SculptError::VertexCountMismatch {
                expected: self.positions.len(),
                found: positions.len(),
            });
        }
        self.positions = positions;
        Ok(())
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Move a single vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.positions[v.index()] = pos;
    }

    /// Connectivity record of a vertex.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// A half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge {
        &mut self.halfedges[id.index()]
    }

    /// A face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    // ==================== Topology Queries ====================

    /// The opposite half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).twin
    }

    /// The next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// The previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).prev
    }

    /// Origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// Destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.twin(he))
    }

    /// Face of a half-edge (invalid on the boundary).
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId) -> FaceId {
        self.halfedge(he).face
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary. Isolated vertices count as boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    // ==================== Iteration ====================

    /// All vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// All half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// All face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Outgoing half-edges around a vertex.
    pub fn vertex_halfedges(&self, v: VertexId) -> VertexHalfEdgeIter<'_> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// The three vertices of a face.
    pub fn face_triangle(&self, f: FaceId) -> [VertexId; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Unit normal of a face, or zero for a degenerate triangle.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        let n = (p1 - p0).cross(&(p2 - p0));
        let len = n.norm();
        if len > 1e-12 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Area-weighted unit normal at a vertex (zero if it has no faces).
    pub fn vertex_normal(&self, v: VertexId) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            let [p0, p1, p2] = self.face_positions(f);
            normal += (p1 - p0).cross(&(p2 - p0));
        }
        let len = normal.norm();
        if len > 1e-12 {
            normal / len
        } else {
            Vector3::zeros()
        }
    }

    /// Area-weighted unit normals for every vertex, index-aligned with
    /// [`positions`](Self::positions).
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.num_vertices()];

        for f in self.face_ids() {
            let [v0, v1, v2] = self.face_triangle(f);
            let p0 = self.position(v0);
            let n = (self.position(v1) - p0).cross(&(self.position(v2) - p0));

            normals[v0.index()] += n;
            normals[v1.index()] += n;
            normals[v2.index()] += n;
        }

        for n in &mut normals {
            let len = n.norm();
            if len > 1e-12 {
                *n /= len;
            } else {
                *n = Vector3::zeros();
            }
        }

        normals
    }

    /// Axis-aligned bounding box.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.positions.first()?;
        let mut min = *first;
        let mut max = *first;

        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    /// Length of the bounding box diagonal (0 for an empty mesh).
    pub fn bounding_diagonal(&self) -> f64 {
        self.bounding_box()
            .map(|(min, max)| (max - min).norm())
            .unwrap_or(0.0)
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Face-vertex triangle list.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        self.face_ids()
            .map(|f| {
                let [v0, v1, v2] = self.face_triangle(f);
                [v0.index(), v1.index(), v2.index()]
            })
            .collect()
    }

    // ==================== Validation ====================

    /// Check that all connectivity is consistent.
    pub fn is_valid(&self) -> bool {
        if self.positions.len() != self.vertices.len() {
            return false;
        }

        for (i, v) in self.vertices.iter().enumerate() {
            if v.halfedge.is_valid() && self.halfedge(v.halfedge).origin.index() != i {
                return false;
            }
        }

        for (i, he) in self.halfedges.iter().enumerate() {
            if !he.twin.is_valid() || self.halfedge(he.twin).twin.index() != i {
                return false;
            }
            if !he.next.is_valid() || self.halfedge(he.next).prev.index() != i {
                return false;
            }
            if !he.prev.is_valid() || self.halfedge(he.prev).next.index() != i {
                return false;
            }
        }

        self.faces.iter().all(|f| f.halfedge.is_valid())
    }
}

/// Iterator over outgoing half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> VertexHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, v: VertexId) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for VertexHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // twin(he) ends at v, so the half-edge after it in its face leaves v again.
        self.current = self.mesh.next(self.mesh.twin(self.current));
        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }

        Some(result)
    }
}
