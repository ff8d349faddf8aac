//! Quadric Error Metrics (QEM) edge collapse.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::mesh::remove_unreferenced;

/// A quadric error matrix (4x4 symmetric matrix).
///
/// Stored as 10 unique elements since the matrix is symmetric.
#[derive(Debug, Clone, Copy)]
struct Quadric {
    /// Upper triangular elements: [a, b, c, d, e, f, g, h, i, j]
    /// Matrix form:
    /// | a b c d |
    /// | b e f g |
    /// | c f h i |
    /// | d g i j |
    data: [f64; 10],
}

impl Quadric {
    fn zero() -> Self {
        Self { data: [0.0; 10] }
    }

    /// Quadric of the plane ax + by + cz + d = 0 (normalized).
    fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            data: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    fn add_assign(&mut self, other: &Quadric) {
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += b;
        }
    }

    /// v^T * Q * v where v = [x, y, z, 1].
    fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        let q = &self.data;

        q[0] * x * x
            + 2.0 * q[1] * x * y
            + 2.0 * q[2] * x * z
            + 2.0 * q[3] * x
            + q[4] * y * y
            + 2.0 * q[5] * y * z
            + 2.0 * q[6] * y
            + q[7] * z * z
            + 2.0 * q[8] * z
            + q[9]
    }

    /// Point minimizing the error, or `None` if the system is singular.
    fn optimal_point(&self) -> Option<Point3<f64>> {
        let q = &self.data;
        #[rustfmt::skip]
        let m = Matrix4::new(
            q[0], q[1], q[2], q[3],
            q[1], q[4], q[5], q[6],
            q[2], q[5], q[7], q[8],
            0.0,  0.0,  0.0,  1.0,
        );

        let v = m.try_inverse()? * Vector4::new(0.0, 0.0, 0.0, 1.0);
        Some(Point3::new(v.x, v.y, v.z))
    }
}

impl std::ops::Add for Quadric {
    type Output = Quadric;

    fn add(self, other: Quadric) -> Quadric {
        let mut result = self;
        result.add_assign(&other);
        result
    }
}

/// A pending collapse of `remove` into `keep`.
#[derive(Debug, Clone)]
struct Candidate {
    keep: usize,
    remove: usize,
    position: Point3<f64>,
    error: f64,
    /// Vertex versions at the time the candidate was scored.
    versions: (u32, u32),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties broken by vertex index for determinism
        other
            .error
            .total_cmp(&self.error)
            .then_with(|| (other.keep, other.remove).cmp(&(self.keep, self.remove)))
    }
}

/// Edge-collapse state over a face-vertex list.
struct Collapser {
    positions: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    vertex_alive: Vec<bool>,
    /// Faces incident to each vertex (may include dead faces).
    vertex_faces: Vec<Vec<usize>>,
    quadrics: Vec<Quadric>,
    boundary: Vec<bool>,
    versions: Vec<u32>,
    live_faces: usize,
    live_vertices: usize,
}

impl Collapser {
    fn new(positions: &[Point3<f64>], faces: &[[usize; 3]]) -> Self {
        let n = positions.len();
        let mut vertex_faces = vec![Vec::new(); n];
        let mut quadrics = vec![Quadric::zero(); n];
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();

        for (fi, face) in faces.iter().enumerate() {
            for i in 0..3 {
                vertex_faces[face[i]].push(fi);
                *edge_count
                    .entry(canonical_edge(face[i], face[(i + 1) % 3]))
                    .or_insert(0) += 1;
            }

            let p0 = &positions[face[0]];
            let normal = (positions[face[1]] - p0).cross(&(positions[face[2]] - p0));
            let len = normal.norm();
            if len < 1e-10 {
                continue;
            }
            let n = normal / len;
            let q = Quadric::from_plane(n.x, n.y, n.z, -n.dot(&p0.coords));
            for &v in face {
                quadrics[v].add_assign(&q);
            }
        }

        let mut boundary = vec![false; n];
        for (&(a, b), &count) in &edge_count {
            if count == 1 {
                boundary[a] = true;
                boundary[b] = true;
            }
        }

        let live_vertices = vertex_faces.iter().filter(|f| !f.is_empty()).count();

        Self {
            positions: positions.to_vec(),
            faces: faces.to_vec(),
            face_alive: vec![true; faces.len()],
            vertex_alive: vertex_faces.iter().map(|f| !f.is_empty()).collect(),
            vertex_faces,
            quadrics,
            boundary,
            versions: vec![0; n],
            live_faces: faces.len(),
            live_vertices,
        }
    }

    fn live_faces_of(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v]
            .iter()
            .copied()
            .filter(|&f| self.face_alive[f])
    }

    fn neighbors(&self, v: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .live_faces_of(v)
            .flat_map(|f| self.faces[f])
            .filter(|&u| u != v)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Score the collapse of edge (a, b), choosing which end survives.
    fn candidate(&self, a: usize, b: usize) -> Option<Candidate> {
        let (keep, remove) = match (self.boundary[a], self.boundary[b]) {
            // Boundary edges, and interior edges spanning two boundary vertices
            (true, true) => return None,
            (false, true) => (b, a),
            _ => (a, b),
        };

        let q = self.quadrics[keep] + self.quadrics[remove];
        let position = if self.boundary[keep] {
            self.positions[keep]
        } else {
            self.optimal_position(&q, keep, remove)
        };

        Some(Candidate {
            keep,
            remove,
            position,
            error: q.evaluate(&position),
            versions: (self.versions[keep], self.versions[remove]),
        })
    }

    fn optimal_position(&self, q: &Quadric, a: usize, b: usize) -> Point3<f64> {
        let p0 = self.positions[a];
        let p1 = self.positions[b];
        let mid = Point3::from((p0.coords + p1.coords) * 0.5);

        if let Some(p) = q.optimal_point() {
            // Reject solutions that wander far from the edge
            if (p - mid).norm() < (p1 - p0).norm() * 2.0 {
                return p;
            }
        }

        let e0 = q.evaluate(&p0);
        let e1 = q.evaluate(&p1);
        let em = q.evaluate(&mid);
        if e0 <= e1 && e0 <= em {
            p0
        } else if e1 <= em {
            p1
        } else {
            mid
        }
    }

    fn is_current(&self, c: &Candidate) -> bool {
        self.vertex_alive[c.keep]
            && self.vertex_alive[c.remove]
            && c.versions == (self.versions[c.keep], self.versions[c.remove])
    }

    /// Topological and geometric checks for collapsing `c.remove` into `c.keep`.
    fn can_collapse(&self, c: &Candidate) -> bool {
        // Never drop below a tetrahedron's worth of vertices
        if self.live_vertices <= 4 {
            return false;
        }

        let shared: Vec<usize> = self
            .live_faces_of(c.remove)
            .filter(|&f| self.faces[f].contains(&c.keep))
            .collect();
        if shared.len() != 2 {
            return false;
        }

        // Link condition: the only common neighbors are the two opposite vertices
        let nk = self.neighbors(c.keep);
        let nr = self.neighbors(c.remove);
        let common: Vec<usize> = nk
            .iter()
            .copied()
            .filter(|v| nr.binary_search(v).is_ok())
            .collect();
        if common.len() != 2 {
            return false;
        }

        // Opposite vertices lose an edge; valence 3 would fold into a double-sided triangle
        if common.iter().any(|&v| self.neighbors(v).len() <= 3) {
            return false;
        }

        // No surviving face may flip or degenerate
        for v in [c.keep, c.remove] {
            for f in self.live_faces_of(v) {
                if shared.contains(&f) {
                    continue;
                }
                let face = self.faces[f];
                let before = self.face_normal(face, None);
                let after = self.face_normal(face, Some((c.keep, c.remove, c.position)));
                if after.norm() < 1e-12 || before.dot(&after) <= 0.0 {
                    return false;
                }
            }
        }

        true
    }

    /// Unnormalized face normal, optionally with `keep` and `remove` moved to `pos`.
    fn face_normal(
        &self,
        face: [usize; 3],
        moved: Option<(usize, usize, Point3<f64>)>,
    ) -> Vector3<f64> {
        let p = |v: usize| match moved {
            Some((keep, remove, pos)) if v == keep || v == remove => pos,
            _ => self.positions[v],
        };
        let p0 = p(face[0]);
        (p(face[1]) - p0).cross(&(p(face[2]) - p0))
    }

    fn collapse(&mut self, c: &Candidate) {
        let faces: Vec<usize> = self.live_faces_of(c.remove).collect();
        for f in faces {
            if self.faces[f].contains(&c.keep) {
                self.face_alive[f] = false;
                self.live_faces -= 1;
            } else {
                for v in self.faces[f].iter_mut() {
                    if *v == c.remove {
                        *v = c.keep;
                    }
                }
                self.vertex_faces[c.keep].push(f);
            }
        }

        self.positions[c.keep] = c.position;
        self.quadrics[c.keep] = self.quadrics[c.keep] + self.quadrics[c.remove];
        self.vertex_alive[c.remove] = false;
        self.vertex_faces[c.remove].clear();
        self.versions[c.keep] += 1;
        self.versions[c.remove] += 1;
        self.live_vertices -= 1;

        let alive = &self.face_alive;
        self.vertex_faces[c.keep].retain(|&f| alive[f]);
    }

    fn into_face_vertex(self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .zip(&self.face_alive)
            .filter(|(_, &alive)| alive)
            .map(|(f, _)| *f)
            .collect();
        remove_unreferenced(&self.positions, &faces)
    }
}

fn canonical_edge(v0: usize, v1: usize) -> (usize, usize) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

/// Collapse edges until at most `target_faces` remain or no collapse is legal.
///
/// Returns the compacted (vertices, faces). Boundary edges are never collapsed
/// and boundary vertices keep their positions.
pub fn qem_decimate(
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
    target_faces: usize,
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut state = Collapser::new(positions, faces);
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();

    let mut seen = HashSet::new();
    for face in faces {
        for i in 0..3 {
            let edge = canonical_edge(face[i], face[(i + 1) % 3]);
            if seen.insert(edge) {
                if let Some(c) = state.candidate(edge.0, edge.1) {
                    heap.push(c);
                }
            }
        }
    }

    let mut collapses = 0usize;
    while state.live_faces > target_faces {
        let Some(c) = heap.pop() else {
            break;
        };
        if !state.is_current(&c) || !state.can_collapse(&c) {
            continue;
        }

        state.collapse(&c);
        collapses += 1;

        for n in state.neighbors(c.keep) {
            if let Some(next) = state.candidate(c.keep, n) {
                heap.push(next);
            }
        }
    }

    log::trace!("qem: {} collapses, {} faces left", collapses, state.live_faces);
    state.into_face_vertex()
}
