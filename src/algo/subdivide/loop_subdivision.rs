//! One step of Loop subdivision on a face-vertex list.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

/// An undirected edge and the vertices opposite it.
#[derive(Debug, Clone)]
struct Edge {
    v0: usize,
    v1: usize,
    /// Opposite vertex in the first face, and in the second face if interior.
    opposite: (usize, Option<usize>),
}

impl Edge {
    fn is_boundary(&self) -> bool {
        self.opposite.1.is_none()
    }
}

/// Subdivide once and return the refined (vertices, faces).
///
/// Original vertices keep their indices; edge vertices are appended after
/// them in order of first appearance in `faces`.
///
/// # Vertex Rules
///
/// - **Interior edge vertex**: `3/8 * (v0 + v1) + 1/8 * (v_left + v_right)`
/// - **Boundary edge vertex**: `1/2 * (v0 + v1)`
/// - **Interior vertex**: `(1 - n*β) * v + β * Σ(neighbors)`
/// - **Boundary vertex**: `1/8 * (left + right) + 3/4 * v`
pub fn loop_subdivide(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let (edges, face_edges) = build_edges(faces);

    let mut new_vertices = reposition_vertices(vertices, &edges);
    new_vertices.extend(edges.iter().map(|e| edge_point(vertices, e)));

    let base = vertices.len();
    let mut new_faces = Vec::with_capacity(faces.len() * 4);
    for (face, fe) in faces.iter().zip(&face_edges) {
        let [v0, v1, v2] = *face;
        let e01 = base + fe[0];
        let e12 = base + fe[1];
        let e20 = base + fe[2];

        new_faces.push([v0, e01, e20]);
        new_faces.push([v1, e12, e01]);
        new_faces.push([v2, e20, e12]);
        new_faces.push([e01, e12, e20]);
    }

    (new_vertices, new_faces)
}

/// Collect undirected edges, and for each face the edge indices of its
/// sides (v0v1, v1v2, v2v0).
fn build_edges(faces: &[[usize; 3]]) -> (Vec<Edge>, Vec<[usize; 3]>) {
    let mut index: HashMap<(usize, usize), usize> = HashMap::with_capacity(faces.len() * 3 / 2);
    let mut edges: Vec<Edge> = Vec::with_capacity(faces.len() * 3 / 2);
    let mut face_edges = Vec::with_capacity(faces.len());

    for face in faces {
        let mut sides = [0; 3];
        for (i, side) in sides.iter_mut().enumerate() {
            let a = face[i];
            let b = face[(i + 1) % 3];
            let opposite = face[(i + 2) % 3];
            let key = if a < b { (a, b) } else { (b, a) };

            *side = match index.get(&key) {
                Some(&e) => {
                    edges[e].opposite.1 = Some(opposite);
                    e
                }
                None => {
                    let e = edges.len();
                    edges.push(Edge {
                        v0: key.0,
                        v1: key.1,
                        opposite: (opposite, None),
                    });
                    index.insert(key, e);
                    e
                }
            };
        }
        face_edges.push(sides);
    }

    (edges, face_edges)
}

fn edge_point(vertices: &[Point3<f64>], edge: &Edge) -> Point3<f64> {
    let p0 = vertices[edge.v0].coords;
    let p1 = vertices[edge.v1].coords;

    match edge.opposite {
        (a, Some(b)) => Point3::from(
            (p0 + p1) * (3.0 / 8.0) + (vertices[a].coords + vertices[b].coords) * (1.0 / 8.0),
        ),
        (_, None) => Point3::from((p0 + p1) * 0.5),
    }
}

fn reposition_vertices(vertices: &[Point3<f64>], edges: &[Edge]) -> Vec<Point3<f64>> {
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
    let mut boundary_neighbors: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];

    for e in edges {
        neighbors[e.v0].push(e.v1);
        neighbors[e.v1].push(e.v0);
        if e.is_boundary() {
            boundary_neighbors[e.v0].push(e.v1);
            boundary_neighbors[e.v1].push(e.v0);
        }
    }

    vertices
        .iter()
        .enumerate()
        .map(|(i, pos)| {
            let boundary = &boundary_neighbors[i];
            if !boundary.is_empty() {
                // Regular boundary vertex; corners stay put
                if boundary.len() == 2 {
                    let left = vertices[boundary[0]].coords;
                    let right = vertices[boundary[1]].coords;
                    Point3::from((left + right) * (1.0 / 8.0) + pos.coords * (3.0 / 4.0))
                } else {
                    *pos
                }
            } else {
                let n = neighbors[i].len();
                if n == 0 {
                    return *pos;
                }
                let beta = loop_beta(n);
                let sum: Vector3<f64> = neighbors[i].iter().map(|&j| vertices[j].coords).sum();
                Point3::from(pos.coords * (1.0 - n as f64 * beta) + sum * beta)
            }
        })
        .collect()
}

/// Loop's β coefficient for a vertex of valence `n`.
fn loop_beta(n: usize) -> f64 {
    if n == 3 {
        3.0 / 16.0
    } else {
        // β = 1/n * (5/8 - (3/8 + 1/4 * cos(2π/n))²)
        let n_f = n as f64;
        let inner = 3.0 / 8.0 + 0.25 * (2.0 * std::f64::consts::PI / n_f).cos();
        (5.0 / 8.0 - inner * inner) / n_f
    }
}
