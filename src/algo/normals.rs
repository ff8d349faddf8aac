//! Per-vertex normal cache with a staleness budget.
//!
//! Recomputing area-weighted normals on every tick of an inflate drag is the
//! dominant per-tick cost on large meshes, so the cache hands out the last
//! computed normals until either the vertex count changes or the budget has
//! elapsed since they were computed. Anything that rewrites the buffer in a
//! way the budget should not paper over calls [`NormalCache::invalidate`].

use std::time::{Duration, Instant};

use nalgebra::Vector3;

use crate::mesh::HalfEdgeMesh;

/// Cached vertex normals, either empty or index-aligned with one mesh.
#[derive(Debug, Clone)]
pub struct NormalCache {
    normals: Vec<Vector3<f64>>,
    computed_at: Option<Instant>,
    budget: Duration,
}

impl Default for NormalCache {
    fn default() -> Self {
        Self::new(Duration::from_millis(80))
    }
}

impl NormalCache {
    /// An empty cache with the given staleness budget.
    pub fn new(budget: Duration) -> Self {
        Self {
            normals: Vec::new(),
            computed_at: None,
            budget,
        }
    }

    /// The staleness budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    /// Drop the cached normals.
    pub fn invalidate(&mut self) {
        self.normals.clear();
        self.computed_at = None;
    }

    /// The cached normals without any freshness check.
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// When the cached normals were computed.
    pub fn computed_at(&self) -> Option<Instant> {
        self.computed_at
    }

    /// Normals for `mesh`, recomputing them if the cache is empty, sized for
    /// another mesh, or older than the budget at `now`.
    pub fn get(&mut self, mesh: &HalfEdgeMesh, now: Instant) -> &[Vector3<f64>] {
        let stale = match self.computed_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) > self.budget,
        };

        if stale || self.normals.len() != mesh.num_vertices() {
            self.refresh(mesh, now);
        }
        &self.normals
    }

    /// Recompute unconditionally.
    pub fn refresh(&mut self, mesh: &HalfEdgeMesh, now: Instant) {
        self.normals = mesh.vertex_normals();
        self.computed_at = Some(now);
        log::trace!("normals recomputed for {} vertices", self.normals.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn quad(z: f64) -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(0.0, 1.0, z),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    fn tilted(mesh: &HalfEdgeMesh) -> HalfEdgeMesh {
        let mut mesh = mesh.clone();
        let positions: Vec<_> = mesh
            .positions()
            .iter()
            .map(|p| Point3::new(p.x, p.y, p.x))
            .collect();
        mesh.set_positions(positions).unwrap();
        mesh
    }

    #[test]
    fn test_lazy_compute() {
        let mesh = quad(0.0);
        let mut cache = NormalCache::default();
        assert!(cache.is_empty());

        let t0 = Instant::now();
        let normals = cache.get(&mesh, t0).to_vec();
        assert_eq!(normals.len(), 4);
        assert!((normals[0] - Vector3::z()).norm() < 1e-12);
        assert_eq!(cache.computed_at(), Some(t0));
    }

    #[test]
    fn test_within_budget_returns_stale() {
        let flat = quad(0.0);
        let slanted = tilted(&flat);
        let mut cache = NormalCache::new(Duration::from_millis(80));

        let t0 = Instant::now();
        cache.get(&flat, t0);

        // Same vertex count, inside the budget: old normals are kept
        let n = cache.get(&slanted, t0 + Duration::from_millis(50))[0];
        assert!((n - Vector3::z()).norm() < 1e-12);

        // Past the budget: recomputed
        let n = cache.get(&slanted, t0 + Duration::from_millis(81))[0];
        assert!(n.x < -0.5);
    }

    #[test]
    fn test_vertex_count_change_forces_recompute() {
        let small = quad(0.0);
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let tri = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        let mut cache = NormalCache::default();
        let t0 = Instant::now();
        cache.get(&small, t0);
        assert_eq!(cache.get(&tri, t0).len(), 3);
    }

    #[test]
    fn test_invalidate() {
        let mesh = quad(0.0);
        let mut cache = NormalCache::default();
        cache.get(&mesh, Instant::now());
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.computed_at().is_none());
    }
}
