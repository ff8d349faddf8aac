//! Uniform grid over vertex positions for fixed-radius neighbor queries.
//!
//! The smoothing brush needs, for every vertex in its footprint, all vertices
//! within a secondary radius. A hashed grid with cell size equal to that
//! radius reduces each query to the 27 surrounding cells.

use std::collections::HashMap;

use nalgebra::Point3;

type CellKey = (i64, i64, i64);

/// Hashed uniform grid over a point set.
pub struct PointGrid<'a> {
    points: &'a [Point3<f64>],
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl<'a> PointGrid<'a> {
    /// Bucket `points` into cells of edge length `cell_size`.
    pub fn new(points: &'a [Point3<f64>], cell_size: f64) -> Self {
        let cell_size = cell_size.max(1e-9);
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();

        for (i, p) in points.iter().enumerate() {
            cells.entry(cell_key(p, cell_size)).or_default().push(i);
        }

        Self {
            points,
            cell_size,
            cells,
        }
    }

    /// Number of occupied cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Indices of all points within `radius` (inclusive) of `center`, ascending.
    ///
    /// `radius` must not exceed the cell size the grid was built with.
    pub fn within(&self, center: &Point3<f64>, radius: f64) -> Vec<usize> {
        debug_assert!(radius <= self.cell_size * (1.0 + 1e-12));

        let (cx, cy, cz) = cell_key(center, self.cell_size);
        let r2 = radius * radius;
        let mut result = Vec::new();

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        result.extend(
                            bucket
                                .iter()
                                .copied()
                                .filter(|&i| (self.points[i] - center).norm_squared() <= r2),
                        );
                    }
                }
            }
        }

        // Ascending order keeps centroid sums identical to a linear scan.
        result.sort_unstable();
        result
    }
}

#[inline]
fn cell_key(p: &Point3<f64>, cell_size: f64) -> CellKey {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(n: usize, spacing: f64) -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    points.push(Point3::new(
                        i as f64 * spacing,
                        j as f64 * spacing,
                        k as f64 * spacing,
                    ));
                }
            }
        }
        points
    }

    #[test]
    fn test_matches_linear_scan() {
        let points = lattice(6, 0.37);
        let radius = 0.8;
        let grid = PointGrid::new(&points, radius);

        for center in points.iter().step_by(7) {
            let expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| (*p - center).norm() <= radius)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(grid.within(center, radius), expected);
        }
    }

    #[test]
    fn test_negative_coordinates() {
        let points = vec![
            Point3::new(-0.1, -0.1, -0.1),
            Point3::new(0.1, 0.1, 0.1),
            Point3::new(-5.0, 0.0, 0.0),
        ];
        let grid = PointGrid::new(&points, 1.0);
        assert_eq!(grid.within(&Point3::origin(), 1.0), vec![0, 1]);
        assert_eq!(grid.num_cells(), 3);
    }
}
