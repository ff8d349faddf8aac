//! Deformation kernels.
//!
//! Every brush is a pure function of the current position buffer: it returns a
//! new buffer and leaves writing it back (and invalidating anything derived
//! from the old positions) to the caller. All kernels are weighted by
//! [`falloff`], so vertices at or beyond the brush radius are returned
//! bit-for-bit unchanged.
//!
//! # Brushes
//!
//! - [`BrushKind::Grab`]: translate by a drag vector, weighted by falloff and strength
//! - [`BrushKind::Inflate`] / [`BrushKind::Deflate`]: push along vertex normals
//! - [`BrushKind::Smooth`]: blend footprint vertices toward their local centroid
//!
//! # Example
//!
//! ```
//! use chisel::algo::brush::{BrushKind, Stroke};
//! use nalgebra::{Point3, Vector3};
//!
//! let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0)];
//! let stroke = Stroke::new(Point3::origin(), 1.0)
//!     .with_strength(1.0)
//!     .with_delta(Vector3::new(0.0, 0.0, 0.5));
//!
//! let moved = BrushKind::Grab.deform(&points, &stroke);
//! assert_eq!(moved[0], Point3::new(0.0, 0.0, 0.5));
//! assert_eq!(moved[1], points[1]);
//! ```

use std::fmt;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::falloff::{falloff, MIN_RADIUS};
use super::spatial::PointGrid;

/// Gain applied to `strength * drag_length` to get the smoothing blend.
pub const SMOOTH_GAIN: f64 = 6.0;

/// Upper bound on the smoothing blend per tick.
pub const SMOOTH_MAX_BLEND: f64 = 0.65;

/// Minimum neighborhood size (the vertex itself included) for smoothing.
pub const SMOOTH_MIN_NEIGHBORS: usize = 8;

/// The available brushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    /// Radial translation along the drag.
    #[default]
    Grab,
    /// Push outward along vertex normals.
    Inflate,
    /// Push inward along vertex normals.
    Deflate,
    /// Local Laplacian smoothing inside the footprint.
    Smooth,
}

impl BrushKind {
    /// All brushes, in menu order.
    pub const ALL: [BrushKind; 4] = [
        BrushKind::Grab,
        BrushKind::Inflate,
        BrushKind::Deflate,
        BrushKind::Smooth,
    ];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            BrushKind::Grab => "Grab",
            BrushKind::Inflate => "Inflate",
            BrushKind::Deflate => "Deflate",
            BrushKind::Smooth => "Smooth",
        }
    }

    /// Whether this brush reads vertex normals.
    pub fn needs_normals(self) -> bool {
        matches!(self, BrushKind::Inflate | BrushKind::Deflate)
    }

    /// Direction of displacement along the normal: +1 inflate, -1 deflate, 0 otherwise.
    pub fn normal_sign(self) -> f64 {
        match self {
            BrushKind::Inflate => 1.0,
            BrushKind::Deflate => -1.0,
            BrushKind::Grab | BrushKind::Smooth => 0.0,
        }
    }

    /// Apply this brush to `points` and return the deformed buffer.
    pub fn deform(self, points: &[Point3<f64>], stroke: &Stroke<'_>) -> Vec<Point3<f64>> {
        match self {
            BrushKind::Grab => grab_deform(
                points,
                &stroke.anchor,
                &stroke.delta,
                stroke.radius,
                stroke.strength,
                stroke.parallel,
            ),
            BrushKind::Inflate | BrushKind::Deflate => inflate_deflate(
                points,
                &stroke.anchor,
                stroke.normals,
                stroke.radius,
                stroke.amount,
                stroke.parallel,
            ),
            BrushKind::Smooth => local_smooth(
                points,
                &stroke.anchor,
                stroke.radius,
                stroke.strength,
                stroke.drag_length,
                stroke.parallel,
            ),
        }
    }
}

impl fmt::Display for BrushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a kernel needs for one tick.
///
/// Fields a brush does not use are ignored: Grab reads `delta` and `strength`,
/// Inflate/Deflate read `amount` and `normals`, Smooth reads `strength` and
/// `drag_length`.
#[derive(Debug, Clone)]
pub struct Stroke<'a> {
    /// Center of influence.
    pub anchor: Point3<f64>,
    /// Brush radius in world units.
    pub radius: f64,
    /// Strength multiplier (Grab) or effective smoothing strength (Smooth).
    pub strength: f64,
    /// Translation for Grab.
    pub delta: Vector3<f64>,
    /// Signed displacement along normals for Inflate/Deflate.
    pub amount: f64,
    /// World-space length of this tick's drag.
    pub drag_length: f64,
    /// Per-vertex unit normals, index-aligned with the point buffer.
    pub normals: Option<&'a [Vector3<f64>]>,
    /// Evaluate the kernel on the rayon thread pool.
    pub parallel: bool,
}

impl<'a> Stroke<'a> {
    /// A stroke with no displacement.
    pub fn new(anchor: Point3<f64>, radius: f64) -> Self {
        Self {
            anchor,
            radius,
            strength: 1.0,
            delta: Vector3::zeros(),
            amount: 0.0,
            drag_length: 0.0,
            normals: None,
            parallel: false,
        }
    }

    /// Set the strength.
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Set the Grab translation.
    pub fn with_delta(mut self, delta: Vector3<f64>) -> Self {
        self.delta = delta;
        self
    }

    /// Set the signed Inflate/Deflate amount.
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    /// Set the drag length used by Smooth.
    pub fn with_drag_length(mut self, drag_length: f64) -> Self {
        self.drag_length = drag_length;
        self
    }

    /// Attach vertex normals.
    pub fn with_normals(mut self, normals: &'a [Vector3<f64>]) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Current brush settings, shared by all brushes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushParams {
    /// Radius of influence in world units.
    pub radius: f64,
    /// Strength multiplier.
    pub strength: f64,
    /// Smoothing amount in `[0, 1]`.
    pub smoothing: f64,
}

impl Default for BrushParams {
    fn default() -> Self {
        Self {
            radius: 10.0,
            strength: 1.0,
            smoothing: 0.5,
        }
    }
}

impl BrushParams {
    /// Set the radius, clamped away from zero.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius.max(MIN_RADIUS);
    }

    /// Set the strength, clamped into `[0, max_strength]`.
    pub fn set_strength(&mut self, strength: f64, max_strength: f64) {
        self.strength = strength.clamp(0.0, max_strength.max(0.0));
    }

    /// Set the smoothing amount, clamped into `[0, 1]`.
    pub fn set_smoothing(&mut self, smoothing: f64) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }
}

/// Translate vertices by `delta`, weighted by falloff and `strength`.
pub fn grab_deform(
    points: &[Point3<f64>],
    anchor: &Point3<f64>,
    delta: &Vector3<f64>,
    radius: f64,
    strength: f64,
    parallel: bool,
) -> Vec<Point3<f64>> {
    let step = |p: &Point3<f64>| {
        let w = falloff((p - anchor).norm(), radius) * strength;
        if w == 0.0 {
            *p
        } else {
            p + delta * w
        }
    };

    if parallel {
        points.par_iter().map(step).collect()
    } else {
        points.iter().map(step).collect()
    }
}

/// Displace vertices along their normals by `amount`, weighted by falloff.
///
/// Positive amounts inflate, negative amounts deflate. Returns the input
/// unchanged if no normals are given or they do not match the buffer.
pub fn inflate_deflate(
    points: &[Point3<f64>],
    anchor: &Point3<f64>,
    normals: Option<&[Vector3<f64>]>,
    radius: f64,
    amount: f64,
    parallel: bool,
) -> Vec<Point3<f64>> {
    let normals = match normals {
        Some(n) if n.len() == points.len() => n,
        _ => {
            log::debug!("inflate/deflate skipped: normals unavailable");
            return points.to_vec();
        }
    };

    let step = |(p, n): (&Point3<f64>, &Vector3<f64>)| {
        let w = falloff((p - anchor).norm(), radius) * amount;
        if w == 0.0 {
            *p
        } else {
            p + n * w
        }
    };

    if parallel {
        points.par_iter().zip(normals.par_iter()).map(step).collect()
    } else {
        points.iter().zip(normals.iter()).map(step).collect()
    }
}

/// Blend footprint vertices toward the centroid of their neighborhood.
///
/// Every vertex within `radius` of the anchor is moved toward the mean of all
/// vertices within `max(0.4 * radius, 0.8)` of it (itself included), by a
/// blend of `strength * drag_length * 6` clamped to `[0, 0.65]`. Vertices with
/// fewer than eight such neighbors are skipped. Centroids are computed from
/// the input buffer, so the result does not depend on visiting order.
pub fn local_smooth(
    points: &[Point3<f64>],
    anchor: &Point3<f64>,
    radius: f64,
    strength: f64,
    drag_length: f64,
    parallel: bool,
) -> Vec<Point3<f64>> {
    let footprint: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| (*p - anchor).norm() <= radius)
        .map(|(i, _)| i)
        .collect();

    let blend = (strength * drag_length * SMOOTH_GAIN).clamp(0.0, SMOOTH_MAX_BLEND);
    if footprint.is_empty() || blend == 0.0 {
        return points.to_vec();
    }

    let neighborhood = (radius * 0.40).max(0.8);
    let grid = PointGrid::new(points, neighborhood);

    let smoothed = |&i: &usize| -> Option<(usize, Point3<f64>)> {
        let p = &points[i];
        let nb = grid.within(p, neighborhood);
        if nb.len() < SMOOTH_MIN_NEIGHBORS {
            return None;
        }
        let sum = nb
            .iter()
            .fold(Vector3::zeros(), |acc, &j| acc + points[j].coords);
        let centroid = sum / nb.len() as f64;
        Some((i, Point3::from(p.coords * (1.0 - blend) + centroid * blend)))
    };

    let updates: Vec<(usize, Point3<f64>)> = if parallel {
        footprint.par_iter().filter_map(smoothed).collect()
    } else {
        footprint.iter().filter_map(smoothed).collect()
    };

    let mut out = points.to_vec();
    for (i, p) in updates {
        out[i] = p;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner_points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    /// Planar grid in z = 0 with the given spacing.
    fn grid_points(n: usize, spacing: f64) -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for j in 0..n {
            for i in 0..n {
                points.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
            }
        }
        points
    }

    #[test]
    fn test_grab_corner_scenario() {
        let points = corner_points();
        let delta = Vector3::new(0.0, 0.0, 1.0);
        let out = grab_deform(&points, &Point3::origin(), &delta, 1.0, 1.0, false);

        assert_eq!(out[0], Point3::new(0.0, 0.0, 1.0));
        // Vertices at distance 1 sit on the rim and are untouched
        assert_eq!(out[1], points[1]);
        assert_eq!(out[2], points[2]);
        assert_eq!(out[3], points[3]);
    }

    #[test]
    fn test_zero_delta_and_amount_are_identity() {
        let points = grid_points(6, 0.5);
        let normals = vec![Vector3::z(); points.len()];
        let anchor = Point3::new(1.0, 1.0, 0.0);

        let grabbed = grab_deform(&points, &anchor, &Vector3::zeros(), 2.0, 1.0, false);
        assert_eq!(grabbed, points);

        let inflated = inflate_deflate(&points, &anchor, Some(&normals), 2.0, 0.0, false);
        assert_eq!(inflated, points);
    }

    #[test]
    fn test_inflate_moves_along_normals() {
        let points = grid_points(5, 1.0);
        let normals = vec![Vector3::z(); points.len()];
        let anchor = Point3::new(2.0, 2.0, 0.0);

        let out = inflate_deflate(&points, &anchor, Some(&normals), 1.5, 0.3, false);
        // Center vertex gets the full amount
        assert!((out[12].z - 0.3).abs() < 1e-12);
        for (before, after) in points.iter().zip(&out) {
            assert_eq!(before.x, after.x);
            assert_eq!(before.y, after.y);
            assert!(after.z >= 0.0);
        }

        let out = BrushKind::Deflate.deform(
            &points,
            &Stroke::new(anchor, 1.5)
                .with_amount(-0.3)
                .with_normals(&normals),
        );
        assert!((out[12].z + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_inflate_without_normals_is_identity() {
        let points = grid_points(3, 1.0);
        let anchor = Point3::new(1.0, 1.0, 0.0);

        assert_eq!(inflate_deflate(&points, &anchor, None, 5.0, 1.0, false), points);

        let short = vec![Vector3::z(); 2];
        assert_eq!(
            inflate_deflate(&points, &anchor, Some(&short), 5.0, 1.0, false),
            points
        );
    }

    #[test]
    fn test_nothing_in_radius() {
        let points = grid_points(4, 1.0);
        let far = Point3::new(100.0, 100.0, 100.0);
        let stroke = Stroke::new(far, 1.0)
            .with_delta(Vector3::new(1.0, 1.0, 1.0))
            .with_drag_length(1.0);

        for kind in BrushKind::ALL {
            assert_eq!(kind.deform(&points, &stroke), points, "{kind}");
        }
    }

    #[test]
    fn test_smooth_skips_sparse_vertices() {
        // Seven points within 0.8 of each other: below the neighbor minimum
        let mut points: Vec<Point3<f64>> = (0..7)
            .map(|i| Point3::new(i as f64 * 0.1, 0.0, 0.0))
            .collect();
        points[3].z = 0.2;

        let out = local_smooth(&points, &points[3].clone(), 5.0, 1.0, 1.0, false);
        assert_eq!(out, points);
    }

    #[test]
    fn test_smooth_flattens_bump() {
        let mut points = grid_points(9, 0.25);
        let center = 4 * 9 + 4;
        points[center].z = 0.5;
        let anchor = points[center];

        let out = local_smooth(&points, &anchor, 0.3, 1.0, 0.05, false);
        assert!(out[center].z < 0.5);
        assert!(out[center].z > 0.0);

        // Blend is capped at 0.65
        let capped = local_smooth(&points, &anchor, 0.3, 2.5, 10.0, false);
        let nb = PointGrid::new(&points, 0.8).within(&anchor, 0.8);
        let mean_z = nb.iter().map(|&j| points[j].z).sum::<f64>() / nb.len() as f64;
        let expected = 0.5 * (1.0 - SMOOTH_MAX_BLEND) + mean_z * SMOOTH_MAX_BLEND;
        assert!((capped[center].z - expected).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut points = grid_points(12, 0.3);
        for (i, p) in points.iter_mut().enumerate() {
            p.z = ((i * 37) % 11) as f64 * 0.01;
        }
        let normals = vec![Vector3::z(); points.len()];
        let stroke = Stroke::new(Point3::new(1.5, 1.5, 0.0), 1.2)
            .with_strength(0.8)
            .with_delta(Vector3::new(0.1, -0.2, 0.3))
            .with_amount(0.2)
            .with_drag_length(0.05)
            .with_normals(&normals);

        for kind in BrushKind::ALL {
            let seq = kind.deform(&points, &stroke);
            let par = kind.deform(&points, &stroke.clone().with_parallel(true));
            assert_eq!(seq, par, "{kind}");
        }
    }

    #[test]
    fn test_params_clamping() {
        let mut params = BrushParams::default();
        assert_eq!(params.radius, 10.0);
        assert_eq!(params.strength, 1.0);
        assert_eq!(params.smoothing, 0.5);

        params.set_radius(0.0);
        assert_eq!(params.radius, MIN_RADIUS);
        params.set_strength(9.0, 2.5);
        assert_eq!(params.strength, 2.5);
        params.set_strength(-1.0, 2.5);
        assert_eq!(params.strength, 0.0);
        params.set_smoothing(1.5);
        assert_eq!(params.smoothing, 1.0);
    }

    #[test]
    fn test_brush_kind_serde() {
        let kind: BrushKind = serde_json::from_str("\"deflate\"").unwrap();
        assert_eq!(kind, BrushKind::Deflate);
        assert_eq!(kind.normal_sign(), -1.0);
        assert!(kind.needs_normals());
        assert!(!BrushKind::Smooth.needs_normals());
    }
}
