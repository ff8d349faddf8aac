//! Per-gesture drag state and the per-tick displacement clamps.
//!
//! Every clamp here bounds how far a single tick can move the surface, as a
//! function of mesh scale and brush radius. A single erratic pick sample can
//! therefore never inject a displacement large enough to fold triangles.

use std::fmt;
use std::time::{Duration, Instant};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::algo::brush::{BrushKind, BrushParams};

/// Restriction of the Grab brush to one world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisConstraint {
    /// No restriction.
    #[default]
    Free,
    /// World X axis.
    X,
    /// World Y axis.
    Y,
    /// World Z axis.
    Z,
}

impl AxisConstraint {
    /// Unit vector of the axis, or `None` when unconstrained.
    pub fn unit(self) -> Option<Vector3<f64>> {
        match self {
            AxisConstraint::Free => None,
            AxisConstraint::X => Some(Vector3::x()),
            AxisConstraint::Y => Some(Vector3::y()),
            AxisConstraint::Z => Some(Vector3::z()),
        }
    }
}

impl fmt::Display for AxisConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisConstraint::Free => "Free",
            AxisConstraint::X => "X",
            AxisConstraint::Y => "Y",
            AxisConstraint::Z => "Z",
        })
    }
}

/// Per-load displacement ceilings, derived from the bounding diagonal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragLimits {
    /// Longest drag step accepted in one tick.
    pub max_step: f64,
    /// Largest inflate/deflate amount in one tick.
    pub max_amount: f64,
}

impl Default for DragLimits {
    fn default() -> Self {
        Self::from_diagonal(0.0)
    }
}

impl DragLimits {
    /// Limits for a mesh with the given bounding diagonal.
    pub fn from_diagonal(diagonal: f64) -> Self {
        let diagonal = if diagonal.is_finite() { diagonal } else { 0.0 };
        Self {
            max_step: (0.004 * diagonal).max(0.25),
            max_amount: (0.003 * diagonal).max(0.20),
        }
    }

    /// Grab step ceiling for a brush radius.
    pub fn max_grab(&self, radius: f64) -> f64 {
        self.max_step.min((0.15 * radius).max(0.25))
    }

    /// Inflate/deflate ceiling for a brush radius.
    pub fn max_inflate(&self, radius: f64) -> f64 {
        self.max_amount.min((0.12 * radius).max(0.20))
    }
}

/// Scale `v` down to `max_len` if it is longer. Near-zero vectors pass through.
pub fn clamp_length(v: Vector3<f64>, max_len: f64) -> Vector3<f64> {
    let n = v.norm();
    if n <= max_len || n < 1e-12 {
        v
    } else {
        v * (max_len / n)
    }
}

/// What a brush should do on one accepted tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Translate by a (clamped, possibly axis-projected) vector.
    Grab {
        /// Translation.
        delta: Vector3<f64>,
    },
    /// Displace along normals.
    Normal {
        /// Signed, clamped amount.
        amount: f64,
    },
    /// Local smoothing.
    Smooth {
        /// Effective strength.
        strength: f64,
        /// World length of the raw drag step.
        drag_length: f64,
    },
}

/// Measurements of one applied tick, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Brush that was applied.
    pub brush: BrushKind,
    /// Axis, for constrained Grab.
    pub axis: Option<AxisConstraint>,
    /// Displacement fed to Grab (zero for other brushes).
    pub step: Vector3<f64>,
    /// Signed step along the axis, for constrained Grab.
    pub signed_step: f64,
    /// Unsigned displacement accumulated this session.
    pub total: f64,
    /// Signed axis offset accumulated this session.
    pub axis_total: f64,
    /// Distance from the anchor to the current pick.
    pub ruler: f64,
    /// Indicator segment for the renderer.
    pub indicator: (Point3<f64>, Point3<f64>),
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.brush, self.axis) {
            (BrushKind::Grab, Some(axis)) => write!(
                f,
                "{}-move: step {:+.3}  total {:+.3}",
                axis, self.signed_step, self.axis_total
            ),
            (BrushKind::Grab, None) => write!(
                f,
                "step {:.3} (dx {:.3}, dy {:.3}, dz {:.3})  total {:.3} | ruler {:.3}",
                self.step.norm(),
                self.step.x,
                self.step.y,
                self.step.z,
                self.total,
                self.ruler
            ),
            _ => write!(f, "ruler {:.3}", self.ruler),
        }
    }
}

/// Result of feeding one pick to the drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// First hit of the session; stored, nothing to apply yet.
    Seeded,
    /// The clamped step is shorter than the noise floor.
    BelowNoiseFloor,
    /// A usable step.
    Step {
        /// Clamped step from the previous pick to this one.
        delta: Vector3<f64>,
    },
}

/// State of one continuous deform gesture.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    /// Previous pick on the surface, if any.
    pub last_pick: Option<Point3<f64>>,
    /// Unsigned displacement accumulated this session.
    pub total: f64,
    /// Signed offset accumulated along the constraint axis.
    pub axis_total: f64,
    /// Time of the last accepted tick.
    pub last_tick: Option<Instant>,
    /// Current indicator segment.
    pub indicator: Option<(Point3<f64>, Point3<f64>)>,
}

impl DragSession {
    /// A fresh session seeded with an optional initial pick.
    pub fn start(seed: Option<Point3<f64>>) -> Self {
        Self {
            last_pick: seed,
            ..Self::default()
        }
    }

    /// Rate limiter. Accepts the tick and restarts the timer, or rejects it.
    pub fn accept_tick(&mut self, now: Instant, min_interval: Duration) -> bool {
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < min_interval {
                return false;
            }
        }
        self.last_tick = Some(now);
        true
    }

    /// Move the drag to `pick`, clamping the step to `max_step`.
    pub fn advance(&mut self, pick: Point3<f64>, max_step: f64, noise_floor: f64) -> Advance {
        let Some(last) = self.last_pick.replace(pick) else {
            return Advance::Seeded;
        };

        let delta = clamp_length(pick - last, max_step);
        if delta.norm() < noise_floor {
            Advance::BelowNoiseFloor
        } else {
            Advance::Step { delta }
        }
    }

    /// Turn a step into a brush motion, updating the session totals.
    #[allow(clippy::too_many_arguments)]
    pub fn plan(
        &mut self,
        delta: Vector3<f64>,
        brush: BrushKind,
        axis: AxisConstraint,
        params: &BrushParams,
        limits: &DragLimits,
        anchor: Point3<f64>,
        pick: Point3<f64>,
    ) -> (Motion, TickReport) {
        let ruler = (pick - anchor).norm();
        let mut report = TickReport {
            brush,
            axis: None,
            step: Vector3::zeros(),
            signed_step: 0.0,
            total: self.total,
            axis_total: self.axis_total,
            ruler,
            indicator: (anchor, pick),
        };

        let motion = match (brush, axis.unit()) {
            (BrushKind::Grab, Some(unit)) => {
                let max_grab = limits.max_grab(params.radius);
                let signed = delta.dot(&unit).clamp(-max_grab, max_grab);
                self.axis_total += signed;
                self.total += signed.abs();

                report.axis = Some(axis);
                report.signed_step = signed;
                report.step = unit * signed;
                report.indicator = (anchor, anchor + unit * self.axis_total);
                Motion::Grab { delta: unit * signed }
            }
            (BrushKind::Grab, None) => {
                let step = clamp_length(delta, limits.max_grab(params.radius));
                self.total += step.norm();
                report.step = step;
                Motion::Grab { delta: step }
            }
            (BrushKind::Inflate | BrushKind::Deflate, _) => {
                let max_amount = limits.max_inflate(params.radius);
                let amount = (brush.normal_sign() * params.strength * delta.norm() * 2.0)
                    .clamp(-max_amount, max_amount);
                Motion::Normal { amount }
            }
            (BrushKind::Smooth, _) => Motion::Smooth {
                strength: params.strength * params.smoothing.max(0.05),
                drag_length: delta.norm(),
            },
        };

        report.total = self.total;
        report.axis_total = self.axis_total;
        self.indicator = Some(report.indicator);
        (motion, report)
    }

    /// Zero the accumulated totals.
    pub fn reset_totals(&mut self) {
        self.total = 0.0;
        self.axis_total = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(radius: f64) -> BrushParams {
        BrushParams {
            radius,
            ..BrushParams::default()
        }
    }

    #[test]
    fn test_limits_from_diagonal() {
        let small = DragLimits::from_diagonal(10.0);
        assert_eq!(small.max_step, 0.25);
        assert_eq!(small.max_amount, 0.20);

        let large = DragLimits::from_diagonal(1000.0);
        assert!((large.max_step - 4.0).abs() < 1e-12);
        assert!((large.max_amount - 3.0).abs() < 1e-12);

        // Radius caps the grab step
        assert!((large.max_grab(10.0) - 1.5).abs() < 1e-12);
        assert!((large.max_grab(100.0) - 4.0).abs() < 1e-12);
        assert!((large.max_inflate(1.0) - 0.20).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert_eq!(clamp_length(v, 10.0), v);
        let c = clamp_length(v, 1.0);
        assert!((c.norm() - 1.0).abs() < 1e-12);
        assert!((c - Vector3::new(0.6, 0.8, 0.0)).norm() < 1e-12);
        assert_eq!(clamp_length(Vector3::zeros(), 0.0), Vector3::zeros());
    }

    #[test]
    fn test_rate_limit() {
        let mut drag = DragSession::start(None);
        let t0 = Instant::now();
        let min = Duration::from_millis(16);

        assert!(drag.accept_tick(t0, min));
        assert!(!drag.accept_tick(t0 + Duration::from_millis(10), min));
        assert!(drag.accept_tick(t0 + Duration::from_millis(16), min));
        assert!(!drag.accept_tick(t0 + Duration::from_millis(20), min));
    }

    #[test]
    fn test_advance_seeds_then_steps() {
        let mut drag = DragSession::start(None);
        assert_eq!(drag.advance(Point3::origin(), 1.0, 1e-10), Advance::Seeded);

        match drag.advance(Point3::new(5.0, 0.0, 0.0), 1.0, 1e-10) {
            Advance::Step { delta } => assert!((delta - Vector3::x()).norm() < 1e-12),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            drag.advance(Point3::new(5.0, 0.0, 0.0), 1.0, 1e-10),
            Advance::BelowNoiseFloor
        );
    }

    #[test]
    fn test_axis_grab_accumulates_signed() {
        let mut drag = DragSession::start(None);
        let limits = DragLimits::from_diagonal(1000.0);
        let anchor = Point3::origin();
        let p = params(10.0);

        let (m1, _) = drag.plan(
            Vector3::new(0.3, 0.5, -0.2),
            BrushKind::Grab,
            AxisConstraint::Z,
            &p,
            &limits,
            anchor,
            Point3::new(1.0, 1.0, 1.0),
        );
        let (m2, report) = drag.plan(
            Vector3::new(0.0, 0.0, 0.5),
            BrushKind::Grab,
            AxisConstraint::Z,
            &p,
            &limits,
            anchor,
            Point3::new(1.0, 1.0, 1.0),
        );

        assert_eq!(m1, Motion::Grab { delta: Vector3::new(0.0, 0.0, -0.2) });
        assert_eq!(m2, Motion::Grab { delta: Vector3::new(0.0, 0.0, 0.5) });
        assert!((drag.axis_total - 0.3).abs() < 1e-12);
        assert!((drag.total - 0.7).abs() < 1e-12);
        assert_eq!(report.indicator.1, Point3::new(0.0, 0.0, drag.axis_total));
        assert!(report.to_string().starts_with("Z-move"));
    }

    #[test]
    fn test_axis_step_clamped() {
        let mut drag = DragSession::start(None);
        let limits = DragLimits::from_diagonal(1000.0);
        let (motion, report) = drag.plan(
            Vector3::new(10.0, 0.0, 0.0),
            BrushKind::Grab,
            AxisConstraint::X,
            &params(2.0),
            &limits,
            Point3::origin(),
            Point3::origin(),
        );
        // min(4.0, max(0.25, 0.3)) = 0.3
        assert!((report.signed_step - 0.3).abs() < 1e-12);
        assert_eq!(motion, Motion::Grab { delta: Vector3::new(report.signed_step, 0.0, 0.0) });
    }

    #[test]
    fn test_inflate_amount_sign_and_clamp() {
        let mut drag = DragSession::start(None);
        let limits = DragLimits::from_diagonal(1000.0);
        let p = BrushParams {
            radius: 10.0,
            strength: 1.0,
            smoothing: 0.5,
        };

        let (m, _) = drag.plan(
            Vector3::new(0.1, 0.0, 0.0),
            BrushKind::Deflate,
            AxisConstraint::X,
            &p,
            &limits,
            Point3::origin(),
            Point3::origin(),
        );
        assert_eq!(m, Motion::Normal { amount: -0.2 });

        let (m, _) = drag.plan(
            Vector3::new(5.0, 0.0, 0.0),
            BrushKind::Inflate,
            AxisConstraint::Free,
            &p,
            &limits,
            Point3::origin(),
            Point3::origin(),
        );
        // min(3.0, max(0.2, 1.2)) = 1.2
        match m {
            Motion::Normal { amount } => assert!((amount - 1.2).abs() < 1e-12),
            other => panic!("unexpected {:?}", other),
        }
        // Non-grab brushes do not accumulate
        assert_eq!(drag.total, 0.0);
    }

    #[test]
    fn test_smooth_effective_strength() {
        let mut drag = DragSession::start(None);
        let p = BrushParams {
            radius: 10.0,
            strength: 2.0,
            smoothing: 0.0,
        };
        let (m, report) = drag.plan(
            Vector3::new(0.0, 0.3, 0.4),
            BrushKind::Smooth,
            AxisConstraint::Free,
            &p,
            &DragLimits::default(),
            Point3::origin(),
            Point3::new(0.0, 3.0, 4.0),
        );
        match m {
            Motion::Smooth {
                strength,
                drag_length,
            } => {
                assert!((strength - 0.1).abs() < 1e-12);
                assert!((drag_length - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(report.to_string(), "ruler 5.000");
    }
}
