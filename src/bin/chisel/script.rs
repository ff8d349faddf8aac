//! JSON gesture scripts.
//!
//! A script is a list of steps replayed against a session through the same
//! pointer front-end an interactive editor would use:
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "brush", "kind": "inflate" },
//!     { "op": "radius", "value": 4.0 },
//!     { "op": "click", "at": [0.0, 0.0, 1.0] },
//!     { "op": "drag", "from": [0.0, 0.0, 1.0], "to": [1.0, 0.0, 1.0], "ticks": 12 },
//!     { "op": "undo" },
//!     { "op": "subdivide", "iterations": 1 }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use nalgebra::{Point2, Point3};
use serde::Deserialize;

use chisel::algo::brush::BrushKind;
use chisel::error::{Result, SculptError};
use chisel::session::{AxisConstraint, Outcome, PointerEvent, SculptSession, TickOutcome};

/// Pause inserted between steps.
const STEP_GAP: Duration = Duration::from_millis(100);

/// Screen distance covered by each drag tick.
const PIXELS_PER_TICK: f64 = 8.0;

fn default_ticks() -> usize {
    10
}

fn default_interval() -> u64 {
    20
}

fn default_iterations() -> usize {
    1
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Switch brush.
    Brush { kind: BrushKind },
    /// Set the Grab axis constraint.
    Axis { axis: AxisConstraint },
    /// Set the brush radius.
    Radius { value: f64 },
    /// Set the brush strength.
    Strength { value: f64 },
    /// Set the smoothing amount.
    Smoothing { value: f64 },
    /// Press and release in place; `at: null` is a miss.
    Click { at: Option<[f64; 3]> },
    /// Deform drag from one surface point to another.
    Drag {
        from: [f64; 3],
        to: [f64; 3],
        #[serde(default = "default_ticks")]
        ticks: usize,
        #[serde(default = "default_interval")]
        interval_ms: u64,
    },
    /// Undo one step.
    Undo,
    /// Redo one step.
    Redo,
    /// Loop subdivision.
    Subdivide {
        #[serde(default = "default_iterations")]
        iterations: usize,
    },
    /// QEM decimation.
    Decimate { reduction: f64 },
}

/// A parsed gesture script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    /// Steps in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Counters from a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Drag ticks that changed the mesh.
    pub ticks: usize,
    /// Steps that reported an error and were skipped.
    pub failures: usize,
}

impl Script {
    /// Parse a script.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a script file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SculptError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Replay every step against `session`, using a synthetic clock that
    /// starts at `start`.
    ///
    /// Parameter errors abort the replay. Errors the session recovers from
    /// (a rolled-back topology operation, an undo across a topology change)
    /// are counted and skipped.
    pub fn replay(&self, session: &mut SculptSession, start: Instant) -> Result<Summary> {
        let mut clock = start;
        let mut summary = Summary::default();

        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("step {}: {:?}", index, step);
            let result = match step {
                Step::Brush { kind } => {
                    session.set_brush(*kind);
                    Ok(())
                }
                Step::Axis { axis } => {
                    session.set_axis(*axis);
                    Ok(())
                }
                Step::Radius { value } => session.set_radius(*value),
                Step::Strength { value } => session.set_strength(*value),
                Step::Smoothing { value } => session.set_smoothing(*value),
                Step::Click { at } => {
                    let pick = at.map(Point3::from);
                    let event = PointerEvent::new(Point2::origin(), pick, clock);
                    session.pointer_down(event);
                    session.pointer_up(event);
                    Ok(())
                }
                Step::Drag {
                    from,
                    to,
                    ticks,
                    interval_ms,
                } => {
                    let applied = drag(
                        session,
                        Point3::from(*from),
                        Point3::from(*to),
                        *ticks,
                        Duration::from_millis(*interval_ms),
                        &mut clock,
                    )?;
                    summary.ticks += applied;
                    Ok(())
                }
                Step::Undo => session.undo().map(|_| ()),
                Step::Redo => session.redo().map(|_| ()),
                Step::Subdivide { iterations } => session.subdivide(*iterations),
                Step::Decimate { reduction } => session.decimate(*reduction),
            };

            match result {
                Ok(()) => {}
                Err(e @ SculptError::InvalidParameter { .. }) => return Err(e),
                Err(e) => {
                    log::warn!("step {} failed: {}", index, e);
                    summary.failures += 1;
                }
            }
            clock += STEP_GAP;
        }

        Ok(summary)
    }
}

fn drag(
    session: &mut SculptSession,
    from: Point3<f64>,
    to: Point3<f64>,
    ticks: usize,
    interval: Duration,
    clock: &mut Instant,
) -> Result<usize> {
    let down = PointerEvent::new(Point2::origin(), Some(from), *clock).with_modifier(true);
    if session.pointer_down(down) != Outcome::DragStarted {
        return Ok(0);
    }

    let mut applied = 0;
    let mut screen: Point2<f64> = Point2::origin();
    for i in 1..=ticks {
        *clock += interval;
        screen.x += PIXELS_PER_TICK;
        let t = i as f64 / ticks as f64;
        let pick = from + (to - from) * t;

        let event = PointerEvent::new(screen, Some(pick), *clock).with_modifier(true);
        if let Outcome::Tick(TickOutcome::Applied(_)) = session.pointer_move(event)? {
            applied += 1;
        }
    }

    session.pointer_up(PointerEvent::new(screen, Some(to), *clock));
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_session() -> SculptSession {
        let n = 9;
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let v = j * n + i;
                faces.push([v, v + 1, v + n + 1]);
                faces.push([v, v + n + 1, v + n]);
            }
        }
        let mut session = SculptSession::default();
        session.load_triangles(&vertices, &faces).unwrap();
        session
    }

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json_str(
            r#"{ "steps": [
                { "op": "brush", "kind": "deflate" },
                { "op": "axis", "axis": "z" },
                { "op": "click", "at": null },
                { "op": "drag", "from": [0, 0, 0], "to": [1, 0, 0] },
                { "op": "subdivide" },
                { "op": "decimate", "reduction": 0.3 },
                { "op": "undo" }
            ] }"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 7);
        assert_eq!(script.steps[0], Step::Brush { kind: BrushKind::Deflate });
        assert_eq!(script.steps[1], Step::Axis { axis: AxisConstraint::Z });
        assert_eq!(script.steps[2], Step::Click { at: None });
        assert_eq!(
            script.steps[3],
            Step::Drag {
                from: [0.0, 0.0, 0.0],
                to: [1.0, 0.0, 0.0],
                ticks: 10,
                interval_ms: 20
            }
        );
        assert_eq!(script.steps[4], Step::Subdivide { iterations: 1 });
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(Script::from_json_str(r#"{ "steps": [ { "op": "twist" } ] }"#).is_err());
    }

    #[test]
    fn test_replay_grab_and_undo() {
        let mut session = square_session();
        let original = session.mesh().unwrap().positions().to_vec();
        let script = Script {
            steps: vec![
                Step::Radius { value: 3.0 },
                Step::Axis { axis: AxisConstraint::Z },
                Step::Click { at: Some([4.0, 4.0, 0.0]) },
                Step::Drag {
                    from: [4.0, 4.0, 0.0],
                    to: [4.0, 4.0, 1.0],
                    ticks: 5,
                    interval_ms: 20,
                },
            ],
        };

        let summary = script.replay(&mut session, Instant::now()).unwrap();
        assert_eq!(summary, Summary { ticks: 5, failures: 0 });
        let center = session.mesh().unwrap().positions()[4 * 9 + 4];
        assert!(center.z > 0.5);

        Script { steps: vec![Step::Undo] }
            .replay(&mut session, Instant::now())
            .unwrap();
        assert_eq!(session.mesh().unwrap().positions(), &original[..]);
    }

    #[test]
    fn test_replay_counts_recoverable_failures() {
        let mut session = square_session();
        let script = Script {
            steps: vec![Step::Subdivide { iterations: 1 }, Step::Undo],
        };
        let summary = script.replay(&mut session, Instant::now()).unwrap();
        assert_eq!(summary.failures, 1);

        let bad = Script {
            steps: vec![Step::Decimate { reduction: 2.0 }],
        };
        assert!(bad.replay(&mut session, Instant::now()).is_err());
    }
}
