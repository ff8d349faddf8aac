//! The editing session.
//!
//! [`SculptSession`] owns everything one open document needs: the mesh, the
//! brush settings, the anchor, the active drag, the undo history and the
//! normal cache. Hosts feed it pointer events (or call the lower-level drag
//! operations directly) and react to the [`Notice`]s it emits.
//!
//! # Gestures
//!
//! - A short click that hits the surface places the anchor.
//! - Pressing with the deform modifier held starts a drag session around the
//!   anchor. One drag session is one undo step, however many ticks it has.
//! - Releasing the button ends the session.
//!
//! # Example
//!
//! ```
//! use chisel::session::SculptSession;
//! use chisel::config::SculptConfig;
//! use nalgebra::Point3;
//! use std::time::Instant;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mut session = SculptSession::new(SculptConfig::default());
//! session.load_triangles(&vertices, &faces).unwrap();
//! session.set_radius(1.0).unwrap();
//!
//! session.set_anchor(Some(Point3::origin()));
//! session.begin_drag(Some(Point3::origin()));
//! session.drag_tick(Some(Point3::new(0.0, 0.0, 0.1)), Instant::now()).unwrap();
//! session.end_drag();
//!
//! let moved = session.mesh().unwrap().position(0.into());
//! assert!((moved.z - 0.1).abs() < 1e-12);
//! assert!(session.undo().unwrap());
//! ```

mod drag;
mod history;
mod notify;

pub use drag::{
    clamp_length, Advance, AxisConstraint, DragLimits, DragSession, Motion, TickReport,
};
pub use history::{EditHistory, Snapshot};
pub use notify::{Notice, Notifier};

use std::time::Instant;

use nalgebra::{Point2, Point3};

use crate::algo::brush::{BrushKind, BrushParams, Stroke};
use crate::algo::decimate::Decimate;
use crate::algo::normals::NormalCache;
use crate::algo::subdivide::Subdivide;
use crate::algo::TopologyOp;
use crate::config::SculptConfig;
use crate::error::{Result, SculptError};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// One pointer sample from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Pointer position in screen pixels.
    pub screen: Point2<f64>,
    /// Surface point under the pointer, if the pick hit the mesh.
    pub pick: Option<Point3<f64>>,
    /// Whether the deform modifier (Shift in the desktop editor) is held.
    pub deform_modifier: bool,
    /// When the sample was taken.
    pub time: Instant,
}

impl PointerEvent {
    /// A sample without the deform modifier.
    pub fn new(screen: Point2<f64>, pick: Option<Point3<f64>>, time: Instant) -> Self {
        Self {
            screen,
            pick,
            deform_modifier: false,
            time,
        }
    }

    /// Set the deform modifier.
    pub fn with_modifier(mut self, held: bool) -> Self {
        self.deform_modifier = held;
        self
    }
}

/// Coarse state of the gesture machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// No mesh loaded.
    Idle,
    /// Mesh loaded, no anchor yet.
    AnchorArmed,
    /// Anchor placed, no drag in progress.
    Ready,
    /// A drag session is active.
    Sculpting,
}

/// Result of one drag tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No drag session is active.
    Inactive,
    /// Too soon after the previous accepted tick.
    RateLimited,
    /// The pick missed the surface.
    Missed,
    /// First hit of the session, stored as the reference point.
    Seeded,
    /// The step was below the noise floor.
    BelowNoiseFloor,
    /// The brush was applied.
    Applied(TickReport),
}

/// What a pointer event or gesture operation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing happened.
    Ignored,
    /// The anchor was placed at this point.
    AnchorSet(Point3<f64>),
    /// A click missed the surface.
    PickMissed,
    /// A deform gesture was attempted without an anchor.
    AnchorRequired,
    /// A drag session started.
    DragStarted,
    /// A drag tick ran.
    Tick(TickOutcome),
    /// The drag session ended.
    DragEnded,
}

#[derive(Debug, Clone, Copy, Default)]
struct Pointer {
    press: Option<Point2<f64>>,
    down: bool,
    moved: bool,
}

/// A single-document sculpting session.
#[derive(Debug)]
pub struct SculptSession {
    config: SculptConfig,
    params: BrushParams,
    brush: BrushKind,
    axis: AxisConstraint,
    mesh: Option<HalfEdgeMesh>,
    limits: DragLimits,
    anchor: Option<Point3<f64>>,
    drag: Option<DragSession>,
    pointer: Pointer,
    history: EditHistory,
    normals: NormalCache,
    generation: u64,
    status: String,
    notifier: Notifier,
}

impl Default for SculptSession {
    fn default() -> Self {
        Self::new(SculptConfig::default())
    }
}

impl SculptSession {
    /// An empty session.
    pub fn new(config: SculptConfig) -> Self {
        Self {
            params: BrushParams::default(),
            brush: BrushKind::default(),
            axis: AxisConstraint::default(),
            mesh: None,
            limits: DragLimits::default(),
            anchor: None,
            drag: None,
            pointer: Pointer::default(),
            history: EditHistory::new(config.history_capacity),
            normals: NormalCache::new(config.normal_budget()),
            generation: 0,
            status: String::new(),
            notifier: Notifier::none(),
            config,
        }
    }

    /// Attach a notification callback.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    // ------------------------------------------------------------------
    // Mesh
    // ------------------------------------------------------------------

    /// Install a mesh, resetting anchor, drag, history and cached normals.
    pub fn load_mesh(&mut self, mesh: HalfEdgeMesh) {
        self.limits = DragLimits::from_diagonal(mesh.bounding_diagonal());
        log::info!(
            "loaded mesh: {} vertices, {} faces (max step {:.3}, max amount {:.3})",
            mesh.num_vertices(),
            mesh.num_faces(),
            self.limits.max_step,
            self.limits.max_amount
        );

        let text = format!(
            "Loaded {} vertices, {} faces",
            mesh.num_vertices(),
            mesh.num_faces()
        );
        self.mesh = Some(mesh);
        self.anchor = None;
        self.drag = None;
        self.pointer = Pointer::default();
        self.history.clear();
        self.normals.invalidate();
        self.generation += 1;

        self.notifier.redraw();
        self.report(text);
    }

    /// Build a mesh from face-vertex lists and install it.
    pub fn load_triangles(&mut self, vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<()> {
        let mesh = build_from_triangles(vertices, faces)?;
        self.load_mesh(mesh);
        Ok(())
    }

    /// The current mesh.
    pub fn mesh(&self) -> Option<&HalfEdgeMesh> {
        self.mesh.as_ref()
    }

    /// Current positions and faces, for saving.
    pub fn export(&self) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
        self.mesh.as_ref().map(to_face_vertex).ok_or(SculptError::NoMesh)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The configuration this session was created with.
    pub fn config(&self) -> &SculptConfig {
        &self.config
    }

    /// Current brush parameters.
    pub fn params(&self) -> &BrushParams {
        &self.params
    }

    /// Active brush.
    pub fn brush(&self) -> BrushKind {
        self.brush
    }

    /// Active axis constraint.
    pub fn axis(&self) -> AxisConstraint {
        self.axis
    }

    /// Per-load displacement limits.
    pub fn limits(&self) -> &DragLimits {
        &self.limits
    }

    /// The anchor, if placed.
    pub fn anchor(&self) -> Option<Point3<f64>> {
        self.anchor
    }

    /// The active drag session.
    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Indicator segment of the active drag.
    pub fn indicator(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        self.drag.as_ref().and_then(|d| d.indicator)
    }

    /// Undo/redo stacks.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Cached normals.
    pub fn normal_cache(&self) -> &NormalCache {
        &self.normals
    }

    /// Topology generation of the current mesh.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Coarse gesture state.
    pub fn state(&self) -> GestureState {
        match (&self.mesh, &self.anchor, &self.drag) {
            (None, _, _) => GestureState::Idle,
            (Some(_), _, Some(_)) => GestureState::Sculpting,
            (Some(_), None, None) => GestureState::AnchorArmed,
            (Some(_), Some(_), None) => GestureState::Ready,
        }
    }

    /// True while a drag session is active.
    pub fn is_sculpting(&self) -> bool {
        self.drag.is_some()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Switch brush. Cached normals are dropped.
    pub fn set_brush(&mut self, brush: BrushKind) {
        if brush != self.brush {
            log::debug!("brush: {} -> {}", self.brush, brush);
        }
        self.brush = brush;
        self.normals.invalidate();
    }

    /// Set the Grab axis constraint.
    pub fn set_axis(&mut self, axis: AxisConstraint) {
        self.axis = axis;
    }

    /// Set the brush radius (clamped away from zero).
    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        if radius.is_nan() {
            return Err(SculptError::invalid_param("radius", radius, "must be a number"));
        }
        self.params.set_radius(radius);
        Ok(())
    }

    /// Set the brush strength (clamped into `[0, max_strength]`).
    pub fn set_strength(&mut self, strength: f64) -> Result<()> {
        if strength.is_nan() {
            return Err(SculptError::invalid_param("strength", strength, "must be a number"));
        }
        self.params.set_strength(strength, self.config.max_strength);
        Ok(())
    }

    /// Set the smoothing amount (clamped into `[0, 1]`).
    pub fn set_smoothing(&mut self, smoothing: f64) -> Result<()> {
        if smoothing.is_nan() {
            return Err(SculptError::invalid_param("smoothing", smoothing, "must be a number"));
        }
        self.params.set_smoothing(smoothing);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pointer front-end
    // ------------------------------------------------------------------

    /// Button pressed.
    pub fn pointer_down(&mut self, event: PointerEvent) -> Outcome {
        if self.mesh.is_none() {
            return Outcome::Ignored;
        }

        self.pointer = Pointer {
            press: Some(event.screen),
            down: true,
            moved: false,
        };

        if event.deform_modifier {
            self.begin_drag(event.pick)
        } else {
            Outcome::Ignored
        }
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, event: PointerEvent) -> Result<Outcome> {
        if self.mesh.is_none() || !self.pointer.down {
            return Ok(Outcome::Ignored);
        }

        if self.drag.is_none() && event.deform_modifier {
            return Ok(self.begin_drag(event.pick));
        }

        if self.drag.is_some() {
            return Ok(Outcome::Tick(self.drag_tick(event.pick, event.time)?));
        }

        if let Some(press) = self.pointer.press {
            if (event.screen - press).norm() >= self.config.click_threshold_px {
                self.pointer.moved = true;
            }
        }
        Ok(Outcome::Ignored)
    }

    /// Button released.
    pub fn pointer_up(&mut self, event: PointerEvent) -> Outcome {
        let pointer = std::mem::take(&mut self.pointer);
        if self.mesh.is_none() {
            return Outcome::Ignored;
        }

        if self.drag.is_some() {
            return self.end_drag();
        }

        if pointer.down && !pointer.moved {
            return self.set_anchor(event.pick);
        }
        Outcome::Ignored
    }

    // ------------------------------------------------------------------
    // Gesture operations
    // ------------------------------------------------------------------

    /// Place the anchor at a click's pick result.
    pub fn set_anchor(&mut self, pick: Option<Point3<f64>>) -> Outcome {
        if self.mesh.is_none() {
            return Outcome::Ignored;
        }

        match pick {
            Some(p) => {
                self.anchor = Some(p);
                if let Some(drag) = self.drag.as_mut() {
                    drag.reset_totals();
                }
                log::debug!("anchor set at ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
                self.report(format!("Anchor set ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z));
                self.notifier.redraw();
                Outcome::AnchorSet(p)
            }
            None => {
                self.report("No hit");
                Outcome::PickMissed
            }
        }
    }

    /// Start a drag session, recording one undo snapshot.
    ///
    /// `pick` seeds the first reference point; if it misses, the first tick
    /// that hits seeds it instead.
    pub fn begin_drag(&mut self, pick: Option<Point3<f64>>) -> Outcome {
        if self.mesh.is_none() {
            return Outcome::Ignored;
        }
        if self.anchor.is_none() {
            log::debug!("deform gesture without anchor");
            self.report("Set an anchor first (click without the modifier)");
            return Outcome::AnchorRequired;
        }

        self.push_undo();
        self.drag = Some(DragSession::start(pick));
        log::debug!("drag started ({} brush)", self.brush);
        Outcome::DragStarted
    }

    /// Run one drag tick at time `now`.
    pub fn drag_tick(&mut self, pick: Option<Point3<f64>>, now: Instant) -> Result<TickOutcome> {
        let (Some(mesh), Some(drag), Some(anchor)) =
            (self.mesh.as_mut(), self.drag.as_mut(), self.anchor)
        else {
            return Ok(TickOutcome::Inactive);
        };

        if !drag.accept_tick(now, self.config.min_tick_interval()) {
            return Ok(TickOutcome::RateLimited);
        }
        let Some(pick) = pick else {
            return Ok(TickOutcome::Missed);
        };

        let delta = match drag.advance(pick, self.limits.max_step, self.config.noise_floor) {
            Advance::Seeded => return Ok(TickOutcome::Seeded),
            Advance::BelowNoiseFloor => return Ok(TickOutcome::BelowNoiseFloor),
            Advance::Step { delta } => delta,
        };

        let (motion, report) = drag.plan(
            delta,
            self.brush,
            self.axis,
            &self.params,
            &self.limits,
            anchor,
            pick,
        );

        let stroke = Stroke::new(anchor, self.params.radius).with_parallel(self.config.parallel);
        let positions = match motion {
            Motion::Grab { delta } => BrushKind::Grab.deform(
                mesh.positions(),
                &stroke.with_strength(self.params.strength).with_delta(delta),
            ),
            Motion::Normal { amount } => {
                let normals = self.normals.get(mesh, now);
                self.brush
                    .deform(mesh.positions(), &stroke.with_amount(amount).with_normals(normals))
            }
            Motion::Smooth {
                strength,
                drag_length,
            } => BrushKind::Smooth.deform(
                mesh.positions(),
                &stroke.with_strength(strength).with_drag_length(drag_length),
            ),
        };
        mesh.set_positions(positions)?;

        if !self.brush.needs_normals() {
            self.normals.invalidate();
        }

        log::debug!("tick: {} {}", self.brush, report);
        self.notifier.redraw();
        self.report(report.to_string());
        Ok(TickOutcome::Applied(report))
    }

    /// End the drag session. Anchor and mesh are left as they are.
    pub fn end_drag(&mut self) -> Outcome {
        match self.drag.take() {
            Some(drag) => {
                log::debug!("drag ended (total {:.3})", drag.total);
                self.report("Sculpt done");
                self.notifier.redraw();
                Outcome::DragEnded
            }
            None => Outcome::Ignored,
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Snapshot the current positions onto the undo stack.
    pub fn push_undo(&mut self) {
        if let Some(mesh) = &self.mesh {
            self.history
                .push(Snapshot::new(self.generation, mesh.positions()));
        }
    }

    /// Restore the previous snapshot. Returns `Ok(false)` if there was nothing
    /// to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.step_history(true)
    }

    /// Re-apply the last undone snapshot. Returns `Ok(false)` if there was
    /// nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.step_history(false)
    }

    fn step_history(&mut self, backward: bool) -> Result<bool> {
        let what = if backward { "Undo" } else { "Redo" };
        let Some(mesh) = self.mesh.as_mut() else {
            return Ok(false);
        };

        let current = Snapshot::new(self.generation, mesh.positions());
        let stepped = if backward {
            self.history.undo(current)
        } else {
            self.history.redo(current)
        };

        let snapshot = match stepped {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                self.report(format!("Nothing to {}", what.to_lowercase()));
                return Ok(false);
            }
            Err(e) => {
                self.report(format!("{} unavailable: {}", what, e));
                return Err(e);
            }
        };

        mesh.set_positions(snapshot.positions)?;
        self.normals.invalidate();
        self.notifier.redraw();
        self.report(what);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    /// Loop-subdivide the mesh `iterations` times (1 to 3).
    pub fn subdivide(&mut self, iterations: usize) -> Result<()> {
        let op = Subdivide::new(iterations)?.with_max_vertices(self.config.max_vertices);
        self.apply_topology(&op)
    }

    /// Remove roughly `reduction` of the triangles (0.05 to 0.90).
    pub fn decimate(&mut self, reduction: f64) -> Result<()> {
        let op = Decimate::new(reduction)?;
        self.apply_topology(&op)
    }

    /// Replace the mesh with the output of `op`.
    ///
    /// An undo snapshot is pushed first and taken back if the operation
    /// fails, so a failure leaves mesh and history as they were. On success
    /// the topology generation advances, cached normals are dropped and the
    /// anchor is kept.
    pub fn apply_topology(&mut self, op: &dyn TopologyOp) -> Result<()> {
        let name = op.name();
        if self.mesh.is_none() {
            return Err(SculptError::NoMesh);
        }
        self.end_drag();

        self.push_undo();
        let Some(mesh) = self.mesh.as_ref() else {
            return Err(SculptError::NoMesh);
        };
        let before = (mesh.num_vertices(), mesh.num_faces());

        let result = op.apply(mesh).and_then(|out| {
            if out.num_vertices() > self.config.max_vertices {
                Err(SculptError::topology(
                    name,
                    format!(
                        "{} vertices exceeds the limit of {}",
                        out.num_vertices(),
                        self.config.max_vertices
                    ),
                ))
            } else {
                Ok(out)
            }
        });

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                self.history.rollback();
                log::warn!("{} rolled back: {}", name, e);
                self.report(format!("{} failed: {}", name, e));
                return Err(e);
            }
        };

        log::info!(
            "{}: {} -> {} vertices, {} -> {} faces",
            name,
            before.0,
            out.num_vertices(),
            before.1,
            out.num_faces()
        );
        let text = format!(
            "{}: {} vertices, {} faces",
            name,
            out.num_vertices(),
            out.num_faces()
        );

        self.mesh = Some(out);
        self.generation += 1;
        self.normals.invalidate();
        self.notifier.redraw();
        self.report(text);
        Ok(())
    }

    fn report(&mut self, text: impl Into<String>) {
        self.status = text.into();
        self.notifier.status(self.status.clone());
    }
}
