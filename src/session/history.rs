//! Bounded undo/redo stacks of position snapshots.
//!
//! A snapshot is a full copy of the vertex position buffer, tagged with the
//! topology generation it was taken from. Positions only mean something for
//! the mesh they were captured on, so a snapshot from another generation is
//! never installed: the history reports [`SculptError::TopologyChanged`] and
//! drops every entry that no longer fits the current mesh.

use std::collections::VecDeque;

use nalgebra::Point3;

use crate::error::{Result, SculptError};

/// A captured position buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Topology generation of the mesh the positions belong to.
    pub generation: u64,
    /// Vertex positions, index-aligned with that mesh.
    pub positions: Vec<Point3<f64>>,
}

impl Snapshot {
    /// Capture a position buffer.
    pub fn new(generation: u64, positions: &[Point3<f64>]) -> Self {
        Self {
            generation,
            positions: positions.to_vec(),
        }
    }
}

/// Undo and redo stacks, each holding at most `capacity` snapshots.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(30)
    }
}

impl EditHistory {
    /// Empty history with the given depth (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity + 1),
            redo: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Maximum depth of each stack.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of undo steps available.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps available.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.undo.iter()
    }

    /// Record the state before an edit. Clears redo and evicts the oldest
    /// entry when full.
    pub fn push(&mut self, snapshot: Snapshot) {
        push_bounded(&mut self.undo, snapshot, self.capacity);
        self.redo.clear();
        log::debug!("history: pushed undo ({} entries)", self.undo.len());
    }

    /// Step back. `current` is the state being left; it goes onto the redo stack.
    ///
    /// Returns `Ok(None)` if there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Result<Option<Snapshot>> {
        step(&mut self.undo, &mut self.redo, current, self.capacity, "undo")
    }

    /// Step forward. `current` goes back onto the undo stack.
    ///
    /// Returns `Ok(None)` if there is nothing to redo.
    pub fn redo(&mut self, current: Snapshot) -> Result<Option<Snapshot>> {
        step(&mut self.redo, &mut self.undo, current, self.capacity, "redo")
    }

    /// Take back the most recent push without touching the redo stack.
    ///
    /// Used when the edit the push guarded failed before changing anything.
    pub fn rollback(&mut self) -> Option<Snapshot> {
        let snapshot = self.undo.pop_back();
        if snapshot.is_some() {
            log::debug!("history: rolled back last push");
        }
        snapshot
    }

    /// Drop every snapshot not taken from `generation`.
    pub fn retain_generation(&mut self, generation: u64) {
        self.undo.retain(|s| s.generation == generation);
        self.redo.retain(|s| s.generation == generation);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, capacity: usize) {
    stack.push_back(snapshot);
    while stack.len() > capacity {
        stack.pop_front();
    }
}

fn step(
    from: &mut VecDeque<Snapshot>,
    to: &mut VecDeque<Snapshot>,
    current: Snapshot,
    capacity: usize,
    what: &'static str,
) -> Result<Option<Snapshot>> {
    let Some(top) = from.back() else {
        log::debug!("history: nothing to {}", what);
        return Ok(None);
    };

    if top.generation != current.generation {
        let snapshot = top.generation;
        from.retain(|s| s.generation == current.generation);
        to.retain(|s| s.generation == current.generation);
        log::warn!(
            "history: {} snapshot is from topology generation {}, mesh is at {}",
            what,
            snapshot,
            current.generation
        );
        return Err(SculptError::TopologyChanged {
            snapshot,
            current: current.generation,
        });
    }

    let restored = from.pop_back();
    push_bounded(to, current, capacity);
    log::debug!("history: {} ({} undo / {} redo left)", what, from.len(), to.len());
    Ok(restored)
}
