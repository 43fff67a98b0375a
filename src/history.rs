//! Undo/redo over whole-canvas snapshots.
//!
//! Both stacks hold encoded copies, most recent last. Every snapshot pushed
//! by a regular edit discards the redo stack. Depth is unbounded unless a
//! limit is configured, in which case the oldest undo entries are evicted.

use tracing::{debug, info};

use crate::canvas::{Canvas, Snapshot};
use crate::error::Error;

#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` undo snapshots (`None` = unbounded).
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self { limit: limit.map(|l| l.max(1)), ..Self::default() }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record the canvas as it is now and drop the redo history.
    pub fn snapshot(&mut self, canvas: &Canvas) -> Result<(), Error> {
        let snap = canvas.encode_snapshot()?;
        self.push_undo(snap);
        self.discard_redo();
        debug!(undo = self.undo.len(), "snapshot taken");
        Ok(())
    }

    /// Snapshot, then erase the canvas.
    pub fn clear(&mut self, canvas: &mut Canvas) -> Result<(), Error> {
        self.snapshot(canvas)?;
        canvas.clear();
        info!("canvas cleared");
        Ok(())
    }

    /// Drop redo entries because the canvas was edited by something other than undo/redo.
    pub fn discard_redo(&mut self) {
        if !self.redo.is_empty() {
            debug!(dropped = self.redo.len(), "redo history discarded");
            self.redo.clear();
        }
    }

    /// Step back one snapshot. Returns `false` (and does nothing) when there is nothing to undo.
    pub async fn undo(&mut self, canvas: &mut Canvas) -> Result<bool, Error> {
        let Some(prev) = self.undo.pop() else {
            return Ok(false);
        };
        let current = match canvas.encode_snapshot() {
            Ok(current) => current,
            Err(e) => {
                self.undo.push(prev);
                return Err(e);
            }
        };
        if let Err(e) = canvas.restore(&prev).await {
            self.undo.push(prev);
            return Err(e);
        }
        self.redo.push(current);
        debug!(undo = self.undo.len(), redo = self.redo.len(), "undo");
        Ok(true)
    }

    /// Step forward one snapshot. Returns `false` (and does nothing) when there is nothing to redo.
    pub async fn redo(&mut self, canvas: &mut Canvas) -> Result<bool, Error> {
        let Some(next) = self.redo.pop() else {
            return Ok(false);
        };
        let current = match canvas.encode_snapshot() {
            Ok(current) => current,
            Err(e) => {
                self.redo.push(next);
                return Err(e);
            }
        };
        if let Err(e) = canvas.restore(&next).await {
            self.redo.push(next);
            return Err(e);
        }
        self.push_undo(current);
        debug!(undo = self.undo.len(), redo = self.redo.len(), "redo");
        Ok(true)
    }

    fn push_undo(&mut self, snap: Snapshot) {
        self.undo.push(snap);
        if let Some(limit) = self.limit {
            if self.undo.len() > limit {
                let evict = self.undo.len() - limit;
                self.undo.drain(..evict);
                debug!(evict, "oldest undo snapshots evicted");
            }
        }
    }
}
