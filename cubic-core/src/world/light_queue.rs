//! FIFO queue of light work handed to the external light engine.

use std::collections::VecDeque;

use cubic_utils::BlockPos;
use rustc_hash::FxHashSet;

use crate::chunk::light_type::LightType;

/// A unit of work for the light engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightUpdate {
    /// Recheck one light channel at a position.
    Check {
        /// The channel to recheck.
        kind: LightType,
        /// The position to recheck.
        pos: BlockPos,
    },
    /// Recheck every channel at a position, issued by the relight cursor.
    Relight(BlockPos),
}

impl LightUpdate {
    /// The position the update targets.
    #[must_use]
    pub fn pos(self) -> BlockPos {
        match self {
            Self::Check { pos, .. } | Self::Relight(pos) => pos,
        }
    }
}

/// A deduplicating FIFO of [`LightUpdate`]s.
///
/// An update already waiting in the queue is not queued again, so neighbouring
/// block writes in the same tick collapse into a single check.
#[derive(Debug, Default)]
pub struct LightUpdateQueue {
    pending: VecDeque<LightUpdate>,
    queued: FxHashSet<LightUpdate>,
}

impl LightUpdateQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an update, returning false if it was already waiting.
    pub fn push(&mut self, update: LightUpdate) -> bool {
        if !self.queued.insert(update) {
            return false;
        }
        self.pending.push_back(update);
        true
    }

    /// Takes the oldest update.
    pub fn pop(&mut self) -> Option<LightUpdate> {
        let update = self.pending.pop_front()?;
        self.queued.remove(&update);
        Some(update)
    }

    /// Number of waiting updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Takes every waiting update in queue order.
    pub fn drain(&mut self) -> Vec<LightUpdate> {
        self.queued.clear();
        self.pending.drain(..).collect()
    }

    /// Drops every waiting update.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.queued.clear();
    }
}
