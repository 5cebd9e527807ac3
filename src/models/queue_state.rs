use serde::Serialize;
use std::fmt::Display;

use super::{Batch, FilterSelection, RecommendationItem, SwipeDecision, SwipeStats};

/// Logical generation of the recommendation queue
///
/// A new epoch starts with every fresh batch load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the consumption surface should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// No batch has ever been loaded
    Unloaded,
    /// A batch was loaded but came back empty
    Empty,
    Ready,
    /// Every item of the batch has been consumed
    Exhausted,
}

/// The recommendation batch held for one epoch
///
/// Items are in ranked order and never change for the lifetime of the epoch.
/// `total_unshown` is whatever the server reported at fetch time; it counts
/// candidates beyond this batch and is never recomputed locally.
#[derive(Debug, Clone)]
pub struct QueueState {
    epoch: Epoch,
    filters: FilterSelection,
    items: Vec<RecommendationItem>,
    cursor: usize,
    total_unshown: u32,
    stats: SwipeStats,
    generation_triggered: bool,
}

impl QueueState {
    pub fn new(epoch: Epoch, filters: FilterSelection, batch: Batch) -> Self {
        Self {
            epoch,
            filters,
            items: batch.items,
            cursor: 0,
            total_unshown: batch.total_unshown,
            stats: SwipeStats::default(),
            generation_triggered: false,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn items(&self) -> &[RecommendationItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_unshown(&self) -> u32 {
        self.total_unshown
    }

    pub fn stats(&self) -> SwipeStats {
        self.stats
    }

    pub fn generation_triggered(&self) -> bool {
        self.generation_triggered
    }

    pub fn current(&self) -> Option<&RecommendationItem> {
        self.items.get(self.cursor)
    }

    /// Items of this batch not yet consumed
    pub fn remaining_in_batch(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Backend supply still in reserve as seen by the trigger
    ///
    /// Can go negative when the user has consumed more than the server reported.
    pub fn remaining_supply(&self) -> i64 {
        i64::from(self.total_unshown) - self.cursor as i64
    }

    pub fn status(&self) -> QueueStatus {
        if self.items.is_empty() {
            QueueStatus::Empty
        } else if self.cursor >= self.items.len() {
            QueueStatus::Exhausted
        } else {
            QueueStatus::Ready
        }
    }

    /// Takes the item under the cursor and records the decision against it
    ///
    /// Returns `None` without touching anything when the batch is used up.
    pub fn advance(&mut self, decision: SwipeDecision) -> Option<RecommendationItem> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        self.stats.record(decision);
        Some(item)
    }

    /// Sets the once-per-epoch trigger flag; false if it was already set
    pub fn mark_generation_triggered(&mut self) -> bool {
        if self.generation_triggered {
            return false;
        }
        self.generation_triggered = true;
        true
    }

    /// Clears the trigger flag after a generation request that could not be delivered
    pub fn rearm_generation(&mut self) {
        self.generation_triggered = false;
    }
}
