//! Dirty Rectangle Tracking
//!
//! Bounded list of screen regions waiting to be repainted.
//!
//! Merge rule: a new rectangle that fully contains an existing entry
//! replaces that entry in place (the list does not grow). Otherwise it is
//! appended. Once the list holds `MAX_DIRTY_RECTS` entries every further
//! invalidation is dropped; the region stays stale until a later
//! invalidation that fits covers it.

use alloc::vec::Vec;

use crate::geometry::Rect;

/// Maximum number of pending dirty rectangles
pub const MAX_DIRTY_RECTS: usize = 64;

/// What `invalidate` did with a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Replaced the entry at this index, which it fully contains
    Replaced(usize),
    /// Appended as a new entry
    Appended,
    /// List full, rectangle discarded
    Dropped,
}

/// Statistics about dirty tracking
#[derive(Debug, Clone, Default)]
pub struct DirtyStats {
    /// Total invalidations received
    pub total_rects: u64,
    /// Invalidations that replaced a contained entry
    pub replaced_rects: u64,
    /// Invalidations lost to a full list
    pub dropped_rects: u64,
}

/// Bounded dirty-rectangle list
pub struct DirtyList {
    rects: Vec<Rect>,
    pub stats: DirtyStats,
}

impl DirtyList {
    pub fn new() -> Self {
        Self {
            rects: Vec::with_capacity(MAX_DIRTY_RECTS),
            stats: DirtyStats::default(),
        }
    }

    /// Mark a region as needing repaint
    pub fn invalidate(&mut self, rect: Rect) -> Invalidation {
        self.stats.total_rects += 1;

        if self.rects.len() >= MAX_DIRTY_RECTS {
            self.stats.dropped_rects += 1;
            log::trace!("[GUI] Dirty list full, dropping {:?}", rect);
            return Invalidation::Dropped;
        }

        if let Some(index) = self.rects.iter().position(|r| rect.contains_rect(r)) {
            self.rects[index] = rect;
            self.stats.replaced_rects += 1;
            return Invalidation::Replaced(index);
        }

        self.rects.push(rect);
        Invalidation::Appended
    }

    /// Pending rectangles, oldest first
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Clear all damage (after rendering)
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rects.len() >= MAX_DIRTY_RECTS
    }
}

impl Default for DirtyList {
    fn default() -> Self {
        Self::new()
    }
}
