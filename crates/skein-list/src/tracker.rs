//! Debug-mode cursor validity tracking.
//!
//! [`IteratorTracker`] lives inside every container header. Each structural
//! mutation records the span of positions it disturbed and advances the
//! header's generation. A cursor remembers the generation it was last
//! validated at; on access it asks the tracker whether any newer record
//! covers its position. Release builds carry no state and every check
//! passes.

#[cfg(debug_assertions)]
use std::collections::VecDeque;
use std::ops::Range;

#[cfg(debug_assertions)]
use skein_core::ContainerError;
use skein_core::ContainerConfig;

/// Span used for whole-container invalidation.
const EVERYTHING: Range<usize> = 0..usize::MAX;

/// One structural mutation, as seen by cursors.
#[cfg(debug_assertions)]
#[derive(Clone, Debug)]
struct Invalidation {
    generation: u64,
    span: Range<usize>,
}

/// Generation counter plus a bounded history of disturbed position spans.
///
/// In release builds this is a zero-sized type.
#[derive(Debug)]
pub struct IteratorTracker {
    #[cfg(debug_assertions)]
    generation: u64,
    #[cfg(debug_assertions)]
    records: VecDeque<Invalidation>,
    #[cfg(debug_assertions)]
    window: usize,
}

impl IteratorTracker {
    /// Create a tracker that keeps `config.generation_window` records.
    pub fn new(
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] config: &ContainerConfig,
    ) -> Self {
        Self {
            #[cfg(debug_assertions)]
            generation: 0,
            #[cfg(debug_assertions)]
            records: VecDeque::new(),
            #[cfg(debug_assertions)]
            window: config.generation_window.max(1),
        }
    }

    /// Current generation (always 0 in release builds).
    pub fn generation(&self) -> u64 {
        #[cfg(debug_assertions)]
        {
            self.generation
        }
        #[cfg(not(debug_assertions))]
        {
            0
        }
    }

    /// Orphan every cursor whose position lies in `span`.
    pub fn invalidate(
        &mut self,
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] span: Range<usize>,
    ) {
        #[cfg(debug_assertions)]
        {
            if span.is_empty() {
                return;
            }
            self.generation += 1;
            tracing::trace!(
                generation = self.generation,
                start = span.start,
                end = span.end,
                "cursor span invalidated"
            );
            if self.records.len() == self.window {
                self.records.pop_front();
            }
            self.records.push_back(Invalidation {
                generation: self.generation,
                span,
            });
        }
    }

    /// Orphan every cursor at or after `start`.
    pub fn invalidate_from(&mut self, start: usize) {
        self.invalidate(start..usize::MAX);
    }

    /// Orphan every cursor.
    pub fn invalidate_all(&mut self) {
        self.invalidate(EVERYTHING);
    }

    /// Validate a cursor last seen at `cursor_generation` and sitting at `position`.
    ///
    /// Returns the generation the cursor may adopt on success. Fails with
    /// [`ContainerError::OrphanedCursor`] if a newer record covers
    /// `position`, or if the cursor is older than the retained history.
    #[cfg(debug_assertions)]
    pub fn check(&self, cursor_generation: u64, position: usize) -> Result<u64, ContainerError> {
        if cursor_generation == self.generation {
            return Ok(self.generation);
        }
        let orphaned = ContainerError::OrphanedCursor {
            cursor_generation,
            current_generation: self.generation,
        };
        if cursor_generation > self.generation {
            return Err(orphaned);
        }
        // Records hold consecutive generations ending at `self.generation`.
        let oldest = self
            .records
            .front()
            .map_or(self.generation, |record| record.generation);
        if cursor_generation + 1 < oldest {
            tracing::debug!(
                cursor_generation,
                oldest_retained = oldest,
                "cursor predates retained invalidation history"
            );
            return Err(orphaned);
        }
        let disturbed = self
            .records
            .iter()
            .filter(|record| record.generation > cursor_generation)
            .any(|record| record.span.contains(&position));
        if disturbed {
            tracing::debug!(
                cursor_generation,
                current_generation = self.generation,
                position,
                "orphaned cursor detected"
            );
            return Err(orphaned);
        }
        Ok(self.generation)
    }

    /// Number of invalidation records currently retained.
    #[cfg(debug_assertions)]
    pub fn retained(&self) -> usize {
        self.records.len()
    }
}

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;

    fn tracker(window: usize) -> IteratorTracker {
        IteratorTracker::new(&ContainerConfig::new().with_generation_window(window))
    }

    #[test]
    fn fresh_cursor_is_valid() {
        let t = tracker(4);
        assert_eq!(t.check(0, 10).unwrap(), 0);
    }

    #[test]
    fn span_orphans_only_covered_positions() {
        let mut t = tracker(4);
        t.invalidate(3..5);
        assert_eq!(t.generation(), 1);
        assert!(t.check(0, 2).is_ok());
        assert!(t.check(0, 3).is_err());
        assert!(t.check(0, 4).is_err());
        assert!(t.check(0, 5).is_ok());
    }

    #[test]
    fn invalidate_from_covers_tail() {
        let mut t = tracker(4);
        t.invalidate_from(7);
        assert!(t.check(0, 6).is_ok());
        assert!(t.check(0, 7).is_err());
        assert!(t.check(0, usize::MAX - 1).is_err());
    }

    #[test]
    fn invalidate_all_orphans_everything() {
        let mut t = tracker(4);
        t.invalidate_all();
        assert!(t.check(0, 0).is_err());
        assert!(t.check(0, 1_000).is_err());
    }

    #[test]
    fn empty_span_is_ignored() {
        let mut t = tracker(4);
        t.invalidate(5..5);
        assert_eq!(t.generation(), 0);
        assert_eq!(t.retained(), 0);
    }

    #[test]
    fn cursor_beyond_window_is_orphaned() {
        let mut t = tracker(2);
        t.invalidate(10..11);
        t.invalidate(10..11);
        t.invalidate(10..11);
        assert_eq!(t.retained(), 2);
        // Generation 0 would need record 1, which has been dropped.
        assert!(t.check(0, 0).is_err());
        // Generation 1 only needs records 2 and 3.
        assert_eq!(t.check(1, 0).unwrap(), 3);
    }

    #[test]
    fn future_generation_is_rejected() {
        let t = tracker(4);
        assert!(matches!(
            t.check(5, 0),
            Err(ContainerError::OrphanedCursor {
                cursor_generation: 5,
                current_generation: 0
            })
        ));
    }
}
