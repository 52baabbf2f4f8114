//! Element storage backends.

pub mod memory;

use std::ops::Range;

use crate::predicate::ClosurePredicate;
use crate::types::{CloseOutcome, ElementId, ElementRecord};

/// Trait for element storage backends.
///
/// Elements occupy dense slots `0..len`. The store is only mutated through
/// [`close`] and [`open`]: closing vacates a slot without moving any other
/// element, and the next [`open`] refills vacated slots before appending.
/// A maintenance step always pairs the two under one exclusive borrow, so
/// readers never observe a vacated slot.
///
/// [`close`]: ElementStore::close
/// [`open`]: ElementStore::open
pub trait ElementStore: Send + Sync {
    /// Fetch an element by id.
    fn get(&self, id: ElementId) -> Option<&ElementRecord>;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All elements in slot order.
    fn all(&self) -> &[ElementRecord];

    /// Elements in a slot range, clipped to the store length.
    fn window(&self, range: Range<usize>) -> &[ElementRecord];

    /// Vacate the slot holding `id`. Returns the closed record.
    ///
    /// The slot stays reserved until the next [`open`](ElementStore::open).
    fn vacate(&mut self, id: ElementId) -> Option<ElementRecord>;

    /// Open `count` fresh elements and return their ids.
    ///
    /// Vacated slots are refilled first, lowest slot first, and the rest are
    /// appended. Slots still vacant afterwards are filled by moving elements
    /// in from the tail, so the slots stay dense.
    fn open(&mut self, count: usize) -> Vec<ElementId>;

    /// The id the next opened element will receive.
    fn next_id(&self) -> ElementId;

    /// Close every present, currently-closable id among `ids`.
    ///
    /// Missing or non-closable ids are skipped. Duplicates are processed once.
    /// Must be followed by [`open`](ElementStore::open), even with a count of 0.
    fn close<P>(&mut self, ids: &[ElementId], predicate: &P) -> CloseOutcome
    where
        P: ClosurePredicate + ?Sized,
        Self: Sized,
    {
        let mut outcome = CloseOutcome::default();

        for &id in ids {
            if outcome.closed.contains(&id) || outcome.skipped.contains(&id) {
                continue;
            }

            let closable = self
                .get(id)
                .map(|record| predicate.is_closable(record))
                .unwrap_or(false);

            if closable && self.vacate(id).is_some() {
                outcome.closed.push(id);
            } else {
                outcome.skipped.push(id);
            }
        }

        outcome
    }
}

pub use memory::InMemoryElementStore;
