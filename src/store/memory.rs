//! In-memory element store.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use crate::types::{ElementId, ElementRecord};
use super::ElementStore;

/// In-memory element store.
///
/// Elements live in a dense `Vec` of slots with an id to slot index beside
/// it. Closing an element vacates its slot in place, and the next `open`
/// writes a fresh element into it, so no other element changes position
/// and every maintenance step costs O(batch) regardless of store size.
#[derive(Debug, Clone, Default)]
pub struct InMemoryElementStore {
    /// Element per slot.
    elements: Vec<ElementRecord>,
    /// Slot of every open element.
    slots: HashMap<ElementId, usize>,
    /// Slots vacated since the last `open`.
    vacant: BTreeSet<usize>,
    /// Next id to assign.
    next_id: ElementId,
}

impl InMemoryElementStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `count` elements, ids `0..count`.
    pub fn seeded(count: usize) -> Self {
        let mut store = Self::new();
        store.open(count);
        store
    }

    /// Slot currently holding `id`.
    pub fn slot_of(&self, id: ElementId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    fn fresh(&mut self) -> ElementRecord {
        let id = self.next_id;
        self.next_id = id.next();
        ElementRecord::open(id)
    }

    /// Move tail elements into the slots left vacant after refilling.
    fn compact(&mut self) {
        while let Some(hole) = self.vacant.pop_first() {
            // Vacant tail slots are dropped rather than filled.
            while self.elements.len() > hole + 1 && self.vacant.remove(&(self.elements.len() - 1)) {
                self.elements.pop();
            }

            let tail = self.elements.len() - 1;
            if tail == hole {
                self.elements.pop();
                continue;
            }

            if let Some(record) = self.elements.pop() {
                self.slots.insert(record.id, hole);
                self.elements[hole] = record;
            }
        }
    }
}

impl ElementStore for InMemoryElementStore {
    fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        self.slot_of(id).map(|slot| &self.elements[slot])
    }

    fn len(&self) -> usize {
        self.elements.len() - self.vacant.len()
    }

    fn all(&self) -> &[ElementRecord] {
        &self.elements
    }

    fn window(&self, range: Range<usize>) -> &[ElementRecord] {
        let len = self.elements.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        &self.elements[start..end]
    }

    fn vacate(&mut self, id: ElementId) -> Option<ElementRecord> {
        let slot = self.slots.remove(&id)?;
        self.vacant.insert(slot);
        Some(self.elements[slot].clone())
    }

    fn open(&mut self, count: usize) -> Vec<ElementId> {
        let mut opened = Vec::with_capacity(count);

        for _ in 0..count {
            let record = self.fresh();
            opened.push(record.id);

            match self.vacant.pop_first() {
                Some(slot) => {
                    self.slots.insert(record.id, slot);
                    self.elements[slot] = record;
                }
                None => {
                    self.slots.insert(record.id, self.elements.len());
                    self.elements.push(record);
                }
            }
        }

        self.compact();
        opened
    }

    fn next_id(&self) -> ElementId {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Always, ClosableSet, Never};

    fn ids(store: &InMemoryElementStore) -> Vec<u64> {
        store.all().iter().map(|e| e.id.get()).collect()
    }

    #[test]
    fn test_seeded_ids_are_sequential() {
        let store = InMemoryElementStore::seeded(5);
        assert_eq!(ids(&store), vec![0, 1, 2, 3, 4]);
        assert_eq!(store.next_id(), ElementId::new(5));
    }

    #[test]
    fn test_get() {
        let store = InMemoryElementStore::seeded(3);
        assert_eq!(store.get(ElementId::new(2)).map(|e| e.id), Some(ElementId::new(2)));
        assert!(store.get(ElementId::new(3)).is_none());
    }

    #[test]
    fn test_window_is_clipped() {
        let store = InMemoryElementStore::seeded(5);
        assert_eq!(store.window(3..10).len(), 2);
        assert!(store.window(7..9).is_empty());
        assert!(store.window(4..2).is_empty());
    }

    #[test]
    fn test_close_reuses_slot_in_place() {
        let mut store = InMemoryElementStore::seeded(5);
        let closable = ClosableSet::from_ids([ElementId::new(1), ElementId::new(3)]);

        let outcome = store.close(&[ElementId::new(1), ElementId::new(3)], &closable);
        assert_eq!(outcome.closed, vec![ElementId::new(1), ElementId::new(3)]);
        assert_eq!(store.len(), 3);

        let opened = store.open(2);
        assert_eq!(opened, vec![ElementId::new(5), ElementId::new(6)]);
        assert_eq!(ids(&store), vec![0, 5, 2, 6, 4]);
        assert_eq!(store.slot_of(ElementId::new(5)), Some(1));
        assert!(store.get(ElementId::new(1)).is_none());
        assert_eq!(store.all()[1].id, ElementId::new(5));
    }

    #[test]
    fn test_open_appends_after_filling_vacancies() {
        let mut store = InMemoryElementStore::seeded(3);

        store.close(&[ElementId::new(1)], &Always);
        let opened = store.open(3);

        assert_eq!(opened, vec![ElementId::new(3), ElementId::new(4), ElementId::new(5)]);
        assert_eq!(ids(&store), vec![0, 3, 2, 4, 5]);
        assert_eq!(store.get(ElementId::new(5)).map(|e| e.id), Some(ElementId::new(5)));
    }

    #[test]
    fn test_unfilled_vacancies_are_compacted() {
        let mut store = InMemoryElementStore::seeded(6);

        store.close(&[ElementId::new(0), ElementId::new(2), ElementId::new(5)], &Always);
        let opened = store.open(1);

        assert_eq!(opened, vec![ElementId::new(6)]);
        assert_eq!(ids(&store), vec![6, 1, 4, 3]);
        assert_eq!(store.len(), 4);
        for (slot, record) in store.all().iter().enumerate() {
            assert_eq!(store.slot_of(record.id), Some(slot));
        }
        assert!(store.get(ElementId::new(5)).is_none());
    }

    #[test]
    fn test_closing_everything_empties_store() {
        let mut store = InMemoryElementStore::seeded(4);
        let all: Vec<_> = (0..4).map(ElementId::new).collect();

        store.close(&all, &Always);
        store.open(0);

        assert!(store.is_empty());
        assert!(store.all().is_empty());
        assert_eq!(store.open(1), vec![ElementId::new(4)]);
    }

    #[test]
    fn test_close_skips_non_closable_and_missing() {
        let mut store = InMemoryElementStore::seeded(3);

        let outcome = store.close(&[ElementId::new(0), ElementId::new(9)], &Never);
        assert!(outcome.closed.is_empty());
        assert_eq!(outcome.skipped, vec![ElementId::new(0), ElementId::new(9)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_close_processes_duplicates_once() {
        let mut store = InMemoryElementStore::seeded(3);

        let outcome = store.close(&[ElementId::new(2), ElementId::new(2)], &Always);
        assert_eq!(outcome.closed, vec![ElementId::new(2)]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_empty_store() {
        let store = InMemoryElementStore::new();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
        assert!(store.window(0..10).is_empty());
    }
}
