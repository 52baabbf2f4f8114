//! Cursor pagination over an element store.
//!
//! A cursor is a slot offset. Out-of-range cursors are not errors: they
//! produce an empty page and reset the cursor to 0, so a caller resuming
//! with a stale cursor simply starts over.

use std::ops::Range;

use crate::predicate::ClosurePredicate;
use crate::store::ElementStore;
use crate::types::{Element, Page};

/// Compute the slot range for a `(cursor, count)` request.
///
/// Returns `None` when `cursor >= len`. Otherwise the range is
/// `cursor .. min(cursor + count, len)`.
pub fn window(len: usize, cursor: usize, count: usize) -> Option<Range<usize>> {
    if cursor >= len {
        return None;
    }
    Some(cursor..cursor.saturating_add(count).min(len))
}

/// Cursor to resume from after consuming `range` of a `len`-slot collection.
///
/// 0 once the end has been reached.
pub fn next_cursor(range: &Range<usize>, len: usize) -> usize {
    if range.end < len {
        range.end
    } else {
        0
    }
}

/// Read one page of elements.
pub fn page<S, P>(store: &S, predicate: &P, cursor: usize, count: usize) -> Page
where
    S: ElementStore + ?Sized,
    P: ClosurePredicate + ?Sized,
{
    let len = store.len();
    let Some(range) = window(len, cursor, count) else {
        tracing::debug!(cursor, count, len, "page cursor out of range");
        return Page::empty();
    };

    let elements = store
        .window(range.clone())
        .iter()
        .map(|record| Element::from_record(record, predicate.is_closable(record)))
        .collect();

    Page {
        elements,
        next_cursor: next_cursor(&range, len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Never;
    use crate::store::InMemoryElementStore;

    #[test]
    fn test_window() {
        assert_eq!(window(100, 1, 5), Some(1..6));
        assert_eq!(window(100, 98, 5), Some(98..100));
        assert_eq!(window(100, 100, 5), None);
        assert_eq!(window(0, 0, 5), None);
        assert_eq!(window(10, 3, usize::MAX), Some(3..10));
    }

    #[test]
    fn test_page_within_bounds() {
        let store = InMemoryElementStore::seeded(100);
        let page = page(&store, &Never, 1, 5);
        assert_eq!(page.len(), 5);
        assert_eq!(page.next_cursor, 6);
        assert_eq!(page.elements[0].id.get(), 1);
    }

    #[test]
    fn test_page_clipped_at_end() {
        let store = InMemoryElementStore::seeded(100);
        let page = page(&store, &Never, 98, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page.next_cursor, 0);
    }

    #[test]
    fn test_page_exact_end() {
        let store = InMemoryElementStore::seeded(10);
        let page = page(&store, &Never, 5, 5);
        assert_eq!(page.len(), 5);
        assert_eq!(page.next_cursor, 0);
    }

    #[test]
    fn test_page_cursor_out_of_range() {
        let store = InMemoryElementStore::seeded(100);
        assert_eq!(page(&store, &Never, 200, 5), Page::empty());
    }

    #[test]
    fn test_page_zero_count() {
        let store = InMemoryElementStore::seeded(10);
        let page = page(&store, &Never, 4, 0);
        assert!(page.is_empty());
        assert_eq!(page.next_cursor, 4);
    }

    #[test]
    fn test_page_empty_store() {
        let store = InMemoryElementStore::new();
        assert_eq!(page(&store, &Never, 0, 5), Page::empty());
    }
}
