//! Cursor-paginated results.

use serde::{Deserialize, Serialize};

use super::element::{Element, ElementId};

/// One page of elements and the cursor to resume from.
///
/// `next_cursor == 0` means the end of the collection was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Elements in collection order.
    pub elements: Vec<Element>,
    /// Cursor for the next call.
    pub next_cursor: usize,
}

impl Page {
    /// An empty page that resets the cursor.
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
            next_cursor: 0,
        }
    }

    /// Number of elements in the page.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Result of a maintenance check over one scan window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepCheck {
    /// Closable ids found in the window, in collection order.
    pub candidate_ids: Vec<ElementId>,
    /// Cursor for the next check.
    pub next_cursor: usize,
    /// Whether `perform_maintenance` has anything to close.
    pub closure_needed: bool,
}

impl UpkeepCheck {
    /// Build a check result; `closure_needed` is derived from the ids.
    pub fn new(candidate_ids: Vec<ElementId>, next_cursor: usize) -> Self {
        let closure_needed = !candidate_ids.is_empty();
        Self {
            candidate_ids,
            next_cursor,
            closure_needed,
        }
    }

    /// A check over an empty or exhausted window.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}
