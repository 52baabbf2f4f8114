//! Bounded closure scanner.
//!
//! The scanner walks one window of the collection and reports which
//! elements the predicate currently considers closable. A window never
//! spans more than `batch_limit` elements, whatever `count` the caller
//! asks for, so one check costs at most `batch_limit` predicate calls and
//! never reports more than `batch_limit` candidates.
//!
//! ## Cursor rules
//!
//! ```text
//! cursor >= len                        → ([], 0)
//! examined = [cursor, cursor + min(count, batch_limit)) ∩ [0, len)
//! next     = examined.end if < len, else 0
//! ```

use crate::pagination::{next_cursor, window};
use crate::predicate::ClosurePredicate;
use crate::store::ElementStore;
use crate::types::UpkeepCheck;

/// Closure candidate scanner.
#[derive(Debug, Clone, Copy)]
pub struct ClosureScanner {
    batch_limit: usize,
}

impl ClosureScanner {
    /// Create a scanner examining at most `batch_limit` elements per call.
    pub fn new(batch_limit: usize) -> Self {
        Self { batch_limit }
    }

    /// Max elements examined per call.
    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Scan the window starting at `cursor` for closable elements.
    pub fn scan<S, P>(&self, store: &S, predicate: &P, cursor: usize, count: usize) -> UpkeepCheck
    where
        S: ElementStore + ?Sized,
        P: ClosurePredicate + ?Sized,
    {
        let len = store.len();
        let budget = count.min(self.batch_limit);

        let Some(range) = window(len, cursor, budget) else {
            tracing::debug!(cursor, count, len, "scan cursor out of range");
            return UpkeepCheck::empty();
        };

        let candidate_ids: Vec<_> = store
            .window(range.clone())
            .iter()
            .filter(|record| predicate.is_closable(record))
            .map(|record| record.id)
            .collect();

        let check = UpkeepCheck::new(candidate_ids, next_cursor(&range, len));

        tracing::debug!(
            cursor,
            count,
            examined = range.len(),
            candidates = check.candidate_ids.len(),
            next_cursor = check.next_cursor,
            "closure scan"
        );

        check
    }
}
