//! Closure predicates.
//!
//! The registry never decides why an element is closable. It asks a
//! [`ClosurePredicate`] each time an element is read, scanned or submitted
//! for closure, so the answer always reflects the oracle's current state.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::policy::ConfigError;
use crate::types::{ElementId, ElementRecord};

/// External oracle deciding whether an element may be closed.
pub trait ClosurePredicate: Send + Sync {
    /// Whether `element` is currently closable.
    fn is_closable(&self, element: &ElementRecord) -> bool;
}

impl<F> ClosurePredicate for F
where
    F: Fn(&ElementRecord) -> bool + Send + Sync,
{
    fn is_closable(&self, element: &ElementRecord) -> bool {
        self(element)
    }
}

/// Predicate that never reports an element closable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl ClosurePredicate for Never {
    fn is_closable(&self, _element: &ElementRecord) -> bool {
        false
    }
}

/// Predicate that reports every element closable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl ClosurePredicate for Always {
    fn is_closable(&self, _element: &ElementRecord) -> bool {
        true
    }
}

/// Deterministic pseudo-random oracle.
///
/// An element is closable when the first byte of
/// `SHA-256(seed || id || generation)` falls below a threshold derived from
/// `probability`. Bumping the generation with [`HashPredicate::advance`]
/// re-rolls every element, which stands in for an external price or time
/// feed moving on.
#[derive(Debug)]
pub struct HashPredicate {
    seed: u64,
    /// Closable when `digest[0] < threshold`; 256 means always.
    threshold: u16,
    generation: AtomicU64,
}

impl HashPredicate {
    /// Create an oracle closing roughly `probability` of all elements.
    pub fn new(seed: u64, probability: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidProbability(probability));
        }
        Ok(Self {
            seed,
            threshold: (probability * 256.0).round() as u16,
            generation: AtomicU64::new(0),
        })
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Move to the next generation and return it.
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn roll(&self, id: ElementId) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(id.get().to_le_bytes());
        hasher.update(self.generation().to_le_bytes());
        hasher.finalize()[0]
    }
}

impl ClosurePredicate for HashPredicate {
    fn is_closable(&self, element: &ElementRecord) -> bool {
        u16::from(self.roll(element.id)) < self.threshold
    }
}

/// Explicit set of closable ids.
#[derive(Debug, Default)]
pub struct ClosableSet {
    ids: RwLock<BTreeSet<ElementId>>,
}

impl ClosableSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from ids.
    pub fn from_ids(ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            ids: RwLock::new(ids.into_iter().collect()),
        }
    }

    /// Mark an id closable. Returns false if it already was.
    pub fn insert(&self, id: ElementId) -> bool {
        self.ids.write().insert(id)
    }

    /// Mark an id not closable. Returns false if it was not closable.
    pub fn remove(&self, id: ElementId) -> bool {
        self.ids.write().remove(&id)
    }

    /// Check membership.
    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.read().contains(&id)
    }

    /// Mark every id not closable.
    pub fn clear(&self) {
        self.ids.write().clear();
    }

    /// Number of ids marked closable.
    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    /// Check if no id is marked closable.
    pub fn is_empty(&self) -> bool {
        self.ids.read().is_empty()
    }
}

impl ClosurePredicate for ClosableSet {
    fn is_closable(&self, element: &ElementRecord) -> bool {
        self.contains(element.id)
    }
}
