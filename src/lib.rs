//! # element-registry
//!
//! Bounded, self-replenishing element registry maintained by an external
//! keeper.
//!
//! The registry answers two questions for its keeper:
//!
//! > Which elements in this window can be closed right now?
//! > Close these, and bring the collection back toward its target size.
//!
//! ## Core Contract
//!
//! 1. Reads are cursor-paginated: `(cursor, count)` in, a page plus the cursor
//!    to continue from out, with 0 meaning "wrapped to the start"
//! 2. A maintenance check examines at most `batch_limit` elements and never
//!    mutates anything
//! 3. A maintenance perform closes at most `batch_limit` elements, re-checks
//!    each one, and replenishes in the same atomic step
//!
//! ## Architecture
//!
//! ```text
//! Keeper ─check─▶ ClosureScanner ─▶ UpkeepCheck{candidate_ids, next_cursor}
//!        ─perform▶ ClosureExecutor ─▶ close + replenish ─▶ MaintenanceReport
//!                        ↓
//!              ElementStore (in memory)  ◀── ClosurePredicate (read time)
//! ```
//!
//! ## Guarantees
//!
//! - Element ids are monotonic and never reused
//! - Closing never moves a surviving element while replenishment refills
//!   the closed slots, so a keeper sweep never steps over an element
//! - After a perform the length lies within `target_size ± range/2`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod predicate;
pub mod store;
pub mod pagination;
pub mod scanner;
pub mod executor;
pub mod metrics;
pub mod snapshot;
pub mod registry;
pub mod keeper;
pub mod canonical;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{CloseOutcome, Element, ElementId, ElementRecord, MaintenanceReport, Page, UpkeepCheck};
pub use policy::{replenish_count, ConfigError, RegistryConfig, ReplenishPolicy};
pub use predicate::{Always, ClosableSet, ClosurePredicate, HashPredicate, Never};
pub use store::{ElementStore, InMemoryElementStore};
pub use scanner::ClosureScanner;
pub use executor::ClosureExecutor;
pub use metrics::{MaintenanceMetrics, NoOpMetrics, TestMetrics};
pub use snapshot::RegistrySnapshot;
pub use registry::{ElementRegistry, RegistryError, SharedRegistry};
pub use keeper::{Keeper, KeeperConfig, KeeperTick, Upkeep};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes, try_canonical_bytes};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version for all registry types.
/// Increment on breaking changes to any schema type.
pub const REGISTRY_SCHEMA_VERSION: &str = "1.0.0";
