//! Keeper: the scheduled caller of `check_maintenance` / `perform_maintenance`.
//!
//! The registry holds no scan state. The keeper persists the cursor returned
//! by each check and feeds it into the next one, so over successive ticks
//! the scan window slides across the whole collection and wraps to 0 at the
//! end.
//!
//! ```text
//! tick: check_upkeep(cursor, scan_count) ─▶ cursor = next_cursor
//!         └─ closure_needed ─▶ perform_upkeep(candidate_ids)
//! ```

use async_trait::async_trait;
use std::convert::Infallible;
use std::time::Duration;

use crate::policy::{env_or, ConfigError};
use crate::predicate::ClosurePredicate;
use crate::registry::SharedRegistry;
use crate::store::ElementStore;
use crate::types::{ElementId, MaintenanceReport, UpkeepCheck};

/// Default delay between keeper ticks.
pub const DEFAULT_KEEPER_INTERVAL: Duration = Duration::from_secs(1);
/// Default `count` passed to each check.
pub const DEFAULT_SCAN_COUNT: usize = 100;

/// The two maintenance entry points a keeper drives.
#[async_trait]
pub trait Upkeep: Send + Sync {
    /// Error type for upkeep calls.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Scan one window for closable elements.
    async fn check_upkeep(&self, cursor: usize, count: usize) -> Result<UpkeepCheck, Self::Error>;

    /// Close and replenish.
    async fn perform_upkeep(&self, ids: &[ElementId]) -> Result<MaintenanceReport, Self::Error>;
}

#[async_trait]
impl<P, S> Upkeep for SharedRegistry<P, S>
where
    P: ClosurePredicate + ?Sized + 'static,
    S: ElementStore + 'static,
{
    type Error = Infallible;

    async fn check_upkeep(&self, cursor: usize, count: usize) -> Result<UpkeepCheck, Self::Error> {
        Ok(self.check_maintenance(cursor, count))
    }

    async fn perform_upkeep(&self, ids: &[ElementId]) -> Result<MaintenanceReport, Self::Error> {
        Ok(self.perform_maintenance(ids))
    }
}

/// Keeper settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperConfig {
    /// Delay between ticks.
    pub interval: Duration,
    /// `count` passed to each check.
    pub scan_count: usize,
}

impl KeeperConfig {
    /// Load from `KEEPER_INTERVAL_MS` and `KEEPER_SCAN_COUNT`.
    ///
    /// Both are clamped to at least 1; a scan count of 0 would never move
    /// the cursor.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let interval_ms = env_or("KEEPER_INTERVAL_MS", defaults.interval.as_millis() as u64)?;
        let scan_count: usize = env_or("KEEPER_SCAN_COUNT", defaults.scan_count)?;
        Ok(Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            scan_count: scan_count.max(1),
        })
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_KEEPER_INTERVAL,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

/// Outcome of one keeper tick.
#[derive(Debug, Clone)]
pub struct KeeperTick {
    /// Cursor the check started from.
    pub cursor: usize,
    /// Result of the check.
    pub check: UpkeepCheck,
    /// Maintenance result, when the check asked for it.
    pub report: Option<MaintenanceReport>,
}

/// Drives check/perform cycles against an [`Upkeep`] target.
pub struct Keeper<U> {
    upkeep: U,
    config: KeeperConfig,
    cursor: usize,
}

impl<U: Upkeep> Keeper<U> {
    /// Create a keeper starting at cursor 0.
    pub fn new(upkeep: U, config: KeeperConfig) -> Self {
        Self {
            upkeep,
            config,
            cursor: 0,
        }
    }

    /// Cursor the next tick will start from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get the upkeep target.
    pub fn upkeep(&self) -> &U {
        &self.upkeep
    }

    /// Run one check, and perform maintenance if the check asks for it.
    pub async fn tick(&mut self) -> Result<KeeperTick, U::Error> {
        let cursor = self.cursor;
        let check = self.upkeep.check_upkeep(cursor, self.config.scan_count).await?;
        self.cursor = check.next_cursor;

        let report = if check.closure_needed {
            Some(self.upkeep.perform_upkeep(&check.candidate_ids).await?)
        } else {
            None
        };

        tracing::debug!(
            cursor,
            next_cursor = self.cursor,
            candidates = check.candidate_ids.len(),
            closed = report.as_ref().map(|r| r.closed.len()).unwrap_or(0),
            "keeper tick"
        );

        Ok(KeeperTick { cursor, check, report })
    }

    /// Tick on a fixed interval until `shutdown` resolves.
    ///
    /// Tick failures are logged and the loop continues.
    #[cfg(feature = "keeper")]
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: std::future::Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            scan_count = self.config.scan_count,
            "keeper started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::warn!(error = %e, cursor = self.cursor, "keeper tick failed");
                    }
                }
            }
        }

        tracing::info!(cursor = self.cursor, "keeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RegistryConfig;
    use crate::predicate::{ClosableSet, Never};
    use crate::registry::ElementRegistry;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Upkeep target that records performs and returns canned checks.
    struct RecordingUpkeep {
        check: UpkeepCheck,
        performed: Mutex<Vec<Vec<ElementId>>>,
    }

    #[async_trait]
    impl Upkeep for RecordingUpkeep {
        type Error = Infallible;

        async fn check_upkeep(&self, _cursor: usize, _count: usize) -> Result<UpkeepCheck, Self::Error> {
            Ok(self.check.clone())
        }

        async fn perform_upkeep(&self, ids: &[ElementId]) -> Result<MaintenanceReport, Self::Error> {
            self.performed.lock().push(ids.to_vec());
            let registry = ElementRegistry::new(RegistryConfig::default(), Never).unwrap();
            Ok(SharedRegistry::new(registry).perform_maintenance(ids))
        }
    }

    fn shared(closable: &[u64]) -> SharedRegistry<ClosableSet> {
        let predicate = Arc::new(ClosableSet::from_ids(closable.iter().copied().map(ElementId::new)));
        ElementRegistry::with_shared_predicate(RegistryConfig::default(), predicate)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_tick_skips_perform_when_nothing_closable() {
        let upkeep = RecordingUpkeep {
            check: UpkeepCheck::new(Vec::new(), 10),
            performed: Mutex::new(Vec::new()),
        };
        let mut keeper = Keeper::new(upkeep, KeeperConfig::default());

        let tick = keeper.tick().await.unwrap();
        assert!(tick.report.is_none());
        assert_eq!(keeper.cursor(), 10);
        assert!(keeper.upkeep().performed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_tick_performs_with_candidates() {
        let upkeep = RecordingUpkeep {
            check: UpkeepCheck::new(vec![ElementId::new(1), ElementId::new(2)], 0),
            performed: Mutex::new(Vec::new()),
        };
        let mut keeper = Keeper::new(upkeep, KeeperConfig::default());

        keeper.tick().await.unwrap();
        assert_eq!(
            keeper.upkeep().performed.lock().as_slice(),
            &[vec![ElementId::new(1), ElementId::new(2)]]
        );
    }

    #[tokio::test]
    async fn test_keeper_sweeps_whole_registry() {
        let registry = shared(&[5, 25, 55, 95]);
        let mut keeper = Keeper::new(registry.clone(), KeeperConfig { scan_count: 100, ..KeeperConfig::default() });

        let mut closed = Vec::new();
        for _ in 0..10 {
            let tick = keeper.tick().await.unwrap();
            if let Some(report) = tick.report {
                closed.extend(report.closed);
            }
        }

        let expected: Vec<_> = [5, 25, 55, 95].into_iter().map(ElementId::new).collect();
        assert_eq!(closed, expected);
        assert_eq!(registry.get_all_elements_length(), 100);
    }

    #[tokio::test]
    async fn test_keeper_config_from_env_clamps_zero() {
        std::env::set_var("KEEPER_SCAN_COUNT", "0");
        std::env::set_var("KEEPER_INTERVAL_MS", "0");
        let config = KeeperConfig::from_env();
        std::env::remove_var("KEEPER_SCAN_COUNT");
        std::env::remove_var("KEEPER_INTERVAL_MS");

        let config = config.unwrap();
        assert_eq!(config.scan_count, 1);
        assert_eq!(config.interval, Duration::from_millis(1));

        let mut keeper = Keeper::new(shared(&[]), config);
        keeper.tick().await.unwrap();
        keeper.tick().await.unwrap();
        assert_eq!(keeper.cursor(), 2);
    }

    #[test]
    fn test_keeper_config_defaults() {
        let config = KeeperConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.scan_count, 100);
    }

    #[cfg(feature = "keeper")]
    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let registry = shared(&[1]);
        let config = KeeperConfig {
            interval: Duration::from_millis(5),
            scan_count: 10,
        };
        let mut keeper = Keeper::new(registry.clone(), config);

        keeper.run(tokio::time::sleep(Duration::from_millis(50))).await;

        assert!(registry.get_element(ElementId::new(1)).is_err());
        assert_eq!(registry.get_all_elements_length(), 100);
    }
}
