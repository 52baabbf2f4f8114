//! Replenishment sizing after a closure batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::config::RegistryConfig;

/// How many elements to open after a closure batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplenishPolicy {
    /// Open back up to `target_size` whenever the store is below it.
    #[default]
    RestoreTarget,
    /// Open only what is needed to get back within tolerance.
    Tolerance,
}

impl fmt::Display for ReplenishPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestoreTarget => write!(f, "restore_target"),
            Self::Tolerance => write!(f, "tolerance"),
        }
    }
}

impl FromStr for ReplenishPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restore_target" | "restore-target" | "target" => Ok(Self::RestoreTarget),
            "tolerance" => Ok(Self::Tolerance),
            other => Err(format!("unknown replenish policy: {}", other)),
        }
    }
}

/// Compute how many elements to open for a store of `len` elements.
///
/// Formula:
/// ```text
/// floor   = target - range/2      (saturating)
/// ceiling = target + range/2
/// RestoreTarget: open = max(0, target - len)
/// Tolerance:     open = max(0, floor - len)
/// open = min(open, ceiling - len)  (0 if len >= ceiling)
/// ```
///
/// Either policy leaves `|len + open - target| <= range/2` for any
/// `len <= ceiling`.
pub fn replenish_count(len: usize, config: &RegistryConfig) -> usize {
    let half = config.half_range();
    let ceiling = config.max_len();

    let wanted = match config.replenish {
        ReplenishPolicy::RestoreTarget => config.target_size.saturating_sub(len),
        ReplenishPolicy::Tolerance => config.target_size.saturating_sub(half).saturating_sub(len),
    };

    wanted.min(ceiling.saturating_sub(len))
}
