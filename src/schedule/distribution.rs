//! Hourly target table construction under the four distribution modes.
//!
//! The table maps every active (date, hour) bucket of the campaign window to
//! an integer visit quota. It is always rebuilt in full when any input
//! changes; it is never patched incrementally.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrafficError};
use crate::schedule::quota::VisitTargets;
use crate::schedule::window::CampaignWindow;

/// How a period's quota is allocated across hourly buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Every active bucket gets the same hourly target.
    #[default]
    Even,
    /// Each day's daily target is scattered uniformly across that day's
    /// active hours, one unit at a time.
    Random,
    /// Bucket weight decreases linearly from campaign start.
    Frontloaded,
    /// Bucket weight increases linearly from campaign start.
    Backloaded,
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DistributionMode::Even => "even",
            DistributionMode::Random => "random",
            DistributionMode::Frontloaded => "frontloaded",
            DistributionMode::Backloaded => "backloaded",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DistributionMode {
    type Err = TrafficError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "even" => Ok(DistributionMode::Even),
            "random" => Ok(DistributionMode::Random),
            "frontloaded" => Ok(DistributionMode::Frontloaded),
            "backloaded" => Ok(DistributionMode::Backloaded),
            other => Err(TrafficError::Config(format!("invalid schedule mode: {}", other))),
        }
    }
}

/// One (calendar-date, hour) slot in the hourly target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourKey {
    pub date: NaiveDate,
    pub hour: u32,
}

impl HourKey {
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self { date: dt.date(), hour: dt.hour() }
    }
}

impl fmt::Display for HourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.date.format("%Y-%m-%d"), self.hour)
    }
}

/// Fully materialized per-bucket quotas for a campaign window.
pub type HourlyTargets = HashMap<HourKey, u64>;

/// Build the hourly target table for the given mode. The window must be
/// resolved and the targets derived before calling.
pub fn build_table<R: Rng>(
    mode: DistributionMode,
    window: &CampaignWindow,
    targets: &VisitTargets,
    rng: &mut R,
) -> Result<HourlyTargets> {
    let hours: Vec<u32> = window.active_hours().iter().copied().collect();
    if hours.is_empty() {
        return Err(TrafficError::Config("no active hours configured".to_string()));
    }
    let (start, _) = window
        .bounds()
        .ok_or_else(|| TrafficError::Config("campaign window is unresolved".to_string()))?;

    let mut table = HourlyTargets::new();

    match mode {
        DistributionMode::Even => {
            for day in window.days() {
                if window.day_active(day) {
                    for &hour in &hours {
                        table.insert(HourKey { date: day, hour }, targets.hourly);
                    }
                }
            }
        }
        DistributionMode::Random => {
            for day in window.days() {
                if !window.day_active(day) {
                    continue;
                }
                let mut allocation = vec![0u64; hours.len()];
                let mut remaining = targets.daily;
                while remaining > 0 {
                    let idx = rng.gen_range(0..allocation.len());
                    allocation[idx] += 1;
                    remaining -= 1;
                }
                for (i, &hour) in hours.iter().enumerate() {
                    table.insert(HourKey { date: day, hour }, allocation[i]);
                }
            }
        }
        DistributionMode::Frontloaded | DistributionMode::Backloaded => {
            let total_buckets = window.total_active_buckets();
            let start_date = start.date();

            let mut weights: Vec<(HourKey, u64)> = Vec::new();
            for day in window.days() {
                if !window.day_active(day) {
                    continue;
                }
                let day_offset = (day - start_date).num_days() as u64;
                for &hour in &hours {
                    let hour_idx = day_offset * 24 + hour as u64;
                    let weight = match mode {
                        DistributionMode::Frontloaded => total_buckets.saturating_sub(hour_idx).max(1),
                        _ => hour_idx + 1,
                    };
                    weights.push((HourKey { date: day, hour }, weight));
                }
            }

            let total_weight: u64 = weights.iter().map(|(_, w)| w).sum();
            if total_weight == 0 {
                return Err(TrafficError::Config("distribution weights sum to zero".to_string()));
            }
            for (key, weight) in weights {
                let share = (weight as f64 / total_weight as f64) * targets.total as f64;
                table.insert(key, share.ceil() as u64);
            }
        }
    }

    Ok(table)
}
