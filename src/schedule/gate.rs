//! The schedule gate: decides whether a visit may start right now.
//!
//! `TrafficSchedule` owns the quota targets, campaign window, distribution
//! mode, the materialized hourly target table, and the live counters with
//! their boundary markers. Setters validate and recalculate atomically: a
//! failed setter leaves the previous valid configuration in effect.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::error::Result;
use crate::schedule::distribution::{self, DistributionMode, HourKey, HourlyTargets};
use crate::schedule::quota::{Period, VisitTargets};
use crate::schedule::window::CampaignWindow;

/// Live visit counters, monotonic within their window.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VisitCounters {
    pub hourly: u64,
    pub daily: u64,
    pub monthly: u64,
    pub total: u64,
}

/// Percentage progress toward each target, capped at 100.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProgressStats {
    pub hourly: u8,
    pub daily: u8,
    pub monthly: u8,
    pub total: u8,
}

/// Read-only projection of the schedule for the control plane.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStats {
    pub targets: VisitTargets,
    pub current: VisitCounters,
    pub progress: ProgressStats,
    /// Target for the bucket `now` falls into, 0 when absent.
    pub hourly_target: u64,
    pub schedule_mode: DistributionMode,
    pub active_hours: Vec<u32>,
    pub active_days: Vec<u32>,
}

/// Quota scheduler and gate. All time-dependent operations take `now`
/// explicitly; the engine passes wall-clock time.
#[derive(Debug, Default)]
pub struct TrafficSchedule {
    targets: VisitTargets,
    window: CampaignWindow,
    mode: DistributionMode,
    hourly_targets: HourlyTargets,

    counters: VisitCounters,
    last_hour: Option<u32>,
    last_day: Option<u32>,
    last_month: Option<u32>,
}

impl TrafficSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> &VisitTargets {
        &self.targets
    }

    pub fn mode(&self) -> DistributionMode {
        self.mode
    }

    pub fn window(&self) -> &CampaignWindow {
        &self.window
    }

    pub fn hourly_targets(&self) -> &HourlyTargets {
        &self.hourly_targets
    }

    /// Set one target and recalculate. Zero unsets the field.
    pub fn set_target(&mut self, period: Period, value: u64, now: NaiveDateTime) -> Result<()> {
        let mut targets = self.targets;
        targets.set(period, value);
        self.recalculate_with(targets, self.window.clone(), self.mode, now)?;
        tracing::info!(period = %period, value, "set visit target");
        Ok(())
    }

    /// Set the campaign date range and recalculate.
    pub fn set_time_range(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<()> {
        let mut window = self.window.clone();
        window.set_time_range(start, end)?;
        self.recalculate_with(self.targets, window, self.mode, now)?;
        tracing::info!(?start, ?end, "set campaign time range");
        Ok(())
    }

    /// Set active hours (0-23) and recalculate.
    pub fn set_active_hours(&mut self, hours: &[u32], now: NaiveDateTime) -> Result<()> {
        let mut window = self.window.clone();
        window.set_active_hours(hours)?;
        self.recalculate_with(self.targets, window, self.mode, now)?;
        tracing::info!(?hours, "set active hours");
        Ok(())
    }

    /// Set active days (0-6, Monday = 0) and recalculate.
    pub fn set_active_days(&mut self, days: &[u32], now: NaiveDateTime) -> Result<()> {
        let mut window = self.window.clone();
        window.set_active_days(days)?;
        self.recalculate_with(self.targets, window, self.mode, now)?;
        tracing::info!(?days, "set active days");
        Ok(())
    }

    /// Set the distribution mode and recalculate.
    pub fn set_mode(&mut self, mode: DistributionMode, now: NaiveDateTime) -> Result<()> {
        self.recalculate_with(self.targets, self.window.clone(), mode, now)?;
        tracing::info!(mode = %mode, "set schedule mode");
        Ok(())
    }

    /// Apply a full configuration in one pass (initial setup).
    pub fn apply(
        &mut self,
        targets: VisitTargets,
        window: CampaignWindow,
        mode: DistributionMode,
        now: NaiveDateTime,
    ) -> Result<()> {
        self.recalculate_with(targets, window, mode, now)
    }

    /// Recompute derived targets and the hourly table from the current
    /// configuration. Idempotent for deterministic modes.
    pub fn recalculate(&mut self, now: NaiveDateTime) -> Result<()> {
        self.recalculate_with(self.targets, self.window.clone(), self.mode, now)
    }

    fn recalculate_with(
        &mut self,
        targets: VisitTargets,
        mut window: CampaignWindow,
        mode: DistributionMode,
        now: NaiveDateTime,
    ) -> Result<()> {
        window.resolve(now)?;

        let derived = if targets.is_unset() {
            targets
        } else {
            targets.derive(
                window.total_days(),
                window.active_day_count(),
                window.active_hour_count(),
            )?
        };

        let table = if derived.is_unset() {
            HourlyTargets::new()
        } else {
            distribution::build_table(mode, &window, &derived, &mut rand::thread_rng())?
        };

        self.targets = derived;
        self.window = window;
        self.mode = mode;
        self.hourly_targets = table;

        tracing::debug!(
            hourly = self.targets.hourly,
            daily = self.targets.daily,
            monthly = self.targets.monthly,
            total = self.targets.total,
            buckets = self.hourly_targets.len(),
            "recalculated visit schedule"
        );
        Ok(())
    }

    /// Whether a new visit may start at `now`.
    ///
    /// Rollover bookkeeping runs first and unconditionally, so a quota check
    /// immediately after an hour/day/month boundary sees a fresh counter even
    /// when this call ends in rejection. A "no" is an ordinary decision, not
    /// an error.
    pub fn should_generate_traffic(&mut self, now: NaiveDateTime) -> bool {
        self.rollover(now);

        if !self.window.contains(now) {
            return false;
        }

        if !self.window.is_active_at(now) {
            return false;
        }

        // Missing bucket entry degrades to pure window/calendar gating.
        if let Some(&target) = self.hourly_targets.get(&HourKey::from_datetime(now)) {
            if self.counters.hourly >= target {
                return false;
            }
        }

        true
    }

    fn rollover(&mut self, now: NaiveDateTime) {
        let hour = now.hour();
        let day = now.day();
        let month = now.month();

        if self.last_hour != Some(hour) {
            self.counters.hourly = 0;
            self.last_hour = Some(hour);
        }
        if self.last_day != Some(day) {
            self.counters.daily = 0;
            self.last_day = Some(day);
        }
        if self.last_month != Some(month) {
            self.counters.monthly = 0;
            self.last_month = Some(month);
        }
    }

    /// Record one successfully completed visit or search. Failures and skips
    /// never reach this: quota tracks successful throughput only.
    pub fn record_visit(&mut self) {
        self.counters.hourly += 1;
        self.counters.daily += 1;
        self.counters.monthly += 1;
        self.counters.total += 1;
    }

    pub fn counters(&self) -> VisitCounters {
        self.counters
    }

    /// Read-only schedule snapshot for the control plane.
    pub fn stats(&self, now: NaiveDateTime) -> ScheduleStats {
        let progress = ProgressStats {
            hourly: percent(self.counters.hourly, self.targets.hourly),
            daily: percent(self.counters.daily, self.targets.daily),
            monthly: percent(self.counters.monthly, self.targets.monthly),
            total: percent(self.counters.total, self.targets.total),
        };

        ScheduleStats {
            targets: self.targets,
            current: self.counters,
            progress,
            hourly_target: self
                .hourly_targets
                .get(&HourKey::from_datetime(now))
                .copied()
                .unwrap_or(0),
            schedule_mode: self.mode,
            active_hours: self.window.active_hours().iter().copied().collect(),
            active_days: self.window.active_days().iter().copied().collect(),
        }
    }
}

fn percent(current: u64, target: u64) -> u8 {
    if target == 0 {
        return 0;
    }
    let pct = (current as f64 / target as f64 * 100.0).round() as u64;
    pct.min(100) as u8
}
