//! Campaign window: date range plus active-hours/active-days calendar filters.
//!
//! The window's bounds are optional in configuration and resolved exactly once
//! at schedule-calculation time: a missing end becomes the last instant of the
//! current month, a missing start becomes "now".

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Result, TrafficError};

/// Campaign date range and calendar filters. Days use Monday = 0.
#[derive(Debug, Clone)]
pub struct CampaignWindow {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    active_hours: BTreeSet<u32>,
    active_days: BTreeSet<u32>,
}

impl Default for CampaignWindow {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            active_hours: (0..24).collect(),
            active_days: (0..7).collect(),
        }
    }
}

impl CampaignWindow {
    pub fn active_hours(&self) -> &BTreeSet<u32> {
        &self.active_hours
    }

    pub fn active_days(&self) -> &BTreeSet<u32> {
        &self.active_days
    }

    /// Set the campaign date range. Either bound may be left unset to be
    /// resolved later.
    pub fn set_time_range(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<()> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(TrafficError::Config(format!(
                    "campaign end {} precedes start {}",
                    e, s
                )));
            }
        }
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Set the hours of day (0-23) during which traffic may be generated.
    pub fn set_active_hours(&mut self, hours: &[u32]) -> Result<()> {
        if hours.is_empty() {
            return Err(TrafficError::Config("active_hours must not be empty".to_string()));
        }
        if let Some(h) = hours.iter().find(|&&h| h > 23) {
            return Err(TrafficError::Config(format!("invalid hour of day: {}", h)));
        }
        self.active_hours = hours.iter().copied().collect();
        Ok(())
    }

    /// Set the days of week (0-6, Monday = 0) during which traffic may be
    /// generated.
    pub fn set_active_days(&mut self, days: &[u32]) -> Result<()> {
        if days.is_empty() {
            return Err(TrafficError::Config("active_days must not be empty".to_string()));
        }
        if let Some(d) = days.iter().find(|&&d| d > 6) {
            return Err(TrafficError::Config(format!("invalid day of week: {}", d)));
        }
        self.active_days = days.iter().copied().collect();
        Ok(())
    }

    /// Fill in missing bounds from `now` and validate the range. Called once
    /// per schedule calculation; bounds are never re-derived per gate check.
    pub fn resolve(&mut self, now: NaiveDateTime) -> Result<()> {
        if self.end.is_none() {
            self.end = Some(month_end(now));
        }
        if self.start.is_none() {
            self.start = Some(now);
        }
        if let (Some(s), Some(e)) = (self.start, self.end) {
            if s > e {
                return Err(TrafficError::Config(format!(
                    "campaign end {} precedes start {}",
                    e, s
                )));
            }
        }
        Ok(())
    }

    /// Resolved [start, end] bounds, if resolution has happened.
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.start.zip(self.end)
    }

    /// Whether `now` falls inside the resolved date range. An unresolved
    /// window places no date constraint.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        match self.bounds() {
            Some((s, e)) => now >= s && now <= e,
            None => true,
        }
    }

    /// Whether `now`'s hour and weekday are both in the active sets.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.active_hours.contains(&now.hour())
            && self.active_days.contains(&now.weekday().num_days_from_monday())
    }

    /// Whether the given calendar day is an active weekday.
    pub fn day_active(&self, day: NaiveDate) -> bool {
        self.active_days.contains(&day.weekday().num_days_from_monday())
    }

    /// Every calendar day in the resolved window, inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        match self.bounds() {
            Some((s, e)) => {
                let first = s.date();
                let n = (e.date() - first).num_days();
                (0..=n).map(|i| first + Duration::days(i)).collect()
            }
            None => Vec::new(),
        }
    }

    /// Total calendar days in the window, inclusive of both endpoints.
    pub fn total_days(&self) -> u64 {
        self.days().len() as u64
    }

    /// Days in the window whose weekday is active.
    pub fn active_day_count(&self) -> u64 {
        self.days().iter().filter(|d| self.day_active(**d)).count() as u64
    }

    pub fn active_hour_count(&self) -> u64 {
        self.active_hours.len() as u64
    }

    /// Count of (day, hour) buckets the campaign can actually use.
    pub fn total_active_buckets(&self) -> u64 {
        self.active_day_count() * self.active_hour_count()
    }
}

/// Last instant (23:59:59) of the month containing `now`.
fn month_end(now: NaiveDateTime) -> NaiveDateTime {
    let (y, m) = (now.year(), now.month());
    let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(ny, nm, 1).unwrap_or_else(|| now.date());
    let last_day = first_of_next.pred_opt().unwrap_or_else(|| now.date());
    last_day.and_hms_opt(23, 59, 59).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_default_window_is_fully_open() {
        let w = CampaignWindow::default();
        assert_eq!(w.active_hours().len(), 24);
        assert_eq!(w.active_days().len(), 7);
        assert!(w.bounds().is_none());
        assert!(w.contains(at(2026, 8, 24, 12)));
    }

    #[test]
    fn test_set_time_range_rejects_inverted_bounds() {
        let mut w = CampaignWindow::default();
        let err = w.set_time_range(Some(at(2026, 8, 20, 0)), Some(at(2026, 8, 10, 0)));
        assert!(matches!(err, Err(TrafficError::Config(_))));
    }

    #[test]
    fn test_set_active_hours_validation() {
        let mut w = CampaignWindow::default();
        assert!(w.set_active_hours(&[]).is_err());
        assert!(w.set_active_hours(&[24]).is_err());
        assert!(w.set_active_hours(&[9, 10, 11]).is_ok());
        assert_eq!(w.active_hour_count(), 3);
    }

    #[test]
    fn test_set_active_days_validation() {
        let mut w = CampaignWindow::default();
        assert!(w.set_active_days(&[]).is_err());
        assert!(w.set_active_days(&[7]).is_err());
        assert!(w.set_active_days(&[0, 4]).is_ok());
    }

    #[test]
    fn test_resolve_defaults_end_to_month_end() {
        let mut w = CampaignWindow::default();
        w.resolve(at(2026, 8, 24, 10)).unwrap();
        let (s, e) = w.bounds().unwrap();
        assert_eq!(s, at(2026, 8, 24, 10));
        assert_eq!(e.date(), NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
        assert_eq!(e.hour(), 23);
    }

    #[test]
    fn test_resolve_handles_december() {
        let mut w = CampaignWindow::default();
        w.resolve(at(2026, 12, 5, 0)).unwrap();
        let (_, e) = w.bounds().unwrap();
        assert_eq!(e.date(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_active_day_count() {
        let mut w = CampaignWindow::default();
        // 2026-08-24 is a Monday; one full week.
        w.set_time_range(Some(at(2026, 8, 24, 0)), Some(at(2026, 8, 30, 23))).unwrap();
        w.set_active_days(&[0]).unwrap();
        assert_eq!(w.total_days(), 7);
        assert_eq!(w.active_day_count(), 1);
    }

    #[test]
    fn test_is_active_at() {
        let mut w = CampaignWindow::default();
        w.set_active_hours(&[9]).unwrap();
        w.set_active_days(&[0]).unwrap();
        // Monday 09:00 passes, Monday 10:00 and Tuesday 09:00 do not.
        assert!(w.is_active_at(at(2026, 8, 24, 9)));
        assert!(!w.is_active_at(at(2026, 8, 24, 10)));
        assert!(!w.is_active_at(at(2026, 8, 25, 9)));
    }

    #[test]
    fn test_total_active_buckets() {
        let mut w = CampaignWindow::default();
        w.set_time_range(Some(at(2026, 8, 24, 0)), Some(at(2026, 8, 30, 23))).unwrap();
        w.set_active_days(&[0, 1]).unwrap();
        w.set_active_hours(&[9, 10, 11]).unwrap();
        assert_eq!(w.total_active_buckets(), 6);
    }
}
