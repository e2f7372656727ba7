//! Visit targets across four time granularities and their derivation.
//!
//! Exactly one target is authoritative input: the first non-zero field in
//! priority order monthly > total > daily > hourly. The other three are
//! recomputed from it whenever the schedule recalculates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrafficError};

/// Time granularity of a visit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Hourly,
    Daily,
    Monthly,
    Total,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Hourly => "hourly",
            Period::Daily => "daily",
            Period::Monthly => "monthly",
            Period::Total => "total",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Period {
    type Err = TrafficError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hourly" => Ok(Period::Hourly),
            "daily" => Ok(Period::Daily),
            "monthly" => Ok(Period::Monthly),
            "total" => Ok(Period::Total),
            other => Err(TrafficError::Config(format!("unknown period: {}", other))),
        }
    }
}

/// Target visit counts per granularity. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitTargets {
    pub hourly: u64,
    pub daily: u64,
    pub monthly: u64,
    pub total: u64,
}

impl VisitTargets {
    pub fn set(&mut self, period: Period, value: u64) {
        match period {
            Period::Hourly => self.hourly = value,
            Period::Daily => self.daily = value,
            Period::Monthly => self.monthly = value,
            Period::Total => self.total = value,
        }
    }

    pub fn get(&self, period: Period) -> u64 {
        match period {
            Period::Hourly => self.hourly,
            Period::Daily => self.daily,
            Period::Monthly => self.monthly,
            Period::Total => self.total,
        }
    }

    /// True when no target is set; the gate then decides on the time window
    /// alone.
    pub fn is_unset(&self) -> bool {
        self.hourly == 0 && self.daily == 0 && self.monthly == 0 && self.total == 0
    }

    /// The field treated as authoritative input, in priority order
    /// monthly > total > daily > hourly.
    pub fn authoritative(&self) -> Option<Period> {
        if self.monthly > 0 {
            Some(Period::Monthly)
        } else if self.total > 0 {
            Some(Period::Total)
        } else if self.daily > 0 {
            Some(Period::Daily)
        } else if self.hourly > 0 {
            Some(Period::Hourly)
        } else {
            None
        }
    }

    /// Derive the three non-authoritative targets from the authoritative one.
    ///
    /// `total_days` counts calendar days in the window inclusive,
    /// `active_days` those with an active weekday, `active_hours` the active
    /// hours per day. Float math with ceiling rounding; the resulting sums may
    /// slightly exceed the nominal input, which is accepted slack.
    pub fn derive(&self, total_days: u64, active_days: u64, active_hours: u64) -> Result<Self> {
        if self.is_unset() {
            return Ok(*self);
        }
        if active_days == 0 {
            return Err(TrafficError::Config(
                "campaign window contains no active days".to_string(),
            ));
        }
        if active_hours == 0 {
            return Err(TrafficError::Config("no active hours configured".to_string()));
        }

        let total_buckets = active_days * active_hours;
        let mut out = *self;

        if self.monthly > 0 {
            let per_day = self.monthly as f64 / active_days as f64;
            let per_hour = per_day / active_hours as f64;
            out.daily = per_day.ceil() as u64;
            out.hourly = per_hour.ceil() as u64;
            out.total = self.monthly;
        } else if self.total > 0 {
            let months = total_days as f64 / 30.0;
            let months = if months == 0.0 { 1.0 } else { months };
            let per_day = self.total as f64 / active_days as f64;
            out.monthly = (self.total as f64 / months).ceil() as u64;
            out.daily = per_day.ceil() as u64;
            out.hourly = (per_day / active_hours as f64).ceil() as u64;
        } else if self.daily > 0 {
            out.hourly = (self.daily as f64 / active_hours as f64).ceil() as u64;
            out.monthly =
                (self.daily as f64 * (active_days as f64 / total_days as f64) * 30.0).ceil() as u64;
            out.total = self.daily * active_days;
        } else {
            let per_day = self.hourly * active_hours;
            out.daily = per_day;
            out.monthly =
                (per_day as f64 * (active_days as f64 / total_days as f64) * 30.0).ceil() as u64;
            out.total = self.hourly * total_buckets;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_round_trip() {
        for p in [Period::Hourly, Period::Daily, Period::Monthly, Period::Total] {
            assert_eq!(p.to_string().parse::<Period>().unwrap(), p);
        }
        assert!("weekly".parse::<Period>().is_err());
    }

    #[test]
    fn test_unset_targets_stay_unset() {
        let t = VisitTargets::default();
        assert!(t.is_unset());
        assert_eq!(t.authoritative(), None);
        assert_eq!(t.derive(30, 30, 24).unwrap(), t);
    }

    #[test]
    fn test_monthly_is_authoritative_over_all() {
        let t = VisitTargets { hourly: 1, daily: 2, monthly: 300, total: 4 };
        assert_eq!(t.authoritative(), Some(Period::Monthly));

        let d = t.derive(30, 30, 10).unwrap();
        assert_eq!(d.daily, 10); // ceil(300 / 30)
        assert_eq!(d.hourly, 1); // ceil(10 / 10)
        assert_eq!(d.total, 300);
        assert_eq!(d.monthly, 300);
    }

    #[test]
    fn test_total_derivation() {
        let t = VisitTargets { total: 600, ..Default::default() };
        let d = t.derive(30, 20, 10).unwrap();
        assert_eq!(d.monthly, 600); // 600 / (30/30)
        assert_eq!(d.daily, 30); // ceil(600 / 20)
        assert_eq!(d.hourly, 3); // ceil(30 / 10)
    }

    #[test]
    fn test_daily_derivation() {
        let t = VisitTargets { daily: 10, ..Default::default() };
        let d = t.derive(7, 1, 1).unwrap();
        assert_eq!(d.hourly, 10);
        assert_eq!(d.total, 10); // one active day
        assert_eq!(d.monthly, 43); // ceil(10 * (1/7) * 30)
    }

    #[test]
    fn test_hourly_derivation() {
        let t = VisitTargets { hourly: 5, ..Default::default() };
        let d = t.derive(7, 7, 3).unwrap();
        assert_eq!(d.daily, 15);
        assert_eq!(d.total, 5 * 21);
        assert_eq!(d.monthly, 450); // 15 * 1.0 * 30
    }

    #[test]
    fn test_daily_consistency_from_monthly() {
        // daily == ceil(monthly / active_days) for any monthly input
        for monthly in [1, 7, 100, 999] {
            let t = VisitTargets { monthly, ..Default::default() };
            let d = t.derive(30, 22, 8).unwrap();
            assert_eq!(d.daily, (monthly as f64 / 22.0).ceil() as u64);
        }
    }

    #[test]
    fn test_zero_active_days_is_config_error() {
        let t = VisitTargets { daily: 10, ..Default::default() };
        assert!(matches!(t.derive(7, 0, 10), Err(TrafficError::Config(_))));
    }

    #[test]
    fn test_zero_active_hours_is_config_error() {
        let t = VisitTargets { daily: 10, ..Default::default() };
        assert!(matches!(t.derive(7, 7, 0), Err(TrafficError::Config(_))));
    }

    #[test]
    fn test_campaign_shorter_than_a_day() {
        let t = VisitTargets { total: 50, ..Default::default() };
        let d = t.derive(1, 1, 24).unwrap();
        assert_eq!(d.daily, 50);
        assert_eq!(d.hourly, 3); // ceil(50 / 24)
        assert_eq!(d.monthly, 1500); // 50 / (1/30)
    }
}
