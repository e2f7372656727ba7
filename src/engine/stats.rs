//! Aggregate engine statistics, updated concurrently by workers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::behavior::{DeviceType, ReferrerClass};

/// Shared counters incremented lock-free from any worker; timestamps sit
/// behind a mutex.
#[derive(Debug, Default)]
pub struct EngineStats {
    visits: AtomicU64,
    successful_visits: AtomicU64,
    failed_visits: AtomicU64,
    failed_searches: AtomicU64,
    captchas_solved: AtomicU64,
    vpn_switches: AtomicU64,
    proxy_switches: AtomicU64,
    search_traffic: AtomicU64,
    social_traffic: AtomicU64,
    direct_traffic: AtomicU64,
    referral_traffic: AtomicU64,
    desktop_visits: AtomicU64,
    mobile_visits: AtomicU64,
    tablet_visits: AtomicU64,
    start_time: Mutex<Option<NaiveDateTime>>,
    last_visit: Mutex<Option<NaiveDateTime>>,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_started(&self, now: NaiveDateTime) {
        *self.start_time.lock().unwrap() = Some(now);
    }

    /// One visit attempt began; stamps `last_visit`.
    pub fn record_attempt(&self, now: NaiveDateTime) {
        self.visits.fetch_add(1, Ordering::Relaxed);
        *self.last_visit.lock().unwrap() = Some(now);
    }

    pub fn record_success(&self) {
        self.successful_visits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_visits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search_failure(&self) {
        self.failed_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_captcha_solved(&self) {
        self.captchas_solved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_vpn_switch(&self) {
        self.vpn_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_proxy_switch(&self) {
        self.proxy_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_device(&self, device: DeviceType) {
        let counter = match device {
            DeviceType::Desktop => &self.desktop_visits,
            DeviceType::Mobile => &self.mobile_visits,
            DeviceType::Tablet => &self.tablet_visits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_referrer(&self, class: ReferrerClass) {
        let counter = match class {
            ReferrerClass::Search => &self.search_traffic,
            ReferrerClass::Social => &self.social_traffic,
            ReferrerClass::Direct => &self.direct_traffic,
            ReferrerClass::Referral => &self.referral_traffic,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let fmt = |t: Option<NaiveDateTime>| t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        StatsSnapshot {
            visits: self.visits.load(Ordering::Relaxed),
            successful_visits: self.successful_visits.load(Ordering::Relaxed),
            failed_visits: self.failed_visits.load(Ordering::Relaxed),
            failed_searches: self.failed_searches.load(Ordering::Relaxed),
            captchas_solved: self.captchas_solved.load(Ordering::Relaxed),
            vpn_switches: self.vpn_switches.load(Ordering::Relaxed),
            proxy_switches: self.proxy_switches.load(Ordering::Relaxed),
            search_traffic: self.search_traffic.load(Ordering::Relaxed),
            social_traffic: self.social_traffic.load(Ordering::Relaxed),
            direct_traffic: self.direct_traffic.load(Ordering::Relaxed),
            referral_traffic: self.referral_traffic.load(Ordering::Relaxed),
            desktop_visits: self.desktop_visits.load(Ordering::Relaxed),
            mobile_visits: self.mobile_visits.load(Ordering::Relaxed),
            tablet_visits: self.tablet_visits.load(Ordering::Relaxed),
            start_time: fmt(*self.start_time.lock().unwrap()),
            last_visit: fmt(*self.last_visit.lock().unwrap()),
        }
    }
}

/// Point-in-time projection of the engine counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub visits: u64,
    pub successful_visits: u64,
    pub failed_visits: u64,
    pub failed_searches: u64,
    pub captchas_solved: u64,
    pub vpn_switches: u64,
    pub proxy_switches: u64,
    pub search_traffic: u64,
    pub social_traffic: u64,
    pub direct_traffic: u64,
    pub referral_traffic: u64,
    pub desktop_visits: u64,
    pub mobile_visits: u64,
    pub tablet_visits: u64,
    pub start_time: Option<String>,
    pub last_visit: Option<String>,
}
