//! Configuration loading.
//!
//! Loaded from trafficr.yml with a fallback chain: explicit path, project
//! file, user config dir, defaults. All sections default individually so a
//! partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorSettings;
use crate::engine::Pacing;
use crate::schedule::{CampaignWindow, DistributionMode, TrafficSchedule, VisitTargets};

/// Top-level configuration for trafficr.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Quota targets, window, and distribution mode.
    pub campaign: CampaignConfig,

    /// Per-visit behavior knobs.
    pub behavior: BehaviorSettings,

    /// Worker pool settings and seed lists.
    pub engine: EngineSettings,
}

/// Campaign quota and calendar settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Campaign start; defaults to now at first schedule calculation.
    pub start: Option<NaiveDateTime>,
    /// Campaign end; defaults to the last instant of the current month.
    pub end: Option<NaiveDateTime>,
    /// Hours of day (0-23) traffic may be generated.
    pub active_hours: Vec<u32>,
    /// Days of week (0-6, Monday = 0) traffic may be generated.
    pub active_days: Vec<u32>,
    /// How quotas are distributed across hourly buckets.
    pub mode: DistributionMode,
    /// Visit targets; zero means unset, at most one is authoritative.
    pub hourly_target: u64,
    pub daily_target: u64,
    pub monthly_target: u64,
    pub total_target: u64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            active_hours: (0..24).collect(),
            active_days: (0..7).collect(),
            mode: DistributionMode::Even,
            hourly_target: 0,
            daily_target: 0,
            monthly_target: 0,
            total_target: 0,
        }
    }
}

impl CampaignConfig {
    /// Build and calculate a schedule gate from this configuration.
    pub fn build_schedule(&self, now: NaiveDateTime) -> crate::error::Result<TrafficSchedule> {
        let mut window = CampaignWindow::default();
        window.set_time_range(self.start, self.end)?;
        window.set_active_hours(&self.active_hours)?;
        window.set_active_days(&self.active_days)?;

        let targets = VisitTargets {
            hourly: self.hourly_target,
            daily: self.daily_target,
            monthly: self.monthly_target,
            total: self.total_target,
        };

        let mut schedule = TrafficSchedule::new();
        schedule.apply(targets, window, self.mode, now)?;
        Ok(schedule)
    }
}

/// Worker pool settings and seed material.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Workers spawned by default.
    pub workers: usize,
    /// Operator cap on the worker count.
    pub max_workers: usize,
    /// Bounded dequeue wait in milliseconds.
    pub poll_interval_ms: u64,
    /// Delay between simulated page interactions in milliseconds.
    pub interaction_delay_ms: u64,
    /// Keywords seeded as search tasks at start.
    pub keywords: Vec<String>,
    /// URLs seeded as visit tasks at start.
    pub urls: Vec<String>,
    /// Optional keyword file, one per line.
    pub keyword_file: Option<PathBuf>,
    /// Optional URL file, one per line.
    pub url_file: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: 3,
            max_workers: 8,
            poll_interval_ms: 250,
            interaction_delay_ms: 2000,
            keywords: Vec::new(),
            urls: Vec::new(),
            keyword_file: None,
            url_file: None,
        }
    }
}

impl EngineSettings {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            poll_interval_ms: self.poll_interval_ms,
            interaction_delay_ms: self.interaction_delay_ms,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. trafficr.yml in current directory
    /// 3. ~/.config/trafficr/trafficr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from("trafficr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from trafficr.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load trafficr.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("trafficr").join("trafficr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("Using default configuration");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .context(format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.workers, 3);
        assert_eq!(config.engine.max_workers, 8);
        assert_eq!(config.campaign.active_hours.len(), 24);
        assert_eq!(config.campaign.mode, DistributionMode::Even);
        assert_eq!(config.behavior.bounce_rate, 0.15);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
campaign:
  daily_target: 50
  active_hours: [9, 10, 11]
  mode: frontloaded
engine:
  workers: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.campaign.daily_target, 50);
        assert_eq!(config.campaign.active_hours, vec![9, 10, 11]);
        assert_eq!(config.campaign.mode, DistributionMode::Frontloaded);
        assert_eq!(config.engine.workers, 5);
        // Untouched sections keep defaults.
        assert_eq!(config.engine.max_workers, 8);
        assert_eq!(config.behavior.max_subpage_visits, 3);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "engine:\n  workers: 7").unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.engine.workers, 7);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let missing = PathBuf::from("/nonexistent/trafficr.yml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_build_schedule_from_campaign() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let campaign = CampaignConfig {
            daily_target: 24,
            active_hours: vec![9, 10, 11],
            ..Default::default()
        };
        let schedule = campaign.build_schedule(now).unwrap();
        assert_eq!(schedule.targets().daily, 24);
        assert_eq!(schedule.targets().hourly, 8);
    }

    #[test]
    fn test_build_schedule_rejects_empty_hours() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let campaign = CampaignConfig { active_hours: Vec::new(), ..Default::default() };
        assert!(campaign.build_schedule(now).is_err());
    }

    #[test]
    fn test_yaml_datetime_bounds() {
        let yaml = r#"
campaign:
  start: "2026-09-01T00:00:00"
  end: "2026-09-30T23:59:59"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.campaign.start.is_some());
        assert!(config.campaign.end.unwrap() > config.campaign.start.unwrap());
    }
}
