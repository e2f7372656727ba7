//! Behavior profile: weighted-random per-visit parameters.
//!
//! Every visit draws a fresh set of parameters (device, referrer, bounce,
//! subpage count, duration, interaction kinds) from fixed distributions;
//! the draws are ephemeral and never persisted.

pub mod weighted;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrafficError};
pub use weighted::WeightedTable;

/// Emulated device class for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
        };
        write!(f, "{}", s)
    }
}

/// Top-level referrer class used for traffic statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferrerClass {
    Search,
    Social,
    Direct,
    Referral,
}

/// Fully drawn referrer, with the nested engine/network sub-choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Referrer {
    Search { engine: &'static str },
    Social { source: &'static str },
    Direct,
    Referral,
}

impl Referrer {
    pub fn class(&self) -> ReferrerClass {
        match self {
            Referrer::Search { .. } => ReferrerClass::Search,
            Referrer::Social { .. } => ReferrerClass::Social,
            Referrer::Direct => ReferrerClass::Direct,
            Referrer::Referral => ReferrerClass::Referral,
        }
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referrer::Search { engine } => write!(f, "search_{}", engine),
            Referrer::Social { source } => write!(f, "social_{}", source),
            Referrer::Direct => write!(f, "direct"),
            Referrer::Referral => write!(f, "referral"),
        }
    }
}

/// One simulated per-tick page interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Scroll,
    MouseMove,
    ClickNowhere,
    FormInteract,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InteractionKind::Scroll => "scroll",
            InteractionKind::MouseMove => "mouse_move",
            InteractionKind::ClickNowhere => "click_nowhere",
            InteractionKind::FormInteract => "form_interact",
        };
        write!(f, "{}", s)
    }
}

/// Tunable behavior knobs, loadable from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorSettings {
    /// Minimum visit duration in seconds.
    pub min_visit_duration: u64,
    /// Maximum visit duration in seconds.
    pub max_visit_duration: u64,
    /// Probability that a visit bounces after minimal interaction.
    pub bounce_rate: f64,
    /// Upper bound on subpages visited after the landing page.
    pub max_subpage_visits: u32,
    /// Probability that a drawn form interaction is actually performed.
    pub form_interaction_probability: f64,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            min_visit_duration: 60,
            max_visit_duration: 180,
            bounce_rate: 0.15,
            max_subpage_visits: 3,
            form_interaction_probability: 0.3,
        }
    }
}

/// Weighted distributions governing randomized visit parameters.
#[derive(Debug, Clone)]
pub struct BehaviorProfile {
    settings: BehaviorSettings,
    devices: WeightedTable<DeviceType>,
    referrer_classes: WeightedTable<ReferrerClass>,
    search_engines: WeightedTable<&'static str>,
    social_sources: WeightedTable<&'static str>,
    interactions: WeightedTable<InteractionKind>,
    subpage_counts: WeightedTable<u32>,
}

impl BehaviorProfile {
    pub fn new(settings: BehaviorSettings) -> Result<Self> {
        if settings.min_visit_duration > settings.max_visit_duration {
            return Err(TrafficError::Config(
                "min_visit_duration exceeds max_visit_duration".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&settings.bounce_rate) {
            return Err(TrafficError::Config("bounce_rate must be within [0, 1]".to_string()));
        }
        if !(0.0..=1.0).contains(&settings.form_interaction_probability) {
            return Err(TrafficError::Config(
                "form_interaction_probability must be within [0, 1]".to_string(),
            ));
        }
        if settings.max_subpage_visits == 0 {
            return Err(TrafficError::Config("max_subpage_visits must be at least 1".to_string()));
        }

        let devices = WeightedTable::new(vec![
            (DeviceType::Desktop, 0.6),
            (DeviceType::Mobile, 0.3),
            (DeviceType::Tablet, 0.1),
        ])?;
        let referrer_classes = WeightedTable::new(vec![
            (ReferrerClass::Search, 0.40),
            (ReferrerClass::Social, 0.25),
            (ReferrerClass::Direct, 0.20),
            (ReferrerClass::Referral, 0.15),
        ])?;
        let search_engines = WeightedTable::new(vec![
            ("google", 0.75),
            ("bing", 0.15),
            ("yahoo", 0.05),
            ("duckduckgo", 0.05),
        ])?;
        let social_sources = WeightedTable::new(vec![
            ("facebook", 0.35),
            ("twitter", 0.25),
            ("instagram", 0.15),
            ("linkedin", 0.10),
            ("pinterest", 0.10),
            ("reddit", 0.05),
        ])?;
        let interactions = WeightedTable::new(vec![
            (InteractionKind::Scroll, 0.6),
            (InteractionKind::MouseMove, 0.2),
            (InteractionKind::ClickNowhere, 0.1),
            (InteractionKind::FormInteract, 0.1),
        ])?;

        // Biased toward few subpages: count k of 1..=max gets weight
        // max - k + 1.
        let max = settings.max_subpage_visits;
        let subpage_counts = WeightedTable::new(
            (1..=max).map(|k| (k, (max - k + 1) as f64)).collect(),
        )?;

        Ok(Self {
            settings,
            devices,
            referrer_classes,
            search_engines,
            social_sources,
            interactions,
            subpage_counts,
        })
    }

    pub fn settings(&self) -> &BehaviorSettings {
        &self.settings
    }

    /// Visit duration in seconds, uniform over the configured range.
    pub fn visit_duration<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.settings.min_visit_duration as f64..=self.settings.max_visit_duration as f64)
    }

    pub fn random_device<R: Rng>(&self, rng: &mut R) -> DeviceType {
        *self.devices.sample(rng)
    }

    /// Referrer draw with the nested engine/source sub-choice.
    pub fn random_referrer<R: Rng>(&self, rng: &mut R) -> Referrer {
        match self.referrer_classes.sample(rng) {
            ReferrerClass::Search => Referrer::Search { engine: *self.search_engines.sample(rng) },
            ReferrerClass::Social => Referrer::Social { source: *self.social_sources.sample(rng) },
            ReferrerClass::Direct => Referrer::Direct,
            ReferrerClass::Referral => Referrer::Referral,
        }
    }

    pub fn should_bounce<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.settings.bounce_rate)
    }

    /// Subpage count for a non-bounced visit, weighted toward small counts.
    /// Bounced visits get 0 by definition and never call this.
    pub fn subpage_count<R: Rng>(&self, rng: &mut R) -> u32 {
        *self.subpage_counts.sample(rng)
    }

    pub fn random_interaction<R: Rng>(&self, rng: &mut R) -> InteractionKind {
        *self.interactions.sample(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile() -> BehaviorProfile {
        BehaviorProfile::new(BehaviorSettings::default()).unwrap()
    }

    #[test]
    fn test_default_settings_build() {
        let p = profile();
        assert_eq!(p.settings().min_visit_duration, 60);
        assert_eq!(p.settings().max_subpage_visits, 3);
    }

    #[test]
    fn test_inverted_duration_range_rejected() {
        let settings = BehaviorSettings {
            min_visit_duration: 120,
            max_visit_duration: 60,
            ..Default::default()
        };
        assert!(matches!(BehaviorProfile::new(settings), Err(TrafficError::Config(_))));
    }

    #[test]
    fn test_out_of_range_bounce_rate_rejected() {
        let settings = BehaviorSettings { bounce_rate: 1.5, ..Default::default() };
        assert!(BehaviorProfile::new(settings).is_err());
    }

    #[test]
    fn test_zero_max_subpages_rejected() {
        let settings = BehaviorSettings { max_subpage_visits: 0, ..Default::default() };
        assert!(BehaviorProfile::new(settings).is_err());
    }

    #[test]
    fn test_visit_duration_within_range() {
        let p = profile();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let d = p.visit_duration(&mut rng);
            assert!((60.0..=180.0).contains(&d));
        }
    }

    #[test]
    fn test_subpage_count_within_bounds() {
        let p = profile();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let n = p.subpage_count(&mut rng);
            assert!((1..=3).contains(&n));
        }
    }

    #[test]
    fn test_subpage_counts_biased_toward_one() {
        let p = profile();
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = [0u32; 4];
        for _ in 0..3000 {
            counts[p.subpage_count(&mut rng) as usize] += 1;
        }
        assert!(counts[1] > counts[3], "one subpage should outnumber three: {:?}", counts);
    }

    #[test]
    fn test_referrer_nested_draw() {
        let p = profile();
        let mut rng = StdRng::seed_from_u64(3);
        let mut saw_search = false;
        for _ in 0..200 {
            let r = p.random_referrer(&mut rng);
            match &r {
                Referrer::Search { engine } => {
                    saw_search = true;
                    assert!(["google", "bing", "yahoo", "duckduckgo"].contains(engine));
                    assert!(r.to_string().starts_with("search_"));
                }
                Referrer::Social { source } => {
                    assert!(
                        ["facebook", "twitter", "instagram", "linkedin", "pinterest", "reddit"]
                            .contains(source)
                    );
                }
                Referrer::Direct => assert_eq!(r.class(), ReferrerClass::Direct),
                Referrer::Referral => assert_eq!(r.class(), ReferrerClass::Referral),
            }
        }
        assert!(saw_search, "search referrers carry 40% weight, should appear");
    }

    #[test]
    fn test_zero_bounce_rate_never_bounces() {
        let settings = BehaviorSettings { bounce_rate: 0.0, ..Default::default() };
        let p = BehaviorProfile::new(settings).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(!p.should_bounce(&mut rng));
        }
    }

    #[test]
    fn test_device_distribution_favors_desktop() {
        let p = profile();
        let mut rng = StdRng::seed_from_u64(3);
        let desktop = (0..1000)
            .filter(|_| p.random_device(&mut rng) == DeviceType::Desktop)
            .count();
        assert!(desktop > 450, "desktop carries 60% weight, got {}", desktop);
    }
}
