//! Quota scheduling: target derivation, bucket distribution, and the gate
//! that decides whether a visit may start right now.

pub mod distribution;
pub mod gate;
pub mod quota;
pub mod window;

pub use distribution::{DistributionMode, HourKey, HourlyTargets, build_table};
pub use gate::{ProgressStats, ScheduleStats, TrafficSchedule, VisitCounters};
pub use quota::{Period, VisitTargets};
pub use window::CampaignWindow;
