// Performance tiers derived from the composite strength score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TierThresholds;

/// Tier label for a player's strength score, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Elite,
    Starter,
    #[serde(rename = "Role Player")]
    RolePlayer,
    #[serde(rename = "Bench Player")]
    BenchPlayer,
    Reserve,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Elite => "Elite",
            Tier::Starter => "Starter",
            Tier::RolePlayer => "Role Player",
            Tier::BenchPlayer => "Bench Player",
            Tier::Reserve => "Reserve",
        }
    }

    /// Map a score onto a tier. Lower bounds are inclusive, so a score of
    /// exactly `elite` is Elite. NaN falls through to Reserve.
    pub fn classify(score: f64, thresholds: &TierThresholds) -> Self {
        if score >= thresholds.elite {
            Tier::Elite
        } else if score >= thresholds.starter {
            Tier::Starter
        } else if score >= thresholds.role_player {
            Tier::RolePlayer
        } else if score >= thresholds.bench_player {
            Tier::BenchPlayer
        } else {
            Tier::Reserve
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
