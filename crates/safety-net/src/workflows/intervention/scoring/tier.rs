use serde::{Deserialize, Serialize};

use super::config::TierThresholds;

/// Banded classification of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    Normal,
    AcademicWatch,
    HighRisk,
}

impl StatusTier {
    /// Lower bounds are inclusive: a score equal to a threshold lands in the higher tier.
    pub fn from_score(score: u8, thresholds: &TierThresholds) -> Self {
        if score >= thresholds.high_risk_at {
            StatusTier::HighRisk
        } else if score >= thresholds.academic_watch_at {
            StatusTier::AcademicWatch
        } else {
            StatusTier::Normal
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StatusTier::Normal => "normal",
            StatusTier::AcademicWatch => "academic_watch",
            StatusTier::HighRisk => "high_risk",
        }
    }

    pub const fn headline(self) -> &'static str {
        match self {
            StatusTier::Normal => "NORMAL",
            StatusTier::AcademicWatch => "ACADEMIC WATCH",
            StatusTier::HighRisk => "HIGH RISK",
        }
    }

    pub const fn guidance(self) -> &'static str {
        match self {
            StatusTier::Normal => "No intervention needed at this time.",
            StatusTier::AcademicWatch => {
                "Teacher attention needed. No financial aid required yet."
            }
            StatusTier::HighRisk => "Immediate home visit and financial aid required.",
        }
    }
}
