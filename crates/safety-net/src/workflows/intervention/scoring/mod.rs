mod config;
mod rules;
mod tier;

pub use config::{
    AcademicBands, AttendanceBands, EconomicBands, InterventionPolicy, PolicyError,
    ScoringConfig, SelectionConfig, SocialWeights, TierThresholds,
};
pub use tier::StatusTier;

pub(crate) use rules::format_measure;

use super::domain::{Demographics, StudentMetrics};
use serde::{Deserialize, Serialize};

/// Stateless scorer that applies a weighting policy to a student's signals.
#[derive(Debug, Clone)]
pub struct RiskScoringEngine {
    config: ScoringConfig,
}

impl RiskScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, metrics: &StudentMetrics, demographics: &Demographics) -> RiskAssessment {
        let tally = rules::score_signals(metrics, demographics, &self.config);

        let max_score = u32::from(self.config.max_score.min(100));
        let score = tally.raw_total.min(max_score) as u8;
        let tier = StatusTier::from_score(score, &self.config.tiers);

        let mut reasons = tally.reasons;
        if tier != StatusTier::Normal && reasons.is_empty() {
            reasons.push(format!("Cumulative Risk Score ({score})"));
        }

        RiskAssessment {
            score,
            tier,
            reasons,
            components: tally.components,
        }
    }
}

impl Default for RiskScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Branch of the model that contributed points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignal {
    Social,
    Economic,
    ParentalSupport,
    Attendance,
    Academic,
}

/// Unclamped contribution of one branch, kept for audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub signal: RiskSignal,
    pub points: u16,
}

/// Engine output: clamped score, tier and the explanations that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub tier: StatusTier,
    pub reasons: Vec<String>,
    pub components: Vec<ScoreComponent>,
}
