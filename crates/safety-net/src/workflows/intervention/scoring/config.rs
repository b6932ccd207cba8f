use serde::{Deserialize, Serialize};

use super::super::domain::RiskFactor;

/// Weights and thresholds for the additive dropout-risk model.
///
/// Every field has a documented default, so partial JSON policies only need to
/// name the values they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub social: SocialWeights,
    pub economic: EconomicBands,
    pub low_parent_literacy_weight: u16,
    pub attendance: AttendanceBands,
    pub academic: AcademicBands,
    pub tiers: TierThresholds,
    pub max_score: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            social: SocialWeights::default(),
            economic: EconomicBands::default(),
            low_parent_literacy_weight: 15,
            attendance: AttendanceBands::default(),
            academic: AcademicBands::default(),
            tiers: TierThresholds::default(),
            max_score: 100,
        }
    }
}

/// Per-factor points for social risks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialWeights {
    pub sibling_dropout_history: u16,
    pub seasonal_labor: u16,
    pub migrant_family: u16,
    pub childcare_responsibility: u16,
    pub unrecognized: u16,
}

impl SocialWeights {
    pub fn weight_of(&self, factor: &RiskFactor) -> u16 {
        match factor {
            RiskFactor::SiblingDropoutHistory => self.sibling_dropout_history,
            RiskFactor::SeasonalLabor => self.seasonal_labor,
            RiskFactor::MigrantFamily => self.migrant_family,
            RiskFactor::ChildcareResponsibility => self.childcare_responsibility,
            RiskFactor::Other(_) => self.unrecognized,
        }
    }
}

impl Default for SocialWeights {
    fn default() -> Self {
        Self {
            sibling_dropout_history: 30,
            seasonal_labor: 25,
            migrant_family: 20,
            childcare_responsibility: 15,
            unrecognized: 10,
        }
    }
}

/// Annual income bands in rupees. Ceilings are exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicBands {
    pub severe_distress_below: u32,
    pub severe_distress_weight: u16,
    pub moderate_pressure_below: u32,
    pub moderate_pressure_weight: u16,
}

impl Default for EconomicBands {
    fn default() -> Self {
        Self {
            severe_distress_below: 50_000,
            severe_distress_weight: 25,
            moderate_pressure_below: 100_000,
            moderate_pressure_weight: 10,
        }
    }
}

/// Attendance percentage bands, evaluated critical first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceBands {
    pub critical_below: f32,
    pub critical_weight: u16,
    pub low_below: f32,
    pub low_weight: u16,
}

impl Default for AttendanceBands {
    fn default() -> Self {
        Self {
            critical_below: 50.0,
            critical_weight: 60,
            low_below: 75.0,
            low_weight: 30,
        }
    }
}

/// Exam performance bands, evaluated failing first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicBands {
    pub failing_below: f32,
    pub failing_weight: u16,
    /// Drop in points (previous minus current) that must be exceeded.
    pub sharp_decline_above: f32,
    pub sharp_decline_weight: u16,
}

impl Default for AcademicBands {
    fn default() -> Self {
        Self {
            failing_below: 35.0,
            failing_weight: 40,
            sharp_decline_above: 15.0,
            sharp_decline_weight: 25,
        }
    }
}

/// Lower bounds (inclusive) of the non-normal tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub academic_watch_at: u8,
    pub high_risk_at: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            academic_watch_at: 30,
            high_risk_at: 60,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_score == 0 || self.max_score > 100 {
            return Err(PolicyError::Invalid(format!(
                "max_score must be within 1..=100 (found {})",
                self.max_score
            )));
        }
        if self.tiers.academic_watch_at == 0
            || self.tiers.academic_watch_at >= self.tiers.high_risk_at
        {
            return Err(PolicyError::Invalid(format!(
                "academic_watch_at ({}) must be positive and below high_risk_at ({})",
                self.tiers.academic_watch_at, self.tiers.high_risk_at
            )));
        }
        if self.tiers.high_risk_at > self.max_score {
            return Err(PolicyError::Invalid(format!(
                "high_risk_at ({}) is unreachable with max_score {}",
                self.tiers.high_risk_at, self.max_score
            )));
        }
        if self.economic.severe_distress_below > self.economic.moderate_pressure_below {
            return Err(PolicyError::Invalid(
                "severe_distress_below must not exceed moderate_pressure_below".to_string(),
            ));
        }
        let percent = 0.0_f32..=100.0;
        if !percent.contains(&self.attendance.critical_below)
            || !percent.contains(&self.attendance.low_below)
            || self.attendance.critical_below > self.attendance.low_below
        {
            return Err(PolicyError::Invalid(format!(
                "attendance bands must satisfy 0 <= critical ({}) <= low ({}) <= 100",
                self.attendance.critical_below, self.attendance.low_below
            )));
        }
        if !self.academic.failing_below.is_finite()
            || self.academic.failing_below < 0.0
            || !self.academic.sharp_decline_above.is_finite()
            || self.academic.sharp_decline_above < 0.0
        {
            return Err(PolicyError::Invalid(
                "academic thresholds must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the intervention selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Current score below which a remedial plan is produced regardless of tier.
    pub remedial_score_below: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            remedial_score_below: 40.0,
        }
    }
}

/// Complete policy handed to the intervention service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InterventionPolicy {
    pub scoring: ScoringConfig,
    pub selection: SelectionConfig,
}

impl InterventionPolicy {
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let policy: InterventionPolicy = serde_json::from_str(raw)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self, PolicyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        self.scoring.validate()?;
        let remedial = self.selection.remedial_score_below;
        if !remedial.is_finite() || remedial < 0.0 {
            return Err(PolicyError::Invalid(format!(
                "remedial_score_below must be finite and non-negative (found {remedial})"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("unable to read policy file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("policy file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid intervention policy: {0}")]
    Invalid(String),
}
