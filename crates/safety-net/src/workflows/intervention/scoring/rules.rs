use super::super::domain::{Demographics, ParentLiteracy, StudentMetrics};
use super::config::ScoringConfig;
use super::{RiskSignal, ScoreComponent};

pub(crate) struct ScoreTally {
    pub components: Vec<ScoreComponent>,
    pub reasons: Vec<String>,
    pub raw_total: u32,
}

impl ScoreTally {
    fn new() -> Self {
        Self {
            components: Vec::new(),
            reasons: Vec::new(),
            raw_total: 0,
        }
    }

    fn add(&mut self, signal: RiskSignal, points: u16, reason: Option<String>) {
        self.raw_total += u32::from(points);
        self.components.push(ScoreComponent { signal, points });
        if let Some(reason) = reason {
            self.reasons.push(reason);
        }
    }
}

/// Applies each branch of the additive model in evaluation order.
pub(crate) fn score_signals(
    metrics: &StudentMetrics,
    demographics: &Demographics,
    config: &ScoringConfig,
) -> ScoreTally {
    let mut tally = ScoreTally::new();

    if !metrics.social_risks.is_empty() {
        let points = metrics
            .social_risks
            .iter()
            .map(|factor| config.social.weight_of(factor))
            .fold(0u16, u16::saturating_add);
        let count = metrics.social_risks.len();
        let labels = metrics
            .social_risks
            .iter()
            .map(|factor| factor.label())
            .collect::<Vec<_>>()
            .join(", ");
        let noun = if count == 1 { "Factor" } else { "Factors" };
        tally.add(
            RiskSignal::Social,
            points,
            Some(format!("{count} Social Risk {noun} ({labels})")),
        );
    }

    if let Some(income) = demographics.family_income {
        let bands = &config.economic;
        if income < bands.severe_distress_below {
            tally.add(
                RiskSignal::Economic,
                bands.severe_distress_weight,
                Some("Severe Economic Distress".to_string()),
            );
        } else if income < bands.moderate_pressure_below {
            tally.add(RiskSignal::Economic, bands.moderate_pressure_weight, None);
        }
    }

    if metrics.parent_literacy == ParentLiteracy::Low {
        tally.add(
            RiskSignal::ParentalSupport,
            config.low_parent_literacy_weight,
            Some("Lack of Parental Academic Support".to_string()),
        );
    }

    let attendance = metrics.attendance_percent;
    let bands = &config.attendance;
    if attendance < bands.critical_below {
        tally.add(
            RiskSignal::Attendance,
            bands.critical_weight,
            Some(format!(
                "Critical Attendance ({}%)",
                format_measure(attendance)
            )),
        );
    } else if attendance < bands.low_below {
        tally.add(
            RiskSignal::Attendance,
            bands.low_weight,
            Some(format!("Low Attendance ({}%)", format_measure(attendance))),
        );
    }

    // Placeholder trends carry no exams and must not read as failing grades.
    let academic = &metrics.academic;
    if academic.is_recorded() {
        let bands = &config.academic;
        if academic.current_score < bands.failing_below {
            tally.add(
                RiskSignal::Academic,
                bands.failing_weight,
                Some(format!(
                    "Failing Grades ({})",
                    format_measure(academic.current_score)
                )),
            );
        } else if academic.score_drop() > bands.sharp_decline_above {
            tally.add(
                RiskSignal::Academic,
                bands.sharp_decline_weight,
                Some("Sharp Academic Decline".to_string()),
            );
        }
    }

    tally
}

pub(crate) fn format_measure(value: f32) -> String {
    if value.fract().abs() < f32::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
