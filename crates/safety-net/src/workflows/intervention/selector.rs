use serde::{Deserialize, Serialize};

use super::domain::{Demographics, Language, ParentLiteracy, StudentId, StudentMetrics};
use super::eligibility::Scheme;
use super::scoring::{RiskAssessment, SelectionConfig, StatusTier};

/// Parameters for the home-visit persuasion script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub student_name: String,
    pub reasons: Vec<String>,
    pub parent_literacy: ParentLiteracy,
    pub scheme_name: Option<String>,
    pub language: Language,
}

/// Parameters for a pre-filled financial-aid application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidFormRequest {
    pub student_id: StudentId,
    pub student_name: String,
    pub scheme: Scheme,
    pub demographics: Demographics,
    pub metrics: StudentMetrics,
}

/// Parameters for a remedial-teaching plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherPlanRequest {
    pub student_name: String,
    pub subject: String,
    pub current_score: f32,
    pub previous_score: f32,
    pub decline_duration_months: u8,
}

/// Intervention the orchestrator must produce content for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRequest {
    Script(ScriptRequest),
    AidForm(AidFormRequest),
    TeacherPlan(TeacherPlanRequest),
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Script(_) => ActionKind::Script,
            ActionRequest::AidForm(_) => ActionKind::AidForm,
            ActionRequest::TeacherPlan(_) => ActionKind::TeacherPlan,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Script,
    AidForm,
    TeacherPlan,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActionKind::Script => "script",
            ActionKind::AidForm => "aid_form",
            ActionKind::TeacherPlan => "teacher_plan",
        }
    }
}

/// Everything the selector reads besides the assessment itself.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub student_id: StudentId,
    pub student_name: &'a str,
    pub metrics: &'a StudentMetrics,
    pub demographics: &'a Demographics,
    pub matched_scheme: Option<&'a Scheme>,
    pub language: Language,
}

/// Maps an assessment to the ordered set of actions it calls for.
///
/// The high-risk branch and the remedial branch are evaluated independently,
/// so one student can receive a script, an aid form and a teacher plan.
pub fn select_actions(
    assessment: &RiskAssessment,
    input: SelectionInput<'_>,
    config: &SelectionConfig,
) -> Vec<ActionRequest> {
    let mut actions = Vec::new();

    if assessment.tier == StatusTier::HighRisk {
        actions.push(ActionRequest::Script(ScriptRequest {
            student_name: input.student_name.to_string(),
            reasons: assessment.reasons.clone(),
            parent_literacy: input.metrics.parent_literacy,
            scheme_name: input.matched_scheme.map(|scheme| scheme.name.clone()),
            language: input.language,
        }));

        if let Some(scheme) = input.matched_scheme {
            actions.push(ActionRequest::AidForm(AidFormRequest {
                student_id: input.student_id,
                student_name: input.student_name.to_string(),
                scheme: scheme.clone(),
                demographics: input.demographics.clone(),
                metrics: input.metrics.clone(),
            }));
        }
    }

    let academic = &input.metrics.academic;
    let struggling =
        academic.is_recorded() && academic.current_score < config.remedial_score_below;
    if assessment.tier == StatusTier::AcademicWatch || struggling {
        actions.push(ActionRequest::TeacherPlan(TeacherPlanRequest {
            student_name: input.student_name.to_string(),
            subject: academic.weakest_subject.clone(),
            current_score: academic.current_score,
            previous_score: academic.previous_score,
            decline_duration_months: academic.decline_duration_months,
        }));
    }

    actions
}
