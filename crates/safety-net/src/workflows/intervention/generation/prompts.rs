use serde::Serialize;

use crate::workflows::intervention::domain::ParentLiteracy;
use crate::workflows::intervention::scoring::format_measure;
use crate::workflows::intervention::selector::{ScriptRequest, TeacherPlanRequest};

/// Shape of a student's recent results in the weakest subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicTrajectory {
    /// Large drop in one window; often tied to an event at home.
    SuddenCrash,
    /// Slower slide that points at foundational gaps.
    ChronicDecline,
    SteadyStruggle,
}

impl AcademicTrajectory {
    pub fn classify(plan: &TeacherPlanRequest, sharp_decline_above: f32) -> Self {
        if plan.previous_score - plan.current_score > sharp_decline_above {
            AcademicTrajectory::SuddenCrash
        } else if plan.decline_duration_months > 0 {
            AcademicTrajectory::ChronicDecline
        } else {
            AcademicTrajectory::SteadyStruggle
        }
    }

    pub const fn describe(self) -> &'static str {
        match self {
            AcademicTrajectory::SuddenCrash => {
                "sudden crash; check for recent trauma or events at home"
            }
            AcademicTrajectory::ChronicDecline => "chronic decline; likely foundational gaps",
            AcademicTrajectory::SteadyStruggle => "steady struggle",
        }
    }
}

pub fn script_prompt(request: &ScriptRequest) -> String {
    let approach = match request.parent_literacy {
        ParentLiteracy::Low => "Use simple spoken language and examples from farming life.",
        ParentLiteracy::High => "Emphasise long-term career stability and further study.",
    };

    let concerns = if request.reasons.is_empty() {
        "general risk of leaving school".to_string()
    } else {
        request.reasons.join("; ")
    };

    let support = match &request.scheme_name {
        Some(scheme) => format!(
            "Mention that the family qualifies for the \"{scheme}\" scholarship and that a filled-in application is ready."
        ),
        None => "Do not promise any financial aid.".to_string(),
    };

    format!(
        "You are a community social worker visiting the family of {name}. \
         Persuade the parents to keep {name} in school.\n\
         Concerns: {concerns}.\n\
         Parent literacy: {literacy}. {approach}\n\
         {support}\n\
         Write a respectful script of three to four sentences in {language}.",
        name = request.student_name,
        literacy = request.parent_literacy.label(),
        language = request.language,
    )
}

pub fn remedial_plan_prompt(request: &TeacherPlanRequest, sharp_decline_above: f32) -> String {
    let trajectory = AcademicTrajectory::classify(request, sharp_decline_above);

    format!(
        "You are an experienced headmaster coaching a class teacher.\n\
         Student: {name}. Subject: {subject}.\n\
         Latest average: {current} (earlier average: {previous}). Trend: {trend}.\n\
         Produce a remedial plan with three numbered parts:\n\
         1. Investigation: one question the teacher should ask the student.\n\
         2. Analogy: explain a hard {subject} concept with a rural or farming example.\n\
         3. Activity: a peer-learning exercise that needs no materials or money.",
        name = request.student_name,
        subject = request.subject,
        current = format_measure(request.current_score),
        previous = format_measure(request.previous_score),
        trend = trajectory.describe(),
    )
}
