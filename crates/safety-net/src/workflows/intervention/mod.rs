//! Dropout risk scoring and intervention orchestration.
//!
//! A request flows strictly in order: metrics are collected, a financial-aid
//! scheme is matched, the engine scores the student, the selector chooses
//! actions, and the injected generators produce their content.

pub mod domain;
pub mod eligibility;
pub mod generation;
pub mod metrics;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod selector;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AcademicTrend, Demographics, ExamScore, Language, ParentEducation, ParentLiteracy,
    RiskFactor, SocialRiskProfile, StudentId, StudentMetrics, StudentRecord,
};
pub use eligibility::{
    EligibilityMatcher, Scheme, SchemeCatalog, SchemeCriteria, SchemeTable, SchemeTableError,
};
pub use generation::{
    DisabledTextGenerator, FormRenderer, GenerationError, HtmlFormRenderer, HttpTextGenerator,
    RenderError, RenderedForm, TextGenerator,
};
pub use metrics::{MetricsAggregator, StudentSnapshot};
pub use repository::{RepositoryError, StudentRepository};
pub use router::intervention_router;
pub use scoring::{
    InterventionPolicy, PolicyError, RiskAssessment, RiskScoringEngine, ScoringConfig,
    SelectionConfig, StatusTier,
};
pub use selector::{
    select_actions, ActionKind, ActionRequest, AidFormRequest, ScriptRequest, SelectionInput,
    TeacherPlanRequest,
};
pub use service::{
    BatchFailure, BatchReport, BatchSummary, ContentCapabilities, Deliverable,
    DeliverableContent, InterventionError, InterventionPlan, InterventionReport,
    InterventionService,
};
