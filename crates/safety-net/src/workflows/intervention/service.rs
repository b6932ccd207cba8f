use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::domain::{Demographics, Language, StudentId, StudentMetrics};
use super::eligibility::{EligibilityMatcher, SchemeCatalog};
use super::generation::{prompts, FormRenderer, GenerationError, TextGenerator};
use super::metrics::MetricsAggregator;
use super::repository::StudentRepository;
use super::scoring::{
    InterventionPolicy, RiskAssessment, RiskScoringEngine, SelectionConfig, StatusTier,
};
use super::selector::{
    select_actions, ActionKind, ActionRequest, AidFormRequest, SelectionInput,
};

pub const SCRIPT_PLACEHOLDER: &str = "Error generating script.";
pub const PLAN_PLACEHOLDER: &str = "Error generating plan.";
pub const FORM_PLACEHOLDER: &str = "Aid form could not be rendered.";

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Injected content capabilities and the budget for each call.
#[derive(Clone)]
pub struct ContentCapabilities {
    pub text: Arc<dyn TextGenerator>,
    pub forms: Arc<dyn FormRenderer>,
    pub timeout: Duration,
}

impl ContentCapabilities {
    pub fn new(text: Arc<dyn TextGenerator>, forms: Arc<dyn FormRenderer>) -> Self {
        Self {
            text,
            forms,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Service composing the aggregator, matcher, engine, selector and generators.
pub struct InterventionService<R, C> {
    aggregator: MetricsAggregator<R>,
    matcher: EligibilityMatcher<C>,
    engine: RiskScoringEngine,
    selection: SelectionConfig,
    capabilities: ContentCapabilities,
    max_concurrency: usize,
}

impl<R, C> InterventionService<R, C>
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    pub fn new(
        repository: Arc<R>,
        schemes: Arc<C>,
        policy: InterventionPolicy,
        capabilities: ContentCapabilities,
    ) -> Self {
        let InterventionPolicy { scoring, selection } = policy;

        Self {
            aggregator: MetricsAggregator::new(repository),
            matcher: EligibilityMatcher::new(schemes),
            engine: RiskScoringEngine::new(scoring),
            selection,
            capabilities,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Score a student and choose interventions without generating content.
    pub fn plan(
        &self,
        student_id: StudentId,
        language: Language,
    ) -> Result<InterventionPlan, InterventionError> {
        let snapshot = self.aggregator.collect(student_id)?;

        let matched_scheme = self
            .matcher
            .match_scheme(&snapshot.demographics)
            .map_err(|err| InterventionError::DataUnavailable(format!("scheme catalog: {err}")))?;

        let assessment = self.engine.score(&snapshot.metrics, &snapshot.demographics);

        let actions = select_actions(
            &assessment,
            SelectionInput {
                student_id,
                student_name: &snapshot.student.name,
                metrics: &snapshot.metrics,
                demographics: &snapshot.demographics,
                matched_scheme: matched_scheme.as_ref(),
                language,
            },
            &self.selection,
        );

        info!(
            student_id = %student_id,
            tier = assessment.tier.label(),
            score = assessment.score,
            actions = actions.len(),
            "intervention plan assembled"
        );

        Ok(InterventionPlan {
            student_id,
            student_name: snapshot.student.name,
            assessment,
            metrics: snapshot.metrics,
            demographics: snapshot.demographics,
            matched_scheme: matched_scheme.map(|scheme| scheme.name),
            actions,
        })
    }

    /// Plan, then generate content for every selected action in order.
    pub async fn intervene(
        &self,
        student_id: StudentId,
        language: Language,
    ) -> Result<InterventionReport, InterventionError> {
        let plan = self.plan(student_id, language)?;
        let mut deliverables = Vec::with_capacity(plan.actions.len());

        for action in &plan.actions {
            let content = match action {
                ActionRequest::Script(request) => {
                    let prompt = prompts::script_prompt(request);
                    self.generate_text(student_id, &prompt, SCRIPT_PLACEHOLDER)
                        .await
                }
                ActionRequest::AidForm(request) => self.render_form(student_id, request).await,
                ActionRequest::TeacherPlan(request) => {
                    let prompt = prompts::remedial_plan_prompt(
                        request,
                        self.engine.config().academic.sharp_decline_above,
                    );
                    self.generate_text(student_id, &prompt, PLAN_PLACEHOLDER)
                        .await
                }
            };

            deliverables.push(Deliverable {
                kind: action.kind(),
                content,
            });
        }

        Ok(InterventionReport { plan, deliverables })
    }

    /// Evaluate many students concurrently, tallying failures instead of aborting.
    pub async fn intervene_batch(
        self: &Arc<Self>,
        student_ids: Vec<StudentId>,
        language: Language,
    ) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(student_ids.len());

        for student_id in student_ids {
            let service = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                service.intervene(student_id, language).await
            });
            handles.push((student_id, handle));
        }

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (student_id, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(err)) => {
                    warn!(student_id = %student_id, error = %err, "batch evaluation failed");
                    failures.push(BatchFailure {
                        student_id,
                        error_kind: err.label(),
                        error: err.to_string(),
                    });
                }
                Err(join_error) => {
                    warn!(student_id = %student_id, error = %join_error, "batch task aborted");
                    failures.push(BatchFailure {
                        student_id,
                        error_kind: "task_failed",
                        error: join_error.to_string(),
                    });
                }
            }
        }

        reports.sort_by_key(|report| report.plan.student_id);
        failures.sort_by_key(|failure| failure.student_id);

        let summary = BatchSummary::tally(&reports, failures.len());
        BatchReport {
            summary,
            reports,
            failures,
        }
    }

    async fn generate_text(
        &self,
        student_id: StudentId,
        prompt: &str,
        placeholder: &str,
    ) -> DeliverableContent {
        let timeout = self.capabilities.timeout;
        let outcome = tokio::time::timeout(timeout, self.capabilities.text.generate(prompt))
            .await
            .unwrap_or(Err(GenerationError::Timeout(timeout.as_secs())));

        match outcome {
            Ok(body) => DeliverableContent::Text { body },
            Err(err) => {
                warn!(student_id = %student_id, error = %err, "text generation failed");
                DeliverableContent::Failed {
                    placeholder: placeholder.to_string(),
                    error: err.to_string(),
                }
            }
        }
    }

    async fn render_form(&self, student_id: StudentId, request: &AidFormRequest) -> DeliverableContent {
        let forms = Arc::clone(&self.capabilities.forms);
        let request = request.clone();
        let rendered = tokio::task::spawn_blocking(move || forms.render(&request)).await;

        match rendered {
            Ok(Ok(form)) => DeliverableContent::Document {
                path: form.path,
                content_type: form.content_type,
            },
            Ok(Err(err)) => {
                warn!(student_id = %student_id, error = %err, "aid form rendering failed");
                DeliverableContent::Failed {
                    placeholder: FORM_PLACEHOLDER.to_string(),
                    error: err.to_string(),
                }
            }
            Err(join_error) => {
                warn!(student_id = %student_id, error = %join_error, "aid form task aborted");
                DeliverableContent::Failed {
                    placeholder: FORM_PLACEHOLDER.to_string(),
                    error: join_error.to_string(),
                }
            }
        }
    }
}

/// Scored student with the actions chosen for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionPlan {
    pub student_id: StudentId,
    pub student_name: String,
    pub assessment: RiskAssessment,
    pub metrics: StudentMetrics,
    pub demographics: Demographics,
    pub matched_scheme: Option<String>,
    pub actions: Vec<ActionRequest>,
}

impl InterventionPlan {
    pub fn tier(&self) -> StatusTier {
        self.assessment.tier
    }

    pub fn has_action(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|action| action.kind() == kind)
    }
}

/// Outcome of invoking a capability for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliverableContent {
    Text { body: String },
    Document { path: PathBuf, content_type: String },
    Failed { placeholder: String, error: String },
}

impl DeliverableContent {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliverableContent::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deliverable {
    pub kind: ActionKind,
    pub content: DeliverableContent,
}

/// Plan plus generated content, aligned with `plan.actions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionReport {
    pub plan: InterventionPlan,
    pub deliverables: Vec<Deliverable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub student_id: StudentId,
    pub error_kind: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub evaluated: usize,
    pub failed: usize,
    pub high_risk: usize,
    pub academic_watch: usize,
    pub normal: usize,
}

impl BatchSummary {
    fn tally(reports: &[InterventionReport], failed: usize) -> Self {
        let mut summary = BatchSummary {
            evaluated: reports.len(),
            failed,
            ..BatchSummary::default()
        };
        for report in reports {
            match report.plan.tier() {
                StatusTier::HighRisk => summary.high_risk += 1,
                StatusTier::AcademicWatch => summary.academic_watch += 1,
                StatusTier::Normal => summary.normal += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub reports: Vec<InterventionReport>,
    pub failures: Vec<BatchFailure>,
}

/// Infrastructure failures that stop a student's evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterventionError {
    #[error("student {0} not found")]
    NotFound(StudentId),
    #[error("student data unavailable: {0}")]
    DataUnavailable(String),
}

impl InterventionError {
    pub const fn label(&self) -> &'static str {
        match self {
            InterventionError::NotFound(_) => "not_found",
            InterventionError::DataUnavailable(_) => "data_unavailable",
        }
    }
}
