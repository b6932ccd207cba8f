use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::intervention::domain::{
    AcademicTrend, Demographics, ParentEducation, ParentLiteracy, RiskFactor, SocialRiskProfile,
    StudentId, StudentMetrics, StudentRecord,
};
use crate::workflows::intervention::eligibility::{
    Scheme, SchemeCatalog, SchemeCriteria, SchemeTable,
};
use crate::workflows::intervention::generation::{
    FormRenderer, GenerationError, RenderError, RenderedForm, TextGenerator,
};
use crate::workflows::intervention::repository::{RepositoryError, StudentRepository};
use crate::workflows::intervention::selector::AidFormRequest;
use crate::workflows::intervention::{
    ContentCapabilities, InterventionPolicy, InterventionService,
};

pub(super) const RAJU: StudentId = StudentId(1);
pub(super) const MEENA: StudentId = StudentId(2);
pub(super) const AMIT: StudentId = StudentId(3);
pub(super) const PRIYA: StudentId = StudentId(4);
pub(super) const UNKNOWN: StudentId = StudentId(99);

pub(super) fn trend(
    subject: &str,
    current_score: f32,
    previous_score: f32,
    decline_duration_months: u8,
    exam_count: u32,
) -> AcademicTrend {
    AcademicTrend {
        weakest_subject: subject.to_string(),
        current_score,
        previous_score,
        decline_duration_months,
        exam_count,
    }
}

pub(super) fn demographics(
    grade_level: u8,
    family_income: Option<u32>,
    caste_category: &str,
    gender: &str,
) -> Demographics {
    Demographics {
        grade_level,
        family_income,
        caste_category: caste_category.to_string(),
        gender: gender.to_string(),
    }
}

pub(super) fn factors(items: &[RiskFactor]) -> BTreeSet<RiskFactor> {
    items.iter().cloned().collect()
}

/// Attendance 60, two social factors, low literacy, strong grades.
pub(super) fn scenario_a_metrics() -> StudentMetrics {
    StudentMetrics {
        attendance_percent: 60.0,
        academic: trend("Math", 85.0, 82.0, 0, 4),
        social_risks: factors(&[RiskFactor::SiblingDropoutHistory, RiskFactor::SeasonalLabor]),
        parent_literacy: ParentLiteracy::Low,
    }
}

pub(super) fn scenario_a_demographics() -> Demographics {
    demographics(8, Some(45_000), "OBC", "Male")
}

/// Good attendance and income, slipping from 60 to 45 without crossing a band.
pub(super) fn scenario_b_metrics() -> StudentMetrics {
    StudentMetrics {
        attendance_percent: 95.0,
        academic: trend("Science", 45.0, 60.0, 3, 5),
        social_risks: BTreeSet::new(),
        parent_literacy: ParentLiteracy::High,
    }
}

pub(super) fn scenario_b_demographics() -> Demographics {
    demographics(9, Some(600_000), "General", "Female")
}

#[derive(Debug, Clone)]
pub(super) struct StudentFixture {
    pub(super) name: String,
    pub(super) attendance: Option<f32>,
    pub(super) academic: Option<AcademicTrend>,
    pub(super) social: Option<SocialRiskProfile>,
    pub(super) demographics: Option<Demographics>,
}

impl StudentFixture {
    pub(super) fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attendance: None,
            academic: None,
            social: None,
            demographics: None,
        }
    }
}

pub(super) fn raju() -> StudentFixture {
    StudentFixture {
        name: "Raju".to_string(),
        attendance: Some(60.0),
        academic: Some(trend("Math", 85.0, 82.0, 0, 4)),
        social: Some(SocialRiskProfile {
            factors: factors(&[RiskFactor::SiblingDropoutHistory, RiskFactor::SeasonalLabor]),
            parent_education: Some(ParentEducation::Primary),
        }),
        demographics: Some(scenario_a_demographics()),
    }
}

pub(super) fn meena() -> StudentFixture {
    StudentFixture {
        name: "Meena".to_string(),
        attendance: Some(96.0),
        academic: Some(trend("English", 78.0, 80.0, 0, 3)),
        social: Some(SocialRiskProfile {
            factors: BTreeSet::new(),
            parent_education: Some(ParentEducation::Graduate),
        }),
        demographics: Some(demographics(7, Some(400_000), "General", "Female")),
    }
}

/// Sharp Math decline plus low attendance lands in the watch band.
pub(super) fn amit() -> StudentFixture {
    StudentFixture {
        name: "Amit".to_string(),
        attendance: Some(72.0),
        academic: Some(trend("Math", 40.0, 75.0, 3, 2)),
        social: Some(SocialRiskProfile {
            factors: BTreeSet::new(),
            parent_education: Some(ParentEducation::Secondary),
        }),
        demographics: Some(demographics(7, Some(150_000), "General", "Male")),
    }
}

/// High risk driven by attendance and failing grades.
pub(super) fn priya() -> StudentFixture {
    StudentFixture {
        name: "Priya".to_string(),
        attendance: Some(45.0),
        academic: Some(trend("Science", 30.0, 38.0, 3, 3)),
        social: None,
        demographics: Some(demographics(6, Some(80_000), "SC", "Female")),
    }
}

#[derive(Debug, Default, Clone)]
pub(super) struct MemoryRepository {
    students: HashMap<StudentId, StudentFixture>,
    failing: HashSet<&'static str>,
}

impl MemoryRepository {
    pub(super) fn seeded() -> Self {
        Self::default()
            .with_student(RAJU, raju())
            .with_student(MEENA, meena())
            .with_student(AMIT, amit())
            .with_student(PRIYA, priya())
    }

    pub(super) fn with_student(mut self, id: StudentId, fixture: StudentFixture) -> Self {
        self.students.insert(id, fixture);
        self
    }

    pub(super) fn failing(mut self, source: &'static str) -> Self {
        self.failing.insert(source);
        self
    }

    fn lookup<T>(
        &self,
        source: &'static str,
        id: StudentId,
        pick: impl Fn(&StudentFixture) -> Option<T>,
    ) -> Result<Option<T>, RepositoryError> {
        if self.failing.contains(source) {
            return Err(RepositoryError::Unavailable(format!("{source} offline")));
        }
        Ok(self.students.get(&id).and_then(pick))
    }
}

impl StudentRepository for MemoryRepository {
    fn student(&self, id: StudentId) -> Result<Option<StudentRecord>, RepositoryError> {
        self.lookup("student", id, |fixture| {
            Some(StudentRecord {
                id,
                name: fixture.name.clone(),
            })
        })
    }

    fn latest_attendance(&self, id: StudentId) -> Result<Option<f32>, RepositoryError> {
        self.lookup("attendance", id, |fixture| fixture.attendance)
    }

    fn academic_trend(&self, id: StudentId) -> Result<Option<AcademicTrend>, RepositoryError> {
        self.lookup("academic_trend", id, |fixture| fixture.academic.clone())
    }

    fn social_risk(&self, id: StudentId) -> Result<Option<SocialRiskProfile>, RepositoryError> {
        self.lookup("social_risk", id, |fixture| fixture.social.clone())
    }

    fn demographics(&self, id: StudentId) -> Result<Option<Demographics>, RepositoryError> {
        self.lookup("demographics", id, |fixture| fixture.demographics.clone())
    }
}

pub(super) struct UnavailableRepository;

impl StudentRepository for UnavailableRepository {
    fn student(&self, _id: StudentId) -> Result<Option<StudentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_attendance(&self, _id: StudentId) -> Result<Option<f32>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn academic_trend(&self, _id: StudentId) -> Result<Option<AcademicTrend>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn social_risk(&self, _id: StudentId) -> Result<Option<SocialRiskProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn demographics(&self, _id: StudentId) -> Result<Option<Demographics>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn scheme(id: u32, name: &str, caste_category: &str) -> Scheme {
    Scheme {
        id,
        name: name.to_string(),
        min_grade: 1,
        max_grade: 12,
        income_limit: 250_000,
        caste_category: caste_category.to_string(),
    }
}

/// Catalog that hands back candidates in reverse id order and counts lookups.
pub(super) struct ReversedCatalog {
    schemes: Vec<Scheme>,
    lookups: AtomicUsize,
}

impl ReversedCatalog {
    pub(super) fn new(schemes: Vec<Scheme>) -> Self {
        Self {
            schemes,
            lookups: AtomicUsize::new(0),
        }
    }

    pub(super) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SchemeCatalog for ReversedCatalog {
    fn candidates(&self, _criteria: &SchemeCriteria) -> Result<Vec<Scheme>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let mut schemes = self.schemes.clone();
        schemes.sort_by_key(|scheme| std::cmp::Reverse(scheme.id));
        Ok(schemes)
    }
}

pub(super) struct UnavailableCatalog;

impl SchemeCatalog for UnavailableCatalog {
    fn candidates(&self, _criteria: &SchemeCriteria) -> Result<Vec<Scheme>, RepositoryError> {
        Err(RepositoryError::Unavailable("scheme table offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut guard = self.prompts.lock().expect("prompt mutex poisoned");
        guard.push(prompt.to_string());
        Ok(format!("generated #{}", guard.len()))
    }
}

pub(super) struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Status(503))
    }
}

/// Never answers within any reasonable budget.
pub(super) struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("too late".to_string())
    }
}

/// Tracks how many generation calls are in flight at once.
#[derive(Default)]
pub(super) struct ConcurrencyProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub(super) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ConcurrencyProbe {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("probe".to_string())
    }
}

#[derive(Default)]
pub(super) struct MemoryRenderer {
    forms: Mutex<Vec<AidFormRequest>>,
}

impl MemoryRenderer {
    pub(super) fn forms(&self) -> Vec<AidFormRequest> {
        self.forms.lock().expect("renderer mutex poisoned").clone()
    }
}

impl FormRenderer for MemoryRenderer {
    fn render(&self, form: &AidFormRequest) -> Result<RenderedForm, RenderError> {
        self.forms
            .lock()
            .expect("renderer mutex poisoned")
            .push(form.clone());
        Ok(RenderedForm {
            path: PathBuf::from(format!("forms/{}.html", form.student_name)),
            content_type: "text/html; charset=utf-8".to_string(),
        })
    }
}

pub(super) struct FailingRenderer;

impl FormRenderer for FailingRenderer {
    fn render(&self, _form: &AidFormRequest) -> Result<RenderedForm, RenderError> {
        Err(RenderError::Io {
            path: "forms/readonly.html".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

pub(super) fn service_with<R, C>(
    repository: R,
    catalog: C,
    text: Arc<dyn TextGenerator>,
    forms: Arc<dyn FormRenderer>,
) -> InterventionService<R, C>
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    InterventionService::new(
        Arc::new(repository),
        Arc::new(catalog),
        InterventionPolicy::default(),
        ContentCapabilities::new(text, forms).with_timeout(Duration::from_millis(200)),
    )
}

pub(super) struct Harness {
    pub(super) service: Arc<InterventionService<MemoryRepository, SchemeTable>>,
    pub(super) text: Arc<RecordingGenerator>,
    pub(super) forms: Arc<MemoryRenderer>,
}

pub(super) fn harness() -> Harness {
    harness_with(MemoryRepository::seeded())
}

pub(super) fn harness_with(repository: MemoryRepository) -> Harness {
    let text = Arc::new(RecordingGenerator::default());
    let forms = Arc::new(MemoryRenderer::default());
    let service = service_with(
        repository,
        SchemeTable::standard(),
        text.clone(),
        forms.clone(),
    );
    Harness {
        service: Arc::new(service),
        text,
        forms,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
