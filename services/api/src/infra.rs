use chrono::{Months, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use safety_net::config::{AppConfig, PolicySources};
use safety_net::error::AppError;
use safety_net::workflows::intervention::{
    AcademicTrend, ContentCapabilities, Demographics, DisabledTextGenerator, ExamScore,
    HtmlFormRenderer, HttpTextGenerator, InterventionPolicy, InterventionService,
    ParentEducation, ParentLiteracy, RepositoryError, RiskFactor, SchemeTable,
    SocialRiskProfile, StudentId, StudentRecord, StudentRepository, TextGenerator,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type RosterService = InterventionService<InMemoryStudentRepository, SchemeTable>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) forms_dir: PathBuf,
    pub(crate) roster: Arc<InMemoryStudentRepository>,
}

#[derive(Debug, Clone)]
struct StudentRow {
    name: String,
    attendance: Option<f32>,
    exams: Vec<ExamScore>,
    social: Option<SocialRiskProfile>,
    demographics: Option<Demographics>,
}

/// Roster held in memory; academic trends are derived from exam rows on read.
#[derive(Debug, Clone)]
pub(crate) struct InMemoryStudentRepository {
    rows: BTreeMap<StudentId, StudentRow>,
    as_of: NaiveDate,
}

impl InMemoryStudentRepository {
    /// Pilot-school roster covering every tier.
    pub(crate) fn demo(as_of: NaiveDate) -> Self {
        let recent = as_of - chrono::Duration::days(10);
        let older = as_of.checked_sub_months(Months::new(4)).unwrap_or(as_of);

        let mut rows = BTreeMap::new();
        rows.insert(
            StudentId(1),
            StudentRow {
                name: "Raju".to_string(),
                attendance: Some(60.0),
                exams: vec![
                    exam("Math", 58.0, recent),
                    exam("Math", 61.0, older),
                    exam("Science", 64.0, recent),
                ],
                social: Some(SocialRiskProfile {
                    factors: BTreeSet::from([
                        RiskFactor::SiblingDropoutHistory,
                        RiskFactor::SeasonalLabor,
                    ]),
                    parent_education: Some(ParentEducation::Primary),
                }),
                demographics: Some(Demographics {
                    grade_level: 8,
                    family_income: Some(45_000),
                    caste_category: "OBC".to_string(),
                    gender: "Male".to_string(),
                }),
            },
        );
        rows.insert(
            StudentId(2),
            StudentRow {
                name: "Meena".to_string(),
                attendance: Some(94.0),
                exams: vec![
                    exam("English", 81.0, recent),
                    exam("English", 79.0, older),
                    exam("Math", 77.0, recent),
                ],
                social: Some(SocialRiskProfile {
                    factors: BTreeSet::new(),
                    parent_education: Some(ParentEducation::Graduate),
                }),
                demographics: Some(Demographics {
                    grade_level: 7,
                    family_income: Some(320_000),
                    caste_category: "General".to_string(),
                    gender: "Female".to_string(),
                }),
            },
        );
        rows.insert(
            StudentId(3),
            StudentRow {
                name: "Amit".to_string(),
                attendance: Some(72.0),
                exams: vec![
                    exam("Math", 40.0, recent),
                    exam("Math", 75.0, older),
                    exam("Hindi", 66.0, recent),
                ],
                social: Some(SocialRiskProfile {
                    factors: BTreeSet::new(),
                    parent_education: Some(ParentEducation::Secondary),
                }),
                demographics: Some(Demographics {
                    grade_level: 7,
                    family_income: Some(180_000),
                    caste_category: "General".to_string(),
                    gender: "Male".to_string(),
                }),
            },
        );
        rows.insert(
            StudentId(4),
            StudentRow {
                name: "Priya".to_string(),
                attendance: Some(46.0),
                exams: vec![exam("Science", 31.0, recent), exam("Science", 38.0, older)],
                social: Some(SocialRiskProfile {
                    factors: BTreeSet::from([RiskFactor::ChildcareResponsibility]),
                    parent_education: None,
                }),
                demographics: Some(Demographics {
                    grade_level: 6,
                    family_income: Some(80_000),
                    caste_category: "SC".to_string(),
                    gender: "Female".to_string(),
                }),
            },
        );
        rows.insert(
            StudentId(5),
            StudentRow {
                name: "Sunita".to_string(),
                attendance: None,
                exams: Vec::new(),
                social: None,
                demographics: None,
            },
        );

        Self { rows, as_of }
    }

    pub(crate) fn student_ids(&self) -> Vec<StudentId> {
        self.rows.keys().copied().collect()
    }

    /// Student listing plus how often each social risk appears school-wide.
    pub(crate) fn overview(&self) -> RosterOverview {
        let mut risk_factors = BTreeMap::new();
        let mut low_literacy_parents = 0;

        for social in self.rows.values().filter_map(|row| row.social.as_ref()) {
            for factor in &social.factors {
                *risk_factors.entry(factor.label().to_string()).or_insert(0) += 1;
            }
            if social.parent_literacy() == ParentLiteracy::Low {
                low_literacy_parents += 1;
            }
        }

        RosterOverview {
            students: self
                .rows
                .iter()
                .map(|(id, row)| RosterEntry {
                    id: *id,
                    name: row.name.clone(),
                })
                .collect(),
            risk_factors,
            low_literacy_parents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RosterEntry {
    pub(crate) id: StudentId,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RosterOverview {
    pub(crate) students: Vec<RosterEntry>,
    pub(crate) risk_factors: BTreeMap<String, usize>,
    pub(crate) low_literacy_parents: usize,
}

fn exam(subject: &str, score: f32, exam_date: NaiveDate) -> ExamScore {
    ExamScore {
        subject: subject.to_string(),
        score,
        exam_date,
    }
}

impl StudentRepository for InMemoryStudentRepository {
    fn student(&self, id: StudentId) -> Result<Option<StudentRecord>, RepositoryError> {
        Ok(self.rows.get(&id).map(|row| StudentRecord {
            id,
            name: row.name.clone(),
        }))
    }

    fn latest_attendance(&self, id: StudentId) -> Result<Option<f32>, RepositoryError> {
        Ok(self.rows.get(&id).and_then(|row| row.attendance))
    }

    fn academic_trend(&self, id: StudentId) -> Result<Option<AcademicTrend>, RepositoryError> {
        Ok(self
            .rows
            .get(&id)
            .and_then(|row| AcademicTrend::from_exams(&row.exams, self.as_of)))
    }

    fn social_risk(&self, id: StudentId) -> Result<Option<SocialRiskProfile>, RepositoryError> {
        Ok(self.rows.get(&id).and_then(|row| row.social.clone()))
    }

    fn demographics(&self, id: StudentId) -> Result<Option<Demographics>, RepositoryError> {
        Ok(self.rows.get(&id).and_then(|row| row.demographics.clone()))
    }
}

pub(crate) fn load_policy(sources: &PolicySources) -> Result<InterventionPolicy, AppError> {
    match &sources.policy_path {
        Some(path) => {
            let policy = InterventionPolicy::from_path(path)?;
            info!(path = %path.display(), "loaded intervention policy");
            Ok(policy)
        }
        None => Ok(InterventionPolicy::default()),
    }
}

pub(crate) fn load_schemes(sources: &PolicySources) -> Result<SchemeTable, AppError> {
    match &sources.schemes_csv {
        Some(path) => {
            let table = SchemeTable::from_path(path)?;
            info!(path = %path.display(), schemes = table.len(), "loaded scheme table");
            Ok(table)
        }
        None => Ok(SchemeTable::standard()),
    }
}

pub(crate) fn text_generator(config: &AppConfig) -> Arc<dyn TextGenerator> {
    let Some(api_key) = config.generator.api_key.clone() else {
        info!("TEXT_GENERATOR_API_KEY not set; generated content will use placeholders");
        return Arc::new(DisabledTextGenerator);
    };

    match HttpTextGenerator::new(&config.generator, api_key) {
        Ok(generator) => {
            info!(
                endpoint = generator.endpoint(),
                model = %config.generator.model,
                "text generation enabled"
            );
            Arc::new(generator)
        }
        Err(err) => {
            warn!(error = %err, "text generation client unavailable; using placeholders");
            Arc::new(DisabledTextGenerator)
        }
    }
}

/// Wires the roster, policy, scheme table and content capabilities together.
pub(crate) fn build_service(
    config: &AppConfig,
    as_of: NaiveDate,
) -> Result<(Arc<RosterService>, Arc<InMemoryStudentRepository>), AppError> {
    let policy = load_policy(&config.sources)?;
    let schemes = load_schemes(&config.sources)?;
    let repository = Arc::new(InMemoryStudentRepository::demo(as_of));

    let capabilities = ContentCapabilities::new(
        text_generator(config),
        Arc::new(HtmlFormRenderer::new(config.forms.output_dir.clone())),
    )
    .with_timeout(config.generator.timeout);

    let service = InterventionService::new(
        repository.clone(),
        Arc::new(schemes),
        policy,
        capabilities,
    )
    .with_max_concurrency(config.batch.max_concurrency);

    Ok((Arc::new(service), repository))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use safety_net::workflows::intervention::{
        EligibilityMatcher, MetricsAggregator, RiskScoringEngine, StatusTier,
    };

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
    }

    fn tier_of(id: u32) -> StatusTier {
        let repository = Arc::new(InMemoryStudentRepository::demo(as_of()));
        let snapshot = MetricsAggregator::new(repository)
            .collect(StudentId(id))
            .expect("demo student exists");
        RiskScoringEngine::default()
            .score(&snapshot.metrics, &snapshot.demographics)
            .tier
    }

    #[test]
    fn demo_roster_covers_every_tier() {
        assert_eq!(tier_of(1), StatusTier::HighRisk);
        assert_eq!(tier_of(2), StatusTier::Normal);
        assert_eq!(tier_of(3), StatusTier::AcademicWatch);
        assert_eq!(tier_of(4), StatusTier::HighRisk);
        assert_eq!(tier_of(5), StatusTier::Normal);
    }

    #[test]
    fn amit_trend_compares_recent_and_older_math() {
        let repository = InMemoryStudentRepository::demo(as_of());
        let trend = repository
            .academic_trend(StudentId(3))
            .expect("in-memory store")
            .expect("amit has exams");

        assert_eq!(trend.weakest_subject, "Math");
        assert_eq!(trend.current_score, 40.0);
        assert_eq!(trend.previous_score, 75.0);
        assert_eq!(trend.decline_duration_months, 3);
    }

    #[test]
    fn raju_matches_the_category_scheme() {
        let repository = InMemoryStudentRepository::demo(as_of());
        let demographics = repository
            .demographics(StudentId(1))
            .expect("in-memory store")
            .expect("raju has demographics");

        let scheme = EligibilityMatcher::new(Arc::new(SchemeTable::standard()))
            .match_scheme(&demographics)
            .expect("table reachable")
            .expect("raju qualifies");
        assert_eq!(scheme.name, "Pre-Matric Scholarship for OBC Students");
    }

    #[test]
    fn overview_lists_students_and_counts_risk_factors() {
        let overview = InMemoryStudentRepository::demo(as_of()).overview();

        let names: Vec<&str> = overview
            .students
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, ["Raju", "Meena", "Amit", "Priya", "Sunita"]);
        assert_eq!(overview.students[0].id, StudentId(1));
        assert_eq!(overview.risk_factors["Seasonal Harvest Labor"], 1);
        assert_eq!(overview.risk_factors["History of Sibling Dropout"], 1);
        assert_eq!(overview.risk_factors["Childcare Responsibility"], 1);
        assert_eq!(overview.risk_factors.len(), 3);
        assert_eq!(overview.low_literacy_parents, 1);
    }

    #[test]
    fn missing_policy_file_is_reported() {
        let sources = PolicySources {
            policy_path: Some(PathBuf::from("/nonexistent/policy.json")),
            schemes_csv: None,
        };
        assert!(matches!(load_policy(&sources), Err(AppError::Policy(_))));
        assert_eq!(
            load_schemes(&sources).expect("built-in table").len(),
            SchemeTable::standard().len()
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date(" 2026-03-01 "), Ok(as_of()));
        assert!(parse_date("March 1st").is_err());
    }
}
