use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Months, NaiveDate};
use serde::Serialize;
use tracing::warn;

use super::domain::{
    AcademicTrend, Demographics, ExamScore, StudentId, StudentMetrics, StudentRecord,
    DEFAULT_ATTENDANCE_PERCENT,
};
use super::repository::{RepositoryError, StudentRepository};
use super::service::InterventionError;

/// Months of exams that count as "recent" when building a trend.
pub const RECENT_WINDOW_MONTHS: u32 = 3;

impl AcademicTrend {
    /// Builds the weakest-subject trend from raw exam rows.
    ///
    /// Returns `None` when there are no exams at all.
    pub fn from_exams(exams: &[ExamScore], as_of: NaiveDate) -> Option<Self> {
        if exams.is_empty() {
            return None;
        }

        let cutoff = as_of
            .checked_sub_months(Months::new(RECENT_WINDOW_MONTHS))
            .unwrap_or(NaiveDate::MIN);

        let mut by_subject: BTreeMap<&str, SubjectWindows> = BTreeMap::new();
        for exam in exams {
            let windows = by_subject.entry(exam.subject.as_str()).or_default();
            if exam.exam_date >= cutoff {
                windows.recent.push(exam.score);
            } else {
                windows.past.push(exam.score);
            }
        }

        // Subjects without recent exams sort after every subject that has them.
        let (subject, windows) = by_subject.into_iter().min_by(|(_, a), (_, b)| {
            match (a.recent_average(), b.recent_average()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        })?;

        let current_score = round_tenth(windows.recent_average().unwrap_or(0.0));
        let previous_score = round_tenth(windows.past_average().unwrap_or(0.0));
        let decline_duration_months = if previous_score > current_score {
            RECENT_WINDOW_MONTHS as u8
        } else {
            0
        };

        Some(Self {
            weakest_subject: subject.to_string(),
            current_score,
            previous_score,
            decline_duration_months,
            exam_count: (windows.recent.len() + windows.past.len()) as u32,
        })
    }
}

#[derive(Default)]
struct SubjectWindows {
    recent: Vec<f32>,
    past: Vec<f32>,
}

impl SubjectWindows {
    fn recent_average(&self) -> Option<f32> {
        average(&self.recent)
    }

    fn past_average(&self) -> Option<f32> {
        average(&self.past)
    }
}

fn average(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}

fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Everything the engine and selector need about one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSnapshot {
    pub student: StudentRecord,
    pub metrics: StudentMetrics,
    pub demographics: Demographics,
}

/// Collects a student's signals, absorbing empty results into defaults.
pub struct MetricsAggregator<R> {
    repository: Arc<R>,
}

impl<R> MetricsAggregator<R>
where
    R: StudentRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn collect(&self, id: StudentId) -> Result<StudentSnapshot, InterventionError> {
        let student = match self.repository.student(id) {
            Ok(Some(student)) => student,
            Ok(None) | Err(RepositoryError::NotFound) => {
                return Err(InterventionError::NotFound(id))
            }
            Err(RepositoryError::Unavailable(detail)) => {
                return Err(InterventionError::DataUnavailable(format!(
                    "student lookup failed: {detail}"
                )))
            }
        };

        let mut failures = Vec::new();

        let attendance_percent = settle(
            id,
            "attendance",
            self.repository.latest_attendance(id),
            &mut failures,
        )
        .and_then(|percent| usable_percent(id, percent))
        .unwrap_or(DEFAULT_ATTENDANCE_PERCENT);

        let academic = settle(
            id,
            "academic_trend",
            self.repository.academic_trend(id),
            &mut failures,
        )
        .unwrap_or_default();

        let social = settle(
            id,
            "social_risk",
            self.repository.social_risk(id),
            &mut failures,
        )
        .unwrap_or_default();

        let demographics = settle(
            id,
            "demographics",
            self.repository.demographics(id),
            &mut failures,
        )
        .unwrap_or_default();

        if failures.len() == SUB_FETCHES {
            return Err(InterventionError::DataUnavailable(format!(
                "every metrics source failed: {}",
                failures.join("; ")
            )));
        }

        let parent_literacy = social.parent_literacy();
        let metrics = StudentMetrics {
            attendance_percent,
            academic,
            social_risks: social.factors,
            parent_literacy,
        };

        Ok(StudentSnapshot {
            student,
            metrics,
            demographics,
        })
    }
}

const SUB_FETCHES: usize = 4;

/// Non-finite readings are treated as missing; the rest are clamped to 0..=100.
fn usable_percent(id: StudentId, percent: f32) -> Option<f32> {
    if percent.is_finite() {
        Some(percent.clamp(0.0, 100.0))
    } else {
        warn!(student_id = %id, %percent, "attendance reading is not a number; using default");
        None
    }
}

fn settle<T>(
    id: StudentId,
    source: &'static str,
    result: Result<Option<T>, RepositoryError>,
    failures: &mut Vec<String>,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(RepositoryError::NotFound) => None,
        Err(RepositoryError::Unavailable(detail)) => {
            warn!(student_id = %id, source, %detail, "metrics source unavailable; using default");
            failures.push(format!("{source}: {detail}"));
            None
        }
    }
}
