use super::domain::{AcademicTrend, Demographics, SocialRiskProfile, StudentId, StudentRecord};

/// Read access to the student datastore.
///
/// `Ok(None)` means the store answered but holds no rows for the student;
/// callers apply their documented defaults. `Err` is reserved for the store
/// itself being unreachable.
pub trait StudentRepository: Send + Sync {
    fn student(&self, id: StudentId) -> Result<Option<StudentRecord>, RepositoryError>;
    fn latest_attendance(&self, id: StudentId) -> Result<Option<f32>, RepositoryError>;
    fn academic_trend(&self, id: StudentId) -> Result<Option<AcademicTrend>, RepositoryError>;
    fn social_risk(&self, id: StudentId) -> Result<Option<SocialRiskProfile>, RepositoryError>;
    fn demographics(&self, id: StudentId) -> Result<Option<Demographics>, RepositoryError>;
}

/// Error enumeration for datastore failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
