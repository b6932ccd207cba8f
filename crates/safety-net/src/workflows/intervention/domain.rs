use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u32);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Roster entry; a student id is only known once this record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
}

/// Socioeconomic conditions that raise the likelihood of a student leaving school.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    SiblingDropoutHistory,
    SeasonalLabor,
    MigrantFamily,
    ChildcareResponsibility,
    Other(String),
}

impl RiskFactor {
    pub fn label(&self) -> &str {
        match self {
            RiskFactor::SiblingDropoutHistory => "History of Sibling Dropout",
            RiskFactor::SeasonalLabor => "Seasonal Harvest Labor",
            RiskFactor::MigrantFamily => "Migrant Family",
            RiskFactor::ChildcareResponsibility => "Childcare Responsibility",
            RiskFactor::Other(name) => name.as_str(),
        }
    }
}

/// Highest schooling completed by the student's parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentEducation {
    None,
    Primary,
    Secondary,
    HigherSecondary,
    Graduate,
}

impl ParentEducation {
    pub const fn literacy(self) -> ParentLiteracy {
        match self {
            ParentEducation::None | ParentEducation::Primary => ParentLiteracy::Low,
            _ => ParentLiteracy::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentLiteracy {
    Low,
    #[default]
    High,
}

impl ParentLiteracy {
    pub const fn label(self) -> &'static str {
        match self {
            ParentLiteracy::Low => "Low",
            ParentLiteracy::High => "High",
        }
    }
}

/// Social-risk survey row as stored for a student.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocialRiskProfile {
    pub factors: BTreeSet<RiskFactor>,
    pub parent_education: Option<ParentEducation>,
}

impl SocialRiskProfile {
    pub fn parent_literacy(&self) -> ParentLiteracy {
        self.parent_education
            .map(ParentEducation::literacy)
            .unwrap_or_default()
    }
}

/// A single graded exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamScore {
    pub subject: String,
    pub score: f32,
    pub exam_date: NaiveDate,
}

pub const PLACEHOLDER_SUBJECT: &str = "General Studies";

/// Recent-versus-older performance in the student's weakest subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicTrend {
    pub weakest_subject: String,
    pub current_score: f32,
    pub previous_score: f32,
    pub decline_duration_months: u8,
    /// Number of exams behind the averages. Zero marks the no-records placeholder.
    pub exam_count: u32,
}

impl AcademicTrend {
    pub fn placeholder() -> Self {
        Self {
            weakest_subject: PLACEHOLDER_SUBJECT.to_string(),
            current_score: 0.0,
            previous_score: 0.0,
            decline_duration_months: 0,
            exam_count: 0,
        }
    }

    pub fn is_recorded(&self) -> bool {
        self.exam_count > 0
    }

    pub fn score_drop(&self) -> f32 {
        self.previous_score - self.current_score
    }
}

impl Default for AcademicTrend {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Normalized per-request view of a student's risk signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMetrics {
    pub attendance_percent: f32,
    pub academic: AcademicTrend,
    pub social_risks: BTreeSet<RiskFactor>,
    pub parent_literacy: ParentLiteracy,
}

pub const DEFAULT_ATTENDANCE_PERCENT: f32 = 100.0;

impl Default for StudentMetrics {
    fn default() -> Self {
        Self {
            attendance_percent: DEFAULT_ATTENDANCE_PERCENT,
            academic: AcademicTrend::placeholder(),
            social_risks: BTreeSet::new(),
            parent_literacy: ParentLiteracy::High,
        }
    }
}

/// Static household and enrolment details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub grade_level: u8,
    /// Annual family income in rupees, `None` when never declared.
    pub family_income: Option<u32>,
    pub caste_category: String,
    pub gender: String,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            grade_level: 0,
            family_income: None,
            caste_category: "General".to_string(),
            gender: "Unspecified".to_string(),
        }
    }
}

/// Languages the home-visit script can be requested in.
///
/// Deserialization goes through `FromStr`, so names are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Language {
    #[default]
    Hindi,
    English,
    Tamil,
    Marathi,
    Bengali,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Hindi,
        Language::English,
        Language::Tamil,
        Language::Marathi,
        Language::Bengali,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Language::Hindi => "Hindi",
            Language::English => "English",
            Language::Tamil => "Tamil",
            Language::Marathi => "Marathi",
            Language::Bengali => "Bengali",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Language::ALL
            .into_iter()
            .find(|language| language.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!(
                    "unsupported language '{trimmed}' (expected one of: {})",
                    Language::ALL.map(Language::name).join(", ")
                )
            })
    }
}
